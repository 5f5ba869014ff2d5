//! # contract: the seams between the reconciliation pipeline and the outside world
//!
//! - [`ContentSource`]: the remote content API (published-page query, block children).
//! - [`PostStore`]: the output directory, reduced to list/read/write/remove.
//!
//! Both traits are annotated for `mockall`, and the mocks are exported behind the
//! `test-export-mocks` feature so the CLI crate and integration tests can use them.

use async_trait::async_trait;
use mockall::automock;

use crate::error::FetchError;
use crate::model::{BlockRecord, ListPage, PageRecord};

/// How the status property is typed in the remote database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    #[default]
    Status,
    Select,
}

impl StatusKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusKind::Status => "status",
            StatusKind::Select => "select",
        }
    }
}

/// Restricts the page listing to a single status value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedFilter {
    pub property: String,
    pub value: String,
    pub kind: StatusKind,
}

impl Default for PublishedFilter {
    fn default() -> Self {
        Self {
            property: "Status".to_string(),
            value: "Published".to_string(),
            kind: StatusKind::Status,
        }
    }
}

/// The remote content API. Each call returns one page of a cursor-paginated listing;
/// see [`crate::fetch::fetch_all`] for draining them.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Query pages whose status matches `filter`, starting at `cursor`.
    async fn query_pages(
        &self,
        filter: &PublishedFilter,
        cursor: Option<String>,
    ) -> Result<ListPage<PageRecord>, FetchError>;

    /// List the direct child blocks of `block_id`, starting at `cursor`.
    async fn list_children(
        &self,
        block_id: &str,
        cursor: Option<String>,
    ) -> Result<ListPage<BlockRecord>, FetchError>;
}

/// The local output directory, addressed by file name.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
pub trait PostStore: Send + Sync {
    /// Names of the Markdown files currently present. A missing directory is empty.
    fn list(&self) -> std::io::Result<Vec<String>>;

    fn read(&self, name: &str) -> std::io::Result<String>;

    fn write(&self, name: &str, content: &str) -> std::io::Result<()>;

    fn remove(&self, name: &str) -> std::io::Result<()>;

    fn exists(&self, name: &str) -> bool;
}
