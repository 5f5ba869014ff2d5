//! Error types for a reconciliation pass.

use thiserror::Error;

use crate::metadata::MetadataError;

/// Error type returned across the remote seam (simple boxed error, as the clients vary).
pub type FetchError = Box<dyn std::error::Error + Send + Sync>;

/// Aborts the whole pass.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("failed to list published pages: {0}")]
    Listing(FetchError),
}

/// Fails a single page; the pass carries on with the next one.
#[derive(Debug, Error)]
pub enum PageError {
    #[error("page id {id:?} is not a valid identifier")]
    InvalidId { id: String },

    #[error("metadata: {0}")]
    Metadata(#[from] MetadataError),

    #[error("failed to fetch blocks: {0}")]
    Blocks(FetchError),

    #[error("failed to write {file}: {source}")]
    Write {
        file: String,
        source: std::io::Error,
    },

    #[error("{file} was already written for page {owner} during this pass")]
    DuplicateTarget { file: String, owner: String },
}
