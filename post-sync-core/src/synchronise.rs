//! High-level pipeline: reconciles the remote published set with the local post directory.
//!
//! One pass:
//!   - Indexes the output directory by the identity token found in each file's header
//!   - Lists every published page (a listing failure aborts the pass)
//!   - For each page in listing order: extracts metadata, fetches and renders its blocks,
//!     renders the header, then creates, updates, renames or leaves its file alone
//!   - Removes files whose token was not seen among the published pages, and any
//!     second file carrying a token that is already indexed
//!
//! # Major Types
//! - [`SyncOptions`]: filter and rendering settings for a pass
//! - [`Reconciler`]: the state of one pass; constructed, run once, discarded
//! - [`SyncReport`]: outcome counters for the caller to print and turn into an exit code
//!
//! # Error Handling
//! Per-page failures are logged and counted in [`SyncReport::errors`]; the pass always
//! continues with the next page. Failing to remove a stale or renamed-away file is a
//! warning only. Only the initial listing returns an error ([`SyncError::Listing`]).
//!
//! Everything is awaited sequentially, one page at a time, so log and counter order
//! follows the listing order.

use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::io::ErrorKind;
use tracing::{debug, error, info, warn};

use crate::blocks::assemble_document;
use crate::contract::{ContentSource, PostStore, PublishedFilter};
use crate::error::{PageError, SyncError};
use crate::fetch::fetch_all;
use crate::frontmatter::{compose_file, extract_token, render_header};
use crate::identity::IdentityToken;
use crate::metadata::MetadataExtractor;
use crate::model::{ContentBlock, PageRecord};

/// Settings for one pass.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub filter: PublishedFilter,
    /// Value of the header's `layout` line.
    pub layout: String,
    /// Treat a page without a publish date as an error instead of dating it today.
    pub require_publish_date: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            filter: PublishedFilter::default(),
            layout: "post".to_string(),
            require_publish_date: false,
        }
    }
}

/// Counters for one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub errors: usize,
    /// Pages whose file name changed and whose old file is gone.
    pub renamed: usize,
    /// Files removed because their page is no longer published, or because another
    /// file already carries their token.
    pub removed: usize,
    pub remove_failures: usize,
}

impl SyncReport {
    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }

    pub fn pages(&self) -> usize {
        self.created + self.updated + self.unchanged + self.errors
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Created:   {}", self.created)?;
        writeln!(f, "Updated:   {}", self.updated)?;
        writeln!(f, "Unchanged: {}", self.unchanged)?;
        writeln!(f, "Errors:    {}", self.errors)?;
        write!(
            f,
            "Renamed:   {} | Removed: {} | Remove failures: {}",
            self.renamed, self.removed, self.remove_failures
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Created,
    Updated,
    Unchanged,
}

/// State carried across one reconciliation pass.
pub struct Reconciler<'a, S, P> {
    source: &'a S,
    store: &'a P,
    options: &'a SyncOptions,
    extractor: MetadataExtractor,
    /// token -> file name, as found on disk before the pass.
    existing: BTreeMap<IdentityToken, String>,
    /// Further files carrying a token already in `existing`.
    duplicates: Vec<(IdentityToken, String)>,
    /// Every file name present before the pass, token or not.
    initial_files: HashSet<String>,
    processed: HashSet<String>,
    /// file name -> token of the page that wrote or confirmed it during this pass.
    claimed: HashMap<String, IdentityToken>,
    report: SyncReport,
}

impl<'a, S, P> Reconciler<'a, S, P>
where
    S: ContentSource,
    P: PostStore,
{
    pub fn new(source: &'a S, store: &'a P, options: &'a SyncOptions) -> Self {
        Self {
            source,
            store,
            options,
            extractor: MetadataExtractor::new(options.require_publish_date),
            existing: BTreeMap::new(),
            duplicates: Vec::new(),
            initial_files: HashSet::new(),
            processed: HashSet::new(),
            claimed: HashMap::new(),
            report: SyncReport::default(),
        }
    }

    pub fn with_extractor(mut self, extractor: MetadataExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    pub async fn run(mut self) -> Result<SyncReport, SyncError> {
        info!("[SYNC] Starting reconciliation pass");
        self.index_existing();

        let source = self.source;
        let options = self.options;
        let filter = &options.filter;
        let pages = fetch_all("published pages", move |cursor| {
            source.query_pages(filter, cursor)
        })
        .await
        .map_err(|e| {
            error!(error = %e, "[SYNC][ERROR] Failed to list published pages");
            SyncError::Listing(e)
        })?;
        info!(count = pages.len(), "[SYNC] Listed published pages");

        for page in &pages {
            self.process_page(page).await;
        }
        self.remove_stale();

        info!(
            created = self.report.created,
            updated = self.report.updated,
            unchanged = self.report.unchanged,
            errors = self.report.errors,
            removed = self.report.removed,
            "[SYNC] Reconciliation pass complete"
        );
        Ok(self.report)
    }

    fn index_existing(&mut self) {
        let names = match self.store.list() {
            Ok(names) => names,
            Err(e) => {
                warn!(error = %e, "[SYNC] Could not list output directory, treating it as empty");
                return;
            }
        };
        for name in names {
            self.initial_files.insert(name.clone());
            let token = match self.store.read(&name) {
                Ok(content) => extract_token(&content),
                Err(e) => {
                    debug!(file = %name, error = %e, "Skipping unreadable file");
                    continue;
                }
            };
            let Some(token) = token else {
                debug!(file = %name, "No identity token in header, leaving file alone");
                continue;
            };
            if let Some(first) = self.existing.get(&token) {
                warn!(file = %name, kept = %first, token = %token, "Token appears in more than one file, removing the copy after the pass");
                self.duplicates.push((token, name));
                continue;
            }
            self.existing.insert(token, name);
        }
        debug!(indexed = self.existing.len(), files = self.initial_files.len(), "Indexed existing posts");
    }

    async fn process_page(&mut self, page: &PageRecord) {
        let token = match IdentityToken::parse(&page.id) {
            Ok(token) => token,
            Err(_) => {
                self.processed.insert(page.id.clone());
                let e = PageError::InvalidId { id: page.id.clone() };
                error!(page_id = %page.id, error = %e, "[SYNC][ERROR] Failed to synchronise page");
                self.report.errors += 1;
                return;
            }
        };
        self.processed.insert(token.to_string());

        match self.apply(page, &token).await {
            Ok((outcome, file)) => {
                info!(page_id = %token, file = %file, outcome = ?outcome, "[SYNC] Page synchronised");
                match outcome {
                    Outcome::Created => self.report.created += 1,
                    Outcome::Updated => self.report.updated += 1,
                    Outcome::Unchanged => self.report.unchanged += 1,
                }
            }
            Err(e) => {
                error!(page_id = %token, error = %e, "[SYNC][ERROR] Failed to synchronise page");
                self.report.errors += 1;
            }
        }
    }

    async fn apply(
        &mut self,
        page: &PageRecord,
        token: &IdentityToken,
    ) -> Result<(Outcome, String), PageError> {
        let meta = self.extractor.extract(page)?;

        let source = self.source;
        let page_id = page.id.as_str();
        let records = fetch_all("block children", move |cursor| {
            source.list_children(page_id, cursor)
        })
        .await
        .map_err(PageError::Blocks)?;
        let blocks: Vec<ContentBlock> = records.iter().map(ContentBlock::from_record).collect();

        let body = assemble_document(&blocks);
        let header = render_header(&meta, token, &self.options.layout);
        let content = compose_file(&header, &body);
        let target = meta.file_name();

        if let Some(owner) = self.claimed.get(&target).filter(|owner| *owner != token) {
            return Err(PageError::DuplicateTarget {
                file: target,
                owner: owner.to_string(),
            });
        }

        let previous = self.existing.get(token).cloned();
        if let Some(old) = previous.as_deref().filter(|old| *old != target) {
            self.remove_renamed(old, token);
        }

        if self.store.exists(&target) {
            match self.store.read(&target) {
                Ok(current) if current == content => {
                    self.claimed.insert(target.clone(), token.clone());
                    return Ok((Outcome::Unchanged, target));
                }
                Ok(_) => {}
                Err(e) => debug!(file = %target, error = %e, "Existing file unreadable, overwriting"),
            }
        }

        self.store
            .write(&target, &content)
            .map_err(|source| PageError::Write {
                file: target.clone(),
                source,
            })?;
        self.claimed.insert(target.clone(), token.clone());

        let outcome = if previous.is_none() && !self.initial_files.contains(&target) {
            Outcome::Created
        } else {
            Outcome::Updated
        };
        Ok((outcome, target))
    }

    fn remove_renamed(&mut self, old: &str, token: &IdentityToken) {
        if self.claimed.contains_key(old) {
            debug!(file = %old, page_id = %token, "Old file already rewritten for another page, keeping it");
            return;
        }
        match self.store.remove(old) {
            Ok(()) => {
                info!(file = %old, page_id = %token, "[SYNC] Removed file for renamed page");
                self.report.renamed += 1;
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(file = %old, "Renamed-away file already gone");
                self.report.renamed += 1;
            }
            Err(e) => warn!(file = %old, error = %e, "[SYNC] Failed to remove file for renamed page"),
        }
    }

    fn remove_stale(&mut self) {
        let mut stale: Vec<(IdentityToken, String)> = self
            .existing
            .iter()
            .filter(|(token, _)| !self.processed.contains(token.as_str()))
            .map(|(token, file)| (token.clone(), file.clone()))
            .collect();
        stale.append(&mut self.duplicates);

        for (token, file) in stale {
            if self.claimed.contains_key(&file) {
                debug!(file = %file, page_id = %token, "Stale file was rewritten for another page, keeping it");
                continue;
            }
            match self.store.remove(&file) {
                Ok(()) => {
                    info!(file = %file, page_id = %token, "[SYNC] Removed stale post");
                    self.report.removed += 1;
                }
                Err(e) => {
                    warn!(file = %file, page_id = %token, error = %e, "[SYNC] Failed to remove stale post");
                    self.report.remove_failures += 1;
                }
            }
        }
    }
}

/// Run one reconciliation pass of `source` into `store`.
pub async fn synchronise<S, P>(
    source: &S,
    store: &P,
    options: &SyncOptions,
) -> Result<SyncReport, SyncError>
where
    S: ContentSource,
    P: PostStore,
{
    Reconciler::new(source, store, options).run().await
}
