///
/// This module implements the CLI interface for post-sync: command parsing, the async
/// entrypoint, the printed summary and the exit status.
///
/// All reconciliation logic (data model, Markdown conversion, file bookkeeping) lives in
/// the [`post-sync-core`] crate. This module only wires configuration, the HTTP client and
/// the output directory together and runs one pass.
///
/// ## How To Use
/// - For command-line users: `post-sync sync --config post-sync.yaml` (see `--help`).
/// - For programmatic/integration use: call [`run`] with a constructed [`Cli`].
///
/// ## Exit status
/// [`run`] returns an error (non-zero exit from `main`) when configuration is missing,
/// when the published-page listing fails, or when any page failed during the pass. The
/// summary is printed on both paths that reach the remote, so completed work stays visible.
///
/// [`post-sync-core`]: ../../post-sync-core/
use crate::load_config::load_config;
use crate::source::NotionClient;
use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use post_sync_core::store::LocalDirectory;
use post_sync_core::synchronise::{synchronise, SyncReport};
use std::io::{self, Write};
use std::path::PathBuf;

/// CLI for post-sync: mirror published Notion pages into Markdown posts.
#[derive(Parser)]
#[clap(
    name = "post-sync",
    version,
    about = "Synchronise published Notion pages into a directory of Markdown posts"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run one reconciliation pass using the given config file
    Sync {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    // Emit a top-level 'trace_initialised' event at the very start
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Sync { config } => {
            let settings = load_config(config)?;
            tracing::info!(command = "sync", "Starting synchronisation process");
            println!("Synchronise starting: {}", settings.output_dir.display());

            let source = NotionClient::from_settings(&settings);
            let store = LocalDirectory::new(&settings.output_dir);

            let report = match synchronise(&source, &store, &settings.options).await {
                Ok(report) => report,
                Err(e) => {
                    tracing::error!(command = "sync", error = %e, "Synchronisation failed");
                    // Nothing was applied; the zeroed summary says so.
                    write_summary(&mut io::stdout(), &SyncReport::default())?;
                    return Err(anyhow::Error::new(e).context("Synchronise aborted"));
                }
            };

            finish(&mut io::stdout(), &report)
        }
    }
}

pub fn write_summary<W: Write>(out: &mut W, report: &SyncReport) -> Result<()> {
    writeln!(out, "Synchronise report:\n{report}")?;
    Ok(())
}

/// Print the summary of a completed pass, then fail if any page failed.
pub fn finish<W: Write>(out: &mut W, report: &SyncReport) -> Result<()> {
    write_summary(out, report)?;
    if report.has_errors() {
        tracing::error!(command = "sync", ?report, "Synchronisation finished with page errors");
        bail!("{} page(s) failed to synchronise", report.errors);
    }
    tracing::info!(command = "sync", ?report, "Synchronisation complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_errors_fail_after_printing_the_summary() {
        let report = SyncReport {
            created: 2,
            errors: 1,
            ..SyncReport::default()
        };
        let mut out = Vec::new();

        let err = finish(&mut out, &report).unwrap_err();

        let printed = String::from_utf8(out).unwrap();
        assert!(printed.starts_with("Synchronise report:\n"));
        assert!(printed.contains("Created:   2"));
        assert!(printed.contains("Errors:    1"));
        assert_eq!(err.to_string(), "1 page(s) failed to synchronise");
    }

    #[test]
    fn clean_pass_succeeds() {
        let report = SyncReport {
            unchanged: 3,
            remove_failures: 1,
            ..SyncReport::default()
        };
        let mut out = Vec::new();

        finish(&mut out, &report).unwrap();

        assert!(String::from_utf8(out).unwrap().contains("Unchanged: 3"));
    }
}
