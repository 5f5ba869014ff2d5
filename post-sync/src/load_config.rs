/// `load_config` module: loads the static YAML config and merges in the secrets and
/// overrides that only ever come from the environment.
///
/// # Responsibilities
/// - Parse the user-supplied YAML file into typed sections ([`SourceSection`], [`OutputSection`])
/// - Read `NOTION_TOKEN` (required), `NOTION_DATABASE_ID` (overrides `source.database_id`)
///   and `NOTION_API_URL` (optional API base)
/// - Map everything onto [`Settings`], which carries the core [`SyncOptions`]
///
/// # Errors
/// All errors use `anyhow::Error` and are surfaced at the CLI boundary. Every failure here
/// happens before any remote call is made.
use anyhow::{anyhow, Result};
use post_sync_core::contract::{PublishedFilter, StatusKind};
use post_sync_core::synchronise::SyncOptions;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

pub const TOKEN_ENV: &str = "NOTION_TOKEN";
pub const DATABASE_ID_ENV: &str = "NOTION_DATABASE_ID";
pub const API_URL_ENV: &str = "NOTION_API_URL";
pub const DEFAULT_API_URL: &str = "https://api.notion.com/v1";

#[derive(Debug, Deserialize)]
pub struct CliConfig {
    #[serde(default)]
    pub source: SourceSection,
    pub output: OutputSection,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SourceSection {
    pub database_id: Option<String>,
    pub status_property: String,
    pub status_value: String,
    pub status_kind: StatusKind,
}

impl Default for SourceSection {
    fn default() -> Self {
        let filter = PublishedFilter::default();
        Self {
            database_id: None,
            status_property: filter.property,
            status_value: filter.value,
            status_kind: filter.kind,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct OutputSection {
    pub dir: PathBuf,
    #[serde(default = "default_layout")]
    pub layout: String,
    #[serde(default)]
    pub require_publish_date: bool,
}

fn default_layout() -> String {
    SyncOptions::default().layout
}

/// Everything `run` needs for one pass.
#[derive(Debug)]
pub struct Settings {
    pub api_url: String,
    pub token: String,
    pub database_id: String,
    pub output_dir: PathBuf,
    pub options: SyncOptions,
}

/// Loads a static YAML config file (no secrets) and injects required env vars for secrets.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow!("Failed to read config file {:?}: {}", path_ref, e));
        }
    };

    let raw: CliConfig = match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            conf
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    let token = match env::var(TOKEN_ENV) {
        Ok(token) if !token.trim().is_empty() => token,
        _ => {
            error!(variable = TOKEN_ENV, "Integration token missing in environment");
            return Err(anyhow!("{TOKEN_ENV} must be set"));
        }
    };

    let database_id = env::var(DATABASE_ID_ENV)
        .ok()
        .filter(|id| !id.trim().is_empty())
        .or(raw.source.database_id)
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| {
            error!(variable = DATABASE_ID_ENV, "Database id missing in config and environment");
            anyhow!("source.database_id or {DATABASE_ID_ENV} must be set")
        })?;

    let api_url = env::var(API_URL_ENV)
        .ok()
        .filter(|url| !url.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_API_URL.to_string());

    info!(
        database_id = %database_id,
        output_dir = ?raw.output.dir,
        status_property = %raw.source.status_property,
        status_value = %raw.source.status_value,
        "Configuration loaded"
    );

    Ok(Settings {
        api_url: api_url.trim_end_matches('/').to_string(),
        token,
        database_id,
        output_dir: raw.output.dir,
        options: SyncOptions {
            filter: PublishedFilter {
                property: raw.source.status_property,
                value: raw.source.status_value,
                kind: raw.source.status_kind,
            },
            layout: raw.output.layout,
            require_publish_date: raw.output.require_publish_date,
        },
    })
}
