//! Command-line / environment configuration

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use crate::api::{ResourceKind, DEFAULT_BASE_URL};
use crate::error::{CatalogError, Result};

/// What `--fetch-only` streams to stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DumpTarget {
    /// A flat listing of one kind, in id order
    Kind(ResourceKind),
    /// Species grouped with their forms
    Forms,
}

fn parse_dump_target(s: &str) -> std::result::Result<DumpTarget, String> {
    if s == "forms" {
        return Ok(DumpTarget::Forms);
    }
    ResourceKind::from_segment(s).map(DumpTarget::Kind).ok_or_else(|| {
        format!("unknown kind '{s}' (expected pokemon, pokemon-species, location, move, generation or forms)")
    })
}

#[derive(Parser, Debug, Clone)]
#[command(name = "dex_catalog", about = "Browse the PokeAPI catalog in the terminal")]
pub struct Config {
    /// Base URL of the data API
    #[arg(long, env = "DEX_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Cap on the pokemon listing (other listings are always loaded whole)
    #[arg(long, env = "POKEMON_LIMIT")]
    pub limit: Option<usize>,

    /// Per-request timeout (ms); a timed-out item is skipped
    #[arg(long, env = "DEX_TIMEOUT_MS", default_value = "10000")]
    pub timeout_ms: u64,

    /// Forms materialized per grouped batch
    #[arg(long, env = "DEX_BATCH_SIZE", default_value = "24")]
    pub batch_size: usize,

    /// Rows per page in the listing views
    #[arg(long, default_value = "20")]
    pub page_size: usize,

    /// Stream one listing to stdout as JSON lines and exit
    #[arg(long, value_name = "KIND", value_parser = parse_dump_target)]
    pub fetch_only: Option<DumpTarget>,

    /// Write logs to this file (the TUI otherwise discards them)
    #[arg(long, env = "DEX_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    /// Log filter, e.g. `info` or `dex_catalog=debug`
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,
}

impl Config {
    /// Validate the configuration at startup
    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(CatalogError::Config("base_url must not be empty".to_string()));
        }
        if self.limit == Some(0) {
            return Err(CatalogError::Config("limit must be > 0".to_string()));
        }
        if self.batch_size == 0 {
            return Err(CatalogError::Config("batch_size must be > 0".to_string()));
        }
        if self.page_size == 0 {
            return Err(CatalogError::Config("page_size must be > 0".to_string()));
        }
        if self.timeout_ms == 0 {
            return Err(CatalogError::Config("timeout_ms must be > 0".to_string()));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
