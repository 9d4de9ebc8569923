//! # geostac-cli
//!
//! Command-line interface for building and updating the STAC catalog.
//!
//! ## Commands
//!
//! - `geostac create` - Build the full catalog from every registry dataset
//! - `geostac update` - Incrementally update datasets already cataloged
//!
//! ## Configuration
//!
//! Settings come from command-line flags or environment variables:
//!
//! - `STAC_BUCKET` - Bucket the published documents are written to
//! - `DATA_API_URL` - Dataset registry base URL
//! - `DATA_API_KEY` - Optional registry API key
//! - `GEOSTORE_URL` - Administrative-area geostore base URL

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]
// CLI reports through print! macros intentionally
#![allow(clippy::print_stdout)]

pub mod commands;

use clap::{Parser, Subcommand};

use geostac_core::Config;

/// geostac - STAC catalog builder command-line interface.
#[derive(Debug, Parser)]
#[command(name = "geostac")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Bucket the published STAC documents are written to.
    #[arg(long, env = "STAC_BUCKET")]
    pub stac_bucket: String,

    /// Dataset registry base URL.
    #[arg(long, env = "DATA_API_URL")]
    pub api_url: String,

    /// Registry API key.
    #[arg(long, env = "DATA_API_KEY")]
    pub api_key: Option<String>,

    /// Administrative-area geostore base URL.
    #[arg(long, env = "GEOSTORE_URL", default_value = "https://api.resourcewatch.org")]
    pub geostore_url: String,

    /// Catalog root document name.
    #[arg(long, default_value = "geostac-catalog")]
    pub catalog_name: String,

    /// Emit JSON logs instead of human-readable ones.
    #[arg(long)]
    pub json_logs: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Get the effective configuration.
    #[must_use]
    pub fn config(&self) -> Config {
        let mut config = Config::new(
            self.stac_bucket.clone(),
            self.api_url.clone(),
            self.catalog_name.clone(),
        );
        config.api_key = self.api_key.clone();
        config
    }
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Build the full catalog from every registry dataset.
    Create(commands::create::CreateArgs),
    /// Incrementally update datasets already cataloged.
    Update(commands::update::UpdateArgs),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_config_from_flags() {
        let cli = Cli::parse_from([
            "geostac",
            "--stac-bucket",
            "stac-bucket",
            "--api-url",
            "https://api.example.org",
            "create",
        ]);
        let config = cli.config();

        assert_eq!(config.stac_bucket, "stac-bucket");
        assert_eq!(config.data_api_url, "https://api.example.org");
        assert_eq!(config.catalog_name, "geostac-catalog");
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_update_accepts_dataset_list() {
        let cli = Cli::parse_from([
            "geostac",
            "--stac-bucket",
            "b",
            "--api-url",
            "u",
            "update",
            "--datasets",
            "a,b,c",
        ]);

        let Commands::Update(args) = cli.command else {
            panic!("expected update command");
        };
        assert_eq!(args.datasets, vec!["a", "b", "c"]);
    }
}
