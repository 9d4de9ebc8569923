//! `geostac update` - incrementally update cataloged datasets.

use anyhow::Result;
use clap::Args;

use geostac_core::Config;

use super::{build_reconciler, print_report};

/// Arguments for `geostac update`.
#[derive(Debug, Args)]
pub struct UpdateArgs {
    /// Datasets to update. When omitted, every dataset the registry lists
    /// is reconciled.
    #[arg(long, value_delimiter = ',')]
    pub datasets: Vec<String>,
}

/// Executes the update command.
///
/// # Errors
///
/// Returns an error when the default dataset set cannot be resolved from
/// the registry, or on catalog-level storage failures. Per-dataset problems
/// are reported, not fatal.
pub async fn execute(args: UpdateArgs, config: &Config, geostore_url: &str) -> Result<()> {
    let reconciler = build_reconciler(config, geostore_url)?;

    let datasets = (!args.datasets.is_empty()).then_some(args.datasets);
    let report = reconciler.update_all(datasets).await?;
    print_report(&report);
    Ok(())
}
