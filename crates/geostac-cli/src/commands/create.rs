//! `geostac create` - build the full catalog from scratch.

use anyhow::Result;
use clap::Args;

use geostac_core::Config;

use super::{build_reconciler, print_report};

/// Arguments for `geostac create`.
#[derive(Debug, Args)]
pub struct CreateArgs {
    /// Replace an existing catalog instead of refusing to proceed.
    #[arg(long)]
    pub overwrite: bool,
}

/// Executes the create command.
///
/// # Errors
///
/// Returns an error when a catalog already exists (without `--overwrite`) or
/// the registry's dataset listing is unreachable.
pub async fn execute(args: CreateArgs, config: &Config, geostore_url: &str) -> Result<()> {
    let reconciler = build_reconciler(config, geostore_url)?;
    let report = reconciler.create_catalog(args.overwrite).await?;
    print_report(&report);
    Ok(())
}
