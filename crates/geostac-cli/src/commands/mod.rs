//! CLI subcommand implementations.

pub mod create;
pub mod update;

use std::sync::Arc;

use anyhow::{Context, Result};

use geostac_catalog::{CatalogReconciler, HttpAreaLookup, HttpRegistry, RunReport};
use geostac_core::{Config, S3Store};

/// Wires the reconciler to its production collaborators.
pub fn build_reconciler(config: &Config, geostore_url: &str) -> Result<CatalogReconciler> {
    let registry = HttpRegistry::new(config).context("failed to create registry client")?;
    let areas =
        HttpAreaLookup::new(geostore_url).context("failed to create area lookup client")?;

    Ok(CatalogReconciler::new(
        config.clone(),
        Arc::new(S3Store::new()),
        Arc::new(registry),
        Arc::new(areas),
    ))
}

/// Prints a run report, one dataset per line.
pub fn print_report(report: &RunReport) {
    for outcome in &report.outcomes {
        println!("{}: {}", outcome.dataset, outcome.status);
    }
    println!(
        "{} of {} datasets changed",
        report.changed_count(),
        report.outcomes.len()
    );
}
