//! Version datetime resolution.
//!
//! Every version collection carries one authoritative instant. The registry
//! records it inconsistently across datasets, so resolution walks an ordered
//! fallback chain:
//!
//! 1. the version's explicit content date;
//! 2. the end of its content date range;
//! 3. a per-dataset override table (datasets known to record neither);
//! 4. the version tag itself, parsed as `vYYYYMMDD`.
//!
//! The four sources differ in precision; resolved instants are midnight UTC
//! and downstream code must not assume sub-day precision.

use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashMap;
use tracing::warn;

use crate::registry::VersionDescriptor;

/// Resolves the authoritative instant for dataset versions.
#[derive(Debug, Clone, Default)]
pub struct DatetimeResolver {
    overrides: HashMap<String, NaiveDate>,
}

impl DatetimeResolver {
    /// Creates a resolver with the given per-dataset override table.
    #[must_use]
    pub fn new(overrides: HashMap<String, NaiveDate>) -> Self {
        Self { overrides }
    }

    /// Resolves the instant for one version.
    ///
    /// Returns `None` when every fallback fails; the caller skips the
    /// version. A dataset with zero datable versions is not an error, it
    /// simply never contributes data.
    #[must_use]
    pub fn resolve(
        &self,
        dataset: &str,
        version: &str,
        descriptor: &VersionDescriptor,
    ) -> Option<DateTime<Utc>> {
        let date = descriptor
            .content_date
            .or_else(|| descriptor.content_date_range.map(|range| range[1]))
            .or_else(|| self.overrides.get(dataset).copied())
            .or_else(|| parse_version_tag(version));

        match date {
            Some(date) => date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc()),
            None => {
                warn!(dataset, version, "no datetime found for version");
                None
            }
        }
    }
}

/// Parses a version tag of the form `vYYYYMMDD`, tolerating a dotted suffix
/// (`v20240101.1`).
fn parse_version_tag(version: &str) -> Option<NaiveDate> {
    let date_str = version
        .split('.')
        .next()
        .unwrap_or(version)
        .trim_start_matches('v');
    NaiveDate::parse_from_str(date_str, "%Y%m%d").ok()
}
