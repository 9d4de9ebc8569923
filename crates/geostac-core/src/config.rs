//! Runtime configuration for catalog builds.
//!
//! All per-deployment settings flow through this one value, constructed at
//! startup and passed into the reconciler. Nothing in the build pipeline
//! reads ambient state (environment variables, globals) directly.

use chrono::NaiveDate;
use std::collections::HashMap;

use crate::paths::StacPaths;

/// Configuration for one catalog build or update invocation.
#[derive(Debug, Clone)]
pub struct Config {
    /// Bucket the published STAC documents are written to.
    pub stac_bucket: String,
    /// Base URL of the upstream dataset registry API.
    pub data_api_url: String,
    /// Optional API key sent with registry requests.
    pub api_key: Option<String>,
    /// Identifier of the catalog root document (key is `{catalog_name}.json`).
    pub catalog_name: String,
    /// Content dates for datasets whose registry records carry neither a
    /// content date nor a content date range.
    pub datetime_overrides: HashMap<String, NaiveDate>,
}

impl Config {
    /// Creates a configuration with no datetime overrides.
    #[must_use]
    pub fn new(
        stac_bucket: impl Into<String>,
        data_api_url: impl Into<String>,
        catalog_name: impl Into<String>,
    ) -> Self {
        Self {
            stac_bucket: stac_bucket.into(),
            data_api_url: data_api_url.into(),
            api_key: None,
            catalog_name: catalog_name.into(),
            datetime_overrides: HashMap::new(),
        }
    }

    /// Adds a per-dataset content-date override.
    #[must_use]
    pub fn with_datetime_override(mut self, dataset: impl Into<String>, date: NaiveDate) -> Self {
        self.datetime_overrides.insert(dataset.into(), date);
        self
    }

    /// Public https URL for a key in the STAC bucket.
    #[must_use]
    pub fn public_url(&self, key: &str) -> String {
        StacPaths::public_url(&self.stac_bucket, key)
    }
}
