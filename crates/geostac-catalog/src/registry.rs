//! Clients for the upstream dataset registry and the administrative-area
//! geostore.
//!
//! Both collaborators are reached over HTTP in production and faked from
//! hash maps in tests. All registry responses arrive wrapped in a
//! `{"data": ...}` envelope.

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::time::Duration;

use geostac_core::Config;

use crate::error::{CatalogError, Result};

// ============================================================================
// Wire types
// ============================================================================

/// A dataset as described by the registry, immutable per reconciliation pass.
#[derive(Debug, Clone)]
pub struct DatasetDescriptor {
    /// Unique dataset identifier.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Long-form description.
    pub overview: String,
    /// Version identifiers in registry order.
    pub versions: Vec<String>,
}

/// One raw asset attached to a dataset version: a type tag and a location.
#[derive(Debug, Clone, Deserialize)]
#[serde(from = "(String, String)")]
pub struct RawAsset {
    /// The registry's asset type tag (e.g. `"Raster tile set"`).
    pub asset_type: String,
    /// Location of the underlying object, typically an `s3://` URI.
    pub location: String,
}

impl From<(String, String)> for RawAsset {
    fn from((asset_type, location): (String, String)) -> Self {
        Self {
            asset_type,
            location,
        }
    }
}

impl RawAsset {
    /// Convenience constructor for tests and fakes.
    #[must_use]
    pub fn new(asset_type: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            asset_type: asset_type.into(),
            location: location.into(),
        }
    }
}

/// A dataset version's registry record.
///
/// Dates are day-precision; callers must not assume anything finer.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VersionDescriptor {
    /// Explicit content date, when the registry records one.
    #[serde(default)]
    pub content_date: Option<NaiveDate>,
    /// Content date range `[start, end]`, when the registry records one.
    #[serde(default)]
    pub content_date_range: Option<[NaiveDate; 2]>,
    /// Raw assets attached to this version.
    #[serde(default)]
    pub assets: Vec<RawAsset>,
}

/// Column metadata for a tabular dataset version.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldDescriptor {
    /// Column name.
    pub field_name: String,
    /// Human-readable column description.
    #[serde(default)]
    pub field_description: Option<String>,
}

// ============================================================================
// Collaborator traits
// ============================================================================

/// The upstream dataset registry.
///
/// Errors from these methods are per-call failures; how far a failure
/// propagates (skip the version, skip the dataset, abort the run) is decided
/// by the caller, not here.
#[async_trait]
pub trait DatasetRegistry: Send + Sync + 'static {
    /// Lists all dataset identifiers known to the registry.
    async fn list_datasets(&self) -> Result<Vec<String>>;

    /// Fetches one dataset's descriptor.
    async fn dataset(&self, id: &str) -> Result<DatasetDescriptor>;

    /// Returns the registry's designated latest version tag, or `None` when
    /// the registry has no latest designation for this dataset.
    async fn latest_version(&self, id: &str) -> Result<Option<String>>;

    /// Fetches one version's record.
    async fn version(&self, id: &str, version: &str) -> Result<VersionDescriptor>;

    /// Fetches column metadata for a tabular dataset version.
    async fn fields(&self, id: &str, version: &str) -> Result<Vec<FieldDescriptor>>;

    /// Runs a SQL query against a dataset version, returning raw rows.
    async fn query(&self, id: &str, version: &str, sql: &str) -> Result<Vec<Map<String, Value>>>;
}

/// Administrative-area bounding box lookup.
///
/// Tabular items are keyed by area code and carry the area's bounding box;
/// the geometry itself stays with the area service.
#[async_trait]
pub trait AreaLookup: Send + Sync + 'static {
    /// Returns the bounding box for an administrative area, or `None` when
    /// the area is unknown.
    async fn area_bbox(&self, area_id: &str) -> Result<Option<[f64; 4]>>;
}

// ============================================================================
// HTTP implementations
// ============================================================================

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct DatasetListEntry {
    dataset: String,
}

#[derive(Debug, Deserialize)]
struct DatasetMetadata {
    #[serde(default)]
    title: String,
    #[serde(default)]
    overview: String,
}

#[derive(Debug, Deserialize)]
struct DatasetRecord {
    #[serde(default)]
    versions: Vec<String>,
    metadata: DatasetMetadata,
}

#[derive(Debug, Deserialize)]
struct LatestRecord {
    version: String,
}

/// Registry client over the data API.
pub struct HttpRegistry {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpRegistry {
    /// Creates a registry client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| CatalogError::registry(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.data_api_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        params: &[(&str, &str)],
    ) -> Result<T> {
        let mut req = self.client.get(url).query(params);
        if let Some(key) = &self.api_key {
            req = req.header("x-api-key", key);
        }

        let response = req
            .send()
            .await
            .map_err(|e| CatalogError::registry(format!("request to {url} failed: {e}")))?;

        if response.status().is_success() {
            let envelope: Envelope<T> = response
                .json()
                .await
                .map_err(|e| CatalogError::registry(format!("bad response from {url}: {e}")))?;
            Ok(envelope.data)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(CatalogError::registry(format!(
                "registry error ({status}) from {url}: {body}"
            )))
        }
    }
}

#[async_trait]
impl DatasetRegistry for HttpRegistry {
    async fn list_datasets(&self) -> Result<Vec<String>> {
        let url = format!("{}/datasets", self.base_url);
        let entries: Vec<DatasetListEntry> = self.get_json(&url, &[]).await?;
        Ok(entries.into_iter().map(|e| e.dataset).collect())
    }

    async fn dataset(&self, id: &str) -> Result<DatasetDescriptor> {
        let url = format!("{}/dataset/{id}", self.base_url);
        let record: DatasetRecord = self.get_json(&url, &[]).await?;
        Ok(DatasetDescriptor {
            id: id.to_string(),
            title: record.metadata.title,
            overview: record.metadata.overview,
            versions: record.versions,
        })
    }

    async fn latest_version(&self, id: &str) -> Result<Option<String>> {
        let url = format!("{}/dataset/{id}/latest", self.base_url);

        let mut req = self.client.get(&url);
        if let Some(key) = &self.api_key {
            req = req.header("x-api-key", key);
        }
        let response = req
            .send()
            .await
            .map_err(|e| CatalogError::registry(format!("request to {url} failed: {e}")))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            let status = response.status();
            return Err(CatalogError::registry(format!(
                "registry error ({status}) from {url}"
            )));
        }

        let envelope: Envelope<LatestRecord> = response
            .json()
            .await
            .map_err(|e| CatalogError::registry(format!("bad response from {url}: {e}")))?;
        Ok(Some(envelope.data.version))
    }

    async fn version(&self, id: &str, version: &str) -> Result<VersionDescriptor> {
        let url = format!("{}/dataset/{id}/{version}", self.base_url);
        self.get_json(&url, &[]).await
    }

    async fn fields(&self, id: &str, version: &str) -> Result<Vec<FieldDescriptor>> {
        let url = format!("{}/dataset/{id}/{version}/fields", self.base_url);
        self.get_json(&url, &[]).await
    }

    async fn query(&self, id: &str, version: &str, sql: &str) -> Result<Vec<Map<String, Value>>> {
        let url = format!("{}/dataset/{id}/{version}/query", self.base_url);
        self.get_json(&url, &[("sql", sql)]).await
    }
}

/// Geostore client for administrative-area bounding boxes.
pub struct HttpAreaLookup {
    client: Client,
    base_url: String,
}

impl HttpAreaLookup {
    /// Creates an area lookup client for the given geostore base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| CatalogError::registry(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct GeostoreAttributes {
    bbox: [f64; 4],
}

#[derive(Debug, Deserialize)]
struct GeostoreRecord {
    attributes: GeostoreAttributes,
}

#[async_trait]
impl AreaLookup for HttpAreaLookup {
    async fn area_bbox(&self, area_id: &str) -> Result<Option<[f64; 4]>> {
        let url = format!("{}/v2/geostore/admin/{area_id}", self.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| CatalogError::registry(format!("request to {url} failed: {e}")))?;

        if !response.status().is_success() {
            return Ok(None);
        }

        let envelope: Envelope<GeostoreRecord> = response
            .json()
            .await
            .map_err(|e| CatalogError::registry(format!("bad response from {url}: {e}")))?;
        Ok(Some(envelope.data.attributes.bbox))
    }
}

// ============================================================================
// In-memory fakes for testing
// ============================================================================

/// In-memory registry for testing. Not suitable for production.
#[derive(Debug, Default)]
pub struct MemoryRegistry {
    order: Vec<String>,
    datasets: HashMap<String, DatasetDescriptor>,
    latest: HashMap<String, String>,
    versions: HashMap<(String, String), VersionDescriptor>,
    fields: HashMap<(String, String), Vec<FieldDescriptor>>,
    queries: HashMap<(String, String), Vec<Map<String, Value>>>,
    unreachable_versions: HashSet<(String, String)>,
    listing_fails: bool,
}

impl MemoryRegistry {
    /// Creates an empty fake registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a dataset descriptor.
    pub fn add_dataset(&mut self, descriptor: DatasetDescriptor) {
        self.order.push(descriptor.id.clone());
        self.datasets.insert(descriptor.id.clone(), descriptor);
    }

    /// Lists a dataset id without registering its descriptor, so fetching
    /// the dataset fails.
    pub fn add_unfetchable_dataset(&mut self, id: &str) {
        self.order.push(id.to_string());
    }

    /// Sets a dataset's designated latest version.
    pub fn set_latest(&mut self, dataset: &str, version: &str) {
        self.latest.insert(dataset.to_string(), version.to_string());
    }

    /// Registers a version record.
    pub fn add_version(&mut self, dataset: &str, version: &str, descriptor: VersionDescriptor) {
        self.versions
            .insert((dataset.to_string(), version.to_string()), descriptor);
    }

    /// Registers column metadata for a version.
    pub fn add_fields(&mut self, dataset: &str, version: &str, fields: Vec<FieldDescriptor>) {
        self.fields
            .insert((dataset.to_string(), version.to_string()), fields);
    }

    /// Registers rows returned for any query against a dataset version.
    pub fn add_query_result(
        &mut self,
        dataset: &str,
        version: &str,
        rows: Vec<Map<String, Value>>,
    ) {
        self.queries
            .insert((dataset.to_string(), version.to_string()), rows);
    }

    /// Makes one version's fetch fail, simulating a registry outage.
    pub fn make_version_unreachable(&mut self, dataset: &str, version: &str) {
        self.unreachable_versions
            .insert((dataset.to_string(), version.to_string()));
    }

    /// Makes `list_datasets` fail, simulating an unreachable registry.
    pub fn make_listing_fail(&mut self) {
        self.listing_fails = true;
    }
}

#[async_trait]
impl DatasetRegistry for MemoryRegistry {
    async fn list_datasets(&self) -> Result<Vec<String>> {
        if self.listing_fails {
            return Err(CatalogError::registry("datasets listing unreachable"));
        }
        Ok(self.order.clone())
    }

    async fn dataset(&self, id: &str) -> Result<DatasetDescriptor> {
        self.datasets
            .get(id)
            .cloned()
            .ok_or_else(|| CatalogError::registry(format!("dataset {id} not found")))
    }

    async fn latest_version(&self, id: &str) -> Result<Option<String>> {
        Ok(self.latest.get(id).cloned())
    }

    async fn version(&self, id: &str, version: &str) -> Result<VersionDescriptor> {
        let key = (id.to_string(), version.to_string());
        if self.unreachable_versions.contains(&key) {
            return Err(CatalogError::registry(format!(
                "version {id}/{version} unreachable"
            )));
        }
        self.versions
            .get(&key)
            .cloned()
            .ok_or_else(|| CatalogError::registry(format!("version {id}/{version} not found")))
    }

    async fn fields(&self, id: &str, version: &str) -> Result<Vec<FieldDescriptor>> {
        Ok(self
            .fields
            .get(&(id.to_string(), version.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    async fn query(&self, id: &str, version: &str, _sql: &str) -> Result<Vec<Map<String, Value>>> {
        self.queries
            .get(&(id.to_string(), version.to_string()))
            .cloned()
            .ok_or_else(|| CatalogError::registry(format!("no query data for {id}/{version}")))
    }
}

/// Fixed-table area lookup for testing.
#[derive(Debug, Default)]
pub struct StaticAreaLookup {
    bboxes: HashMap<String, [f64; 4]>,
}

impl StaticAreaLookup {
    /// Creates an empty lookup table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an area bounding box.
    pub fn add_area(&mut self, area_id: &str, bbox: [f64; 4]) {
        self.bboxes.insert(area_id.to_string(), bbox);
    }
}

#[async_trait]
impl AreaLookup for StaticAreaLookup {
    async fn area_bbox(&self, area_id: &str) -> Result<Option<[f64; 4]>> {
        Ok(self.bboxes.get(area_id).copied())
    }
}
