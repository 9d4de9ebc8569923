//! Canonical storage keys for published STAC documents.
//!
//! This module is the single source of truth for the catalog's persisted
//! layout. All writers construct keys through these functions; no hardcoded
//! key strings should exist outside this module. Readers of the published
//! catalog depend on this contract.
//!
//! # Key Layout
//!
//! ```text
//! {catalog_name}.json                                  # catalog root
//! {dataset}/
//! ├── collection.json                                  # version-independent "current"
//! └── {version}/
//!     ├── {version}-collection.json                    # per-version collection
//!     ├── items/{item}.json                            # single-group items
//!     └── {group}/
//!         ├── collection.json                          # group sub-collection
//!         └── {item}.json                              # multi-group items
//! ```

/// Canonical key generator for published STAC documents.
pub struct StacPaths;

impl StacPaths {
    /// Key of the catalog root document.
    #[must_use]
    pub fn catalog(catalog_name: &str) -> String {
        format!("{catalog_name}.json")
    }

    /// Key of a dataset's version-independent "current" collection.
    ///
    /// Always reflects the latest successfully chained version; consumers
    /// resolve "current" here without knowing the version tag.
    #[must_use]
    pub fn dataset_collection(dataset: &str) -> String {
        format!("{dataset}/collection.json")
    }

    /// Key of a per-version collection document.
    #[must_use]
    pub fn version_collection(dataset: &str, version: &str) -> String {
        format!("{dataset}/{version}/{version}-collection.json")
    }

    /// Key of a group sub-collection for a multi-group raster version.
    #[must_use]
    pub fn group_collection(dataset: &str, version: &str, group: &str) -> String {
        format!("{dataset}/{version}/{group}/collection.json")
    }

    /// Key of an item document.
    ///
    /// Items of a single-group version live under `items/`; items of a
    /// multi-group raster version live under their group segment.
    #[must_use]
    pub fn item(dataset: &str, version: &str, group: Option<&str>, item_id: &str) -> String {
        match group {
            Some(group) => format!("{dataset}/{version}/{group}/{item_id}.json"),
            None => format!("{dataset}/{version}/items/{item_id}.json"),
        }
    }

    /// Public https URL for a key in the given bucket.
    #[must_use]
    pub fn public_url(bucket: &str, key: &str) -> String {
        format!("https://{bucket}.s3.amazonaws.com/{key}")
    }
}
