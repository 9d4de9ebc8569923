//! Serde model of persisted STAC collection and catalog documents.
//!
//! Collections are versioned: each carries a `version` tag plus
//! `predecessor-version`/`successor-version` links into its chain (omitted
//! at chain boundaries). The catalog root lists one child link per dataset,
//! pointing at that dataset's version-independent current collection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::item::{Link, STAC_VERSION, TABLE_EXTENSION, VERSION_EXTENSION};

/// Spatial extent: one overall bounding box (additional refinement boxes are
/// allowed by STAC but never produced here).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpatialExtent {
    /// Bounding boxes; the first covers the union of all items.
    pub bbox: Vec<[f64; 4]>,
}

/// Temporal extent: `[start, end]` intervals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemporalExtent {
    /// Intervals; the first covers all items.
    pub interval: Vec<[Option<DateTime<Utc>>; 2]>,
}

/// A collection's spatial and temporal extent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Extent {
    /// Spatial extent.
    pub spatial: SpatialExtent,
    /// Temporal extent.
    pub temporal: TemporalExtent,
}

impl Extent {
    /// Extent of one version: the aggregated bounding box and the version's
    /// instant duplicated as a degenerate `[t, t]` interval.
    ///
    /// The degenerate interval is a known limitation: no distinct start
    /// instant is tracked for a version.
    #[must_use]
    pub fn of_version(bbox: [f64; 4], datetime: DateTime<Utc>) -> Self {
        Self {
            spatial: SpatialExtent { bbox: vec![bbox] },
            temporal: TemporalExtent {
                interval: vec![[Some(datetime), Some(datetime)]],
            },
        }
    }
}

/// Column metadata attached to tabular collections (table extension).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableColumn {
    /// Column name.
    pub name: String,
    /// Column description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A persisted STAC collection document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StacCollection {
    /// Always `"Collection"`.
    #[serde(rename = "type")]
    pub collection_type: String,
    /// STAC specification version.
    pub stac_version: String,
    /// Extension schemas this collection conforms to.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stac_extensions: Vec<String>,
    /// Collection identifier (the dataset id).
    pub id: String,
    /// Display title inherited from the dataset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Description inherited from the dataset.
    pub description: String,
    /// Data license; the registry does not expose one.
    pub license: String,
    /// Spatial and temporal extent.
    pub extent: Extent,
    /// Version tag (version extension).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Links: self, items/children, predecessor/successor.
    pub links: Vec<Link>,
    /// Tabular column metadata (table extension), on tabular collections.
    #[serde(rename = "table:columns", skip_serializing_if = "Option::is_none")]
    pub table_columns: Option<Vec<TableColumn>>,
}

impl StacCollection {
    /// Creates a collection with the given identity and extent.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        title: Option<String>,
        description: impl Into<String>,
        extent: Extent,
        stac_extensions: Vec<String>,
    ) -> Self {
        Self {
            collection_type: "Collection".to_string(),
            stac_version: STAC_VERSION.to_string(),
            stac_extensions,
            id: id.into(),
            title,
            description: description.into(),
            license: "proprietary".to_string(),
            extent,
            version: None,
            links: Vec::new(),
            table_columns: None,
        }
    }

    fn link_href(&self, rel: &str) -> Option<&str> {
        self.links
            .iter()
            .find(|l| l.rel == rel)
            .map(|l| l.href.as_str())
    }

    fn set_link(&mut self, rel: &str, href: impl Into<String>) {
        self.links.retain(|l| l.rel != rel);
        self.links.push(Link::new(rel, href));
    }

    /// Sets (or replaces) the collection's self link.
    pub fn set_self_href(&mut self, href: impl Into<String>) {
        self.set_link("self", href);
    }

    /// The collection's self link, when set.
    #[must_use]
    pub fn self_href(&self) -> Option<&str> {
        self.link_href("self")
    }

    /// Adds an item link.
    pub fn add_item_link(&mut self, href: impl Into<String>) {
        self.links.push(Link::new("item", href));
    }

    /// Adds a child collection link.
    pub fn add_child_link(&mut self, href: impl Into<String>) {
        self.links.push(Link::new("child", href));
    }

    /// Annotates this collection with its version tag, adding the version
    /// extension schema if not already present.
    pub fn set_version(&mut self, version: impl Into<String>) {
        self.version = Some(version.into());
        let ext = VERSION_EXTENSION.to_string();
        if !self.stac_extensions.contains(&ext) {
            self.stac_extensions.push(ext);
        }
    }

    /// Sets the predecessor-version link.
    pub fn set_predecessor(&mut self, href: impl Into<String>) {
        self.set_link("predecessor-version", href);
    }

    /// The predecessor-version link, when set.
    #[must_use]
    pub fn predecessor_href(&self) -> Option<&str> {
        self.link_href("predecessor-version")
    }

    /// Sets the successor-version link.
    pub fn set_successor(&mut self, href: impl Into<String>) {
        self.set_link("successor-version", href);
    }

    /// The successor-version link, when set.
    #[must_use]
    pub fn successor_href(&self) -> Option<&str> {
        self.link_href("successor-version")
    }

    /// Attaches tabular column metadata, adding the table extension schema.
    pub fn set_table_columns(&mut self, columns: Vec<TableColumn>) {
        let ext = TABLE_EXTENSION.to_string();
        if !self.stac_extensions.contains(&ext) {
            self.stac_extensions.push(ext);
        }
        self.table_columns = Some(columns);
    }

    /// Clones this collection, retargeting the clone's self link.
    ///
    /// Used to re-publish the designated latest version under its stable,
    /// version-independent location.
    #[must_use]
    pub fn clone_with_self_href(&self, href: impl Into<String>) -> Self {
        let mut clone = self.clone();
        clone.set_self_href(href);
        clone
    }
}

/// The persisted STAC catalog root document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StacCatalog {
    /// Always `"Catalog"`.
    #[serde(rename = "type")]
    pub catalog_type: String,
    /// STAC specification version.
    pub stac_version: String,
    /// Catalog identifier.
    pub id: String,
    /// Catalog description.
    pub description: String,
    /// Links: self plus one child per dataset.
    pub links: Vec<Link>,
}

impl StacCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            catalog_type: "Catalog".to_string(),
            stac_version: STAC_VERSION.to_string(),
            id: id.into(),
            description: description.into(),
            links: Vec::new(),
        }
    }

    /// Sets (or replaces) the catalog's self link.
    pub fn set_self_href(&mut self, href: impl Into<String>) {
        self.links.retain(|l| l.rel != "self");
        self.links.push(Link::new("self", href));
    }

    /// Attaches a dataset's current collection as a catalog child.
    ///
    /// Replace-by-href: re-attaching an already-listed child is a no-op
    /// apart from link order, so updates never accumulate duplicates.
    pub fn set_child(&mut self, href: impl Into<String>) {
        let href = href.into();
        self.links.retain(|l| !(l.rel == "child" && l.href == href));
        self.links.push(Link::new("child", href));
    }

    /// All child collection hrefs, in link order.
    #[must_use]
    pub fn children(&self) -> Vec<&str> {
        self.links
            .iter()
            .filter(|l| l.rel == "child")
            .map(|l| l.href.as_str())
            .collect()
    }
}
