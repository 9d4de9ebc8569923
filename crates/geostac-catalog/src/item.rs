//! Serde model of persisted STAC item documents.
//!
//! These structs are the published JSON contract: one item per
//! spatiotemporal asset, carrying a single data asset plus projection
//! metadata and, for raster items, per-band statistics.

use chrono::{DateTime, Utc};
use geojson::Geometry;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::extent::Footprint;

/// STAC specification version written into every document.
pub const STAC_VERSION: &str = "1.0.0";

/// Projection extension schema.
pub const PROJECTION_EXTENSION: &str =
    "https://stac-extensions.github.io/projection/v1.0.0/schema.json";
/// Raster extension schema.
pub const RASTER_EXTENSION: &str = "https://stac-extensions.github.io/raster/v1.0.0/schema.json";
/// Version extension schema (predecessor/successor links, version tag).
pub const VERSION_EXTENSION: &str = "https://stac-extensions.github.io/version/v1.0.0/schema.json";
/// Table extension schema (column metadata).
pub const TABLE_EXTENSION: &str = "https://stac-extensions.github.io/table/v1.2.0/schema.json";

/// Media type for Cloud-Optimized GeoTIFF assets.
pub const MEDIA_TYPE_COG: &str = "image/tiff; application=geotiff; profile=cloud-optimized";
/// Media type for JSON assets.
pub const MEDIA_TYPE_JSON: &str = "application/json";

/// A typed hyperlink in a STAC document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Link {
    /// Relationship of the linked document to this one.
    pub rel: String,
    /// Absolute URL of the linked document.
    pub href: String,
    /// Media type of the linked document.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
}

impl Link {
    /// Creates a link with the given relation, pointing at a JSON document.
    #[must_use]
    pub fn new(rel: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            rel: rel.into(),
            href: href.into(),
            media_type: Some(MEDIA_TYPE_JSON.to_string()),
        }
    }
}

/// Item properties: the instant plus projection fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemProperties {
    /// The item's instant (day precision).
    pub datetime: DateTime<Utc>,
    /// EPSG code of the item's coordinate reference system.
    #[serde(rename = "proj:epsg", skip_serializing_if = "Option::is_none")]
    pub epsg: Option<i32>,
    /// Pixel shape as `[height, width]` (Y, X order per the projection
    /// extension).
    #[serde(rename = "proj:shape", skip_serializing_if = "Option::is_none")]
    pub shape: Option<[u64; 2]>,
}

/// Per-band statistics carried on raster assets.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BandStatistics {
    /// Minimum observed value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    /// Maximum observed value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    /// Standard deviation of observed values.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stddev: Option<f64>,
}

/// One raster band's metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RasterBand {
    /// Pixel data type (e.g. `uint8`).
    pub data_type: String,
    /// Nodata sentinel value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nodata: Option<f64>,
    /// Ground resolution of one pixel, in CRS units.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spatial_resolution: Option<f64>,
    /// Band statistics.
    pub statistics: BandStatistics,
}

/// One data asset referenced by an item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StacAsset {
    /// External location of the underlying object.
    pub href: String,
    /// Display title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Media type of the object.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    /// Asset roles; always contains `data` for the primary asset.
    pub roles: Vec<String>,
    /// Raster band metadata, for raster assets.
    #[serde(rename = "raster:bands", skip_serializing_if = "Option::is_none")]
    pub bands: Option<Vec<RasterBand>>,
    /// EPSG code, duplicated on the asset per the projection extension.
    #[serde(rename = "proj:epsg", skip_serializing_if = "Option::is_none")]
    pub epsg: Option<i32>,
    /// Pixel shape `[height, width]`, duplicated on the asset.
    #[serde(rename = "proj:shape", skip_serializing_if = "Option::is_none")]
    pub shape: Option<[u64; 2]>,
}

/// A persisted STAC item document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StacItem {
    /// Always `"Feature"`.
    #[serde(rename = "type")]
    pub item_type: String,
    /// STAC specification version.
    pub stac_version: String,
    /// Extension schemas this item conforms to.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stac_extensions: Vec<String>,
    /// Item identifier, unique within its collection.
    pub id: String,
    /// Footprint geometry, when recorded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geometry: Option<Geometry>,
    /// Bounding box `[west, south, east, north]`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bbox: Option<[f64; 4]>,
    /// Item properties.
    pub properties: ItemProperties,
    /// Links (self, at minimum).
    pub links: Vec<Link>,
    /// Assets by key; exactly one data asset.
    pub assets: BTreeMap<String, StacAsset>,
}

impl StacItem {
    /// Creates an item with the given identity, footprint fields, and instant.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        geometry: Option<Geometry>,
        bbox: Option<[f64; 4]>,
        datetime: DateTime<Utc>,
    ) -> Self {
        Self {
            item_type: "Feature".to_string(),
            stac_version: STAC_VERSION.to_string(),
            stac_extensions: Vec::new(),
            id: id.into(),
            geometry,
            bbox,
            properties: ItemProperties {
                datetime,
                epsg: None,
                shape: None,
            },
            links: Vec::new(),
            assets: BTreeMap::new(),
        }
    }

    /// Sets (or replaces) the item's self link.
    pub fn set_self_href(&mut self, href: impl Into<String>) {
        self.links.retain(|l| l.rel != "self");
        self.links.push(Link::new("self", href));
    }

    /// The item's self link, when set.
    #[must_use]
    pub fn self_href(&self) -> Option<&str> {
        self.links
            .iter()
            .find(|l| l.rel == "self")
            .map(|l| l.href.as_str())
    }

    /// The item's footprint for extent aggregation: the geometry when
    /// present, otherwise the bounding box.
    #[must_use]
    pub fn footprint(&self) -> Option<Footprint> {
        if let Some(geometry) = &self.geometry {
            return Some(Footprint::Geometry(geometry.clone()));
        }
        self.bbox.map(Footprint::Bbox)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn test_item() -> StacItem {
        let datetime = chrono::NaiveDate::from_ymd_opt(2024, 1, 1)
            .expect("date")
            .and_hms_opt(0, 0, 0)
            .expect("time")
            .and_utc();
        StacItem::new("10N_020E", None, Some([20.0, 0.0, 30.0, 10.0]), datetime)
    }

    #[test]
    fn test_item_serializes_stac_shape() {
        let mut item = test_item();
        item.stac_extensions = vec![PROJECTION_EXTENSION.to_string()];
        item.properties.epsg = Some(4326);
        item.properties.shape = Some([40000, 40000]);
        item.set_self_href("https://bucket.s3.amazonaws.com/d/v/items/10N_020E.json");

        let value = serde_json::to_value(&item).expect("serialize");
        assert_eq!(value["type"], "Feature");
        assert_eq!(value["stac_version"], "1.0.0");
        assert_eq!(value["properties"]["datetime"], "2024-01-01T00:00:00Z");
        assert_eq!(value["properties"]["proj:epsg"], 4326);
        assert_eq!(value["properties"]["proj:shape"], json!([40000, 40000]));
        assert_eq!(value["links"][0]["rel"], "self");
        // No geometry recorded: the key is omitted entirely.
        assert!(value.get("geometry").is_none());
    }

    #[test]
    fn test_set_self_href_replaces() {
        let mut item = test_item();
        item.set_self_href("https://a/1.json");
        item.set_self_href("https://a/2.json");

        assert_eq!(item.self_href(), Some("https://a/2.json"));
        assert_eq!(item.links.iter().filter(|l| l.rel == "self").count(), 1);
    }

    #[test]
    fn test_footprint_prefers_geometry() {
        let mut item = test_item();
        assert!(matches!(item.footprint(), Some(Footprint::Bbox(_))));

        item.geometry = geojson::Geometry::from_json_value(json!({
            "type": "Polygon",
            "coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0], [0.0, 0.0]]]
        }))
        .ok();
        assert!(matches!(item.footprint(), Some(Footprint::Geometry(_))));
    }
}
