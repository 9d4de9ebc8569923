//! Raster item construction from tile-set assets.
//!
//! A raster version's items come from its tile index: each tile-set asset
//! location points into the data bucket, where a `tiles.geojson` document
//! describes every tile's footprint, pixel shape, and band statistics. Tile
//! sets are grouped by their value segment (one group per tile-set variant);
//! each group yields its own item list.
//!
//! Tile-set locations follow the data lake layout
//! `s3://{bucket}/{dataset}/{version}/raster/{srs}/{grid}/{value}/{format}/{object}`.
//! The published items always reference the `gdal-geotiff` rendition of a
//! group, whatever rendition the registry asset names.

use chrono::{DateTime, Utc};
use geojson::{FeatureCollection, Geometry};
use serde::{Deserialize, Deserializer};
use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;

use geostac_core::{Config, Error, ObjectStore, StacPaths};

use crate::asset::AssetType;
use crate::error::Result;
use crate::item::{
    BandStatistics, Link, MEDIA_TYPE_COG, PROJECTION_EXTENSION, RASTER_EXTENSION, RasterBand,
    StacAsset, StacItem,
};
use crate::registry::RawAsset;

/// Parsed tile-set asset location.
#[derive(Debug, Clone)]
struct TileSetLocation {
    /// Data bucket holding the tile sets.
    bucket: String,
    /// Key segments of the tile set's directory, bucket first.
    root: Vec<String>,
}

impl TileSetLocation {
    /// Parses a tile-set location URI. Returns `None` when the location does
    /// not follow the data lake layout.
    fn parse(location: &str) -> Option<Self> {
        let path = location.split("//").nth(1)?;
        let mut root: Vec<String> = path.split('/').map(str::to_string).collect();
        if root.len() < 8 {
            return None;
        }
        root.pop();
        Some(Self {
            bucket: root[0].clone(),
            root,
        })
    }

    /// EPSG code taken from the srs segment (`epsg-4326`).
    fn epsg(&self) -> Option<i32> {
        self.root.get(4)?.strip_prefix("epsg-")?.parse().ok()
    }

    /// The value segment naming this tile set's group.
    fn group(&self) -> &str {
        &self.root[self.root.len() - 2]
    }

    /// Key prefix of a group's `gdal-geotiff` rendition.
    fn group_base(&self, group: &str) -> String {
        let mid = self.root[1..self.root.len() - 2].join("/");
        format!("{mid}/{group}/gdal-geotiff")
    }
}

fn lenient_stats<'de, D>(deserializer: D) -> std::result::Result<Option<TileBandStats>, D::Error>
where
    D: Deserializer<'de>,
{
    // The tile index stores unavailable statistics as null or a placeholder
    // string; anything that isn't a statistics object reads as None.
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

#[derive(Debug, Clone, Deserialize)]
struct TileBandStats {
    #[serde(default)]
    min: Option<f64>,
    #[serde(default)]
    max: Option<f64>,
    #[serde(default)]
    std_dev: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
struct TileBand {
    data_type: String,
    #[serde(default)]
    no_data: Option<f64>,
    #[serde(default, deserialize_with = "lenient_stats")]
    stats: Option<TileBandStats>,
}

#[derive(Debug, Clone, Deserialize)]
struct TileIndexProperties {
    /// Tile object name; the file stem becomes the item id.
    name: String,
    /// Tile bounding box `[west, south, east, north]`.
    extent: [f64; 4],
    height: u64,
    width: u64,
    #[serde(default)]
    pixelxsize: Option<f64>,
    #[serde(default)]
    bands: Vec<TileBand>,
}

/// One tile with every derived field populated, constructed once from the
/// tile index and converted to a [`StacItem`] without further mutation.
#[derive(Debug, Clone)]
struct TileRecord {
    tile_id: String,
    geometry: Option<Geometry>,
    bbox: [f64; 4],
    datetime: DateTime<Utc>,
    epsg: i32,
    shape: [u64; 2],
    pixel_size: Option<f64>,
    bands: Vec<TileBand>,
    asset_href: String,
    self_href: String,
}

impl TileRecord {
    fn into_item(self) -> StacItem {
        let mut item = StacItem::new(
            self.tile_id.clone(),
            self.geometry,
            Some(self.bbox),
            self.datetime,
        );
        item.stac_extensions = vec![
            PROJECTION_EXTENSION.to_string(),
            RASTER_EXTENSION.to_string(),
        ];
        item.properties.epsg = Some(self.epsg);
        item.properties.shape = Some(self.shape);
        item.links.push(Link::new("self", self.self_href));

        let bands = self
            .bands
            .into_iter()
            .map(|band| RasterBand {
                data_type: band.data_type,
                nodata: band.no_data,
                spatial_resolution: self.pixel_size,
                statistics: band.stats.map_or_else(BandStatistics::default, |stats| {
                    BandStatistics {
                        minimum: stats.min,
                        maximum: stats.max,
                        stddev: stats.std_dev,
                    }
                }),
            })
            .collect();

        item.assets.insert(
            "data".to_string(),
            StacAsset {
                href: self.asset_href,
                title: Some(self.tile_id),
                media_type: Some(MEDIA_TYPE_COG.to_string()),
                roles: vec!["data".to_string()],
                bands: Some(bands),
                epsg: Some(self.epsg),
                shape: Some(self.shape),
            },
        );

        item
    }
}

/// Builds raster items for one version, grouped by tile-set group.
///
/// Returns an empty map when the version has no usable tile sets (the caller
/// treats that as a skip, not an error).
///
/// # Errors
///
/// Fails when a group's tile index cannot be read or parsed; the caller
/// skips the version.
pub(crate) async fn build_raster_items(
    config: &Config,
    store: &dyn ObjectStore,
    dataset: &str,
    version: &str,
    assets: &[RawAsset],
    datetime: DateTime<Utc>,
) -> Result<BTreeMap<String, Vec<StacItem>>> {
    // Zoom-level renditions are web map tiles, not source data.
    let tile_sets: Vec<&RawAsset> = assets
        .iter()
        .filter(|a| {
            AssetType::parse(&a.asset_type) == Some(AssetType::RasterTileSet)
                && !a.location.contains("zoom")
        })
        .collect();

    let Some(first) = tile_sets.first() else {
        warn!(dataset, version, "no tile sets for version");
        return Ok(BTreeMap::new());
    };

    let location = TileSetLocation::parse(&first.location).ok_or_else(|| {
        Error::InvalidInput(format!("unparseable tile set location: {}", first.location))
    })?;
    let epsg = location.epsg().ok_or_else(|| {
        Error::InvalidInput(format!("no EPSG segment in location: {}", first.location))
    })?;

    let groups: BTreeSet<String> = tile_sets
        .iter()
        .filter_map(|a| TileSetLocation::parse(&a.location))
        .map(|l| l.group().to_string())
        .collect();
    let multi_group = groups.len() > 1;

    let mut items_by_group = BTreeMap::new();
    for group in groups {
        let base = location.group_base(&group);
        let index_key = format!("{base}/tiles.geojson");
        let index_bytes = store.get(&location.bucket, &index_key).await?;
        let index: FeatureCollection = serde_json::from_slice(&index_bytes)?;

        let mut items = Vec::with_capacity(index.features.len());
        for feature in index.features {
            let properties: TileIndexProperties = serde_json::from_value(
                serde_json::Value::Object(feature.properties.unwrap_or_default()),
            )?;
            let tile_id = tile_id_from_name(&properties.name);

            let path_group = multi_group.then_some(group.as_str());
            let record = TileRecord {
                tile_id: tile_id.to_string(),
                geometry: feature.geometry,
                bbox: properties.extent,
                datetime,
                epsg,
                shape: [properties.height, properties.width],
                pixel_size: properties.pixelxsize,
                bands: properties.bands,
                asset_href: format!("s3://{}/{base}/{tile_id}.tif", location.bucket),
                self_href: config
                    .public_url(&StacPaths::item(dataset, version, path_group, tile_id)),
            };
            items.push(record.into_item());
        }

        if items.is_empty() {
            warn!(dataset, version, group, "tile index has no features");
            continue;
        }
        items_by_group.insert(group, items);
    }

    Ok(items_by_group)
}

/// The file stem of a tile object name (`…/10N_020E.tif` → `10N_020E`).
fn tile_id_from_name(name: &str) -> &str {
    let file = name.rsplit('/').next().unwrap_or(name);
    file.split('.').next().unwrap_or(file)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOCATION: &str =
        "s3://data-lake/umd_tree_cover_loss/v20240101/raster/epsg-4326/10/40000/year/geotiff/tiles.geojson";

    #[test]
    fn test_location_parse() {
        let location = TileSetLocation::parse(LOCATION).expect("parses");
        assert_eq!(location.bucket, "data-lake");
        assert_eq!(location.epsg(), Some(4326));
        assert_eq!(location.group(), "year");
        assert_eq!(
            location.group_base("intensity"),
            "umd_tree_cover_loss/v20240101/raster/epsg-4326/10/40000/intensity/gdal-geotiff"
        );
    }

    #[test]
    fn test_location_parse_rejects_short_paths() {
        assert!(TileSetLocation::parse("s3://bucket/one/two").is_none());
        assert!(TileSetLocation::parse("not a uri").is_none());
    }

    #[test]
    fn test_tile_id_from_name() {
        assert_eq!(tile_id_from_name("tiles/10N_020E.tif"), "10N_020E");
        assert_eq!(tile_id_from_name("10N_020E"), "10N_020E");
    }

    #[test]
    fn test_band_stats_tolerate_placeholders() {
        let json = r#"[
            {"data_type": "uint8", "no_data": 0, "stats": {"min": 1.0, "max": 22.0, "std_dev": 3.5}},
            {"data_type": "uint8", "no_data": 0, "stats": null},
            {"data_type": "uint8", "no_data": 0, "stats": "unavailable"}
        ]"#;
        let bands: Vec<TileBand> = serde_json::from_str(json).expect("parses");
        assert!(bands[0].stats.is_some());
        assert!(bands[1].stats.is_none());
        assert!(bands[2].stats.is_none());
    }
}
