//! Tabular item construction for database-table versions.
//!
//! Tabular datasets are area-aggregated statistics tables. One item is
//! published per administrative area in the dataset's area whitelist; each
//! item's single asset is a registry query URL scoped to that area, and its
//! bounding box comes from the area lookup service.
//!
//! Only GADM iso-level datasets with a recognized data-type suffix have a
//! build route; everything else skips with a warning.

use chrono::{DateTime, Utc};
use tracing::warn;

use geostac_core::{Config, StacPaths};

use crate::error::Result;
use crate::item::{MEDIA_TYPE_JSON, StacAsset, StacItem};
use crate::registry::{AreaLookup, DatasetRegistry};

const TABULAR_DATA_TYPES: [&str; 3] = ["alerts", "change", "summary"];

/// Whether a tabular collection can be built for this dataset name.
fn has_build_route(dataset: &str) -> bool {
    let data_type = dataset.rsplit('_').next().unwrap_or_default();
    if !TABULAR_DATA_TYPES.contains(&data_type) {
        warn!(dataset, "tabular data type must be one of {TABULAR_DATA_TYPES:?}");
        return false;
    }

    let area_type = dataset.split('_').next().unwrap_or_default();
    if area_type != "gadm" {
        warn!(dataset, area_type, "tabular items not implemented for area type");
        return false;
    }

    if !dataset.contains("iso") {
        warn!(dataset, "tabular items not implemented for non-iso GADM areas");
        return false;
    }

    true
}

/// The companion whitelist dataset holding this dataset's area codes.
fn whitelist_dataset(dataset: &str) -> String {
    let mut parts: Vec<&str> = dataset.split("__").take(2).collect();
    parts.push("iso_whitelist");
    parts.join("__")
}

/// Builds tabular items for one version, one per whitelisted area.
///
/// Returns an empty list when the dataset has no tabular build route or its
/// area whitelist cannot be resolved (the caller treats that as a skip).
/// Areas whose bounding box cannot be resolved are skipped individually.
pub(crate) async fn build_tabular_items(
    config: &Config,
    registry: &dyn DatasetRegistry,
    areas: &dyn AreaLookup,
    dataset: &str,
    version: &str,
    datetime: DateTime<Utc>,
) -> Result<Vec<StacItem>> {
    if !has_build_route(dataset) {
        return Ok(Vec::new());
    }

    let whitelist = whitelist_dataset(dataset);
    let rows = match registry
        .query(&whitelist, "latest", "SELECT * from data")
        .await
    {
        Ok(rows) => rows,
        Err(e) => {
            warn!(dataset, version, error = %e, "cannot resolve area whitelist");
            return Ok(Vec::new());
        }
    };

    let area_codes: Vec<String> = rows
        .iter()
        .filter_map(|row| row.get("iso").and_then(|v| v.as_str()))
        .map(str::to_string)
        .collect();

    let mut items = Vec::with_capacity(area_codes.len());
    for area in &area_codes {
        let bbox = match areas.area_bbox(area).await {
            Ok(Some(bbox)) => bbox,
            Ok(None) => {
                warn!(dataset, version, area, "could not fetch geometry for area");
                continue;
            }
            Err(e) => {
                warn!(dataset, version, area, error = %e, "area lookup failed");
                continue;
            }
        };

        let mut item = StacItem::new(area.clone(), None, Some(bbox), datetime);
        item.set_self_href(config.public_url(&StacPaths::item(dataset, version, None, area)));

        let sql = format!("SELECT * from data WHERE iso = '{area}'");
        item.assets.insert(
            "data".to_string(),
            StacAsset {
                href: format!(
                    "{}/dataset/{dataset}/{version}/query?sql={sql}",
                    config.data_api_url
                ),
                title: Some(area.clone()),
                media_type: Some(MEDIA_TYPE_JSON.to_string()),
                roles: vec!["data".to_string()],
                bands: None,
                epsg: None,
                shape: None,
            },
        );
        items.push(item);
    }

    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{MemoryRegistry, StaticAreaLookup};
    use serde_json::json;

    fn instant() -> DateTime<Utc> {
        chrono::NaiveDate::from_ymd_opt(2024, 1, 1)
            .expect("date")
            .and_hms_opt(0, 0, 0)
            .expect("time")
            .and_utc()
    }

    fn row(iso: &str) -> serde_json::Map<String, serde_json::Value> {
        let mut row = serde_json::Map::new();
        row.insert("iso".to_string(), json!(iso));
        row
    }

    #[test]
    fn test_build_route_gating() {
        assert!(has_build_route("gadm__iso__summary"));
        assert!(!has_build_route("gadm__iso__whatever"));
        assert!(!has_build_route("wdpa__iso__summary"));
        assert!(!has_build_route("gadm__adm2__summary"));
    }

    #[test]
    fn test_whitelist_dataset_name() {
        assert_eq!(
            whitelist_dataset("gadm__iso__tree_cover_change"),
            "gadm__iso__iso_whitelist"
        );
    }

    #[tokio::test]
    async fn test_items_built_per_whitelisted_area() {
        let config = Config::new("stac-bucket", "https://api.example.org", "cat");
        let mut registry = MemoryRegistry::new();
        registry.add_query_result(
            "gadm__iso__iso_whitelist",
            "latest",
            vec![row("BRA"), row("COD")],
        );
        let mut areas = StaticAreaLookup::new();
        areas.add_area("BRA", [-74.0, -34.0, -34.0, 5.0]);
        // COD is missing from the lookup: its item is skipped, not fatal.

        let items = build_tabular_items(
            &config,
            &registry,
            &areas,
            "gadm__iso__summary",
            "v4",
            instant(),
        )
        .await
        .expect("build");

        assert_eq!(items.len(), 1);
        let item = &items[0];
        assert_eq!(item.id, "BRA");
        assert_eq!(item.bbox, Some([-74.0, -34.0, -34.0, 5.0]));
        let asset = item.assets.get("data").expect("data asset");
        assert_eq!(
            asset.href,
            "https://api.example.org/dataset/gadm__iso__summary/v4/query?sql=SELECT * from data WHERE iso = 'BRA'"
        );
    }

    #[tokio::test]
    async fn test_unroutable_dataset_yields_no_items() {
        let config = Config::new("b", "https://api.example.org", "cat");
        let registry = MemoryRegistry::new();
        let areas = StaticAreaLookup::new();

        let items = build_tabular_items(&config, &registry, &areas, "plain_table", "v1", instant())
            .await
            .expect("build");
        assert!(items.is_empty());
    }
}
