//! End-to-end reconciliation scenarios over in-memory collaborators.
//!
//! These tests pin the catalog's externally observable behavior: which
//! documents a run publishes, how version chains are linked, and that
//! incremental updates never touch already-published versions.

use std::sync::Arc;

use bytes::Bytes;
use serde_json::json;

use geostac_catalog::{
    CatalogReconciler, DatasetDescriptor, MemoryRegistry, OutcomeStatus, RawAsset, StacCatalog,
    StacCollection, StaticAreaLookup, VersionDescriptor,
};
use geostac_core::{Config, MemoryStore, ObjectStore, StacPaths};

const DATA_BUCKET: &str = "data-lake";
const STAC_BUCKET: &str = "stac-bucket";

fn config() -> Config {
    Config::new(STAC_BUCKET, "https://api.example.org", "test-catalog")
}

fn tile_location(dataset: &str, version: &str) -> String {
    format!("s3://{DATA_BUCKET}/{dataset}/{version}/raster/epsg-4326/10/40000/default/geotiff/tiles.geojson")
}

fn tile_index() -> serde_json::Value {
    json!({
        "type": "FeatureCollection",
        "features": [{
            "type": "Feature",
            "geometry": {
                "type": "Polygon",
                "coordinates": [[[20.0, 0.0], [30.0, 0.0], [30.0, 10.0], [20.0, 10.0], [20.0, 0.0]]]
            },
            "properties": {
                "name": "tiles/10N_020E.tif",
                "extent": [20.0, 0.0, 30.0, 10.0],
                "height": 40000,
                "width": 40000,
                "pixelxsize": 0.00025,
                "bands": [{"data_type": "uint8", "no_data": 0, "stats": {"min": 1.0, "max": 20.0, "std_dev": 2.0}}]
            }
        }]
    })
}

/// Registers a raster dataset with the given versions and seeds each
/// version's tile index in the data bucket.
async fn seed_dataset(
    store: &MemoryStore,
    registry: &mut MemoryRegistry,
    dataset: &str,
    versions: &[&str],
    latest: &str,
) {
    registry.add_dataset(DatasetDescriptor {
        id: dataset.to_string(),
        title: format!("{dataset} title"),
        overview: format!("{dataset} overview"),
        versions: versions.iter().map(|v| (*v).to_string()).collect(),
    });
    registry.set_latest(dataset, latest);

    for version in versions {
        registry.add_version(
            dataset,
            version,
            VersionDescriptor {
                content_date: None,
                content_date_range: None,
                assets: vec![RawAsset::new("Raster tile set", tile_location(dataset, version))],
            },
        );
        store
            .put(
                DATA_BUCKET,
                &format!(
                    "{dataset}/{version}/raster/epsg-4326/10/40000/default/gdal-geotiff/tiles.geojson"
                ),
                Bytes::from(serde_json::to_vec(&tile_index()).expect("serialize")),
            )
            .await
            .expect("seed tile index");
    }
}

fn reconciler(store: Arc<MemoryStore>, registry: MemoryRegistry) -> CatalogReconciler {
    CatalogReconciler::new(
        config(),
        store,
        Arc::new(registry),
        Arc::new(StaticAreaLookup::new()),
    )
}

async fn load_collection(store: &MemoryStore, key: &str) -> StacCollection {
    let bytes = store.get(STAC_BUCKET, key).await.expect("document exists");
    serde_json::from_slice(&bytes).expect("valid collection json")
}

fn version_href(dataset: &str, version: &str) -> String {
    StacPaths::public_url(
        STAC_BUCKET,
        &StacPaths::version_collection(dataset, version),
    )
}

#[tokio::test]
async fn create_builds_versions_up_to_latest_only() {
    let store = Arc::new(MemoryStore::new());
    let mut registry = MemoryRegistry::new();
    // v3 is listed but beyond the latest designation: it must never build.
    seed_dataset(&store, &mut registry, "x", &["v20240101", "v20240201", "v20240301"], "v20240201")
        .await;

    let report = reconciler(store.clone(), registry)
        .create_catalog(false)
        .await
        .expect("create");

    assert_eq!(report.outcomes.len(), 1);
    assert!(matches!(
        report.outcomes[0].status,
        OutcomeStatus::Published { ref latest, versions_built: 2 } if latest == "v20240201"
    ));

    let keys = store.keys(STAC_BUCKET);
    assert!(keys.contains(&"x/v20240101/v20240101-collection.json".to_string()));
    assert!(keys.contains(&"x/v20240201/v20240201-collection.json".to_string()));
    assert!(!keys.iter().any(|k| k.contains("v20240301")));

    let v1 = load_collection(&store, "x/v20240101/v20240101-collection.json").await;
    let v2 = load_collection(&store, "x/v20240201/v20240201-collection.json").await;
    assert_eq!(v1.predecessor_href(), None);
    assert_eq!(v1.successor_href(), Some(version_href("x", "v20240201").as_str()));
    assert_eq!(v2.predecessor_href(), Some(version_href("x", "v20240101").as_str()));
    assert_eq!(v2.successor_href(), None);

    // "current" is a clone of the designated latest under the stable key.
    let current = load_collection(&store, "x/collection.json").await;
    assert_eq!(current.version.as_deref(), Some("v20240201"));
    assert_eq!(
        current.self_href(),
        Some("https://stac-bucket.s3.amazonaws.com/x/collection.json")
    );

    let catalog_bytes = store.get(STAC_BUCKET, "test-catalog.json").await.expect("catalog");
    let catalog: StacCatalog = serde_json::from_slice(&catalog_bytes).expect("valid catalog json");
    assert_eq!(
        catalog.children(),
        vec!["https://stac-bucket.s3.amazonaws.com/x/collection.json"]
    );
}

#[tokio::test]
async fn create_refuses_to_overwrite_existing_catalog() {
    let store = Arc::new(MemoryStore::new());
    store
        .put(STAC_BUCKET, "test-catalog.json", Bytes::from("{}"))
        .await
        .expect("seed catalog");

    let mut registry = MemoryRegistry::new();
    seed_dataset(&store, &mut registry, "x", &["v20240101"], "v20240101").await;

    let reconciler = reconciler(store.clone(), registry);
    let err = reconciler.create_catalog(false).await.expect_err("must refuse");
    assert!(err.to_string().contains("already exists"));

    // The operator explicitly choosing to overwrite proceeds.
    reconciler.create_catalog(true).await.expect("overwrite");
}

#[tokio::test]
async fn create_continues_past_failing_dataset() {
    let store = Arc::new(MemoryStore::new());
    let mut registry = MemoryRegistry::new();
    // "broken" is listed but has no descriptor: its fetch fails.
    registry.add_unfetchable_dataset("broken");
    seed_dataset(&store, &mut registry, "x", &["v20240101"], "v20240101").await;

    let report = reconciler(store.clone(), registry)
        .create_catalog(false)
        .await
        .expect("create");

    assert_eq!(report.outcomes.len(), 2);
    assert!(matches!(report.outcomes[0].status, OutcomeStatus::Skipped { .. }));
    assert!(matches!(report.outcomes[1].status, OutcomeStatus::Published { .. }));
    assert!(store.keys(STAC_BUCKET).contains(&"x/collection.json".to_string()));
}

#[tokio::test]
async fn create_fails_when_listing_unreachable() {
    let store = Arc::new(MemoryStore::new());
    let mut registry = MemoryRegistry::new();
    registry.make_listing_fail();

    let err = reconciler(store.clone(), registry)
        .create_catalog(false)
        .await
        .expect_err("must fail");
    assert!(err.to_string().contains("unreachable"));
    // No partial catalog write.
    assert_eq!(store.write_count(), 0);
}

#[tokio::test]
async fn update_is_idempotent_with_no_upstream_change() {
    let store = Arc::new(MemoryStore::new());
    let mut registry = MemoryRegistry::new();
    seed_dataset(&store, &mut registry, "x", &["v20240101"], "v20240101").await;
    let registry = Arc::new(registry);

    let reconciler = CatalogReconciler::new(
        config(),
        store.clone(),
        registry.clone(),
        Arc::new(StaticAreaLookup::new()),
    );

    // First update publishes from scratch (no catalog exists yet).
    let outcome = reconciler.update_catalog("x").await.expect("update");
    assert!(matches!(outcome.status, OutcomeStatus::Published { .. }));

    // Second update with identical upstream state performs zero writes.
    let writes_before = store.write_count();
    let outcome = reconciler.update_catalog("x").await.expect("update");
    assert!(matches!(outcome.status, OutcomeStatus::Unchanged));
    assert_eq!(store.write_count(), writes_before);
}

#[tokio::test]
async fn update_builds_only_new_versions() {
    let store = Arc::new(MemoryStore::new());

    // Initial state: catalog published at v2.
    let mut registry = MemoryRegistry::new();
    seed_dataset(&store, &mut registry, "x", &["v20240101", "v20240201"], "v20240201").await;
    reconciler(store.clone(), registry)
        .create_catalog(false)
        .await
        .expect("create");

    let v1_before = store
        .get(STAC_BUCKET, "x/v20240101/v20240101-collection.json")
        .await
        .expect("v1");
    let v2_before = store
        .get(STAC_BUCKET, "x/v20240201/v20240201-collection.json")
        .await
        .expect("v2");

    // The registry moves on to v4.
    let mut registry = MemoryRegistry::new();
    seed_dataset(
        &store,
        &mut registry,
        "x",
        &["v20240101", "v20240201", "v20240301", "v20240401"],
        "v20240401",
    )
    .await;

    let outcome = reconciler(store.clone(), registry)
        .update_catalog("x")
        .await
        .expect("update");
    assert!(matches!(
        outcome.status,
        OutcomeStatus::Updated { ref previous, ref latest, versions_built: 2 }
            if previous == "v20240201" && latest == "v20240401"
    ));

    // Already-published version documents are untouched, byte for byte.
    assert_eq!(
        store
            .get(STAC_BUCKET, "x/v20240101/v20240101-collection.json")
            .await
            .expect("v1"),
        v1_before
    );
    assert_eq!(
        store
            .get(STAC_BUCKET, "x/v20240201/v20240201-collection.json")
            .await
            .expect("v2"),
        v2_before
    );

    // The new segment splices onto the published chain.
    let v3 = load_collection(&store, "x/v20240301/v20240301-collection.json").await;
    let v4 = load_collection(&store, "x/v20240401/v20240401-collection.json").await;
    assert_eq!(v3.predecessor_href(), Some(version_href("x", "v20240201").as_str()));
    assert_eq!(v3.successor_href(), Some(version_href("x", "v20240401").as_str()));
    assert_eq!(v4.predecessor_href(), Some(version_href("x", "v20240301").as_str()));
    assert_eq!(v4.successor_href(), None);

    let current = load_collection(&store, "x/collection.json").await;
    assert_eq!(current.version.as_deref(), Some("v20240401"));
}

#[tokio::test]
async fn update_keeps_single_catalog_child_per_dataset() {
    let store = Arc::new(MemoryStore::new());
    let mut registry = MemoryRegistry::new();
    seed_dataset(&store, &mut registry, "x", &["v20240101", "v20240201"], "v20240101").await;
    reconciler(store.clone(), registry)
        .create_catalog(false)
        .await
        .expect("create");

    let mut registry = MemoryRegistry::new();
    seed_dataset(&store, &mut registry, "x", &["v20240101", "v20240201"], "v20240201").await;
    reconciler(store.clone(), registry)
        .update_catalog("x")
        .await
        .expect("update");

    let catalog_bytes = store.get(STAC_BUCKET, "test-catalog.json").await.expect("catalog");
    let catalog: StacCatalog = serde_json::from_slice(&catalog_bytes).expect("valid catalog json");
    assert_eq!(
        catalog.children(),
        vec!["https://stac-bucket.s3.amazonaws.com/x/collection.json"]
    );
}
