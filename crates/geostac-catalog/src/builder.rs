//! Per-version collection building.
//!
//! One version moves through fetch → classify → resolve datetime →
//! construct items → aggregate extent. Every stage can divert to the
//! `Skipped` terminal; a skip is an outcome, never an error, so one bad
//! version cannot abort its dataset's reconciliation.

use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

use geostac_core::{Config, ObjectStore, StacPaths};

use crate::asset::{self, AssetType};
use crate::collection::{Extent, StacCollection, TableColumn};
use crate::datetime::DatetimeResolver;
use crate::error::Result;
use crate::extent::{Footprint, spatial_extent};
use crate::item::{PROJECTION_EXTENSION, RASTER_EXTENSION, StacItem};
use crate::publish::put_json;
use crate::raster::build_raster_items;
use crate::registry::{AreaLookup, DatasetDescriptor, DatasetRegistry};
use crate::tabular::build_tabular_items;

/// Why a version produced no collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The version record could not be fetched from the registry.
    FetchFailed(String),
    /// The version has no assets at all.
    EmptyAssets,
    /// No asset carried a recognized type tag.
    Unclassified,
    /// The classified asset type has no build route.
    Unsupported(AssetType),
    /// No datetime could be resolved for the version.
    NoDatetime,
    /// Item construction yielded zero items.
    NoItems,
    /// Item construction or persistence failed unexpectedly.
    ItemConstruction(String),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FetchFailed(e) => write!(f, "version fetch failed: {e}"),
            Self::EmptyAssets => write!(f, "no assets found"),
            Self::Unclassified => write!(f, "no recognized source asset type"),
            Self::Unsupported(t) => write!(f, "collections not implemented for asset type {t}"),
            Self::NoDatetime => write!(f, "no datetime found"),
            Self::NoItems => write!(f, "no items could be derived"),
            Self::ItemConstruction(e) => write!(f, "item construction failed: {e}"),
        }
    }
}

/// Outcome of building one version.
#[derive(Debug)]
pub enum BuildOutcome {
    /// The version produced a collection; its items (and any group
    /// sub-collections) are already persisted.
    Built(StacCollection),
    /// The version was skipped and contributes nothing.
    Skipped {
        /// The skipped version tag.
        version: String,
        /// Why it was skipped.
        reason: SkipReason,
    },
}

/// Builds one [`StacCollection`] per dataset version.
pub struct VersionCollectionBuilder {
    config: Config,
    store: Arc<dyn ObjectStore>,
    registry: Arc<dyn DatasetRegistry>,
    areas: Arc<dyn AreaLookup>,
    resolver: DatetimeResolver,
}

impl VersionCollectionBuilder {
    /// Creates a builder over the given collaborators.
    #[must_use]
    pub fn new(
        config: Config,
        store: Arc<dyn ObjectStore>,
        registry: Arc<dyn DatasetRegistry>,
        areas: Arc<dyn AreaLookup>,
    ) -> Self {
        let resolver = DatetimeResolver::new(config.datetime_overrides.clone());
        Self {
            config,
            store,
            registry,
            areas,
            resolver,
        }
    }

    /// Builds the collection for one version of a dataset.
    ///
    /// Never fails for a single version: every failure mode degrades to
    /// [`BuildOutcome::Skipped`], logged at warn level.
    pub async fn build(&self, dataset: &DatasetDescriptor, version: &str) -> BuildOutcome {
        match self.try_build(dataset, version).await {
            Ok(Ok(collection)) => {
                info!(dataset = dataset.id, version, "built version collection");
                BuildOutcome::Built(collection)
            }
            Ok(Err(reason)) => {
                warn!(dataset = dataset.id, version, %reason, "skipping version");
                BuildOutcome::Skipped {
                    version: version.to_string(),
                    reason,
                }
            }
            Err(e) => {
                let reason = SkipReason::ItemConstruction(e.to_string());
                warn!(dataset = dataset.id, version, %reason, "skipping version");
                BuildOutcome::Skipped {
                    version: version.to_string(),
                    reason,
                }
            }
        }
    }

    async fn try_build(
        &self,
        dataset: &DatasetDescriptor,
        version: &str,
    ) -> Result<std::result::Result<StacCollection, SkipReason>> {
        let descriptor = match self.registry.version(&dataset.id, version).await {
            Ok(descriptor) => descriptor,
            Err(e) => return Ok(Err(SkipReason::FetchFailed(e.to_string()))),
        };

        if descriptor.assets.is_empty() {
            return Ok(Err(SkipReason::EmptyAssets));
        }
        let Some(asset_type) = asset::classify(&descriptor.assets) else {
            return Ok(Err(SkipReason::Unclassified));
        };
        if !asset_type.is_buildable() {
            return Ok(Err(SkipReason::Unsupported(asset_type)));
        }

        let Some(datetime) = self.resolver.resolve(&dataset.id, version, &descriptor) else {
            return Ok(Err(SkipReason::NoDatetime));
        };

        let mut collection = match asset_type {
            AssetType::RasterTileSet => {
                let groups = build_raster_items(
                    &self.config,
                    self.store.as_ref(),
                    &dataset.id,
                    version,
                    &descriptor.assets,
                    datetime,
                )
                .await?;
                if groups.is_empty() {
                    return Ok(Err(SkipReason::NoItems));
                }
                self.assemble_raster(dataset, version, datetime, groups)
                    .await?
            }
            AssetType::DatabaseTable => {
                let items = build_tabular_items(
                    &self.config,
                    self.registry.as_ref(),
                    self.areas.as_ref(),
                    &dataset.id,
                    version,
                    datetime,
                )
                .await?;
                if items.is_empty() {
                    return Ok(Err(SkipReason::NoItems));
                }
                self.assemble_tabular(dataset, version, datetime, items)
                    .await?
            }
            AssetType::GeoDatabaseTable => return Ok(Err(SkipReason::Unsupported(asset_type))),
        };

        collection.set_self_href(
            self.config
                .public_url(&StacPaths::version_collection(&dataset.id, version)),
        );
        Ok(Ok(collection))
    }

    fn new_collection(
        &self,
        dataset: &DatasetDescriptor,
        extent: Extent,
        stac_extensions: Vec<String>,
    ) -> StacCollection {
        StacCollection::new(
            dataset.id.clone(),
            Some(dataset.title.clone()),
            dataset.overview.clone(),
            extent,
            stac_extensions,
        )
    }

    /// Assembles a raster version collection and persists its items.
    ///
    /// A single-group version holds its items directly; a multi-group
    /// version gets one child sub-collection per group, each with its own
    /// extent over its own items only.
    async fn assemble_raster(
        &self,
        dataset: &DatasetDescriptor,
        version: &str,
        datetime: chrono::DateTime<chrono::Utc>,
        groups: BTreeMap<String, Vec<StacItem>>,
    ) -> Result<StacCollection> {
        let raster_extensions = vec![
            PROJECTION_EXTENSION.to_string(),
            RASTER_EXTENSION.to_string(),
        ];

        let all_footprints: Vec<Footprint> = groups
            .values()
            .flatten()
            .filter_map(StacItem::footprint)
            .collect();
        let parent_bbox = spatial_extent(&all_footprints)?;
        let mut parent = self.new_collection(
            dataset,
            Extent::of_version(parent_bbox, datetime),
            raster_extensions.clone(),
        );

        let multi_group = groups.len() > 1;
        for (group, items) in &groups {
            let path_group = multi_group.then_some(group.as_str());

            if multi_group {
                let footprints: Vec<Footprint> =
                    items.iter().filter_map(StacItem::footprint).collect();
                let bbox = spatial_extent(&footprints)?;
                let mut child = self.new_collection(
                    dataset,
                    Extent::of_version(bbox, datetime),
                    raster_extensions.clone(),
                );
                child.id = format!("{}-{group}", dataset.id);
                let child_key = StacPaths::group_collection(&dataset.id, version, group);
                child.set_self_href(self.config.public_url(&child_key));
                for item in items {
                    if let Some(href) = item.self_href() {
                        child.add_item_link(href);
                    }
                }
                put_json(
                    self.store.as_ref(),
                    &self.config.stac_bucket,
                    &child_key,
                    &child,
                )
                .await?;
                parent.add_child_link(self.config.public_url(&child_key));
            } else {
                for item in items {
                    if let Some(href) = item.self_href() {
                        parent.add_item_link(href);
                    }
                }
            }

            for item in items {
                let key = StacPaths::item(&dataset.id, version, path_group, &item.id);
                put_json(self.store.as_ref(), &self.config.stac_bucket, &key, item).await?;
            }
        }

        Ok(parent)
    }

    /// Assembles a tabular version collection, persists its items, and
    /// attaches column metadata when the registry exposes it.
    async fn assemble_tabular(
        &self,
        dataset: &DatasetDescriptor,
        version: &str,
        datetime: chrono::DateTime<chrono::Utc>,
        items: Vec<StacItem>,
    ) -> Result<StacCollection> {
        let footprints: Vec<Footprint> = items.iter().filter_map(StacItem::footprint).collect();
        let bbox = spatial_extent(&footprints)?;
        let mut collection =
            self.new_collection(dataset, Extent::of_version(bbox, datetime), Vec::new());

        match self.registry.fields(&dataset.id, version).await {
            Ok(fields) if !fields.is_empty() => {
                collection.set_table_columns(
                    fields
                        .into_iter()
                        .map(|f| TableColumn {
                            name: f.field_name,
                            description: f.field_description,
                        })
                        .collect(),
                );
            }
            Ok(_) => {}
            Err(e) => {
                warn!(dataset = dataset.id, version, error = %e, "no column metadata attached");
            }
        }

        for item in &items {
            if let Some(href) = item.self_href() {
                collection.add_item_link(href);
            }
            let key = StacPaths::item(&dataset.id, version, None, &item.id);
            put_json(self.store.as_ref(), &self.config.stac_bucket, &key, item).await?;
        }

        Ok(collection)
    }
}
