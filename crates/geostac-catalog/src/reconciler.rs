//! Catalog reconciliation: full creation and incremental update.
//!
//! `create` enumerates every dataset the registry knows and publishes the
//! whole catalog from scratch; `update` diffs one dataset's published state
//! against the registry and builds only what is missing. Datasets are
//! processed strictly sequentially, and each dataset fails independently:
//! a dataset that cannot be built is reported and left out, never allowed
//! to abort the rest of the run.

use std::sync::Arc;
use tracing::{error, info, warn};

use geostac_core::{Config, Error, ObjectStore, StacPaths};

use crate::builder::{BuildOutcome, VersionCollectionBuilder};
use crate::chainer::chain_and_publish;
use crate::collection::{StacCatalog, StacCollection};
use crate::error::{CatalogError, Result};
use crate::publish::{get_json, put_json};
use crate::registry::{AreaLookup, DatasetDescriptor, DatasetRegistry};

// ============================================================================
// Run reporting
// ============================================================================

/// What one run did for one dataset.
#[derive(Debug, Clone)]
pub enum OutcomeStatus {
    /// The dataset's collection was published for the first time.
    Published {
        /// The version now designated latest.
        latest: String,
        /// How many version collections were built.
        versions_built: usize,
    },
    /// The dataset's collection was advanced to a newer latest version.
    Updated {
        /// The previously recorded latest version.
        previous: String,
        /// The version now designated latest.
        latest: String,
        /// How many version collections were built.
        versions_built: usize,
    },
    /// The published state already matches the registry; nothing written.
    Unchanged,
    /// The dataset was skipped.
    Skipped {
        /// Why it was skipped.
        reason: String,
    },
    /// Processing the dataset failed unexpectedly.
    Failed {
        /// The error that stopped this dataset.
        error: String,
    },
}

impl std::fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Published {
                latest,
                versions_built,
            } => write!(f, "published at {latest} ({versions_built} versions built)"),
            Self::Updated {
                previous,
                latest,
                versions_built,
            } => write!(
                f,
                "updated {previous} -> {latest} ({versions_built} versions built)"
            ),
            Self::Unchanged => write!(f, "unchanged"),
            Self::Skipped { reason } => write!(f, "skipped: {reason}"),
            Self::Failed { error } => write!(f, "failed: {error}"),
        }
    }
}

/// Per-dataset outcome of a run.
#[derive(Debug, Clone)]
pub struct DatasetOutcome {
    /// The dataset identifier.
    pub dataset: String,
    /// What happened.
    pub status: OutcomeStatus,
}

/// Report over all datasets touched by one run.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// Per-dataset outcomes, in processing order.
    pub outcomes: Vec<DatasetOutcome>,
}

impl RunReport {
    /// Number of datasets published or updated.
    #[must_use]
    pub fn changed_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| {
                matches!(
                    o.status,
                    OutcomeStatus::Published { .. } | OutcomeStatus::Updated { .. }
                )
            })
            .count()
    }
}

enum FullBuild {
    Built {
        current: StacCollection,
        latest: String,
        versions_built: usize,
    },
    Skipped(String),
}

// ============================================================================
// Reconciler
// ============================================================================

/// Top-level orchestrator over the registry, builder, and object store.
pub struct CatalogReconciler {
    config: Config,
    store: Arc<dyn ObjectStore>,
    registry: Arc<dyn DatasetRegistry>,
    builder: VersionCollectionBuilder,
}

impl CatalogReconciler {
    /// Creates a reconciler over the given collaborators.
    #[must_use]
    pub fn new(
        config: Config,
        store: Arc<dyn ObjectStore>,
        registry: Arc<dyn DatasetRegistry>,
        areas: Arc<dyn AreaLookup>,
    ) -> Self {
        let builder = VersionCollectionBuilder::new(
            config.clone(),
            store.clone(),
            registry.clone(),
            areas,
        );
        Self {
            config,
            store,
            registry,
            builder,
        }
    }

    /// Creates the catalog from scratch, covering every registry dataset.
    ///
    /// # Errors
    ///
    /// Fails when a catalog document already exists (unless `overwrite` is
    /// set) or when the registry's dataset listing is unreachable. Both
    /// abort the run before anything is written.
    pub async fn create_catalog(&self, overwrite: bool) -> Result<RunReport> {
        let catalog_key = StacPaths::catalog(&self.config.catalog_name);
        if !overwrite
            && self
                .store
                .exists(&self.config.stac_bucket, &catalog_key)
                .await?
        {
            return Err(CatalogError::CatalogExists { key: catalog_key });
        }

        let ids = self.registry.list_datasets().await?;
        info!(datasets = ids.len(), "creating catalog");

        let mut catalog = self.new_catalog();
        let mut outcomes = Vec::with_capacity(ids.len());
        for id in ids {
            let status = match self.create_dataset(&mut catalog, &id).await {
                Ok(status) => status,
                Err(e) => {
                    error!(dataset = id, error = %e, "dataset build failed");
                    OutcomeStatus::Failed {
                        error: e.to_string(),
                    }
                }
            };
            outcomes.push(DatasetOutcome {
                dataset: id,
                status,
            });
        }

        put_json(
            self.store.as_ref(),
            &self.config.stac_bucket,
            &catalog_key,
            &catalog,
        )
        .await?;

        Ok(RunReport { outcomes })
    }

    /// Incrementally updates one dataset in the published catalog.
    ///
    /// # Errors
    ///
    /// Fails only on catalog-level storage errors; per-dataset problems are
    /// reported in the returned outcome.
    pub async fn update_catalog(&self, dataset: &str) -> Result<DatasetOutcome> {
        let report = self.update_all(Some(vec![dataset.to_string()])).await?;
        report
            .outcomes
            .into_iter()
            .next()
            .ok_or_else(|| Error::internal("update produced no outcome").into())
    }

    /// Incrementally updates the given datasets, or every registry dataset
    /// when none are named.
    ///
    /// # Errors
    ///
    /// Fails when the default dataset set cannot be resolved from the
    /// registry, or on catalog-level storage errors.
    pub async fn update_all(&self, datasets: Option<Vec<String>>) -> Result<RunReport> {
        let ids = match datasets {
            Some(ids) => ids,
            None => self.registry.list_datasets().await?,
        };

        let mut catalog = self.load_or_new_catalog().await?;
        let mut outcomes = Vec::with_capacity(ids.len());
        let mut dirty = false;
        for id in ids {
            let status = match self.update_dataset(&mut catalog, &id).await {
                Ok(status) => status,
                Err(e) => {
                    error!(dataset = id, error = %e, "dataset update failed");
                    OutcomeStatus::Failed {
                        error: e.to_string(),
                    }
                }
            };
            dirty |= matches!(
                status,
                OutcomeStatus::Published { .. } | OutcomeStatus::Updated { .. }
            );
            outcomes.push(DatasetOutcome {
                dataset: id,
                status,
            });
        }

        if dirty {
            let catalog_key = StacPaths::catalog(&self.config.catalog_name);
            put_json(
                self.store.as_ref(),
                &self.config.stac_bucket,
                &catalog_key,
                &catalog,
            )
            .await?;
        }

        Ok(RunReport { outcomes })
    }

    fn new_catalog(&self) -> StacCatalog {
        let mut catalog = StacCatalog::new(
            self.config.catalog_name.clone(),
            format!(
                "STAC catalog for datasets served by {}",
                self.config.data_api_url
            ),
        );
        catalog.set_self_href(
            self.config
                .public_url(&StacPaths::catalog(&self.config.catalog_name)),
        );
        catalog
    }

    async fn load_or_new_catalog(&self) -> Result<StacCatalog> {
        let catalog_key = StacPaths::catalog(&self.config.catalog_name);
        match get_json(
            self.store.as_ref(),
            &self.config.stac_bucket,
            &catalog_key,
        )
        .await
        {
            Ok(catalog) => Ok(catalog),
            Err(CatalogError::Core(e)) if e.is_not_found() => Ok(self.new_catalog()),
            Err(e) => Err(e),
        }
    }

    /// Publishes a dataset's current collection and attaches it to the
    /// catalog. Called only once the version chain behind it is durable.
    async fn publish_current(
        &self,
        catalog: &mut StacCatalog,
        id: &str,
        current: &StacCollection,
    ) -> Result<()> {
        let key = StacPaths::dataset_collection(id);
        put_json(self.store.as_ref(), &self.config.stac_bucket, &key, current).await?;
        catalog.set_child(self.config.public_url(&key));
        Ok(())
    }

    async fn create_dataset(
        &self,
        catalog: &mut StacCatalog,
        id: &str,
    ) -> Result<OutcomeStatus> {
        match self.full_build(id).await? {
            FullBuild::Built {
                current,
                latest,
                versions_built,
            } => {
                self.publish_current(catalog, id, &current).await?;
                Ok(OutcomeStatus::Published {
                    latest,
                    versions_built,
                })
            }
            FullBuild::Skipped(reason) => {
                warn!(dataset = id, reason, "skipping dataset");
                Ok(OutcomeStatus::Skipped { reason })
            }
        }
    }

    async fn update_dataset(
        &self,
        catalog: &mut StacCatalog,
        id: &str,
    ) -> Result<OutcomeStatus> {
        let key = StacPaths::dataset_collection(id);
        let existing: StacCollection = match get_json(
            self.store.as_ref(),
            &self.config.stac_bucket,
            &key,
        )
        .await
        {
            Ok(collection) => collection,
            Err(CatalogError::Core(e)) if e.is_not_found() => {
                info!(dataset = id, "no published collection, running full build");
                return self.create_dataset(catalog, id).await;
            }
            Err(e) => return Err(e),
        };

        let Some(recorded) = existing.version.clone() else {
            warn!(dataset = id, "published collection has no version tag, rebuilding");
            return self.create_dataset(catalog, id).await;
        };

        let descriptor = match self.registry.dataset(id).await {
            Ok(descriptor) => descriptor,
            Err(e) => {
                return Ok(OutcomeStatus::Skipped {
                    reason: format!("dataset fetch failed: {e}"),
                });
            }
        };
        let latest = match self.resolve_latest(&descriptor).await {
            Ok(Some(latest)) => latest,
            Ok(None) => {
                return Ok(OutcomeStatus::Skipped {
                    reason: "no versions".to_string(),
                });
            }
            Err(e) => {
                return Ok(OutcomeStatus::Skipped {
                    reason: format!("latest version lookup failed: {e}"),
                });
            }
        };

        if latest == recorded {
            info!(dataset = id, latest, "catalog already at latest version");
            return Ok(OutcomeStatus::Unchanged);
        }

        let Some(included) = included_versions(&descriptor, &latest) else {
            return Ok(OutcomeStatus::Skipped {
                reason: format!("latest version {latest} not in version list"),
            });
        };
        let new_versions: Vec<String> = included
            .into_iter()
            .filter(|v| v.as_str() > recorded.as_str())
            .collect();
        if new_versions.is_empty() {
            warn!(
                dataset = id,
                recorded, latest, "registry latest is not newer than published version"
            );
            return Ok(OutcomeStatus::Unchanged);
        }

        let built = self.build_versions(&descriptor, &new_versions).await;
        if built.is_empty() {
            return Ok(OutcomeStatus::Skipped {
                reason: format!("no buildable versions newer than {recorded}"),
            });
        }
        let versions_built = built.len();

        let seed = self
            .config
            .public_url(&StacPaths::version_collection(id, &recorded));
        let current = chain_and_publish(
            self.store.as_ref(),
            &self.config,
            id,
            built,
            &latest,
            Some(seed),
        )
        .await?;

        // The new chain segment is durable; only now repoint "current".
        self.publish_current(catalog, id, &current).await?;
        Ok(OutcomeStatus::Updated {
            previous: recorded,
            latest,
            versions_built,
        })
    }

    async fn full_build(&self, id: &str) -> Result<FullBuild> {
        let descriptor = match self.registry.dataset(id).await {
            Ok(descriptor) => descriptor,
            Err(e) => {
                return Ok(FullBuild::Skipped(format!("dataset fetch failed: {e}")));
            }
        };
        if descriptor.versions.is_empty() {
            return Ok(FullBuild::Skipped("no versions".to_string()));
        }

        let latest = match self.resolve_latest(&descriptor).await {
            Ok(Some(latest)) => latest,
            Ok(None) => return Ok(FullBuild::Skipped("no versions".to_string())),
            Err(e) => {
                return Ok(FullBuild::Skipped(format!(
                    "latest version lookup failed: {e}"
                )));
            }
        };

        let Some(included) = included_versions(&descriptor, &latest) else {
            return Ok(FullBuild::Skipped(format!(
                "latest version {latest} not in version list"
            )));
        };

        let built = self.build_versions(&descriptor, &included).await;
        if built.is_empty() {
            return Ok(FullBuild::Skipped("no buildable versions".to_string()));
        }
        let versions_built = built.len();

        let current = chain_and_publish(
            self.store.as_ref(),
            &self.config,
            id,
            built,
            &latest,
            None,
        )
        .await?;

        Ok(FullBuild::Built {
            current,
            latest,
            versions_built,
        })
    }

    async fn resolve_latest(&self, descriptor: &DatasetDescriptor) -> Result<Option<String>> {
        match self.registry.latest_version(&descriptor.id).await? {
            Some(latest) => Ok(Some(latest)),
            None => {
                warn!(
                    dataset = descriptor.id,
                    "registry has no latest designation, falling back to lexically greatest"
                );
                Ok(descriptor.versions.iter().max().cloned())
            }
        }
    }

    async fn build_versions(
        &self,
        descriptor: &DatasetDescriptor,
        versions: &[String],
    ) -> Vec<(String, StacCollection)> {
        let mut built = Vec::with_capacity(versions.len());
        for version in versions {
            match self.builder.build(descriptor, version).await {
                BuildOutcome::Built(collection) => built.push((version.clone(), collection)),
                BuildOutcome::Skipped { .. } => {}
            }
        }
        built
    }
}

/// Versions up to and including the designated latest, in ascending order.
///
/// Versions the registry lists after its latest designation are
/// pre-releases and never built. Returns `None` when the designation is not
/// in the version list at all.
fn included_versions(descriptor: &DatasetDescriptor, latest: &str) -> Option<Vec<String>> {
    let position = descriptor.versions.iter().position(|v| v == latest)?;
    let mut included = descriptor.versions[..=position].to_vec();
    included.sort();
    Some(included)
}
