//! Version chain linking and publication.
//!
//! Collections arrive in ascending version order. Chaining annotates each
//! with its version tag, wires predecessor/successor links between
//! neighbors, publishes every entry at its versioned location, and returns
//! a clone of the designated latest entry retargeted to the dataset's
//! stable, version-independent location.
//!
//! The registry's latest designation is authoritative over chronology: the
//! designated entry need not be the last one in the chain.

use tracing::warn;

use geostac_core::{Config, Error, ObjectStore, StacPaths};

use crate::collection::StacCollection;
use crate::error::Result;
use crate::publish::put_json;

/// Chains and publishes a dataset's version collections.
///
/// `entries` must be in ascending version order. `predecessor_seed`, when
/// given, becomes the first entry's predecessor link — it points at the
/// already-published collection an update segment splices onto.
///
/// Returns the "current" collection: a clone of the latest entry whose self
/// location is `{dataset}/collection.json`. The clone is not persisted
/// here; the caller publishes it once the whole chain is durable.
///
/// # Errors
///
/// Fails on an empty chain (caller error) or when publishing an entry
/// fails.
pub async fn chain_and_publish(
    store: &dyn ObjectStore,
    config: &Config,
    dataset: &str,
    mut entries: Vec<(String, StacCollection)>,
    latest: &str,
    predecessor_seed: Option<String>,
) -> Result<StacCollection> {
    if entries.is_empty() {
        return Err(Error::InvalidInput(format!("no collections to chain for {dataset}")).into());
    }

    let hrefs: Vec<String> = entries
        .iter()
        .map(|(version, _)| config.public_url(&StacPaths::version_collection(dataset, version)))
        .collect();

    let last = entries.len() - 1;
    for (index, (version, collection)) in entries.iter_mut().enumerate() {
        collection.set_version(version.clone());
        collection.set_self_href(hrefs[index].clone());

        if index > 0 {
            collection.set_predecessor(hrefs[index - 1].clone());
        } else if let Some(seed) = &predecessor_seed {
            collection.set_predecessor(seed.clone());
        }
        if index < last {
            collection.set_successor(hrefs[index + 1].clone());
        }

        let key = StacPaths::version_collection(dataset, version);
        put_json(store, &config.stac_bucket, &key, collection).await?;
    }

    let designated = entries
        .iter()
        .position(|(version, _)| version == latest)
        .unwrap_or_else(|| {
            warn!(
                dataset,
                latest, "latest version not among built collections, using last entry"
            );
            last
        });

    let current_href = config.public_url(&StacPaths::dataset_collection(dataset));
    Ok(entries[designated].1.clone_with_self_href(current_href))
}
