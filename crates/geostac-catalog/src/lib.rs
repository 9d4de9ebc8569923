//! # geostac-catalog
//!
//! Builds and incrementally updates a static STAC catalog of geospatial
//! dataset metadata from an upstream dataset registry, publishing JSON
//! documents to an object store.
//!
//! ## Pipeline
//!
//! For each dataset version: classify its assets ([`asset`]), resolve its
//! datetime ([`datetime`]), construct its items ([`builder`]), aggregate
//! their footprints into a spatial extent ([`extent`]), then link the
//! resulting collections into a predecessor/successor chain ([`chainer`])
//! and promote the designated latest version to the catalog root
//! ([`reconciler`]).
//!
//! ## Published layout
//!
//! ```text
//! {catalog}.json
//! {dataset}/collection.json                        # current (latest) view
//! {dataset}/{version}/{version}-collection.json    # chained per-version view
//! {dataset}/{version}/{items|group}/{item}.json
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]

pub mod asset;
pub mod builder;
pub mod chainer;
pub mod collection;
pub mod datetime;
pub mod error;
pub mod extent;
pub mod item;
mod publish;
mod raster;
pub mod reconciler;
pub mod registry;
mod tabular;

pub use asset::{AssetType, classify};
pub use builder::{BuildOutcome, SkipReason, VersionCollectionBuilder};
pub use collection::{Extent, StacCatalog, StacCollection, TableColumn};
pub use error::{CatalogError, Result};
pub use extent::{Footprint, spatial_extent};
pub use item::{StacAsset, StacItem};
pub use reconciler::{CatalogReconciler, DatasetOutcome, OutcomeStatus, RunReport};
pub use registry::{
    AreaLookup, DatasetDescriptor, DatasetRegistry, FieldDescriptor, HttpAreaLookup, HttpRegistry,
    MemoryRegistry, RawAsset, StaticAreaLookup, VersionDescriptor,
};
