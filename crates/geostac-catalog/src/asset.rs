//! Asset type classification for dataset versions.
//!
//! A version may expose several representations of the same data (a raster
//! tile set alongside a queryable table, say). Classification picks the one
//! semantic type the STAC collection is built from.

use tracing::warn;

use crate::registry::RawAsset;

/// The recognized source asset types, as a closed enumeration.
///
/// Registry tags outside this vocabulary never classify; an unclassified
/// version is skipped by the caller, not failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetType {
    /// A queryable database table.
    DatabaseTable,
    /// A set of raster tiles.
    RasterTileSet,
    /// A geometry-bearing database table.
    GeoDatabaseTable,
}

impl AssetType {
    /// The registry tag for this asset type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::DatabaseTable => "Database table",
            Self::RasterTileSet => "Raster tile set",
            Self::GeoDatabaseTable => "Geo database table",
        }
    }

    /// Parses a registry tag, case-insensitively.
    #[must_use]
    pub fn parse(tag: &str) -> Option<Self> {
        let tag = tag.trim();
        [Self::DatabaseTable, Self::RasterTileSet, Self::GeoDatabaseTable]
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(tag))
    }

    /// Whether collections can be built from this asset type.
    ///
    /// Geo database tables classify but have no build route; tabular column
    /// metadata attaches on the `DatabaseTable` route only.
    #[must_use]
    pub const fn is_buildable(&self) -> bool {
        matches!(self, Self::DatabaseTable | Self::RasterTileSet)
    }
}

impl std::fmt::Display for AssetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Classifies a version's asset list to one source asset type.
///
/// Priority order: database table, then raster tile set, then geo database
/// table. A table takes precedence because it is the richest queryable
/// representation of the data.
///
/// Returns `None`, logged as a warning, when no asset carries a recognized
/// tag; callers skip the version rather than failing the reconciliation.
#[must_use]
pub fn classify(assets: &[RawAsset]) -> Option<AssetType> {
    let present = |wanted: AssetType| {
        assets
            .iter()
            .any(|a| AssetType::parse(&a.asset_type) == Some(wanted))
    };

    for candidate in [
        AssetType::DatabaseTable,
        AssetType::RasterTileSet,
        AssetType::GeoDatabaseTable,
    ] {
        if present(candidate) {
            return Some(candidate);
        }
    }

    warn!("did not detect one of the known source asset types");
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_table_beats_raster() {
        let assets = vec![
            RawAsset::new("Raster tile set", "s3://bucket/raster"),
            RawAsset::new("Database table", "table_location"),
        ];
        assert_eq!(classify(&assets), Some(AssetType::DatabaseTable));
    }

    #[test]
    fn test_raster_beats_geo_table() {
        let assets = vec![
            RawAsset::new("Geo database table", "geo_location"),
            RawAsset::new("Raster tile set", "s3://bucket/raster"),
        ];
        assert_eq!(classify(&assets), Some(AssetType::RasterTileSet));
    }

    #[test]
    fn test_tag_match_is_case_insensitive() {
        let assets = vec![RawAsset::new("geo database table", "geo_location")];
        assert_eq!(classify(&assets), Some(AssetType::GeoDatabaseTable));
    }

    #[test]
    fn test_unrecognized_tags_do_not_classify() {
        let assets = vec![
            RawAsset::new("ESRI Shapefile", "s3://bucket/shp"),
            RawAsset::new("csv", "s3://bucket/csv"),
        ];
        assert_eq!(classify(&assets), None);
        assert_eq!(classify(&[]), None);
    }

    #[test]
    fn test_geo_table_recognized_but_unsupported() {
        // Policy pin: geo database tables classify, yet have no build route.
        let geo = classify(&[RawAsset::new("Geo database table", "loc")]).expect("classifies");
        assert!(!geo.is_buildable());
        assert!(AssetType::DatabaseTable.is_buildable());
        assert!(AssetType::RasterTileSet.is_buildable());
    }
}
