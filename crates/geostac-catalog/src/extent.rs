//! Spatial extent aggregation over item footprints.
//!
//! A collection's spatial extent is the axis-aligned bounding box of the
//! geometric union of its items' footprints. Bounding-box-only footprints
//! are coerced to rectangular polygons before the union.

use geo::{BoundingRect, Polygon, Rect, coord, unary_union};
use geojson::Geometry;

use geostac_core::Error;

use crate::error::Result;

/// One item's footprint: a polygon geometry, or an axis-aligned bounding box
/// when no geometry is recorded.
#[derive(Debug, Clone)]
pub enum Footprint {
    /// A GeoJSON polygon or multi-polygon geometry.
    Geometry(Geometry),
    /// An axis-aligned bounding box `[west, south, east, north]`.
    Bbox([f64; 4]),
}

impl Footprint {
    fn to_polygons(&self) -> Result<Vec<Polygon<f64>>> {
        match self {
            Self::Bbox(bbox) => Ok(vec![bbox_to_rect(*bbox).to_polygon()]),
            Self::Geometry(geometry) => {
                let geometry = geo::Geometry::<f64>::try_from(geometry).map_err(|e| {
                    Error::InvalidInput(format!("unusable footprint geometry: {e}"))
                })?;
                match geometry {
                    geo::Geometry::Polygon(polygon) => Ok(vec![polygon]),
                    geo::Geometry::MultiPolygon(multi) => Ok(multi.0),
                    other => Err(Error::InvalidInput(format!(
                        "footprint must be a polygon, got {other:?}"
                    ))
                    .into()),
                }
            }
        }
    }
}

fn bbox_to_rect(bbox: [f64; 4]) -> Rect<f64> {
    Rect::new(
        coord! { x: bbox[0], y: bbox[1] },
        coord! { x: bbox[2], y: bbox[3] },
    )
}

/// Computes the union spatial extent of a set of footprints.
///
/// Returns the bounding box `[west, south, east, north]` of the unioned
/// footprint polygons.
///
/// # Errors
///
/// Zero footprints is a caller error (`InvalidInput`) — a version with no
/// derivable items must never reach extent aggregation. Also fails on
/// non-polygon or degenerate geometry.
pub fn spatial_extent(footprints: &[Footprint]) -> Result<[f64; 4]> {
    if footprints.is_empty() {
        return Err(Error::InvalidInput("cannot aggregate extent of zero footprints".into()).into());
    }

    let mut polygons: Vec<Polygon<f64>> = Vec::with_capacity(footprints.len());
    for footprint in footprints {
        polygons.extend(footprint.to_polygons()?);
    }

    let unioned = unary_union(&polygons);
    let bounds = unioned
        .bounding_rect()
        .ok_or_else(|| Error::InvalidInput("footprint union has no bounds".to_string()))?;

    Ok([
        bounds.min().x,
        bounds.min().y,
        bounds.max().x,
        bounds.max().y,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn square(x0: f64, y0: f64, x1: f64, y1: f64) -> Geometry {
        let value = json!({
            "type": "Polygon",
            "coordinates": [[[x0, y0], [x1, y0], [x1, y1], [x0, y1], [x0, y0]]]
        });
        Geometry::from_json_value(value).expect("valid geometry")
    }

    #[test]
    fn test_disjoint_unit_squares_union_bbox() {
        let footprints = vec![
            Footprint::Geometry(square(0.0, 0.0, 1.0, 1.0)),
            Footprint::Geometry(square(2.0, 2.0, 3.0, 3.0)),
        ];

        assert_eq!(
            spatial_extent(&footprints).expect("extent"),
            [0.0, 0.0, 3.0, 3.0]
        );
    }

    #[test]
    fn test_bbox_coerced_to_rectangle() {
        let footprints = vec![
            Footprint::Bbox([10.0, -10.0, 20.0, 0.0]),
            Footprint::Geometry(square(15.0, -5.0, 25.0, 5.0)),
        ];

        assert_eq!(
            spatial_extent(&footprints).expect("extent"),
            [10.0, -10.0, 25.0, 5.0]
        );
    }

    #[test]
    fn test_zero_footprints_is_an_error() {
        assert!(spatial_extent(&[]).is_err());
    }

    #[test]
    fn test_non_polygon_geometry_is_an_error() {
        let point = Geometry::from_json_value(json!({
            "type": "Point",
            "coordinates": [1.0, 2.0]
        }))
        .expect("valid geometry");

        assert!(spatial_extent(&[Footprint::Geometry(point)]).is_err());
    }
}
