//! Request regions and the tile selection predicate.
//!
//! A scrape request names its target area as a [`geo::Geometry`] in WGS84.
//! Before discovery the geometry is reprojected into the tile source's SRID and
//! reduced to one or more [`RegionPart`]s: an ordered vertex list plus a flag
//! telling whether the vertices enclose an area. Discovery then asks each part
//! whether a candidate tile footprint touches it.
//!
//! ```text
//! Geometry (WGS84) ──project──▶ Geometry (source SRID) ──parts──▶ [RegionPart]
//!                                                                  │
//!                                          RegionPart::intersects_tile(corners)
//! ```

mod part;

pub use part::RegionPart;

use geo::{Coord, Geometry, MapCoords};

use crate::coord::{self, CoordError};

/// Reprojects a WGS84 geometry into the coordinate system `srid`.
///
/// Geometry coordinates are interpreted as `x = longitude`, `y = latitude`.
pub fn project_geometry(geometry: &Geometry<f64>, srid: i32) -> Result<Geometry<f64>, CoordError> {
    if !coord::is_supported_srid(srid) {
        return Err(CoordError::UnsupportedSrid(srid));
    }
    geometry.try_map_coords(|c: Coord<f64>| {
        coord::project(srid, c.x, c.y).map(|(x, y)| Coord { x, y })
    })
}

/// Reduces a geometry to the vertex lists used by tile discovery.
///
/// Points and lines become open parts, polygons contribute their exterior
/// ring as a closed part, and collections (including the multi-geometries)
/// are flattened recursively. Empty members are dropped.
pub fn parts(geometry: &Geometry<f64>) -> Vec<RegionPart> {
    let mut out = Vec::new();
    collect_parts(geometry, &mut out);
    out
}

fn collect_parts(geometry: &Geometry<f64>, out: &mut Vec<RegionPart>) {
    match geometry {
        Geometry::Point(p) => out.push(RegionPart::new(vec![p.0], false)),
        Geometry::Line(l) => out.push(RegionPart::new(vec![l.start, l.end], false)),
        Geometry::LineString(ls) => push_open(ls.0.clone(), out),
        Geometry::Polygon(poly) => push_closed(poly.exterior().0.clone(), out),
        Geometry::MultiPoint(mp) => {
            for p in &mp.0 {
                out.push(RegionPart::new(vec![p.0], false));
            }
        }
        Geometry::MultiLineString(mls) => {
            for ls in &mls.0 {
                push_open(ls.0.clone(), out);
            }
        }
        Geometry::MultiPolygon(mpoly) => {
            for poly in &mpoly.0 {
                push_closed(poly.exterior().0.clone(), out);
            }
        }
        Geometry::GeometryCollection(gc) => {
            for child in &gc.0 {
                collect_parts(child, out);
            }
        }
        Geometry::Rect(rect) => push_closed(rect.to_polygon().exterior().0.clone(), out),
        Geometry::Triangle(tri) => push_closed(tri.to_polygon().exterior().0.clone(), out),
    }
}

fn push_open(points: Vec<Coord<f64>>, out: &mut Vec<RegionPart>) {
    if !points.is_empty() {
        out.push(RegionPart::new(points, false));
    }
}

fn push_closed(points: Vec<Coord<f64>>, out: &mut Vec<RegionPart>) {
    match points.len() {
        0 => {}
        // Degenerate rings carry no area; treat them as paths
        1..=3 => out.push(RegionPart::new(points, false)),
        _ => out.push(RegionPart::new(points, true)),
    }
}
