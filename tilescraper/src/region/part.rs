//! A single reduced piece of a request region.

use geo::{Coord, Intersects, Line, LineString, Polygon, Rect};

/// Ordered vertices of one region member, in source projection units.
///
/// Closed parts describe an area (a polygon's exterior ring); open parts
/// describe a point or a path.
#[derive(Debug, Clone)]
pub struct RegionPart {
    points: Vec<Coord<f64>>,
    closed: bool,
    segments: Vec<Line<f64>>,
    area: Option<Polygon<f64>>,
}

impl RegionPart {
    /// Creates a part from its vertices.
    ///
    /// `points` must not be empty.
    pub fn new(points: Vec<Coord<f64>>, closed: bool) -> Self {
        debug_assert!(!points.is_empty(), "region part needs at least one vertex");

        let segments = points
            .windows(2)
            .map(|pair| Line::new(pair[0], pair[1]))
            .collect();
        let area = closed.then(|| Polygon::new(LineString::from(points.clone()), vec![]));

        Self {
            points,
            closed,
            segments,
            area,
        }
    }

    /// The part's vertices.
    pub fn points(&self) -> &[Coord<f64>] {
        &self.points
    }

    /// Whether the vertices enclose an area.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Axis-aligned envelope of the vertices.
    pub fn envelope(&self) -> Rect<f64> {
        let first = self.points[0];
        let (min, max) = self.points.iter().fold((first, first), |(min, max), c| {
            (
                Coord {
                    x: min.x.min(c.x),
                    y: min.y.min(c.y),
                },
                Coord {
                    x: max.x.max(c.x),
                    y: max.y.max(c.y),
                },
            )
        });
        Rect::new(min, max)
    }

    /// Decides whether a tile footprint touches this part.
    ///
    /// `corners` are the tile's corners in ring order. A tile is selected when
    /// the part's first vertex lies in the tile, when any tile edge crosses a
    /// part edge, or (for closed parts) when the tile's first corner lies
    /// inside the part. All tests include boundaries.
    pub fn intersects_tile(&self, corners: &[Coord<f64>; 4]) -> bool {
        let footprint = Rect::new(corners[0], corners[2]);
        if footprint.intersects(&self.points[0]) {
            return true;
        }

        // A lone point is decided by containment alone
        if self.segments.is_empty() {
            return false;
        }

        let edges = [
            Line::new(corners[0], corners[1]),
            Line::new(corners[1], corners[2]),
            Line::new(corners[2], corners[3]),
            Line::new(corners[3], corners[0]),
        ];
        let crosses = edges
            .iter()
            .any(|edge| self.segments.iter().any(|segment| edge.intersects(segment)));
        if crosses {
            return true;
        }

        match &self.area {
            Some(area) => area.intersects(&corners[0]),
            None => false,
        }
    }
}
