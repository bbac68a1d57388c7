use geo::{LineString, Point};

use crate::geo::{closest_point_on_line_string, length_to, line_length};

/// A road-network vertex.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: String,
    pub position: Point<f64>,
}

impl Node {
    pub fn new(id: impl Into<String>, position: Point<f64>) -> Self {
        Node {
            id: id.into(),
            position,
        }
    }
}

/// A directed road segment.
///
/// Immutable once created. A two-way road is modelled as two independent
/// edges, the second carrying its own identifier and the reversed polyline,
/// never as a flag on a shared edge.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub id: String,
    /// Identifier of the node the edge leaves from.
    pub source: String,
    /// Identifier of the node the edge arrives at.
    pub target: String,
    /// Free-flow speed; a value of zero means "unknown" and defers to the
    /// graph's fallback average speed in travel-time costing.
    pub speed: f64,
    /// Ordered polyline of the road geometry, at least two vertices.
    pub geometry: LineString<f64>,
    /// Total arc length in meters, the sum of consecutive-vertex
    /// great-circle distances.
    pub length: f64,
}

impl Edge {
    pub(crate) fn new(
        id: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
        speed: f64,
        geometry: LineString<f64>,
    ) -> Self {
        debug_assert!(geometry.0.len() >= 2, "edge polyline needs two vertices");

        let length = line_length(&geometry);
        Edge {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            speed,
            geometry,
            length,
        }
    }

    /// The closest point on this edge's polyline to `point`.
    pub fn closest_point(&self, point: Point<f64>) -> Point<f64> {
        closest_point_on_line_string(point, &self.geometry)
    }

    /// Arc length from the edge start to the closest point on the edge to
    /// `point`.
    pub fn length_to(&self, point: Point<f64>) -> f64 {
        length_to(&self.geometry, point)
    }

    /// Arc length from the closest point on the edge to `point`, through to
    /// the edge end. Complements [`Edge::length_to`] exactly.
    pub fn length_from(&self, point: Point<f64>) -> f64 {
        self.length - self.length_to(point)
    }
}
