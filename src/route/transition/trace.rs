use chrono::NaiveDateTime;
use geo::{Distance, Haversine, Point};

/// An observed GPS fix: a position plus its timestamp.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GpsPoint {
    pub position: Point<f64>,
    pub time: NaiveDateTime,
}

impl GpsPoint {
    pub fn new(position: Point<f64>, time: NaiveDateTime) -> Self {
        GpsPoint { position, time }
    }

    /// Great-circle distance to another fix, in meters.
    pub fn distance(&self, other: &GpsPoint) -> f64 {
        Haversine.distance(self.position, other.position)
    }

    /// Elapsed seconds from `other` to this fix. Negative when `other` is
    /// later.
    pub fn seconds_since(&self, other: &GpsPoint) -> f64 {
        (self.time - other.time).num_milliseconds() as f64 / 1_000.0
    }
}

/// Sorts fixes ascending by timestamp. The sort is stable: equal
/// timestamps keep their original order.
pub fn sort_by_time(points: &mut [GpsPoint]) {
    points.sort_by_key(|point| point.time);
}

/// Collapses consecutive fixes closer than `min_distance` meters to the
/// last retained fix, damping noise-driven zig-zag candidates without
/// losing path shape.
///
/// Consecutive survivors are always at least `min_distance` apart, so a
/// second application removes nothing further.
pub fn remove_nearby_points(points: &[GpsPoint], min_distance: f64) -> Vec<GpsPoint> {
    let mut kept: Vec<GpsPoint> = Vec::with_capacity(points.len());

    for point in points {
        match kept.last() {
            Some(last) if Haversine.distance(last.position, point.position) < min_distance => {}
            _ => kept.push(*point),
        }
    }

    kept
}
