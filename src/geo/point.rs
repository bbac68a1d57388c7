use std::f64::consts::PI;

use geo::{Distance, Haversine, LineString, Point, Rect};

/// Mean Earth radius in meters, the radius of the sphere the haversine
/// distance is measured over.
pub const EARTH_RADIUS: f64 = 6_371_008.8;

/// Tolerance of the triangle-equality test in [`is_on_segment`], in meters.
const ON_SEGMENT_EPSILON: f64 = 1e-6;

/// Great-circle distance between two positions, in meters.
#[inline]
pub fn distance(a: Point<f64>, b: Point<f64>) -> f64 {
    Haversine.distance(a, b)
}

/// Offsets a position by `dx` meters eastward and `dy` meters northward.
///
/// Flat-earth approximation with the longitude delta scaled by
/// `1 / cos(latitude)`. Only valid for offsets small relative to
/// [`EARTH_RADIUS`]; used to build query boxes, not to travel.
pub fn offset(origin: Point<f64>, dx: f64, dy: f64) -> Point<f64> {
    let scale = origin.y().to_radians().cos();
    Point::new(
        origin.x() + (180.0 * dx) / (PI * EARTH_RADIUS * scale),
        origin.y() + (180.0 * dy) / (PI * EARTH_RADIUS),
    )
}

/// The axis-aligned box spanning `half_side` meters in each cardinal
/// direction from `center`.
pub fn bounding_square(center: Point<f64>, half_side: f64) -> Rect<f64> {
    Rect::new(
        offset(center, -half_side, -half_side),
        offset(center, half_side, half_side),
    )
}

/// Moves `distance` meters from `origin` toward `target`, interpolating
/// linearly along the connecting segment. Never overshoots the target.
pub fn move_towards(origin: Point<f64>, target: Point<f64>, distance: f64) -> Point<f64> {
    let total = Haversine.distance(origin, target);
    if total <= f64::EPSILON {
        return target;
    }

    let fraction = (distance / total).clamp(0.0, 1.0);
    Point::new(
        origin.x() + (target.x() - origin.x()) * fraction,
        origin.y() + (target.y() - origin.y()) * fraction,
    )
}

/// Projects `point` onto the segment `[a, b]`, clamping the projection
/// parameter to `[0, 1]` so the result always lies on the segment itself.
///
/// The projection happens in a local tangent frame anchored at `a`, with
/// longitudes scaled by `cos(latitude)`.
pub fn closest_point_on_segment(point: Point<f64>, a: Point<f64>, b: Point<f64>) -> Point<f64> {
    let scale = a.y().to_radians().cos();

    let (px, py) = ((point.x() - a.x()) * scale, point.y() - a.y());
    let (bx, by) = ((b.x() - a.x()) * scale, b.y() - a.y());

    let length_squared = bx * bx + by * by;
    if length_squared <= f64::EPSILON {
        return a;
    }

    let t = ((px * bx + py * by) / length_squared).clamp(0.0, 1.0);
    Point::new(a.x() + (b.x() - a.x()) * t, a.y() + (b.y() - a.y()) * t)
}

/// The closest point to `point` over all of a polyline's segments.
/// Ties go to the earliest segment.
pub fn closest_point_on_line_string(point: Point<f64>, line: &LineString<f64>) -> Point<f64> {
    project_onto_line_string(point, line).1
}

/// Projects onto every segment of the polyline, keeping the first segment
/// with minimal distance. Returns `(segment index, projected point)`.
fn project_onto_line_string(point: Point<f64>, line: &LineString<f64>) -> (usize, Point<f64>) {
    let mut best = (0, Point::from(line.0[0]));
    let mut best_distance = f64::INFINITY;

    for (index, segment) in line.0.windows(2).enumerate() {
        let projected =
            closest_point_on_segment(point, Point::from(segment[0]), Point::from(segment[1]));
        let candidate = Haversine.distance(point, projected);
        if candidate < best_distance {
            best = (index, projected);
            best_distance = candidate;
        }
    }

    best
}

/// Whether `point` lies on the segment `[a, b]`, up to a triangle-equality
/// tolerance: `|dist(a,b) - (dist(a,p) + dist(p,b))| < ε`. Callers must
/// tolerate the epsilon; this is not an exact containment test.
pub fn is_on_segment(point: Point<f64>, a: Point<f64>, b: Point<f64>) -> bool {
    let through = Haversine.distance(a, point) + Haversine.distance(point, b);
    (Haversine.distance(a, b) - through).abs() < ON_SEGMENT_EPSILON
}

/// Total arc length of a polyline: the sum of consecutive-vertex
/// great-circle distances, in meters.
pub fn line_length(line: &LineString<f64>) -> f64 {
    line.0
        .windows(2)
        .map(|segment| Haversine.distance(Point::from(segment[0]), Point::from(segment[1])))
        .sum()
}

/// Arc length along `line` from its start to the closest point on the
/// polyline to `point`.
pub fn length_to(line: &LineString<f64>, point: Point<f64>) -> f64 {
    let (segment, target) = project_onto_line_string(point, line);

    let mut length = 0.0;
    for covered in line.0.windows(2).take(segment) {
        length += Haversine.distance(Point::from(covered[0]), Point::from(covered[1]));
    }

    length + Haversine.distance(Point::from(line.0[segment]), target)
}

/// Positions spaced at most `spacing` meters apart along a polyline,
/// always including every vertex.
pub fn sample_line_string(line: &LineString<f64>, spacing: f64) -> Vec<Point<f64>> {
    let mut samples = Vec::with_capacity(line.0.len());

    for segment in line.0.windows(2) {
        let (a, b) = (Point::from(segment[0]), Point::from(segment[1]));
        samples.push(a);

        let length = Haversine.distance(a, b);
        let mut cursor = a;
        let mut travelled = spacing;
        while travelled < length {
            cursor = move_towards(cursor, b, spacing);
            samples.push(cursor);
            travelled += spacing;
        }
    }

    if let Some(last) = line.0.last() {
        samples.push(Point::from(*last));
    }

    samples
}
