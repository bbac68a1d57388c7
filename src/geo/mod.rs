//! Geometry primitives shared by the graph, the spatial index and the
//! matcher.
//!
//! Every component measures distance the same way: haversine great-circle
//! distance over the mean-radius sphere (see [`EARTH_RADIUS`]). The single
//! exception is projection onto a road segment, which works in a local
//! tangent plane for speed; at road-segment scale the error is negligible.

#[doc(hidden)]
pub mod point;

#[doc(inline)]
pub use point::*;
