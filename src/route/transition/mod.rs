//! Hidden-Markov map matching.
//!
//! Each GPS observation emits a layer of candidate edges found through the
//! spatial index; the Viterbi recurrence scores every candidate against the
//! previous layer using an emission probability (perpendicular distance)
//! and a transition probability (discrepancy between the straight-line and
//! road-network distances), then a backtrace over parent pointers recovers
//! the maximum-likelihood edge sequence, splicing shortest paths between
//! non-adjacent matches so the result is always traversable.

#[doc(hidden)]
pub mod candidate;
#[doc(hidden)]
pub mod probability;
#[doc(hidden)]
pub mod solver;
#[doc(hidden)]
pub mod trace;

#[doc(inline)]
pub use candidate::Candidate;
#[doc(inline)]
pub use probability::{emission_log_probability, transition_log_probability};
#[doc(inline)]
pub use solver::{MatchConfig, Matcher};
#[doc(inline)]
pub use trace::{remove_nearby_points, sort_by_time, GpsPoint};
