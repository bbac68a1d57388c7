#![doc = include_str!("../readme.md")]

pub mod codec;
#[doc(hidden)]
pub mod error;
pub mod geo;
pub mod index;
pub mod route;

#[doc(inline)]
pub use error::{Error, Result};
#[doc(inline)]
pub use index::RangeTree;
#[doc(inline)]
pub use route::graph::Graph;
#[doc(inline)]
pub use route::transition::{MatchConfig, Matcher};
