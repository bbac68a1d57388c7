use std::fmt::{Display, Formatter};

use crate::codec::error::CodecError;
use crate::route::error::{MatchError, RouteError};

/// Converts errors from their error type (of the submodule) to that of
/// a crate-level [`Error`] variant.
///
/// ```rust,ignore
/// use roadsnap::route::error::RouteError;
/// roadsnap::impl_err!(RouteError, Route);
/// ```
#[macro_export]
macro_rules! impl_err {
    ($from:ty, $variant:ident) => {
        impl From<$from> for $crate::Error {
            fn from(value: $from) -> Self {
                $crate::Error::$variant(value)
            }
        }
    };
}

/// Crate-level error, aggregating each submodule's error type.
#[derive(Debug)]
pub enum Error {
    Route(RouteError),
    Match(MatchError),
    Codec(CodecError),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Route(err) => write!(f, "route: {err}"),
            Error::Match(err) => write!(f, "match: {err}"),
            Error::Codec(err) => write!(f, "codec: {err}"),
        }
    }
}

impl std::error::Error for Error {}

impl_err!(RouteError, Route);
impl_err!(MatchError, Match);
impl_err!(CodecError, Codec);
