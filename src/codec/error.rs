use std::fmt::{Display, Formatter};

/// Errors raised while parsing input descriptions or persisting results.
/// Malformed rows fail the ingestion call immediately; the matching core
/// never sees unvalidated records.
#[derive(Debug)]
pub enum CodecError {
    Io(std::io::Error),
    Csv(csv::Error),
    Json(serde_json::Error),
    /// A row is missing a required column.
    MissingField { line: usize, field: &'static str },
    /// A numeric column failed to parse.
    InvalidNumber { line: usize, value: String },
    /// A date/time column failed to parse.
    InvalidTimestamp { line: usize, value: String },
    /// A geometry column failed to parse, or describes fewer than two
    /// vertices.
    InvalidGeometry { line: usize, reason: String },
}

impl Display for CodecError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CodecError::Io(err) => write!(f, "io: {err}"),
            CodecError::Csv(err) => write!(f, "csv: {err}"),
            CodecError::Json(err) => write!(f, "json: {err}"),
            CodecError::MissingField { line, field } => {
                write!(f, "line {line}: missing field `{field}`")
            }
            CodecError::InvalidNumber { line, value } => {
                write!(f, "line {line}: invalid number `{value}`")
            }
            CodecError::InvalidTimestamp { line, value } => {
                write!(f, "line {line}: invalid timestamp `{value}`")
            }
            CodecError::InvalidGeometry { line, reason } => {
                write!(f, "line {line}: invalid geometry: {reason}")
            }
        }
    }
}

impl std::error::Error for CodecError {}

impl From<std::io::Error> for CodecError {
    fn from(value: std::io::Error) -> Self {
        CodecError::Io(value)
    }
}

impl From<csv::Error> for CodecError {
    fn from(value: csv::Error) -> Self {
        CodecError::Csv(value)
    }
}

impl From<serde_json::Error> for CodecError {
    fn from(value: serde_json::Error) -> Self {
        CodecError::Json(value)
    }
}
