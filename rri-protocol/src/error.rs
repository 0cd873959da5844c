//! Protocol error types.

use thiserror::Error;

/// Errors raised while reading or validating a frame.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("empty frame")]
    Empty,

    #[error("frame too large: {size} bytes (max {max})")]
    TooLarge { size: u32, max: u32 },

    #[error("payload of {size} bytes does not fit a 32-bit length prefix")]
    LengthOverflow { size: usize },

    #[error("connection closed before {expected} payload bytes were received")]
    ConnectionClosed { expected: usize },

    #[error("invalid UTF-8 in payload")]
    InvalidUtf8,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised when a frame payload is not a well-formed response.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed response line {line}: {content:?}")]
    MalformedLine { line: usize, content: String },

    #[error("response has no RESULT field")]
    MissingResult,

    #[error("unknown RESULT value: {0:?}")]
    UnknownResult(String),
}

/// Errors raised when text cannot be parsed into a query.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryParseError {
    #[error("line {line}: missing ':' or '=' separator")]
    MissingSeparator { line: usize },

    #[error("line {line}: empty field name")]
    EmptyKey { line: usize },

    #[error("query has no fields")]
    Empty,
}

/// A query document segment failed to parse.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("query #{index} in document is malformed: {source}")]
pub struct DocumentError {
    /// Zero-based index of the offending segment.
    pub index: usize,
    #[source]
    pub source: QueryParseError,
}
