//! # rri-protocol
//!
//! Wire protocol implementation for RRI (Registry-Registrar Interface).
//!
//! This crate provides:
//! - Length-prefixed framing over any async byte stream
//! - Query building and `key: value` serialization
//! - Response parsing with business result, messages and fields
//! - Multi-query document parsing (`=-=` separated batches)
//! - Password censoring for diagnostic output

pub mod censor;
pub mod document;
pub mod error;
pub mod frame;
pub mod query;
pub mod response;

pub use censor::censor;
pub use document::parse_query_document;
pub use error::{DocumentError, FrameError, ProtocolError, QueryParseError};
pub use frame::{encode_frame, read_exact, read_frame, write_frame};
pub use query::{Action, Field, Query};
pub use response::{BusinessMessage, Response, ResultCode};

/// Protocol version sent in the `version` field of every query.
pub const PROTOCOL_VERSION: &str = "3.0";

/// Default port of an RRI server.
pub const DEFAULT_PORT: u16 = 51131;

/// Maximum frame payload size in bytes.
pub const MAX_PAYLOAD_SIZE: u32 = 65535;

/// Size of the length prefix in bytes.
pub const FRAME_HEADER_SIZE: usize = 4;

/// Line separating queries in a query document.
pub const DOCUMENT_DELIMITER: &str = "=-=";

/// Replacement shown for censored values.
pub const CENSOR_MASK: &str = "******";
