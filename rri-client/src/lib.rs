//! # rri-client
//!
//! Client library for RRI.
//!
//! This crate provides:
//! - Async TCP connection with connect and request timeouts
//! - Session lifecycle: connect, LOGIN, queries, LOGOUT on close
//! - Sequential batch execution that stops at the first failure
//! - Pluggable credential sources

pub mod batch;
pub mod client;
pub mod connection;
pub mod credentials;
pub mod error;

pub use batch::BatchError;
pub use client::{Client, Direction, Observer, SessionState};
pub use connection::{Connection, ConnectionConfig};
pub use credentials::{CredentialSource, Credentials, EnvCredentials, StaticCredentials};
pub use error::ClientError;
