//! Sequential execution of query batches.

use crate::client::Client;
use crate::error::ClientError;
use rri_protocol::{Query, Response};
use thiserror::Error;

/// A batch stopped early.
///
/// The `index` queries before the failing one were executed and stay
/// applied.
#[derive(Debug, Error)]
#[error("query #{index} failed: {source}")]
pub struct BatchError {
    /// Zero-based index of the failing query.
    pub index: usize,
    #[source]
    pub source: ClientError,
}

impl Client {
    /// Executes `queries` in order, stopping at the first rejected query or
    /// transport failure.
    ///
    /// `on_response` sees each successful response as it arrives. Returns
    /// the number of executed queries.
    pub async fn run_batch<F>(&self, queries: &[Query], mut on_response: F) -> Result<usize, BatchError>
    where
        F: FnMut(usize, &Query, &Response),
    {
        for (index, query) in queries.iter().enumerate() {
            tracing::debug!("Executing batch query {}/{}", index + 1, queries.len());
            match self.execute(query).await {
                Ok(response) => on_response(index, query, &response),
                Err(source) => return Err(BatchError { index, source }),
            }
        }
        Ok(queries.len())
    }
}
