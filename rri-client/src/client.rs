//! High-level session API.

use crate::connection::{Connection, ConnectionConfig};
use crate::error::ClientError;
use parking_lot::Mutex;
use rri_protocol::{Query, Response};
use std::fmt;
use std::sync::Arc;

/// Direction of a raw message handed to an [`Observer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Outbound,
    Inbound,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Outbound => write!(f, "sent"),
            Direction::Inbound => write!(f, "received"),
        }
    }
}

/// Callback receiving every raw message exactly as sent or received.
///
/// Messages are not censored; run them through [`rri_protocol::censor`]
/// before printing.
pub type Observer = Arc<dyn Fn(Direction, &str) + Send + Sync>;

/// Session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Connected, not logged in.
    Connected,
    /// LOGIN succeeded.
    Authenticated,
    /// `close()` is in progress.
    Closing,
    /// Connection released.
    Closed,
}

/// An RRI session over a single connection.
pub struct Client {
    conn: Connection,
    state: Mutex<SessionState>,
    observer: Option<Observer>,
}

impl Client {
    /// Connects to the server.
    pub async fn connect(config: ConnectionConfig) -> Result<Self, ClientError> {
        Self::open(config, None).await
    }

    /// Connects to the server, reporting raw traffic to `observer`.
    pub async fn connect_with_observer(
        config: ConnectionConfig,
        observer: Observer,
    ) -> Result<Self, ClientError> {
        Self::open(config, Some(observer)).await
    }

    async fn open(config: ConnectionConfig, observer: Option<Observer>) -> Result<Self, ClientError> {
        let conn = Connection::open(config).await?;
        Ok(Self {
            conn,
            state: Mutex::new(SessionState::Connected),
            observer,
        })
    }

    pub fn state(&self) -> SessionState {
        *self.state.lock()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state() == SessionState::Authenticated
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.state(), SessionState::Closing | SessionState::Closed)
    }

    pub fn config(&self) -> &ConnectionConfig {
        self.conn.config()
    }

    /// Logs in. On a rejected LOGIN the state is left untouched.
    pub async fn login(&self, user: &str, password: &str) -> Result<(), ClientError> {
        tracing::debug!("Logging in as {}", user);
        self.execute(&Query::login(user, password)).await?;

        let mut state = self.state.lock();
        if *state == SessionState::Connected {
            *state = SessionState::Authenticated;
        }
        Ok(())
    }

    /// Logs out explicitly, keeping the connection open.
    pub async fn logout(&self) -> Result<(), ClientError> {
        self.execute(&Query::logout()).await?;

        let mut state = self.state.lock();
        if *state == SessionState::Authenticated {
            *state = SessionState::Connected;
        }
        Ok(())
    }

    /// Sends a query and returns the parsed response.
    ///
    /// A response reporting a business failure is still `Ok`; use
    /// [`Client::execute`] to turn it into [`ClientError::QueryFailed`].
    pub async fn send_query(&self, query: &Query) -> Result<Response, ClientError> {
        if self.is_closed() {
            return Err(ClientError::Closed);
        }
        self.exchange(query).await
    }

    /// Sends a query and fails with [`ClientError::QueryFailed`] if the
    /// server rejects it.
    pub async fn execute(&self, query: &Query) -> Result<Response, ClientError> {
        let response = self.send_query(query).await?;
        match response.error_message() {
            None => Ok(response),
            Some(message) => Err(ClientError::QueryFailed {
                action: query
                    .action()
                    .map(|a| a.to_string())
                    .unwrap_or_else(|| "query".to_string()),
                message,
            }),
        }
    }

    async fn exchange(&self, query: &Query) -> Result<Response, ClientError> {
        let payload = query.serialize();
        if let Some(observer) = &self.observer {
            observer(Direction::Outbound, &payload);
        }

        let raw = match self.conn.exchange(&payload).await {
            Ok(raw) => raw,
            Err(e) => return Err(self.abandon(e).await),
        };
        if let Some(observer) = &self.observer {
            observer(Direction::Inbound, &raw);
        }

        let response = match Response::parse(&raw) {
            Ok(response) => response,
            Err(e) => return Err(self.abandon(e.into()).await),
        };
        tracing::debug!(
            "Response to {}: {:?} (stid: {})",
            query.get("action").unwrap_or("?"),
            response.result,
            response.stid.as_deref().unwrap_or("-")
        );
        Ok(response)
    }

    /// Tears the session down after a fatal error and hands the error back.
    async fn abandon(&self, err: ClientError) -> ClientError {
        if err.is_fatal() {
            tracing::warn!("Dropping session to {}: {}", self.conn.config().addr, err);
            self.conn.shutdown().await;
            *self.state.lock() = SessionState::Closed;
        }
        err
    }

    /// Closes the session.
    ///
    /// Sends LOGOUT first when logged in; a failing LOGOUT is only logged.
    /// Calling `close` again, or after a fatal error already dropped the
    /// session, is a no-op.
    pub async fn close(&self) -> Result<(), ClientError> {
        let previous = {
            let mut state = self.state.lock();
            match *state {
                SessionState::Closing | SessionState::Closed => return Ok(()),
                prev => {
                    *state = SessionState::Closing;
                    prev
                }
            }
        };

        if previous == SessionState::Authenticated {
            match self.exchange(&Query::logout()).await {
                Ok(response) if !response.is_successful() => {
                    tracing::warn!(
                        "LOGOUT rejected: {}",
                        response.error_message().unwrap_or_default()
                    );
                }
                Ok(_) => tracing::debug!("Logged out"),
                Err(e) => tracing::warn!("LOGOUT failed: {}", e),
            }
        }

        self.conn.shutdown().await;
        *self.state.lock() = SessionState::Closed;
        tracing::debug!("Session closed");
        Ok(())
    }
}
