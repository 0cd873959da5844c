//! Connection management.

use crate::error::ClientError;
use rri_protocol::{read_frame, write_frame, DEFAULT_PORT};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::Mutex;

/// Default timeout for establishing the TCP connection.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default timeout for one request/response exchange.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Connection configuration.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Server address as `host:port`.
    pub addr: String,
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// Timeout for a full exchange. `None` waits forever.
    pub request_timeout: Option<Duration>,
}

impl ConnectionConfig {
    /// Creates a config for `addr`. A bare host gets the default RRI port.
    pub fn new(addr: impl Into<String>) -> Self {
        let mut addr = addr.into();
        if !has_port(&addr) {
            addr = format!("{}:{}", addr, DEFAULT_PORT);
        }
        Self {
            addr,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            request_timeout: Some(DEFAULT_REQUEST_TIMEOUT),
        }
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }
}

fn has_port(addr: &str) -> bool {
    // "[::1]:51131", "host:51131"; a bare IPv6 literal has several colons
    match addr.rsplit_once(':') {
        Some((host, port)) => {
            port.parse::<u16>().is_ok() && (!host.contains(':') || host.ends_with(']'))
        }
        None => false,
    }
}

/// A TCP connection to an RRI server.
///
/// The stream sits behind an async mutex that is held for a whole
/// write-then-read exchange, so at most one request is ever in flight.
pub struct Connection {
    config: ConnectionConfig,
    stream: Mutex<Option<TcpStream>>,
}

impl Connection {
    /// Dials the server.
    pub async fn open(config: ConnectionConfig) -> Result<Self, ClientError> {
        tracing::debug!("Connecting to {}...", config.addr);

        let stream = tokio::time::timeout(
            config.connect_timeout,
            TcpStream::connect(config.addr.as_str()),
        )
        .await
        .map_err(|_| {
            tracing::debug!("Connection timeout");
            ClientError::Timeout
        })?
        .map_err(|e| {
            tracing::debug!("Connection failed: {}", e);
            ClientError::Connection(e)
        })?;

        stream.set_nodelay(true).ok();
        tracing::debug!("Connected to {}", config.addr);

        Ok(Self {
            config,
            stream: Mutex::new(Some(stream)),
        })
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Writes one framed payload and reads the framed reply.
    ///
    /// Any failure leaves the stream at an unknown position, so the stream
    /// is dropped and later exchanges fail with [`ClientError::Closed`].
    pub async fn exchange(&self, payload: &str) -> Result<String, ClientError> {
        let mut guard = self.stream.lock().await;

        let result = {
            let stream = guard.as_mut().ok_or(ClientError::Closed)?;

            let round_trip = async {
                write_frame(stream, payload).await?;
                tracing::debug!("Sent {} bytes, waiting for response...", payload.len());
                let reply = read_frame(stream).await?;
                tracing::debug!("Received {} bytes", reply.len());
                Ok::<_, ClientError>(reply)
            };

            match self.config.request_timeout {
                Some(timeout) => match tokio::time::timeout(timeout, round_trip).await {
                    Ok(result) => result,
                    Err(_) => {
                        tracing::debug!("Exchange timed out after {:?}", timeout);
                        Err(ClientError::Timeout)
                    }
                },
                None => round_trip.await,
            }
        };

        if let Err(e) = &result {
            if let Some(mut stream) = guard.take() {
                tracing::debug!("Dropping connection to {}: {}", self.config.addr, e);
                let _ = stream.shutdown().await;
            }
        }

        result
    }

    /// Shuts the stream down. Returns `false` if it was already closed.
    pub async fn shutdown(&self) -> bool {
        match self.stream.lock().await.take() {
            Some(mut stream) => {
                tracing::debug!("Shutting down connection to {}", self.config.addr);
                let _ = stream.shutdown().await;
                true
            }
            None => false,
        }
    }

    pub async fn is_open(&self) -> bool {
        self.stream.lock().await.is_some()
    }
}
