//! Credential sources.
//!
//! The session only ever needs an address and an optional user/password
//! pair; where they come from is up to the caller.

use crate::error::ClientError;
use std::fmt;

/// Environment variable holding the server address.
pub const ENV_ADDRESS: &str = "RRI_ADDRESS";
/// Environment variable holding the RRI user.
pub const ENV_USER: &str = "RRI_USER";
/// Environment variable holding the RRI password.
pub const ENV_PASSWORD: &str = "RRI_PASSWORD";

/// Address and optional login for one RRI server.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub address: String,
    pub user: Option<String>,
    pub password: Option<String>,
}

impl Credentials {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            user: None,
            password: None,
        }
    }

    pub fn with_login(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self.password = Some(password.into());
        self
    }

    pub fn has_login(&self) -> bool {
        matches!((&self.user, &self.password), (Some(u), Some(p)) if !u.is_empty() && !p.is_empty())
    }

    /// Returns the user/password pair, if a login is configured.
    ///
    /// A user without a password is an error rather than an anonymous session.
    pub fn login(&self) -> Result<Option<(&str, &str)>, ClientError> {
        match (self.user.as_deref(), self.password.as_deref()) {
            (None, _) | (Some(""), _) => Ok(None),
            (Some(_), None) | (Some(_), Some("")) => {
                Err(ClientError::MissingCredentials("password"))
            }
            (Some(user), Some(password)) => Ok(Some((user, password))),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("address", &self.address)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| rri_protocol::CENSOR_MASK))
            .finish()
    }
}

/// Anything that can supply [`Credentials`].
pub trait CredentialSource {
    fn load_credentials(&self) -> Result<Credentials, ClientError>;
}

/// Credentials known up front, e.g. from command-line flags.
#[derive(Debug, Clone)]
pub struct StaticCredentials(Credentials);

impl StaticCredentials {
    pub fn new(credentials: Credentials) -> Self {
        Self(credentials)
    }
}

impl CredentialSource for StaticCredentials {
    fn load_credentials(&self) -> Result<Credentials, ClientError> {
        if self.0.address.is_empty() {
            return Err(ClientError::MissingCredentials("address"));
        }
        Ok(self.0.clone())
    }
}

/// Credentials read from `RRI_ADDRESS`, `RRI_USER` and `RRI_PASSWORD`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvCredentials;

impl CredentialSource for EnvCredentials {
    fn load_credentials(&self) -> Result<Credentials, ClientError> {
        let address =
            std::env::var(ENV_ADDRESS).map_err(|_| ClientError::MissingCredentials("address"))?;
        Ok(Credentials {
            address,
            user: std::env::var(ENV_USER).ok(),
            password: std::env::var(ENV_PASSWORD).ok(),
        })
    }
}
