//! RRI queries: ordered `key: value` fields.

use crate::error::QueryParseError;
use crate::PROTOCOL_VERSION;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// RRI actions.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Action {
    Login,
    Logout,
    Check,
    Info,
    Create,
    Update,
    Delete,
    Restore,
    Transit,
    Chprov,
    Chholder,
    Authinfo1,
    Authinfo2,
    Verify,
    QueueRead,
    QueueDelete,
    /// Any action this client has no dedicated variant for.
    Other(String),
}

impl Action {
    pub fn as_str(&self) -> &str {
        match self {
            Action::Login => "LOGIN",
            Action::Logout => "LOGOUT",
            Action::Check => "CHECK",
            Action::Info => "INFO",
            Action::Create => "CREATE",
            Action::Update => "UPDATE",
            Action::Delete => "DELETE",
            Action::Restore => "RESTORE",
            Action::Transit => "TRANSIT",
            Action::Chprov => "CHPROV",
            Action::Chholder => "CHHOLDER",
            Action::Authinfo1 => "AUTHINFO1",
            Action::Authinfo2 => "AUTHINFO2",
            Action::Verify => "VERIFY",
            Action::QueueRead => "QUEUE-READ",
            Action::QueueDelete => "QUEUE-DELETE",
            Action::Other(name) => name,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let action = match s.trim().to_ascii_uppercase().as_str() {
            "LOGIN" => Action::Login,
            "LOGOUT" => Action::Logout,
            "CHECK" => Action::Check,
            "INFO" => Action::Info,
            "CREATE" => Action::Create,
            "UPDATE" => Action::Update,
            "DELETE" => Action::Delete,
            "RESTORE" => Action::Restore,
            "TRANSIT" => Action::Transit,
            "CHPROV" => Action::Chprov,
            "CHHOLDER" => Action::Chholder,
            "AUTHINFO1" => Action::Authinfo1,
            "AUTHINFO2" => Action::Authinfo2,
            "VERIFY" => Action::Verify,
            "QUEUE-READ" => Action::QueueRead,
            "QUEUE-DELETE" => Action::QueueDelete,
            _ => Action::Other(s.trim().to_string()),
        };
        Ok(action)
    }
}

/// One `key: value` line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub key: String,
    pub value: String,
}

impl Field {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.key, self.value)
    }
}

/// An outbound RRI request.
///
/// Field order is kept exactly as inserted; keys may repeat.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    fields: Vec<Field>,
}

impl Query {
    /// Creates a query with the `version` and `action` header fields.
    pub fn new(action: Action) -> Self {
        Self::empty()
            .with_field("version", PROTOCOL_VERSION)
            .with_field("action", action.as_str())
    }

    /// Creates a query with no fields at all.
    pub fn empty() -> Self {
        Self { fields: Vec::new() }
    }

    pub fn login(user: &str, password: &str) -> Self {
        Self::new(Action::Login)
            .with_field("user", user)
            .with_field("password", password)
    }

    pub fn logout() -> Self {
        Self::new(Action::Logout)
    }

    pub fn check_domain(domain: &str) -> Self {
        Self::new(Action::Check).with_field("domain", domain)
    }

    pub fn info_domain(domain: &str) -> Self {
        Self::new(Action::Info).with_field("domain", domain)
    }

    pub fn delete_domain(domain: &str) -> Self {
        Self::new(Action::Delete).with_field("domain", domain)
    }

    pub fn restore_domain(domain: &str) -> Self {
        Self::new(Action::Restore).with_field("domain", domain)
    }

    pub fn transit_domain(domain: &str, disconnect: bool) -> Self {
        Self::new(Action::Transit)
            .with_field("domain", domain)
            .with_field("disconnect", if disconnect { "true" } else { "false" })
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(key, value);
        self
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.fields.push(Field::new(key, value));
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns the first value stored under `key` (case-insensitive).
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.key.eq_ignore_ascii_case(key))
            .map(|f| f.value.as_str())
    }

    pub fn action(&self) -> Option<Action> {
        self.get("action").and_then(|a| a.parse().ok())
    }

    /// Renders the wire text: one `key: value` per line, no trailing newline.
    pub fn serialize(&self) -> String {
        self.fields
            .iter()
            .map(Field::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Parses query text.
    ///
    /// Each non-blank line is split at the first `:` or `=`, whichever comes
    /// first, so both `domain: x.de` and `domain=x.de` are accepted.
    pub fn parse(text: &str) -> Result<Self, QueryParseError> {
        let mut query = Self::empty();

        for (idx, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let pos = line
                .find(|c: char| c == ':' || c == '=')
                .ok_or(QueryParseError::MissingSeparator { line: idx + 1 })?;
            let key = line[..pos].trim();
            if key.is_empty() {
                return Err(QueryParseError::EmptyKey { line: idx + 1 });
            }
            query.push(key, line[pos + 1..].trim());
        }

        if query.is_empty() {
            return Err(QueryParseError::Empty);
        }
        Ok(query)
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialize())
    }
}

impl FromStr for Query {
    type Err = QueryParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
