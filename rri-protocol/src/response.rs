//! Parsed RRI responses.

use crate::error::ProtocolError;
use crate::query::Field;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Business result reported in the `RESULT` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultCode {
    Success,
    Failed,
}

impl ResultCode {
    fn parse(value: &str) -> Result<Self, ProtocolError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "success" => Ok(ResultCode::Success),
            "failed" | "failure" => Ok(ResultCode::Failed),
            _ => Err(ProtocolError::UnknownResult(value.trim().to_string())),
        }
    }
}

/// An `INFO` or `ERROR` line: optional numeric code plus text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<u32>,
    pub text: String,
}

impl BusinessMessage {
    /// Splits `83000000 Domain is free` into code and text.
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if let Some((head, rest)) = value.split_once(char::is_whitespace) {
            if let Ok(code) = head.parse() {
                return Self {
                    code: Some(code),
                    text: rest.trim().to_string(),
                };
            }
        } else if let Ok(code) = value.parse() {
            return Self {
                code: Some(code),
                text: String::new(),
            };
        }

        Self {
            code: None,
            text: value.to_string(),
        }
    }
}

impl fmt::Display for BusinessMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.code, self.text.is_empty()) {
            (Some(code), true) => write!(f, "{}", code),
            (Some(code), false) => write!(f, "{} {}", code, self.text),
            (None, _) => f.write_str(&self.text),
        }
    }
}

/// A parsed RRI response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub result: ResultCode,

    /// Server transaction id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stid: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub infos: Vec<BusinessMessage>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<BusinessMessage>,

    /// All remaining fields in the order received.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<Field>,
}

impl Response {
    /// Parses a response payload.
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        let mut result = None;
        let mut stid = None;
        let mut infos = Vec::new();
        let mut errors = Vec::new();
        let mut fields = Vec::new();

        for (idx, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let (key, value) = match line.split_once(':') {
                Some((key, value)) if !key.trim().is_empty() => (key.trim(), value.trim()),
                _ => {
                    return Err(ProtocolError::MalformedLine {
                        line: idx + 1,
                        content: line.to_string(),
                    })
                }
            };

            match key.to_ascii_uppercase().as_str() {
                "RESULT" => result = Some(ResultCode::parse(value)?),
                "STID" => stid = Some(value.to_string()),
                "INFO" => infos.push(BusinessMessage::parse(value)),
                "ERROR" => errors.push(BusinessMessage::parse(value)),
                _ => fields.push(Field::new(key, value)),
            }
        }

        Ok(Self {
            result: result.ok_or(ProtocolError::MissingResult)?,
            stid,
            infos,
            errors,
            fields,
        })
    }

    pub fn is_successful(&self) -> bool {
        self.result == ResultCode::Success
    }

    /// Human-readable failure reason; `None` for successful responses.
    pub fn error_message(&self) -> Option<String> {
        if self.is_successful() {
            return None;
        }
        if self.errors.is_empty() {
            return Some("unknown error".to_string());
        }
        Some(
            self.errors
                .iter()
                .map(BusinessMessage::to_string)
                .collect::<Vec<_>>()
                .join("; "),
        )
    }

    /// First value of `key` (case-insensitive).
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.key.eq_ignore_ascii_case(key))
            .map(|f| f.value.as_str())
    }

    /// All values of `key` (case-insensitive), in order.
    pub fn field_values(&self, key: &str) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|f| f.key.eq_ignore_ascii_case(key))
            .map(|f| f.value.as_str())
            .collect()
    }
}
