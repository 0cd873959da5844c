//! Password censoring for printing raw protocol traffic.

use crate::CENSOR_MASK;

const PASSWORD_PREFIX: &str = "password:";

/// Returns `raw` with the value of every non-empty `password:` line masked.
///
/// Only lines starting with exactly `password:` are touched; the message
/// actually sent over the wire is never affected.
pub fn censor(raw: &str) -> String {
    raw.split('\n')
        .map(|line| match line.strip_prefix(PASSWORD_PREFIX) {
            Some(value) if !value.trim().is_empty() => {
                format!("{} {}", PASSWORD_PREFIX, CENSOR_MASK)
            }
            _ => line.to_string(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}
