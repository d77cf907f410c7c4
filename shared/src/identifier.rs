//! Table and column names arrive from the environment and end up inside SQL
//! text, where they cannot be bound as parameters. Everything passes through
//! here first.

use regex::Regex;
use std::sync::OnceLock;

use crate::error::ConfigError;

fn allowed_identifier() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9_]+$").expect("identifier pattern is valid"))
}

/// Return `candidate` (or `default` when it is empty) if it is a plain
/// `[A-Za-z0-9_]+` identifier.
pub fn sanitize_identifier(candidate: &str, default: &str) -> Result<String, ConfigError> {
    let chosen = if candidate.is_empty() { default } else { candidate };
    if !allowed_identifier().is_match(chosen) {
        return Err(ConfigError::InvalidIdentifier(chosen.to_string()));
    }
    Ok(chosen.to_string())
}

/// Optional columns are disabled by leaving them unset or empty.
pub fn sanitize_optional_identifier(
    candidate: Option<&str>,
    default: &str,
) -> Result<Option<String>, ConfigError> {
    match candidate {
        Some(value) if !value.is_empty() => sanitize_identifier(value, default).map(Some),
        _ => Ok(None),
    }
}
