//! Shared utility functions for type parsing and common operations.

use crate::types::{AssignmentKind, Bucket, Echelon, Role};
use serde::Serialize;
use std::fmt::Display;

// =============================================================================
// Type Parsing
// =============================================================================

/// Trait for parsing strings into enum types with a default fallback.
/// Used for decoding stored or imported values where invalid strings should
/// fall back gracefully. Logs a warning when an invalid value is encountered.
pub trait ParseWithDefault: Sized {
    /// The name of this type for logging purposes.
    fn type_name() -> &'static str;

    /// The default value to use when parsing fails.
    fn default_value() -> Self;

    /// Try to parse the string, returning None if invalid.
    fn try_parse(s: &str) -> Option<Self>;

    /// Parse a string into this type, returning a default value if parsing fails.
    fn parse_or_default(s: &str) -> Self {
        match Self::try_parse(s) {
            Some(v) => v,
            None => {
                tracing::warn!("Invalid {} value '{}', using default", Self::type_name(), s);
                Self::default_value()
            }
        }
    }
}

/// Lowercase and drop separators so "Squad Leader", "squad_leader" and
/// "SquadLeader" compare equal.
fn normalize_key(s: &str) -> String {
    s.chars()
        .filter(|c| !matches!(c, ' ' | '_' | '-'))
        .flat_map(char::to_lowercase)
        .collect()
}

impl ParseWithDefault for Echelon {
    fn type_name() -> &'static str {
        "Echelon"
    }

    fn default_value() -> Self {
        Echelon::Unknown
    }

    fn try_parse(s: &str) -> Option<Self> {
        match normalize_key(s).as_str() {
            "team" => Some(Echelon::Team),
            "squad" => Some(Echelon::Squad),
            "platoon" => Some(Echelon::Platoon),
            "company" => Some(Echelon::Company),
            "battalion" => Some(Echelon::Battalion),
            _ => None,
        }
    }
}

impl ParseWithDefault for Role {
    fn type_name() -> &'static str {
        "Role"
    }

    fn default_value() -> Self {
        Role::Unknown
    }

    fn try_parse(s: &str) -> Option<Self> {
        let key = normalize_key(s);
        Role::ALL
            .into_iter()
            .find(|role| normalize_key(role.as_str()) == key)
    }
}

impl ParseWithDefault for AssignmentKind {
    fn type_name() -> &'static str {
        "AssignmentKind"
    }

    fn default_value() -> Self {
        AssignmentKind::Primary
    }

    fn try_parse(s: &str) -> Option<Self> {
        match normalize_key(s).as_str() {
            "primary" => Some(AssignmentKind::Primary),
            "attached" => Some(AssignmentKind::Attached),
            "temporary" => Some(AssignmentKind::Temporary),
            _ => None,
        }
    }
}

impl ParseWithDefault for Bucket {
    fn type_name() -> &'static str {
        "Bucket"
    }

    fn default_value() -> Self {
        Bucket::Improve
    }

    fn try_parse(s: &str) -> Option<Self> {
        match normalize_key(s).as_str() {
            "sustain" => Some(Bucket::Sustain),
            "improve" => Some(Bucket::Improve),
            "action" => Some(Bucket::Action),
            _ => None,
        }
    }
}

/// Serialize an enum to its serde string representation (without quotes).
pub fn enum_to_str<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value)
        .unwrap_or_default()
        .trim_matches('"')
        .to_string()
}

/// Filter an iterator of Results, logging errors at debug level before discarding.
///
/// # Example
/// ```ignore
/// let values: Vec<_> = results
///     .filter_map(|r| log_filter_error(r, "loading items"))
///     .collect();
/// ```
pub fn log_filter_error<T, E: Display>(result: Result<T, E>, context: &str) -> Option<T> {
    match result {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::debug!("{}: {}", context, e);
            None
        }
    }
}

/// Like log_filter_error but logs at warn level for more important operations.
pub fn log_filter_warn<T, E: Display>(result: Result<T, E>, context: &str) -> Option<T> {
    match result {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::warn!("{}: {}", context, e);
            None
        }
    }
}
