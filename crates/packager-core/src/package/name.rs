//! Package name validation

use crate::error::{PackagerError, Result};
use regex::Regex;
use std::sync::OnceLock;

fn allowed_chars_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"^[-\w/]+$").expect("Invalid regex"))
}

fn shape_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"^[-\w]+/[-\w]+$").expect("Invalid regex"))
}

fn namespace_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"^[a-zA-Z0-9\\]+$").expect("Invalid regex"))
}

/// Check that `name` has the `<vendor>/<project>` shape
pub fn validate_package_name(name: &str) -> Result<()> {
    if !allowed_chars_regex().is_match(name) {
        return Err(PackagerError::InvalidName {
            name: name.to_string(),
            reason: "it can only contain letters, numbers, underscores, dashes and slashes",
        });
    }

    if !shape_regex().is_match(name) {
        return Err(PackagerError::InvalidName {
            name: name.to_string(),
            reason: "it must be of form <vendor>/<project>",
        });
    }

    Ok(())
}

/// Split a validated name into its vendor and project segments
pub fn split_package_name(name: &str) -> Result<(&str, &str)> {
    validate_package_name(name)?;
    name.split_once('/').ok_or_else(|| PackagerError::InvalidName {
        name: name.to_string(),
        reason: "it must be of form <vendor>/<project>",
    })
}

/// Trim surrounding backslashes off a namespace prefix and validate it
pub fn validate_namespace(namespace: &str) -> Result<String> {
    let trimmed = namespace.trim().trim_matches('\\');
    if trimmed.is_empty() || !namespace_regex().is_match(trimmed) {
        return Err(PackagerError::InvalidNamespace(namespace.to_string()));
    }
    Ok(trimmed.to_string())
}
