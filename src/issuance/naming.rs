//! Object name normalization
//!
//! Client-supplied names are reduced to a single safe path segment before they
//! are appended to the storage key prefix.

use crate::intake::MP4_EXTENSION;
use thiserror::Error;

/// Longest client file name accepted, in bytes. Measured on the last path
/// segment as supplied, before the `.mp4` suffix and unique prefix are added.
pub const MAX_OBJECT_NAME_LEN: usize = 255;

/// Naming errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NamingError {
    #[error("Object name is empty")]
    Empty,

    #[error("Object name contains a path traversal segment: {0}")]
    PathTraversal(String),

    #[error("Object name contains control characters")]
    ControlCharacter,

    #[error("Object name is too long ({0} bytes)")]
    TooLong(usize),
}

fn is_separator(c: char) -> bool {
    c == '/' || c == '\\'
}

fn is_allowed(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ' ')
}

/// Normalize a client-supplied object name.
///
/// - `..` segments and control characters are rejected
/// - only the final path segment is kept
/// - characters outside `[A-Za-z0-9-_. ]` become `_`
/// - `.mp4` is appended when missing
/// - with `unique_prefix`, a UUID v4 and `-` are prepended
///
/// # Examples
///
/// ```
/// use clipdrop::issuance::naming::normalize_object_name;
///
/// assert_eq!(normalize_object_name("videos/demo.mp4", false).unwrap(), "demo.mp4");
/// assert_eq!(normalize_object_name("match point", false).unwrap(), "match point.mp4");
/// assert!(normalize_object_name("../../etc/passwd", false).is_err());
/// ```
pub fn normalize_object_name(raw: &str, unique_prefix: bool) -> Result<String, NamingError> {
    if raw.chars().any(char::is_control) {
        return Err(NamingError::ControlCharacter);
    }

    if let Some(segment) = raw.split(is_separator).find(|s| s.trim() == "..") {
        return Err(NamingError::PathTraversal(segment.to_string()));
    }

    let base = raw.rsplit(is_separator).next().unwrap_or_default().trim();
    if base.is_empty() || base == "." {
        return Err(NamingError::Empty);
    }

    if base.len() > MAX_OBJECT_NAME_LEN {
        return Err(NamingError::TooLong(base.len()));
    }

    let mut name: String = base
        .chars()
        .map(|c| if is_allowed(c) { c } else { '_' })
        .collect();

    if !name.to_ascii_lowercase().ends_with(MP4_EXTENSION) {
        name.push_str(MP4_EXTENSION);
    }

    if unique_prefix {
        name = format!("{}-{}", uuid::Uuid::new_v4(), name);
    }

    Ok(name)
}
