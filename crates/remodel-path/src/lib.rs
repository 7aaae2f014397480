//! Dotted/indexed property paths over `serde_json` values.
//!
//! Paths address a location inside a nested JSON record using `.`-separated
//! segments: plain segments are object keys, `[0]`-style segments are array
//! indices, and a bare `[]` segment is a placeholder matching every index of
//! an array (callers expand it against concrete data).
//!
//! # Example
//!
//! ```
//! use remodel_path::{get, parse, set, Step};
//! use serde_json::json;
//!
//! let path = parse("phones.[0].number").unwrap();
//! assert_eq!(
//!     path,
//!     vec![Step::key("phones"), Step::index(0), Step::key("number")]
//! );
//!
//! let mut doc = json!({"phones": [{"number": "1234"}]});
//! assert_eq!(get(&doc, &path), Some(&json!("1234")));
//!
//! set(&mut doc, &path, json!("5678"));
//! assert_eq!(get(&doc, &path), Some(&json!("5678")));
//! ```

use thiserror::Error;

pub mod get;
pub mod set;
pub mod types;

pub use get::{get, get_mut};
pub use set::{remove, set};
pub use types::Step;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("empty path segment")]
    EmptySegment,
    #[error("invalid array index segment: {0}")]
    InvalidIndex(String),
}

/// Parse a path string into steps.
///
/// Plain segments become [`Step::Key`], bracketed numeric segments and bare
/// numeric segments become [`Step::Index`], and `[]` becomes [`Step::Any`].
///
/// # Errors
///
/// Returns an error on an empty segment (`a..b`, leading or trailing `.`) or
/// a bracketed segment that is not a non-negative integer (`[x]`).
///
/// # Example
///
/// ```
/// use remodel_path::{parse, Step};
///
/// assert_eq!(parse(""), Ok(vec![]));
/// assert_eq!(
///     parse("items.[2].name"),
///     Ok(vec![Step::key("items"), Step::index(2), Step::key("name")])
/// );
/// assert!(parse("items..name").is_err());
/// assert!(parse("items.[x]").is_err());
/// ```
pub fn parse(path: &str) -> Result<Vec<Step>, PathError> {
    if path.is_empty() {
        return Ok(Vec::new());
    }
    let mut steps = Vec::new();
    for segment in path.split('.') {
        if segment.is_empty() {
            return Err(PathError::EmptySegment);
        }
        steps.push(parse_segment(segment)?);
    }
    Ok(steps)
}

/// Parse a path string, skipping empty segments and treating malformed
/// bracket segments as plain keys.
///
/// Mask flatteners can produce paths with a leading `.` (empty prefix); this
/// variant accepts them.
///
/// # Example
///
/// ```
/// use remodel_path::{parse_relaxed, Step};
///
/// assert_eq!(
///     parse_relaxed(".[0].name"),
///     vec![Step::index(0), Step::key("name")]
/// );
/// ```
pub fn parse_relaxed(path: &str) -> Vec<Step> {
    path.split('.')
        .filter(|segment| !segment.is_empty())
        .map(|segment| parse_segment(segment).unwrap_or_else(|_| Step::key(segment)))
        .collect()
}

fn parse_segment(segment: &str) -> Result<Step, PathError> {
    if let Some(inner) = segment.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
        if inner.is_empty() {
            return Ok(Step::Any);
        }
        return inner
            .parse::<usize>()
            .map(Step::Index)
            .map_err(|_| PathError::InvalidIndex(segment.to_string()));
    }
    if let Ok(idx) = segment.parse::<usize>() {
        return Ok(Step::Index(idx));
    }
    Ok(Step::key(segment))
}

/// Format steps back into a path string.
///
/// # Example
///
/// ```
/// use remodel_path::{format, Step};
///
/// let path = [Step::key("items"), Step::index(2), Step::Any];
/// assert_eq!(format(&path), "items.[2].[]");
/// ```
pub fn format(steps: &[Step]) -> String {
    let mut out = String::new();
    for (i, step) in steps.iter().enumerate() {
        if i > 0 {
            out.push('.');
        }
        out.push_str(&step.to_string());
    }
    out
}
