//! Read-only and mutable path walkers.

use serde_json::Value;

use crate::types::Step;

/// Get a value from a JSON record by path.
///
/// Returns `None` if the path does not exist, crosses a scalar, or contains
/// the `[]` placeholder. An index step on an object addresses the equivalent
/// string key.
///
/// # Example
///
/// ```
/// use remodel_path::{get, Step};
/// use serde_json::json;
///
/// let doc = json!({"items": [{"name": "a"}]});
/// let path = [Step::key("items"), Step::index(0), Step::key("name")];
/// assert_eq!(get(&doc, &path), Some(&json!("a")));
/// assert_eq!(get(&doc, &[Step::key("missing")]), None);
/// ```
pub fn get<'a>(val: &'a Value, path: &[Step]) -> Option<&'a Value> {
    let mut current = val;
    for step in path {
        current = match (step, current) {
            (Step::Key(key), Value::Object(map)) => map.get(key)?,
            (Step::Index(idx), Value::Array(arr)) => arr.get(*idx)?,
            (Step::Index(idx), Value::Object(map)) => map.get(&idx.to_string())?,
            _ => return None,
        };
    }
    Some(current)
}

/// Get a mutable reference to a value in a JSON record by path.
pub fn get_mut<'a>(val: &'a mut Value, path: &[Step]) -> Option<&'a mut Value> {
    let mut current = val;
    for step in path {
        current = match (step, current) {
            (Step::Key(key), Value::Object(map)) => map.get_mut(key)?,
            (Step::Index(idx), Value::Array(arr)) => arr.get_mut(*idx)?,
            (Step::Index(idx), Value::Object(map)) => map.get_mut(&idx.to_string())?,
            _ => return None,
        };
    }
    Some(current)
}
