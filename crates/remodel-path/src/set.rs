//! Path writers: `set` with intermediate creation, and `remove`.

use serde_json::{Map, Value};

use crate::get::get_mut;
use crate::types::Step;

/// Write a value into a JSON record at a path, creating intermediate
/// containers as needed.
///
/// A key step through a non-object replaces it with an empty object; an
/// index step through a non-array replaces it with an array padded with
/// `null` up to the index. An index step on an existing object writes the
/// equivalent string key. A path containing the `[]` placeholder writes
/// nothing.
///
/// # Example
///
/// ```
/// use remodel_path::{set, Step};
/// use serde_json::json;
///
/// let mut doc = json!({});
/// set(&mut doc, &[Step::key("a"), Step::index(1)], json!("x"));
/// assert_eq!(doc, json!({"a": [null, "x"]}));
/// ```
pub fn set(val: &mut Value, path: &[Step], new: Value) {
    match path.split_first() {
        None => *val = new,
        Some((Step::Any, _)) => {}
        Some((Step::Key(key), rest)) => {
            if !val.is_object() {
                *val = Value::Object(Map::new());
            }
            if let Value::Object(map) = val {
                if rest.is_empty() {
                    map.insert(key.clone(), new);
                } else {
                    set(map.entry(key.clone()).or_insert(Value::Null), rest, new);
                }
            }
        }
        Some((Step::Index(idx), rest)) => {
            if let Value::Object(map) = val {
                let key = idx.to_string();
                if rest.is_empty() {
                    map.insert(key, new);
                } else {
                    set(map.entry(key).or_insert(Value::Null), rest, new);
                }
                return;
            }
            if !val.is_array() {
                *val = Value::Array(Vec::new());
            }
            if let Value::Array(arr) = val {
                if arr.len() <= *idx {
                    arr.resize(idx + 1, Value::Null);
                }
                if rest.is_empty() {
                    arr[*idx] = new;
                } else {
                    set(&mut arr[*idx], rest, new);
                }
            }
        }
    }
}

/// Remove the value at a path, returning it.
///
/// An object key is deleted; an array slot is replaced with `null` so later
/// indices keep their positions. Returns `None` when the path (or its
/// parent) does not exist, or for the empty path.
///
/// # Example
///
/// ```
/// use remodel_path::{remove, Step};
/// use serde_json::json;
///
/// let mut doc = json!({"a": [1, 2], "b": true});
/// assert_eq!(remove(&mut doc, &[Step::key("b")]), Some(json!(true)));
/// assert_eq!(remove(&mut doc, &[Step::key("a"), Step::index(0)]), Some(json!(1)));
/// assert_eq!(doc, json!({"a": [null, 2]}));
/// ```
pub fn remove(val: &mut Value, path: &[Step]) -> Option<Value> {
    let (leaf, parent_path) = path.split_last()?;
    let parent = get_mut(val, parent_path)?;
    match (leaf, parent) {
        (Step::Key(key), Value::Object(map)) => map.remove(key),
        (Step::Index(idx), Value::Object(map)) => map.remove(&idx.to_string()),
        (Step::Index(idx), Value::Array(arr)) => arr
            .get_mut(*idx)
            .map(|slot| std::mem::replace(slot, Value::Null)),
        _ => None,
    }
}
