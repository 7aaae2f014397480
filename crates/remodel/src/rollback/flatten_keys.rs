//! Mask flattening.

use crate::rollback::mask::{ArrayMask, Mask, MaskNode};

/// Flatten a mask tree into dotted path strings, in declaration order.
///
/// Integer field names format as `[N]` index segments. Array masks without
/// indices emit a single `[]` placeholder segment per field; with indices
/// they emit one path per listed position.
pub fn flatten_keys(mask: &Mask) -> Vec<String> {
    let mut paths = Vec::new();
    flatten_mask(mask, "", &mut paths);
    paths
}

pub(crate) fn flatten_mask(mask: &Mask, prefix: &str, paths: &mut Vec<String>) {
    for (field, node) in &mask.fields {
        let segment = format_field(field);
        let path = if prefix.is_empty() {
            segment
        } else {
            format!("{}.{}", prefix, segment)
        };
        flatten_node(node, &path, paths);
    }
}

pub(crate) fn flatten_array(mask: &ArrayMask, prefix: &str, paths: &mut Vec<String>) {
    for (field, node) in &mask.fields {
        let segment = format_field(field);
        match &mask.index {
            Some(indices) => {
                for idx in indices {
                    let path = format!("{}.[{}].{}", prefix, idx, segment);
                    flatten_node(node, &path, paths);
                }
            }
            None => {
                let path = format!("{}.[].{}", prefix, segment);
                flatten_node(node, &path, paths);
            }
        }
    }
}

fn flatten_node(node: &MaskNode, path: &str, paths: &mut Vec<String>) {
    match node {
        MaskNode::Include => paths.push(path.to_string()),
        MaskNode::Sub(mask) => flatten_mask(mask, path, paths),
        MaskNode::Array(mask) => flatten_array(mask, path, paths),
    }
}

fn format_field(field: &str) -> String {
    if !field.is_empty() && field.bytes().all(|b| b.is_ascii_digit()) {
        format!("[{}]", field)
    } else {
        field.to_string()
    }
}
