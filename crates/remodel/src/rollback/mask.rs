//! Typed path masks.
//!
//! A mask selects a subset of a record's paths for rollback. Field order is
//! preserved, so flattened paths come out in declaration order.

use indexmap::IndexMap;

/// Node of a mask tree.
#[derive(Clone)]
pub enum MaskNode {
    /// Select the whole value at this field.
    Include,
    /// Descend into an object field.
    Sub(Mask),
    /// Descend into an array field.
    Array(ArrayMask),
}

/// A mask over an object's fields.
#[derive(Clone, Default)]
pub struct Mask {
    pub(crate) fields: IndexMap<String, MaskNode>,
}

impl Mask {
    pub fn new() -> Self {
        Mask::default()
    }

    /// Select a whole field.
    pub fn include(mut self, field: impl Into<String>) -> Self {
        self.fields.insert(field.into(), MaskNode::Include);
        self
    }

    /// Select paths inside an object field.
    pub fn sub(mut self, field: impl Into<String>, mask: Mask) -> Self {
        self.fields.insert(field.into(), MaskNode::Sub(mask));
        self
    }

    /// Select paths inside an array field.
    pub fn array(mut self, field: impl Into<String>, mask: ArrayMask) -> Self {
        self.fields.insert(field.into(), MaskNode::Array(mask));
        self
    }

    /// Flatten into dotted path strings.
    pub fn flatten(&self) -> Vec<String> {
        crate::rollback::flatten_keys::flatten_keys(self)
    }
}

/// A mask over array elements.
///
/// Without indices the mask applies to every element (flattened as a `[]`
/// placeholder, expanded against the live array at rollback time); with
/// indices it applies only to the listed positions.
#[derive(Clone, Default)]
pub struct ArrayMask {
    pub(crate) index: Option<Vec<usize>>,
    pub(crate) fields: IndexMap<String, MaskNode>,
}

impl ArrayMask {
    pub fn new() -> Self {
        ArrayMask::default()
    }

    /// Restrict the mask to specific element positions.
    pub fn at(mut self, indices: impl IntoIterator<Item = usize>) -> Self {
        self.index = Some(indices.into_iter().collect());
        self
    }

    /// Select a whole field of each element.
    pub fn include(mut self, field: impl Into<String>) -> Self {
        self.fields.insert(field.into(), MaskNode::Include);
        self
    }

    /// Select paths inside an object field of each element.
    pub fn sub(mut self, field: impl Into<String>, mask: Mask) -> Self {
        self.fields.insert(field.into(), MaskNode::Sub(mask));
        self
    }

    /// Select paths inside a nested array field of each element.
    pub fn array(mut self, field: impl Into<String>, mask: ArrayMask) -> Self {
        self.fields.insert(field.into(), MaskNode::Array(mask));
        self
    }

    /// Flatten into dotted path strings with an empty prefix.
    pub fn flatten(&self) -> Vec<String> {
        let mut paths = Vec::new();
        crate::rollback::flatten_keys::flatten_array(self, "", &mut paths);
        paths
    }
}
