//! Provider indirection between validator nodes and their model.
//!
//! Nodes never hold the model itself; they hold a `Provider` carrying the
//! record store, the shared lock flag, and the pattern context the node was
//! compiled from, so subtrees can rebuild their own children on demand.
//! Leaf rule nodes carry no pattern context.

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;
use remodel_path::Step;
use remodel_reactive::Store;
use serde_json::Value;

use crate::model::ModelFlags;
use crate::validate::compile;
use crate::validate::pattern::AnyPattern;
use crate::validate::validation::Children;

/// Element-position filter for child creation.
pub(crate) enum Scope {
    /// All positions at or beyond an offset.
    Offset(usize),
    /// Exactly the listed positions.
    Indices(Vec<usize>),
}

impl Scope {
    pub(crate) fn admits(&self, index: usize) -> bool {
        match self {
            Scope::Offset(offset) => index >= *offset,
            Scope::Indices(indices) => indices.contains(&index),
        }
    }
}

#[derive(Clone)]
pub(crate) struct Provider {
    store: Store<Value>,
    flags: Rc<RefCell<ModelFlags>>,
    auto_touch: bool,
    pattern: Option<AnyPattern>,
}

impl Provider {
    pub(crate) fn new(
        store: Store<Value>,
        flags: Rc<RefCell<ModelFlags>>,
        auto_touch: bool,
        pattern: AnyPattern,
    ) -> Self {
        Provider {
            store,
            flags,
            auto_touch,
            pattern: Some(pattern),
        }
    }

    pub(crate) fn data(&self) -> Value {
        self.store.get()
    }

    pub(crate) fn store(&self) -> &Store<Value> {
        &self.store
    }

    pub(crate) fn locked(&self) -> bool {
        self.flags.borrow().locked
    }

    pub(crate) fn auto_touch(&self) -> bool {
        self.auto_touch
    }

    /// Rebind to another pattern context, keeping store and flags.
    pub(crate) fn bind(&self, pattern: AnyPattern) -> Provider {
        Provider {
            store: self.store.clone(),
            flags: Rc::clone(&self.flags),
            auto_touch: self.auto_touch,
            pattern: Some(pattern),
        }
    }

    /// Binding for leaf rule nodes, which never build children.
    pub(crate) fn bind_leaf(&self) -> Provider {
        Provider {
            store: self.store.clone(),
            flags: Rc::clone(&self.flags),
            auto_touch: self.auto_touch,
            pattern: None,
        }
    }

    /// Build child nodes for the bound pattern at `prefix`, restricted to
    /// `scope` for array contexts. A leaf binding yields no children.
    pub(crate) fn create_children(&self, defined: bool, prefix: &[Step], scope: Scope) -> Children {
        match self.pattern.clone() {
            Some(pattern) => compile::build_children(self, &pattern, defined, prefix, scope),
            None => Children::Map(IndexMap::new()),
        }
    }
}
