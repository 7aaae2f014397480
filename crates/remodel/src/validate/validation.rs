//! Validator nodes.
//!
//! Each node tracks one path of the record: its own dirtiness/validity/
//! message from its rule, plus child nodes for object fields or array
//! elements. Nodes keep themselves current through a selector watcher on the
//! record store; `inspect` reconciles structure (fields appearing and
//! disappearing, arrays growing, shrinking, and reordering) before
//! re-evaluating the rule.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;
use remodel_path::Step;
use remodel_reactive::WatchHandle;
use serde_json::Value;

use crate::validate::pattern::{RuleFn, Verdict};
use crate::validate::provider::{Provider, Scope};

/// Child collection of a node.
pub(crate) enum Children {
    /// Keyed children of an object context.
    Map(IndexMap<String, Validation>),
    /// Positional children of an array context.
    List(Vec<Validation>),
}

impl Children {
    fn nodes(&self) -> Vec<Validation> {
        match self {
            Children::Map(map) => map.values().cloned().collect(),
            Children::List(list) => list.clone(),
        }
    }
}

struct Node {
    provider: Provider,
    path: Vec<Step>,
    rule: RuleFn,
    children: Option<Children>,
    children_type_array: bool,
    defined: bool,
    /// Element count last reconciled for array contexts.
    length: usize,
    self_dirty: bool,
    self_invalid: bool,
    message: String,
    touched: bool,
    resetted: bool,
    cached: Option<Value>,
    watch: Option<WatchHandle>,
}

/// Handle to a validator node. Cheap to clone; clones share state.
pub struct Validation {
    inner: Rc<RefCell<Node>>,
}

impl Clone for Validation {
    fn clone(&self) -> Self {
        Validation {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl Validation {
    pub(crate) fn new(
        provider: Provider,
        path: Vec<Step>,
        rule: Option<RuleFn>,
        children: Option<Children>,
    ) -> Validation {
        let rule = rule.unwrap_or_else(|| Rc::new(|_, _, _| Verdict::Pass));
        let data = provider.data();
        let cached = remodel_path::get(&data, &path).cloned();
        let defined = cached.is_some();
        let children_type_array = matches!(children, Some(Children::List(_)));
        let length = if children_type_array {
            cached
                .as_ref()
                .and_then(|value| value.as_array())
                .map(|arr| arr.len())
                .unwrap_or(0)
        } else {
            0
        };

        let validation = Validation {
            inner: Rc::new(RefCell::new(Node {
                provider,
                path,
                rule,
                children,
                children_type_array,
                defined,
                length,
                self_dirty: false,
                self_invalid: false,
                message: String::new(),
                touched: false,
                resetted: false,
                cached,
                watch: None,
            })),
        };
        validation.inspect_with(&data);

        let weak = Rc::downgrade(&validation.inner);
        let handle = {
            let node = validation.inner.borrow();
            let selector_weak = weak.clone();
            node.provider.store().watch(
                move |data: &Value| selected_value(&selector_weak, data),
                move |data: &Value, _selected: &Option<Value>| {
                    if let Some(inner) = weak.upgrade() {
                        Validation { inner }.inspect_with(data);
                    }
                },
            )
        };
        validation.inner.borrow_mut().watch = Some(handle);
        validation
    }

    /// Dotted path this node validates.
    pub fn path(&self) -> String {
        remodel_path::format(&self.inner.borrow().path)
    }

    /// Whether this node's own rule marked it dirty.
    pub fn self_dirty(&self) -> bool {
        self.inner.borrow().self_dirty
    }

    /// Whether this node's own rule failed.
    pub fn self_invalid(&self) -> bool {
        self.inner.borrow().self_invalid
    }

    /// Message from this node's rule, empty when passing or unlabeled.
    pub fn message(&self) -> String {
        self.inner.borrow().message.clone()
    }

    /// Message only while the node is dirty.
    pub fn dirty_message(&self) -> String {
        if self.dirty() {
            self.message()
        } else {
            String::new()
        }
    }

    /// Dirty here or anywhere below.
    pub fn dirty(&self) -> bool {
        self.self_dirty() || self.any_child_dirty()
    }

    /// Invalid here or, while the value exists, anywhere below.
    pub fn invalid(&self) -> bool {
        if self.self_invalid() {
            return true;
        }
        let defined = self.inner.borrow().cached.is_some();
        defined && self.any_child_invalid()
    }

    pub fn any_child_dirty(&self) -> bool {
        self.children_nodes().iter().any(Validation::dirty)
    }

    pub fn any_child_invalid(&self) -> bool {
        self.children_nodes().iter().any(Validation::invalid)
    }

    /// Keyed child of an object context.
    pub fn child(&self, field: &str) -> Option<Validation> {
        match &self.inner.borrow().children {
            Some(Children::Map(map)) => map.get(field).cloned(),
            _ => None,
        }
    }

    /// Positional child of an array context.
    pub fn item(&self, index: usize) -> Option<Validation> {
        match &self.inner.borrow().children {
            Some(Children::List(list)) => list.get(index).cloned(),
            _ => None,
        }
    }

    pub fn children_len(&self) -> usize {
        match &self.inner.borrow().children {
            Some(Children::Map(map)) => map.len(),
            Some(Children::List(list)) => list.len(),
            None => 0,
        }
    }

    /// Mark this node and everything below as explicitly dirty, re-running
    /// rules.
    pub fn touch(&self) {
        self.inner.borrow_mut().touched = true;
        for child in self.children_nodes() {
            child.touch();
        }
        self.inspect();
    }

    /// Clear dirtiness on this node and everything below, re-running rules.
    pub fn reset(&self) {
        self.inner.borrow_mut().resetted = true;
        for child in self.children_nodes() {
            child.reset();
        }
        self.inspect();
    }

    /// Stop this node's watcher and its children's. Aggregates keep their
    /// last values.
    pub fn destroy(&self) {
        let handle = self.inner.borrow_mut().watch.take();
        drop(handle);
        for child in self.children_nodes() {
            child.destroy();
        }
    }

    /// Rewrite one path segment (array reindexing), recursing into children
    /// only when the segment actually changed.
    pub(crate) fn update_path(&self, index: usize, step: Step) {
        let changed = {
            let mut node = self.inner.borrow_mut();
            match node.path.get(index) {
                None => false,
                Some(existing) if *existing == step => false,
                Some(_) => {
                    node.path[index] = step.clone();
                    true
                }
            }
        };
        if changed {
            for child in self.children_nodes() {
                child.update_path(index, step.clone());
            }
        }
    }

    /// Re-evaluate against the current record.
    pub fn inspect(&self) {
        let data = self.inner.borrow().provider.data();
        self.inspect_with(&data);
    }

    fn inspect_with(&self, data: &Value) {
        let actual = {
            let node = self.inner.borrow();
            remodel_path::get(data, &node.path).cloned()
        };

        let (has_children, children_type_array, was_defined) = {
            let node = self.inner.borrow();
            (node.children.is_some(), node.children_type_array, node.defined)
        };
        if has_children {
            let defined = actual.is_some();
            if was_defined != defined {
                if defined {
                    self.redefine_children();
                } else {
                    self.remove_all_children();
                }
                self.inner.borrow_mut().defined = defined;
            } else if children_type_array && defined {
                if let Some(arr) = actual.as_ref().and_then(|value| value.as_array()) {
                    let structured = arr
                        .first()
                        .map(|first| first.is_object() || first.is_array())
                        .unwrap_or(false);
                    if structured {
                        self.update_children_list(arr);
                    } else {
                        let length = self.inner.borrow().length;
                        if length > arr.len() {
                            self.remove_obsolete_children(arr.len());
                        } else if length < arr.len() {
                            self.append_children(length);
                        }
                    }
                }
            }
        }

        let (self_dirty, self_invalid, message) = self.validate_self(data, actual.as_ref());
        let mut node = self.inner.borrow_mut();
        node.self_dirty = self_dirty;
        node.self_invalid = self_invalid;
        node.message = message;
        node.cached = actual;
    }

    /// Evaluate the node's own rule, resolving pending touch/reset requests.
    ///
    /// While the model is locked (bulk restore in progress) the current trio
    /// is kept unless an explicit touch/reset is pending; pending requests
    /// are honored even under lock so a post-rollback reset takes effect
    /// immediately.
    fn validate_self(&self, data: &Value, actual: Option<&Value>) -> (bool, bool, String) {
        let (rule, path, self_dirty) = {
            let mut node = self.inner.borrow_mut();
            if node.provider.locked() && !node.resetted && !node.touched {
                return (node.self_dirty, node.self_invalid, node.message.clone());
            }
            let self_dirty = if node.resetted {
                node.resetted = false;
                node.touched = false;
                false
            } else if node.touched {
                node.touched = false;
                true
            } else if node.provider.auto_touch() && actual != node.cached.as_ref() {
                true
            } else {
                node.self_dirty
            };
            (Rc::clone(&node.rule), node.path.clone(), self_dirty)
        };

        // Rules run without an active borrow so they may read the tree
        match rule(actual, data, &path) {
            Verdict::Pass => (self_dirty, false, String::new()),
            Verdict::Fail(message) => (self_dirty, true, message.unwrap_or_default()),
        }
    }

    fn children_nodes(&self) -> Vec<Validation> {
        match &self.inner.borrow().children {
            Some(children) => children.nodes(),
            None => Vec::new(),
        }
    }

    /// Value appeared at this node's path: build the child collection anew.
    fn redefine_children(&self) {
        let (provider, path) = {
            let node = self.inner.borrow();
            (node.provider.clone(), node.path.clone())
        };
        let children = provider.create_children(true, &path, Scope::Offset(0));
        let mut node = self.inner.borrow_mut();
        if let Children::List(list) = &children {
            node.length = list.len();
        }
        node.children = Some(children);
    }

    /// Value disappeared: destroy all children and leave an empty collection.
    fn remove_all_children(&self) {
        let previous = {
            let mut node = self.inner.borrow_mut();
            node.length = 0;
            let empty = if node.children_type_array {
                Children::List(Vec::new())
            } else {
                Children::Map(IndexMap::new())
            };
            node.children.replace(empty)
        };
        if let Some(children) = previous {
            for child in children.nodes() {
                child.destroy();
            }
        }
    }

    /// Reconcile children of a structured array (elements are objects or
    /// arrays) against its new content.
    ///
    /// Two matching passes, both against the array value this node cached
    /// before the change: first each new element claims the first unconsumed
    /// position holding an equal previous value (elements that moved keep
    /// their node and state), then leftover positions pair with leftover
    /// children in order (elements edited in place keep their node; the
    /// child's watchers revalidate it against the new value). Matching never
    /// reads child state and does not depend on the order watchers fire in.
    /// Children left over after both passes are destroyed; positions left
    /// over get fresh subtrees.
    fn update_children_list(&self, arr: &[Value]) {
        let (provider, path, existing, previous) = {
            let node = self.inner.borrow();
            let existing = match &node.children {
                Some(Children::List(list)) => list.clone(),
                _ => Vec::new(),
            };
            let previous: Vec<Value> = node
                .cached
                .as_ref()
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default();
            (node.provider.clone(), node.path.clone(), existing, previous)
        };

        let mut consumed = vec![false; existing.len()];
        let mut updated: Vec<Option<Validation>> = Vec::with_capacity(arr.len());
        let mut unmatched: Vec<usize> = Vec::new();

        for (position, value) in arr.iter().enumerate() {
            let found = (0..existing.len()).find(|&idx| {
                !consumed[idx] && previous.get(idx).is_some_and(|prev| prev == value)
            });
            match found {
                Some(idx) => {
                    consumed[idx] = true;
                    let child = existing[idx].clone();
                    child.update_path(path.len(), Step::Index(position));
                    updated.push(Some(child));
                }
                None => {
                    updated.push(None);
                    unmatched.push(position);
                }
            }
        }

        let mut missed: Vec<usize> = Vec::new();
        let leftover: Vec<usize> = (0..existing.len()).filter(|&idx| !consumed[idx]).collect();
        let mut leftover = leftover.into_iter();
        for position in unmatched {
            match leftover.next() {
                Some(idx) => {
                    consumed[idx] = true;
                    let child = existing[idx].clone();
                    child.update_path(path.len(), Step::Index(position));
                    updated[position] = Some(child);
                }
                None => missed.push(position),
            }
        }

        for (idx, child) in existing.iter().enumerate() {
            if !consumed[idx] {
                child.destroy();
            }
        }

        if !missed.is_empty() {
            if let Children::List(fresh) =
                provider.create_children(true, &path, Scope::Indices(missed))
            {
                let mut fresh = fresh.into_iter();
                for slot in updated.iter_mut() {
                    if slot.is_none() {
                        *slot = fresh.next();
                    }
                }
            }
        }

        let list: Vec<Validation> = updated.into_iter().flatten().collect();
        let mut node = self.inner.borrow_mut();
        node.length = list.len();
        node.children = Some(Children::List(list));
    }

    /// Scalar array shrank: drop trailing children.
    fn remove_obsolete_children(&self, new_len: usize) {
        let removed = {
            let mut node = self.inner.borrow_mut();
            match &mut node.children {
                Some(Children::List(list)) => {
                    let removed = list.split_off(new_len);
                    node.length = new_len;
                    removed
                }
                _ => Vec::new(),
            }
        };
        for child in removed {
            child.destroy();
        }
    }

    /// Scalar array grew: build children for the new tail positions.
    fn append_children(&self, old_len: usize) {
        let (provider, path) = {
            let node = self.inner.borrow();
            (node.provider.clone(), node.path.clone())
        };
        if let Children::List(fresh) = provider.create_children(true, &path, Scope::Offset(old_len))
        {
            let mut node = self.inner.borrow_mut();
            if let Some(Children::List(list)) = &mut node.children {
                list.extend(fresh);
                node.length = list.len();
            }
        }
    }
}

fn selected_value(weak: &Weak<RefCell<Node>>, data: &Value) -> Option<Value> {
    let inner = weak.upgrade()?;
    let path = inner.borrow().path.clone();
    remodel_path::get(data, &path).cloned()
}
