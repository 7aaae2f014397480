//! Validation patterns.
//!
//! A [`Pattern`] describes which fields of a record are validated and how.
//! Leaves are rules; object and array fields nest recursively. Recursive
//! schemas are expressed with lazy `Defer` thunks, expanded only as deep as
//! the data actually goes.

use std::collections::HashSet;
use std::rc::Rc;

use indexmap::IndexMap;
use remodel_path::Step;
use serde_json::Value;

use crate::model::ModelError;

/// Outcome of a validation rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    /// Invalid, optionally carrying a message.
    Fail(Option<String>),
}

impl Verdict {
    /// Invalid with a message.
    pub fn fail(message: impl Into<String>) -> Self {
        Verdict::Fail(Some(message.into()))
    }

    pub fn is_pass(&self) -> bool {
        matches!(self, Verdict::Pass)
    }
}

impl From<bool> for Verdict {
    fn from(valid: bool) -> Self {
        if valid {
            Verdict::Pass
        } else {
            Verdict::Fail(None)
        }
    }
}

/// A validation rule.
///
/// Receives the value at the rule's path (`None` when absent), the whole
/// record, and the path itself.
pub type RuleFn = Rc<dyn Fn(Option<&Value>, &Value, &[Step]) -> Verdict>;

/// One field of a [`Pattern`].
#[derive(Clone)]
pub enum PatternNode {
    /// Validate the field value with a rule.
    Rule(RuleFn),
    /// Validate the field as a nested object.
    Object(Rc<ObjectPattern>),
    /// Validate the field as an array.
    Array(Rc<ArrayPattern>),
    /// Resolve the node lazily, when (and as deep as) matching data exists.
    Defer(Rc<dyn Fn() -> PatternNode>),
}

impl PatternNode {
    pub fn rule<F>(rule: F) -> Self
    where
        F: Fn(Option<&Value>, &Value, &[Step]) -> Verdict + 'static,
    {
        PatternNode::Rule(Rc::new(rule))
    }

    pub fn object(sub: Pattern) -> Self {
        PatternNode::Object(Rc::new(ObjectPattern {
            self_rule: None,
            sub,
        }))
    }

    pub fn object_with<F>(sub: Pattern, rule: F) -> Self
    where
        F: Fn(Option<&Value>, &Value, &[Step]) -> Verdict + 'static,
    {
        PatternNode::Object(Rc::new(ObjectPattern {
            self_rule: Some(Rc::new(rule)),
            sub,
        }))
    }

    pub fn array(pattern: ArrayPattern) -> Self {
        PatternNode::Array(Rc::new(pattern))
    }
}

/// An object-shaped pattern: per-field nodes plus an optional rule for the
/// object value itself.
pub struct ObjectPattern {
    pub(crate) self_rule: Option<RuleFn>,
    pub(crate) sub: Pattern,
}

/// An array-shaped pattern: an element schema plus an optional rule for the
/// array value itself.
pub struct ArrayPattern {
    pub(crate) self_rule: Option<RuleFn>,
    pub(crate) each: Each,
}

impl ArrayPattern {
    pub fn new(each: Each) -> Self {
        ArrayPattern {
            self_rule: None,
            each,
        }
    }

    /// Attach a rule validating the array value itself (length checks and
    /// the like).
    pub fn with_self_rule<F>(mut self, rule: F) -> Self
    where
        F: Fn(Option<&Value>, &Value, &[Step]) -> Verdict + 'static,
    {
        self.self_rule = Some(Rc::new(rule));
        self
    }
}

/// Element schema of an [`ArrayPattern`].
#[derive(Clone)]
pub enum Each {
    /// Validate each element with a rule.
    Rule(RuleFn),
    /// Validate each element as an object.
    Sub(Pattern),
    /// Validate each element as a nested array.
    Nested(Rc<ArrayPattern>),
    /// Resolve the element schema lazily.
    Defer(Rc<dyn Fn() -> Each>),
}

impl Each {
    pub fn rule<F>(rule: F) -> Self
    where
        F: Fn(Option<&Value>, &Value, &[Step]) -> Verdict + 'static,
    {
        Each::Rule(Rc::new(rule))
    }

    pub fn sub(pattern: Pattern) -> Self {
        Each::Sub(pattern)
    }

    pub fn nested(pattern: ArrayPattern) -> Self {
        Each::Nested(Rc::new(pattern))
    }

    pub fn defer<F>(thunk: F) -> Self
    where
        F: Fn() -> Each + 'static,
    {
        Each::Defer(Rc::new(thunk))
    }
}

/// Ordered field-to-node map describing how a record is validated.
#[derive(Clone, Default)]
pub struct Pattern {
    pub(crate) fields: IndexMap<String, PatternNode>,
}

impl Pattern {
    pub fn new() -> Self {
        Pattern::default()
    }

    /// Validate a field with a rule.
    pub fn rule<F>(mut self, field: impl Into<String>, rule: F) -> Self
    where
        F: Fn(Option<&Value>, &Value, &[Step]) -> Verdict + 'static,
    {
        self.fields
            .insert(field.into(), PatternNode::Rule(Rc::new(rule)));
        self
    }

    /// Validate a field as a nested object.
    pub fn sub(mut self, field: impl Into<String>, pattern: Pattern) -> Self {
        self.fields.insert(
            field.into(),
            PatternNode::Object(Rc::new(ObjectPattern {
                self_rule: None,
                sub: pattern,
            })),
        );
        self
    }

    /// Validate a field as a nested object, with a rule for the object value
    /// itself.
    pub fn sub_with<F>(mut self, field: impl Into<String>, pattern: Pattern, rule: F) -> Self
    where
        F: Fn(Option<&Value>, &Value, &[Step]) -> Verdict + 'static,
    {
        self.fields.insert(
            field.into(),
            PatternNode::Object(Rc::new(ObjectPattern {
                self_rule: Some(Rc::new(rule)),
                sub: pattern,
            })),
        );
        self
    }

    /// Validate a field as an array.
    pub fn each(mut self, field: impl Into<String>, each: Each) -> Self {
        self.fields.insert(
            field.into(),
            PatternNode::Array(Rc::new(ArrayPattern::new(each))),
        );
        self
    }

    /// Validate a field as an array, with a rule for the array value itself.
    pub fn each_with<F>(mut self, field: impl Into<String>, each: Each, rule: F) -> Self
    where
        F: Fn(Option<&Value>, &Value, &[Step]) -> Verdict + 'static,
    {
        self.fields.insert(
            field.into(),
            PatternNode::Array(Rc::new(ArrayPattern::new(each).with_self_rule(rule))),
        );
        self
    }

    /// Validate a field with a lazily resolved node (recursive schemas).
    pub fn defer<F>(mut self, field: impl Into<String>, thunk: F) -> Self
    where
        F: Fn() -> PatternNode + 'static,
    {
        self.fields
            .insert(field.into(), PatternNode::Defer(Rc::new(thunk)));
        self
    }

    /// Insert a pre-built node.
    pub fn node(mut self, field: impl Into<String>, node: PatternNode) -> Self {
        self.fields.insert(field.into(), node);
        self
    }
}

/// Pattern context a validator node is bound to.
#[derive(Clone)]
pub(crate) enum AnyPattern {
    Object(Rc<ObjectPattern>),
    Array(Rc<ArrayPattern>),
}

impl AnyPattern {
    pub(crate) fn self_rule(&self) -> Option<RuleFn> {
        match self {
            AnyPattern::Object(pattern) => pattern.self_rule.clone(),
            AnyPattern::Array(pattern) => pattern.self_rule.clone(),
        }
    }
}

/// Resolve a deferred node once.
pub(crate) fn resolve_node(node: &PatternNode) -> PatternNode {
    match node {
        PatternNode::Defer(thunk) => thunk(),
        other => other.clone(),
    }
}

/// Resolve a deferred element schema once.
pub(crate) fn resolve_each(each: &Each) -> Each {
    match each {
        Each::Defer(thunk) => thunk(),
        other => other.clone(),
    }
}

/// Check pattern well-formedness.
///
/// Each `Defer` thunk is resolved exactly once; a thunk yielding another
/// thunk is a configuration error. Shared subtrees are visited once, so
/// recursive schemas terminate.
pub(crate) fn verify(pattern: &Pattern) -> Result<(), ModelError> {
    let mut visited = HashSet::new();
    verify_fields(pattern, &mut visited)
}

fn verify_fields(pattern: &Pattern, visited: &mut HashSet<usize>) -> Result<(), ModelError> {
    for node in pattern.fields.values() {
        verify_node(node, visited)?;
    }
    Ok(())
}

fn verify_node(node: &PatternNode, visited: &mut HashSet<usize>) -> Result<(), ModelError> {
    match node {
        PatternNode::Rule(_) => Ok(()),
        PatternNode::Object(object) => {
            if visited.insert(Rc::as_ptr(object) as usize) {
                verify_fields(&object.sub, visited)?;
            }
            Ok(())
        }
        PatternNode::Array(array) => verify_array(array, visited),
        PatternNode::Defer(thunk) => match thunk() {
            PatternNode::Defer(_) => Err(ModelError::UnresolvedPattern),
            // Resolved bodies are checked when expanded against data
            _ => Ok(()),
        },
    }
}

fn verify_array(array: &Rc<ArrayPattern>, visited: &mut HashSet<usize>) -> Result<(), ModelError> {
    if !visited.insert(Rc::as_ptr(array) as usize) {
        return Ok(());
    }
    match &array.each {
        Each::Rule(_) => Ok(()),
        Each::Sub(sub) => verify_fields(sub, visited),
        Each::Nested(nested) => verify_array(nested, visited),
        Each::Defer(thunk) => match thunk() {
            Each::Defer(_) => Err(ModelError::UnresolvedPattern),
            _ => Ok(()),
        },
    }
}
