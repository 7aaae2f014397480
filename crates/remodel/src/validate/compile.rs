//! Pattern compilation into validator trees.
//!
//! Children are built before their parent node.

use indexmap::IndexMap;
use remodel_path::Step;

use crate::validate::pattern::{
    resolve_each, resolve_node, AnyPattern, Each, ObjectPattern, PatternNode,
};
use crate::validate::provider::{Provider, Scope};
use crate::validate::validation::{Children, Validation};
use std::rc::Rc;

/// Build the validator subtree for `pattern` rooted at `prefix`.
pub(crate) fn build_validations(
    provider: &Provider,
    pattern: &AnyPattern,
    defined: bool,
    prefix: &[Step],
) -> Validation {
    let children = build_children(provider, pattern, defined, prefix, Scope::Offset(0));
    Validation::new(
        provider.bind(pattern.clone()),
        prefix.to_vec(),
        pattern.self_rule(),
        Some(children),
    )
}

/// Build child nodes for `pattern` at `prefix`.
///
/// An undefined prefix yields an empty child collection of the right shape;
/// children appear when the data does. For array contexts only positions
/// admitted by `scope` are built.
pub(crate) fn build_children(
    provider: &Provider,
    pattern: &AnyPattern,
    defined: bool,
    prefix: &[Step],
    scope: Scope,
) -> Children {
    match pattern {
        AnyPattern::Object(object) => {
            let mut children = IndexMap::new();
            if !defined {
                return Children::Map(children);
            }
            let data = provider.data();
            for (field, node) in &object.sub.fields {
                let mut path = prefix.to_vec();
                path.push(Step::key(field.clone()));
                let child = match resolve_node(node) {
                    PatternNode::Rule(rule) => {
                        Validation::new(provider.bind_leaf(), path, Some(rule), None)
                    }
                    PatternNode::Object(nested) => {
                        let child_defined = remodel_path::get(&data, &path).is_some();
                        build_validations(
                            provider,
                            &AnyPattern::Object(nested),
                            child_defined,
                            &path,
                        )
                    }
                    PatternNode::Array(nested) => {
                        let child_defined = remodel_path::get(&data, &path).is_some();
                        build_validations(
                            provider,
                            &AnyPattern::Array(nested),
                            child_defined,
                            &path,
                        )
                    }
                    // resolve_node never yields Defer for verified patterns
                    PatternNode::Defer(_) => continue,
                };
                children.insert(field.clone(), child);
            }
            Children::Map(children)
        }
        AnyPattern::Array(array) => {
            let mut children = Vec::new();
            if !defined {
                return Children::List(children);
            }
            let data = provider.data();
            let len = remodel_path::get(&data, prefix)
                .and_then(|value| value.as_array())
                .map(|arr| arr.len())
                .unwrap_or(0);
            let each = resolve_each(&array.each);
            for idx in 0..len {
                if !scope.admits(idx) {
                    continue;
                }
                let mut path = prefix.to_vec();
                path.push(Step::Index(idx));
                let child = match &each {
                    Each::Rule(rule) => {
                        Validation::new(provider.bind_leaf(), path, Some(rule.clone()), None)
                    }
                    Each::Sub(sub) => {
                        let child_defined = remodel_path::get(&data, &path).is_some();
                        let object = AnyPattern::Object(Rc::new(ObjectPattern {
                            self_rule: None,
                            sub: sub.clone(),
                        }));
                        build_validations(provider, &object, child_defined, &path)
                    }
                    Each::Nested(nested) => {
                        let child_defined = remodel_path::get(&data, &path).is_some();
                        build_validations(
                            provider,
                            &AnyPattern::Array(nested.clone()),
                            child_defined,
                            &path,
                        )
                    }
                    Each::Defer(_) => continue,
                };
                children.push(child);
            }
            Children::List(children)
        }
    }
}
