//! Validation engine.
//!
//! A [`Pattern`](pattern::Pattern) compiles into a tree of
//! [`Validation`](validation::Validation) nodes mirroring the record's
//! shape. Nodes keep themselves current through store watchers and expose
//! dirty/invalid/message state per path, aggregated upwards.

use std::cell::RefCell;
use std::rc::Rc;

use remodel_reactive::Store;
use serde_json::Value;

use crate::model::builder::ValidateOptions;
use crate::model::{ModelError, ModelFlags};
use crate::validate::pattern::{AnyPattern, ObjectPattern};
use crate::validate::provider::Provider;

pub(crate) mod compile;
pub mod pattern;
pub(crate) mod provider;
pub mod validation;

pub use validation::Validation;

pub(crate) struct ValidateState {
    pub(crate) root: Validation,
}

impl ValidateState {
    pub(crate) fn new(
        store: &Store<Value>,
        flags: &Rc<RefCell<ModelFlags>>,
        options: ValidateOptions,
    ) -> Result<Self, ModelError> {
        if let Some(validations) = options.validations {
            return Ok(ValidateState { root: validations });
        }
        let Some(user_pattern) = options.pattern else {
            return Err(ModelError::MissingValidations);
        };
        pattern::verify(&user_pattern)?;

        let root_pattern = AnyPattern::Object(Rc::new(ObjectPattern {
            self_rule: None,
            sub: user_pattern,
        }));
        let provider = Provider::new(
            store.clone(),
            Rc::clone(flags),
            options.auto_touch,
            root_pattern.clone(),
        );
        let root = compile::build_validations(&provider, &root_pattern, true, &[]);
        Ok(ValidateState { root })
    }
}
