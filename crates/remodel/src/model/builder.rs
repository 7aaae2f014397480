//! Capability composition.
//!
//! Capabilities are applied in a fixed order (base, save, rollback,
//! validate) regardless of the order configuration methods were called in,
//! so the rollback snapshot is taken before validators attach and hook
//! chaining stays deterministic.

use std::cell::RefCell;
use std::rc::Rc;

use remodel_reactive::Store;
use serde_json::Value;

use crate::model::{Model, ModelError, ModelFlags, ModelHooks, NoHooks};
use crate::rollback::mask::Mask;
use crate::rollback::RollbackState;
use crate::save::{SaveState, Storage};
use crate::validate::pattern::Pattern;
use crate::validate::{ValidateState, Validation};

/// Save capability configuration.
pub struct SaveOptions {
    pub storage: Rc<dyn Storage>,
}

/// Rollback capability configuration.
#[derive(Default)]
pub struct RollbackOptions {
    /// Default mask applied by `rollback()`; `None` restores everything.
    pub mask: Option<Mask>,
}

/// Validation capability configuration.
///
/// Exactly one of `pattern` and `validations` should be set: `pattern`
/// compiles a fresh validator tree, `validations` injects a ready-made node
/// (for sharing a slice of another model's tree).
#[derive(Default)]
pub struct ValidateOptions {
    pub pattern: Option<Pattern>,
    pub validations: Option<Validation>,
    /// Mark nodes self-dirty as soon as their value changes, without an
    /// explicit `touch`.
    pub auto_touch: bool,
}

/// Builder for [`Model`].
pub struct ModelBuilder {
    id_key: String,
    data: Value,
    reactive: bool,
    hooks: Rc<dyn ModelHooks>,
    save: Option<SaveOptions>,
    rollback: Option<RollbackOptions>,
    validate: Option<ValidateOptions>,
}

impl ModelBuilder {
    pub fn new(id_key: impl Into<String>, data: Value) -> Self {
        ModelBuilder {
            id_key: id_key.into(),
            data,
            reactive: true,
            hooks: Rc::new(NoHooks),
            save: None,
            rollback: None,
            validate: None,
        }
    }

    /// Disable the dirty watcher (the record can still be read and written).
    pub fn reactive(mut self, reactive: bool) -> Self {
        self.reactive = reactive;
        self
    }

    pub fn hooks(mut self, hooks: Rc<dyn ModelHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn with_save(mut self, options: SaveOptions) -> Self {
        self.save = Some(options);
        self
    }

    /// Shorthand for [`with_save`](ModelBuilder::with_save).
    pub fn with_storage(self, storage: Rc<dyn Storage>) -> Self {
        self.with_save(SaveOptions { storage })
    }

    pub fn with_rollback(mut self, options: RollbackOptions) -> Self {
        self.rollback = Some(options);
        self
    }

    /// Shorthand enabling rollback with a default mask.
    pub fn with_rollback_mask(self, mask: Mask) -> Self {
        self.with_rollback(RollbackOptions { mask: Some(mask) })
    }

    pub fn with_validate(mut self, options: ValidateOptions) -> Self {
        self.validate = Some(options);
        self
    }

    /// Shorthand enabling validation from a pattern.
    pub fn with_pattern(self, pattern: Pattern) -> Self {
        self.with_validate(ValidateOptions {
            pattern: Some(pattern),
            ..ValidateOptions::default()
        })
    }

    pub fn build(self) -> Result<Model, ModelError> {
        let flags = Rc::new(RefCell::new(ModelFlags::default()));
        let store = Store::new(self.data);

        let base_watch = if self.reactive {
            Some(Model::init_dirty_watch(&store, &flags))
        } else {
            None
        };
        let save = self.save.map(|options| SaveState::new(options.storage));
        let rollback = self
            .rollback
            .map(|options| RollbackState::new(store.get(), options.mask.as_ref()));
        let validate = match self.validate {
            Some(options) => Some(ValidateState::new(&store, &flags, options)?),
            None => None,
        };

        Ok(Model::assemble(
            self.id_key,
            store,
            flags,
            self.hooks,
            base_watch,
            save,
            rollback,
            validate,
        ))
    }
}
