//! The base model: record store, flags, lifecycle hooks, capabilities.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use remodel_path::PathError;
use remodel_reactive::{Store, WatchHandle};
use serde_json::Value;
use thiserror::Error;

use crate::rollback::RollbackState;
use crate::save::SaveState;
use crate::validate::{ValidateState, Validation};

pub mod builder;

pub use builder::ModelBuilder;

static NEXT_UID: AtomicU64 = AtomicU64::new(1);

fn next_uid() -> u64 {
    NEXT_UID.fetch_add(1, Ordering::Relaxed)
}

/// Configuration and composition errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("pattern or predefined validations should be set")]
    MissingValidations,
    #[error("deferred pattern must resolve to a concrete pattern")]
    UnresolvedPattern,
    #[error("save capability is not enabled")]
    SaveNotEnabled,
}

/// Optional capabilities a model can be built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Save,
    Rollback,
    Validate,
}

/// Lifecycle state shared between the model, its dirty watcher, and the
/// validation provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelFlags {
    pub dirty: bool,
    pub new: bool,
    pub deleted: bool,
    pub destroyed: bool,
    pub locked: bool,
}

impl Default for ModelFlags {
    fn default() -> Self {
        ModelFlags {
            dirty: false,
            new: true,
            deleted: false,
            destroyed: false,
            locked: false,
        }
    }
}

/// Lifecycle hooks.
///
/// All methods default to no-ops. For the `after_*` hooks the user body runs
/// before the built-in capability behavior (snapshot refresh after
/// create/save, validation reset after rollback).
pub trait ModelHooks {
    fn before_create(&self, model: &Model) {
        let _ = model;
    }
    fn after_create(&self, model: &Model) {
        let _ = model;
    }
    fn before_save(&self, model: &Model) {
        let _ = model;
    }
    fn after_save(&self, model: &Model) {
        let _ = model;
    }
    fn before_destroy(&self, model: &Model) {
        let _ = model;
    }
    fn after_destroy(&self, model: &Model) {
        let _ = model;
    }
    fn before_rollback(&self, model: &Model) {
        let _ = model;
    }
    fn after_rollback(&self, model: &Model) {
        let _ = model;
    }
}

pub(crate) struct NoHooks;

impl ModelHooks for NoHooks {}

/// A change-tracked JSON record with optional save, rollback, and validation
/// capabilities.
pub struct Model {
    uid: u64,
    id_key: String,
    pub(crate) store: Store<Value>,
    pub(crate) flags: Rc<RefCell<ModelFlags>>,
    pub(crate) hooks: Rc<dyn ModelHooks>,
    base_watch: Option<WatchHandle>,
    pub(crate) save: Option<SaveState>,
    pub(crate) rollback: Option<RollbackState>,
    pub(crate) validate: Option<ValidateState>,
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("uid", &self.uid)
            .field("id_key", &self.id_key)
            .field("flags", &*self.flags.borrow())
            .finish_non_exhaustive()
    }
}

impl Model {
    /// Start building a model around `data`, using `id_key` as the identifier
    /// field.
    pub fn builder(id_key: impl Into<String>, data: Value) -> ModelBuilder {
        ModelBuilder::new(id_key, data)
    }

    pub(crate) fn assemble(
        id_key: String,
        store: Store<Value>,
        flags: Rc<RefCell<ModelFlags>>,
        hooks: Rc<dyn ModelHooks>,
        base_watch: Option<WatchHandle>,
        save: Option<SaveState>,
        rollback: Option<RollbackState>,
        validate: Option<ValidateState>,
    ) -> Self {
        Model {
            uid: next_uid(),
            id_key,
            store,
            flags,
            hooks,
            base_watch,
            save,
            rollback,
            validate,
        }
    }

    /// Process-wide unique model id.
    pub fn uid(&self) -> u64 {
        self.uid
    }

    /// Name of the identifier field.
    pub fn id_key(&self) -> &str {
        self.id_key.as_str()
    }

    /// Current value of the identifier field, `Null` when absent.
    pub fn id_value(&self) -> Value {
        self.store
            .with(|data| data.get(self.id_key.as_str()).cloned())
            .unwrap_or(Value::Null)
    }

    /// Clone out the current record.
    pub fn data(&self) -> Value {
        self.store.get()
    }

    /// Read the record through a closure without cloning.
    pub fn with_data<R>(&self, f: impl FnOnce(&Value) -> R) -> R {
        self.store.with(f)
    }

    /// Mutate the record and commit; watchers flush synchronously when the
    /// record actually changed.
    pub fn update<R>(&self, f: impl FnOnce(&mut Value) -> R) -> R {
        self.store.update(f)
    }

    /// Write a value at a dotted path, creating intermediate containers.
    pub fn set(&self, path: &str, value: Value) -> Result<(), PathError> {
        let steps = remodel_path::parse(path)?;
        self.store
            .update(|data| remodel_path::set(data, &steps, value));
        Ok(())
    }

    /// Read the value at a dotted path.
    pub fn get(&self, path: &str) -> Result<Option<Value>, PathError> {
        let steps = remodel_path::parse(path)?;
        Ok(self
            .store
            .with(|data| remodel_path::get(data, &steps).cloned()))
    }

    pub fn dirty(&self) -> bool {
        self.flags.borrow().dirty
    }

    pub fn is_new(&self) -> bool {
        self.flags.borrow().new
    }

    pub fn deleted(&self) -> bool {
        self.flags.borrow().deleted
    }

    pub fn destroyed(&self) -> bool {
        self.flags.borrow().destroyed
    }

    /// Mark the record for deletion; the next `save` issues a destroy call.
    pub fn delete(&mut self) {
        self.flags.borrow_mut().deleted = true;
    }

    /// Release watcher resources. Idempotent.
    ///
    /// Does not touch the `destroyed` flag; only a successful destroy save
    /// marks the record as remotely destroyed.
    pub fn destroy(&mut self) {
        if let Some(validate) = &self.validate {
            validate.root.destroy();
        }
        if let Some(mut watch) = self.base_watch.take() {
            watch.stop();
        }
    }

    pub fn has_capability(&self, capability: Capability) -> bool {
        match capability {
            Capability::Save => self.save.is_some(),
            Capability::Rollback => self.rollback.is_some(),
            Capability::Validate => self.validate.is_some(),
        }
    }

    /// Root validator node, when the validate capability is enabled.
    pub fn validations(&self) -> Option<&Validation> {
        self.validate.as_ref().map(|state| &state.root)
    }

    /// Root validator node shorthand.
    ///
    /// # Panics
    ///
    /// Panics when the validate capability is not enabled; use
    /// [`validations`](Model::validations) for a fallible variant.
    pub fn v(&self) -> &Validation {
        self.validations()
            .expect("validate capability is not enabled")
    }

    pub(crate) fn run_before_create(&self) {
        let hooks = Rc::clone(&self.hooks);
        hooks.before_create(self);
    }

    pub(crate) fn run_after_create(&mut self) {
        let hooks = Rc::clone(&self.hooks);
        hooks.after_create(self);
        if self.rollback.is_some() {
            self.update_original();
        }
    }

    pub(crate) fn run_before_save(&self) {
        let hooks = Rc::clone(&self.hooks);
        hooks.before_save(self);
    }

    pub(crate) fn run_after_save(&mut self) {
        let hooks = Rc::clone(&self.hooks);
        hooks.after_save(self);
        if self.rollback.is_some() {
            self.update_original();
        }
    }

    pub(crate) fn run_before_destroy(&self) {
        let hooks = Rc::clone(&self.hooks);
        hooks.before_destroy(self);
    }

    pub(crate) fn run_after_destroy(&self) {
        let hooks = Rc::clone(&self.hooks);
        hooks.after_destroy(self);
    }

    pub(crate) fn run_before_rollback(&self) {
        let hooks = Rc::clone(&self.hooks);
        hooks.before_rollback(self);
    }

    pub(crate) fn run_after_rollback(&mut self) {
        let hooks = Rc::clone(&self.hooks);
        hooks.after_rollback(self);
        if let Some(validate) = &self.validate {
            let root = validate.root.clone();
            self.flags.borrow_mut().locked = true;
            root.reset();
            self.flags.borrow_mut().locked = false;
        }
    }

    pub(crate) fn init_dirty_watch(
        store: &Store<Value>,
        flags: &Rc<RefCell<ModelFlags>>,
    ) -> WatchHandle {
        let flags = Rc::clone(flags);
        store.subscribe(move |_| {
            let mut flags = flags.borrow_mut();
            if !flags.locked && !flags.dirty {
                flags.dirty = true;
            }
        })
    }
}
