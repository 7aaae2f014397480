//! Async persistence adapter.
//!
//! A [`Storage`] backend receives the record and decides how to persist it;
//! [`Model::save`] routes to exactly one backend call per invocation based
//! on the model flags: deleted records are destroyed, new records are
//! created, everything else is updated.

use std::cell::RefCell;
use std::rc::Rc;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::model::{Model, ModelError};

/// Opaque persistence failure, rethrown to the caller unchanged.
pub type PersistenceError = Box<dyn std::error::Error>;

/// Persistence backend.
///
/// All methods default to successful no-ops, so a backend only implements
/// the calls it supports. `create` and `update` may return a replacement
/// body: an object replaces the whole record, a scalar is written into the
/// identifier field, `None`/`Null` leaves the record untouched.
#[async_trait(?Send)]
pub trait Storage {
    async fn create(&self, data: Value) -> Result<Option<Value>, PersistenceError> {
        let _ = data;
        Ok(None)
    }

    async fn update(&self, id: Value, data: Value) -> Result<Option<Value>, PersistenceError> {
        let _ = (id, data);
        Ok(None)
    }

    async fn destroy(&self, id: Value, data: Value) -> Result<(), PersistenceError> {
        let _ = (id, data);
        Ok(())
    }
}

/// Errors surfaced by [`Model::save`].
#[derive(Debug, Error)]
pub enum SaveError {
    #[error(transparent)]
    Config(#[from] ModelError),
    #[error("{0}")]
    Persistence(PersistenceError),
}

#[derive(Default)]
pub(crate) struct SaveFlags {
    creating: bool,
    updating: bool,
    destroying: bool,
}

pub(crate) struct SaveState {
    storage: Rc<dyn Storage>,
    flags: Rc<RefCell<SaveFlags>>,
}

impl SaveState {
    pub(crate) fn new(storage: Rc<dyn Storage>) -> Self {
        SaveState {
            storage,
            flags: Rc::new(RefCell::new(SaveFlags::default())),
        }
    }
}

impl Model {
    pub fn creating(&self) -> bool {
        self.save
            .as_ref()
            .is_some_and(|state| state.flags.borrow().creating)
    }

    pub fn updating(&self) -> bool {
        self.save
            .as_ref()
            .is_some_and(|state| state.flags.borrow().updating)
    }

    pub fn destroying(&self) -> bool {
        self.save
            .as_ref()
            .is_some_and(|state| state.flags.borrow().destroying)
    }

    /// Whether any persistence call is in flight.
    pub fn saving(&self) -> bool {
        self.creating() || self.updating() || self.destroying()
    }

    /// Persist the record.
    ///
    /// - deleted model: `destroy(id, data)`; on success the model becomes
    ///   destroyed, on failure the `deleted` flag reverts so the record is
    ///   not stranded in a half-deleted state;
    /// - new model: `create(data)`; on success the model is no longer new
    ///   and no longer dirty;
    /// - otherwise: `update(id, data)`; on success the model is no longer
    ///   dirty.
    ///
    /// Backend failures are rethrown unchanged inside
    /// [`SaveError::Persistence`].
    pub async fn save(&mut self) -> Result<(), SaveError> {
        let (storage, save_flags) = match &self.save {
            Some(state) => (Rc::clone(&state.storage), Rc::clone(&state.flags)),
            None => return Err(ModelError::SaveNotEnabled.into()),
        };

        if self.deleted() {
            save_flags.borrow_mut().destroying = true;
            self.run_before_destroy();
            match storage.destroy(self.id_value(), self.data()).await {
                Ok(()) => {
                    self.run_after_destroy();
                    save_flags.borrow_mut().destroying = false;
                    self.flags.borrow_mut().destroyed = true;
                }
                Err(err) => {
                    save_flags.borrow_mut().destroying = false;
                    self.flags.borrow_mut().deleted = false;
                    return Err(SaveError::Persistence(err));
                }
            }
        } else if self.is_new() {
            save_flags.borrow_mut().creating = true;
            self.run_before_create();
            match storage.create(self.data()).await {
                Ok(response) => {
                    self.process_saved(response);
                    self.run_after_create();
                    save_flags.borrow_mut().creating = false;
                    let mut flags = self.flags.borrow_mut();
                    flags.new = false;
                    flags.dirty = false;
                }
                Err(err) => {
                    save_flags.borrow_mut().creating = false;
                    return Err(SaveError::Persistence(err));
                }
            }
        } else {
            save_flags.borrow_mut().updating = true;
            self.run_before_save();
            match storage.update(self.id_value(), self.data()).await {
                Ok(response) => {
                    self.process_saved(response);
                    self.run_after_save();
                    save_flags.borrow_mut().updating = false;
                    self.flags.borrow_mut().dirty = false;
                }
                Err(err) => {
                    save_flags.borrow_mut().updating = false;
                    return Err(SaveError::Persistence(err));
                }
            }
        }

        Ok(())
    }

    fn process_saved(&self, response: Option<Value>) {
        match response {
            None | Some(Value::Null) => {}
            Some(body @ Value::Object(_)) => self.store.replace(body),
            Some(scalar) => {
                let id_key = self.id_key().to_string();
                self.store.update(|data| {
                    if let Value::Object(map) = data {
                        map.insert(id_key, scalar);
                    }
                });
            }
        }
    }
}
