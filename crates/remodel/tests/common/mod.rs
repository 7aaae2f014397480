#![allow(dead_code)]

use std::cell::{Cell, RefCell};

use async_trait::async_trait;
use remodel::{PersistenceError, Storage};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Create(Value),
    Update(Value, Value),
    Destroy(Value, Value),
}

/// In-memory storage backend recording every call, with configurable
/// responses and one-shot failure injection.
#[derive(Default)]
pub struct MemoryStorage {
    pub calls: RefCell<Vec<Call>>,
    pub create_response: RefCell<Option<Value>>,
    pub update_response: RefCell<Option<Value>>,
    pub fail_next: Cell<bool>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        MemoryStorage::default()
    }

    pub fn respond_to_create(&self, response: Value) {
        *self.create_response.borrow_mut() = Some(response);
    }

    pub fn respond_to_update(&self, response: Value) {
        *self.update_response.borrow_mut() = Some(response);
    }

    pub fn fail_next(&self) {
        self.fail_next.set(true);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    fn check_failure(&self) -> Result<(), PersistenceError> {
        if self.fail_next.take() {
            return Err("storage offline".into());
        }
        Ok(())
    }
}

#[async_trait(?Send)]
impl Storage for MemoryStorage {
    async fn create(&self, data: Value) -> Result<Option<Value>, PersistenceError> {
        self.check_failure()?;
        self.calls.borrow_mut().push(Call::Create(data));
        Ok(self.create_response.borrow().clone())
    }

    async fn update(&self, id: Value, data: Value) -> Result<Option<Value>, PersistenceError> {
        self.check_failure()?;
        self.calls.borrow_mut().push(Call::Update(id, data));
        Ok(self.update_response.borrow().clone())
    }

    async fn destroy(&self, id: Value, data: Value) -> Result<(), PersistenceError> {
        self.check_failure()?;
        self.calls.borrow_mut().push(Call::Destroy(id, data));
        Ok(())
    }
}
