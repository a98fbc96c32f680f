//! Shared session storage.
//!
//! A [`Session`] is a cheap handle onto one session map. The request reads
//! from it (`Input::Session`) and the response writes to it
//! (`set_session` / `unset_session`); both see the same data because clones
//! share the underlying map.

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::{Map, Value};

/// Handle onto the current session map.
#[derive(Debug, Clone, Default)]
pub struct Session {
    inner: Rc<RefCell<Map<String, Value>>>,
}

impl Session {
    /// Creates an empty session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a session pre-filled with values.
    pub fn from_map(values: Map<String, Value>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(values)),
        }
    }

    /// Returns a copy of the value stored under `key`.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.inner.borrow().get(key).cloned()
    }

    /// Stores a value, returning the previous one.
    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.inner.borrow_mut().insert(key.into(), value.into())
    }

    /// Removes a value, returning it.
    pub fn remove(&self, key: &str) -> Option<Value> {
        self.inner.borrow_mut().remove(key)
    }

    /// Returns true if `key` is set.
    pub fn contains(&self, key: &str) -> bool {
        self.inner.borrow().contains_key(key)
    }

    /// Snapshot of all values.
    pub fn to_map(&self) -> Map<String, Value> {
        self.inner.borrow().clone()
    }

    /// Returns true if both handles point at the same session.
    pub fn same_as(&self, other: &Session) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}
