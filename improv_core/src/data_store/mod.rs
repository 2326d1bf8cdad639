//! Data Store - remembered facts, global and per user.
//!
//! The store holds:
//! - **Global data**: one record shared by every conversation
//! - **User data**: an overlay record per user id, created on first write

use improv_data::record::{self, Record, Value};
use improv_data::PathError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataStore {
    global: Record,
    users: HashMap<String, Record>,
}

impl DataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` at `path` in the global record.
    pub fn remember(&mut self, path: &str, value: Value) -> Result<(), PathError> {
        record::set(&mut self.global, path, value)
    }

    /// Remove the global value at `path`, returning it if it existed.
    pub fn forget(&mut self, path: &str) -> Result<Option<Value>, PathError> {
        record::delete(&mut self.global, path)
    }

    /// Store `value` at `path` for one user, creating their record if needed.
    pub fn remember_for_user(
        &mut self,
        user_id: &str,
        path: &str,
        value: Value,
    ) -> Result<(), PathError> {
        // Validate before creating the user's record.
        let path = record::Path::parse(path)?;
        let data = self.users.entry(user_id.to_owned()).or_default();
        record::set_path(data, &path, value);
        Ok(())
    }

    /// Remove a user's value at `path`. Unknown users are a no-op.
    pub fn forget_for_user(
        &mut self,
        user_id: &str,
        path: &str,
    ) -> Result<Option<Value>, PathError> {
        let path = record::Path::parse(path)?;
        Ok(self
            .users
            .get_mut(user_id)
            .and_then(|data| record::delete_path(data, &path)))
    }

    pub fn global(&self) -> &Record {
        &self.global
    }

    pub fn user(&self, user_id: &str) -> Option<&Record> {
        self.users.get(user_id)
    }

    /// Ids of every user with stored data.
    pub fn user_ids(&self) -> impl Iterator<Item = &str> {
        self.users.keys().map(String::as_str)
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.global.is_empty() && self.users.is_empty()
    }
}
