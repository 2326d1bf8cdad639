//! Durable key/value storage provided by the host.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

use crate::error::BrainError;
use crate::record::Value;

/// Host-provided durable storage, keyed by namespace.
#[async_trait]
pub trait Brain: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>, BrainError>;

    async fn set(&self, key: &str, value: Value) -> Result<(), BrainError>;
}

/// A brain that keeps everything in memory.
#[derive(Debug, Default)]
pub struct MemoryBrain {
    entries: RwLock<HashMap<String, Value>>,
}

impl MemoryBrain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[async_trait]
impl Brain for MemoryBrain {
    async fn get(&self, key: &str) -> Result<Option<Value>, BrainError> {
        Ok(self.entries.read().get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), BrainError> {
        self.entries.write().insert(key.to_owned(), value);
        Ok(())
    }
}
