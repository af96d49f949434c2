#![forbid(unsafe_code)]

//! Process-wide global variable store.
//!
//! The one piece of intentionally shared mutable state in the runtime: many
//! request workers read and write it concurrently through the `g:` reference
//! prefix, so implementations must synchronize internally.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value as JsonValue;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store error: {0}")]
    Other(String),
}

#[async_trait]
pub trait GlobalStore: Send + Sync {
    /// Read a value; `default` is returned (without being stored) when the
    /// name is absent or its TTL has lapsed.
    async fn get(
        &self,
        namespace: &str,
        name: &str,
        default: Option<JsonValue>,
    ) -> Result<Option<JsonValue>, StoreError>;

    async fn set(
        &self,
        namespace: &str,
        name: &str,
        value: JsonValue,
        ttl: Option<Duration>,
    ) -> Result<(), StoreError>;

    async fn remove(&self, namespace: &str, name: &str) -> Result<(), StoreError>;
}

#[derive(Debug, Clone)]
struct Entry {
    value: JsonValue,
    expires_at: Option<Instant>,
}

impl Entry {
    fn expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Instant::now() >= at)
    }
}

/// In-memory store on a concurrent map. Expired entries are dropped lazily
/// on read; `purge_expired` sweeps the rest.
#[derive(Default)]
pub struct MemoryGlobalStore {
    entries: DashMap<(String, String), Entry>,
}

impl MemoryGlobalStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn purge_expired(&self) {
        self.entries.retain(|_, e| !e.expired());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl GlobalStore for MemoryGlobalStore {
    async fn get(
        &self,
        namespace: &str,
        name: &str,
        default: Option<JsonValue>,
    ) -> Result<Option<JsonValue>, StoreError> {
        let key = (namespace.to_string(), name.to_string());
        if let Some(entry) = self.entries.get(&key) {
            if !entry.expired() {
                return Ok(Some(entry.value.clone()));
            }
        }
        self.entries.remove_if(&key, |_, e| e.expired());
        Ok(default)
    }

    async fn set(
        &self,
        namespace: &str,
        name: &str,
        value: JsonValue,
        ttl: Option<Duration>,
    ) -> Result<(), StoreError> {
        let entry = Entry {
            value,
            expires_at: ttl.map(|d| Instant::now() + d),
        };
        self.entries
            .insert((namespace.to_string(), name.to_string()), entry);
        Ok(())
    }

    async fn remove(&self, namespace: &str, name: &str) -> Result<(), StoreError> {
        self.entries
            .remove(&(namespace.to_string(), name.to_string()));
        Ok(())
    }
}
