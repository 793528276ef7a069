mod memory;

pub use memory::{MemoryDatabase, MemoryStore};

use crate::paths::StorePath;
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store connection is closed")]
    Disconnected,

    #[error("failed to encode value for {path}: {source}")]
    Encode {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to decode value at {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("store backend error: {0}")]
    Backend(String),
}

/// Handle returned by a subscription, passed back to [`RealtimeStore::off`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// A direct child of a subscribed path.
#[derive(Debug, Clone, PartialEq)]
pub struct ChildSnapshot {
    pub path: StorePath,
    pub key: String,
    pub value: Value,
}

impl ChildSnapshot {
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, StoreError> {
        serde_json::from_value(self.value.clone()).map_err(|source| StoreError::Decode {
            path: self.path.to_string(),
            source,
        })
    }
}

/// Invoked once per child event. Runs on the store's notification context,
/// so implementations should hand the snapshot off instead of calling back
/// into the store.
pub type ChildListener = Box<dyn Fn(ChildSnapshot) + Send + Sync>;

pub fn encode<T: Serialize>(path: &StorePath, value: &T) -> Result<Value, StoreError> {
    serde_json::to_value(value).map_err(|source| StoreError::Encode {
        path: path.to_string(),
        source,
    })
}

/// Hierarchical key-value store with live child subscriptions and
/// server-side cleanup on connection loss.
#[async_trait]
pub trait RealtimeStore: Send + Sync {
    /// Replaces the value at `path`. Writing `null` removes it.
    async fn set(&self, path: &StorePath, value: Value) -> Result<(), StoreError>;

    /// Appends `value` under a generated, insertion-ordered key and returns the key.
    async fn push(&self, path: &StorePath, value: Value) -> Result<String, StoreError>;

    async fn remove(&self, path: &StorePath) -> Result<(), StoreError>;

    async fn get(&self, path: &StorePath) -> Result<Option<Value>, StoreError>;

    /// Asks the server to remove `path` if this client's connection drops.
    async fn on_disconnect_remove(&self, path: &StorePath) -> Result<(), StoreError>;

    async fn cancel_on_disconnect(&self, path: &StorePath) -> Result<(), StoreError>;

    /// Fires for every existing child first, then for each child added later.
    fn on_child_added(&self, path: &StorePath, listener: ChildListener) -> ListenerId;

    fn on_child_removed(&self, path: &StorePath, listener: ChildListener) -> ListenerId;

    fn off(&self, listener: ListenerId);

    /// Fire-and-forget removal usable from synchronous teardown paths.
    /// Completion is not guaranteed.
    fn remove_detached(&self, path: &StorePath);
}
