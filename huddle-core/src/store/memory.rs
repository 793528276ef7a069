use super::{ChildListener, ChildSnapshot, ListenerId, RealtimeStore, StoreError};
use crate::model::ServerValue;
use crate::paths::StorePath;
use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

/// Alphabet of generated keys, in ascending byte order so keys sort by creation.
const PUSH_CHARS: &[u8; 64] = b"-0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ_abcdefghijklmnopqrstuvwxyz";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListenerKind {
    ChildAdded,
    ChildRemoved,
}

struct Listener {
    id: u64,
    client: u64,
    path: StorePath,
    kind: ListenerKind,
    callback: ChildListener,
}

struct ChildEvent {
    snapshot: ChildSnapshot,
    targets: Vec<Arc<Listener>>,
}

#[derive(Default)]
struct PushIdState {
    last_millis: u64,
    counter: u64,
}

#[derive(Default)]
struct DatabaseInner {
    tree: Mutex<Value>,
    listeners: DashMap<u64, Arc<Listener>>,
    on_disconnect: DashMap<u64, Vec<StorePath>>,
    next_listener: AtomicU64,
    next_client: AtomicU64,
    push_ids: Mutex<PushIdState>,
}

impl DatabaseInner {
    /// Writes (`Some`) or removes (`None`) the node at `path`, then notifies
    /// every listener whose direct children changed.
    fn apply(&self, path: &StorePath, value: Option<Value>) {
        let events = {
            let mut tree = self.tree.lock();

            let related: Vec<Arc<Listener>> = self
                .listeners
                .iter()
                .filter(|l| l.path.contains(path) || path.contains(&l.path))
                .map(|l| Arc::clone(l.value()))
                .collect();

            let mut watched: Vec<StorePath> = related.iter().map(|l| l.path.clone()).collect();
            watched.sort();
            watched.dedup();

            let before: Vec<BTreeMap<String, Value>> =
                watched.iter().map(|p| children_of(&tree, p)).collect();

            let segments = path.segments();
            match value {
                Some(v) => write_at(&mut tree, &segments, v),
                None => remove_at(&mut tree, &segments),
            }
            if !tree.is_object() {
                *tree = Value::Object(Map::new());
            }

            let mut events = Vec::new();
            for (watched_path, old) in watched.iter().zip(before) {
                let new = children_of(&tree, watched_path);
                let targets_for = |kind: ListenerKind| -> Vec<Arc<Listener>> {
                    related
                        .iter()
                        .filter(|l| l.kind == kind && &l.path == watched_path)
                        .cloned()
                        .collect()
                };

                for (key, value) in &new {
                    if !old.contains_key(key) {
                        events.push(ChildEvent {
                            snapshot: ChildSnapshot {
                                path: watched_path.child(key),
                                key: key.clone(),
                                value: value.clone(),
                            },
                            targets: targets_for(ListenerKind::ChildAdded),
                        });
                    }
                }
                for (key, value) in old {
                    if !new.contains_key(&key) {
                        events.push(ChildEvent {
                            snapshot: ChildSnapshot {
                                path: watched_path.child(&key),
                                key,
                                value,
                            },
                            targets: targets_for(ListenerKind::ChildRemoved),
                        });
                    }
                }
            }
            events
        };

        for event in events {
            for listener in event.targets {
                if self.listeners.contains_key(&listener.id) {
                    (listener.callback)(event.snapshot.clone());
                }
            }
        }
    }

    fn subscribe(
        &self,
        client: u64,
        path: &StorePath,
        kind: ListenerKind,
        callback: ChildListener,
    ) -> ListenerId {
        let id = self.next_listener.fetch_add(1, Ordering::Relaxed);
        let listener = Arc::new(Listener {
            id,
            client,
            path: path.clone(),
            kind,
            callback,
        });

        let existing = {
            let tree = self.tree.lock();
            self.listeners.insert(id, Arc::clone(&listener));
            match kind {
                ListenerKind::ChildAdded => children_of(&tree, path),
                ListenerKind::ChildRemoved => BTreeMap::new(),
            }
        };

        for (key, value) in existing {
            (listener.callback)(ChildSnapshot {
                path: path.child(&key),
                key,
                value,
            });
        }

        ListenerId(id)
    }

    fn next_push_id(&self) -> String {
        let mut state = self.push_ids.lock();
        let now = now_millis().max(state.last_millis);
        if now == state.last_millis {
            state.counter += 1;
        } else {
            state.last_millis = now;
            state.counter = 0;
        }

        let mut id = String::with_capacity(20);
        push_fixed(now, 8, &mut id);
        push_fixed(state.counter, 12, &mut id);
        id
    }
}

/// Shared in-process database. Each [`MemoryStore`] obtained from
/// [`MemoryDatabase::connect`] behaves like one client connection.
#[derive(Clone, Default)]
pub struct MemoryDatabase {
    inner: Arc<DatabaseInner>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connect(&self) -> MemoryStore {
        let client = self.inner.next_client.fetch_add(1, Ordering::Relaxed);
        debug!("MemoryStore client {} connected", client);
        MemoryStore {
            db: Arc::clone(&self.inner),
            client,
            connected: AtomicBool::new(true),
        }
    }

    /// Reads a node without going through a client connection.
    pub fn snapshot(&self, path: &StorePath) -> Option<Value> {
        let tree = self.inner.tree.lock();
        node_at(&tree, path).cloned()
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.len()
    }

    pub fn listeners_at(&self, path: &StorePath) -> usize {
        self.inner
            .listeners
            .iter()
            .filter(|l| &l.path == path)
            .count()
    }
}

pub struct MemoryStore {
    db: Arc<DatabaseInner>,
    client: u64,
    connected: AtomicBool,
}

impl MemoryStore {
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Simulates losing the connection: drops this client's listeners and
    /// runs its deferred removals as the server would.
    pub fn disconnect(&self) {
        if !self.connected.swap(false, Ordering::SeqCst) {
            return;
        }

        self.db.listeners.retain(|_, l| l.client != self.client);

        let pending = self
            .db
            .on_disconnect
            .remove(&self.client)
            .map(|(_, paths)| paths)
            .unwrap_or_default();

        debug!(
            "MemoryStore client {} disconnected, running {} deferred removal(s)",
            self.client,
            pending.len()
        );
        for path in pending {
            self.db.apply(&path, None);
        }
    }

    fn ensure_connected(&self) -> Result<(), StoreError> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(StoreError::Disconnected)
        }
    }
}

impl Drop for MemoryStore {
    fn drop(&mut self) {
        self.disconnect();
    }
}

#[async_trait]
impl RealtimeStore for MemoryStore {
    async fn set(&self, path: &StorePath, value: Value) -> Result<(), StoreError> {
        self.ensure_connected()?;
        let value = normalize(value, now_millis());
        if is_empty(&value) {
            self.db.apply(path, None);
        } else {
            self.db.apply(path, Some(value));
        }
        Ok(())
    }

    async fn push(&self, path: &StorePath, value: Value) -> Result<String, StoreError> {
        self.ensure_connected()?;
        let key = self.db.next_push_id();
        self.set(&path.child(&key), value).await?;
        Ok(key)
    }

    async fn remove(&self, path: &StorePath) -> Result<(), StoreError> {
        self.ensure_connected()?;
        self.db.apply(path, None);
        Ok(())
    }

    async fn get(&self, path: &StorePath) -> Result<Option<Value>, StoreError> {
        self.ensure_connected()?;
        let tree = self.db.tree.lock();
        Ok(node_at(&tree, path).cloned())
    }

    async fn on_disconnect_remove(&self, path: &StorePath) -> Result<(), StoreError> {
        self.ensure_connected()?;
        let mut pending = self.db.on_disconnect.entry(self.client).or_default();
        if !pending.contains(path) {
            pending.push(path.clone());
        }
        Ok(())
    }

    async fn cancel_on_disconnect(&self, path: &StorePath) -> Result<(), StoreError> {
        self.ensure_connected()?;
        if let Some(mut pending) = self.db.on_disconnect.get_mut(&self.client) {
            pending.retain(|p| p != path);
        }
        Ok(())
    }

    fn on_child_added(&self, path: &StorePath, listener: ChildListener) -> ListenerId {
        if !self.is_connected() {
            warn!("Subscribing to {} on a disconnected client", path);
        }
        self.db
            .subscribe(self.client, path, ListenerKind::ChildAdded, listener)
    }

    fn on_child_removed(&self, path: &StorePath, listener: ChildListener) -> ListenerId {
        if !self.is_connected() {
            warn!("Subscribing to {} on a disconnected client", path);
        }
        self.db
            .subscribe(self.client, path, ListenerKind::ChildRemoved, listener)
    }

    fn off(&self, listener: ListenerId) {
        self.db.listeners.remove(&listener.0);
    }

    fn remove_detached(&self, path: &StorePath) {
        if self.is_connected() {
            self.db.apply(path, None);
        } else {
            warn!("Dropping detached removal of {}: client disconnected", path);
        }
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

fn push_fixed(mut value: u64, width: usize, out: &mut String) {
    let mut chars = vec![PUSH_CHARS[0]; width];
    for slot in chars.iter_mut().rev() {
        *slot = PUSH_CHARS[(value % 64) as usize];
        value /= 64;
    }
    out.extend(chars.into_iter().map(char::from));
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

fn is_server_timestamp(map: &Map<String, Value>) -> bool {
    map.len() == 1 && map.get(".sv").and_then(Value::as_str) == Some(ServerValue::TIMESTAMP)
}

/// Resolves server values and drops null or empty members.
fn normalize(value: Value, now: u64) -> Value {
    match value {
        Value::Object(map) if is_server_timestamp(&map) => Value::from(now),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, normalize(v, now)))
                .filter(|(_, v)| !is_empty(v))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(|v| normalize(v, now)).collect()),
        other => other,
    }
}

fn node_at<'a>(root: &'a Value, path: &StorePath) -> Option<&'a Value> {
    let mut node = root;
    for segment in path.segments() {
        node = node.as_object()?.get(segment)?;
    }
    Some(node)
}

fn children_of(root: &Value, path: &StorePath) -> BTreeMap<String, Value> {
    node_at(root, path)
        .and_then(Value::as_object)
        .map(|map| map.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
        .unwrap_or_default()
}

fn write_at(node: &mut Value, segments: &[&str], value: Value) {
    let Some((first, rest)) = segments.split_first() else {
        *node = value;
        return;
    };

    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    let Value::Object(map) = node else {
        return;
    };

    let child = map.entry(first.to_string()).or_insert(Value::Null);
    write_at(child, rest, value);
    if is_empty(child) {
        map.remove(*first);
    }
}

fn remove_at(node: &mut Value, segments: &[&str]) {
    let Some((first, rest)) = segments.split_first() else {
        *node = Value::Null;
        return;
    };
    let Value::Object(map) = node else {
        return;
    };

    if rest.is_empty() {
        map.remove(*first);
        return;
    }
    if let Some(child) = map.get_mut(*first) {
        remove_at(child, rest);
        if is_empty(child) {
            map.remove(*first);
        }
    }
}
