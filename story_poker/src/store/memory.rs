//! In-memory room store with broadcast subscriptions.

use super::{
    RoomStore, Snapshot, Subscription,
    errors::{StoreError, StoreResult},
    path::{StorePatch, StorePath},
};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::{
    collections::HashMap,
    sync::atomic::{AtomicBool, Ordering},
};
use tokio::sync::{RwLock, broadcast};

/// Default number of snapshots buffered per subscriber
const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// One room document and its change feed
struct RoomEntry {
    document: Option<Value>,
    updates: broadcast::Sender<Snapshot>,
}

impl RoomEntry {
    fn new(capacity: usize) -> Self {
        let (updates, _) = broadcast::channel(capacity);
        Self {
            document: None,
            updates,
        }
    }

    fn publish(&self) {
        // No receivers is fine; nobody is watching this room yet
        let _ = self.updates.send(self.document.clone());
    }

    /// Neither a document nor anyone watching for one
    fn is_vacant(&self) -> bool {
        self.document.is_none() && self.updates.receiver_count() == 0
    }
}

/// Process-local [`RoomStore`].
///
/// Mirrors the upstream semantics the core relies on: `null` deletes,
/// empty objects vanish, every write fans out the full room document.
pub struct MemoryStore {
    rooms: RwLock<HashMap<String, RoomEntry>>,
    online: AtomicBool,
    capacity: usize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a store whose subscribers buffer up to `capacity` snapshots
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            online: AtomicBool::new(true),
            capacity: capacity.max(1),
        }
    }

    /// Simulate losing (or regaining) the transport
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    /// Number of room documents currently present
    pub async fn room_count(&self) -> usize {
        self.rooms
            .read()
            .await
            .values()
            .filter(|entry| entry.document.is_some())
            .count()
    }

    fn ensure_online(&self) -> StoreResult<()> {
        if self.is_online() {
            Ok(())
        } else {
            Err(StoreError::Unavailable("store is offline".to_string()))
        }
    }

    async fn write(&self, path: &StorePath, writes: Vec<(StorePath, Value)>) -> StoreResult<()> {
        self.ensure_online()?;

        let mut rooms = self.rooms.write().await;
        let entry = rooms
            .entry(path.room_id().to_string())
            .or_insert_with(|| RoomEntry::new(self.capacity));

        for (target, value) in writes {
            write_at(&mut entry.document, target.segments(), normalize(value));
        }

        log::debug!("Store write at {}", path);
        entry.publish();

        if entry.is_vacant() {
            rooms.remove(path.room_id());
        }
        Ok(())
    }
}

#[async_trait]
impl RoomStore for MemoryStore {
    async fn get(&self, path: &StorePath) -> StoreResult<Option<Value>> {
        self.ensure_online()?;
        path.validate()?;

        let rooms = self.rooms.read().await;
        Ok(rooms
            .get(path.room_id())
            .and_then(|entry| entry.document.as_ref())
            .and_then(|document| read_at(document, path.segments()))
            .cloned())
    }

    async fn subscribe(&self, room_id: &str) -> StoreResult<Subscription> {
        self.ensure_online()?;
        StorePath::room(room_id).validate()?;

        let mut rooms = self.rooms.write().await;
        // Subscribers that went away leave empty rooms behind
        rooms.retain(|_, entry| !entry.is_vacant());
        let entry = rooms
            .entry(room_id.to_string())
            .or_insert_with(|| RoomEntry::new(self.capacity));

        Ok(Subscription::new(
            room_id,
            entry.document.clone(),
            entry.updates.subscribe(),
        ))
    }

    async fn set(&self, path: &StorePath, value: Value) -> StoreResult<()> {
        path.validate()?;
        self.write(path, vec![(path.clone(), value)]).await
    }

    async fn patch(&self, path: &StorePath, patch: StorePatch) -> StoreResult<()> {
        path.validate()?;
        // Resolve everything up front so an invalid field rejects the whole patch
        let writes = patch.resolve(path)?;
        if writes.is_empty() {
            return Ok(());
        }
        self.write(path, writes).await
    }

    async fn remove(&self, path: &StorePath) -> StoreResult<()> {
        self.set(path, Value::Null).await
    }
}

fn read_at<'a>(document: &'a Value, segments: &[String]) -> Option<&'a Value> {
    segments
        .iter()
        .try_fold(document, |node, segment| node.as_object()?.get(segment))
}

fn write_at(document: &mut Option<Value>, segments: &[String], value: Value) {
    let Some((last, parents)) = segments.split_last() else {
        *document = if value.is_null() { None } else { Some(value) };
        return;
    };

    if value.is_null() {
        if let Some(root) = document.as_mut() {
            remove_at(root, segments);
            if is_empty_object(root) {
                *document = None;
            }
        }
        return;
    }

    let mut node = document.get_or_insert_with(|| Value::Object(Map::new()));
    for segment in parents {
        node = ensure_object(node)
            .entry(segment.clone())
            .or_insert_with(|| Value::Object(Map::new()));
    }
    ensure_object(node).insert(last.clone(), value);
}

fn remove_at(node: &mut Value, segments: &[String]) {
    let Some((first, rest)) = segments.split_first() else {
        return;
    };
    let Value::Object(map) = node else {
        return;
    };

    if rest.is_empty() {
        map.remove(first);
        return;
    }

    if let Some(child) = map.get_mut(first) {
        remove_at(child, rest);
        if is_empty_object(child) {
            map.remove(first);
        }
    }
}

fn ensure_object(node: &mut Value) -> &mut Map<String, Value> {
    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    match node {
        Value::Object(map) => map,
        _ => unreachable!("node was just replaced with an object"),
    }
}

fn is_empty_object(value: &Value) -> bool {
    value.as_object().is_some_and(Map::is_empty)
}

/// Drop nulls and empty objects, which the store never keeps
fn normalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let cleaned: Map<String, Value> = map
                .into_iter()
                .map(|(key, value)| (key, normalize(value)))
                .filter(|(_, value)| !value.is_null())
                .collect();
            if cleaned.is_empty() {
                Value::Null
            } else {
                Value::Object(cleaned)
            }
        }
        other => other,
    }
}
