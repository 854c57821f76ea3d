//! Key-value backed state cells.
//!
//! A [`Storage`] wraps one [`KeyValueStore`] backend and hands out
//! [`StorageHandle`]s. Each handle behaves like an independent browser tab:
//! writes made through it are announced to every *other* handle, never to
//! itself. Writes made by other processes sharing a [`FileStore`] directory
//! are noticed by a filesystem watcher and delivered by
//! [`Storage::poll_external`].
//!
//! [`Persisted`] is the state cell built on a handle: it loads a JSON value
//! on creation, writes on every change, and adopts newer values announced for
//! its key on [`Persisted::sync`].

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use shared::events::StorageEvent;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, warn};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Raw string storage, the equivalent of `localStorage`.
pub trait KeyValueStore: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove_item(&self, key: &str) -> Result<(), StoreError>;

    /// Changes made behind this process's back since the last call.
    fn poll_changes(&self) -> Result<Vec<StorageEvent>, StoreError> {
        Ok(Vec::new())
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.items.lock().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.items.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StoreError> {
        self.items.lock().remove(key);
        Ok(())
    }
}

/// One JSON file per key inside a directory.
///
/// A filesystem watcher records which keys changed on disk; `poll_changes`
/// re-reads only those and compares them against the last values seen. When
/// no watcher could be started, or the watcher lost track, the whole
/// directory is rescanned instead.
pub struct FileStore {
    dir: PathBuf,
    /// Contents as of our last write or poll, used to spot foreign writes.
    snapshot: Mutex<HashMap<String, String>>,
    pending: Arc<Mutex<PendingChanges>>,
    /// Kept alive for its callback; never touched after opening.
    watcher: Option<Mutex<RecommendedWatcher>>,
}

#[derive(Debug, Default)]
struct PendingChanges {
    keys: HashSet<String>,
    rescan: bool,
}

impl FileStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        Self::open_with(dir.into(), true)
    }

    fn open_with(dir: PathBuf, watch: bool) -> Result<Self, StoreError> {
        fs::create_dir_all(&dir)?;
        let snapshot = read_all(&dir)?;
        let pending = Arc::new(Mutex::new(PendingChanges::default()));
        let watcher = if watch {
            match watch_dir(&dir, Arc::clone(&pending)) {
                Ok(watcher) => Some(Mutex::new(watcher)),
                Err(e) => {
                    warn!(dir = %dir.display(), "storage watcher unavailable, rescanning instead: {}", e);
                    None
                }
            }
        } else {
            None
        };
        debug!(dir = %dir.display(), keys = snapshot.len(), watched = watcher.is_some(), "opened file store");
        Ok(Self {
            dir,
            snapshot: Mutex::new(snapshot),
            pending,
            watcher,
        })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", encode_key(key)))
    }

    /// Keys the watcher flagged since the last poll, or `None` when the
    /// directory has to be rescanned.
    fn take_pending(&self) -> Option<HashSet<String>> {
        self.watcher.as_ref()?;
        let mut pending = self.pending.lock();
        if std::mem::take(&mut pending.rescan) {
            pending.keys.clear();
            return None;
        }
        Some(std::mem::take(&mut pending.keys))
    }

    fn rescan(&self) -> Result<Vec<StorageEvent>, StoreError> {
        let current = read_all(&self.dir)?;
        let mut snapshot = self.snapshot.lock();
        let mut events = Vec::new();

        for (key, value) in &current {
            if snapshot.get(key) != Some(value) {
                events.push(StorageEvent::written(key.clone(), value.clone()));
            }
        }
        for key in snapshot.keys() {
            if !current.contains_key(key) {
                events.push(StorageEvent::removed(key.clone()));
            }
        }

        *snapshot = current;
        Ok(events)
    }
}

fn watch_dir(dir: &Path, pending: Arc<Mutex<PendingChanges>>) -> notify::Result<RecommendedWatcher> {
    let mut watcher = RecommendedWatcher::new(
        move |result: notify::Result<Event>| {
            let mut pending = pending.lock();
            match result {
                Ok(event) => {
                    if !matches!(
                        event.kind,
                        EventKind::Any | EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
                    ) {
                        return;
                    }
                    if event.need_rescan() || event.paths.is_empty() {
                        pending.rescan = true;
                    }
                    pending
                        .keys
                        .extend(event.paths.iter().filter_map(|path| key_for_path(path)));
                }
                Err(e) => {
                    warn!("storage watcher error: {}", e);
                    pending.rescan = true;
                }
            }
        },
        notify::Config::default(),
    )?;
    watcher.watch(dir, RecursiveMode::NonRecursive)?;
    Ok(watcher)
}

impl KeyValueStore for FileStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        self.snapshot
            .lock()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        self.snapshot.lock().remove(key);
        Ok(())
    }

    fn poll_changes(&self) -> Result<Vec<StorageEvent>, StoreError> {
        let Some(keys) = self.take_pending() else {
            return self.rescan();
        };

        let mut events = Vec::new();
        for key in keys {
            let current = self.get_item(&key)?;
            let mut snapshot = self.snapshot.lock();
            match current {
                Some(value) => {
                    if snapshot.get(&key) != Some(&value) {
                        snapshot.insert(key.clone(), value.clone());
                        events.push(StorageEvent::written(key, value));
                    }
                }
                None => {
                    if snapshot.remove(&key).is_some() {
                        events.push(StorageEvent::removed(key));
                    }
                }
            }
        }
        Ok(events)
    }
}

fn read_all(dir: &Path) -> Result<HashMap<String, String>, StoreError> {
    let mut items = HashMap::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let Some(key) = key_for_path(&path) else {
            continue;
        };
        match fs::read_to_string(&path) {
            Ok(text) => {
                items.insert(key, text);
            }
            // Removed between listing and reading.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(items)
}

/// The key stored at `path`, if it is one of our `<key>.json` files.
fn key_for_path(path: &Path) -> Option<String> {
    if path.extension().and_then(|e| e.to_str()) != Some("json") {
        return None;
    }
    path.file_stem()
        .and_then(|s| s.to_str())
        .and_then(decode_key)
}

/// Percent-encode a key so any name is a safe file name.
fn encode_key(key: &str) -> String {
    urlencoding::encode(key).into_owned()
}

fn decode_key(encoded: &str) -> Option<String> {
    urlencoding::decode(encoded).ok().map(|key| key.into_owned())
}

struct Subscriber {
    id: u64,
    tx: Sender<StorageEvent>,
}

/// Shared hub around one backend.
pub struct Storage {
    backend: Box<dyn KeyValueStore>,
    subscribers: Mutex<Vec<Subscriber>>,
    next_id: AtomicU64,
}

impl Storage {
    pub fn new(backend: impl KeyValueStore + 'static) -> Arc<Self> {
        Arc::new(Self {
            backend: Box::new(backend),
            subscribers: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        })
    }

    pub fn in_memory() -> Arc<Self> {
        Self::new(MemoryStore::new())
    }

    /// A new independent view with its own change feed.
    pub fn handle(self: &Arc<Self>) -> StorageHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = channel();
        self.subscribers.lock().push(Subscriber { id, tx });
        StorageHandle {
            id,
            storage: Arc::clone(self),
            rx,
        }
    }

    /// Forward writes made by other processes to every handle.
    /// Returns the number of changed keys.
    pub fn poll_external(&self) -> usize {
        match self.backend.poll_changes() {
            Ok(events) => {
                let count = events.len();
                for event in events {
                    debug!(key = %event.key, "external storage change");
                    self.broadcast(None, event);
                }
                count
            }
            Err(e) => {
                warn!("failed to poll storage for external changes: {}", e);
                0
            }
        }
    }

    fn broadcast(&self, origin: Option<u64>, event: StorageEvent) {
        // Dropped handles fail to receive and are pruned here.
        self.subscribers.lock().retain(|sub| {
            if Some(sub.id) == origin {
                return true;
            }
            sub.tx.send(event.clone()).is_ok()
        });
    }
}

/// One tab's view of a [`Storage`].
pub struct StorageHandle {
    id: u64,
    storage: Arc<Storage>,
    rx: Receiver<StorageEvent>,
}

impl StorageHandle {
    pub fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.storage.backend.get_item(key)
    }

    pub fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.storage.backend.set_item(key, value)?;
        self.storage
            .broadcast(Some(self.id), StorageEvent::written(key, value));
        Ok(())
    }

    pub fn remove_item(&self, key: &str) -> Result<(), StoreError> {
        self.storage.backend.remove_item(key)?;
        self.storage
            .broadcast(Some(self.id), StorageEvent::removed(key));
        Ok(())
    }

    /// Next pending change announced by someone else, if any.
    pub fn try_next_event(&self) -> Option<StorageEvent> {
        self.rx.try_recv().ok()
    }
}

/// A JSON value kept in sync with one storage key.
pub struct Persisted<T> {
    handle: StorageHandle,
    key: String,
    value: T,
}

impl<T> Persisted<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Read `key`, falling back to `initial` when it is absent or unreadable.
    pub fn load(handle: StorageHandle, key: impl Into<String>, initial: T) -> Self {
        let key = key.into();
        let value = read_value(&handle, &key).unwrap_or(initial);
        Self { handle, key, value }
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Replace the value and persist it. A failed write is logged; the
    /// in-memory value changes regardless.
    pub fn set(&mut self, value: T) {
        self.value = value;
        self.persist();
    }

    /// Derive the next value from the current one, then persist it.
    pub fn update(&mut self, f: impl FnOnce(&T) -> T) {
        let next = f(&self.value);
        self.set(next);
    }

    /// Adopt values other handles wrote to this key. Returns true if the
    /// value changed. Removals are ignored.
    pub fn sync(&mut self) -> bool {
        let mut changed = false;
        while let Some(event) = self.handle.try_next_event() {
            if event.key != self.key {
                continue;
            }
            let Some(raw) = event.new_value else {
                continue;
            };
            match serde_json::from_str::<T>(&raw) {
                Ok(value) => {
                    self.value = value;
                    changed = true;
                }
                Err(e) => error!(key = %self.key, "ignoring unparsable storage update: {}", e),
            }
        }
        changed
    }

    /// Point the cell at a different key and load it.
    pub fn rekey(&mut self, key: impl Into<String>, initial: T) {
        self.key = key.into();
        self.value = read_value(&self.handle, &self.key).unwrap_or(initial);
    }

    pub fn handle(&self) -> &StorageHandle {
        &self.handle
    }

    fn persist(&self) {
        let result = serde_json::to_string(&self.value)
            .map_err(StoreError::from)
            .and_then(|text| self.handle.set_item(&self.key, &text));
        if let Err(e) = result {
            error!(key = %self.key, "failed to persist value: {}", e);
        }
    }
}

fn read_value<T: DeserializeOwned>(handle: &StorageHandle, key: &str) -> Option<T> {
    match handle.get_item(key) {
        Ok(Some(text)) => match serde_json::from_str(&text) {
            Ok(value) => Some(value),
            Err(e) => {
                error!(key, "stored value is not valid JSON for this type: {}", e);
                None
            }
        },
        Ok(None) => None,
        Err(e) => {
            error!(key, "failed to read storage: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_key_encoding_round_trips_odd_names() {
        for key in ["chatHistory_Asha", "chatHistory_Dr. Ray/Jo", "chatHistory_अनु"] {
            let encoded = encode_key(key);
            assert!(!encoded.contains('/'));
            assert!(encoded.is_ascii());
            assert_eq!(decode_key(&encoded).as_deref(), Some(key));
        }
        assert_eq!(encode_key("chatHistory_Asha"), "chatHistory_Asha");
        // Not UTF-8 once decoded.
        assert_eq!(decode_key("bad%FF"), None);
    }

    #[test]
    fn test_key_for_path_skips_temp_files() {
        assert_eq!(
            key_for_path(Path::new("/data/chatHistory_Asha%20R.json")).as_deref(),
            Some("chatHistory_Asha R")
        );
        assert_eq!(key_for_path(Path::new("/data/moodEntries.json.tmp")), None);
        assert_eq!(key_for_path(Path::new("/data/notes.txt")), None);
    }

    #[test]
    fn test_persisted_load_falls_back_to_initial() {
        let storage = Storage::in_memory();
        let cell: Persisted<Vec<u32>> = Persisted::load(storage.handle(), "numbers", vec![7]);
        assert_eq!(cell.get(), &vec![7]);

        let writer = storage.handle();
        writer.set_item("broken", "{not json").unwrap();
        let cell: Persisted<Vec<u32>> = Persisted::load(storage.handle(), "broken", Vec::new());
        assert!(cell.get().is_empty());
    }

    #[test]
    fn test_set_persists_and_update_uses_latest_value() {
        let storage = Storage::in_memory();
        let mut cell: Persisted<Vec<u32>> = Persisted::load(storage.handle(), "numbers", Vec::new());
        cell.set(vec![1]);
        cell.update(|v| {
            let mut next = v.clone();
            next.push(2);
            next
        });
        cell.update(|v| {
            let mut next = v.clone();
            next.push(3);
            next
        });
        assert_eq!(cell.get(), &vec![1, 2, 3]);

        let reread: Persisted<Vec<u32>> = Persisted::load(storage.handle(), "numbers", Vec::new());
        assert_eq!(reread.get(), &vec![1, 2, 3]);
    }

    #[test]
    fn test_sync_between_handles() {
        let storage = Storage::in_memory();
        let mut tab_a: Persisted<String> = Persisted::load(storage.handle(), "userLanguage", "English".into());
        let mut tab_b: Persisted<String> = Persisted::load(storage.handle(), "userLanguage", "English".into());
        let mut other_key: Persisted<String> = Persisted::load(storage.handle(), "other", "x".into());

        tab_a.set("Hindi".into());
        // A tab never hears its own write.
        assert!(!tab_a.sync());
        assert!(tab_b.sync());
        assert_eq!(tab_b.get(), "Hindi");
        assert!(!other_key.sync());
        assert_eq!(other_key.get(), "x");
    }

    #[test]
    fn test_sync_ignores_removals_and_garbage() {
        let storage = Storage::in_memory();
        let mut cell: Persisted<Vec<u32>> = Persisted::load(storage.handle(), "numbers", vec![1]);
        let other = storage.handle();

        other.remove_item("numbers").unwrap();
        other.set_item("numbers", "not json").unwrap();
        assert!(!cell.sync());
        assert_eq!(cell.get(), &vec![1]);
    }

    #[test]
    fn test_rekey_loads_new_key() {
        let storage = Storage::in_memory();
        let other = storage.handle();
        other.set_item("chatHistory_B", "[4,5]").unwrap();

        let mut cell: Persisted<Vec<u32>> = Persisted::load(storage.handle(), "chatHistory_A", Vec::new());
        cell.rekey("chatHistory_B", Vec::new());
        assert_eq!(cell.key(), "chatHistory_B");
        assert_eq!(cell.get(), &vec![4, 5]);
    }

    #[test]
    fn test_file_store_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::open(temp_dir.path()).unwrap();

        assert_eq!(store.get_item("userProfile").unwrap(), None);
        store.set_item("userProfile", r#"{"name":"Asha"}"#).unwrap();
        assert_eq!(
            store.get_item("userProfile").unwrap().as_deref(),
            Some(r#"{"name":"Asha"}"#)
        );
        store.remove_item("userProfile").unwrap();
        store.remove_item("userProfile").unwrap();
        assert_eq!(store.get_item("userProfile").unwrap(), None);
    }

    /// Poll until at least `want` events arrived or a few seconds passed.
    fn poll_until(store: &FileStore, want: usize) -> Vec<StorageEvent> {
        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(5);
        let mut events = Vec::new();
        while events.len() < want && std::time::Instant::now() < deadline {
            events.extend(store.poll_changes().unwrap());
            std::thread::sleep(std::time::Duration::from_millis(20));
        }
        events.sort_by(|a, b| a.key.cmp(&b.key));
        events
    }

    #[test]
    fn test_file_store_reports_foreign_writes_only() {
        let temp_dir = TempDir::new().unwrap();
        let ours = FileStore::open(temp_dir.path()).unwrap();
        let theirs = FileStore::open(temp_dir.path()).unwrap();

        ours.set_item("moodEntries", "[]").unwrap();
        std::thread::sleep(std::time::Duration::from_millis(100));
        assert!(ours.poll_changes().unwrap().is_empty());

        theirs.set_item("moodEntries", r#"[{"date":"2024-05-01","mood":"Calm"}]"#).unwrap();
        theirs.set_item("journalEntries", "[]").unwrap();
        let events = poll_until(&ours, 2);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].key, "journalEntries");
        assert_eq!(events[1].key, "moodEntries");

        theirs.remove_item("journalEntries").unwrap();
        let events = poll_until(&ours, 1);
        assert_eq!(events, vec![StorageEvent::removed("journalEntries")]);
    }

    #[test]
    fn test_unwatched_file_store_rescans() {
        let temp_dir = TempDir::new().unwrap();
        let ours = FileStore::open_with(temp_dir.path().to_path_buf(), false).unwrap();
        assert!(ours.watcher.is_none());
        let theirs = FileStore::open_with(temp_dir.path().to_path_buf(), false).unwrap();

        theirs.set_item("userLanguage", "\"Hindi\"").unwrap();
        assert_eq!(
            ours.poll_changes().unwrap(),
            vec![StorageEvent::written("userLanguage", "\"Hindi\"")]
        );
        assert!(ours.poll_changes().unwrap().is_empty());

        theirs.remove_item("userLanguage").unwrap();
        assert_eq!(
            ours.poll_changes().unwrap(),
            vec![StorageEvent::removed("userLanguage")]
        );
    }

    #[test]
    fn test_watcher_rescan_flag_forces_full_scan() {
        let temp_dir = TempDir::new().unwrap();
        let ours = FileStore::open(temp_dir.path()).unwrap();
        if ours.watcher.is_none() {
            return;
        }
        fs::write(temp_dir.path().join("moodEntries.json"), "[]").unwrap();
        {
            let mut pending = ours.pending.lock();
            pending.rescan = true;
        }
        assert_eq!(ours.take_pending(), None);
        assert_eq!(
            ours.rescan().unwrap(),
            vec![StorageEvent::written("moodEntries", "[]")]
        );
    }

    #[test]
    fn test_poll_external_reaches_persisted_cells() {
        let temp_dir = TempDir::new().unwrap();
        let storage = Storage::new(FileStore::open(temp_dir.path()).unwrap());
        let mut cell: Persisted<String> = Persisted::load(storage.handle(), "userLanguage", "English".into());

        let other_process = FileStore::open(temp_dir.path()).unwrap();
        other_process.set_item("userLanguage", "\"Tamil\"").unwrap();

        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(5);
        while storage.poll_external() == 0 && std::time::Instant::now() < deadline {
            std::thread::sleep(std::time::Duration::from_millis(20));
        }
        assert!(cell.sync());
        assert_eq!(cell.get(), "Tamil");
    }
}
