//! Cache Store Module
//!
//! Main cache engine: size-bounded table with insertion-age eviction,
//! write-through persistence and expiry sweeps.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::cache::codec::{EntryTable, PersistenceCodec};
use crate::cache::{path, AgeIndex, CacheEntry, CacheStats, BYTES_PER_MIB};
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};

// == Store State ==
/// Everything guarded by the table lock.
#[derive(Debug, Default)]
struct StoreState {
    entries: EntryTable,
    index: AgeIndex,
    /// Always equals the sum of `entries[*].size`
    current_size: u64,
    /// Bumped for every snapshot handed to persistence
    generation: u64,
    stats: CacheStats,
}

impl StoreState {
    fn insert(&mut self, key: String, entry: CacheEntry) {
        self.index.insert(&key, entry.created_at);
        self.current_size += entry.size;
        self.entries.insert(key, entry);
    }

    fn remove(&mut self, key: &str) -> Option<CacheEntry> {
        let entry = self.entries.remove(key)?;
        self.index.remove(key, entry.created_at);
        self.current_size -= entry.size;
        Some(entry)
    }

    fn evict_oldest(&mut self) -> Option<(String, u64)> {
        let key = self.index.pop_oldest()?;
        let entry = self.entries.remove(&key)?;
        self.current_size -= entry.size;
        self.stats.record_eviction();
        Some((key, entry.size))
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
        self.current_size = 0;
    }

    /// Replaces the table with `table`, trusting only the payloads.
    ///
    /// Sizes are recomputed from the payloads and the oldest entries are
    /// evicted until the table fits `max_size`. Returns the eviction count.
    fn replace_all(&mut self, table: EntryTable, max_size: u64) -> usize {
        self.clear();
        for (key, mut entry) in table {
            entry.size = entry.val.len() as u64;
            self.insert(key, entry);
        }

        let mut evicted = 0;
        while self.current_size > max_size && self.evict_oldest().is_some() {
            evicted += 1;
        }
        evicted
    }
}

// == Cache Store ==
/// Size-bounded, disk-backed response cache.
///
/// All table state sits behind one mutex; `get`, the mutating half of `add`
/// and expiry sweeps never overlap. Disk writes happen after that lock is
/// released, serialized by a second lock that only ever lets a newer
/// snapshot overwrite an older one.
#[derive(Debug)]
pub struct CacheStore {
    state: Mutex<StoreState>,
    /// Generation of the last snapshot written to disk
    persisted: Mutex<u64>,
    codec: PersistenceCodec,
    file_path: Option<PathBuf>,
    config: CacheConfig,
}

impl CacheStore {
    // == Constructor ==
    /// Creates a store and loads any previously persisted table.
    ///
    /// Failing to create the cache directory leaves the store memory-only;
    /// failing to read an existing file leaves it empty. Both are logged,
    /// neither is returned.
    pub fn new(config: CacheConfig) -> Self {
        let config = config.normalized();
        let file_path = path::cache_file_path(&config);

        let file_path = match create_parent_dir(&file_path) {
            Ok(()) => Some(file_path),
            Err(e) => {
                warn!(
                    "Cache directory creation failed for {}: {}. Continuing with in-memory cache only",
                    file_path.display(),
                    e
                );
                None
            }
        };

        let store = Self {
            state: Mutex::new(StoreState::default()),
            persisted: Mutex::new(0),
            codec: PersistenceCodec::new(config.compression),
            file_path,
            config,
        };

        if store.file_path.is_some() {
            if let Err(e) = store.reload() {
                warn!("Error loading cache, starting empty: {}", e);
            }
        }

        store
    }

    // == Get ==
    /// Returns a copy of the payload stored under `key`.
    ///
    /// Expiry is not checked here; an entry past its TTL stays visible until
    /// the next reaper sweep. Reads never refresh an entry's age.
    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        let mut state = self.lock_state();
        let value = state.entries.get(key).map(|entry| entry.val.clone());
        match value {
            Some(_) => state.stats.record_hit(),
            None => state.stats.record_miss(),
        }
        value
    }

    // == Add ==
    /// Inserts or overwrites `key`, evicting the oldest entries until it fits.
    ///
    /// Rejects values larger than the whole budget with
    /// [`CacheError::ItemTooLarge`] and leaves the table untouched. After a
    /// successful insertion the full table is written to disk; write errors
    /// are logged and do not undo the insertion.
    pub fn add(&self, key: impl Into<String>, value: impl Into<Vec<u8>>) -> Result<()> {
        let key = key.into();
        let value = value.into();
        let size = value.len() as u64;
        let max = self.config.max_size;

        let snapshot = {
            let mut state = self.lock_state();

            if size > max {
                state.stats.record_rejection();
                drop(state);
                warn!(
                    "Item size {} bytes exceeds cache max size {} bytes, not caching {}",
                    size, max, key
                );
                return Err(CacheError::ItemTooLarge { size, max });
            }

            state.remove(&key);

            while state.current_size + size > max {
                match state.evict_oldest() {
                    Some((evicted, freed)) => {
                        debug!("Evicted cache entry {} to free {} bytes", evicted, freed)
                    }
                    None => break,
                }
            }

            state.insert(key, CacheEntry::new(value));

            if self.file_path.is_none() {
                return Ok(());
            }
            state.generation += 1;
            (state.entries.clone(), state.generation)
        };

        self.persist(snapshot);
        Ok(())
    }

    // == Reap ==
    /// Removes entries older than the configured `expire_after`.
    ///
    /// Returns the number of entries removed. The file is not rewritten.
    pub fn reap_expired(&self) -> usize {
        self.reap_expired_at(Utc::now())
    }

    /// Removes entries whose age at `now` exceeds the configured `expire_after`.
    ///
    /// The index is walked oldest first and stops at the first live entry.
    pub fn reap_expired_at(&self, now: DateTime<Utc>) -> usize {
        let expire_after = self.config.expire_after;

        let mut state = self.lock_state();
        let StoreState {
            entries,
            index,
            current_size,
            stats,
            ..
        } = &mut *state;

        let expired = index.drain_while(|key| {
            entries
                .get(key)
                .map_or(true, |entry| entry.is_expired(now, expire_after))
        });
        for key in &expired {
            if let Some(entry) = entries.remove(key) {
                *current_size -= entry.size;
            }
        }
        stats.record_expirations(expired.len());
        expired.len()
    }

    // == Clear Memory ==
    /// Empties the in-memory table without touching the file.
    pub fn clear_memory_cache(&self) {
        self.lock_state().clear();
    }

    // == Delete Cache Dir ==
    /// Clears memory and removes the cache directory with its file.
    ///
    /// Snapshots taken before the delete are marked as already written, so an
    /// `add` still in flight cannot bring the directory back with old entries.
    pub fn delete_cache_dir(&self) -> Result<()> {
        let generation = {
            let mut state = self.lock_state();
            state.clear();
            state.generation
        };

        let Some(dir) = self.file_path.as_deref().and_then(Path::parent) else {
            return Ok(());
        };

        let mut persisted = self.lock_persisted();
        *persisted = (*persisted).max(generation);
        match fs::remove_dir_all(dir) {
            Ok(()) => {
                info!("Removed cache directory {}", dir.display());
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    // == Cache Size ==
    /// Returns the size of the cache file on disk in MiB.
    pub fn cache_size_mib(&self) -> Result<f64> {
        let path = self
            .file_path
            .as_deref()
            .ok_or(CacheError::PersistenceDisabled)?;

        let meta = fs::metadata(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => {
                CacheError::NotFound(format!("cache file {}", path.display()))
            }
            _ => CacheError::Io(e),
        })?;

        Ok(meta.len() as f64 / BYTES_PER_MIB as f64)
    }

    // == Reload ==
    /// Replaces the in-memory table with the contents of the cache file.
    ///
    /// A missing file yields an empty table. On error the current table is kept.
    /// If an `add` lands while the file is being read, the in-memory table is
    /// newer than what was read and is kept as well.
    pub fn reload(&self) -> Result<()> {
        let path = self
            .file_path
            .as_deref()
            .ok_or(CacheError::PersistenceDisabled)?;
        let observed = self.lock_state().generation;
        let table = self.codec.load(path)?;
        self.swap_loaded(path, table, observed);
        Ok(())
    }

    /// Installs a table read from `path` unless the table changed since
    /// generation `observed`. Returns whether the swap happened.
    fn swap_loaded(&self, path: &Path, table: EntryTable, observed: u64) -> bool {
        let loaded = table.len();

        let mut state = self.lock_state();
        if state.generation != observed {
            debug!(
                "Cache table changed while reading {}, keeping in-memory table",
                path.display()
            );
            return false;
        }
        let evicted = state.replace_all(table, self.config.max_size);
        if evicted > 0 {
            info!(
                "Evicted {} loaded entries to fit cache max size {} bytes",
                evicted, self.config.max_size
            );
        }
        debug!(
            "Loaded {} cache entries ({} bytes) from {}",
            loaded - evicted,
            state.current_size,
            path.display()
        );
        true
    }

    // == Accessors ==
    /// Returns the current number of entries.
    pub fn len(&self) -> usize {
        self.lock_state().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock_state().entries.is_empty()
    }

    /// Returns the resident payload size in bytes.
    pub fn current_size(&self) -> u64 {
        self.lock_state().current_size
    }

    pub fn max_size(&self) -> u64 {
        self.config.max_size
    }

    /// Returns the resident keys in sorted order.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.lock_state().entries.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let state = self.lock_state();
        let mut stats = state.stats.clone();
        stats.total_entries = state.entries.len();
        stats.current_size = state.current_size;
        stats.max_size = self.config.max_size;
        stats
    }

    /// Effective configuration after defaults were applied.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Backing file, or `None` when running memory-only.
    pub fn file_path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }

    // == Internals ==
    fn persist(&self, (table, generation): (EntryTable, u64)) {
        let Some(path) = self.file_path.as_deref() else {
            return;
        };

        let mut persisted = self.lock_persisted();
        if *persisted >= generation {
            debug!(
                "Skipping stale cache snapshot {} (already wrote {})",
                generation, *persisted
            );
            return;
        }

        let result = create_parent_dir(path)
            .map_err(CacheError::from)
            .and_then(|()| self.codec.save(path, &table));
        match result {
            Ok(()) => *persisted = generation,
            Err(e) => warn!("Error saving cache to {}: {}", path.display(), e),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_persisted(&self) -> MutexGuard<'_, u64> {
        self.persisted.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn create_parent_dir(file: &Path) -> io::Result<()> {
    match file.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => fs::create_dir_all(dir),
        _ => Ok(()),
    }
}


// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    fn test_config(dir: &Path) -> CacheConfig {
        CacheConfig::default()
            .with_project_name("test")
            .with_cache_path(dir)
    }

    #[test]
    fn test_store_new_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(test_config(dir.path()));

        assert!(store.is_empty());
        assert_eq!(store.len(), 0);
        assert_eq!(store.current_size(), 0);
        assert_eq!(
            store.file_path(),
            Some(dir.path().join("test-cache").join("cache.json").as_path())
        );
        assert!(dir.path().join("test-cache").is_dir());
    }

    #[test]
    fn test_add_and_get() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(test_config(dir.path()));

        store.add("https://example.com", b"testdata".to_vec()).unwrap();

        assert_eq!(store.get("https://example.com"), Some(b"testdata".to_vec()));
        assert_eq!(store.current_size(), 8);
    }

    #[test]
    fn test_get_missing() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(test_config(dir.path()));

        assert_eq!(store.get("https://example.com/nothing"), None);
        assert_eq!(store.stats().misses, 1);
    }

    #[test]
    fn test_overwrite_keeps_size_exact() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(test_config(dir.path()).with_max_size(10));

        store.add("key", b"123456".to_vec()).unwrap();
        store.add("key", b"1234567".to_vec()).unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.current_size(), 7);
        assert_eq!(store.get("key"), Some(b"1234567".to_vec()));
    }

    #[test]
    fn test_overwrite_does_not_evict_itself_needlessly() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(test_config(dir.path()).with_max_size(10));

        store.add("a", b"12345".to_vec()).unwrap();
        store.add("b", b"12345".to_vec()).unwrap();
        // Replacing "b" with an equal-sized payload fits without evicting "a"
        store.add("b", b"67890".to_vec()).unwrap();

        assert_eq!(store.get("a"), Some(b"12345".to_vec()));
        assert_eq!(store.get("b"), Some(b"67890".to_vec()));
        assert_eq!(store.stats().evictions, 0);
    }

    #[test]
    fn test_oversized_item_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(test_config(dir.path()).with_max_size(10));
        store.add("keep", b"123".to_vec()).unwrap();

        let result = store.add("key0", b"123456789012345".to_vec());

        assert!(matches!(
            result,
            Err(CacheError::ItemTooLarge { size: 15, max: 10 })
        ));
        assert_eq!(store.get("key0"), None);
        assert_eq!(store.keys(), vec!["keep".to_string()]);
        assert_eq!(store.current_size(), 3);
        assert_eq!(store.stats().rejections, 1);
    }

    #[test]
    fn test_item_exactly_max_size_fits() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(test_config(dir.path()).with_max_size(10));

        store.add("small", b"1".to_vec()).unwrap();
        store.add("full", b"1234567890".to_vec()).unwrap();

        assert_eq!(store.keys(), vec!["full".to_string()]);
        assert_eq!(store.current_size(), 10);
    }

    #[test]
    fn test_eviction_removes_oldest_first() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(test_config(dir.path()).with_max_size(10));

        store.add("key1", b"123".to_vec()).unwrap();
        thread::sleep(Duration::from_millis(2));
        store.add("key2", b"456".to_vec()).unwrap();
        thread::sleep(Duration::from_millis(2));
        store.add("key3", b"789".to_vec()).unwrap();

        // Reads do not protect key1
        assert!(store.get("key1").is_some());

        store.add("key4", b"0000".to_vec()).unwrap();

        assert_eq!(store.get("key1"), None);
        assert!(store.get("key2").is_some());
        assert!(store.get("key3").is_some());
        assert!(store.get("key4").is_some());
        assert_eq!(store.current_size(), 10);
        assert_eq!(store.stats().evictions, 1);
    }

    #[test]
    fn test_eviction_tie_breaks_by_key() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(test_config(dir.path()).with_max_size(10));

        let created = Utc::now();
        let mut table = EntryTable::new();
        table.insert("b".into(), CacheEntry::with_created_at(b"12345".to_vec(), created));
        table.insert("a".into(), CacheEntry::with_created_at(b"12345".to_vec(), created));
        store.lock_state().replace_all(table, 10);

        store.add("c", b"1".to_vec()).unwrap();

        assert_eq!(store.keys(), vec!["b".to_string(), "c".to_string()]);
    }

    #[test]
    fn test_reap_expired_at() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(
            test_config(dir.path()).with_expire_after(Duration::from_secs(60)),
        );

        store.add("key1", b"12345".to_vec()).unwrap();
        store.add("key2", b"678".to_vec()).unwrap();

        assert_eq!(store.reap_expired_at(Utc::now()), 0);
        assert_eq!(store.len(), 2);

        let later = Utc::now() + chrono::Duration::seconds(61);
        assert_eq!(store.reap_expired_at(later), 2);
        assert!(store.is_empty());
        assert_eq!(store.current_size(), 0);
        assert_eq!(store.stats().expirations, 2);
    }

    #[test]
    fn test_reap_expiry_boundary_is_strict() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(
            test_config(dir.path()).with_expire_after(Duration::from_secs(60)),
        );

        let created = Utc::now();
        let mut table = EntryTable::new();
        table.insert("k".into(), CacheEntry::with_created_at(b"123".to_vec(), created));
        store.lock_state().replace_all(table, store.max_size());

        // Exactly expire_after old is still live
        assert_eq!(store.reap_expired_at(created + chrono::Duration::seconds(59)), 0);
        assert_eq!(store.reap_expired_at(created + chrono::Duration::seconds(60)), 0);
        assert_eq!(store.len(), 1);

        assert_eq!(store.reap_expired_at(created + chrono::Duration::seconds(61)), 1);
        assert!(store.is_empty());
    }

    #[test]
    fn test_reap_stops_at_entry_created_in_future() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(
            test_config(dir.path()).with_expire_after(Duration::from_secs(60)),
        );

        let now = Utc::now();
        let mut table = EntryTable::new();
        table.insert(
            "old".into(),
            CacheEntry::with_created_at(b"1".to_vec(), now - chrono::Duration::seconds(120)),
        );
        table.insert(
            "skewed".into(),
            CacheEntry::with_created_at(b"2".to_vec(), now + chrono::Duration::seconds(30)),
        );
        store.lock_state().replace_all(table, store.max_size());

        assert_eq!(store.reap_expired_at(now), 1);
        assert_eq!(store.keys(), vec!["skewed".to_string()]);
        assert_eq!(store.current_size(), 1);
    }

    #[test]
    fn test_reap_keeps_fresh_entries() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(
            test_config(dir.path()).with_expire_after(Duration::from_millis(20)),
        );

        store.add("old", b"12345".to_vec()).unwrap();
        thread::sleep(Duration::from_millis(40));
        store.add("new", b"678".to_vec()).unwrap();

        assert_eq!(store.reap_expired(), 1);
        assert_eq!(store.keys(), vec!["new".to_string()]);
        assert_eq!(store.current_size(), 3);
    }

    #[test]
    fn test_clear_memory_keeps_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(test_config(dir.path()));

        store.add("key1", b"12345".to_vec()).unwrap();
        store.clear_memory_cache();

        assert!(store.is_empty());
        assert_eq!(store.current_size(), 0);
        assert!(store.file_path().unwrap().exists());

        store.reload().unwrap();
        assert_eq!(store.get("key1"), Some(b"12345".to_vec()));
    }

    #[test]
    fn test_delete_cache_dir() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(test_config(dir.path()));

        store.add("key1", b"12345".to_vec()).unwrap();
        store.delete_cache_dir().unwrap();

        assert!(store.is_empty());
        assert!(!dir.path().join("test-cache").exists());

        // Deleting twice is fine, and later inserts recreate the directory
        store.delete_cache_dir().unwrap();
        store.add("key2", b"1".to_vec()).unwrap();
        assert!(store.file_path().unwrap().exists());
    }

    #[test]
    fn test_delete_cache_dir_discards_in_flight_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let store = CacheStore::new(config.clone());
        store.add("old", b"12345".to_vec()).unwrap();

        // First half of an add: table mutated and snapshot taken, not yet written
        let snapshot = {
            let mut state = store.lock_state();
            state.insert("k".to_string(), CacheEntry::new(b"v".to_vec()));
            state.generation += 1;
            (state.entries.clone(), state.generation)
        };

        store.delete_cache_dir().unwrap();
        store.persist(snapshot);

        assert!(store.is_empty());
        assert!(!store.file_path().unwrap().exists());

        let reopened = CacheStore::new(config);
        assert!(reopened.is_empty());
    }

    #[test]
    fn test_add_after_delete_cache_dir_is_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let store = CacheStore::new(config.clone());

        store.add("old", b"12345".to_vec()).unwrap();
        store.delete_cache_dir().unwrap();
        store.add("new", b"678".to_vec()).unwrap();

        let reopened = CacheStore::new(config);
        assert_eq!(reopened.keys(), vec!["new".to_string()]);
    }

    #[test]
    fn test_cache_size_mib() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(test_config(dir.path()));

        assert!(matches!(store.cache_size_mib(), Err(CacheError::NotFound(_))));

        store.add("key1", vec![b'x'; 4096]).unwrap();
        let on_disk = fs::metadata(store.file_path().unwrap()).unwrap().len();
        let size = store.cache_size_mib().unwrap();

        assert!(size > 0.0);
        assert!((size - on_disk as f64 / BYTES_PER_MIB as f64).abs() < f64::EPSILON);
    }

    #[test]
    fn test_write_through_persists() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(test_config(dir.path()));

        store.add("key1", b"12345".to_vec()).unwrap();

        let table = PersistenceCodec::new(false)
            .load(store.file_path().unwrap())
            .unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table["key1"].val, b"12345");
        assert_eq!(table["key1"].size, 5);
    }

    #[test]
    fn test_load_recomputes_sizes() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let file = path::cache_file_path(&config);
        fs::create_dir_all(file.parent().unwrap()).unwrap();

        let mut entry = CacheEntry::new(b"12345".to_vec());
        entry.size = 999;
        let mut table = EntryTable::new();
        table.insert("key1".into(), entry);
        PersistenceCodec::new(false).save(&file, &table).unwrap();

        let store = CacheStore::new(config);
        assert_eq!(store.current_size(), 5);
    }

    #[test]
    fn test_load_shrinks_to_lower_budget() {
        let dir = tempfile::tempdir().unwrap();
        let first = CacheStore::new(test_config(dir.path()).with_max_size(100));
        first.add("key1", b"12345".to_vec()).unwrap();
        thread::sleep(Duration::from_millis(2));
        first.add("key2", b"67890".to_vec()).unwrap();

        let second = CacheStore::new(test_config(dir.path()).with_max_size(6));

        assert_eq!(second.keys(), vec!["key2".to_string()]);
        assert_eq!(second.current_size(), 5);
    }

    #[test]
    fn test_corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let file = path::cache_file_path(&config);
        fs::create_dir_all(file.parent().unwrap()).unwrap();
        fs::write(&file, b"garbage").unwrap();

        let store = CacheStore::new(config);

        assert!(store.is_empty());
        assert!(store.reload().is_err());
        // Still fully usable, and the next insert repairs the file
        store.add("key1", b"1".to_vec()).unwrap();
        assert!(store.reload().is_ok());
        assert_eq!(store.get("key1"), Some(b"1".to_vec()));
    }

    #[test]
    fn test_memory_only_when_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"not a directory").unwrap();

        let store = CacheStore::new(test_config(&blocker));

        assert!(store.file_path().is_none());
        store.add("key1", b"12345".to_vec()).unwrap();
        assert_eq!(store.get("key1"), Some(b"12345".to_vec()));
        assert!(matches!(
            store.cache_size_mib(),
            Err(CacheError::PersistenceDisabled)
        ));
        assert!(matches!(store.reload(), Err(CacheError::PersistenceDisabled)));
        store.delete_cache_dir().unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_reload_keeps_add_made_during_read() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(test_config(dir.path()));
        store.add("key1", b"12345".to_vec()).unwrap();

        let path = store.file_path().unwrap().to_path_buf();
        let observed = store.lock_state().generation;
        let table = store.codec.load(&path).unwrap();

        store.add("key2", b"678".to_vec()).unwrap();

        assert!(!store.swap_loaded(&path, table, observed));
        assert_eq!(store.get("key2"), Some(b"678".to_vec()));
        assert_eq!(store.current_size(), 8);
    }

    #[test]
    fn test_reload_swaps_when_table_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(test_config(dir.path()));
        store.add("key1", b"12345".to_vec()).unwrap();

        let path = store.file_path().unwrap().to_path_buf();
        let observed = store.lock_state().generation;
        let table = store.codec.load(&path).unwrap();
        store.clear_memory_cache();

        assert!(store.swap_loaded(&path, table, observed));
        assert_eq!(store.get("key1"), Some(b"12345".to_vec()));
    }

    #[test]
    fn test_stale_snapshot_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(test_config(dir.path()));

        store.add("key1", b"1".to_vec()).unwrap();
        store.persist((EntryTable::new(), 0));

        let table = PersistenceCodec::new(false)
            .load(store.file_path().unwrap())
            .unwrap();
        assert!(table.contains_key("key1"));
    }

    #[test]
    fn test_concurrent_adds_keep_size_consistent() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(CacheStore::new(test_config(dir.path()).with_max_size(64)));

        let handles: Vec<_> = (0..4)
            .map(|t| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for i in 0..25 {
                        let payload = vec![b'a'; (i % 7) + 1];
                        store.add(format!("https://example.com/{t}/{i}"), payload).unwrap();
                        let _ = store.get(&format!("https://example.com/{t}/{}", i / 2));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let resident: u64 = store
            .keys()
            .iter()
            .filter_map(|k| store.get(k))
            .map(|v| v.len() as u64)
            .sum();
        assert_eq!(store.current_size(), resident);
        assert!(store.current_size() <= 64);

        // The file holds the newest snapshot
        store.clear_memory_cache();
        store.reload().unwrap();
        assert_eq!(store.current_size(), resident);
    }
}
