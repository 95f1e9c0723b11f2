//! Two-tier summary cache.
//!
//! An optional external store (sled on disk) is consulted first, then the
//! in-process map. Entries expire after a TTL and are evicted by the read
//! that finds them stale. Store failures never fail a request: lookups
//! degrade to a miss and writes hand their error back for the caller to log.

use crate::model::{CacheTier, Mode, SummaryResult};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use thiserror::Error;
use time::OffsetDateTime;

pub const DEFAULT_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);
/// The memory tier drops every expired entry once per this many writes.
pub const SWEEP_EVERY: usize = 64;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("cache store error: {0}")]
    Store(#[from] sled::Error),
    #[error("cache encoding error: {0}")]
    Encoding(#[from] bincode::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(identity: &str, mode: Mode) -> Self {
        Self(format!("{}:{}", identity, mode.as_str()))
    }

    /// Key for a summary built from `sentences` picks. The mode's default
    /// count shares the plain `identity:mode` slot; any other count gets its own.
    pub fn with_sentences(identity: &str, mode: Mode, sentences: Option<usize>) -> Self {
        match sentences {
            Some(n) if n != mode.default_sentences() => Self(format!("{}:{}:{}", identity, mode.as_str(), n)),
            _ => Self::new(identity, mode),
        }
    }

    pub fn as_str(&self) -> &str { &self.0 }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub result: SummaryResult,
    /// Unix seconds, UTC.
    pub created_at: i64,
}

impl CacheEntry {
    pub fn new(result: SummaryResult, now: OffsetDateTime) -> Self {
        Self { result, created_at: now.unix_timestamp() }
    }

    pub fn is_fresh(&self, now: OffsetDateTime, ttl: Duration) -> bool {
        let age = now.unix_timestamp() - self.created_at;
        age < ttl.as_secs() as i64
    }
}

/// Backing store for one cache tier.
pub trait CacheStore: Send + Sync {
    fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>, CacheError>;
    fn set(&self, key: &CacheKey, entry: CacheEntry) -> Result<(), CacheError>;
    fn remove(&self, key: &CacheKey) -> Result<(), CacheError>;
}

#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self { Self::default() }

    pub fn len(&self) -> usize { self.entries.read().len() }

    pub fn is_empty(&self) -> bool { self.entries.read().is_empty() }

    /// Drop every entry older than `ttl`, returning how many went.
    pub fn purge_expired(&self, now: OffsetDateTime, ttl: Duration) -> usize {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, entry| entry.is_fresh(now, ttl));
        before - entries.len()
    }
}

impl CacheStore for MemoryStore {
    fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>, CacheError> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn set(&self, key: &CacheKey, entry: CacheEntry) -> Result<(), CacheError> {
        self.entries.write().insert(key.clone(), entry);
        Ok(())
    }

    fn remove(&self, key: &CacheKey) -> Result<(), CacheError> {
        self.entries.write().remove(key);
        Ok(())
    }
}

/// External tier persisted with sled, values bincode-encoded.
pub struct SledStore {
    db: sled::Db,
}

impl SledStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, CacheError> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }
}

impl CacheStore for SledStore {
    fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>, CacheError> {
        match self.db.get(key.as_str().as_bytes())? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    fn set(&self, key: &CacheKey, entry: CacheEntry) -> Result<(), CacheError> {
        let bytes = bincode::serialize(&entry)?;
        self.db.insert(key.as_str().as_bytes(), bytes)?;
        self.db.flush()?;
        Ok(())
    }

    fn remove(&self, key: &CacheKey) -> Result<(), CacheError> {
        self.db.remove(key.as_str().as_bytes())?;
        Ok(())
    }
}

pub struct SummaryCache {
    external: Option<Box<dyn CacheStore>>,
    memory: MemoryStore,
    ttl: Duration,
    writes: AtomicUsize,
}

impl SummaryCache {
    pub fn in_memory(ttl: Duration) -> Self {
        Self { external: None, memory: MemoryStore::new(), ttl, writes: AtomicUsize::new(0) }
    }

    pub fn with_external(external: Box<dyn CacheStore>, ttl: Duration) -> Self {
        Self { external: Some(external), memory: MemoryStore::new(), ttl, writes: AtomicUsize::new(0) }
    }

    pub fn ttl(&self) -> Duration { self.ttl }

    pub fn has_external(&self) -> bool { self.external.is_some() }

    pub fn lookup(&self, key: &CacheKey) -> Option<(SummaryResult, CacheTier)> {
        self.lookup_at(key, OffsetDateTime::now_utc())
    }

    pub fn lookup_at(&self, key: &CacheKey, now: OffsetDateTime) -> Option<(SummaryResult, CacheTier)> {
        self.find(key, now).map(|(entry, tier)| (entry.result, tier))
    }

    /// Entry metadata regardless of tier, for inspection.
    pub fn entry(&self, key: &CacheKey) -> Option<(CacheEntry, CacheTier)> {
        self.find(key, OffsetDateTime::now_utc())
    }

    pub fn store(&self, key: &CacheKey, result: SummaryResult) -> Result<(), CacheError> {
        self.store_at(key, result, OffsetDateTime::now_utc())
    }

    /// Writes the memory tier unconditionally and reports only external failures.
    pub fn store_at(&self, key: &CacheKey, result: SummaryResult, now: OffsetDateTime) -> Result<(), CacheError> {
        let entry = CacheEntry::new(result, now);
        self.memory.set(key, entry.clone())?;
        if (self.writes.fetch_add(1, Ordering::Relaxed) + 1) % SWEEP_EVERY == 0 {
            let purged = self.memory.purge_expired(now, self.ttl);
            if purged > 0 {
                tracing::debug!(purged, "swept expired memory cache entries");
            }
        }
        match &self.external {
            Some(external) => external.set(key, entry),
            None => Ok(()),
        }
    }

    fn find(&self, key: &CacheKey, now: OffsetDateTime) -> Option<(CacheEntry, CacheTier)> {
        if let Some(external) = &self.external {
            if let Some(entry) = self.fresh_entry(external.as_ref(), key, now, CacheTier::External) {
                return Some((entry, CacheTier::External));
            }
        }
        self.fresh_entry(&self.memory, key, now, CacheTier::Memory).map(|e| (e, CacheTier::Memory))
    }

    fn fresh_entry(&self, store: &dyn CacheStore, key: &CacheKey, now: OffsetDateTime, tier: CacheTier) -> Option<CacheEntry> {
        match store.get(key) {
            Ok(Some(entry)) if entry.is_fresh(now, self.ttl) => Some(entry),
            Ok(Some(_)) => {
                tracing::debug!(key = key.as_str(), tier = tier.as_str(), "evicting expired cache entry");
                if let Err(e) = store.remove(key) {
                    tracing::warn!(key = key.as_str(), tier = tier.as_str(), error = %e, "failed to evict cache entry");
                }
                None
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(key = key.as_str(), tier = tier.as_str(), error = %e, "cache read failed, treating as miss");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Confidence;

    fn result(tldr: &str) -> SummaryResult {
        SummaryResult {
            tldr: tldr.into(),
            bullets: vec![tldr.into()],
            tags: vec![],
            reading_time_minutes: 1,
            confidence: Confidence::Medium,
            mode_used: Mode::Quick,
        }
    }

    struct BrokenStore;

    impl CacheStore for BrokenStore {
        fn get(&self, _: &CacheKey) -> Result<Option<CacheEntry>, CacheError> {
            Err(CacheError::Store(sled::Error::Unsupported("offline".into())))
        }
        fn set(&self, _: &CacheKey, _: CacheEntry) -> Result<(), CacheError> {
            Err(CacheError::Store(sled::Error::Unsupported("offline".into())))
        }
        fn remove(&self, _: &CacheKey) -> Result<(), CacheError> { Ok(()) }
    }

    #[test]
    fn key_joins_identity_and_mode() {
        assert_eq!(CacheKey::new("2101.00001", Mode::Deep).as_str(), "2101.00001:deep");
    }

    #[test]
    fn sentence_overrides_get_their_own_slot() {
        assert_eq!(CacheKey::with_sentences("doc", Mode::Quick, None).as_str(), "doc:quick");
        assert_eq!(CacheKey::with_sentences("doc", Mode::Quick, Some(5)).as_str(), "doc:quick");
        assert_eq!(CacheKey::with_sentences("doc", Mode::Quick, Some(12)).as_str(), "doc:quick:12");
        assert_eq!(CacheKey::with_sentences("doc", Mode::Deep, Some(5)).as_str(), "doc:deep:5");
    }

    #[test]
    fn writes_sweep_entries_nobody_reads_again() {
        let cache = SummaryCache::in_memory(DEFAULT_TTL);
        let t0 = OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap();
        cache.store_at(&CacheKey::new("stale", Mode::Quick), result("old"), t0).unwrap();

        let later = t0 + time::Duration::days(8);
        for i in 0..SWEEP_EVERY {
            let key = CacheKey::new(&format!("doc-{i}"), Mode::Quick);
            cache.store_at(&key, result("new"), later).unwrap();
        }
        // the sweep on write SWEEP_EVERY removed the stale entry
        assert_eq!(cache.memory.len(), SWEEP_EVERY);
        assert_eq!(cache.memory.get(&CacheKey::new("stale", Mode::Quick)).unwrap(), None);
    }

    #[test]
    fn memory_hit_then_expiry_evicts() {
        let cache = SummaryCache::in_memory(DEFAULT_TTL);
        let key = CacheKey::new("doc", Mode::Quick);
        let t0 = OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap();
        cache.store_at(&key, result("a"), t0).unwrap();

        let hit = cache.lookup_at(&key, t0 + time::Duration::days(6));
        assert_eq!(hit, Some((result("a"), CacheTier::Memory)));

        assert_eq!(cache.lookup_at(&key, t0 + time::Duration::days(7)), None);
        assert!(cache.memory.is_empty());
    }

    #[test]
    fn external_tier_is_consulted_first() {
        let dir = tempfile::tempdir().unwrap();
        let store = SledStore::open(dir.path()).unwrap();
        let key = CacheKey::new("doc", Mode::Deep);
        store.set(&key, CacheEntry::new(result("ext"), OffsetDateTime::now_utc())).unwrap();

        let cache = SummaryCache::with_external(Box::new(store), DEFAULT_TTL);
        cache.memory.set(&key, CacheEntry::new(result("mem"), OffsetDateTime::now_utc())).unwrap();
        assert_eq!(cache.lookup(&key), Some((result("ext"), CacheTier::External)));
    }

    #[test]
    fn broken_external_degrades_to_memory() {
        let cache = SummaryCache::with_external(Box::new(BrokenStore), DEFAULT_TTL);
        let key = CacheKey::new("doc", Mode::Quick);
        assert!(cache.store(&key, result("a")).is_err());
        assert_eq!(cache.lookup(&key), Some((result("a"), CacheTier::Memory)));
    }
}
