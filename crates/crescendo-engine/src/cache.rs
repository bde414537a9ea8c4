//! LRU cache of finished analysis results, keyed by [`FileId`].

use crate::file_id::FileId;
use crate::result::AnalysisResult;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

struct CacheEntry {
    result: Arc<AnalysisResult>,
    last_access: AtomicU64,
}

/// Concurrent result cache with LRU eviction.
///
/// Readers and writers touch entries through [`DashMap`] shards, so lookups
/// from worker threads never serialize behind a global lock. Only usable
/// results are stored; a [`Failure`](crate::result::AnalysisStatus::Failure)
/// passed to [`put`](ResultCache::put) is dropped so the next request for
/// that file runs again.
pub struct ResultCache {
    entries: DashMap<FileId, CacheEntry>,
    capacity: usize,
    hits: AtomicU64,
    misses: AtomicU64,
    insertions: AtomicU64,
    evictions: AtomicU64,
}

/// Point-in-time cache counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
    pub insertions: u64,
    pub evictions: u64,
}

impl ResultCache {
    /// Create a cache holding at most `capacity` results.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: DashMap::new(),
            capacity: capacity.max(1),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            insertions: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Look up the result for `id`, refreshing its recency on a hit.
    pub fn get(&self, id: &FileId) -> Option<Arc<AnalysisResult>> {
        match self.entries.get(id) {
            Some(entry) => {
                entry.last_access.store(now_ms(), Ordering::Relaxed);
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(Arc::clone(&entry.result))
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Store `result` under its own [`FileId`], evicting the least recently
    /// used entries if the cache is full.
    ///
    /// An existing entry for the same id is replaced wholesale. Failure
    /// results are never stored.
    pub fn put(&self, result: Arc<AnalysisResult>) {
        if !result.status.is_usable() {
            return;
        }
        let id = result.file_id.clone();

        if let Some(mut existing) = self.entries.get_mut(&id) {
            existing.result = result;
            existing.last_access.store(now_ms(), Ordering::Relaxed);
            return;
        }

        while self.entries.len() >= self.capacity {
            if !self.evict_oldest() {
                break;
            }
        }

        self.entries.insert(
            id,
            CacheEntry {
                result,
                last_access: AtomicU64::new(now_ms()),
            },
        );
        self.insertions.fetch_add(1, Ordering::Relaxed);
    }

    /// Drop the entry for `id`. Returns whether one was present.
    pub fn invalidate(&self, id: &FileId) -> bool {
        self.entries.remove(id).is_some()
    }

    /// Remove everything, keeping the counters.
    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn contains(&self, id: &FileId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The ids currently cached, in no particular order.
    pub fn snapshot(&self) -> Vec<FileId> {
        self.entries.iter().map(|e| e.key().clone()).collect()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            capacity: self.capacity,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            insertions: self.insertions.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }

    fn evict_oldest(&self) -> bool {
        let mut oldest: Option<(FileId, u64)> = None;
        for entry in self.entries.iter() {
            let ts = entry.last_access.load(Ordering::Relaxed);
            match &oldest {
                Some((_, best)) if *best <= ts => {}
                _ => oldest = Some((entry.key().clone(), ts)),
            }
        }
        match oldest {
            Some((key, _)) => {
                let removed = self.entries.remove(&key).is_some();
                if removed {
                    self.evictions.fetch_add(1, Ordering::Relaxed);
                }
                removed
            }
            None => false,
        }
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::AnalysisStatus;
    use std::time::SystemTime;

    fn id(n: u64) -> FileId {
        FileId::new(
            format!("/tmp/track-{n}.wav"),
            SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(n),
        )
    }

    fn usable(n: u64) -> Arc<AnalysisResult> {
        let mut r = AnalysisResult::failed(id(n), "placeholder");
        r.status = AnalysisStatus::Success;
        Arc::new(r)
    }

    #[test]
    fn get_after_put_returns_same_result() {
        let cache = ResultCache::new(4);
        let result = usable(1);
        cache.put(Arc::clone(&result));

        let fetched = cache.get(&id(1)).unwrap();
        assert!(Arc::ptr_eq(&fetched, &result));
        assert!(cache.contains(&id(1)));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn miss_then_hit_counts() {
        let cache = ResultCache::new(4);
        assert!(cache.get(&id(1)).is_none());
        cache.put(usable(1));
        assert!(cache.get(&id(1)).is_some());

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.insertions, 1);
    }

    #[test]
    fn failure_results_are_not_stored() {
        let cache = ResultCache::new(4);
        cache.put(Arc::new(AnalysisResult::failed(id(1), "decode failed")));
        assert!(cache.is_empty());
        assert_eq!(cache.stats().insertions, 0);
    }

    #[test]
    fn replaces_entry_for_same_id() {
        let cache = ResultCache::new(4);
        cache.put(usable(1));

        let mut newer = AnalysisResult::failed(id(1), "placeholder");
        newer.status = AnalysisStatus::Success;
        newer.peak_amplitude = 0.75;
        cache.put(Arc::new(newer));

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&id(1)).unwrap().peak_amplitude, 0.75);
    }

    #[test]
    fn evicts_least_recently_used_at_capacity() {
        let cache = ResultCache::new(2);
        cache.put(usable(1));
        std::thread::sleep(std::time::Duration::from_millis(5));
        cache.put(usable(2));
        std::thread::sleep(std::time::Duration::from_millis(5));

        // Touch 1 so 2 becomes the oldest.
        assert!(cache.get(&id(1)).is_some());
        std::thread::sleep(std::time::Duration::from_millis(5));

        cache.put(usable(3));
        assert_eq!(cache.len(), 2);
        assert!(cache.contains(&id(1)));
        assert!(!cache.contains(&id(2)));
        assert!(cache.contains(&id(3)));
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn invalidate_removes_entry() {
        let cache = ResultCache::new(4);
        cache.put(usable(1));
        assert!(cache.invalidate(&id(1)));
        assert!(!cache.invalidate(&id(1)));
        assert!(cache.get(&id(1)).is_none());
    }

    #[test]
    fn snapshot_lists_cached_ids() {
        let cache = ResultCache::new(4);
        cache.put(usable(1));
        cache.put(usable(2));
        let mut ids = cache.snapshot();
        ids.sort_by_key(|i| i.path().to_path_buf());
        assert_eq!(ids, vec![id(1), id(2)]);
    }
}
