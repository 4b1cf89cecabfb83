//! Kernel cache implementation
//!
//! Provides an LRU cache of Q-matrix rows to avoid redundant kernel
//! computations in the SMO solver. Each working-set update touches two full
//! rows, so rows rather than single entries are the unit of caching.

use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Arc;

/// LRU cache for Q-matrix rows
pub struct KernelCache {
    cache: LruCache<usize, Arc<[f64]>>,
    hits: u64,
    misses: u64,
}

impl KernelCache {
    /// Create a new kernel cache holding at most `capacity` rows
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: LruCache::new(capacity),
            hits: 0,
            misses: 0,
        }
    }

    /// Create a kernel cache with capacity based on memory size in bytes
    ///
    /// At least two rows are always kept, since every solver step needs a pair.
    pub fn with_memory_limit(memory_bytes: usize, row_len: usize) -> Self {
        let row_bytes = row_len.max(1) * std::mem::size_of::<f64>();
        Self::new((memory_bytes / row_bytes).max(2))
    }

    /// Get a cached row
    pub fn get(&mut self, i: usize) -> Option<Arc<[f64]>> {
        if let Some(row) = self.cache.get(&i) {
            self.hits += 1;
            Some(Arc::clone(row))
        } else {
            self.misses += 1;
            None
        }
    }

    /// Put a row into the cache
    pub fn put(&mut self, i: usize, row: Arc<[f64]>) {
        self.cache.put(i, row);
    }

    /// Get a row, computing and caching it on a miss
    pub fn get_or_insert_with<F>(&mut self, i: usize, compute: F) -> Arc<[f64]>
    where
        F: FnOnce() -> Vec<f64>,
    {
        if let Some(row) = self.get(i) {
            return row;
        }
        let row: Arc<[f64]> = compute().into();
        self.put(i, Arc::clone(&row));
        row
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            capacity: self.cache.cap().get(),
            size: self.cache.len(),
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub capacity: usize,
    pub size: usize,
}

impl CacheStats {
    /// Fraction of lookups served from the cache
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(values: &[f64]) -> Arc<[f64]> {
        values.to_vec().into()
    }

    #[test]
    fn test_kernel_cache_basic() {
        let mut cache = KernelCache::new(3);

        // Cache miss
        assert!(cache.get(0).is_none());
        assert_eq!(cache.stats().misses, 1);

        // Put and get
        cache.put(0, row(&[1.0, 5.0]));
        assert_eq!(cache.get(0).as_deref(), Some(&[1.0, 5.0][..]));
        assert_eq!(cache.stats().hits, 1);
    }

    #[test]
    fn test_kernel_cache_lru_eviction() {
        let mut cache = KernelCache::new(2);

        cache.put(0, row(&[1.0]));
        cache.put(1, row(&[2.0]));
        cache.put(2, row(&[3.0])); // Should evict row 0

        assert!(cache.get(0).is_none()); // Evicted
        assert_eq!(cache.get(1).as_deref(), Some(&[2.0][..]));
        assert_eq!(cache.get(2).as_deref(), Some(&[3.0][..]));
    }

    #[test]
    fn test_get_or_insert_with_computes_once() {
        let mut cache = KernelCache::new(4);
        let mut calls = 0;

        for _ in 0..3 {
            let r = cache.get_or_insert_with(7, || {
                calls += 1;
                vec![0.5, 0.25]
            });
            assert_eq!(&r[..], &[0.5, 0.25]);
        }

        assert_eq!(calls, 1);
        assert_eq!(cache.stats().hits, 2);
    }

    #[test]
    fn test_hit_rate_calculation() {
        let mut cache = KernelCache::new(10);

        // No accesses yet
        assert_eq!(cache.stats().hit_rate(), 0.0);

        // All misses
        cache.get(0);
        cache.get(1);
        assert_eq!(cache.stats().hit_rate(), 0.0);

        // Add some data and hits
        cache.put(0, row(&[1.0]));
        cache.get(0); // Hit
        cache.get(0); // Hit

        // 2 hits, 2 misses = 50%
        assert_eq!(cache.stats().hit_rate(), 0.5);
    }

    #[test]
    fn test_cache_with_memory_limit() {
        // 1000 rows of 100 doubles need 800_000 bytes
        let cache = KernelCache::with_memory_limit(8_000, 100);
        assert_eq!(cache.stats().capacity, 10);

        // Never fewer than two rows
        let tiny = KernelCache::with_memory_limit(1, 100);
        assert_eq!(tiny.stats().capacity, 2);
    }
}
