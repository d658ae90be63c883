use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use sha2::{Digest, Sha256};

use crate::data::loader::{load_bytes, FileFormat};
use crate::data::model::Dataset;
use crate::error::LoadError;

// ---------------------------------------------------------------------------
// Cache key: content identity, never the session or file name
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    digest: [u8; 32],
    format: FileFormat,
}

impl CacheKey {
    pub fn new(bytes: &[u8], format: FileFormat) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        CacheKey {
            digest: hasher.finalize().into(),
            format,
        }
    }

    pub fn format(&self) -> FileFormat {
        self.format
    }
}

impl fmt::Debug for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let short: String = self.digest[..6].iter().map(|b| format!("{b:02x}")).collect();
        write!(f, "CacheKey({short}…, {:?})", self.format)
    }
}

// ---------------------------------------------------------------------------
// Dataset cache
// ---------------------------------------------------------------------------

/// Memoises [`load_bytes`] by (content hash, format).
///
/// Cached datasets are immutable and handed out as `Arc`, so the same
/// entry can back any number of views without copying.
pub struct DatasetCache {
    entries: LruCache<CacheKey, Arc<Dataset>>,
    hits: u64,
    misses: u64,
}

impl DatasetCache {
    pub fn new(capacity: NonZeroUsize) -> Self {
        DatasetCache {
            entries: LruCache::new(capacity),
            hits: 0,
            misses: 0,
        }
    }

    /// Return the dataset for `bytes`, parsing only on a miss.
    /// Parse failures are not cached.
    pub fn get_or_load(
        &mut self,
        bytes: &[u8],
        format: FileFormat,
    ) -> Result<(CacheKey, Arc<Dataset>), LoadError> {
        let key = CacheKey::new(bytes, format);
        if let Some(dataset) = self.entries.get(&key) {
            self.hits += 1;
            log::debug!("Load cache hit for {key:?}");
            return Ok((key, Arc::clone(dataset)));
        }

        self.misses += 1;
        let dataset = Arc::new(load_bytes(bytes, format)?);
        if let Some((evicted, _)) = self.entries.push(key, Arc::clone(&dataset)) {
            if evicted != key {
                log::debug!("Load cache evicted {evicted:?}");
            }
        }
        Ok((key, dataset))
    }

    /// Drop one entry. Returns whether it was present.
    pub fn invalidate(&mut self, key: &CacheKey) -> bool {
        self.entries.pop(key).is_some()
    }

    /// Change the capacity, dropping the oldest entries if it shrinks.
    pub fn resize(&mut self, capacity: NonZeroUsize) {
        self.entries.resize(capacity);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.contains(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(hits, misses)` since creation.
    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }
}
