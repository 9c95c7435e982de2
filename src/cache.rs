//! Optional result cache
//!
//! Caches per-file analysis results keyed by `(content hash, categories)`.
//! The cache is an injected capability: the engine works identically with
//! the no-op implementation. Concurrent reads are safe; on a racing
//! insert the first writer wins and later identical values are harmless.

use dashmap::DashMap;
use sha2::{Digest, Sha256};

use crate::models::{AnalysisCategory, FileAnalysisResult};

/// Cache key: sha256 of content plus the requested category set.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    content_hash: [u8; 32],
    categories: Vec<AnalysisCategory>,
}

impl CacheKey {
    pub fn new(content: &str, categories: &[AnalysisCategory]) -> Self {
        let mut sorted = categories.to_vec();
        sorted.sort();
        sorted.dedup();
        Self {
            content_hash: Sha256::digest(content.as_bytes()).into(),
            categories: sorted,
        }
    }
}

/// Storage for per-file results across runs.
pub trait ResultCache: Send + Sync {
    fn get(&self, key: &CacheKey) -> Option<FileAnalysisResult>;
    fn put(&self, key: CacheKey, result: FileAnalysisResult);
}

/// Default cache: caching disabled.
pub struct NoopCache;

impl ResultCache for NoopCache {
    fn get(&self, _key: &CacheKey) -> Option<FileAnalysisResult> {
        None
    }

    fn put(&self, _key: CacheKey, _result: FileAnalysisResult) {}
}

/// Process-lifetime in-memory cache.
#[derive(Default)]
pub struct MemoryCache {
    entries: DashMap<CacheKey, FileAnalysisResult>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ResultCache for MemoryCache {
    fn get(&self, key: &CacheKey) -> Option<FileAnalysisResult> {
        self.entries.get(key).map(|r| r.clone())
    }

    fn put(&self, key: CacheKey, result: FileAnalysisResult) {
        // First writer wins; a racing identical insert is a no-op in effect.
        self.entries.entry(key).or_insert(result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::Language;

    #[test]
    fn test_key_ignores_category_order() {
        let a = CacheKey::new(
            "x",
            &[AnalysisCategory::Quality, AnalysisCategory::Security],
        );
        let b = CacheKey::new(
            "x",
            &[AnalysisCategory::Security, AnalysisCategory::Quality],
        );
        assert_eq!(a, b);
    }

    #[test]
    fn test_key_differs_by_content() {
        let a = CacheKey::new("x", &[AnalysisCategory::Security]);
        let b = CacheKey::new("y", &[AnalysisCategory::Security]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_memory_cache_round_trip() {
        let cache = MemoryCache::new();
        let key = CacheKey::new("content", &[AnalysisCategory::Security]);
        assert!(cache.get(&key).is_none());

        cache.put(
            key.clone(),
            FileAnalysisResult::analyzed("f.py", Language::Python, vec![]),
        );
        let hit = cache.get(&key).expect("cached");
        assert!(hit.analyzed);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_noop_cache_never_stores() {
        let cache = NoopCache;
        let key = CacheKey::new("content", &[AnalysisCategory::Security]);
        cache.put(
            key.clone(),
            FileAnalysisResult::analyzed("f.py", Language::Python, vec![]),
        );
        assert!(cache.get(&key).is_none());
    }
}
