//! Rewritten-script caching.
//!
//! # Responsibilities
//! - Store rewritten vendor scripts keyed by hash(target URL + rule set)
//! - Enforce a TTL decided by the proxy core
//!
//! # Design Decisions
//! - Narrow capability interface: the store only knows get/set-with-TTL
//! - Rewriting is a pure function of its inputs, so concurrent writes for the
//!   same key are idempotent; no locking beyond the map shards
//! - Passive expiry on read; no sweep task

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::rewrite::RewriteRule;

/// Key-value store for rewritten scripts.
pub trait ScriptCache: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: String, ttl: Duration);
}

/// In-memory TTL cache backed by a concurrent map.
#[derive(Clone, Default)]
pub struct MemoryScriptCache {
    inner: Arc<DashMap<String, CacheEntry>>,
}

#[derive(Clone)]
struct CacheEntry {
    value: String,
    expires_at: Instant,
}

impl MemoryScriptCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entries, counting expired-but-unswept ones.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl ScriptCache for MemoryScriptCache {
    fn get(&self, key: &str) -> Option<String> {
        let entry = self.inner.get(key)?;
        if entry.expires_at <= Instant::now() {
            drop(entry);
            self.inner.remove(key);
            return None;
        }
        Some(entry.value.clone())
    }

    fn set(&self, key: &str, value: String, ttl: Duration) {
        self.inner.insert(
            key.to_string(),
            CacheEntry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
    }
}

/// Stable cache key for a rewritten script: FNV-1a over the target URL and
/// every rule pair. Stable across calls within a process, which is all the
/// in-memory cache needs.
pub fn rewrite_cache_key(target_url: &str, rules: &[RewriteRule]) -> String {
    const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

    let mut hash = FNV_OFFSET;
    let mut feed = |bytes: &[u8]| {
        for b in bytes {
            hash ^= u64::from(*b);
            hash = hash.wrapping_mul(FNV_PRIME);
        }
        hash ^= 0xff;
        hash = hash.wrapping_mul(FNV_PRIME);
    };
    feed(target_url.as_bytes());
    for rule in rules {
        feed(rule.from.as_bytes());
        feed(rule.to.as_bytes());
    }
    format!("rewrite:{hash:016x}")
}
