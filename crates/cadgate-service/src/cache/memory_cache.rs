//! In-process cache implementation.

use super::CacheInterface;
use async_trait::async_trait;
use cadgate_core::CadgateResult;
use dashmap::DashMap;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Instant,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Sets are stored as a JSON array of strings. Anything else reads as empty.
fn decode_set(value: &str) -> Vec<String> {
    serde_json::from_str(value).unwrap_or_default()
}

/// In-memory cache backed by a concurrent map.
///
/// Expiry is lazy: an expired entry is dropped when it is next read, and
/// [`InMemoryCache::purge_expired`] reclaims entries nobody reads again.
#[derive(Debug, Default)]
pub struct InMemoryCache {
    entries: DashMap<String, Entry>,
}

impl InMemoryCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove every expired entry. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        let purged = before.saturating_sub(self.entries.len());
        if purged > 0 {
            debug!(purged, "Purged expired cache entries");
        }
        purged
    }

    /// Number of stored entries, expired ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl CacheInterface for InMemoryCache {
    async fn get_raw(&self, key: &str) -> CadgateResult<Option<String>> {
        let now = Instant::now();

        let value = match self.entries.get(key) {
            Some(entry) if !entry.is_expired(now) => Some(entry.value.clone()),
            Some(_) => None,
            None => {
                debug!("Cache miss for key '{}'", key);
                return Ok(None);
            }
        };

        match value {
            Some(value) => {
                debug!("Cache hit for key '{}'", key);
                Ok(Some(value))
            }
            None => {
                // The read guard is released above; re-check under the write lock.
                self.entries.remove_if(key, |_, entry| entry.is_expired(now));
                debug!("Cache entry expired for key '{}'", key);
                Ok(None)
            }
        }
    }

    async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> CadgateResult<()> {
        let entry = Entry {
            value: value.to_string(),
            expires_at: Instant::now() + ttl,
        };
        self.entries.insert(key.to_string(), entry);
        debug!("Cached key '{}' with TTL {}s", key, ttl.as_secs());
        Ok(())
    }

    async fn delete(&self, key: &str) -> CadgateResult<bool> {
        let deleted = self.entries.remove(key).is_some();
        debug!("Deleted key '{}': {}", key, deleted);
        Ok(deleted)
    }

    async fn add_member(&self, key: &str, member: &str, ttl: Duration) -> CadgateResult<()> {
        let now = Instant::now();
        // The entry guard serializes concurrent writers to the same set.
        let mut entry = self.entries.entry(key.to_string()).or_insert_with(|| Entry {
            value: "[]".to_string(),
            expires_at: now,
        });

        let mut members = if entry.is_expired(now) {
            Vec::new()
        } else {
            decode_set(&entry.value)
        };
        if !members.iter().any(|m| m == member) {
            members.push(member.to_string());
        }

        entry.value = serde_json::to_string(&members)?;
        entry.expires_at = now + ttl;
        debug!("Added member to set '{}' ({} members)", key, members.len());
        Ok(())
    }

    async fn members(&self, key: &str) -> CadgateResult<Vec<String>> {
        Ok(self
            .get_raw(key)
            .await?
            .map(|value| decode_set(&value))
            .unwrap_or_default())
    }

    async fn remove_member(&self, key: &str, member: &str) -> CadgateResult<bool> {
        let now = Instant::now();

        let (removed, emptied) = match self.entries.get_mut(key) {
            Some(mut entry) if !entry.is_expired(now) => {
                let mut members = decode_set(&entry.value);
                let before = members.len();
                members.retain(|m| m != member);
                let removed = members.len() < before;
                if removed {
                    entry.value = serde_json::to_string(&members)?;
                }
                (removed, removed && members.is_empty())
            }
            _ => return Ok(false),
        };

        if emptied {
            // A writer may have re-added between the guards.
            self.entries
                .remove_if(key, |_, entry| decode_set(&entry.value).is_empty());
        }
        debug!("Removed member from set '{}': {}", key, removed);
        Ok(removed)
    }
}
