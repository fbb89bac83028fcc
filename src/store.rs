use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::{Duration, SystemTime},
};

use bytes::Bytes;
use tracing::trace;

use crate::clock::Clock;

/**
 * Stored value with its absolute expiry deadline, if any
 */
#[derive(Debug, Clone)]
pub struct StoreEntry {
    value: Bytes,
    expires_at: Option<SystemTime>,
}

impl StoreEntry {
    fn is_expired(&self, now: SystemTime) -> bool {
        matches!(self.expires_at, Some(deadline) if now >= deadline)
    }
}

/**
 * Storage implementation for Redis
 * In-memory implementation, expired keys are evicted lazily on read
 */
#[derive(Debug, Default)]
pub struct KeyValueStore {
    entries: HashMap<Bytes, StoreEntry>,
}

impl KeyValueStore {
    pub fn get(&mut self, key: &[u8]) -> Option<Bytes> {
        let entry = self.entries.get(key)?;
        if !entry.is_expired(Clock::now()) {
            return Some(entry.value.clone());
        }

        trace!(key = ?Bytes::copy_from_slice(key), "Evicting expired key");
        self.entries.remove(key);
        None
    }

    /**
     * Overwrites any previous value and expiry for `key`
     */
    pub fn set(&mut self, key: Bytes, value: Bytes, ttl: Option<Duration>) {
        // A deadline past what the clock can represent never arrives
        let expires_at = ttl.and_then(|ttl| Clock::now().checked_add(ttl));
        trace!(?key, ?expires_at, "Setting key");

        self.entries.insert(key, StoreEntry { value, expires_at });
    }

    /**
     * Removes every expired entry, returns how many were removed
     */
    pub fn purge_expired(&mut self) -> usize {
        let now = Clock::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        before - self.entries.len()
    }

    /**
     * Number of physically held entries, including expired ones not yet evicted
     */
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

/**
 * Thread-safe handle onto one KeyValueStore, cheap to clone per connection
 */
#[derive(Debug, Clone, Default)]
pub struct Store {
    inner: Arc<Mutex<KeyValueStore>>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &[u8]) -> Option<Bytes> {
        self.lock().get(key)
    }

    pub fn set(&self, key: Bytes, value: Bytes, ttl: Option<Duration>) {
        self.lock().set(key, value, ttl)
    }

    pub fn purge_expired(&self) -> usize {
        self.lock().purge_expired()
    }

    pub(crate) fn len(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, KeyValueStore> {
        // Every mutation is a single map call, a panic cannot leave the map half-updated
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
