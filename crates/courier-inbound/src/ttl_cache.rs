// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Expiry-stamped map used for inbound dedup and action correlation.
//!
//! Entries carry a deadline and are swept lazily on every mutation and
//! lookup. Eviction is a correctness requirement here, not an optimization:
//! both caches would otherwise grow without bound on a busy tenant.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// A TTL-bounded map with lazy sweeping.
pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: Mutex<HashMap<K, (V, Instant)>>,
}

impl<K: Eq + Hash + Clone, V: Clone> TtlCache<K, V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Inserts or refreshes an entry.
    pub fn insert(&self, key: K, value: V) {
        let mut entries = self.lock();
        Self::sweep(&mut entries);
        entries.insert(key, (value, Instant::now() + self.ttl));
    }

    /// Inserts only when no live entry exists for the key.
    ///
    /// Returns false when the key was already present; the set-membership
    /// test used for dedup.
    pub fn insert_if_absent(&self, key: K, value: V) -> bool {
        let mut entries = self.lock();
        Self::sweep(&mut entries);
        if entries.contains_key(&key) {
            return false;
        }
        entries.insert(key, (value, Instant::now() + self.ttl));
        true
    }

    /// Removes and returns a live entry.
    pub fn take(&self, key: &K) -> Option<V> {
        let mut entries = self.lock();
        Self::sweep(&mut entries);
        entries.remove(key).map(|(value, _)| value)
    }

    pub fn contains(&self, key: &K) -> bool {
        let mut entries = self.lock();
        Self::sweep(&mut entries);
        entries.contains_key(key)
    }

    /// Live entry count (expired entries are swept first).
    pub fn len(&self) -> usize {
        let mut entries = self.lock();
        Self::sweep(&mut entries);
        entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<K, (V, Instant)>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn sweep(entries: &mut HashMap<K, (V, Instant)>) {
        let now = Instant::now();
        entries.retain(|_, (_, deadline)| *deadline > now);
    }
}
