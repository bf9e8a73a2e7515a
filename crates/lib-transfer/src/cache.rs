//! Process-local cache of transfer functions and response metadata.
//!
//! Three independent stores, each a mutex-guarded map with a pair of atomic
//! hit/miss counters. Every retrieval bumps exactly one counter of its
//! store. A forward or inverse key that is not valid at the query time
//! counts as a miss without the map being consulted; metadata validity is
//! checked on the stored row. Entries are never evicted.
//!
//! Retrieved values are clones, so callers never share mutable state with
//! the cache or with each other.

use crate::inverse::InverseTransferFunction;
use crate::keys::{FromKey, ToKey};
use crate::transfer_data::TransferData;
use lib_types::{Epoch, ResponseMetadata};
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

/// Extension trait for Mutex to handle poisoning gracefully.
trait RecoverMutex<T> {
    fn lock_recover(&self) -> MutexGuard<'_, T>;
}

impl<T> RecoverMutex<T> for Mutex<T> {
    fn lock_recover(&self) -> MutexGuard<'_, T> {
        self.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("Cache mutex was poisoned, recovering data");
            poisoned.into_inner()
        })
    }
}

/// One keyed store with its counters.
struct Store<K, V> {
    entries: Mutex<HashMap<K, V>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<K: Eq + Hash, V: Clone> Store<K, V> {
    fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Look up `key` when `valid`, counting the outcome.
    fn retrieve(&self, key: &K, valid: bool) -> Option<V> {
        let found = if valid {
            self.entries.lock_recover().get(key).cloned()
        } else {
            None
        };
        self.count(found.is_some());
        found
    }

    /// Look up `key`, accepting only values that pass `accept`.
    fn retrieve_if(&self, key: &K, accept: impl Fn(&V) -> bool) -> Option<V> {
        let found = self.entries.lock_recover().get(key).filter(|v| accept(v)).cloned();
        self.count(found.is_some());
        found
    }

    fn count(&self, hit: bool) {
        let counter = if hit { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn insert(&self, key: K, value: V) {
        self.entries.lock_recover().insert(key, value);
    }

    fn len(&self) -> usize {
        self.entries.lock_recover().len()
    }

    fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    fn clear(&self) {
        self.entries.lock_recover().clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }
}

/// Thread-safe cache shared by dispatchers.
pub struct TransferCache {
    forward: Store<FromKey, TransferData>,
    inverse: Store<ToKey, InverseTransferFunction>,
    metadata: Store<i64, ResponseMetadata>,
}

impl TransferCache {
    pub fn new() -> Self {
        Self {
            forward: Store::new(),
            inverse: Store::new(),
            metadata: Store::new(),
        }
    }

    /// Forward response for `key`, if cached and valid at `time`.
    pub fn retrieve_forward(&self, key: &FromKey, time: Epoch) -> Option<TransferData> {
        let found = self.forward.retrieve(key, key.contains(time));
        tracing::trace!(id = key.metadata.id, hit = found.is_some(), "forward cache lookup");
        found
    }

    pub fn cache_forward(&self, key: FromKey, data: TransferData) {
        self.forward.insert(key, data);
    }

    /// Inverse response for `key`, if cached and valid at `time`.
    pub fn retrieve_inverse(&self, key: &ToKey, time: Epoch) -> Option<InverseTransferFunction> {
        let found = self.inverse.retrieve(key, key.contains(time));
        tracing::trace!(id = key.from.metadata.id, hit = found.is_some(), "inverse cache lookup");
        found
    }

    pub fn cache_inverse(&self, key: ToKey, inverse: InverseTransferFunction) {
        self.inverse.insert(key, inverse);
    }

    /// Metadata with `id`, if cached and valid at `time`.
    ///
    /// A bare id carries no validity window, so the map is probed and the
    /// stored row's window decides. A row outside its window counts as a
    /// miss and stays cached.
    pub fn retrieve_metadata(&self, id: i64, time: Epoch) -> Option<ResponseMetadata> {
        let found = self.metadata.retrieve_if(&id, |meta| meta.contains(time));
        tracing::trace!(id, hit = found.is_some(), "metadata cache lookup");
        found
    }

    pub fn cache_metadata(&self, metadata: ResponseMetadata) {
        self.metadata.insert(metadata.id, metadata);
    }

    pub fn forward_hits(&self) -> u64 {
        self.forward.hits()
    }

    pub fn forward_misses(&self) -> u64 {
        self.forward.misses()
    }

    pub fn inverse_hits(&self) -> u64 {
        self.inverse.hits()
    }

    pub fn inverse_misses(&self) -> u64 {
        self.inverse.misses()
    }

    pub fn metadata_hits(&self) -> u64 {
        self.metadata.hits()
    }

    pub fn metadata_misses(&self) -> u64 {
        self.metadata.misses()
    }

    /// Number of entries per store: forward, inverse, metadata.
    pub fn sizes(&self) -> (usize, usize, usize) {
        (self.forward.len(), self.inverse.len(), self.metadata.len())
    }

    /// Counter summary of all three stores.
    pub fn diagnostics(&self) -> String {
        format!(
            "Forward: {} hits, {} misses; Inverse: {} hits, {} misses; Metadata: {} hits, {} misses",
            self.forward_hits(),
            self.forward_misses(),
            self.inverse_hits(),
            self.inverse_misses(),
            self.metadata_hits(),
            self.metadata_misses(),
        )
    }

    /// Drop every entry and reset the counters.
    pub fn clear(&self) {
        self.forward.clear();
        self.inverse.clear();
        self.metadata.clear();
    }
}

impl Default for TransferCache {
    fn default() -> Self {
        Self::new()
    }
}
