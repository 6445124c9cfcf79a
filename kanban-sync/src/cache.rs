//! Entity cache: the in-memory, authoritative-for-the-UI ordered lists.
//!
//! One entry per scope key. Each entry is replaced wholesale on write, so a
//! reader never sees half an update, and carries a version that grows on
//! every write or removal, plus the time the list was last loaded from the
//! remote. A list younger than the freshness window is served without a
//! remote round trip.

use crate::types::{CachedList, Entity, ScopeKey};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

/// Injectable scope-keyed list store.
///
/// Object safe so contexts can hold `Arc<dyn ScopeStore>` and tests can swap
/// in doubles; the typed helpers live on [`ScopeStoreExt`].
pub trait ScopeStore: Send + Sync {
    /// Current list for the scope, if one was ever written
    fn get(&self, scope: &ScopeKey) -> Option<CachedList>;

    /// Replace the scope's list, returning the new version
    fn put(&self, scope: &ScopeKey, list: CachedList) -> u64;

    /// Drop the scope's list, returning what was there
    fn remove(&self, scope: &ScopeKey) -> Option<CachedList>;

    /// Monotonic write counter; 0 for a scope never written
    fn version(&self, scope: &ScopeKey) -> u64;

    /// Token that is cancelled when a mutation supersedes in-flight reads
    fn read_token(&self, scope: &ScopeKey) -> CancellationToken;

    /// Cancel any in-flight read for the scope
    fn cancel_reads(&self, scope: &ScopeKey);

    /// Scopes currently holding a list
    fn scopes(&self) -> Vec<ScopeKey>;

    /// Record that the scope's list was just loaded from the remote
    fn mark_fetched(&self, scope: &ScopeKey);

    /// When the scope was last loaded from the remote; `None` once stale
    fn fetched_at(&self, scope: &ScopeKey) -> Option<Instant>;

    /// Mark the scope stale so the next read goes to the remote
    fn invalidate(&self, scope: &ScopeKey);
}

/// Typed access on top of any [`ScopeStore`]
pub trait ScopeStoreExt: ScopeStore {
    /// The scope's list, or empty when absent or of another kind
    fn read<E: Entity>(&self, scope: &ScopeKey) -> Vec<E> {
        self.read_opt(scope).unwrap_or_default()
    }

    /// The scope's list, `None` when absent or of another kind
    fn read_opt<E: Entity>(&self, scope: &ScopeKey) -> Option<Vec<E>> {
        let list = self.get(scope)?;
        let kind = list.kind();
        let typed = E::unwrap(list);
        if typed.is_none() {
            warn!(%scope, stored = %kind, requested = %E::KIND, "cache entry kind mismatch");
        }
        typed
    }

    /// True when the scope holds a list fetched less than `window` ago
    fn is_fresh(&self, scope: &ScopeKey, window: Duration) -> bool {
        self.get(scope).is_some()
            && self
                .fetched_at(scope)
                .is_some_and(|at| at.elapsed() < window)
    }

    /// Replace the scope's list. Callers renumber first.
    fn write<E: Entity>(&self, scope: &ScopeKey, list: Vec<E>) -> u64 {
        self.put(scope, E::wrap(list))
    }

    /// Replace matching elements in place, keeping order and positions
    fn patch<E, P, U>(&self, scope: &ScopeKey, predicate: P, updater: U) -> Option<Vec<E>>
    where
        E: Entity,
        P: Fn(&E) -> bool,
        U: Fn(E) -> E,
    {
        let current = self.read_opt::<E>(scope)?;
        let next: Vec<E> = current
            .into_iter()
            .map(|item| if predicate(&item) { updater(item) } else { item })
            .collect();
        self.write(scope, next.clone());
        Some(next)
    }
}

impl<S: ScopeStore + ?Sized> ScopeStoreExt for S {}

#[derive(Default)]
struct CacheEntry {
    list: Option<CachedList>,
    version: u64,
    fetched_at: Option<Instant>,
}

/// The default [`ScopeStore`]: a concurrent map of scope entries
#[derive(Default)]
pub struct EntityCache {
    entries: DashMap<ScopeKey, CacheEntry>,
    read_tokens: DashMap<ScopeKey, CancellationToken>,
    writes: AtomicU64,
}

impl EntityCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total writes and removals across all scopes
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }
}

impl ScopeStore for EntityCache {
    fn get(&self, scope: &ScopeKey) -> Option<CachedList> {
        self.entries.get(scope).and_then(|entry| entry.list.clone())
    }

    fn put(&self, scope: &ScopeKey, list: CachedList) -> u64 {
        if list.kind() != scope.kind() {
            warn!(%scope, kind = %list.kind(), "writing list of unexpected kind");
        }
        let len = list.len();
        let mut entry = self.entries.entry(scope.clone()).or_default();
        entry.list = Some(list);
        entry.version += 1;
        let version = entry.version;
        drop(entry);

        self.writes.fetch_add(1, Ordering::Relaxed);
        debug!(%scope, len, version, "cache write");
        version
    }

    fn remove(&self, scope: &ScopeKey) -> Option<CachedList> {
        let mut entry = self.entries.get_mut(scope)?;
        let previous = entry.list.take();
        entry.fetched_at = None;
        if previous.is_some() {
            entry.version += 1;
            self.writes.fetch_add(1, Ordering::Relaxed);
            debug!(%scope, version = entry.version, "cache remove");
        }
        previous
    }

    fn version(&self, scope: &ScopeKey) -> u64 {
        self.entries.get(scope).map(|e| e.version).unwrap_or(0)
    }

    fn read_token(&self, scope: &ScopeKey) -> CancellationToken {
        self.read_tokens
            .entry(scope.clone())
            .or_default()
            .clone()
    }

    fn cancel_reads(&self, scope: &ScopeKey) {
        if let Some((_, token)) = self.read_tokens.remove(scope) {
            trace!(%scope, "cancelling in-flight reads");
            token.cancel();
        }
    }

    fn scopes(&self) -> Vec<ScopeKey> {
        let mut scopes: Vec<ScopeKey> = self
            .entries
            .iter()
            .filter(|e| e.list.is_some())
            .map(|e| e.key().clone())
            .collect();
        scopes.sort();
        scopes
    }

    fn mark_fetched(&self, scope: &ScopeKey) {
        self.entries.entry(scope.clone()).or_default().fetched_at = Some(Instant::now());
    }

    fn fetched_at(&self, scope: &ScopeKey) -> Option<Instant> {
        self.entries.get(scope).and_then(|entry| entry.fetched_at)
    }

    fn invalidate(&self, scope: &ScopeKey) {
        if let Some(mut entry) = self.entries.get_mut(scope) {
            if entry.fetched_at.take().is_some() {
                trace!(%scope, "marked stale");
            }
        }
    }
}
