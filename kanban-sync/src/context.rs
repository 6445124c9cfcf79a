//! SyncContext - the collaborators every operation runs against
//!
//! The context holds the cache, the mirror, the optional remote and the
//! operation ledger. It offers data access primitives only; the ordering and
//! rollback rules live in the coordinator and the operations.

use crate::cache::{EntityCache, ScopeStore, ScopeStoreExt};
use crate::config::{SyncConfig, DEFAULT_STALE_AFTER_SECS};
use crate::coordinator::OperationLedger;
use crate::error::Result;
use crate::mirror::{DurableMirror, FileKeyValueStore, KeyValueStore, MemoryKeyValueStore};
use crate::ordering::sort_for_display;
use crate::remote::RemoteApi;
use crate::transport::HttpRemote;
use crate::types::{Board, CachedList, Column, Entity, EntityKind, ScopeKey, Task};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Context passed to every operation
pub struct SyncContext {
    store: Arc<dyn ScopeStore>,
    mirror: DurableMirror,
    remote: Option<Arc<dyn RemoteApi>>,
    ledger: OperationLedger,
    stale_after: Duration,
}

impl SyncContext {
    /// A local-only context over the given cache and mirror
    pub fn new(store: Arc<dyn ScopeStore>, mirror: DurableMirror) -> Self {
        Self {
            store,
            mirror,
            remote: None,
            ledger: OperationLedger::new(),
            stale_after: Duration::from_secs(DEFAULT_STALE_AFTER_SECS),
        }
    }

    /// Local-only, with an in-memory cache and mirror
    pub fn in_memory() -> Self {
        Self::new(Arc::new(EntityCache::new()), DurableMirror::in_memory())
    }

    /// Attach a remote; without one every mutation settles locally
    pub fn with_remote(mut self, remote: Arc<dyn RemoteApi>) -> Self {
        self.remote = Some(remote);
        self
    }

    /// How long a fetched list is served without asking the remote again
    pub fn with_stale_after(mut self, stale_after: Duration) -> Self {
        self.stale_after = stale_after;
        self
    }

    /// Build the cache, mirror and transport described by `config`
    pub fn from_config(config: &SyncConfig) -> Result<Self> {
        let kv: Arc<dyn KeyValueStore> = match &config.storage_dir {
            Some(dir) => Arc::new(FileKeyValueStore::open(dir)?),
            None => Arc::new(MemoryKeyValueStore::new()),
        };
        let mirror = DurableMirror::new(kv, config.mirror_prefix.clone());
        let ctx = Self::new(Arc::new(EntityCache::new()), mirror)
            .with_stale_after(config.stale_after());

        match HttpRemote::from_config(config)? {
            Some(remote) => {
                info!(base = %remote.base_url(), "sync context using remote API");
                Ok(ctx.with_remote(Arc::new(remote)))
            }
            None => {
                info!("sync context in local-only mode");
                Ok(ctx)
            }
        }
    }

    // =========================================================================
    // Collaborators
    // =========================================================================

    pub fn store(&self) -> &dyn ScopeStore {
        self.store.as_ref()
    }

    pub fn mirror(&self) -> &DurableMirror {
        &self.mirror
    }

    pub fn remote(&self) -> Option<&dyn RemoteApi> {
        self.remote.as_deref()
    }

    pub fn is_local_only(&self) -> bool {
        self.remote.is_none()
    }

    pub fn ledger(&self) -> &OperationLedger {
        &self.ledger
    }

    pub fn stale_after(&self) -> Duration {
        self.stale_after
    }

    // =========================================================================
    // Scope access
    // =========================================================================

    /// The scope's list as the user currently sees it: the cache entry, else
    /// the mirror's copy in display order, else empty
    pub fn current<E: Entity>(&self, scope: &ScopeKey) -> Vec<E> {
        if let Some(list) = self.store.get(scope) {
            let kind = list.kind();
            return E::unwrap(list).unwrap_or_else(|| {
                warn!(%scope, stored = %kind, requested = %E::KIND, "scope holds another kind");
                Vec::new()
            });
        }
        self.mirror
            .load::<E>(scope)
            .map(|list| sort_for_display(&list))
            .unwrap_or_default()
    }

    /// Type-erased snapshot of a scope (cache, else mirror)
    pub fn snapshot(&self, scope: &ScopeKey) -> Option<CachedList> {
        self.store
            .get(scope)
            .or_else(|| self.mirror.load_list(scope))
    }

    /// Write a list to the cache and the mirror together
    pub fn write_through<E: Entity>(&self, scope: &ScopeKey, list: Vec<E>) {
        self.mirror.save(scope, &list);
        self.store.write(scope, list);
    }

    /// Type-erased [`write_through`](Self::write_through)
    pub fn write_list(&self, scope: &ScopeKey, list: CachedList) {
        self.mirror.save_list(scope, &list);
        self.store.put(scope, list);
    }

    /// Drop a scope from the cache and the mirror together
    pub fn drop_scope(&self, scope: &ScopeKey) {
        self.store.remove(scope);
        self.mirror.remove(scope);
        debug!(%scope, "dropped scope");
    }

    /// Scopes owned by an entity, deepest last: a column owns its task
    /// scope; a board owns its column scope and the task scope of every
    /// column currently known
    pub fn child_scopes(&self, kind: EntityKind, id: &crate::types::EntityId) -> Vec<ScopeKey> {
        match kind {
            EntityKind::Task => Vec::new(),
            EntityKind::Column => vec![ScopeKey::tasks(id)],
            EntityKind::Board => {
                let columns_scope = ScopeKey::columns(id);
                let mut scopes: Vec<ScopeKey> = self
                    .current::<Column>(&columns_scope)
                    .iter()
                    .map(|column| ScopeKey::tasks(&column.id))
                    .collect();
                scopes.insert(0, columns_scope);
                scopes
            }
        }
    }

    /// Boards in display order, as currently known
    pub fn boards(&self) -> Vec<Board> {
        self.current(&ScopeKey::boards())
    }

    pub fn columns(&self, board_id: &crate::types::EntityId) -> Vec<Column> {
        self.current(&ScopeKey::columns(board_id))
    }

    pub fn tasks(&self, column_id: &crate::types::EntityId) -> Vec<Task> {
        self.current(&ScopeKey::tasks(column_id))
    }
}

impl std::fmt::Debug for SyncContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncContext")
            .field("mirror", &self.mirror)
            .field("local_only", &self.is_local_only())
            .field("stale_after", &self.stale_after)
            .field("scopes", &self.store.scopes())
            .finish()
    }
}
