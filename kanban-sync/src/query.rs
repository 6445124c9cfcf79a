//! Read path: fetch, reconcile, fall back
//!
//! A fetch never fails from the caller's point of view. When the remote or
//! its payload is bad the caller gets the last known list instead, and when
//! a mutation supersedes the fetch mid-flight the caller gets the
//! mutation's state and nothing is written.
//!
//! A list fetched within the context's freshness window is served from the
//! cache. Settled mutations mark their scopes stale, so the next read after
//! a write always goes to the remote.

use crate::cache::ScopeStoreExt;
use crate::context::SyncContext;
use crate::error::SyncError;
use crate::ordering::sort_for_display;
use crate::reconcile::{fallback, reconcile};
use crate::types::{Column, Entity, EntityId, ScopeKey, Task};
use crate::validate::decode_list;
use serde::Serialize;
use tracing::{debug, trace, warn};

/// Where a fetched list came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchSource {
    /// Reconciled from a fresh remote list
    Remote,
    /// Fetched recently enough to skip the remote
    Cached,
    /// No remote configured; served from local state
    Local,
    /// The remote failed; served from local state
    Fallback,
    /// A mutation cancelled the fetch; served the mutation's state
    Superseded,
}

/// Result of [`fetch`]
#[derive(Debug, Clone, Serialize)]
pub struct Fetched<E> {
    pub items: Vec<E>,
    pub source: FetchSource,
    /// Why the remote was not used, for `Fallback`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<E> Fetched<E> {
    fn new(items: Vec<E>, source: FetchSource) -> Self {
        Self {
            items,
            source,
            error: None,
        }
    }

    /// The items reflect the remote as of at most one freshness window ago
    pub fn is_fresh(&self) -> bool {
        matches!(self.source, FetchSource::Remote | FetchSource::Cached)
    }
}

/// Load a scope from the remote and reconcile it with local positions
pub async fn fetch<E: Entity>(ctx: &SyncContext, scope: &ScopeKey) -> Fetched<E> {
    let Some(remote) = ctx.remote() else {
        return Fetched::new(sort_for_display(&ctx.current::<E>(scope)), FetchSource::Local);
    };

    if ctx.store().is_fresh(scope, ctx.stale_after()) {
        if let Some(items) = ctx.store().read_opt::<E>(scope) {
            trace!(%scope, "serving fresh cache entry");
            return Fetched::new(sort_for_display(&items), FetchSource::Cached);
        }
    }

    let token = ctx.store().read_token(scope);
    let response = tokio::select! {
        biased;
        _ = token.cancelled() => None,
        response = remote.list(E::KIND, scope.parent()) => Some(response),
    };
    let response = match response {
        Some(response) if !token.is_cancelled() => response,
        _ => {
            debug!(%scope, "fetch superseded by a mutation");
            return Fetched::new(ctx.current::<E>(scope), FetchSource::Superseded);
        }
    };

    let decoded = response
        .map_err(SyncError::from)
        .and_then(decode_list::<E>);
    let mut items = match decoded {
        Ok(items) => items,
        Err(e) => {
            warn!(%scope, error = %e, "fetch failed, serving last known list");
            let local = local_list::<E>(ctx, scope, true);
            return Fetched {
                items: fallback(&local),
                source: FetchSource::Fallback,
                error: Some(e.to_string()),
            };
        }
    };

    if let Some(parent) = scope.parent() {
        items.retain(|item| item.parent_id() == Some(parent));
    }

    let local = local_list::<E>(ctx, scope, false);
    let reconciled = reconcile(&items, &local);
    ctx.write_through(scope, reconciled.clone());
    ctx.store().mark_fetched(scope);
    debug!(%scope, count = reconciled.len(), "fetched");
    Fetched::new(reconciled, FetchSource::Remote)
}

/// The list to show while the first fetch of a scope is outstanding
pub fn placeholder<E: Entity>(ctx: &SyncContext, scope: &ScopeKey) -> Option<Vec<E>> {
    ctx.store()
        .read_opt::<E>(scope)
        .or_else(|| ctx.mirror().load::<E>(scope))
        .map(|list| sort_for_display(&list))
}

/// Local positions to reconcile against or fall back to.
///
/// Reconciliation prefers the mirror (positions the user last saw persist
/// across restarts); the fallback prefers the cache.
fn local_list<E: Entity>(ctx: &SyncContext, scope: &ScopeKey, cache_first: bool) -> Vec<E> {
    let cached = || ctx.store().read_opt::<E>(scope);
    let mirrored = || ctx.mirror().load::<E>(scope);
    let found = if cache_first {
        cached().or_else(mirrored)
    } else {
        mirrored().or_else(cached)
    };
    found.unwrap_or_default()
}

/// A board's columns with the tasks of each
#[derive(Debug, Clone, Serialize)]
pub struct BoardView {
    pub board_id: EntityId,
    pub columns: Vec<ColumnView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ColumnView {
    #[serde(flatten)]
    pub column: Column,
    pub tasks: Vec<Task>,
}

/// Fetch a board's columns, then each column's tasks
pub async fn fetch_board(ctx: &SyncContext, board_id: &EntityId) -> BoardView {
    let columns = fetch::<Column>(ctx, &ScopeKey::columns(board_id)).await.items;
    let mut views = Vec::with_capacity(columns.len());
    for column in columns {
        let tasks = fetch::<Task>(ctx, &ScopeKey::tasks(&column.id)).await.items;
        views.push(ColumnView { column, tasks });
    }
    BoardView {
        board_id: board_id.clone(),
        columns: views,
    }
}
