//! The optimistic command: snapshot, apply, then succeed or roll back

use crate::context::SyncContext;
use crate::logging::Pretty;
use crate::types::{CachedList, Entity, ScopeKey};
use serde::Serialize;
use tracing::{debug, trace, warn};

/// Where an optimistic operation is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationState {
    Idle,
    Optimistic,
    SettledSuccess,
    SettledFailure,
}

/// One optimistic mutation over one or more scopes.
///
/// `capture` records what every touched scope looked like; `stage_*` records
/// what it should look like; `apply` makes the staged state visible in the
/// cache and the mirror without awaiting. `rollback` restores the captured
/// snapshots, skipping any scope a newer command has written since.
pub struct OptimisticCommand<'a> {
    ctx: &'a SyncContext,
    label: String,
    snapshots: Vec<(ScopeKey, Option<CachedList>)>,
    staged: Vec<(ScopeKey, Option<CachedList>)>,
    ticket: Option<u64>,
    state: MutationState,
}

impl<'a> OptimisticCommand<'a> {
    /// Snapshot `scopes` as they are now
    pub fn capture(ctx: &'a SyncContext, label: impl Into<String>, scopes: &[ScopeKey]) -> Self {
        let mut snapshots: Vec<(ScopeKey, Option<CachedList>)> = Vec::with_capacity(scopes.len());
        for scope in scopes {
            if snapshots.iter().any(|(s, _)| s == scope) {
                continue;
            }
            snapshots.push((scope.clone(), ctx.snapshot(scope)));
        }
        Self {
            ctx,
            label: label.into(),
            snapshots,
            staged: Vec::new(),
            ticket: None,
            state: MutationState::Idle,
        }
    }

    /// Stage a new list for a scope
    pub fn stage_write<E: Entity>(&mut self, scope: &ScopeKey, list: Vec<E>) {
        self.stage(scope, Some(E::wrap(list)));
    }

    /// Stage removal of a scope
    pub fn stage_remove(&mut self, scope: &ScopeKey) {
        self.stage(scope, None);
    }

    fn stage(&mut self, scope: &ScopeKey, list: Option<CachedList>) {
        if !self.snapshots.iter().any(|(s, _)| s == scope) {
            self.snapshots.push((scope.clone(), self.ctx.snapshot(scope)));
        }
        self.staged.retain(|(s, _)| s != scope);
        self.staged.push((scope.clone(), list));
    }

    /// Make the staged state visible. Synchronous: no other task observes
    /// the scopes between the snapshot and the write.
    pub fn apply(&mut self) {
        let scopes: Vec<ScopeKey> = self.scopes();
        for scope in &scopes {
            self.ctx.store().cancel_reads(scope);
        }
        for (scope, list) in &self.staged {
            match list {
                Some(list) => self.ctx.write_list(scope, list.clone()),
                None => self.ctx.drop_scope(scope),
            }
        }
        let ticket = self.ctx.ledger().issue(&scopes);
        self.ticket = Some(ticket);
        self.state = MutationState::Optimistic;
        debug!(op = %self.label, ticket, scopes = ?scopes, "optimistic write applied");
        trace!("staged {}", Pretty(&self.staged));
    }

    /// The remote accepted the write
    pub fn succeed(&mut self) {
        self.mark_stale();
        self.state = MutationState::SettledSuccess;
    }

    /// A settled scope must be refetched on the next read
    fn mark_stale(&self) {
        for (scope, _) in &self.snapshots {
            self.ctx.store().invalidate(scope);
        }
    }

    /// The remote rejected the write: restore every snapshot this command
    /// still owns. Returns the scopes actually restored.
    pub fn rollback(&mut self) -> Vec<ScopeKey> {
        let Some(ticket) = self.ticket else {
            self.state = MutationState::SettledFailure;
            return Vec::new();
        };
        self.mark_stale();

        let mut restored = Vec::new();
        for (scope, before) in &self.snapshots {
            if !self.ctx.ledger().is_latest(scope, ticket) {
                warn!(
                    op = %self.label,
                    %scope,
                    ticket,
                    newer = ?self.ctx.ledger().latest(scope),
                    "skipping rollback: scope was written by a newer operation"
                );
                continue;
            }
            self.ctx.store().cancel_reads(scope);
            match before {
                Some(list) => self.ctx.write_list(scope, list.clone()),
                None => self.ctx.drop_scope(scope),
            }
            restored.push(scope.clone());
        }

        self.state = MutationState::SettledFailure;
        warn!(op = %self.label, ticket, scopes = ?restored, "rolled back");
        restored
    }

    pub fn state(&self) -> MutationState {
        self.state
    }

    /// Ticket issued by `apply`
    pub fn ticket(&self) -> Option<u64> {
        self.ticket
    }

    /// Every scope this command snapshotted, in capture order
    pub fn scopes(&self) -> Vec<ScopeKey> {
        self.snapshots.iter().map(|(scope, _)| scope.clone()).collect()
    }

    /// True while this command's ticket is still the newest on `scope`
    pub fn owns(&self, scope: &ScopeKey) -> bool {
        self.ticket
            .is_some_and(|ticket| self.ctx.ledger().is_latest(scope, ticket))
    }
}
