//! Per-scope operation tickets

use crate::types::ScopeKey;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Hands out monotonically increasing tickets and remembers, per scope, the
/// newest ticket that wrote to it.
///
/// A failed operation may only roll a scope back while its ticket is still
/// the newest for that scope.
#[derive(Debug, Default)]
pub struct OperationLedger {
    counter: AtomicU64,
    latest: DashMap<ScopeKey, u64>,
}

impl OperationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a ticket and mark it newest on every given scope
    pub fn issue<'a>(&self, scopes: impl IntoIterator<Item = &'a ScopeKey>) -> u64 {
        let ticket = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        for scope in scopes {
            self.latest.insert(scope.clone(), ticket);
        }
        ticket
    }

    pub fn latest(&self, scope: &ScopeKey) -> Option<u64> {
        self.latest.get(scope).map(|t| *t)
    }

    pub fn is_latest(&self, scope: &ScopeKey, ticket: u64) -> bool {
        self.latest(scope) == Some(ticket)
    }
}
