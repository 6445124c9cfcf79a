//! Sync operation processor
//!
//! Runs operations for an actor and keeps the most recent log entries in
//! memory, newest first.

use crate::context::SyncContext;
use crate::error::{Result, SyncError};
use crate::logging::Pretty;
use kanban_operations::{async_trait, Execute, LogEntry, OperationProcessor};
use serde_json::Value;
use std::collections::VecDeque;
use tokio::sync::Mutex;
use tracing::{info, trace, warn};

/// Default number of entries kept in the activity log
pub const DEFAULT_ACTIVITY_CAPACITY: usize = 200;

/// Processor for sync operations
pub struct SyncOperationProcessor {
    actor: Option<String>,
    capacity: usize,
    activity: Mutex<VecDeque<LogEntry>>,
}

impl SyncOperationProcessor {
    /// Create a new processor with no actor attribution
    pub fn new() -> Self {
        Self {
            actor: None,
            capacity: DEFAULT_ACTIVITY_CAPACITY,
            activity: Mutex::new(VecDeque::new()),
        }
    }

    /// Attribute every logged operation to `actor`
    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = Some(actor.into());
        self
    }

    /// Keep at most `capacity` entries (at least one)
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    pub fn actor(&self) -> Option<&str> {
        self.actor.as_deref()
    }

    /// Recorded entries, newest first
    pub async fn activity(&self) -> Vec<LogEntry> {
        self.activity.lock().await.iter().cloned().collect()
    }

    async fn record(&self, entry: LogEntry) {
        let entry = match &self.actor {
            Some(actor) => entry.with_actor(actor.clone()),
            None => entry,
        };

        if entry.is_failure() {
            warn!(
                op = %entry.op,
                scopes = ?entry.scopes,
                duration_ms = entry.duration_ms,
                "operation failed"
            );
        } else {
            info!(
                op = %entry.op,
                scopes = ?entry.scopes,
                duration_ms = entry.duration_ms,
                "operation settled"
            );
        }
        trace!("log entry {}", Pretty(&entry));

        let mut activity = self.activity.lock().await;
        activity.push_front(entry);
        activity.truncate(self.capacity);
    }
}

impl Default for SyncOperationProcessor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OperationProcessor<SyncContext, SyncError> for SyncOperationProcessor {
    async fn process<O>(&self, operation: &O, ctx: &SyncContext) -> Result<Value>
    where
        O: Execute<SyncContext, SyncError>,
    {
        let (result, log_entry) = operation.execute(ctx).await.split();
        if let Some(entry) = log_entry {
            self.record(entry).await;
        }
        result
    }
}
