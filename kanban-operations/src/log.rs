//! Activity log entries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One settled mutation, as recorded in the activity log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// ULID, sortable by creation time
    pub id: String,

    pub timestamp: DateTime<Utc>,

    /// Canonical op string (e.g. "move task")
    pub op: String,

    /// The operation's input (as JSON)
    pub input: Value,

    /// The result value, or `{"error": ..}` when the operation rolled back
    pub output: Value,

    /// Who performed the operation: "user_id" or "agent_name[session_id]"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor: Option<String>,

    /// Cache scopes the operation wrote to (e.g. "tasks:7")
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scopes: Vec<String>,

    /// Wall time including the remote round trip
    pub duration_ms: u64,
}

impl LogEntry {
    /// Create a new log entry
    pub fn new(
        op: impl Into<String>,
        input: Value,
        output: Value,
        actor: Option<String>,
        duration_ms: u64,
    ) -> Self {
        Self {
            id: ulid::Ulid::new().to_string(),
            timestamp: Utc::now(),
            op: op.into(),
            input,
            output,
            actor,
            scopes: Vec::new(),
            duration_ms,
        }
    }

    /// Set the actor
    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = Some(actor.into());
        self
    }

    /// Record the scopes touched by the operation
    pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        self.scopes = scopes.into_iter().map(|s| s.to_string()).collect();
        self
    }

    /// True when the output records a failure
    pub fn is_failure(&self) -> bool {
        self.output.get("error").is_some()
    }
}
