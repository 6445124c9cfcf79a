//! AddBoard command

use crate::context::SyncContext;
use crate::coordinator::{self, output, settle};
use crate::error::SyncError;
use crate::types::{Board, Draft, ScopeKey};
use kanban_operations::{async_trait, operation, Execute, ExecutionResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Instant;

/// Create a board and append it to the board list
#[operation(verb = "add", noun = "board", description = "Create a new board")]
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AddBoard {
    /// Display title; trimmed, must not be blank
    pub title: String,
}

impl AddBoard {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }
}

#[async_trait]
impl Execute<SyncContext, SyncError> for AddBoard {
    async fn execute(&self, ctx: &SyncContext) -> ExecutionResult<Value, SyncError> {
        let start = Instant::now();
        let result = async {
            let board = coordinator::create::<Board>(ctx, None, &Draft::new(&self.title)).await?;
            output(Some(board))
        }
        .await;
        settle(self, start, &[ScopeKey::boards()], result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeRemote;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_add_board_local() {
        let ctx = SyncContext::in_memory();
        let result = AddBoard::new("Roadmap").execute(&ctx).await;
        assert!(result.should_log());
        let value = result.into_result().unwrap();
        assert_eq!(value["title"], "Roadmap");
        assert_eq!(value["position"], 0);
        assert_eq!(ctx.boards().len(), 1);
    }

    #[tokio::test]
    async fn test_blank_title_not_logged() {
        let ctx = SyncContext::in_memory();
        let result = AddBoard::new("  ").execute(&ctx).await;
        assert!(result.is_failed());
        assert!(!result.should_log());
    }

    #[tokio::test]
    async fn test_remote_failure_logged_as_error() {
        let remote = Arc::new(FakeRemote::new());
        remote.fail_next(500);
        let ctx = SyncContext::in_memory().with_remote(remote);
        let result = AddBoard::new("Roadmap").execute(&ctx).await;
        let entry = result.log_entry().unwrap();
        assert!(entry.is_failure());
        assert_eq!(entry.op, "add board");
        assert_eq!(entry.scopes, vec!["boards".to_string()]);
        assert!(ctx.boards().is_empty());
    }
}
