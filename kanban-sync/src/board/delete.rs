//! DeleteBoard command

use crate::context::SyncContext;
use crate::coordinator::{self, output, settle};
use crate::error::SyncError;
use crate::types::{Board, EntityId, ScopeKey};
use kanban_operations::{async_trait, operation, Execute, ExecutionResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Instant;

/// Delete a board together with its columns and their tasks
#[operation(verb = "delete", noun = "board", description = "Delete a board and everything on it")]
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeleteBoard {
    pub id: EntityId,
}

impl DeleteBoard {
    pub fn new(id: impl Into<EntityId>) -> Self {
        Self { id: id.into() }
    }
}

#[async_trait]
impl Execute<SyncContext, SyncError> for DeleteBoard {
    async fn execute(&self, ctx: &SyncContext) -> ExecutionResult<Value, SyncError> {
        let start = Instant::now();
        let scope = ScopeKey::boards();
        let result =
            async { output(coordinator::delete::<Board>(ctx, &scope, &self.id).await?) }.await;
        settle(self, start, &[scope], result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Column, Task};

    #[tokio::test]
    async fn test_delete_board_cascades() {
        let ctx = SyncContext::in_memory();
        ctx.write_through(
            &ScopeKey::boards(),
            vec![
                Board::new("b1", "One").with_position(0),
                Board::new("b2", "Two").with_position(1),
            ],
        );
        ctx.write_through(
            &ScopeKey::columns("b1"),
            vec![Column::new("c1", "Todo", "b1").with_position(0)],
        );
        ctx.write_through(
            &ScopeKey::tasks("c1"),
            vec![Task::new("t1", "Ship", "c1").with_position(0)],
        );

        let result = DeleteBoard::new("b1").execute(&ctx).await;
        assert!(result.should_log());

        let boards = ctx.boards();
        assert_eq!(boards.len(), 1);
        assert_eq!(boards[0].position, Some(0));
        assert!(ctx.snapshot(&ScopeKey::columns("b1")).is_none());
        assert!(ctx.snapshot(&ScopeKey::tasks("c1")).is_none());
    }
}
