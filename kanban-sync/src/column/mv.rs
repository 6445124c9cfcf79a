//! MoveColumn command

use crate::context::SyncContext;
use crate::coordinator::{self, output, settle};
use crate::error::SyncError;
use crate::types::{Column, EntityId, ScopeKey};
use kanban_operations::{async_trait, operation, Execute, ExecutionResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Instant;

/// Move a column to a new index within its board
#[operation(verb = "move", noun = "column", description = "Reorder a column within its board")]
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MoveColumn {
    pub board_id: EntityId,
    pub id: EntityId,
    /// Target index; clamped to the column list
    pub to_index: usize,
}

impl MoveColumn {
    pub fn new(board_id: impl Into<EntityId>, id: impl Into<EntityId>, to_index: usize) -> Self {
        Self {
            board_id: board_id.into(),
            id: id.into(),
            to_index,
        }
    }
}

#[async_trait]
impl Execute<SyncContext, SyncError> for MoveColumn {
    async fn execute(&self, ctx: &SyncContext) -> ExecutionResult<Value, SyncError> {
        let start = Instant::now();
        let scope = ScopeKey::columns(&self.board_id);
        let result = async {
            output(coordinator::move_within::<Column>(ctx, &scope, &self.id, self.to_index).await?)
        }
        .await;
        settle(self, start, &[scope], result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeRemote;
    use serde_json::json;
    use std::sync::Arc;

    async fn setup() -> (Arc<FakeRemote>, SyncContext, Vec<EntityId>) {
        let remote = Arc::new(FakeRemote::new());
        let ids = remote.seed_columns("b", ["A", "B", "C"]);
        let ctx = SyncContext::in_memory().with_remote(remote.clone());
        crate::query::fetch::<Column>(&ctx, &ScopeKey::columns("b")).await;
        (remote, ctx, ids)
    }

    fn titles(ctx: &SyncContext) -> Vec<String> {
        ctx.columns(&EntityId::from("b"))
            .into_iter()
            .map(|c| c.title)
            .collect()
    }

    #[tokio::test]
    async fn test_move_sends_position_and_board() {
        let (remote, ctx, ids) = setup().await;
        MoveColumn::new("b", ids[0].clone(), 2)
            .execute(&ctx)
            .await
            .into_result()
            .unwrap();
        assert_eq!(titles(&ctx), vec!["B", "C", "A"]);
        assert_eq!(remote.writes()[0].body, Some(json!({"position": 2, "boardId": "b"})));
    }

    #[tokio::test]
    async fn test_failed_move_restores_order() {
        let (remote, ctx, ids) = setup().await;
        remote.fail_next(503);
        let result = MoveColumn::new("b", ids[2].clone(), 0).execute(&ctx).await;
        assert!(result.is_failed());
        assert!(result.log_entry().unwrap().is_failure());
        assert_eq!(titles(&ctx), vec!["A", "B", "C"]);
    }

    #[tokio::test]
    async fn test_move_to_own_index_makes_no_call() {
        let (remote, ctx, ids) = setup().await;
        let result = MoveColumn::new("b", ids[1].clone(), 1).execute(&ctx).await;
        assert!(!result.should_log());
        assert!(remote.writes().is_empty());
    }
}
