//! UpdateBoard command

use crate::context::SyncContext;
use crate::coordinator::{self, output, settle};
use crate::error::SyncError;
use crate::types::{Board, EntityId, EntityPatch, ScopeKey};
use kanban_operations::{async_trait, operation, Execute, ExecutionResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Instant;

/// Rename a board
#[operation(verb = "update", noun = "board", description = "Rename a board")]
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpdateBoard {
    pub id: EntityId,
    pub title: String,
}

impl UpdateBoard {
    pub fn new(id: impl Into<EntityId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
        }
    }
}

#[async_trait]
impl Execute<SyncContext, SyncError> for UpdateBoard {
    async fn execute(&self, ctx: &SyncContext) -> ExecutionResult<Value, SyncError> {
        let start = Instant::now();
        let scope = ScopeKey::boards();
        let result = async {
            let patch = EntityPatch::title(&self.title);
            output(coordinator::rename::<Board>(ctx, &scope, &self.id, &patch).await?)
        }
        .await;
        settle(self, start, &[scope], result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rename_board() {
        let ctx = SyncContext::in_memory();
        ctx.write_through(&ScopeKey::boards(), vec![Board::new("1", "Old").with_position(0)]);

        let value = UpdateBoard::new("1", " New ")
            .execute(&ctx)
            .await
            .into_result()
            .unwrap();
        assert_eq!(value["title"], "New");
        assert_eq!(ctx.boards()[0].title, "New");
    }

    #[tokio::test]
    async fn test_same_title_is_noop() {
        let ctx = SyncContext::in_memory();
        ctx.write_through(&ScopeKey::boards(), vec![Board::new("1", "Same").with_position(0)]);
        let result = UpdateBoard::new("1", "Same").execute(&ctx).await;
        assert!(!result.should_log());
        assert_eq!(result.into_result().unwrap()["noop"], true);
    }
}
