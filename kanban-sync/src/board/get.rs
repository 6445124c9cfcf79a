//! GetBoard command

use crate::context::SyncContext;
use crate::error::SyncError;
use crate::query::fetch_board;
use crate::types::EntityId;
use kanban_operations::{async_trait, operation, Execute, ExecutionResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Load one board's columns and tasks
#[operation(verb = "get", noun = "board", description = "Get a board with its columns and tasks")]
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GetBoard {
    pub id: EntityId,
}

impl GetBoard {
    pub fn new(id: impl Into<EntityId>) -> Self {
        Self { id: id.into() }
    }
}

#[async_trait]
impl Execute<SyncContext, SyncError> for GetBoard {
    async fn execute(&self, ctx: &SyncContext) -> ExecutionResult<Value, SyncError> {
        let view = fetch_board(ctx, &self.id).await;
        match serde_json::to_value(&view) {
            Ok(value) => ExecutionResult::Unlogged { value },
            Err(e) => ExecutionResult::Failed {
                error: e.into(),
                log_entry: None,
            },
        }
    }
}
