//! MoveBoard command

use crate::context::SyncContext;
use crate::coordinator::{self, output, settle};
use crate::error::SyncError;
use crate::types::{Board, EntityId, ScopeKey};
use kanban_operations::{async_trait, operation, Execute, ExecutionResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Instant;

/// Move a board to a new index in the board list
#[operation(verb = "move", noun = "board", description = "Reorder a board in the board list")]
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MoveBoard {
    pub id: EntityId,
    /// Target index; clamped to the list
    pub to_index: usize,
}

impl MoveBoard {
    pub fn new(id: impl Into<EntityId>, to_index: usize) -> Self {
        Self {
            id: id.into(),
            to_index,
        }
    }
}

#[async_trait]
impl Execute<SyncContext, SyncError> for MoveBoard {
    async fn execute(&self, ctx: &SyncContext) -> ExecutionResult<Value, SyncError> {
        let start = Instant::now();
        let scope = ScopeKey::boards();
        let result = async {
            output(coordinator::move_within::<Board>(ctx, &scope, &self.id, self.to_index).await?)
        }
        .await;
        settle(self, start, &[scope], result)
    }
}
