//! DeleteColumn command

use crate::context::SyncContext;
use crate::coordinator::{self, output, settle};
use crate::error::SyncError;
use crate::types::{Column, EntityId, ScopeKey};
use kanban_operations::{async_trait, operation, Execute, ExecutionResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Instant;

/// Delete a column and drop its tasks
#[operation(verb = "delete", noun = "column", description = "Delete a column and its tasks")]
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeleteColumn {
    pub board_id: EntityId,
    pub id: EntityId,
}

impl DeleteColumn {
    pub fn new(board_id: impl Into<EntityId>, id: impl Into<EntityId>) -> Self {
        Self {
            board_id: board_id.into(),
            id: id.into(),
        }
    }
}

#[async_trait]
impl Execute<SyncContext, SyncError> for DeleteColumn {
    async fn execute(&self, ctx: &SyncContext) -> ExecutionResult<Value, SyncError> {
        let start = Instant::now();
        let scopes = [ScopeKey::columns(&self.board_id), ScopeKey::tasks(&self.id)];
        let result = async {
            output(coordinator::delete::<Column>(ctx, &scopes[0], &self.id).await?)
        }
        .await;
        settle(self, start, &scopes, result)
    }
}
