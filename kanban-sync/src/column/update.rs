//! UpdateColumn command

use crate::context::SyncContext;
use crate::coordinator::{self, output, settle};
use crate::error::SyncError;
use crate::types::{Column, EntityId, EntityPatch, ScopeKey};
use kanban_operations::{async_trait, operation, Execute, ExecutionResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Instant;

/// Rename a column. Optimistic; reverted if the remote rejects it.
#[operation(verb = "update", noun = "column", description = "Rename a column")]
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpdateColumn {
    pub board_id: EntityId,
    pub id: EntityId,
    pub title: String,
}

impl UpdateColumn {
    pub fn new(
        board_id: impl Into<EntityId>,
        id: impl Into<EntityId>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            board_id: board_id.into(),
            id: id.into(),
            title: title.into(),
        }
    }
}

#[async_trait]
impl Execute<SyncContext, SyncError> for UpdateColumn {
    async fn execute(&self, ctx: &SyncContext) -> ExecutionResult<Value, SyncError> {
        let start = Instant::now();
        let scope = ScopeKey::columns(&self.board_id);
        let result = async {
            let patch = EntityPatch::title(&self.title);
            output(coordinator::rename::<Column>(ctx, &scope, &self.id, &patch).await?)
        }
        .await;
        settle(self, start, &[scope], result)
    }
}
