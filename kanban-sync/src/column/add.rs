//! AddColumn command

use crate::context::SyncContext;
use crate::coordinator::{self, output, settle};
use crate::error::SyncError;
use crate::types::{Column, Draft, EntityId, ScopeKey};
use kanban_operations::{async_trait, operation, Execute, ExecutionResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Instant;

/// Add a new column to the end of a board
#[operation(verb = "add", noun = "column", description = "Add a new column to a board")]
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AddColumn {
    /// The owning board
    pub board_id: EntityId,
    /// The column display name
    pub title: String,
}

impl AddColumn {
    /// Create a new AddColumn command
    pub fn new(board_id: impl Into<EntityId>, title: impl Into<String>) -> Self {
        Self {
            board_id: board_id.into(),
            title: title.into(),
        }
    }
}

#[async_trait]
impl Execute<SyncContext, SyncError> for AddColumn {
    async fn execute(&self, ctx: &SyncContext) -> ExecutionResult<Value, SyncError> {
        let start = Instant::now();
        let result = async {
            let column =
                coordinator::create::<Column>(ctx, Some(&self.board_id), &Draft::new(&self.title))
                    .await?;
            output(Some(column))
        }
        .await;
        settle(self, start, &[ScopeKey::columns(&self.board_id)], result)
    }
}
