//! ListBoards command

use crate::context::SyncContext;
use crate::error::SyncError;
use crate::query::fetch;
use crate::types::{Board, ScopeKey};
use kanban_operations::{async_trait, operation, Execute, ExecutionResult};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// List all boards in display order
#[operation(verb = "list", noun = "boards", description = "List all boards ordered by position")]
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct ListBoards;

#[async_trait]
impl Execute<SyncContext, SyncError> for ListBoards {
    async fn execute(&self, ctx: &SyncContext) -> ExecutionResult<Value, SyncError> {
        let fetched = fetch::<Board>(ctx, &ScopeKey::boards()).await;
        ExecutionResult::Unlogged {
            value: json!({
                "count": fetched.items.len(),
                "boards": fetched.items,
                "source": fetched.source,
            }),
        }
    }
}
