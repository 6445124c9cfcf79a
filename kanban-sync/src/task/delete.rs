//! DeleteTask command

use crate::context::SyncContext;
use crate::coordinator::{self, output, settle};
use crate::error::SyncError;
use crate::types::{EntityId, ScopeKey, Task};
use kanban_operations::{async_trait, operation, Execute, ExecutionResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Instant;

/// Delete a task
#[operation(verb = "delete", noun = "task", description = "Delete a task")]
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeleteTask {
    pub column_id: EntityId,
    pub id: EntityId,
}

impl DeleteTask {
    pub fn new(column_id: impl Into<EntityId>, id: impl Into<EntityId>) -> Self {
        Self {
            column_id: column_id.into(),
            id: id.into(),
        }
    }
}

#[async_trait]
impl Execute<SyncContext, SyncError> for DeleteTask {
    async fn execute(&self, ctx: &SyncContext) -> ExecutionResult<Value, SyncError> {
        let start = Instant::now();
        let scope = ScopeKey::tasks(&self.column_id);
        let result =
            async { output(coordinator::delete::<Task>(ctx, &scope, &self.id).await?) }.await;
        settle(self, start, &[scope], result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_delete_renumbers() {
        let ctx = SyncContext::in_memory();
        ctx.write_through(
            &ScopeKey::tasks("c"),
            vec![
                Task::new("a", "A", "c").with_position(0),
                Task::new("b", "B", "c").with_position(1),
                Task::new("d", "D", "c").with_position(2),
            ],
        );
        let value = DeleteTask::new("c", "a").execute(&ctx).await.into_result().unwrap();
        assert_eq!(value["id"], "a");
        let positions: Vec<_> = ctx
            .tasks(&EntityId::from("c"))
            .iter()
            .map(|t| t.position)
            .collect();
        assert_eq!(positions, vec![Some(0), Some(1)]);
    }
}
