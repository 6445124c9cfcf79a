//! MoveTask command

use crate::context::SyncContext;
use crate::coordinator::{self, output, settle};
use crate::error::SyncError;
use crate::types::{EntityId, ScopeKey, Task};
use kanban_operations::{async_trait, operation, Execute, ExecutionResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Instant;

/// Move a task within its column or into another column
#[operation(
    verb = "move",
    noun = "task",
    description = "Move a task to a different column or position"
)]
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MoveTask {
    /// The task to move
    pub id: EntityId,
    /// Column the task is in now
    pub from_column: EntityId,
    /// Column the task should end up in; may equal `from_column`
    pub to_column: EntityId,
    /// Index in the destination column, clamped
    pub to_index: usize,
}

impl MoveTask {
    /// Reorder a task inside one column
    pub fn within(column: impl Into<EntityId>, id: impl Into<EntityId>, to_index: usize) -> Self {
        let column = column.into();
        Self {
            id: id.into(),
            from_column: column.clone(),
            to_column: column,
            to_index,
        }
    }

    /// Move a task into another column
    pub fn across(
        id: impl Into<EntityId>,
        from_column: impl Into<EntityId>,
        to_column: impl Into<EntityId>,
        to_index: usize,
    ) -> Self {
        Self {
            id: id.into(),
            from_column: from_column.into(),
            to_column: to_column.into(),
            to_index,
        }
    }

    fn scopes(&self) -> Vec<ScopeKey> {
        let from = ScopeKey::tasks(&self.from_column);
        let to = ScopeKey::tasks(&self.to_column);
        if from == to {
            vec![from]
        } else {
            vec![from, to]
        }
    }
}

#[async_trait]
impl Execute<SyncContext, SyncError> for MoveTask {
    async fn execute(&self, ctx: &SyncContext) -> ExecutionResult<Value, SyncError> {
        let start = Instant::now();
        let from = ScopeKey::tasks(&self.from_column);
        let to = ScopeKey::tasks(&self.to_column);
        let result = async {
            output(
                coordinator::move_across::<Task>(ctx, &from, &to, &self.id, self.to_index).await?,
            )
        }
        .await;
        settle(self, start, &self.scopes(), result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeRemote;
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_cross_column_move_single_update() {
        let remote = Arc::new(FakeRemote::new());
        let col1 = remote.seed_tasks("1", ["T"]);
        remote.seed_tasks("2", ["X"]);
        let ctx = SyncContext::in_memory().with_remote(remote.clone());
        crate::query::fetch::<Task>(&ctx, &ScopeKey::tasks("1")).await;
        crate::query::fetch::<Task>(&ctx, &ScopeKey::tasks("2")).await;

        let result = MoveTask::across(col1[0].clone(), "1", "2", 0).execute(&ctx).await;
        assert_eq!(
            result.log_entry().unwrap().scopes,
            vec!["tasks:1".to_string(), "tasks:2".to_string()]
        );
        assert_eq!(result.into_result().unwrap()["columnId"], "2");

        let writes = remote.writes();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].body, Some(json!({"position": 0, "columnId": "2"})));
        assert!(ctx.tasks(&EntityId::from("1")).is_empty());
        let titles: Vec<_> = ctx.tasks(&EntityId::from("2")).into_iter().map(|t| t.title).collect();
        assert_eq!(titles, vec!["T", "X"]);
    }

    #[tokio::test]
    async fn test_failed_cross_column_move_restores_both_columns() {
        let remote = Arc::new(FakeRemote::new());
        let moving = remote.seed_tasks("1", ["T", "U"]);
        remote.seed_tasks("2", ["X"]);
        let ctx = SyncContext::in_memory().with_remote(remote.clone());
        let source = ScopeKey::tasks("1");
        let dest = ScopeKey::tasks("2");
        crate::query::fetch::<Task>(&ctx, &source).await;
        crate::query::fetch::<Task>(&ctx, &dest).await;
        let source_before = ctx.current::<Task>(&source);
        let dest_before = ctx.current::<Task>(&dest);

        remote.fail_next(500);
        let result = MoveTask::across(moving[0].clone(), "1", "2", 0).execute(&ctx).await;
        assert!(result.log_entry().unwrap().is_failure());
        assert!(matches!(
            result.into_result().unwrap_err(),
            SyncError::RemoteWrite { .. }
        ));

        assert_eq!(ctx.current::<Task>(&source), source_before);
        assert_eq!(ctx.current::<Task>(&dest), dest_before);
        assert_eq!(ctx.mirror().load::<Task>(&source).unwrap(), source_before);
        assert_eq!(ctx.mirror().load::<Task>(&dest).unwrap(), dest_before);
    }

    #[tokio::test]
    async fn test_within_column() {
        let ctx = SyncContext::in_memory();
        ctx.write_through(
            &ScopeKey::tasks("c"),
            vec![
                Task::new("a", "A", "c").with_position(0),
                Task::new("b", "B", "c").with_position(1),
            ],
        );
        let result = MoveTask::within("c", "b", 0).execute(&ctx).await;
        assert_eq!(result.log_entry().unwrap().scopes, vec!["tasks:c".to_string()]);
        assert_eq!(ctx.tasks(&EntityId::from("c"))[0].id, "b");
    }
}
