//! ListTasks command

use crate::context::SyncContext;
use crate::error::SyncError;
use crate::query::fetch;
use crate::types::{EntityId, ScopeKey, Task};
use kanban_operations::{async_trait, operation, Execute, ExecutionResult};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// List one column's tasks
#[operation(
    verb = "list",
    noun = "tasks",
    description = "List a column's tasks ordered by position"
)]
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ListTasks {
    pub column_id: EntityId,
}

impl ListTasks {
    pub fn new(column_id: impl Into<EntityId>) -> Self {
        Self {
            column_id: column_id.into(),
        }
    }
}

#[async_trait]
impl Execute<SyncContext, SyncError> for ListTasks {
    async fn execute(&self, ctx: &SyncContext) -> ExecutionResult<Value, SyncError> {
        let fetched = fetch::<Task>(ctx, &ScopeKey::tasks(&self.column_id)).await;
        ExecutionResult::Unlogged {
            value: json!({
                "count": fetched.items.len(),
                "tasks": fetched.items,
                "source": fetched.source,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeRemote;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_list_tasks_from_remote() {
        let remote = Arc::new(FakeRemote::new());
        remote.seed_tasks("5", ["a", "b"]);
        remote.seed_tasks("6", ["c"]);
        let ctx = SyncContext::in_memory().with_remote(remote);
        let value = ListTasks::new("5").execute(&ctx).await.into_result().unwrap();
        assert_eq!(value["count"], 2);
        assert_eq!(value["source"], "remote");
    }
}
