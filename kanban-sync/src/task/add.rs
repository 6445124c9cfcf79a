//! AddTask command

use crate::context::SyncContext;
use crate::coordinator::{self, output, settle};
use crate::error::SyncError;
use crate::types::{Draft, EntityId, ScopeKey, Task};
use kanban_operations::{async_trait, operation, Execute, ExecutionResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Instant;

/// Add a new task to the bottom of a column
#[operation(verb = "add", noun = "task", description = "Add a new task to a column")]
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AddTask {
    /// The column the task is created in
    pub column_id: EntityId,
    /// The task title
    pub title: String,
    /// Optional free text; sent as an empty string when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl AddTask {
    /// Create a new AddTask command
    pub fn new(column_id: impl Into<EntityId>, title: impl Into<String>) -> Self {
        Self {
            column_id: column_id.into(),
            title: title.into(),
            description: None,
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    fn draft(&self) -> Draft {
        let draft = Draft::new(&self.title);
        match &self.description {
            Some(description) => draft.with_description(description),
            None => draft,
        }
    }
}

#[async_trait]
impl Execute<SyncContext, SyncError> for AddTask {
    async fn execute(&self, ctx: &SyncContext) -> ExecutionResult<Value, SyncError> {
        let start = Instant::now();
        let result = async {
            let task =
                coordinator::create::<Task>(ctx, Some(&self.column_id), &self.draft()).await?;
            output(Some(task))
        }
        .await;
        settle(self, start, &[ScopeKey::tasks(&self.column_id)], result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeRemote;
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_add_task_sends_empty_description() {
        let remote = Arc::new(FakeRemote::new());
        let ctx = SyncContext::in_memory().with_remote(remote.clone());

        let value = AddTask::new("3", "Write docs")
            .execute(&ctx)
            .await
            .into_result()
            .unwrap();
        assert_eq!(value["columnId"], "3");
        assert_eq!(
            remote.calls()[0].body,
            Some(json!({"title": "Write docs", "columnId": "3", "description": ""}))
        );
    }

    #[tokio::test]
    async fn test_add_task_local_keeps_description() {
        let ctx = SyncContext::in_memory();
        let value = AddTask::new("c", "Fix")
            .with_description(" details ")
            .execute(&ctx)
            .await
            .into_result()
            .unwrap();
        assert_eq!(value["description"], "details");
        assert_eq!(ctx.tasks(&EntityId::from("c")).len(), 1);
    }
}
