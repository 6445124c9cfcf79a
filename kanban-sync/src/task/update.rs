//! UpdateTask command

use crate::context::SyncContext;
use crate::coordinator::{self, output, settle};
use crate::error::SyncError;
use crate::types::{EntityId, EntityPatch, ScopeKey, Task};
use kanban_operations::{async_trait, operation, Execute, ExecutionResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Instant;

/// Edit a task's title and/or description
#[operation(verb = "update", noun = "task", description = "Edit a task's title or description")]
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpdateTask {
    pub column_id: EntityId,
    pub id: EntityId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl UpdateTask {
    pub fn new(column_id: impl Into<EntityId>, id: impl Into<EntityId>) -> Self {
        Self {
            column_id: column_id.into(),
            id: id.into(),
            title: None,
            description: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

#[async_trait]
impl Execute<SyncContext, SyncError> for UpdateTask {
    async fn execute(&self, ctx: &SyncContext) -> ExecutionResult<Value, SyncError> {
        let start = Instant::now();
        let scope = ScopeKey::tasks(&self.column_id);
        let result = async {
            let patch = EntityPatch {
                title: self.title.clone(),
                description: self.description.clone(),
            };
            output(coordinator::rename::<Task>(ctx, &scope, &self.id, &patch).await?)
        }
        .await;
        settle(self, start, &[scope], result)
    }
}
