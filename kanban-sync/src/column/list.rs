//! ListColumns command

use crate::context::SyncContext;
use crate::error::SyncError;
use crate::query::fetch;
use crate::types::{Column, EntityId, ScopeKey};
use kanban_operations::{async_trait, operation, Execute, ExecutionResult};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// List a board's columns
#[operation(
    verb = "list",
    noun = "columns",
    description = "List a board's columns ordered by position"
)]
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ListColumns {
    pub board_id: EntityId,
}

impl ListColumns {
    pub fn new(board_id: impl Into<EntityId>) -> Self {
        Self {
            board_id: board_id.into(),
        }
    }
}

#[async_trait]
impl Execute<SyncContext, SyncError> for ListColumns {
    async fn execute(&self, ctx: &SyncContext) -> ExecutionResult<Value, SyncError> {
        let fetched = fetch::<Column>(ctx, &ScopeKey::columns(&self.board_id)).await;
        ExecutionResult::Unlogged {
            value: json!({
                "count": fetched.items.len(),
                "columns": fetched.items,
                "source": fetched.source,
                "error": fetched.error,
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
    async fn test_list_columns_falls_back_on_failure() {
        let remote = Arc::new(FakeRemote::new());
        let ctx = SyncContext::in_memory().with_remote(remote.clone());
        ctx.write_through(
            &ScopeKey::columns("b"),
            vec![Column::new("1", "Todo", "b").with_position(0)],
        );

        remote.fail_all(502);
        let value = ListColumns::new("b").execute(&ctx).await.into_result().unwrap();
        assert_eq!(value["source"], "fallback");
        assert_eq!(value["columns"][0]["title"], "Todo");
        assert!(value["error"].is_string());
    }
}
