//! Drag-end events and the operation that applies them
//!
//! A drag library reports where an item left and where it landed. `DropItem`
//! turns that into the matching move: boards and columns reorder inside
//! their own scope, tasks may also change column.

use crate::context::SyncContext;
use crate::coordinator::{self, output, settle};
use crate::error::{Result, SyncError};
use crate::types::{Board, Column, EntityId, EntityKind, ScopeKey, Task};
use kanban_operations::{async_trait, operation, Execute, ExecutionResult};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Instant;
use tracing::debug;

/// The end of one drag gesture
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DragEvent {
    pub item_id: EntityId,
    pub source_scope: ScopeKey,
    pub source_index: usize,
    pub dest_scope: ScopeKey,
    pub dest_index: usize,
}

impl DragEvent {
    /// A drop back onto the spot it came from
    pub fn is_noop(&self) -> bool {
        self.source_scope == self.dest_scope && self.source_index == self.dest_index
    }

    /// Scopes a drop may write
    pub fn scopes(&self) -> Vec<ScopeKey> {
        if self.source_scope == self.dest_scope {
            vec![self.source_scope.clone()]
        } else {
            vec![self.source_scope.clone(), self.dest_scope.clone()]
        }
    }
}

/// Apply a drag-end event
#[operation(
    verb = "drop",
    noun = "item",
    description = "Apply a finished drag to boards, columns or tasks"
)]
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DropItem {
    #[serde(flatten)]
    pub event: DragEvent,
}

impl DropItem {
    pub fn new(event: DragEvent) -> Self {
        Self { event }
    }

    async fn dispatch(&self, ctx: &SyncContext) -> Result<Option<Value>> {
        let event = &self.event;
        let kind = event.source_scope.kind();
        if kind != event.dest_scope.kind() {
            return Err(SyncError::validation(
                "dest_scope",
                format!("cannot drop a {} into {}", kind, event.dest_scope),
            ));
        }

        match kind {
            EntityKind::Board => output(
                coordinator::move_within::<Board>(
                    ctx,
                    &event.dest_scope,
                    &event.item_id,
                    event.dest_index,
                )
                .await?,
            ),
            EntityKind::Column => {
                if event.source_scope != event.dest_scope {
                    return Err(SyncError::validation(
                        "dest_scope",
                        "columns can only be reordered within their board",
                    ));
                }
                output(
                    coordinator::move_within::<Column>(
                        ctx,
                        &event.dest_scope,
                        &event.item_id,
                        event.dest_index,
                    )
                    .await?,
                )
            }
            EntityKind::Task => output(
                coordinator::move_across::<Task>(
                    ctx,
                    &event.source_scope,
                    &event.dest_scope,
                    &event.item_id,
                    event.dest_index,
                )
                .await?,
            ),
        }
    }
}

#[async_trait]
impl Execute<SyncContext, SyncError> for DropItem {
    async fn execute(&self, ctx: &SyncContext) -> ExecutionResult<Value, SyncError> {
        if self.event.is_noop() {
            debug!(
                item = %self.event.item_id,
                scope = %self.event.source_scope,
                "drop onto origin ignored"
            );
            return ExecutionResult::Unlogged {
                value: json!({ "noop": true }),
            };
        }
        let start = Instant::now();
        let result = self.dispatch(ctx).await;
        settle(self, start, &self.event.scopes(), result)
    }
}
