//! # kanban-operations
//!
//! The `Operation` trait for defining kanban-sync commands and queries.
//! Operations are structs where the fields ARE the inputs; the
//! `#[operation]` attribute supplies the name.
//!
//! ## Example
//!
//! ```ignore
//! use kanban_operations::*;
//!
//! #[operation(verb = "move", noun = "column", description = "Move a column within its board")]
//! #[derive(Debug, Deserialize, Serialize)]
//! pub struct MoveColumn {
//!     pub board_id: EntityId,
//!     pub id: EntityId,
//!     pub to_index: usize,
//! }
//!
//! #[async_trait]
//! impl Execute<SyncContext, SyncError> for MoveColumn {
//!     async fn execute(&self, ctx: &SyncContext) -> ExecutionResult<Value, SyncError> {
//!         // mutations return ExecutionResult::Logged, reads Unlogged
//!     }
//! }
//! ```

// Lets the `#[operation]` expansion name this crate from inside its own tests.
extern crate self as kanban_operations;

mod execution_result;
mod log;
mod operation;
mod processor;

pub use execution_result::ExecutionResult;
pub use log::LogEntry;
pub use operation::{Execute, Operation};
pub use processor::OperationProcessor;

pub use kanban_operations_macros::operation;

pub use async_trait::async_trait;
pub use serde_json::Value;
