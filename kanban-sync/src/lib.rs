//! Optimistic reordering and cache reconciliation for kanban boards
//!
//! This crate keeps boards, columns and tasks ordered on the client while a
//! remote REST API remains the source of truth for content. Every mutation
//! is applied to the cache and a durable mirror before the request is sent,
//! and is rolled back if the remote rejects it.
//!
//! ## Overview
//!
//! - **Scopes** - each ordered sibling group (`boards`, `columns:<boardId>`,
//!   `tasks:<columnId>`) is one cache entry and one mirror key
//! - **Positions are local** - fetched lists are reconciled against the
//!   positions the user last saw, then renumbered `0..n`
//! - **Optimistic commands** - snapshot, apply, then settle or roll back; a
//!   newer command on the same scope wins over an older rollback
//! - **Operations** - every command and query is a struct executed against a
//!   [`SyncContext`]
//!
//! ## Basic Usage
//!
//! ```rust,no_run
//! use kanban_sync::{column::{AddColumn, MoveColumn}, Execute, SyncConfig, SyncContext};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let ctx = SyncContext::from_config(&SyncConfig::load()?)?;
//!
//! let todo = AddColumn::new("1", "Todo").execute(&ctx).await.into_result()?;
//! MoveColumn::new("1", todo["id"].as_str().unwrap_or_default(), 0)
//!     .execute(&ctx)
//!     .await
//!     .into_result()?;
//! # Ok(())
//! # }
//! ```
//!
//! Without an `api_base_url` the context runs local-only: mutations settle
//! immediately and ids are generated locally.

pub mod cache;
pub mod config;
mod context;
pub mod coordinator;
pub mod drag;
mod error;
pub mod logging;
pub mod mirror;
pub mod ordering;
mod processor;
pub mod query;
pub mod reconcile;
pub mod remote;
pub mod transport;
pub mod types;
pub mod validate;

// Command modules
pub mod board;
pub mod column;
pub mod task;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use kanban_operations::{
    async_trait, Execute, ExecutionResult, LogEntry, Operation, OperationProcessor,
};

pub use cache::{EntityCache, ScopeStore, ScopeStoreExt};
pub use config::{RetryConfig, SyncConfig};
pub use context::SyncContext;
pub use drag::{DragEvent, DropItem};
pub use error::{RemoteError, Result, StorageError, SyncError};
pub use logging::{init_tracing, Pretty};
pub use mirror::{DurableMirror, FileKeyValueStore, KeyValueStore, MemoryKeyValueStore};
pub use processor::{SyncOperationProcessor, DEFAULT_ACTIVITY_CAPACITY};
pub use query::{fetch, fetch_board, FetchSource, Fetched};
pub use remote::RemoteApi;
pub use transport::HttpRemote;

pub use types::{
    Board, CachedList, Column, Draft, Entity, EntityId, EntityKind, EntityPatch, ScopeKey, Task,
};
