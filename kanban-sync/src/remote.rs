//! Boundary to the remote store

use crate::error::RemoteError;
use crate::types::{EntityId, EntityKind};
use async_trait::async_trait;
use serde_json::Value;

/// The remote CRUD API for boards, columns and tasks.
///
/// Payloads are raw JSON; decoding and id normalization happen in the core.
#[async_trait]
pub trait RemoteApi: Send + Sync {
    /// List a collection. `parent` narrows columns to a board; the task
    /// collection is flat and is filtered by the caller.
    async fn list(&self, kind: EntityKind, parent: Option<&EntityId>) -> Result<Value, RemoteError>;

    /// Create an entity, returning the server's record with its assigned id
    async fn create(&self, kind: EntityKind, fields: Value) -> Result<Value, RemoteError>;

    /// Partially update an entity, returning the server's record
    async fn update(
        &self,
        kind: EntityKind,
        id: &EntityId,
        patch: Value,
    ) -> Result<Value, RemoteError>;

    async fn delete(&self, kind: EntityKind, id: &EntityId) -> Result<(), RemoteError>;
}
