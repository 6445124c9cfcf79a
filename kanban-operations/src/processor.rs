//! Processor abstraction: run an operation and take care of its log entry

use crate::Execute;
use async_trait::async_trait;
use serde_json::Value;

/// Runs operations on behalf of an actor.
///
/// Implementations decide where the `LogEntry` of a logged operation goes;
/// callers only see the plain result.
#[async_trait]
pub trait OperationProcessor<C, E>: Send + Sync
where
    C: Send + Sync,
    E: Send,
{
    async fn process<O>(&self, operation: &O, ctx: &C) -> Result<Value, E>
    where
        O: Execute<C, E>;
}
