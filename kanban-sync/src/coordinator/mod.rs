//! Mutation coordinator
//!
//! Every mutation follows the same shape: read the scope as the user sees
//! it, compute the new order with the ordering kernel, write cache and
//! mirror at once, then await the remote. Success merges the server's
//! fields back (keeping local positions); failure restores the snapshots.
//!
//! Absent ids and moves to the current index settle as no-ops (`Ok(None)`)
//! without writing anything or calling the remote.

mod command;
mod ledger;

pub use command::{MutationState, OptimisticCommand};
pub use ledger::OperationLedger;

use crate::cache::ScopeStoreExt;
use crate::context::SyncContext;
use crate::error::{Result, SyncError};
use crate::ordering::{clamp, move_item, renumber_positions};
use crate::types::{Draft, Entity, EntityId, EntityPatch, ScopeKey};
use crate::validate::decode_entity;
use kanban_operations::{ExecutionResult, LogEntry, Operation};
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Create an entity under `parent` and append it to its scope.
///
/// Nothing is inserted before the remote answers, since the server assigns
/// the id. Without a remote the id is a fresh ULID.
pub async fn create<E: Entity>(
    ctx: &SyncContext,
    parent: Option<&EntityId>,
    draft: &Draft,
) -> Result<E> {
    let draft = draft.validated()?;
    let scope = scope_for::<E>(parent)?;
    let op = format!("add {}", E::KIND);

    let mut entity: E = match ctx.remote() {
        None => E::new_local(EntityId::generate(), parent, &draft),
        Some(remote) => {
            let fields = E::create_fields(parent, &draft);
            let value = remote
                .create(E::KIND, fields)
                .await
                .map_err(|e| SyncError::remote_write(op.as_str(), e))?;
            decode_entity(value).inspect_err(|e| {
                warn!(
                    op = %op,
                    %scope,
                    error = %e,
                    "server accepted the create but its response did not decode; not cached"
                );
            })?
        }
    };
    if let Some(parent) = parent {
        entity.set_parent_id(parent.clone());
    }

    let mut next: Vec<E> = ctx.current::<E>(&scope);
    next.retain(|item| item.id() != entity.id());
    entity.set_position(next.len());
    next.push(entity.clone());

    ctx.store().cancel_reads(&scope);
    ctx.ledger().issue([&scope]);
    ctx.write_through(&scope, renumber_positions(&next));
    ctx.store().invalidate(&scope);
    info!(op = %op, id = %entity.id(), %scope, "created");
    Ok(entity)
}

/// Patch non-order fields of one entity
pub async fn rename<E: Entity>(
    ctx: &SyncContext,
    scope: &ScopeKey,
    id: &EntityId,
    patch: &EntityPatch,
) -> Result<Option<E>> {
    let patch = patch.validated()?;
    if patch.is_empty() {
        return Ok(None);
    }
    let op = format!("update {}", E::KIND);

    let current = ctx.current::<E>(scope);
    let Some(index) = index_of(&current, id) else {
        debug!(op = %op, %id, %scope, "not in scope, nothing to do");
        return Ok(None);
    };
    let mut next = current.clone();
    next[index].apply_patch(&patch);
    if next[index] == current[index] {
        return Ok(None);
    }

    let body = serde_json::to_value(&patch)?;
    let mut cmd = OptimisticCommand::capture(ctx, op.as_str(), std::slice::from_ref(scope));
    cmd.stage_write(scope, next.clone());
    cmd.apply();

    let optimistic = next[index].clone();
    settle_update(ctx, &mut cmd, &op, scope, optimistic, body).await.map(Some)
}

/// Move one entity to `to_index` inside its own scope
pub async fn move_within<E: Entity>(
    ctx: &SyncContext,
    scope: &ScopeKey,
    id: &EntityId,
    to_index: usize,
) -> Result<Option<E>> {
    let op = format!("move {}", E::KIND);
    let current = ctx.current::<E>(scope);
    let Some(from) = index_of(&current, id) else {
        debug!(op = %op, %id, %scope, "not in scope, nothing to do");
        return Ok(None);
    };
    let to = clamp(to_index, 0, current.len() - 1);
    if from == to {
        return Ok(None);
    }

    let next = renumber_positions(&move_item(&current, from, to));
    let body = move_body::<E>(to, scope.parent());
    let mut cmd = OptimisticCommand::capture(ctx, op.as_str(), std::slice::from_ref(scope));
    cmd.stage_write(scope, next.clone());
    cmd.apply();

    let optimistic = next[to].clone();
    settle_update(ctx, &mut cmd, &op, scope, optimistic, body).await.map(Some)
}

/// Move one entity from `from_scope` into `to_scope` at `to_index`,
/// rewriting its parent key
pub async fn move_across<E: Entity>(
    ctx: &SyncContext,
    from_scope: &ScopeKey,
    to_scope: &ScopeKey,
    id: &EntityId,
    to_index: usize,
) -> Result<Option<E>> {
    if from_scope == to_scope {
        return move_within(ctx, from_scope, id, to_index).await;
    }
    for scope in [from_scope, to_scope] {
        if scope.kind() != E::KIND {
            return Err(SyncError::validation(
                "scope",
                format!("{} does not hold {}s", scope, E::KIND),
            ));
        }
    }
    let op = format!("move {}", E::KIND);

    let source = ctx.current::<E>(from_scope);
    let Some(from) = index_of(&source, id) else {
        debug!(op = %op, %id, scope = %from_scope, "not in scope, nothing to do");
        return Ok(None);
    };

    let mut source_next = source.clone();
    let mut item = source_next.remove(from);
    let source_next = renumber_positions(&source_next);

    if let Some(parent) = to_scope.parent() {
        item.set_parent_id(parent.clone());
    }
    let mut dest_next: Vec<E> = ctx
        .current::<E>(to_scope)
        .into_iter()
        .filter(|existing| existing.id() != id)
        .collect();
    let to = clamp(to_index, 0, dest_next.len());
    dest_next.insert(to, item);
    let dest_next = renumber_positions(&dest_next);

    let body = move_body::<E>(to, to_scope.parent());
    let mut cmd = OptimisticCommand::capture(
        ctx,
        op.as_str(),
        &[from_scope.clone(), to_scope.clone()],
    );
    cmd.stage_write(from_scope, source_next);
    cmd.stage_write(to_scope, dest_next.clone());
    cmd.apply();

    let optimistic = dest_next[to].clone();
    settle_update(ctx, &mut cmd, &op, to_scope, optimistic, body).await.map(Some)
}

/// Remove one entity and everything it owns
pub async fn delete<E: Entity>(
    ctx: &SyncContext,
    scope: &ScopeKey,
    id: &EntityId,
) -> Result<Option<E>> {
    let op = format!("delete {}", E::KIND);
    let current = ctx.current::<E>(scope);
    let Some(index) = index_of(&current, id) else {
        debug!(op = %op, %id, %scope, "not in scope, nothing to do");
        return Ok(None);
    };

    let mut next = current;
    let removed = next.remove(index);
    let next = renumber_positions(&next);
    let children = ctx.child_scopes(E::KIND, id);

    let mut cmd = OptimisticCommand::capture(ctx, op.as_str(), std::slice::from_ref(scope));
    cmd.stage_write(scope, next);
    for child in &children {
        cmd.stage_remove(child);
    }
    cmd.apply();

    let Some(remote) = ctx.remote() else {
        cmd.succeed();
        info!(op = %op, %id, cascaded = children.len(), "deleted locally");
        return Ok(Some(removed));
    };

    match remote.delete(E::KIND, id).await {
        Ok(()) => {
            cmd.succeed();
            info!(op = %op, %id, cascaded = children.len(), "deleted");
            Ok(Some(removed))
        }
        Err(e) => {
            cmd.rollback();
            Err(SyncError::remote_write(op, e))
        }
    }
}

/// Await the remote update for an applied command and settle it
async fn settle_update<E: Entity>(
    ctx: &SyncContext,
    cmd: &mut OptimisticCommand<'_>,
    op: &str,
    scope: &ScopeKey,
    optimistic: E,
    body: Value,
) -> Result<E> {
    let Some(remote) = ctx.remote() else {
        cmd.succeed();
        info!(op, id = %optimistic.id(), "settled locally");
        return Ok(optimistic);
    };

    match remote.update(E::KIND, optimistic.id(), body).await {
        Ok(response) => {
            cmd.succeed();
            let settled = if cmd.owns(scope) {
                merge_response(ctx, scope, &optimistic, response)
            } else {
                debug!(op, %scope, "newer write on scope, not merging response");
                optimistic
            };
            info!(op, id = %settled.id(), "settled");
            Ok(settled)
        }
        Err(e) => {
            cmd.rollback();
            Err(SyncError::remote_write(op, e))
        }
    }
}

/// Fold the server's record into the cached copy, keeping position and
/// parent. An undecodable response leaves the optimistic state in place.
fn merge_response<E: Entity>(
    ctx: &SyncContext,
    scope: &ScopeKey,
    optimistic: &E,
    response: Value,
) -> E {
    let server = match decode_entity::<E>(response) {
        Ok(server) => server,
        Err(e) => {
            warn!(
                %scope,
                id = %optimistic.id(),
                error = %e,
                "keeping optimistic state: server response did not decode"
            );
            return optimistic.clone();
        }
    };
    if server.id() != optimistic.id() {
        warn!(
            %scope,
            id = %optimistic.id(),
            server_id = %server.id(),
            "server answered for another id"
        );
        return optimistic.clone();
    }

    let merge = |local: E| {
        let mut merged = local.merge_server(server.clone());
        if let Some(parent) = local.parent_id() {
            merged.set_parent_id(parent.clone());
        }
        merged
    };
    let Some(list) = ctx
        .store()
        .patch(scope, |item: &E| item.id() == optimistic.id(), merge)
    else {
        return optimistic.clone();
    };
    ctx.mirror().save(scope, &list);
    list.into_iter()
        .find(|item| item.id() == optimistic.id())
        .unwrap_or_else(|| optimistic.clone())
}

/// `{"position": n, "<parentField>": "<parent>"}`
fn move_body<E: Entity>(position: usize, parent: Option<&EntityId>) -> Value {
    let mut body = Map::new();
    body.insert("position".into(), json!(position));
    if let (Some(field), Some(parent)) = (E::KIND.parent_field(), parent) {
        body.insert(field.into(), json!(parent.as_str()));
    }
    Value::Object(body)
}

fn scope_for<E: Entity>(parent: Option<&EntityId>) -> Result<ScopeKey> {
    ScopeKey::for_kind(E::KIND, parent).ok_or_else(|| {
        SyncError::validation(
            E::KIND.parent_field().unwrap_or("parent"),
            format!("a {} needs a parent id", E::KIND),
        )
    })
}

fn index_of<E: Entity>(list: &[E], id: &EntityId) -> Option<usize> {
    list.iter().position(|item| item.id() == id)
}

/// Serialize a settled entity for an operation's output
pub(crate) fn output<E: Serialize>(entity: Option<E>) -> Result<Option<Value>> {
    Ok(entity.map(|e| serde_json::to_value(e)).transpose()?)
}

/// Turn a coordinator result into the operation's `ExecutionResult`.
///
/// Settled mutations are logged; no-ops and validation failures are not,
/// since neither touched any state. Remote failures are logged with the
/// error as output.
pub(crate) fn settle<O>(
    operation: &O,
    start: Instant,
    scopes: &[ScopeKey],
    result: Result<Option<Value>>,
) -> ExecutionResult<Value, SyncError>
where
    O: Operation + Serialize,
{
    let duration_ms = start.elapsed().as_millis() as u64;
    let input = serde_json::to_value(operation).unwrap_or(Value::Null);

    match result {
        Ok(Some(value)) => ExecutionResult::Logged {
            value: value.clone(),
            log_entry: LogEntry::new(operation.op_string(), input, value, None, duration_ms)
                .with_scopes(scopes),
        },
        Ok(None) => ExecutionResult::Unlogged {
            value: json!({ "noop": true }),
        },
        Err(error) if error.is_validation() => ExecutionResult::Failed {
            error,
            log_entry: None,
        },
        Err(error) => {
            let output = json!({ "error": error.to_string() });
            ExecutionResult::Failed {
                error,
                log_entry: Some(
                    LogEntry::new(operation.op_string(), input, output, None, duration_ms)
                        .with_scopes(scopes),
                ),
            }
        }
    }
}
