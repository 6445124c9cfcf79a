//! In-memory stand-in for the remote API
//!
//! `FakeRemote` behaves like the real server where the engine can tell the
//! difference: numeric ids assigned on create, a flat task collection,
//! positions assigned at the end of the sibling list, child records removed
//! with their parent. Tests script it with failure injection and a gate
//! that parks requests in flight.

use crate::error::RemoteError;
use crate::remote::RemoteApi;
use crate::types::{EntityId, EntityKind};
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use tokio::sync::watch;

/// One call received by the fake
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteCall {
    /// `list`, `create`, `update` or `delete`
    pub method: &'static str,
    pub kind: EntityKind,
    pub id: Option<EntityId>,
    pub body: Option<Value>,
}

#[derive(Default)]
struct FakeState {
    next_id: u64,
    boards: Vec<Value>,
    columns: Vec<Value>,
    tasks: Vec<Value>,
    failures: VecDeque<u16>,
    failing: Option<u16>,
    garble_next: bool,
    calls: Vec<RemoteCall>,
}

impl FakeState {
    fn records(&mut self, kind: EntityKind) -> &mut Vec<Value> {
        match kind {
            EntityKind::Board => &mut self.boards,
            EntityKind::Column => &mut self.columns,
            EntityKind::Task => &mut self.tasks,
        }
    }

    fn insert(&mut self, kind: EntityKind, fields: Value) -> Value {
        self.next_id += 1;
        let mut record = match fields {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        record.insert("id".into(), json!(self.next_id));
        let parent = kind
            .parent_field()
            .and_then(|field| record.get(field).cloned());
        let siblings = self
            .records(kind)
            .iter()
            .filter(|r| match (kind.parent_field(), &parent) {
                (Some(field), Some(parent)) => r.get(field) == Some(parent),
                _ => true,
            })
            .count();
        record.entry("position").or_insert(json!(siblings));
        let record = Value::Object(record);
        self.records(kind).push(record.clone());
        record
    }

    fn remove_children(&mut self, kind: EntityKind, id: &EntityId) {
        match kind {
            EntityKind::Board => {
                let columns: Vec<String> = self
                    .columns
                    .iter()
                    .filter(|c| value_is(c.get("boardId"), id.as_str()))
                    .filter_map(|c| c.get("id").map(value_text))
                    .collect();
                self.columns
                    .retain(|c| !value_is(c.get("boardId"), id.as_str()));
                self.tasks.retain(|t| {
                    !columns
                        .iter()
                        .any(|column| value_is(t.get("columnId"), column))
                });
            }
            EntityKind::Column => self
                .tasks
                .retain(|t| !value_is(t.get("columnId"), id.as_str())),
            EntityKind::Task => {}
        }
    }
}

/// Scriptable in-memory [`RemoteApi`]
pub struct FakeRemote {
    state: Mutex<FakeState>,
    gate: watch::Sender<bool>,
    parked: watch::Sender<usize>,
}

impl Default for FakeRemote {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeRemote {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(FakeState::default()),
            gate: watch::Sender::new(false),
            parked: watch::Sender::new(0),
        }
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // =========================================================================
    // Seeding and inspection
    // =========================================================================

    /// Create boards directly, bypassing the call log
    pub fn seed_boards<I, S>(&self, titles: I) -> Vec<EntityId>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.seed(EntityKind::Board, None, titles)
    }

    pub fn seed_columns<I, S>(&self, board_id: impl Into<EntityId>, titles: I) -> Vec<EntityId>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.seed(EntityKind::Column, Some(board_id.into()), titles)
    }

    pub fn seed_tasks<I, S>(&self, column_id: impl Into<EntityId>, titles: I) -> Vec<EntityId>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.seed(EntityKind::Task, Some(column_id.into()), titles)
    }

    fn seed<I, S>(&self, kind: EntityKind, parent: Option<EntityId>, titles: I) -> Vec<EntityId>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut state = self.state();
        titles
            .into_iter()
            .map(|title| {
                let mut fields = Map::new();
                fields.insert("title".into(), Value::String(title.into()));
                if let (Some(field), Some(parent)) = (kind.parent_field(), &parent) {
                    fields.insert(field.into(), json!(parent.as_str()));
                }
                if kind == EntityKind::Task {
                    fields.insert("description".into(), Value::Null);
                }
                let record = state.insert(kind, Value::Object(fields));
                EntityId::from_string(record.get("id").map(value_text).unwrap_or_default())
            })
            .collect()
    }

    /// The server's copy of one record
    pub fn record(&self, kind: EntityKind, id: &EntityId) -> Option<Value> {
        self.state()
            .records(kind)
            .iter()
            .find(|r| value_is(r.get("id"), id.as_str()))
            .cloned()
    }

    /// Every record of a kind, in insertion order
    pub fn records(&self, kind: EntityKind) -> Vec<Value> {
        self.state().records(kind).clone()
    }

    /// Calls received so far, oldest first
    pub fn calls(&self) -> Vec<RemoteCall> {
        self.state().calls.clone()
    }

    /// Calls other than `list`
    pub fn writes(&self) -> Vec<RemoteCall> {
        self.calls()
            .into_iter()
            .filter(|call| call.method != "list")
            .collect()
    }

    // =========================================================================
    // Scripting
    // =========================================================================

    /// Answer the next call with this HTTP status
    pub fn fail_next(&self, status: u16) {
        self.state().failures.push_back(status);
    }

    /// Answer every call with this status until [`recover`](Self::recover)
    pub fn fail_all(&self, status: u16) {
        self.state().failing = Some(status);
    }

    pub fn recover(&self) {
        let mut state = self.state();
        state.failing = None;
        state.failures.clear();
    }

    /// Answer the next successful call with a body that is not a record
    pub fn garble_next(&self) {
        self.state().garble_next = true;
    }

    /// Park every subsequent call until [`release`](Self::release)
    pub fn hold(&self) {
        self.gate.send_replace(true);
    }

    pub fn release(&self) {
        self.gate.send_replace(false);
    }

    /// Wait until `count` calls have been parked since the fake was created
    pub async fn wait_for_held(&self, count: usize) {
        let mut parked = self.parked.subscribe();
        let _ = parked.wait_for(|n| *n >= count).await;
    }

    async fn pass_gate(&self) {
        let mut gate = self.gate.subscribe();
        if !*gate.borrow_and_update() {
            return;
        }
        self.parked.send_modify(|n| *n += 1);
        let _ = gate.wait_for(|held| !*held).await;
    }

    /// Record the call, then apply any scripted failure
    fn begin(&self, call: RemoteCall) -> Result<(), RemoteError> {
        let mut state = self.state();
        let kind = call.kind;
        state.calls.push(call);
        let status = state.failures.pop_front().or(state.failing);
        match status {
            Some(status) => Err(RemoteError::Status {
                status,
                url: format!("fake://{}", kind.collection()),
            }),
            None => Ok(()),
        }
    }

    fn finish(&self, value: Value) -> Value {
        let mut state = self.state();
        if std::mem::take(&mut state.garble_next) {
            return json!("garbled");
        }
        value
    }
}

#[async_trait]
impl RemoteApi for FakeRemote {
    async fn list(
        &self,
        kind: EntityKind,
        parent: Option<&EntityId>,
    ) -> Result<Value, RemoteError> {
        self.pass_gate().await;
        self.begin(RemoteCall {
            method: "list",
            kind,
            id: parent.cloned(),
            body: None,
        })?;
        let mut records = self.records(kind);
        // Only columns are filtered server-side; tasks are a flat collection.
        if let (EntityKind::Column, Some(board_id)) = (kind, parent) {
            records.retain(|r| value_is(r.get("boardId"), board_id.as_str()));
        }
        Ok(self.finish(Value::Array(records)))
    }

    async fn create(&self, kind: EntityKind, fields: Value) -> Result<Value, RemoteError> {
        self.pass_gate().await;
        self.begin(RemoteCall {
            method: "create",
            kind,
            id: None,
            body: Some(fields.clone()),
        })?;
        let record = self.state().insert(kind, fields);
        Ok(self.finish(record))
    }

    async fn update(
        &self,
        kind: EntityKind,
        id: &EntityId,
        patch: Value,
    ) -> Result<Value, RemoteError> {
        self.pass_gate().await;
        self.begin(RemoteCall {
            method: "update",
            kind,
            id: Some(id.clone()),
            body: Some(patch.clone()),
        })?;
        let updated = {
            let mut state = self.state();
            let record = state
                .records(kind)
                .iter_mut()
                .find(|r| value_is(r.get("id"), id.as_str()));
            match (record, patch) {
                (Some(Value::Object(record)), Value::Object(patch)) => {
                    for (key, value) in patch {
                        record.insert(key, value);
                    }
                    Some(Value::Object(record.clone()))
                }
                (Some(record), _) => Some(record.clone()),
                (None, _) => None,
            }
        };
        match updated {
            Some(record) => Ok(self.finish(record)),
            None => Err(RemoteError::Status {
                status: 404,
                url: format!("fake://{}/{}", kind.collection(), id),
            }),
        }
    }

    async fn delete(&self, kind: EntityKind, id: &EntityId) -> Result<(), RemoteError> {
        self.pass_gate().await;
        self.begin(RemoteCall {
            method: "delete",
            kind,
            id: Some(id.clone()),
            body: None,
        })?;
        let mut state = self.state();
        let records = state.records(kind);
        let before = records.len();
        records.retain(|r| !value_is(r.get("id"), id.as_str()));
        if records.len() == before {
            return Err(RemoteError::Status {
                status: 404,
                url: format!("fake://{}/{}", kind.collection(), id),
            });
        }
        state.remove_children(kind, id);
        Ok(())
    }
}

/// Compare a JSON id or foreign key with a normalized id
fn value_is(value: Option<&Value>, id: &str) -> bool {
    value.is_some_and(|v| value_text(v) == id)
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
