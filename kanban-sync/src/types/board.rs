//! Board-level types: Board and Column

use super::entity::{CachedList, Draft, Entity, EntityKind, EntityPatch};
use super::ids::EntityId;
use crate::ordering::Positioned;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// A kanban board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Board {
    pub id: EntityId,
    pub title: String,
    #[serde(
        default,
        deserialize_with = "deserialize_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
    /// Rank among sibling boards
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<usize>,
    /// Fields the remote sent that this crate does not model
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Board {
    pub fn new(id: impl Into<EntityId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            created_at: None,
            position: None,
            extra: Map::new(),
        }
    }

    pub fn with_position(mut self, position: usize) -> Self {
        self.position = Some(position);
        self
    }
}

impl Positioned for Board {
    fn position(&self) -> Option<usize> {
        self.position
    }

    fn set_position(&mut self, position: usize) {
        self.position = Some(position);
    }

    fn order_id(&self) -> &str {
        self.id.as_str()
    }
}

impl Entity for Board {
    const KIND: EntityKind = EntityKind::Board;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn parent_id(&self) -> Option<&EntityId> {
        None
    }

    fn set_parent_id(&mut self, _parent: EntityId) {}

    fn apply_patch(&mut self, patch: &EntityPatch) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
    }

    fn new_local(id: EntityId, _parent: Option<&EntityId>, draft: &Draft) -> Self {
        let mut board = Self::new(id, draft.title.clone());
        board.created_at = Some(Utc::now());
        board
    }

    fn normalize(&mut self) {
        self.title = self.title.trim().to_string();
    }

    fn wrap(list: Vec<Self>) -> CachedList {
        CachedList::Boards(list)
    }

    fn unwrap(list: CachedList) -> Option<Vec<Self>> {
        match list {
            CachedList::Boards(v) => Some(v),
            _ => None,
        }
    }
}

/// A column (workflow stage) of one board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub id: EntityId,
    pub title: String,
    pub board_id: EntityId,
    /// Rank among the board's columns
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<usize>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Column {
    pub fn new(
        id: impl Into<EntityId>,
        title: impl Into<String>,
        board_id: impl Into<EntityId>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            board_id: board_id.into(),
            position: None,
            extra: Map::new(),
        }
    }

    pub fn with_position(mut self, position: usize) -> Self {
        self.position = Some(position);
        self
    }
}

impl Positioned for Column {
    fn position(&self) -> Option<usize> {
        self.position
    }

    fn set_position(&mut self, position: usize) {
        self.position = Some(position);
    }

    fn order_id(&self) -> &str {
        self.id.as_str()
    }
}

impl Entity for Column {
    const KIND: EntityKind = EntityKind::Column;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn parent_id(&self) -> Option<&EntityId> {
        Some(&self.board_id)
    }

    fn set_parent_id(&mut self, parent: EntityId) {
        self.board_id = parent;
    }

    fn apply_patch(&mut self, patch: &EntityPatch) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
    }

    fn new_local(id: EntityId, parent: Option<&EntityId>, draft: &Draft) -> Self {
        let board_id = parent.cloned().unwrap_or_else(|| EntityId::from(""));
        Self::new(id, draft.title.clone(), board_id)
    }

    fn normalize(&mut self) {
        self.title = self.title.trim().to_string();
    }

    fn wrap(list: Vec<Self>) -> CachedList {
        CachedList::Columns(list)
    }

    fn unwrap(list: CachedList) -> Option<Vec<Self>> {
        match list {
            CachedList::Columns(v) => Some(v),
            _ => None,
        }
    }
}

/// Accept RFC 3339 strings or epoch milliseconds
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    match raw {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => DateTime::parse_from_rfc3339(&s)
            .map(|dt| Some(dt.with_timezone(&Utc)))
            .map_err(serde::de::Error::custom),
        Some(Value::Number(n)) => n
            .as_i64()
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {}", n))),
        Some(other) => Err(serde::de::Error::custom(format!(
            "invalid timestamp: {}",
            other
        ))),
    }
}
