//! The `Entity` abstraction shared by boards, columns and tasks

use super::board::{Board, Column};
use super::ids::EntityId;
use super::scope::ScopeKey;
use super::task::Task;
use crate::error::{Result, SyncError};
use crate::ordering::Positioned;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::{self, Debug};

/// The three entity kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Board,
    Column,
    Task,
}

impl EntityKind {
    /// Singular noun, as used in op strings
    pub fn noun(self) -> &'static str {
        match self {
            Self::Board => "board",
            Self::Column => "column",
            Self::Task => "task",
        }
    }

    /// Remote collection name (`/boards`, `/columns`, `/tasks`)
    pub fn collection(self) -> &'static str {
        match self {
            Self::Board => "boards",
            Self::Column => "columns",
            Self::Task => "tasks",
        }
    }

    /// Wire name of the foreign key to the parent, if the kind has one
    pub fn parent_field(self) -> Option<&'static str> {
        match self {
            Self::Board => None,
            Self::Column => Some("boardId"),
            Self::Task => Some("columnId"),
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.noun())
    }
}

/// Fields supplied by the user when creating an entity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Draft {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Draft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Trim the title and reject it when nothing is left
    pub fn validated(&self) -> Result<Self> {
        Ok(Self {
            title: validate_title(&self.title)?,
            description: self.description.as_ref().map(|d| d.trim().to_string()),
        })
    }
}

/// Non-order field edits (rename, description change)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl EntityPatch {
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none()
    }

    /// Trim fields; a supplied title must not be blank
    pub fn validated(&self) -> Result<Self> {
        let title = match &self.title {
            Some(t) => Some(validate_title(t)?),
            None => None,
        };
        Ok(Self {
            title,
            description: self.description.as_ref().map(|d| d.trim().to_string()),
        })
    }
}

/// Trim a title, failing when it is empty afterwards
pub fn validate_title(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(SyncError::validation("title", "title is required"));
    }
    Ok(trimmed.to_string())
}

/// A board, column or task as held by the cache.
///
/// Implementors are flat records with a normalized id, a title, an optional
/// position and (for columns and tasks) a parent foreign key.
pub trait Entity:
    Positioned + Clone + Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    const KIND: EntityKind;

    fn id(&self) -> &EntityId;

    fn title(&self) -> &str;

    /// The owning board/column; `None` for boards
    fn parent_id(&self) -> Option<&EntityId>;

    /// Reassign the owning board/column. Boards ignore this.
    fn set_parent_id(&mut self, parent: EntityId);

    /// Apply a validated patch to the local copy
    fn apply_patch(&mut self, patch: &EntityPatch);

    /// Build an entity locally when no remote assigns ids
    fn new_local(id: EntityId, parent: Option<&EntityId>, draft: &Draft) -> Self;

    /// Trim string fields after decoding
    fn normalize(&mut self);

    fn wrap(list: Vec<Self>) -> CachedList;

    fn unwrap(list: CachedList) -> Option<Vec<Self>>;

    /// Check the record after normalization
    fn validate(&self) -> Result<()> {
        if self.title().trim().is_empty() {
            return Err(SyncError::validation(
                "title",
                format!("{} {} has an empty title", Self::KIND, self.id()),
            ));
        }
        Ok(())
    }

    /// The scope this entity belongs to
    fn scope(&self) -> Option<ScopeKey> {
        ScopeKey::for_kind(Self::KIND, self.parent_id())
    }

    /// Take the server's fields, keeping the locally owned position
    fn merge_server(&self, server: Self) -> Self {
        let mut merged = server;
        if let Some(position) = self.position() {
            merged.set_position(position);
        }
        merged
    }

    /// JSON body for a remote create
    fn create_fields(parent: Option<&EntityId>, draft: &Draft) -> Value {
        let mut fields = serde_json::Map::new();
        fields.insert("title".into(), Value::String(draft.title.clone()));
        if let (Some(field), Some(parent)) = (Self::KIND.parent_field(), parent) {
            fields.insert(field.into(), Value::String(parent.to_string()));
        }
        if Self::KIND == EntityKind::Task {
            fields.insert(
                "description".into(),
                Value::String(draft.description.clone().unwrap_or_default()),
            );
        }
        Value::Object(fields)
    }
}

/// A type-erased cache entry: one ordered list of a single entity kind
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CachedList {
    Boards(Vec<Board>),
    Columns(Vec<Column>),
    Tasks(Vec<Task>),
}

impl CachedList {
    /// An empty list of the given kind
    pub fn empty(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Board => Self::Boards(Vec::new()),
            EntityKind::Column => Self::Columns(Vec::new()),
            EntityKind::Task => Self::Tasks(Vec::new()),
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Boards(_) => EntityKind::Board,
            Self::Columns(_) => EntityKind::Column,
            Self::Tasks(_) => EntityKind::Task,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Boards(v) => v.len(),
            Self::Columns(v) => v.len(),
            Self::Tasks(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Ids in list order
    pub fn ids(&self) -> Vec<EntityId> {
        match self {
            Self::Boards(v) => v.iter().map(|e| e.id().clone()).collect(),
            Self::Columns(v) => v.iter().map(|e| e.id().clone()).collect(),
            Self::Tasks(v) => v.iter().map(|e| e.id().clone()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draft_validation_trims() {
        let draft = Draft::new("  Ship it  ").with_description(" soon ");
        let valid = draft.validated().unwrap();
        assert_eq!(valid.title, "Ship it");
        assert_eq!(valid.description.as_deref(), Some("soon"));
    }

    #[test]
    fn test_blank_title_rejected() {
        assert!(matches!(
            Draft::new("   ").validated(),
            Err(SyncError::Validation { .. })
        ));
        assert!(EntityPatch::title("\t").validated().is_err());
        assert!(EntityPatch::default().validated().unwrap().is_empty());
    }

    #[test]
    fn test_create_fields_per_kind() {
        let draft = Draft::new("Todo");
        let board_id = EntityId::from("b1");
        assert_eq!(
            Column::create_fields(Some(&board_id), &draft),
            serde_json::json!({"title": "Todo", "boardId": "b1"})
        );
        assert_eq!(
            Board::create_fields(None, &draft),
            serde_json::json!({"title": "Todo"})
        );
        let column_id = EntityId::from("c1");
        assert_eq!(
            Task::create_fields(Some(&column_id), &draft),
            serde_json::json!({"title": "Todo", "columnId": "c1", "description": ""})
        );
    }

    #[test]
    fn test_cached_list_kind_and_ids() {
        let list = Column::wrap(vec![Column::new("1", "A", "b"), Column::new("2", "B", "b")]);
        assert_eq!(list.kind(), EntityKind::Column);
        assert_eq!(list.len(), 2);
        assert_eq!(list.ids(), vec![EntityId::from("1"), EntityId::from("2")]);
        assert!(CachedList::empty(EntityKind::Task).is_empty());
        assert!(Board::unwrap(list).is_none());
    }
}
