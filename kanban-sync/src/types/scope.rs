//! Scope keys: one key per ordered sibling group

use super::entity::EntityKind;
use super::ids::EntityId;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Identifies one ordered sibling group in the cache and the mirror.
///
/// The string form (`boards`, `columns:<boardId>`, `tasks:<columnId>`) is
/// also the durable mirror key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ScopeKey {
    /// All boards
    Boards,
    /// Columns of one board
    Columns { board_id: EntityId },
    /// Tasks of one column
    Tasks { column_id: EntityId },
}

impl ScopeKey {
    pub fn boards() -> Self {
        Self::Boards
    }

    pub fn columns(board_id: impl Into<EntityId>) -> Self {
        Self::Columns {
            board_id: board_id.into(),
        }
    }

    pub fn tasks(column_id: impl Into<EntityId>) -> Self {
        Self::Tasks {
            column_id: column_id.into(),
        }
    }

    /// The scope holding entities of `kind` under `parent`.
    ///
    /// Returns `None` when a parent is required but missing.
    pub fn for_kind(kind: EntityKind, parent: Option<&EntityId>) -> Option<Self> {
        match (kind, parent) {
            (EntityKind::Board, _) => Some(Self::Boards),
            (EntityKind::Column, Some(board)) => Some(Self::columns(board)),
            (EntityKind::Task, Some(column)) => Some(Self::tasks(column)),
            _ => None,
        }
    }

    /// Which entity kind lives in this scope
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Boards => EntityKind::Board,
            Self::Columns { .. } => EntityKind::Column,
            Self::Tasks { .. } => EntityKind::Task,
        }
    }

    /// The owning entity's id (board for columns, column for tasks)
    pub fn parent(&self) -> Option<&EntityId> {
        match self {
            Self::Boards => None,
            Self::Columns { board_id } => Some(board_id),
            Self::Tasks { column_id } => Some(column_id),
        }
    }
}

impl fmt::Display for ScopeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boards => f.write_str("boards"),
            Self::Columns { board_id } => write!(f, "columns:{}", board_id),
            Self::Tasks { column_id } => write!(f, "tasks:{}", column_id),
        }
    }
}

/// Error for a string that is not a scope key
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid scope key: {0}")]
pub struct ParseScopeError(String);

impl FromStr for ScopeKey {
    type Err = ParseScopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "boards" {
            return Ok(Self::Boards);
        }
        match s.split_once(':') {
            Some(("columns", id)) if !id.is_empty() => Ok(Self::columns(id)),
            Some(("tasks", id)) if !id.is_empty() => Ok(Self::tasks(id)),
            _ => Err(ParseScopeError(s.to_string())),
        }
    }
}

impl Serialize for ScopeKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ScopeKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_matches_mirror_keys() {
        assert_eq!(ScopeKey::boards().to_string(), "boards");
        assert_eq!(ScopeKey::columns("b1").to_string(), "columns:b1");
        assert_eq!(ScopeKey::tasks("7").to_string(), "tasks:7");
    }

    #[test]
    fn test_parse() {
        assert_eq!("boards".parse::<ScopeKey>().unwrap(), ScopeKey::Boards);
        assert_eq!(
            "tasks:a:b".parse::<ScopeKey>().unwrap(),
            ScopeKey::tasks("a:b")
        );
        assert!("columns:".parse::<ScopeKey>().is_err());
        assert!("swimlanes:1".parse::<ScopeKey>().is_err());
    }

    #[test]
    fn test_for_kind_requires_parent() {
        assert_eq!(ScopeKey::for_kind(EntityKind::Board, None), Some(ScopeKey::Boards));
        assert_eq!(ScopeKey::for_kind(EntityKind::Task, None), None);
        let board = EntityId::from("3");
        assert_eq!(
            ScopeKey::for_kind(EntityKind::Column, Some(&board)),
            Some(ScopeKey::columns("3"))
        );
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&ScopeKey::tasks("4")).unwrap();
        assert_eq!(json, "\"tasks:4\"");
        let back: ScopeKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back.kind(), EntityKind::Task);
        assert_eq!(back.parent().unwrap(), "4");
    }
}
