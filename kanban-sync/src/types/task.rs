//! Task type

use super::entity::{CachedList, Draft, Entity, EntityKind, EntityPatch};
use super::ids::EntityId;
use crate::ordering::Positioned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A task card inside one column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: EntityId,
    pub title: String,
    /// Free text; the remote may send null
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub column_id: EntityId,
    /// Rank among the column's tasks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<usize>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Task {
    pub fn new(
        id: impl Into<EntityId>,
        title: impl Into<String>,
        column_id: impl Into<EntityId>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            column_id: column_id.into(),
            position: None,
            extra: Map::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_position(mut self, position: usize) -> Self {
        self.position = Some(position);
        self
    }
}

impl Positioned for Task {
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

impl Entity for Task {
    const KIND: EntityKind = EntityKind::Task;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn parent_id(&self) -> Option<&EntityId> {
        Some(&self.column_id)
    }

    fn set_parent_id(&mut self, parent: EntityId) {
        self.column_id = parent;
    }

    fn apply_patch(&mut self, patch: &EntityPatch) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(description) = &patch.description {
            self.description = Some(description.clone());
        }
    }

    fn new_local(id: EntityId, parent: Option<&EntityId>, draft: &Draft) -> Self {
        let column_id = parent.cloned().unwrap_or_else(|| EntityId::from(""));
        let mut task = Self::new(id, draft.title.clone(), column_id);
        task.description = draft.description.clone();
        task
    }

    fn normalize(&mut self) {
        self.title = self.title.trim().to_string();
        if let Some(description) = self.description.as_mut() {
            *description = description.trim().to_string();
        }
    }

    fn wrap(list: Vec<Self>) -> CachedList {
        CachedList::Tasks(list)
    }

    fn unwrap(list: CachedList) -> Option<Vec<Self>> {
        match list {
            CachedList::Tasks(v) => Some(v),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_null_description() {
        let task: Task = serde_json::from_value(json!({
            "id": 3, "title": "Write docs", "description": null, "columnId": 1
        }))
        .unwrap();
        assert_eq!(task.description, None);
        assert_eq!(task.column_id, "1");
        assert_eq!(task.position, None);
    }

    #[test]
    fn test_normalize_trims() {
        let mut task = Task::new("1", "  Title ", "c").with_description(" body  ");
        task.normalize();
        assert_eq!(task.title, "Title");
        assert_eq!(task.description.as_deref(), Some("body"));
    }

    #[test]
    fn test_patch_description() {
        let mut task = Task::new("1", "A", "c");
        task.apply_patch(&EntityPatch::title("B").with_description("notes"));
        assert_eq!(task.title, "B");
        assert_eq!(task.description.as_deref(), Some("notes"));
    }

    #[test]
    fn test_set_parent_moves_scope() {
        let mut task = Task::new("1", "A", "c1");
        task.set_parent_id(EntityId::from("c2"));
        assert_eq!(task.scope(), Some(crate::types::ScopeKey::tasks("c2")));
    }
}
