//! Cache Models
//!
//! Data structures matching the remote entities, plus their creation and
//! update payloads. Entities reference each other by id only.

use serde::{Deserialize, Serialize};

use crate::chain;
use crate::collection::Collection;
use crate::entity::{Entity, Linked, Patch, Resource};

pub type BoardId = u32;
pub type ColumnId = u32;
pub type TagId = u32;
pub type UserId = u32;

// ========================
// Board
// ========================

/// Board data structure (matches backend)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Board {
    pub id: BoardId,
    pub name: String,
    /// Members, shown as avatars
    #[serde(default)]
    pub user_ids: Vec<UserId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateBoard {
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateBoard {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Entity for Board {
    type Id = BoardId;

    fn id(&self) -> BoardId {
        self.id
    }
}

impl Patch<Board> for UpdateBoard {
    fn apply_to(&self, board: &Board) -> Board {
        Board {
            name: self.name.clone().unwrap_or_else(|| board.name.clone()),
            ..board.clone()
        }
    }
}

impl Resource for Board {
    type Create = CreateBoard;
    type Update = UpdateBoard;

    const KIND: &'static str = "board";

    fn board_id(&self) -> BoardId {
        self.id
    }

    fn from_create(id: BoardId, payload: &CreateBoard) -> Self {
        Board {
            id,
            name: payload.name.clone(),
            user_ids: Vec::new(),
        }
    }
}

// ========================
// Column
// ========================

/// Column data structure (matches backend)
///
/// Columns of one board form a chain through `next_id`; `None` marks the
/// last column of the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub id: ColumnId,
    pub board_id: BoardId,
    pub name: String,
    pub next_id: Option<ColumnId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateColumn {
    pub board_id: BoardId,
    pub name: String,
    /// Insert before this column; `None` appends at the end
    #[serde(default)]
    pub next_id: Option<ColumnId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateColumn {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Entity for Column {
    type Id = ColumnId;

    fn id(&self) -> ColumnId {
        self.id
    }
}

impl Patch<Column> for UpdateColumn {
    fn apply_to(&self, column: &Column) -> Column {
        Column {
            name: self.name.clone().unwrap_or_else(|| column.name.clone()),
            ..column.clone()
        }
    }
}

impl Resource for Column {
    type Create = CreateColumn;
    type Update = UpdateColumn;

    const KIND: &'static str = "column";

    fn board_id(&self) -> BoardId {
        self.board_id
    }

    fn from_create(id: ColumnId, payload: &CreateColumn) -> Self {
        Column {
            id,
            board_id: payload.board_id,
            name: payload.name.clone(),
            next_id: payload.next_id,
        }
    }

    fn insert_edits(collection: &Collection<Self>, created: &Self) -> Vec<Self> {
        chain::plan_insert(collection, created)
    }

    fn remove_edits(collection: &Collection<Self>, id: ColumnId) -> Vec<Self> {
        chain::plan_remove(collection, id)
    }
}

impl Linked for Column {
    type Scope = BoardId;

    fn scope(&self) -> BoardId {
        self.board_id
    }

    fn next_id(&self) -> Option<ColumnId> {
        self.next_id
    }

    fn with_next(&self, next: Option<ColumnId>) -> Self {
        Column {
            next_id: next,
            ..self.clone()
        }
    }
}

// ========================
// Tag
// ========================

/// Tag data structure (matches backend)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub id: TagId,
    pub board_id: BoardId,
    pub name: String,
    /// Color (hex, e.g., "#FF5733")
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTag {
    pub board_id: BoardId,
    pub name: String,
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateTag {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl Entity for Tag {
    type Id = TagId;

    fn id(&self) -> TagId {
        self.id
    }
}

impl Patch<Tag> for UpdateTag {
    fn apply_to(&self, tag: &Tag) -> Tag {
        Tag {
            name: self.name.clone().unwrap_or_else(|| tag.name.clone()),
            color: self.color.clone().or_else(|| tag.color.clone()),
            ..tag.clone()
        }
    }
}

impl Resource for Tag {
    type Create = CreateTag;
    type Update = UpdateTag;

    const KIND: &'static str = "tag";

    fn board_id(&self) -> BoardId {
        self.board_id
    }

    fn from_create(id: TagId, payload: &CreateTag) -> Self {
        Tag {
            id,
            board_id: payload.board_id,
            name: payload.name.clone(),
            color: payload.color.clone(),
        }
    }
}

/// Status marker returned by deletions and membership calls
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    pub success: bool,
}

impl Status {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_wire_format_is_camel_case() {
        let column: Column =
            serde_json::from_str(r#"{"id": 3, "boardId": 1, "name": "Done", "nextId": null}"#)
                .unwrap();
        assert_eq!(column.board_id, 1);
        assert_eq!(column.next_id, None);

        let json = serde_json::to_value(&column).unwrap();
        assert_eq!(json["nextId"], serde_json::Value::Null);
    }

    #[test]
    fn test_update_patch_keeps_unset_fields() {
        let tag = Tag {
            id: 1,
            board_id: 2,
            name: "Bug".to_string(),
            color: Some("#FF0000".to_string()),
        };
        let patched = UpdateTag {
            name: Some("Defect".to_string()),
            color: None,
        }
        .apply_to(&tag);

        assert_eq!(patched.name, "Defect");
        assert_eq!(patched.color, Some("#FF0000".to_string()));
        assert_eq!(patched.board_id, 2);
    }

    #[test]
    fn test_board_without_members_field() {
        let board: Board = serde_json::from_str(r#"{"id": 7, "name": "Roadmap"}"#).unwrap();
        assert!(board.user_ids.is_empty());
    }
}
