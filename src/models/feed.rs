use serde::{Deserialize, Serialize};

use crate::models::{Millis, ObjectType, RecordId};

/// Content kinds that can appear in the home feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedObjectKind {
    Note,
    Post,
    List,
    CurrentStatus,
}

impl FeedObjectKind {
    pub fn object_type(&self) -> ObjectType {
        match self {
            FeedObjectKind::Note => ObjectType::Note,
            FeedObjectKind::Post => ObjectType::Post,
            FeedObjectKind::List => ObjectType::List,
            FeedObjectKind::CurrentStatus => ObjectType::CurrentStatus,
        }
    }
}

/// A feed content entity. The count and viewer-relative fields at the
/// bottom are derived slots: decoration fills them on fetched copies and
/// the store never persists them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedItem {
    pub id: RecordId,
    pub kind: FeedObjectKind,
    pub creator_id: RecordId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub body: String,
    pub created_at: Millis,
    pub updated_at: Millis,

    #[serde(default)]
    pub like_count: u64,
    #[serde(default)]
    pub comment_count: u64,
    #[serde(default)]
    pub current_user_like: bool,
    #[serde(default)]
    pub current_user_save: bool,
}
