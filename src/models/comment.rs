use serde::{Deserialize, Serialize};

use crate::models::{Millis, ObjectType, RecordId};

/// A comment on a feed object, or a reply to another comment.
/// Replies form a tree via `parent_comment_id`; `depth` is 0 for
/// top-level comments and parent depth + 1 for replies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: RecordId,
    pub creator_id: RecordId,
    pub parent_type: ObjectType,
    pub parent_id: RecordId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_comment_id: Option<RecordId>,
    pub depth: u32,
    pub body: String,
    pub created_at: Millis,
}
