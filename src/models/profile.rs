use serde::{Deserialize, Serialize};

use crate::models::{Millis, RecordId, ShelfItem};

/// A user profile. The `following`/`followers`/`recent_activity` slots are
/// derived: decoration fills them for the response at hand and they are
/// never written back to the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: RecordId,
    pub handle: String,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    pub created_at: Millis,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub following: Option<Vec<Profile>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub followers: Option<Vec<Profile>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub following_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follower_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recent_activity: Option<Vec<ShelfItem>>,
}

impl Profile {
    pub fn new(id: RecordId, handle: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id,
            handle: handle.into(),
            display_name: display_name.into(),
            avatar_url: None,
            bio: None,
            created_at: crate::models::current_time_millis(),
            following: None,
            followers: None,
            following_count: None,
            follower_count: None,
            recent_activity: None,
        }
    }
}
