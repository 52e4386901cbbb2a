use serde::{Deserialize, Serialize};

use crate::models::{Millis, RecordId};

/// A catalogued book. Title and author are always present as strings
/// (possibly empty) so downstream matching never sees a missing field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    pub id: RecordId,
    pub title: String,
    pub author_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_url_small: Option<String>,
    /// External catalog work identifier, e.g. an OpenLibrary work key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open_library_work_id: Option<String>,
    pub edition_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_published_year: Option<i32>,
    pub is_translated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: Millis,
    pub updated_at: Millis,
}

/// One book placed on one profile's shelf. The unit of "friends' latest
/// activity" in the feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShelfItem {
    pub id: RecordId,
    pub profile_id: RecordId,
    pub book_id: RecordId,
    pub shelf: String,
    pub created_at: Millis,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub book: Option<Book>,
}
