use serde::{Deserialize, Serialize};

use crate::models::RecordId;

/// Denormalized book projection used only for search ranking. The store
/// returns these pre-ordered by its own relevance score; ranking combines
/// that order with fuzzy re-matching and discards `relevance` afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookCandidate {
    pub id: RecordId,
    pub title: String,
    pub author_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
    pub edition_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_published_year: Option<i32>,
    #[serde(default, skip_serializing)]
    pub relevance: f64,
}

/// Denormalized person projection for people search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonCandidate {
    pub id: RecordId,
    pub handle: String,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(default, skip_serializing)]
    pub relevance: f64,
}
