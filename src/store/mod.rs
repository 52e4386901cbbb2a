// Store - data access interface and its implementations.
//
// Decoration and ranking never touch a connection pool directly; they are
// handed a `CatalogStore`, so tests substitute the in-memory store without
// any process-wide state.

pub mod cache;
pub mod memory;
pub mod sqlite;

use async_trait::async_trait;
use std::collections::HashMap;

use crate::error::AppResult;
use crate::models::{
    Book, BookCandidate, BookPatch, Comment, FeedItem, Interaction, InteractionType, ObjectType,
    PersonCandidate, Profile, RecordId, ShelfItem,
};

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Unified data-access interface for the catalog graph.
///
/// Every lookup that decoration relies on is batched over an id set; one
/// decoration call must never become one query per item.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    // Profile operations
    async fn create_profile(&self, profile: Profile) -> AppResult<Profile>;
    async fn profile_by_id(&self, id: RecordId) -> AppResult<Option<Profile>>;
    async fn profiles_by_ids(&self, ids: &[RecordId]) -> AppResult<Vec<Profile>>;

    // Book operations
    async fn create_book(&self, book: Book) -> AppResult<Book>;
    async fn book_by_id(&self, id: RecordId) -> AppResult<Option<Book>>;
    async fn books_by_ids(&self, ids: &[RecordId]) -> AppResult<Vec<Book>>;
    async fn update_book(&self, id: RecordId, patch: &BookPatch) -> AppResult<Book>;

    // Feed content
    async fn create_feed_item(&self, item: FeedItem) -> AppResult<FeedItem>;
    async fn recent_feed_items(&self, limit: u32, offset: u64) -> AppResult<Vec<FeedItem>>;

    // Interactions (likes, saves, follows)
    /// All interactions of one type whose target is any of the given objects.
    async fn interactions_for_objects(
        &self,
        object_type: ObjectType,
        object_ids: &[RecordId],
        interaction_type: InteractionType,
    ) -> AppResult<Vec<Interaction>>;

    /// All interactions of one type performed by any of the given agents
    /// against the given object type.
    async fn interactions_by_agents(
        &self,
        agent_ids: &[RecordId],
        object_type: ObjectType,
        interaction_type: InteractionType,
    ) -> AppResult<Vec<Interaction>>;

    /// Insert an interaction. Returns `false` when the same
    /// (agent, object, type) tuple already exists; the uniqueness
    /// constraint lives in the store, not in a read-then-write.
    async fn add_interaction(&self, interaction: Interaction) -> AppResult<bool>;

    async fn remove_interaction(
        &self,
        agent_id: RecordId,
        object_id: RecordId,
        object_type: ObjectType,
        interaction_type: InteractionType,
    ) -> AppResult<bool>;

    // Comments
    async fn create_comment(&self, comment: Comment) -> AppResult<Comment>;
    async fn comment_by_id(&self, id: RecordId) -> AppResult<Option<Comment>>;
    async fn comments_for_parent(
        &self,
        parent_type: ObjectType,
        parent_id: RecordId,
    ) -> AppResult<Vec<Comment>>;
    async fn comment_counts(
        &self,
        parent_type: ObjectType,
        parent_ids: &[RecordId],
    ) -> AppResult<HashMap<RecordId, u64>>;

    // Shelf activity
    async fn add_shelf_item(&self, item: ShelfItem) -> AppResult<ShelfItem>;
    /// Reverse-chronological shelf items per profile, batched across the
    /// whole profile set, capped per profile.
    async fn shelf_activity_for_profiles(
        &self,
        profile_ids: &[RecordId],
        per_profile: u32,
    ) -> AppResult<HashMap<RecordId, Vec<ShelfItem>>>;

    // Search candidates, pre-ordered by store relevance
    async fn search_book_candidates(
        &self,
        query: &str,
        limit: u32,
    ) -> AppResult<Vec<BookCandidate>>;
    async fn search_person_candidates(
        &self,
        query: &str,
        limit: u32,
    ) -> AppResult<Vec<PersonCandidate>>;
}
