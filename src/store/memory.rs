//! In-memory store: the substitutable fake for tests and local dev mode.
//! Mirrors the SQLite store's observable behavior, including the
//! interaction uniqueness constraint.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::RwLock;

use crate::error::{AppError, AppResult};
use crate::models::{
    current_time_millis, Book, BookCandidate, BookPatch, Comment, FeedItem, Interaction,
    InteractionType, ObjectType, PersonCandidate, Profile, RecordId, ShelfItem,
};
use crate::search::normalize;
use crate::store::CatalogStore;

#[derive(Default)]
struct MemoryInner {
    profiles: HashMap<RecordId, Profile>,
    books: HashMap<RecordId, Book>,
    feed_items: HashMap<RecordId, FeedItem>,
    interactions: Vec<Interaction>,
    comments: Vec<Comment>,
    shelf_items: Vec<ShelfItem>,
}

pub struct MemoryStore {
    inner: RwLock<MemoryInner>,
    next_id: AtomicI64,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryInner::default()),
            // Id 0 marks "not yet assigned" on incoming records.
            next_id: AtomicI64::new(1),
        }
    }

    fn allocate_id(&self) -> RecordId {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }
}

fn relevance_for(search_text: &str, query_tokens: &[String], weight: f64) -> Option<f64> {
    let matched = query_tokens
        .iter()
        .filter(|token| search_text.contains(token.as_str()))
        .count();
    if matched == 0 {
        return None;
    }
    Some(matched as f64 * 10.0 + weight)
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn create_profile(&self, mut profile: Profile) -> AppResult<Profile> {
        if profile.id == 0 {
            profile.id = self.allocate_id();
        }
        let mut inner = self.inner.write().await;
        inner.profiles.insert(profile.id, profile.clone());
        Ok(profile)
    }

    async fn profile_by_id(&self, id: RecordId) -> AppResult<Option<Profile>> {
        let inner = self.inner.read().await;
        Ok(inner.profiles.get(&id).cloned())
    }

    async fn profiles_by_ids(&self, ids: &[RecordId]) -> AppResult<Vec<Profile>> {
        let inner = self.inner.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| inner.profiles.get(id).cloned())
            .collect())
    }

    async fn create_book(&self, mut book: Book) -> AppResult<Book> {
        if book.id == 0 {
            book.id = self.allocate_id();
        }
        let mut inner = self.inner.write().await;
        inner.books.insert(book.id, book.clone());
        Ok(book)
    }

    async fn book_by_id(&self, id: RecordId) -> AppResult<Option<Book>> {
        let inner = self.inner.read().await;
        Ok(inner.books.get(&id).cloned())
    }

    async fn books_by_ids(&self, ids: &[RecordId]) -> AppResult<Vec<Book>> {
        let inner = self.inner.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| inner.books.get(id).cloned())
            .collect())
    }

    async fn update_book(&self, id: RecordId, patch: &BookPatch) -> AppResult<Book> {
        let mut inner = self.inner.write().await;
        let book = inner
            .books
            .get(&id)
            .ok_or_else(|| AppError::NotFound(format!("book {}", id)))?;
        let next = patch.apply(book);
        inner.books.insert(id, next.clone());
        Ok(next)
    }

    async fn create_feed_item(&self, mut item: FeedItem) -> AppResult<FeedItem> {
        if item.id == 0 {
            item.id = self.allocate_id();
        }
        let mut inner = self.inner.write().await;
        inner.feed_items.insert(item.id, item.clone());
        Ok(item)
    }

    async fn recent_feed_items(&self, limit: u32, offset: u64) -> AppResult<Vec<FeedItem>> {
        let inner = self.inner.read().await;
        let mut items: Vec<FeedItem> = inner.feed_items.values().cloned().collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(items
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn interactions_for_objects(
        &self,
        object_type: ObjectType,
        object_ids: &[RecordId],
        interaction_type: InteractionType,
    ) -> AppResult<Vec<Interaction>> {
        let inner = self.inner.read().await;
        Ok(inner
            .interactions
            .iter()
            .filter(|i| {
                i.object_type == object_type
                    && i.interaction_type == interaction_type
                    && object_ids.contains(&i.object_id)
            })
            .cloned()
            .collect())
    }

    async fn interactions_by_agents(
        &self,
        agent_ids: &[RecordId],
        object_type: ObjectType,
        interaction_type: InteractionType,
    ) -> AppResult<Vec<Interaction>> {
        let inner = self.inner.read().await;
        Ok(inner
            .interactions
            .iter()
            .filter(|i| {
                i.object_type == object_type
                    && i.interaction_type == interaction_type
                    && agent_ids.contains(&i.agent_id)
            })
            .cloned()
            .collect())
    }

    async fn add_interaction(&self, mut interaction: Interaction) -> AppResult<bool> {
        let mut inner = self.inner.write().await;
        let exists = inner.interactions.iter().any(|i| {
            i.agent_id == interaction.agent_id
                && i.agent_type == interaction.agent_type
                && i.object_id == interaction.object_id
                && i.object_type == interaction.object_type
                && i.interaction_type == interaction.interaction_type
        });
        if exists {
            return Ok(false);
        }
        if interaction.id == 0 {
            interaction.id = self.allocate_id();
        }
        inner.interactions.push(interaction);
        Ok(true)
    }

    async fn remove_interaction(
        &self,
        agent_id: RecordId,
        object_id: RecordId,
        object_type: ObjectType,
        interaction_type: InteractionType,
    ) -> AppResult<bool> {
        let mut inner = self.inner.write().await;
        let before = inner.interactions.len();
        inner.interactions.retain(|i| {
            !(i.agent_id == agent_id
                && i.object_id == object_id
                && i.object_type == object_type
                && i.interaction_type == interaction_type)
        });
        Ok(inner.interactions.len() < before)
    }

    async fn create_comment(&self, mut comment: Comment) -> AppResult<Comment> {
        if comment.id == 0 {
            comment.id = self.allocate_id();
        }
        let mut inner = self.inner.write().await;
        inner.comments.push(comment.clone());
        Ok(comment)
    }

    async fn comment_by_id(&self, id: RecordId) -> AppResult<Option<Comment>> {
        let inner = self.inner.read().await;
        Ok(inner.comments.iter().find(|c| c.id == id).cloned())
    }

    async fn comments_for_parent(
        &self,
        parent_type: ObjectType,
        parent_id: RecordId,
    ) -> AppResult<Vec<Comment>> {
        let inner = self.inner.read().await;
        let mut comments: Vec<Comment> = inner
            .comments
            .iter()
            .filter(|c| c.parent_type == parent_type && c.parent_id == parent_id)
            .cloned()
            .collect();
        comments.sort_by_key(|c| (c.created_at, c.id));
        Ok(comments)
    }

    async fn comment_counts(
        &self,
        parent_type: ObjectType,
        parent_ids: &[RecordId],
    ) -> AppResult<HashMap<RecordId, u64>> {
        let inner = self.inner.read().await;
        let mut counts = HashMap::new();
        for comment in &inner.comments {
            if comment.parent_type == parent_type && parent_ids.contains(&comment.parent_id) {
                *counts.entry(comment.parent_id).or_insert(0) += 1;
            }
        }
        Ok(counts)
    }

    async fn add_shelf_item(&self, mut item: ShelfItem) -> AppResult<ShelfItem> {
        if item.id == 0 {
            item.id = self.allocate_id();
        }
        if item.created_at == 0 {
            item.created_at = current_time_millis();
        }
        let mut inner = self.inner.write().await;
        let book = inner.books.get(&item.book_id).cloned();
        let mut stored = item.clone();
        stored.book = book;
        inner.shelf_items.push(stored.clone());
        Ok(stored)
    }

    async fn shelf_activity_for_profiles(
        &self,
        profile_ids: &[RecordId],
        per_profile: u32,
    ) -> AppResult<HashMap<RecordId, Vec<ShelfItem>>> {
        let inner = self.inner.read().await;
        let mut by_profile: HashMap<RecordId, Vec<ShelfItem>> = HashMap::new();
        for item in &inner.shelf_items {
            if profile_ids.contains(&item.profile_id) {
                by_profile
                    .entry(item.profile_id)
                    .or_default()
                    .push(item.clone());
            }
        }
        for items in by_profile.values_mut() {
            items.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
            items.truncate(per_profile as usize);
        }
        Ok(by_profile)
    }

    async fn search_book_candidates(
        &self,
        query: &str,
        limit: u32,
    ) -> AppResult<Vec<BookCandidate>> {
        let tokens = normalize::tokenize(query);
        if tokens.is_empty() {
            return Ok(Vec::new());
        }
        let inner = self.inner.read().await;
        let mut candidates: Vec<BookCandidate> = inner
            .books
            .values()
            .filter_map(|book| {
                let search_text =
                    normalize::normalize(&format!("{} {}", book.title, book.author_name));
                let weight = (1.0 + book.edition_count as f64).ln();
                relevance_for(&search_text, &tokens, weight).map(|relevance| BookCandidate {
                    id: book.id,
                    title: book.title.clone(),
                    author_name: book.author_name.clone(),
                    cover_url: book.cover_url.clone(),
                    edition_count: book.edition_count,
                    first_published_year: book.first_published_year,
                    relevance,
                })
            })
            .collect();
        candidates.sort_by(|a, b| {
            b.relevance
                .partial_cmp(&a.relevance)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.id.cmp(&b.id))
        });
        candidates.truncate(limit as usize);
        Ok(candidates)
    }

    async fn search_person_candidates(
        &self,
        query: &str,
        limit: u32,
    ) -> AppResult<Vec<PersonCandidate>> {
        let tokens = normalize::tokenize(query);
        if tokens.is_empty() {
            return Ok(Vec::new());
        }
        let inner = self.inner.read().await;
        let mut candidates: Vec<PersonCandidate> = inner
            .profiles
            .values()
            .filter_map(|profile| {
                let search_text =
                    normalize::normalize(&format!("{} {}", profile.display_name, profile.handle));
                relevance_for(&search_text, &tokens, 0.0).map(|relevance| PersonCandidate {
                    id: profile.id,
                    handle: profile.handle.clone(),
                    display_name: profile.display_name.clone(),
                    avatar_url: profile.avatar_url.clone(),
                    relevance,
                })
            })
            .collect();
        candidates.sort_by(|a, b| {
            b.relevance
                .partial_cmp(&a.relevance)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.id.cmp(&b.id))
        });
        candidates.truncate(limit as usize);
        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(title: &str, author: &str, editions: u32) -> Book {
        Book {
            id: 0,
            title: title.to_string(),
            author_name: author.to_string(),
            cover_url: None,
            cover_url_small: None,
            open_library_work_id: None,
            edition_count: editions,
            first_published_year: None,
            is_translated: false,
            description: None,
            created_at: current_time_millis(),
            updated_at: current_time_millis(),
        }
    }

    #[tokio::test]
    async fn test_duplicate_interaction_is_rejected() {
        let store = MemoryStore::new();
        let like = Interaction::new(7, 42, ObjectType::Note, InteractionType::Like);
        assert!(store.add_interaction(like.clone()).await.unwrap());
        assert!(!store.add_interaction(like).await.unwrap());

        let likes = store
            .interactions_for_objects(ObjectType::Note, &[42], InteractionType::Like)
            .await
            .unwrap();
        assert_eq!(likes.len(), 1);
    }

    #[tokio::test]
    async fn test_remove_interaction() {
        let store = MemoryStore::new();
        let follow = Interaction::new(1, 2, ObjectType::Profile, InteractionType::Follow);
        store.add_interaction(follow).await.unwrap();
        assert!(store
            .remove_interaction(1, 2, ObjectType::Profile, InteractionType::Follow)
            .await
            .unwrap());
        assert!(!store
            .remove_interaction(1, 2, ObjectType::Profile, InteractionType::Follow)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_search_candidates_ordered_by_relevance() {
        let store = MemoryStore::new();
        store
            .create_book(book("Ender's Game", "Orson Scott Card", 120))
            .await
            .unwrap();
        store
            .create_book(book("The Games People Play", "Eric Berne", 5))
            .await
            .unwrap();

        let candidates = store.search_book_candidates("enders game", 10).await.unwrap();
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].title, "Ender's Game");
        assert!(candidates[0].relevance > candidates[1].relevance);
    }

    #[tokio::test]
    async fn test_shelf_activity_is_capped_per_profile() {
        let store = MemoryStore::new();
        let b = store.create_book(book("Dune", "Frank Herbert", 90)).await.unwrap();
        for n in 0..5 {
            store
                .add_shelf_item(ShelfItem {
                    id: 0,
                    profile_id: 1,
                    book_id: b.id,
                    shelf: "read".to_string(),
                    created_at: 1000 + n,
                    book: None,
                })
                .await
                .unwrap();
        }
        let activity = store.shelf_activity_for_profiles(&[1], 3).await.unwrap();
        let items = &activity[&1];
        assert_eq!(items.len(), 3);
        assert!(items.windows(2).all(|w| w[0].created_at >= w[1].created_at));
    }
}
