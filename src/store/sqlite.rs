//! SQLite-backed store over a SQLx connection pool.

use async_trait::async_trait;
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::{QueryBuilder, Row, Sqlite};
use std::collections::HashMap;
use tracing::instrument;

use crate::error::{AppError, AppResult};
use crate::models::{
    current_time_millis, Book, BookCandidate, BookPatch, Comment, FeedItem, FeedObjectKind,
    Interaction, InteractionType, ObjectType, PersonCandidate, Profile, RecordId, ShelfItem,
};
use crate::search::normalize;
use crate::store::cache::ReadCache;
use crate::store::CatalogStore;

pub struct SqliteStore {
    pool: SqlitePool,
    book_cache: ReadCache<RecordId, Book>,
}

impl SqliteStore {
    pub async fn new(database_url: &str, cache_capacity: usize) -> AppResult<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to connect: {}", e)))?;
        Ok(Self {
            pool,
            book_cache: ReadCache::new(cache_capacity),
        })
    }

    pub async fn new_in_memory() -> AppResult<Self> {
        let store = Self::new("sqlite::memory:", 256).await?;
        store.init().await?;
        Ok(store)
    }

    /// Create tables and indexes. Idempotent.
    pub async fn init(&self) -> AppResult<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS profiles (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                handle TEXT NOT NULL UNIQUE,
                display_name TEXT NOT NULL,
                avatar_url TEXT,
                bio TEXT,
                created_at INTEGER NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS books (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                author_name TEXT NOT NULL,
                cover_url TEXT,
                cover_url_small TEXT,
                open_library_work_id TEXT,
                edition_count INTEGER NOT NULL DEFAULT 0,
                first_published_year INTEGER,
                is_translated INTEGER NOT NULL DEFAULT 0,
                description TEXT,
                search_text TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS feed_items (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                kind TEXT NOT NULL,
                creator_id INTEGER NOT NULL,
                title TEXT,
                body TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        // Uniqueness lives here, not in query-before-insert: concurrent
        // duplicate likes/follows collapse to one row.
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS interactions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                agent_id INTEGER NOT NULL,
                agent_type TEXT NOT NULL,
                object_id INTEGER NOT NULL,
                object_type TEXT NOT NULL,
                interaction_type TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                UNIQUE(agent_id, agent_type, object_id, object_type, interaction_type)
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS comments (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                creator_id INTEGER NOT NULL,
                parent_type TEXT NOT NULL,
                parent_id INTEGER NOT NULL,
                parent_comment_id INTEGER,
                depth INTEGER NOT NULL DEFAULT 0,
                body TEXT NOT NULL,
                created_at INTEGER NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS shelf_items (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                profile_id INTEGER NOT NULL,
                book_id INTEGER NOT NULL,
                shelf TEXT NOT NULL,
                created_at INTEGER NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_interactions_object
             ON interactions(object_type, object_id, interaction_type)",
        )
        .execute(&self.pool)
        .await?;
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_interactions_agent
             ON interactions(agent_id, interaction_type, object_type)",
        )
        .execute(&self.pool)
        .await?;
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_comments_parent
             ON comments(parent_type, parent_id)",
        )
        .execute(&self.pool)
        .await?;
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_shelf_items_profile
             ON shelf_items(profile_id, created_at DESC)",
        )
        .execute(&self.pool)
        .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_feed_items_created ON feed_items(created_at DESC)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    fn book_search_text(title: &str, author_name: &str) -> String {
        normalize::normalize(&format!("{} {}", title, author_name))
    }
}

fn profile_from_row(row: &SqliteRow) -> AppResult<Profile> {
    Ok(Profile {
        id: row.try_get("id")?,
        handle: row.try_get("handle")?,
        display_name: row.try_get("display_name")?,
        avatar_url: row.try_get("avatar_url")?,
        bio: row.try_get("bio")?,
        created_at: row.try_get("created_at")?,
        following: None,
        followers: None,
        following_count: None,
        follower_count: None,
        recent_activity: None,
    })
}

fn book_from_row(row: &SqliteRow) -> AppResult<Book> {
    Ok(Book {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        author_name: row.try_get("author_name")?,
        cover_url: row.try_get("cover_url")?,
        cover_url_small: row.try_get("cover_url_small")?,
        open_library_work_id: row.try_get("open_library_work_id")?,
        edition_count: row.try_get::<i64, _>("edition_count")? as u32,
        first_published_year: row.try_get::<Option<i64>, _>("first_published_year")?.map(|y| y as i32),
        is_translated: row.try_get::<i64, _>("is_translated")? != 0,
        description: row.try_get("description")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn feed_item_from_row(row: &SqliteRow) -> AppResult<FeedItem> {
    let kind: String = row.try_get("kind")?;
    let kind = match kind.as_str() {
        "note" => FeedObjectKind::Note,
        "post" => FeedObjectKind::Post,
        "list" => FeedObjectKind::List,
        "current_status" => FeedObjectKind::CurrentStatus,
        other => {
            return Err(AppError::DatabaseError(format!(
                "unknown feed item kind: {}",
                other
            )))
        }
    };
    Ok(FeedItem {
        id: row.try_get("id")?,
        kind,
        creator_id: row.try_get("creator_id")?,
        title: row.try_get("title")?,
        body: row.try_get("body")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        like_count: 0,
        comment_count: 0,
        current_user_like: false,
        current_user_save: false,
    })
}

fn feed_kind_as_str(kind: FeedObjectKind) -> &'static str {
    match kind {
        FeedObjectKind::Note => "note",
        FeedObjectKind::Post => "post",
        FeedObjectKind::List => "list",
        FeedObjectKind::CurrentStatus => "current_status",
    }
}

fn interaction_from_row(row: &SqliteRow) -> AppResult<Interaction> {
    let agent_type: String = row.try_get("agent_type")?;
    let object_type: String = row.try_get("object_type")?;
    let interaction_type: String = row.try_get("interaction_type")?;
    Ok(Interaction {
        id: row.try_get("id")?,
        agent_id: row.try_get("agent_id")?,
        agent_type: agent_type.parse()?,
        object_id: row.try_get("object_id")?,
        object_type: object_type.parse()?,
        interaction_type: interaction_type.parse()?,
        created_at: row.try_get("created_at")?,
    })
}

fn comment_from_row(row: &SqliteRow) -> AppResult<Comment> {
    let parent_type: String = row.try_get("parent_type")?;
    Ok(Comment {
        id: row.try_get("id")?,
        creator_id: row.try_get("creator_id")?,
        parent_type: parent_type.parse()?,
        parent_id: row.try_get("parent_id")?,
        parent_comment_id: row.try_get("parent_comment_id")?,
        depth: row.try_get::<i64, _>("depth")? as u32,
        body: row.try_get("body")?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl CatalogStore for SqliteStore {
    async fn create_profile(&self, mut profile: Profile) -> AppResult<Profile> {
        if profile.created_at == 0 {
            profile.created_at = current_time_millis();
        }
        let result = sqlx::query(
            "INSERT INTO profiles (handle, display_name, avatar_url, bio, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&profile.handle)
        .bind(&profile.display_name)
        .bind(&profile.avatar_url)
        .bind(&profile.bio)
        .bind(profile.created_at)
        .execute(&self.pool)
        .await?;
        profile.id = result.last_insert_rowid();
        Ok(profile)
    }

    async fn profile_by_id(&self, id: RecordId) -> AppResult<Option<Profile>> {
        let row = sqlx::query("SELECT * FROM profiles WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(profile_from_row).transpose()
    }

    async fn profiles_by_ids(&self, ids: &[RecordId]) -> AppResult<Vec<Profile>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT * FROM profiles WHERE id IN (");
        let mut separated = qb.separated(", ");
        for id in ids {
            separated.push_bind(id);
        }
        qb.push(")");
        let rows = qb.build().fetch_all(&self.pool).await?;
        rows.iter().map(profile_from_row).collect()
    }

    async fn create_book(&self, mut book: Book) -> AppResult<Book> {
        let now = current_time_millis();
        if book.created_at == 0 {
            book.created_at = now;
            book.updated_at = now;
        }
        let search_text = Self::book_search_text(&book.title, &book.author_name);
        let result = sqlx::query(
            "INSERT INTO books (title, author_name, cover_url, cover_url_small,
                open_library_work_id, edition_count, first_published_year,
                is_translated, description, search_text, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&book.title)
        .bind(&book.author_name)
        .bind(&book.cover_url)
        .bind(&book.cover_url_small)
        .bind(&book.open_library_work_id)
        .bind(book.edition_count as i64)
        .bind(book.first_published_year.map(|y| y as i64))
        .bind(book.is_translated as i64)
        .bind(&book.description)
        .bind(&search_text)
        .bind(book.created_at)
        .bind(book.updated_at)
        .execute(&self.pool)
        .await?;
        book.id = result.last_insert_rowid();
        Ok(book)
    }

    #[instrument(skip(self))]
    async fn book_by_id(&self, id: RecordId) -> AppResult<Option<Book>> {
        if let Some(cached) = self.book_cache.get(&id).await {
            return Ok(Some(cached));
        }
        let row = sqlx::query("SELECT * FROM books WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        let book = row.as_ref().map(book_from_row).transpose()?;
        if let Some(ref found) = book {
            self.book_cache.put(id, found.clone()).await;
        }
        Ok(book)
    }

    async fn books_by_ids(&self, ids: &[RecordId]) -> AppResult<Vec<Book>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT * FROM books WHERE id IN (");
        let mut separated = qb.separated(", ");
        for id in ids {
            separated.push_bind(id);
        }
        qb.push(")");
        let rows = qb.build().fetch_all(&self.pool).await?;
        rows.iter().map(book_from_row).collect()
    }

    async fn update_book(&self, id: RecordId, patch: &BookPatch) -> AppResult<Book> {
        let current = self
            .book_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("book {}", id)))?;
        let next = patch.apply(&current);
        let search_text = Self::book_search_text(&next.title, &next.author_name);
        sqlx::query(
            "UPDATE books SET title = ?, author_name = ?, cover_url = ?, description = ?,
                edition_count = ?, first_published_year = ?, is_translated = ?,
                search_text = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(&next.title)
        .bind(&next.author_name)
        .bind(&next.cover_url)
        .bind(&next.description)
        .bind(next.edition_count as i64)
        .bind(next.first_published_year.map(|y| y as i64))
        .bind(next.is_translated as i64)
        .bind(&search_text)
        .bind(next.updated_at)
        .bind(id)
        .execute(&self.pool)
        .await?;
        self.book_cache.invalidate(&id).await;
        Ok(next)
    }

    async fn create_feed_item(&self, mut item: FeedItem) -> AppResult<FeedItem> {
        let now = current_time_millis();
        if item.created_at == 0 {
            item.created_at = now;
            item.updated_at = now;
        }
        let result = sqlx::query(
            "INSERT INTO feed_items (kind, creator_id, title, body, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(feed_kind_as_str(item.kind))
        .bind(item.creator_id)
        .bind(&item.title)
        .bind(&item.body)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&self.pool)
        .await?;
        item.id = result.last_insert_rowid();
        Ok(item)
    }

    async fn recent_feed_items(&self, limit: u32, offset: u64) -> AppResult<Vec<FeedItem>> {
        let rows = sqlx::query(
            "SELECT * FROM feed_items ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
        )
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(feed_item_from_row).collect()
    }

    #[instrument(skip(self, object_ids), fields(count = object_ids.len()))]
    async fn interactions_for_objects(
        &self,
        object_type: ObjectType,
        object_ids: &[RecordId],
        interaction_type: InteractionType,
    ) -> AppResult<Vec<Interaction>> {
        if object_ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut qb = QueryBuilder::<Sqlite>::new(
            "SELECT * FROM interactions WHERE object_type = ",
        );
        qb.push_bind(object_type.as_str());
        qb.push(" AND interaction_type = ");
        qb.push_bind(interaction_type.as_str());
        qb.push(" AND object_id IN (");
        let mut separated = qb.separated(", ");
        for id in object_ids {
            separated.push_bind(id);
        }
        qb.push(")");
        let rows = qb.build().fetch_all(&self.pool).await?;
        rows.iter().map(interaction_from_row).collect()
    }

    async fn interactions_by_agents(
        &self,
        agent_ids: &[RecordId],
        object_type: ObjectType,
        interaction_type: InteractionType,
    ) -> AppResult<Vec<Interaction>> {
        if agent_ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut qb = QueryBuilder::<Sqlite>::new(
            "SELECT * FROM interactions WHERE object_type = ",
        );
        qb.push_bind(object_type.as_str());
        qb.push(" AND interaction_type = ");
        qb.push_bind(interaction_type.as_str());
        qb.push(" AND agent_id IN (");
        let mut separated = qb.separated(", ");
        for id in agent_ids {
            separated.push_bind(id);
        }
        qb.push(")");
        let rows = qb.build().fetch_all(&self.pool).await?;
        rows.iter().map(interaction_from_row).collect()
    }

    async fn add_interaction(&self, interaction: Interaction) -> AppResult<bool> {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO interactions
                (agent_id, agent_type, object_id, object_type, interaction_type, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(interaction.agent_id)
        .bind(interaction.agent_type.as_str())
        .bind(interaction.object_id)
        .bind(interaction.object_type.as_str())
        .bind(interaction.interaction_type.as_str())
        .bind(interaction.created_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn remove_interaction(
        &self,
        agent_id: RecordId,
        object_id: RecordId,
        object_type: ObjectType,
        interaction_type: InteractionType,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            "DELETE FROM interactions
             WHERE agent_id = ? AND object_id = ? AND object_type = ? AND interaction_type = ?",
        )
        .bind(agent_id)
        .bind(object_id)
        .bind(object_type.as_str())
        .bind(interaction_type.as_str())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn create_comment(&self, mut comment: Comment) -> AppResult<Comment> {
        if comment.created_at == 0 {
            comment.created_at = current_time_millis();
        }
        let result = sqlx::query(
            "INSERT INTO comments
                (creator_id, parent_type, parent_id, parent_comment_id, depth, body, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(comment.creator_id)
        .bind(comment.parent_type.as_str())
        .bind(comment.parent_id)
        .bind(comment.parent_comment_id)
        .bind(comment.depth as i64)
        .bind(&comment.body)
        .bind(comment.created_at)
        .execute(&self.pool)
        .await?;
        comment.id = result.last_insert_rowid();
        Ok(comment)
    }

    async fn comment_by_id(&self, id: RecordId) -> AppResult<Option<Comment>> {
        let row = sqlx::query("SELECT * FROM comments WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(comment_from_row).transpose()
    }

    async fn comments_for_parent(
        &self,
        parent_type: ObjectType,
        parent_id: RecordId,
    ) -> AppResult<Vec<Comment>> {
        let rows = sqlx::query(
            "SELECT * FROM comments WHERE parent_type = ? AND parent_id = ?
             ORDER BY created_at ASC, id ASC",
        )
        .bind(parent_type.as_str())
        .bind(parent_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(comment_from_row).collect()
    }

    async fn comment_counts(
        &self,
        parent_type: ObjectType,
        parent_ids: &[RecordId],
    ) -> AppResult<HashMap<RecordId, u64>> {
        if parent_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let mut qb = QueryBuilder::<Sqlite>::new(
            "SELECT parent_id, COUNT(*) AS n FROM comments WHERE parent_type = ",
        );
        qb.push_bind(parent_type.as_str());
        qb.push(" AND parent_id IN (");
        let mut separated = qb.separated(", ");
        for id in parent_ids {
            separated.push_bind(id);
        }
        qb.push(") GROUP BY parent_id");
        let rows = qb.build().fetch_all(&self.pool).await?;
        let mut counts = HashMap::new();
        for row in &rows {
            let parent_id: RecordId = row.try_get("parent_id")?;
            let n: i64 = row.try_get("n")?;
            counts.insert(parent_id, n as u64);
        }
        Ok(counts)
    }

    async fn add_shelf_item(&self, mut item: ShelfItem) -> AppResult<ShelfItem> {
        if item.created_at == 0 {
            item.created_at = current_time_millis();
        }
        let result = sqlx::query(
            "INSERT INTO shelf_items (profile_id, book_id, shelf, created_at)
             VALUES (?, ?, ?, ?)",
        )
        .bind(item.profile_id)
        .bind(item.book_id)
        .bind(&item.shelf)
        .bind(item.created_at)
        .execute(&self.pool)
        .await?;
        item.id = result.last_insert_rowid();
        item.book = self.book_by_id(item.book_id).await?;
        Ok(item)
    }

    async fn shelf_activity_for_profiles(
        &self,
        profile_ids: &[RecordId],
        per_profile: u32,
    ) -> AppResult<HashMap<RecordId, Vec<ShelfItem>>> {
        if profile_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let mut qb = QueryBuilder::<Sqlite>::new(
            "SELECT s.id AS shelf_item_id, s.profile_id, s.book_id, s.shelf,
                    s.created_at AS shelved_at, b.*
             FROM shelf_items s LEFT JOIN books b ON b.id = s.book_id
             WHERE s.profile_id IN (",
        );
        let mut separated = qb.separated(", ");
        for id in profile_ids {
            separated.push_bind(id);
        }
        qb.push(") ORDER BY s.created_at DESC, s.id DESC");
        let rows = qb.build().fetch_all(&self.pool).await?;

        let mut by_profile: HashMap<RecordId, Vec<ShelfItem>> = HashMap::new();
        for row in &rows {
            let profile_id: RecordId = row.try_get("profile_id")?;
            let items = by_profile.entry(profile_id).or_default();
            if items.len() >= per_profile as usize {
                continue;
            }
            let book = if row.try_get::<Option<RecordId>, _>("id")?.is_some() {
                Some(book_from_row(row)?)
            } else {
                None
            };
            items.push(ShelfItem {
                id: row.try_get("shelf_item_id")?,
                profile_id,
                book_id: row.try_get("book_id")?,
                shelf: row.try_get("shelf")?,
                created_at: row.try_get("shelved_at")?,
                book,
            });
        }
        Ok(by_profile)
    }

    #[instrument(skip(self))]
    async fn search_book_candidates(
        &self,
        query: &str,
        limit: u32,
    ) -> AppResult<Vec<BookCandidate>> {
        let tokens = normalize::tokenize(query);
        if tokens.is_empty() {
            return Ok(Vec::new());
        }
        let mut qb = QueryBuilder::<Sqlite>::new(
            "SELECT id, title, author_name, cover_url, edition_count, first_published_year, (",
        );
        for (i, token) in tokens.iter().enumerate() {
            if i > 0 {
                qb.push(" + ");
            }
            qb.push("(instr(search_text, ");
            qb.push_bind(token.clone());
            qb.push(") > 0)");
        }
        qb.push(") AS matched FROM books WHERE ");
        for (i, token) in tokens.iter().enumerate() {
            if i > 0 {
                qb.push(" OR ");
            }
            qb.push("instr(search_text, ");
            qb.push_bind(token.clone());
            qb.push(") > 0");
        }
        qb.push(" ORDER BY matched DESC, edition_count DESC, id ASC LIMIT ");
        qb.push_bind(limit as i64);
        let rows = qb.build().fetch_all(&self.pool).await?;

        rows.iter()
            .map(|row| {
                let matched: i64 = row.try_get("matched")?;
                let edition_count = row.try_get::<i64, _>("edition_count")? as u32;
                Ok(BookCandidate {
                    id: row.try_get("id")?,
                    title: row.try_get("title")?,
                    author_name: row.try_get("author_name")?,
                    cover_url: row.try_get("cover_url")?,
                    edition_count,
                    first_published_year: row
                        .try_get::<Option<i64>, _>("first_published_year")?
                        .map(|y| y as i32),
                    relevance: matched as f64 * 10.0 + (1.0 + edition_count as f64).ln(),
                })
            })
            .collect()
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
        let mut qb = QueryBuilder::<Sqlite>::new(
            "SELECT id, handle, display_name, avatar_url, (",
        );
        for (i, token) in tokens.iter().enumerate() {
            if i > 0 {
                qb.push(" + ");
            }
            qb.push("(instr(lower(display_name || ' ' || handle), ");
            qb.push_bind(token.clone());
            qb.push(") > 0)");
        }
        qb.push(") AS matched FROM profiles WHERE ");
        for (i, token) in tokens.iter().enumerate() {
            if i > 0 {
                qb.push(" OR ");
            }
            qb.push("instr(lower(display_name || ' ' || handle), ");
            qb.push_bind(token.clone());
            qb.push(") > 0");
        }
        qb.push(" ORDER BY matched DESC, id ASC LIMIT ");
        qb.push_bind(limit as i64);
        let rows = qb.build().fetch_all(&self.pool).await?;

        rows.iter()
            .map(|row| {
                let matched: i64 = row.try_get("matched")?;
                Ok(PersonCandidate {
                    id: row.try_get("id")?,
                    handle: row.try_get("handle")?,
                    display_name: row.try_get("display_name")?,
                    avatar_url: row.try_get("avatar_url")?,
                    relevance: matched as f64 * 10.0,
                })
            })
            .collect()
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
            created_at: 0,
            updated_at: 0,
        }
    }

    #[tokio::test]
    async fn test_interaction_uniqueness_enforced_by_schema() {
        let store = SqliteStore::new_in_memory().await.unwrap();
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
    async fn test_book_round_trip_and_patch() {
        let store = SqliteStore::new_in_memory().await.unwrap();
        let created = store
            .create_book(book("The Disposessed", "Ursula K. Le Guin", 40))
            .await
            .unwrap();

        let patch = BookPatch {
            title: Some("The Dispossessed".to_string()),
            ..Default::default()
        };
        let updated = store.update_book(created.id, &patch).await.unwrap();
        assert_eq!(updated.title, "The Dispossessed");

        // Cache must not serve the pre-patch row.
        let fetched = store.book_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.title, "The Dispossessed");
    }

    #[tokio::test]
    async fn test_search_candidates_relevance_order() {
        let store = SqliteStore::new_in_memory().await.unwrap();
        store
            .create_book(book("Ender's Game", "Orson Scott Card", 120))
            .await
            .unwrap();
        store
            .create_book(book("The Games People Play", "Eric Berne", 5))
            .await
            .unwrap();

        let candidates = store
            .search_book_candidates("enders game", 10)
            .await
            .unwrap();
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].title, "Ender's Game");
    }

    #[tokio::test]
    async fn test_comment_counts_batched() {
        let store = SqliteStore::new_in_memory().await.unwrap();
        for parent_id in [1, 1, 2] {
            store
                .create_comment(Comment {
                    id: 0,
                    creator_id: 9,
                    parent_type: ObjectType::Note,
                    parent_id,
                    parent_comment_id: None,
                    depth: 0,
                    body: "nice shelf".to_string(),
                    created_at: 0,
                })
                .await
                .unwrap();
        }
        let counts = store
            .comment_counts(ObjectType::Note, &[1, 2, 3])
            .await
            .unwrap();
        assert_eq!(counts.get(&1), Some(&2));
        assert_eq!(counts.get(&2), Some(&1));
        assert_eq!(counts.get(&3), None);
    }
}
