//! Sample-data seeder for local development: a handful of profiles, a
//! small book catalog, shelves backdated over the past weeks, and enough
//! likes/follows to make the feed and search endpoints interesting.

use chrono::{Duration, Utc};
use rand::prelude::*;
use tracing::info;

use crate::error::AppResult;
use crate::models::{
    Book, FeedItem, FeedObjectKind, Interaction, InteractionType, ObjectType, Profile, ShelfItem,
};
use crate::store::CatalogStore;

const SAMPLE_BOOKS: &[(&str, &str, u32, i32)] = &[
    ("Ender's Game", "Orson Scott Card", 120, 1985),
    ("The Dispossessed", "Ursula K. Le Guin", 61, 1974),
    ("The Left Hand of Darkness", "Ursula K. Le Guin", 77, 1969),
    ("Piranesi", "Susanna Clarke", 44, 2020),
    ("Dune", "Frank Herbert", 150, 1965),
    ("The Player of Games", "Iain M. Banks", 38, 1988),
    ("Solaris", "Stanislaw Lem", 52, 1961),
    ("Middlemarch", "George Eliot", 98, 1871),
];

const SAMPLE_PROFILES: &[(&str, &str)] = &[
    ("ada", "Ada Fenwick"),
    ("marta", "Marta Okafor"),
    ("jun", "Jun Ishikawa"),
    ("theo", "Theo Brandt"),
    ("noor", "Noor Haddad"),
];

const SHELVES: &[&str] = &["reading", "read", "want-to-read"];

pub async fn seed(store: &dyn CatalogStore) -> AppResult<()> {
    let mut rng = rand::rng();
    let now = Utc::now();

    let mut books = Vec::new();
    for &(title, author, editions, year) in SAMPLE_BOOKS {
        let book = store
            .create_book(Book {
                id: 0,
                title: title.to_string(),
                author_name: author.to_string(),
                cover_url: None,
                cover_url_small: None,
                open_library_work_id: None,
                edition_count: editions,
                first_published_year: Some(year),
                is_translated: matches!(author, "Stanislaw Lem"),
                description: None,
                created_at: 0,
                updated_at: 0,
            })
            .await?;
        books.push(book);
    }

    let mut profiles = Vec::new();
    for &(handle, display_name) in SAMPLE_PROFILES {
        let profile = store
            .create_profile(Profile::new(0, handle, display_name))
            .await?;
        profiles.push(profile);
    }

    // Everyone follows a couple of the others.
    for profile in &profiles {
        for other in profiles.choose_multiple(&mut rng, 2) {
            if other.id != profile.id {
                store
                    .add_interaction(Interaction::new(
                        profile.id,
                        other.id,
                        ObjectType::Profile,
                        InteractionType::Follow,
                    ))
                    .await?;
            }
        }
    }

    // Shelf activity spread over the last month.
    for profile in &profiles {
        for book in books.choose_multiple(&mut rng, 3) {
            let days_ago = rng.random_range(0..30);
            let shelved_at = (now - Duration::days(days_ago)).timestamp_millis();
            store
                .add_shelf_item(ShelfItem {
                    id: 0,
                    profile_id: profile.id,
                    book_id: book.id,
                    shelf: SHELVES.choose(&mut rng).copied().unwrap_or("read").to_string(),
                    created_at: shelved_at,
                    book: None,
                })
                .await?;
        }
    }

    // A few notes with likes from other profiles.
    for (n, profile) in profiles.iter().enumerate() {
        let days_ago = rng.random_range(0..14);
        let posted_at = (now - Duration::days(days_ago)).timestamp_millis();
        let note = store
            .create_feed_item(FeedItem {
                id: 0,
                kind: FeedObjectKind::Note,
                creator_id: profile.id,
                title: None,
                body: format!("Note {} from {}", n, profile.handle),
                created_at: posted_at,
                updated_at: posted_at,
                like_count: 0,
                comment_count: 0,
                current_user_like: false,
                current_user_save: false,
            })
            .await?;
        for other in &profiles {
            if other.id != profile.id && rng.random_bool(0.5) {
                store
                    .add_interaction(Interaction::new(
                        other.id,
                        note.id,
                        ObjectType::Note,
                        InteractionType::Like,
                    ))
                    .await?;
            }
        }
    }

    info!(
        books = books.len(),
        profiles = profiles.len(),
        "seeded sample data"
    );
    Ok(())
}
