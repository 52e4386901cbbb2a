use catalog::feed::{
    decorate_with_following, decorate_with_likes, interleave_friends_activity, FollowOptions,
    FriendActivity,
};
use catalog::models::{
    Book, FeedItem, FeedObjectKind, Interaction, InteractionType, ObjectType, Profile, ShelfItem,
};
use catalog::search::rank_by_quality;
use catalog::store::{CatalogStore, MemoryStore, SqliteStore};

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

fn note(creator_id: i64, body: &str, created_at: i64) -> FeedItem {
    FeedItem {
        id: 0,
        kind: FeedObjectKind::Note,
        creator_id,
        title: None,
        body: body.to_string(),
        created_at,
        updated_at: created_at,
        like_count: 0,
        comment_count: 0,
        current_user_like: false,
        current_user_save: false,
    }
}

#[tokio::test]
async fn search_pipeline_ranks_and_dedups() {
    let store = MemoryStore::new();
    store
        .create_book(book("Ender's Game", "Orson Scott Card", 120))
        .await
        .unwrap();
    store
        .create_book(book("Enders Game", "O.S. Card", 2))
        .await
        .unwrap();
    store
        .create_book(book("Speaker for the Dead", "Orson Scott Card", 60))
        .await
        .unwrap();

    let candidates = store.search_book_candidates("enders game", 20).await.unwrap();
    let ranked = rank_by_quality(candidates, "enders game");

    // The two editions collapse; the unrelated title fails the fuzzy filter.
    assert_eq!(ranked.len(), 1);
    assert_eq!(ranked[0].title, "Ender's Game");
}

#[tokio::test]
async fn friends_feed_end_to_end() {
    let store = MemoryStore::new();
    let viewer = store
        .create_profile(Profile::new(0, "viewer", "The Viewer"))
        .await
        .unwrap();
    let dune = store.create_book(book("Dune", "Frank Herbert", 150)).await.unwrap();

    let mut friend_ids = Vec::new();
    for (handle, latest) in [("ada", 10_000), ("jun", 9_000)] {
        let friend = store
            .create_profile(Profile::new(0, handle, handle))
            .await
            .unwrap();
        store
            .add_interaction(Interaction::new(
                viewer.id,
                friend.id,
                ObjectType::Profile,
                InteractionType::Follow,
            ))
            .await
            .unwrap();
        for n in 0..2 {
            store
                .add_shelf_item(ShelfItem {
                    id: 0,
                    profile_id: friend.id,
                    book_id: dune.id,
                    shelf: "reading".to_string(),
                    created_at: latest - n * 1_000,
                    book: None,
                })
                .await
                .unwrap();
        }
        friend_ids.push(friend.id);
    }

    let mut profiles = vec![viewer];
    decorate_with_following(
        &store,
        &mut profiles,
        FollowOptions {
            include_activity: true,
            activity_per_profile: 10,
        },
    )
    .await
    .unwrap();

    let friends: Vec<FriendActivity> = profiles
        .remove(0)
        .following
        .unwrap()
        .into_iter()
        .map(|profile| {
            let items = profile.recent_activity.clone().unwrap_or_default();
            FriendActivity { profile, items }
        })
        .collect();
    assert_eq!(friends.len(), 2);

    let interleaved = interleave_friends_activity(friends, 3);
    assert_eq!(interleaved.len(), 3);
    // Breadth first: both friends appear before anyone appears twice.
    assert_eq!(interleaved[0].profile_id, friend_ids[0]);
    assert_eq!(interleaved[1].profile_id, friend_ids[1]);
    assert_eq!(interleaved[2].profile_id, friend_ids[0]);
    // Shelf items resolve their book through the batched join.
    assert_eq!(
        interleaved[0].book.as_ref().map(|b| b.title.as_str()),
        Some("Dune")
    );
}

#[tokio::test]
async fn decoration_matches_between_stores() {
    // The in-memory fake and the SQLite store must agree on decoration
    // results for the same writes.
    let memory = MemoryStore::new();
    let sqlite = SqliteStore::new_in_memory().await.unwrap();

    for store in [&memory as &dyn CatalogStore, &sqlite as &dyn CatalogStore] {
        let author = store
            .create_profile(Profile::new(0, "ada", "Ada"))
            .await
            .unwrap();
        let fan = store
            .create_profile(Profile::new(0, "fan", "Fan"))
            .await
            .unwrap();
        let item = store
            .create_feed_item(note(author.id, "finished it at 2am", 5_000))
            .await
            .unwrap();
        store
            .add_interaction(Interaction::new(
                fan.id,
                item.id,
                ObjectType::Note,
                InteractionType::Like,
            ))
            .await
            .unwrap();

        let mut items = store.recent_feed_items(10, 0).await.unwrap();
        decorate_with_likes(store, &mut items, ObjectType::Note, Some(&fan))
            .await
            .unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].like_count, 1);
        assert!(items[0].current_user_like);
    }
}

#[tokio::test]
async fn sqlite_store_persists_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("catalog.db");
    let url = format!("sqlite:{}?mode=rwc", path.display());

    {
        let store = SqliteStore::new(&url, 16).await.unwrap();
        store.init().await.unwrap();
        store
            .create_book(book("Piranesi", "Susanna Clarke", 44))
            .await
            .unwrap();
    }

    let reopened = SqliteStore::new(&url, 16).await.unwrap();
    reopened.init().await.unwrap();
    let candidates = reopened.search_book_candidates("piranesi", 10).await.unwrap();
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].title, "Piranesi");
}
