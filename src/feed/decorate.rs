//! Viewer-relative and aggregate social metadata for fetched records.
//!
//! Each function issues a small constant number of batched store lookups
//! for the whole object list, then does its grouping synchronously. The
//! batching is load-bearing: one decoration call must never turn into one
//! query per item.

use std::collections::{HashMap, HashSet};

use crate::error::AppResult;
use crate::models::{
    FeedItem, FeedObjectKind, Interaction, InteractionType, ObjectType, Profile, RecordId,
};
use crate::store::CatalogStore;

/// Options for follower/following decoration.
#[derive(Debug, Clone, Copy, Default)]
pub struct FollowOptions {
    /// Also attach each related profile's recent shelf activity.
    pub include_activity: bool,
    /// Cap on shelf items per related profile when activity is included.
    pub activity_per_profile: u32,
}

fn group_by_object(interactions: &[Interaction]) -> HashMap<RecordId, Vec<&Interaction>> {
    let mut grouped: HashMap<RecordId, Vec<&Interaction>> = HashMap::new();
    for interaction in interactions {
        grouped.entry(interaction.object_id).or_default().push(interaction);
    }
    grouped
}

/// Attach `like_count` and, when a viewer is present, `current_user_like`
/// to every item. Items nobody liked get a count of zero, not an absent
/// field. `object_type` must describe the whole (homogeneous) list.
pub async fn decorate_with_likes(
    store: &dyn CatalogStore,
    items: &mut [FeedItem],
    object_type: ObjectType,
    viewer: Option<&Profile>,
) -> AppResult<()> {
    let ids: Vec<RecordId> = items.iter().map(|item| item.id).collect();
    let likes = store
        .interactions_for_objects(object_type, &ids, InteractionType::Like)
        .await?;
    let grouped = group_by_object(&likes);

    for item in items.iter_mut() {
        let item_likes = grouped.get(&item.id);
        item.like_count = item_likes.map(|likes| likes.len() as u64).unwrap_or(0);
        item.current_user_like = match (viewer, item_likes) {
            (Some(viewer), Some(likes)) => likes.iter().any(|like| like.agent_id == viewer.id),
            _ => false,
        };
    }
    Ok(())
}

/// Attach `current_user_save` for the viewer. A no-op without a viewer.
pub async fn decorate_with_saves(
    store: &dyn CatalogStore,
    items: &mut [FeedItem],
    object_type: ObjectType,
    viewer: Option<&Profile>,
) -> AppResult<()> {
    let Some(viewer) = viewer else {
        return Ok(());
    };
    let ids: Vec<RecordId> = items.iter().map(|item| item.id).collect();
    let saves = store
        .interactions_for_objects(object_type, &ids, InteractionType::Save)
        .await?;
    let saved_by_viewer: HashSet<RecordId> = saves
        .iter()
        .filter(|save| save.agent_id == viewer.id)
        .map(|save| save.object_id)
        .collect();
    for item in items.iter_mut() {
        item.current_user_save = saved_by_viewer.contains(&item.id);
    }
    Ok(())
}

/// Attach `comment_count` from one batched count lookup keyed by parent id.
pub async fn decorate_with_comments(
    store: &dyn CatalogStore,
    items: &mut [FeedItem],
    parent_type: ObjectType,
    _viewer: Option<&Profile>,
) -> AppResult<()> {
    let ids: Vec<RecordId> = items.iter().map(|item| item.id).collect();
    let counts = store.comment_counts(parent_type, &ids).await?;
    for item in items.iter_mut() {
        item.comment_count = counts.get(&item.id).copied().unwrap_or(0);
    }
    Ok(())
}

/// Fully decorate a (possibly mixed-kind) feed page: likes, saves, and
/// comment counts, each applied per homogeneous kind group. Returns the
/// items in reverse-chronological order.
pub async fn decorate_feed_page(
    store: &dyn CatalogStore,
    items: Vec<FeedItem>,
    viewer: Option<&Profile>,
) -> AppResult<Vec<FeedItem>> {
    let mut by_kind: HashMap<FeedObjectKind, Vec<FeedItem>> = HashMap::new();
    for item in items {
        by_kind.entry(item.kind).or_default().push(item);
    }

    let mut decorated: Vec<FeedItem> = Vec::new();
    for (kind, mut group) in by_kind {
        let object_type = kind.object_type();
        decorate_with_likes(store, &mut group, object_type, viewer).await?;
        decorate_with_saves(store, &mut group, object_type, viewer).await?;
        decorate_with_comments(store, &mut group, object_type, viewer).await?;
        decorated.extend(group);
    }

    decorated.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    Ok(decorated)
}

/// Resolve who each profile follows and attach the related records.
///
/// One interaction lookup for the whole profile set, one profile fetch for
/// the union of followed ids, and (optionally) one batched shelf-activity
/// fetch across every followed profile.
pub async fn decorate_with_following(
    store: &dyn CatalogStore,
    profiles: &mut [Profile],
    options: FollowOptions,
) -> AppResult<()> {
    let ids: Vec<RecordId> = profiles.iter().map(|profile| profile.id).collect();
    let follows = store
        .interactions_by_agents(&ids, ObjectType::Profile, InteractionType::Follow)
        .await?;

    let mut followed_by_agent: HashMap<RecordId, Vec<RecordId>> = HashMap::new();
    let mut all_followed: Vec<RecordId> = Vec::new();
    let mut seen: HashSet<RecordId> = HashSet::new();
    for follow in &follows {
        followed_by_agent
            .entry(follow.agent_id)
            .or_default()
            .push(follow.object_id);
        if seen.insert(follow.object_id) {
            all_followed.push(follow.object_id);
        }
    }

    let mut resolved: HashMap<RecordId, Profile> = store
        .profiles_by_ids(&all_followed)
        .await?
        .into_iter()
        .map(|profile| (profile.id, profile))
        .collect();

    if options.include_activity {
        let activity = store
            .shelf_activity_for_profiles(&all_followed, options.activity_per_profile)
            .await?;
        for (profile_id, items) in activity {
            if let Some(profile) = resolved.get_mut(&profile_id) {
                profile.recent_activity = Some(items);
            }
        }
    }

    for profile in profiles.iter_mut() {
        let followed = followed_by_agent.remove(&profile.id).unwrap_or_default();
        let records: Vec<Profile> = followed
            .iter()
            .filter_map(|id| resolved.get(id).cloned())
            .collect();
        profile.following_count = Some(records.len() as u64);
        profile.following = Some(records);
    }
    Ok(())
}

/// Mirror of [`decorate_with_following`] with the profiles on the object
/// side of the follow edge.
pub async fn decorate_with_followers(
    store: &dyn CatalogStore,
    profiles: &mut [Profile],
    options: FollowOptions,
) -> AppResult<()> {
    let ids: Vec<RecordId> = profiles.iter().map(|profile| profile.id).collect();
    let follows = store
        .interactions_for_objects(ObjectType::Profile, &ids, InteractionType::Follow)
        .await?;

    let mut followers_by_object: HashMap<RecordId, Vec<RecordId>> = HashMap::new();
    let mut all_followers: Vec<RecordId> = Vec::new();
    let mut seen: HashSet<RecordId> = HashSet::new();
    for follow in &follows {
        followers_by_object
            .entry(follow.object_id)
            .or_default()
            .push(follow.agent_id);
        if seen.insert(follow.agent_id) {
            all_followers.push(follow.agent_id);
        }
    }

    let mut resolved: HashMap<RecordId, Profile> = store
        .profiles_by_ids(&all_followers)
        .await?
        .into_iter()
        .map(|profile| (profile.id, profile))
        .collect();

    if options.include_activity {
        let activity = store
            .shelf_activity_for_profiles(&all_followers, options.activity_per_profile)
            .await?;
        for (profile_id, items) in activity {
            if let Some(profile) = resolved.get_mut(&profile_id) {
                profile.recent_activity = Some(items);
            }
        }
    }

    for profile in profiles.iter_mut() {
        let followers = followers_by_object.remove(&profile.id).unwrap_or_default();
        let records: Vec<Profile> = followers
            .iter()
            .filter_map(|id| resolved.get(id).cloned())
            .collect();
        profile.follower_count = Some(records.len() as u64);
        profile.followers = Some(records);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{current_time_millis, FeedObjectKind, ShelfItem};
    use crate::store::MemoryStore;

    fn note(creator_id: RecordId, body: &str) -> FeedItem {
        FeedItem {
            id: 0,
            kind: FeedObjectKind::Note,
            creator_id,
            title: None,
            body: body.to_string(),
            created_at: current_time_millis(),
            updated_at: current_time_millis(),
            like_count: 0,
            comment_count: 0,
            current_user_like: false,
            current_user_save: false,
        }
    }

    async fn like(store: &MemoryStore, agent_id: RecordId, object_id: RecordId) {
        store
            .add_interaction(Interaction::new(
                agent_id,
                object_id,
                ObjectType::Note,
                InteractionType::Like,
            ))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_like_counts_default_to_zero() {
        let store = MemoryStore::new();
        let a = store.create_feed_item(note(1, "first")).await.unwrap();
        let b = store.create_feed_item(note(1, "second")).await.unwrap();
        like(&store, 2, a.id).await;
        like(&store, 3, a.id).await;

        let mut items = vec![a, b];
        decorate_with_likes(&store, &mut items, ObjectType::Note, None)
            .await
            .unwrap();
        assert_eq!(items[0].like_count, 2);
        assert_eq!(items[1].like_count, 0);
        assert!(!items[0].current_user_like);
    }

    #[tokio::test]
    async fn test_viewer_like_is_marked() {
        let store = MemoryStore::new();
        let viewer = store.create_profile(Profile::new(0, "ada", "Ada")).await.unwrap();
        let item = store.create_feed_item(note(1, "note")).await.unwrap();
        like(&store, viewer.id, item.id).await;
        like(&store, 99, item.id).await;

        let mut items = vec![item];
        decorate_with_likes(&store, &mut items, ObjectType::Note, Some(&viewer))
            .await
            .unwrap();
        assert_eq!(items[0].like_count, 2);
        assert!(items[0].current_user_like);
    }

    #[tokio::test]
    async fn test_like_count_increases_after_new_like() {
        let store = MemoryStore::new();
        let item = store.create_feed_item(note(1, "note")).await.unwrap();
        like(&store, 2, item.id).await;

        let mut items = vec![item.clone()];
        decorate_with_likes(&store, &mut items, ObjectType::Note, None)
            .await
            .unwrap();
        let before = items[0].like_count;

        like(&store, 3, item.id).await;
        let mut items = vec![item];
        decorate_with_likes(&store, &mut items, ObjectType::Note, None)
            .await
            .unwrap();
        assert_eq!(items[0].like_count, before + 1);
    }

    #[tokio::test]
    async fn test_mixed_kind_page_decorates_per_kind() {
        let store = MemoryStore::new();
        let note_item = store.create_feed_item(note(1, "a note")).await.unwrap();
        let mut post_item = note(1, "a post");
        post_item.kind = FeedObjectKind::Post;
        let post_item = store.create_feed_item(post_item).await.unwrap();

        like(&store, 2, note_item.id).await;
        store
            .add_interaction(Interaction::new(
                2,
                post_item.id,
                ObjectType::Post,
                InteractionType::Like,
            ))
            .await
            .unwrap();

        let items = store.recent_feed_items(10, 0).await.unwrap();
        let decorated = decorate_feed_page(&store, items, None).await.unwrap();
        assert_eq!(decorated.len(), 2);
        assert!(decorated.iter().all(|item| item.like_count == 1));
        // Reverse-chronological order survives the per-kind grouping.
        assert!(decorated[0].created_at >= decorated[1].created_at);
    }

    #[tokio::test]
    async fn test_comment_counts_attach() {
        let store = MemoryStore::new();
        let item = store.create_feed_item(note(1, "note")).await.unwrap();
        store
            .create_comment(crate::models::Comment {
                id: 0,
                creator_id: 5,
                parent_type: ObjectType::Note,
                parent_id: item.id,
                parent_comment_id: None,
                depth: 0,
                body: "agreed".to_string(),
                created_at: current_time_millis(),
            })
            .await
            .unwrap();

        let mut items = vec![item];
        decorate_with_comments(&store, &mut items, ObjectType::Note, None)
            .await
            .unwrap();
        assert_eq!(items[0].comment_count, 1);
    }

    #[tokio::test]
    async fn test_following_decoration_attaches_profiles_and_activity() {
        let store = MemoryStore::new();
        let alice = store.create_profile(Profile::new(0, "alice", "Alice")).await.unwrap();
        let bob = store.create_profile(Profile::new(0, "bob", "Bob")).await.unwrap();
        store
            .add_interaction(Interaction::new(
                alice.id,
                bob.id,
                ObjectType::Profile,
                InteractionType::Follow,
            ))
            .await
            .unwrap();
        store
            .add_shelf_item(ShelfItem {
                id: 0,
                profile_id: bob.id,
                book_id: 1,
                shelf: "reading".to_string(),
                created_at: current_time_millis(),
                book: None,
            })
            .await
            .unwrap();

        let mut profiles = vec![alice];
        decorate_with_following(
            &store,
            &mut profiles,
            FollowOptions {
                include_activity: true,
                activity_per_profile: 5,
            },
        )
        .await
        .unwrap();

        let following = profiles[0].following.as_ref().unwrap();
        assert_eq!(profiles[0].following_count, Some(1));
        assert_eq!(following.len(), 1);
        assert_eq!(following[0].id, bob.id);
        assert_eq!(following[0].recent_activity.as_ref().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_followers_decoration() {
        let store = MemoryStore::new();
        let alice = store.create_profile(Profile::new(0, "alice", "Alice")).await.unwrap();
        let bob = store.create_profile(Profile::new(0, "bob", "Bob")).await.unwrap();
        let cara = store.create_profile(Profile::new(0, "cara", "Cara")).await.unwrap();
        for follower in [&bob, &cara] {
            store
                .add_interaction(Interaction::new(
                    follower.id,
                    alice.id,
                    ObjectType::Profile,
                    InteractionType::Follow,
                ))
                .await
                .unwrap();
        }

        let mut profiles = vec![alice];
        decorate_with_followers(&store, &mut profiles, FollowOptions::default())
            .await
            .unwrap();
        assert_eq!(profiles[0].follower_count, Some(2));
        assert_eq!(profiles[0].followers.as_ref().unwrap().len(), 2);
    }
}
