use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::app_state::AppState;
use crate::error::{AppError, AppResult};
use crate::feed::{
    build_comment_tree, decorate_feed_page, decorate_with_followers, decorate_with_following,
    interleave_friends_activity, CommentNode, FollowOptions, FriendActivity,
};
use crate::models::{
    Book, BookCandidate, BookPatch, Comment, FeedItem, Interaction, InteractionType, ObjectType,
    PersonCandidate, Profile, RecordId, ShelfItem,
};
use crate::search::rank_by_quality;

pub const VIEWER_HEADER: &str = "x-profile-id";

/// How many relevance-ordered candidates to pull from the store before
/// fuzzy re-ranking trims them down.
const CANDIDATE_FETCH_LIMIT: u32 = 50;

const COMMENT_TREE_MAX_DEPTH: u32 = 4;

#[derive(Serialize)]
pub struct ApiResponse<T> {
    success: bool,
    data: Option<T>,
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }
}

/// Resolve the acting profile from the `x-profile-id` header, if any.
/// Authentication itself happens upstream; this trusts the gateway.
async fn viewer_from_headers(state: &AppState, headers: &HeaderMap) -> AppResult<Option<Profile>> {
    let Some(raw) = headers.get(VIEWER_HEADER) else {
        return Ok(None);
    };
    let id: RecordId = raw
        .to_str()
        .ok()
        .and_then(|value| value.parse().ok())
        .ok_or_else(|| AppError::BadRequest(format!("invalid {} header", VIEWER_HEADER)))?;
    state.store.profile_by_id(id).await
}

async fn require_viewer(state: &AppState, headers: &HeaderMap) -> AppResult<Profile> {
    viewer_from_headers(state, headers)
        .await?
        .ok_or_else(|| AppError::Unauthorized("viewer profile required".to_string()))
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    q: String,
}

#[instrument(skip(state))]
pub async fn search_books(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> AppResult<Json<ApiResponse<Vec<BookCandidate>>>> {
    if params.q.trim().is_empty() {
        return Err(AppError::BadRequest("query must not be blank".to_string()));
    }
    let candidates = state
        .store
        .search_book_candidates(&params.q, CANDIDATE_FETCH_LIMIT)
        .await?;
    let ranked = rank_by_quality(candidates, &params.q);
    Ok(ApiResponse::ok(ranked))
}

#[instrument(skip(state))]
pub async fn search_people(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> AppResult<Json<ApiResponse<Vec<PersonCandidate>>>> {
    if params.q.trim().is_empty() {
        return Err(AppError::BadRequest("query must not be blank".to_string()));
    }
    let candidates = state
        .store
        .search_person_candidates(&params.q, CANDIDATE_FETCH_LIMIT)
        .await?;
    let ranked = rank_by_quality(candidates, &params.q);
    Ok(ApiResponse::ok(ranked))
}

#[derive(Debug, Deserialize)]
pub struct FeedParams {
    cursor: Option<String>,
}

#[derive(Serialize)]
pub struct FeedPage {
    items: Vec<FeedItem>,
    next_cursor: Option<String>,
}

fn decode_cursor(cursor: &Option<String>) -> AppResult<u64> {
    let Some(cursor) = cursor else {
        return Ok(0);
    };
    let bytes = URL_SAFE_NO_PAD
        .decode(cursor)
        .map_err(|_| AppError::BadRequest("invalid cursor".to_string()))?;
    String::from_utf8(bytes)
        .ok()
        .and_then(|value| value.parse().ok())
        .ok_or_else(|| AppError::BadRequest("invalid cursor".to_string()))
}

fn encode_cursor(offset: u64) -> String {
    URL_SAFE_NO_PAD.encode(offset.to_string())
}

#[instrument(skip(state, headers))]
pub async fn home_feed(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<FeedParams>,
) -> AppResult<Json<ApiResponse<FeedPage>>> {
    let offset = decode_cursor(&params.cursor)?;
    let page_size = state.config.feed.page_size;

    let (viewer, items) = futures::try_join!(
        viewer_from_headers(&state, &headers),
        state.store.recent_feed_items(page_size, offset),
    )?;

    let items = decorate_feed_page(&*state.store, items, viewer.as_ref()).await?;

    let next_cursor = if items.len() as u64 == page_size as u64 {
        Some(encode_cursor(offset + page_size as u64))
    } else {
        None
    };
    Ok(ApiResponse::ok(FeedPage { items, next_cursor }))
}

#[instrument(skip(state, headers))]
pub async fn friends_activity(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> AppResult<Json<ApiResponse<Vec<ShelfItem>>>> {
    let viewer = require_viewer(&state, &headers).await?;

    let mut profiles = vec![viewer];
    decorate_with_following(
        &*state.store,
        &mut profiles,
        FollowOptions {
            include_activity: true,
            activity_per_profile: state.config.feed.activity_per_friend,
        },
    )
    .await?;

    let friends: Vec<FriendActivity> = profiles
        .remove(0)
        .following
        .unwrap_or_default()
        .into_iter()
        .map(|profile| {
            let items = profile.recent_activity.clone().unwrap_or_default();
            FriendActivity { profile, items }
        })
        .collect();

    let interleaved =
        interleave_friends_activity(friends, state.config.feed.friends_activity_limit);
    Ok(ApiResponse::ok(interleaved))
}

#[derive(Debug, Deserialize)]
pub struct InteractionRequest {
    object_type: ObjectType,
    object_id: RecordId,
}

async fn add_viewer_interaction(
    state: &AppState,
    headers: &HeaderMap,
    request: InteractionRequest,
    interaction_type: InteractionType,
) -> AppResult<StatusCode> {
    let viewer = require_viewer(state, headers).await?;
    let created = state
        .store
        .add_interaction(Interaction::new(
            viewer.id,
            request.object_id,
            request.object_type,
            interaction_type,
        ))
        .await?;
    info!(
        viewer = viewer.id,
        object = request.object_id,
        %interaction_type,
        created,
        "interaction added"
    );
    Ok(if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    })
}

async fn remove_viewer_interaction(
    state: &AppState,
    headers: &HeaderMap,
    request: InteractionRequest,
    interaction_type: InteractionType,
) -> AppResult<StatusCode> {
    let viewer = require_viewer(state, headers).await?;
    let removed = state
        .store
        .remove_interaction(
            viewer.id,
            request.object_id,
            request.object_type,
            interaction_type,
        )
        .await?;
    Ok(if removed {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    })
}

pub async fn create_like(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<InteractionRequest>,
) -> AppResult<StatusCode> {
    add_viewer_interaction(&state, &headers, request, InteractionType::Like).await
}

pub async fn delete_like(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<InteractionRequest>,
) -> AppResult<StatusCode> {
    remove_viewer_interaction(&state, &headers, request, InteractionType::Like).await
}

pub async fn create_save(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<InteractionRequest>,
) -> AppResult<StatusCode> {
    add_viewer_interaction(&state, &headers, request, InteractionType::Save).await
}

pub async fn delete_save(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<InteractionRequest>,
) -> AppResult<StatusCode> {
    remove_viewer_interaction(&state, &headers, request, InteractionType::Save).await
}

pub async fn create_follow(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(profile_id): Path<RecordId>,
) -> AppResult<StatusCode> {
    let viewer = require_viewer(&state, &headers).await?;
    if viewer.id == profile_id {
        return Err(AppError::BadRequest(
            "cannot follow your own profile".to_string(),
        ));
    }
    if state.store.profile_by_id(profile_id).await?.is_none() {
        return Err(AppError::NotFound(format!("profile {}", profile_id)));
    }
    let created = state
        .store
        .add_interaction(Interaction::new(
            viewer.id,
            profile_id,
            ObjectType::Profile,
            InteractionType::Follow,
        ))
        .await?;
    Ok(if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    })
}

pub async fn delete_follow(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(profile_id): Path<RecordId>,
) -> AppResult<StatusCode> {
    let viewer = require_viewer(&state, &headers).await?;
    let removed = state
        .store
        .remove_interaction(
            viewer.id,
            profile_id,
            ObjectType::Profile,
            InteractionType::Follow,
        )
        .await?;
    Ok(if removed {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    })
}

#[derive(Deserialize)]
pub struct CreateCommentRequest {
    parent_type: ObjectType,
    parent_id: RecordId,
    parent_comment_id: Option<RecordId>,
    body: String,
}

pub async fn create_comment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CreateCommentRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Comment>>)> {
    let viewer = require_viewer(&state, &headers).await?;
    if request.body.trim().is_empty() {
        return Err(AppError::Validation("comment body is empty".to_string()));
    }

    let depth = match request.parent_comment_id {
        Some(parent_comment_id) => {
            let parent = state
                .store
                .comment_by_id(parent_comment_id)
                .await?
                .ok_or_else(|| {
                    AppError::NotFound(format!("comment {}", parent_comment_id))
                })?;
            if parent.parent_type != request.parent_type || parent.parent_id != request.parent_id {
                return Err(AppError::Validation(
                    "reply targets a different thread".to_string(),
                ));
            }
            parent.depth + 1
        }
        None => 0,
    };

    let comment = state
        .store
        .create_comment(Comment {
            id: 0,
            creator_id: viewer.id,
            parent_type: request.parent_type,
            parent_id: request.parent_id,
            parent_comment_id: request.parent_comment_id,
            depth,
            body: request.body,
            created_at: 0,
        })
        .await?;
    Ok((StatusCode::CREATED, ApiResponse::ok(comment)))
}

#[derive(Deserialize)]
pub struct CommentThreadParams {
    parent_type: ObjectType,
    parent_id: RecordId,
}

pub async fn comment_thread(
    State(state): State<AppState>,
    Query(params): Query<CommentThreadParams>,
) -> AppResult<Json<ApiResponse<Vec<CommentNode>>>> {
    let comments = state
        .store
        .comments_for_parent(params.parent_type, params.parent_id)
        .await?;
    Ok(ApiResponse::ok(build_comment_tree(
        comments,
        COMMENT_TREE_MAX_DEPTH,
    )))
}

pub async fn get_profile(
    State(state): State<AppState>,
    Path(profile_id): Path<RecordId>,
) -> AppResult<Json<ApiResponse<Profile>>> {
    let profile = state
        .store
        .profile_by_id(profile_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("profile {}", profile_id)))?;

    let mut profiles = vec![profile];
    decorate_with_following(&*state.store, &mut profiles, FollowOptions::default()).await?;
    decorate_with_followers(&*state.store, &mut profiles, FollowOptions::default()).await?;
    Ok(ApiResponse::ok(profiles.remove(0)))
}

pub async fn get_book(
    State(state): State<AppState>,
    Path(book_id): Path<RecordId>,
) -> AppResult<Json<ApiResponse<Book>>> {
    let book = state
        .store
        .book_by_id(book_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("book {}", book_id)))?;
    Ok(ApiResponse::ok(book))
}

pub async fn patch_book(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(book_id): Path<RecordId>,
    Json(patch): Json<BookPatch>,
) -> AppResult<Json<ApiResponse<Book>>> {
    let viewer = require_viewer(&state, &headers).await?;
    if patch.is_empty() {
        return Err(AppError::Validation("patch has no fields".to_string()));
    }
    let book = state.store.update_book(book_id, &patch).await?;
    info!(editor = viewer.id, book = book_id, "book updated");
    Ok(ApiResponse::ok(book))
}

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}
