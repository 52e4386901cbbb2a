// API - HTTP surface over the store, decoration, and ranking layers

pub mod handlers;

use axum::{
    extract::Request,
    http::HeaderValue,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tracing::Instrument;
use uuid::Uuid;

use crate::app_state::AppState;

/// Tag every request with an id for log correlation and echo it back.
async fn request_id(request: Request, next: Next) -> Response {
    let id = Uuid::new_v4();
    let span = tracing::info_span!(
        "request",
        request_id = %id,
        method = %request.method(),
        uri = %request.uri()
    );
    let mut response = next.run(request).instrument(span).await;
    if let Ok(value) = HeaderValue::from_str(&id.to_string()) {
        response.headers_mut().insert("x-request-id", value);
    }
    response
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/search/books", get(handlers::search_books))
        .route("/api/search/people", get(handlers::search_people))
        .route("/api/feed", get(handlers::home_feed))
        .route("/api/feed/friends", get(handlers::friends_activity))
        .route(
            "/api/likes",
            post(handlers::create_like).delete(handlers::delete_like),
        )
        .route(
            "/api/saves",
            post(handlers::create_save).delete(handlers::delete_save),
        )
        .route(
            "/api/follows/{profile_id}",
            post(handlers::create_follow).delete(handlers::delete_follow),
        )
        .route(
            "/api/comments",
            get(handlers::comment_thread).post(handlers::create_comment),
        )
        .route("/api/profiles/{profile_id}", get(handlers::get_profile))
        .route(
            "/api/books/{book_id}",
            get(handlers::get_book).patch(handlers::patch_book),
        )
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_id))
                .layer(cors),
        )
        .with_state(state)
}
