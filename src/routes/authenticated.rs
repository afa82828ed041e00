use crate::{AppState, handlers};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{post, put},
};

/// Body cap for multipart content mutations. News uploads may carry a video,
/// so this is far above the generic upload limit.
const CONTENT_BODY_LIMIT: usize = 500 * 1024 * 1024;

/// Authenticated Router Module
///
/// Defines the content-mutation routes accessible to any admin who has passed
/// the bearer-token middleware, regardless of role.
///
/// Access Control Strategy:
/// Every handler in this module relies on the auth middleware being present
/// on the router layer above, which guarantees a validated `AuthUser` with
/// the caller's ID, role and site scope.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // POST /news
        // Creates an article from a multipart payload (text fields plus cover
        // image, gallery and video uploads).
        .route("/news", post(handlers::create_news))
        // PUT/DELETE /news/{id}
        // Partial update merged into the stored row, and delete with
        // best-effort cleanup of every referenced file.
        .route(
            "/news/{id}",
            put(handlers::update_news).delete(handlers::delete_news),
        )
        // POST /categories
        .route("/categories", post(handlers::create_category))
        // PUT/DELETE /categories/{id}
        .route(
            "/categories/{id}",
            put(handlers::update_category).delete(handlers::delete_category),
        )
        // Multipart bodies on this tier may include video files.
        .layer(DefaultBodyLimit::max(CONTENT_BODY_LIMIT))
}
