use crate::{AppState, handlers};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

/// Body cap for the generic upload gateway.
const UPLOAD_BODY_LIMIT: usize = 10 * 1024 * 1024;

/// Public Router Module
///
/// Defines endpoints that are **unauthenticated** and accessible to any
/// client. These cover the read-only content surface (news, categories), the
/// login gateway, the contact form and the generic file upload.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // A simple, unauthenticated endpoint used for monitoring and load balancer checks.
        // Returns "ok" immediately to verify the service is running and responsive.
        .route("/health", get(|| async { "ok" }))
        // POST /login
        // The identity gateway: verifies credentials and mints the bearer token
        // every protected route expects.
        .route("/login", post(handlers::login))
        // POST /contact
        // Accepts a contact form submission and hands it to the asynchronous
        // SMTP relay pipeline. Always acknowledges immediately.
        .route("/contact", post(handlers::submit_contact))
        // GET /news and GET /news/{id}
        // Read-only article access; the list is ordered newest first.
        .route("/news", get(handlers::list_news))
        .route("/news/{id}", get(handlers::get_news_item))
        // GET /categories and GET /categories/{id}
        .route("/categories", get(handlers::list_categories))
        .route("/categories/{id}", get(handlers::get_category))
        // POST /upload
        // Generic single-file upload, capped at 10MB by the per-route body
        // limit. Oversized bodies are rejected before the handler runs.
        .route(
            "/upload",
            post(handlers::upload_file).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
}
