use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, put},
};

/// Admin Router Module
///
/// Defines the admin-account management surface, nested under `/admin` and
/// wrapped in the same bearer-token middleware as the authenticated tier.
///
/// Access Control:
/// Authentication alone is not sufficient here. Each handler runs the
/// authorization policy on the caller's claims: create/list/delete require
/// the super_admin role, and update applies the self-vs-cross-account rules.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // POST /admin and GET /admin
        // Account creation (always admin-role rows) and the full listing.
        // Both are super_admin-only.
        .route(
            "/",
            get(handlers::list_admins).post(handlers::create_admin),
        )
        // PUT/DELETE /admin/{id}
        // Update is policy-gated per field; delete is super_admin-only and
        // never removes a super_admin row.
        .route(
            "/{id}",
            put(handlers::update_admin).delete(handlers::delete_admin),
        )
}
