pub mod health;

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::state::AppState;
use crate::{auth, cvs, generation, stats, upgrade};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Sign-in sync
        .route("/api/v1/auth/sync", post(auth::handle_sync))
        // Generation
        .route("/api/v1/generate", post(generation::handlers::handle_generate))
        // CV store
        .route("/api/v1/cv", post(cvs::handlers::handle_save_cv))
        .route("/api/v1/cv", get(cvs::handlers::handle_list_cvs))
        .route("/api/v1/cv/:id", get(cvs::handlers::handle_get_cv))
        .route("/api/v1/cv/:id", delete(cvs::handlers::handle_delete_cv))
        .route(
            "/api/v1/cv/:id/download",
            get(cvs::handlers::handle_download_cv),
        )
        // Upgrade-request workflow
        .route(
            "/api/v1/upgrade-requests",
            post(upgrade::handlers::handle_submit),
        )
        .route(
            "/api/v1/upgrade-requests",
            get(upgrade::handlers::handle_list),
        )
        .route(
            "/api/v1/upgrade-requests/:id",
            post(upgrade::handlers::handle_review),
        )
        // Public stats
        .route(
            "/api/v1/stats/public",
            get(stats::handlers::handle_public_stats),
        )
        .with_state(state)
}
