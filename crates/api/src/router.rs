//! API router — mounts all endpoints under /api/v1.

use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{self, ApiState};

/// Build the full API router.
pub fn api_router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        // Cron
        .route(
            "/api/v1/cron/process-campaigns",
            post(handlers::process_campaigns),
        )
        // Campaigns
        .route("/api/v1/campaigns", get(handlers::list_campaigns))
        .route("/api/v1/campaigns/:id", get(handlers::get_campaign))
        .route("/api/v1/campaigns/:id/start", post(handlers::start_campaign))
        .route("/api/v1/campaigns/:id/pause", post(handlers::pause_campaign))
        .route(
            "/api/v1/campaigns/:id/resume",
            post(handlers::resume_campaign),
        )
        // Enrollment
        .route(
            "/api/v1/campaigns/:id/contacts",
            get(handlers::list_enrollments).post(handlers::add_contact),
        )
        .route(
            "/api/v1/campaigns/:id/contacts/:contact_id",
            delete(handlers::remove_contact),
        )
        // Engagement webhooks
        .route("/api/v1/events/email", post(handlers::email_event))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
