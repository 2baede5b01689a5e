//! Axum REST handlers for the outreach API.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use uuid::Uuid;

use coldreach_core::error::OutreachError;
use coldreach_core::types::{Campaign, SweepSummary};
use coldreach_engine::{CampaignEngine, EnrollOutcome};
use coldreach_store::{CampaignStore, EnrollmentStore};

use crate::models::*;

/// Shared API state.
#[derive(Clone)]
pub struct ApiState {
    pub engine: Arc<CampaignEngine>,
    pub campaigns: Arc<CampaignStore>,
    pub enrollments: Arc<EnrollmentStore>,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn map_error(err: OutreachError) -> ApiError {
    let (status, code) = match &err {
        OutreachError::DataIntegrity(_) => (StatusCode::NOT_FOUND, "not_found"),
        OutreachError::Config(_) => (StatusCode::UNPROCESSABLE_ENTITY, "invalid_state"),
        OutreachError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
    };
    (
        status,
        Json(ErrorResponse {
            error: code.to_string(),
            message: err.to_string(),
        }),
    )
}

// ─── Health ────────────────────────────────────────────────────────────────

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: "coldreach".to_string(),
    })
}

// ─── Cron ──────────────────────────────────────────────────────────────────

/// Sweep every active campaign once. Idempotent; the scheduler may call it
/// as often as it likes.
pub async fn process_campaigns(State(state): State<ApiState>) -> Json<SweepSummary> {
    metrics::counter!("api.cron_invocations").increment(1);
    Json(state.engine.process_all_scheduled())
}

// ─── Campaigns ─────────────────────────────────────────────────────────────

pub async fn list_campaigns(State(state): State<ApiState>) -> Json<Vec<Campaign>> {
    Json(state.campaigns.list())
}

pub async fn get_campaign(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Campaign>, StatusCode> {
    state
        .campaigns
        .get(id)
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

pub async fn start_campaign(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SweepSummary>, ApiError> {
    state.engine.start_campaign(id).map(Json).map_err(map_error)
}

pub async fn pause_campaign(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Campaign>, ApiError> {
    state.engine.pause_campaign(id).map(Json).map_err(map_error)
}

pub async fn resume_campaign(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SweepSummary>, ApiError> {
    state
        .engine
        .resume_campaign(id)
        .map(Json)
        .map_err(map_error)
}

// ─── Enrollment ────────────────────────────────────────────────────────────

pub async fn add_contact(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
    Json(req): Json<AddContactRequest>,
) -> Result<(StatusCode, Json<AddContactResponse>), ApiError> {
    match state
        .engine
        .add_contact_to_campaign(id, req.contact_id, req.custom_variables)
        .map_err(map_error)?
    {
        EnrollOutcome::Enrolled(enrollment) => {
            metrics::counter!("api.contacts_enrolled").increment(1);
            Ok((
                StatusCode::CREATED,
                Json(AddContactResponse {
                    status: "enrolled".to_string(),
                    enrollment_id: Some(enrollment.id),
                }),
            ))
        }
        EnrollOutcome::AlreadyEnrolled => Ok((
            StatusCode::OK,
            Json(AddContactResponse {
                status: "already_enrolled".to_string(),
                enrollment_id: None,
            }),
        )),
    }
}

pub async fn remove_contact(
    State(state): State<ApiState>,
    Path((id, contact_id)): Path<(Uuid, Uuid)>,
) -> StatusCode {
    if state.engine.remove_contact_from_campaign(id, contact_id) {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

pub async fn list_enrollments(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
) -> Json<Vec<coldreach_core::types::ContactEnrollment>> {
    Json(state.enrollments.for_campaign(id))
}

// ─── Engagement webhooks ───────────────────────────────────────────────────

pub async fn email_event(
    State(state): State<ApiState>,
    Json(req): Json<EngagementEventRequest>,
) -> Json<EngagementEventResponse> {
    let at = req.occurred_at.unwrap_or_else(Utc::now);
    let recorded = state
        .engine
        .record_engagement(&req.message_id, req.kind, at)
        .is_some();
    if recorded {
        metrics::counter!("api.engagement_events").increment(1);
    }
    Json(EngagementEventResponse { recorded })
}
