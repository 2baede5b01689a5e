//! Request and response bodies for the HTTP surface.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use coldreach_core::types::EngagementKind;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
}

#[derive(Debug, Deserialize)]
pub struct AddContactRequest {
    pub contact_id: Uuid,
    #[serde(default)]
    pub custom_variables: HashMap<String, String>,
}

#[derive(Debug, Serialize)]
pub struct AddContactResponse {
    /// "enrolled" or "already_enrolled".
    pub status: String,
    pub enrollment_id: Option<Uuid>,
}

/// Webhook payload reporting an open/click/reply on a sent message.
#[derive(Debug, Deserialize)]
pub struct EngagementEventRequest {
    pub message_id: String,
    pub kind: EngagementKind,
    /// Defaults to receipt time when the provider omits it.
    pub occurred_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct EngagementEventResponse {
    pub recorded: bool,
}
