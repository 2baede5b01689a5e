//! LinkedIn actions — connection requests and direct messages.
//!
//! Connection notes are capped at LinkedIn's 300-character bound;
//! [`truncate_note`] enforces it without splitting a UTF-8 character.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::email::SendError;

/// Character bound LinkedIn applies to connection request notes.
pub const CONNECT_NOTE_MAX_CHARS: usize = 300;

/// Acknowledgement of a dispatched LinkedIn action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionReceipt {
    pub action_id: String,
    pub accepted_at: DateTime<Utc>,
}

/// LinkedIn action boundary consumed by the connect/message processors.
pub trait LinkedInActor: Send + Sync {
    fn connect(
        &self,
        profile_url: &str,
        note: Option<&str>,
        account_id: Uuid,
    ) -> Result<ActionReceipt, SendError>;

    fn message(
        &self,
        profile_url: &str,
        body: &str,
        account_id: Uuid,
    ) -> Result<ActionReceipt, SendError>;
}

/// Truncate a connection note to the 300-character bound, appending an
/// ellipsis when cut.
pub fn truncate_note(note: &str) -> String {
    if note.chars().count() <= CONNECT_NOTE_MAX_CHARS {
        return note.to_string();
    }
    let truncated: String = note.chars().take(CONNECT_NOTE_MAX_CHARS - 3).collect();
    format!("{truncated}...")
}

/// Kind of LinkedIn action recorded by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkedInActionKind {
    Connect,
    Message,
}

/// One recorded LinkedIn action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkedInAction {
    pub action_id: String,
    pub kind: LinkedInActionKind,
    pub profile_url: String,
    pub body: Option<String>,
    pub account_id: Uuid,
    pub accepted_at: DateTime<Utc>,
}

/// LinkedIn automation provider.
/// In production: drives a browser-automation worker with per-account
/// session cookies; here the action log stands in for the worker queue.
pub struct LinkedInAutomationProvider {
    actions: DashMap<String, LinkedInAction>,
}

impl LinkedInAutomationProvider {
    pub fn new() -> Self {
        info!("LinkedIn automation provider initialized");
        Self {
            actions: DashMap::new(),
        }
    }

    pub fn get_action(&self, action_id: &str) -> Option<LinkedInAction> {
        self.actions.get(action_id).map(|r| r.value().clone())
    }

    pub fn action_count(&self) -> usize {
        self.actions.len()
    }

    /// Actions for a profile, oldest first.
    pub fn actions_for_profile(&self, profile_url: &str) -> Vec<LinkedInAction> {
        let mut actions: Vec<LinkedInAction> = self
            .actions
            .iter()
            .filter(|r| r.value().profile_url == profile_url)
            .map(|r| r.value().clone())
            .collect();
        actions.sort_by_key(|a| a.accepted_at);
        actions
    }

    fn record(
        &self,
        kind: LinkedInActionKind,
        profile_url: &str,
        body: Option<String>,
        account_id: Uuid,
    ) -> Result<ActionReceipt, SendError> {
        if !profile_url.contains("linkedin.com/") {
            return Err(SendError::Permanent(format!(
                "not a LinkedIn profile URL: {profile_url:?}"
            )));
        }

        let accepted_at = Utc::now();
        let action_id = format!("li-{}", Uuid::new_v4());
        debug!(
            action_id = %action_id,
            ?kind,
            profile_url,
            account_id = %account_id,
            "LinkedIn action queued"
        );

        metrics::counter!(
            "linkedin.actions",
            "kind" => format!("{kind:?}")
        )
        .increment(1);

        self.actions.insert(
            action_id.clone(),
            LinkedInAction {
                action_id: action_id.clone(),
                kind,
                profile_url: profile_url.to_string(),
                body,
                account_id,
                accepted_at,
            },
        );

        Ok(ActionReceipt {
            action_id,
            accepted_at,
        })
    }
}

impl Default for LinkedInAutomationProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl LinkedInActor for LinkedInAutomationProvider {
    fn connect(
        &self,
        profile_url: &str,
        note: Option<&str>,
        account_id: Uuid,
    ) -> Result<ActionReceipt, SendError> {
        self.record(
            LinkedInActionKind::Connect,
            profile_url,
            note.map(truncate_note),
            account_id,
        )
    }

    fn message(
        &self,
        profile_url: &str,
        body: &str,
        account_id: Uuid,
    ) -> Result<ActionReceipt, SendError> {
        self.record(
            LinkedInActionKind::Message,
            profile_url,
            Some(body.to_string()),
            account_id,
        )
    }
}
