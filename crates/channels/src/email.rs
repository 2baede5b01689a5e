//! Email transport — sender trait plus a Gmail relay provider.
//!
//! The provider mirrors a production Gmail API integration: it builds the
//! send payload, logs, records the outbound message, and returns a provider
//! message id. Transport failures split into transient (retryable) and
//! permanent so the engine can decide whether to retry.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use coldreach_core::config::EmailConfig;

/// One outbound email, fully rendered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailDispatch {
    pub to: String,
    pub subject: String,
    pub html_body: String,
    pub account_id: Uuid,
    pub track_opens: bool,
    pub track_clicks: bool,
}

/// Successful send acknowledgement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendReceipt {
    pub message_id: String,
    pub accepted_at: DateTime<Utc>,
}

/// Transport failure, classified for retry decisions.
#[derive(Error, Debug, Clone)]
pub enum SendError {
    /// Network problem, timeout, or provider 5xx — retry on the next sweep.
    #[error("transient send failure: {0}")]
    Transient(String),
    /// Rejected address, revoked credentials — retrying will not help.
    #[error("permanent send failure: {0}")]
    Permanent(String),
}

impl SendError {
    pub fn is_transient(&self) -> bool {
        matches!(self, SendError::Transient(_))
    }
}

/// Email transport boundary consumed by the email node processor.
pub trait EmailSender: Send + Sync {
    fn send(&self, dispatch: &EmailDispatch) -> Result<SendReceipt, SendError>;
}

/// A message the relay accepted, kept for inspection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentEmail {
    pub message_id: String,
    pub dispatch: EmailDispatch,
    pub accepted_at: DateTime<Utc>,
}

/// Gmail relay provider.
/// In production: POST to the Gmail API `users.messages.send` endpoint with
/// the account's OAuth token, bounded by `config.send_timeout_ms`.
pub struct GmailRelayProvider {
    config: EmailConfig,
    sent: DashMap<String, SentEmail>,
}

impl GmailRelayProvider {
    pub fn new(config: EmailConfig) -> Self {
        info!(
            from = %config.from_email,
            timeout_ms = config.send_timeout_ms,
            "Gmail relay provider initialized"
        );
        Self {
            config,
            sent: DashMap::new(),
        }
    }

    pub fn get_sent(&self, message_id: &str) -> Option<SentEmail> {
        self.sent.get(message_id).map(|r| r.value().clone())
    }

    pub fn sent_count(&self) -> usize {
        self.sent.len()
    }

    /// Sent messages, most recent first.
    pub fn list_sent(&self, limit: usize) -> Vec<SentEmail> {
        let mut messages: Vec<SentEmail> = self.sent.iter().map(|r| r.value().clone()).collect();
        messages.sort_by(|a, b| b.accepted_at.cmp(&a.accepted_at));
        messages.truncate(limit);
        messages
    }

    pub fn config(&self) -> &EmailConfig {
        &self.config
    }
}

impl EmailSender for GmailRelayProvider {
    fn send(&self, dispatch: &EmailDispatch) -> Result<SendReceipt, SendError> {
        if dispatch.to.trim().is_empty() || !dispatch.to.contains('@') {
            return Err(SendError::Permanent(format!(
                "invalid recipient address: {:?}",
                dispatch.to
            )));
        }

        debug!(
            to = %dispatch.to,
            subject = %dispatch.subject,
            account_id = %dispatch.account_id,
            "Sending email via Gmail relay"
        );

        // Build the relay payload (stub — in production, HTTP POST to Gmail)
        let _payload = serde_json::json!({
            "to": [{"email": dispatch.to}],
            "from": {
                "email": self.config.from_email,
                "name": self.config.from_name,
            },
            "subject": dispatch.subject,
            "content": [{"type": "text/html", "value": dispatch.html_body}],
            "tracking_settings": {
                "open_tracking": {"enable": dispatch.track_opens && self.config.open_tracking},
                "click_tracking": {"enable": dispatch.track_clicks && self.config.click_tracking},
            },
        });

        metrics::counter!(
            "email.sent",
            "account_id" => dispatch.account_id.to_string()
        )
        .increment(1);

        let accepted_at = Utc::now();
        let message_id = format!("gm-{}", Uuid::new_v4());
        self.sent.insert(
            message_id.clone(),
            SentEmail {
                message_id: message_id.clone(),
                dispatch: dispatch.clone(),
                accepted_at,
            },
        );

        Ok(SendReceipt {
            message_id,
            accepted_at,
        })
    }
}
