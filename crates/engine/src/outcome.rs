//! Execution context and outcome shared by every node processor.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use coldreach_core::types::{Campaign, Contact, ContactEnrollment, ExecutionStatus, FlowNode};

/// Everything a processor may consult when executing one node for one
/// enrollment. Processors read this; all writes go through the engine.
pub struct ExecutionContext<'a> {
    pub campaign: &'a Campaign,
    pub node: &'a FlowNode,
    pub enrollment: &'a ContactEnrollment,
    pub contact: &'a Contact,
    /// Sweep time from the engine clock; processors never read the wall
    /// clock directly.
    pub now: DateTime<Utc>,
}

/// What happened when a processor executed a node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionOutcome {
    pub status: ExecutionStatus,
    /// A failure an operator has to fix; retrying without intervention is
    /// pointless.
    pub terminal: bool,
    pub message: Option<String>,
    pub subject: Option<String>,
    pub body: Option<String>,
    pub message_id: Option<String>,
    /// For delay nodes: when the enrollment becomes due again.
    pub scheduled_for: Option<DateTime<Utc>>,
    pub error: Option<String>,
    /// Present on success/skip: the order to advance to.
    pub next_node_order: Option<u32>,
    pub next_action_at: Option<DateTime<Utc>>,
}

impl ExecutionOutcome {
    pub fn completed(next_node_order: u32, next_action_at: DateTime<Utc>) -> Self {
        Self {
            status: ExecutionStatus::Completed,
            terminal: false,
            message: None,
            subject: None,
            body: None,
            message_id: None,
            scheduled_for: None,
            error: None,
            next_node_order: Some(next_node_order),
            next_action_at: Some(next_action_at),
        }
    }

    pub fn skipped(
        reason: impl Into<String>,
        next_node_order: u32,
        next_action_at: DateTime<Utc>,
    ) -> Self {
        Self {
            status: ExecutionStatus::Skipped,
            message: Some(reason.into()),
            ..Self::completed(next_node_order, next_action_at)
        }
    }

    /// Retryable failure: the enrollment stays put and the next sweep tries
    /// again.
    pub fn retryable_failure(error: impl Into<String>) -> Self {
        Self {
            status: ExecutionStatus::Failed,
            terminal: false,
            message: None,
            subject: None,
            body: None,
            message_id: None,
            scheduled_for: None,
            error: Some(error.into()),
            next_node_order: None,
            next_action_at: None,
        }
    }

    /// Non-retryable failure: surfaced for operator review.
    pub fn terminal_failure(error: impl Into<String>) -> Self {
        Self {
            terminal: true,
            ..Self::retryable_failure(error)
        }
    }

    pub fn is_success(&self) -> bool {
        self.status != ExecutionStatus::Failed
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_content(mut self, subject: Option<String>, body: Option<String>) -> Self {
        self.subject = subject;
        self.body = body;
        self
    }

    pub fn with_message_id(mut self, message_id: impl Into<String>) -> Self {
        self.message_id = Some(message_id.into());
        self
    }

    pub fn with_scheduled_for(mut self, at: DateTime<Utc>) -> Self {
        self.scheduled_for = Some(at);
        self
    }
}
