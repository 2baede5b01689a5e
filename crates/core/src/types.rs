//! Domain types for outreach campaigns, flow nodes, enrollments, and the
//! execution ledger.

use std::collections::HashMap;

use chrono::{DateTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Campaign ──────────────────────────────────────────────────────────────

/// Outreach channel a campaign primarily targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Email,
    Linkedin,
    Instagram,
}

/// Lifecycle status of a campaign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    Draft,
    Active,
    Paused,
    Completed,
}

/// Weekday on which a campaign is allowed to send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SendingDay {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl From<Weekday> for SendingDay {
    fn from(day: Weekday) -> Self {
        match day {
            Weekday::Mon => SendingDay::Monday,
            Weekday::Tue => SendingDay::Tuesday,
            Weekday::Wed => SendingDay::Wednesday,
            Weekday::Thu => SendingDay::Thursday,
            Weekday::Fri => SendingDay::Friday,
            Weekday::Sat => SendingDay::Saturday,
            Weekday::Sun => SendingDay::Sunday,
        }
    }
}

/// Weekdays Monday through Friday.
pub fn business_days() -> Vec<SendingDay> {
    vec![
        SendingDay::Monday,
        SendingDay::Tuesday,
        SendingDay::Wednesday,
        SendingDay::Thursday,
        SendingDay::Friday,
    ]
}

/// An outreach campaign: an ordered flow of typed nodes plus the sending
/// constraints shared by every contact enrolled in it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    pub id: Uuid,
    pub name: String,
    pub platform: Platform,
    pub status: CampaignStatus,
    /// Ordered by `FlowNode::order`, dense from zero.
    pub nodes: Vec<FlowNode>,
    pub email_account_id: Option<Uuid>,
    pub linkedin_account_id: Option<Uuid>,
    /// What the campaign is selling; fed to the AI generator as purpose context.
    pub product_prompt: Option<String>,
    /// Extra writing instructions for the AI generator.
    pub instructions_prompt: Option<String>,
    /// Fixed UTC offset of the campaign's local time, in minutes.
    pub utc_offset_minutes: i32,
    pub sending_days: Vec<SendingDay>,
    /// Local hour (inclusive) from which sending is allowed.
    pub sending_start_hour: u32,
    /// Local hour (exclusive) until which sending is allowed.
    pub sending_end_hour: u32,
    /// Maximum enrollments processed per sweep of this campaign.
    pub daily_limit: usize,
    pub total_sent: u64,
    pub started_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Campaign {
    /// Returns the flow node at the given execution order, if any.
    pub fn node_at(&self, order: u32) -> Option<&FlowNode> {
        self.nodes.iter().find(|n| n.order == order)
    }
}

// ─── Flow nodes ────────────────────────────────────────────────────────────

/// The closed set of node types a flow may contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    TriggerStart,
    ActionEmail,
    ActionLinkedinConnect,
    ActionLinkedinMessage,
    ActionInstagramDm,
    Delay,
    Condition,
    ManualTask,
}

/// How an action node produces its content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NodeMode {
    /// Use the stored template as-is (with variable substitution).
    #[default]
    Always,
    /// Generate content with the AI generator, falling back to the template.
    Ai,
    /// Content authored per-contact by an operator.
    Manual,
}

/// Unit for a delay node's magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DelayUnit {
    Minutes,
    Hours,
    Days,
}

/// Skip conditions evaluated against the execution ledger before an action
/// node dispatches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeConditions {
    #[serde(default)]
    pub only_if_no_reply: bool,
    #[serde(default)]
    pub only_if_no_open: bool,
    #[serde(default)]
    pub only_if_no_click: bool,
}

/// A single node in a campaign's flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowNode {
    pub id: Uuid,
    pub campaign_id: Uuid,
    /// Zero-based, dense position in the flow's total execution order.
    pub order: u32,
    pub node_type: NodeType,
    pub title: String,
    #[serde(default)]
    pub mode: NodeMode,
    /// AI purpose prompt for this node, overriding the campaign product prompt.
    pub prompt: Option<String>,
    pub delay_value: Option<i64>,
    pub delay_unit: Option<DelayUnit>,
    pub subject: Option<String>,
    pub body: Option<String>,
    pub conditions: Option<NodeConditions>,
    /// Condition nodes jump here when their predicate matches.
    pub branch_order: Option<u32>,
    #[serde(default)]
    pub total_executed: u64,
    #[serde(default)]
    pub total_success: u64,
    #[serde(default)]
    pub total_failed: u64,
}

impl FlowNode {
    /// Bare node with no content, useful as a starting point for builders.
    pub fn new(campaign_id: Uuid, order: u32, node_type: NodeType, title: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            campaign_id,
            order,
            node_type,
            title: title.to_string(),
            mode: NodeMode::Always,
            prompt: None,
            delay_value: None,
            delay_unit: None,
            subject: None,
            body: None,
            conditions: None,
            branch_order: None,
            total_executed: 0,
            total_success: 0,
            total_failed: 0,
        }
    }
}

// ─── Enrollment ────────────────────────────────────────────────────────────

/// Runtime status of a contact's enrollment in a campaign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentStatus {
    Active,
    Paused,
    Completed,
    Removed,
}

/// Per (campaign, contact) progress record. Mutated only by the engine as it
/// advances nodes; `version` is the optimistic-concurrency token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactEnrollment {
    pub id: Uuid,
    pub campaign_id: Uuid,
    pub contact_id: Uuid,
    pub status: EnrollmentStatus,
    /// Order of the node not yet executed.
    pub current_node_order: u32,
    /// Earliest wall-clock time the engine may act; None means eligible
    /// immediately when still at order 0.
    pub next_action_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub custom_variables: HashMap<String, String>,
    /// Set when a non-retryable configuration failure needs operator action.
    pub needs_review: Option<String>,
    #[serde(default)]
    pub failed_attempts: u32,
    pub version: u64,
    pub enrolled_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

// ─── Execution ledger ──────────────────────────────────────────────────────

/// Outcome class of a single node execution attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Completed,
    Failed,
    Skipped,
}

/// Append-only record of one node execution attempt for one enrollment.
/// The idempotency anchor: at most one non-failed record exists per
/// (enrollment, node) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub id: Uuid,
    pub enrollment_id: Uuid,
    pub node_id: Uuid,
    pub node_order: u32,
    /// 1-based attempt counter for this (enrollment, node) pair.
    pub attempt: u32,
    pub status: ExecutionStatus,
    pub executed_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    /// For delay nodes: when the enrollment becomes due again.
    pub scheduled_for: Option<DateTime<Utc>>,
    pub subject: Option<String>,
    pub body: Option<String>,
    /// Provider message id of the dispatched email or LinkedIn action.
    pub message_id: Option<String>,
    pub error: Option<String>,
    pub opened_at: Option<DateTime<Utc>>,
    pub clicked_at: Option<DateTime<Utc>>,
    pub replied_at: Option<DateTime<Utc>>,
}

/// Engagement kinds reported back by channel webhooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngagementKind {
    Open,
    Click,
    Reply,
}

// ─── Contacts & accounts ───────────────────────────────────────────────────

/// Company a contact belongs to. Read-only from the engine's perspective.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Company {
    pub name: String,
    pub industry: Option<String>,
    pub website: Option<String>,
}

/// A prospect. Read-only from the engine's perspective.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contact {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub linkedin_url: Option<String>,
    pub job_title: Option<String>,
    pub company: Option<Company>,
}

impl Contact {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Email provider behind a sending account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailProviderKind {
    Gmail,
    Smtp,
}

/// A connected email sending account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailAccount {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    pub provider: EmailProviderKind,
    pub is_active: bool,
    /// Per-account sends allowed in a rolling 24h window.
    pub daily_cap: u32,
}

/// A connected LinkedIn account used for connects and messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkedInAccount {
    pub id: Uuid,
    pub profile_name: String,
    pub is_active: bool,
}

// ─── Sweep summary ─────────────────────────────────────────────────────────

/// Counts returned by every batch entry point instead of raising on partial
/// failure.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SweepSummary {
    pub processed: u64,
    pub errors: u64,
}

impl SweepSummary {
    pub fn merge(&mut self, other: SweepSummary) {
        self.processed += other.processed;
        self.errors += other.errors;
    }
}
