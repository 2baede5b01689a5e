//! Campaign engine — the orchestrator that walks due enrollments through
//! their campaign flows.
//!
//! One sweep visits every ACTIVE campaign, gates on its sending window, and
//! takes up to `daily_limit` due enrollments. Each enrollment is advanced
//! through consecutive zero-delay nodes in a bounded chain; a delay node that
//! schedules into the future ends the chain for this sweep.
//!
//! Re-invocation is safe: before a node with an external side effect is
//! dispatched, the ledger is probed for a prior non-failed record of the same
//! (enrollment, node) pair, and a hit advances the enrollment without sending
//! again. Progress writes go through the version-checked enrollment advance,
//! so a racing sweep loses with a `Conflict` instead of double-advancing.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use coldreach_core::error::{OutreachError, OutreachResult};
use coldreach_core::event_bus::{make_event, EventSink, EventType};
use coldreach_core::types::{
    Campaign, CampaignStatus, ContactEnrollment, EngagementKind, EnrollmentStatus, ExecutionRecord,
    ExecutionStatus, NodeType, SweepSummary,
};
use coldreach_delivery::SendingWindow;
use coldreach_store::{CampaignStore, ContactStore, EnrollmentStore, ExecutionLedger};

use crate::clock::Clock;
use crate::outcome::ExecutionContext;
use crate::processors::NodeProcessor;

/// Result of adding a contact to a campaign. Re-adding an enrolled contact
/// is reported, not raised.
#[derive(Debug, Clone)]
pub enum EnrollOutcome {
    Enrolled(ContactEnrollment),
    AlreadyEnrolled,
}

pub struct CampaignEngine {
    campaigns: Arc<CampaignStore>,
    contacts: Arc<ContactStore>,
    enrollments: Arc<EnrollmentStore>,
    ledger: Arc<ExecutionLedger>,
    processors: Vec<Box<dyn NodeProcessor>>,
    clock: Arc<dyn Clock>,
    events: Arc<dyn EventSink>,
    /// Upper bound on zero-delay chain steps per enrollment per sweep.
    max_chain_steps: u32,
}

impl CampaignEngine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        campaigns: Arc<CampaignStore>,
        contacts: Arc<ContactStore>,
        enrollments: Arc<EnrollmentStore>,
        ledger: Arc<ExecutionLedger>,
        processors: Vec<Box<dyn NodeProcessor>>,
        clock: Arc<dyn Clock>,
        events: Arc<dyn EventSink>,
        max_chain_steps: u32,
    ) -> Self {
        Self {
            campaigns,
            contacts,
            enrollments,
            ledger,
            processors,
            clock,
            events,
            max_chain_steps,
        }
    }

    // ─── Sweep entry points ────────────────────────────────────────────────

    /// The cron entry point: sweep every ACTIVE campaign once.
    pub fn process_all_scheduled(&self) -> SweepSummary {
        metrics::counter!("engine.sweeps").increment(1);
        let mut summary = SweepSummary::default();
        for campaign in self.campaigns.list_active() {
            summary.merge(self.process_scheduled_contacts(campaign.id));
        }
        info!(
            processed = summary.processed,
            errors = summary.errors,
            "Sweep finished"
        );
        summary
    }

    /// Sweep one campaign: window gate, due selection, then per-enrollment
    /// advance. Partial failure is counted, never raised.
    pub fn process_scheduled_contacts(&self, campaign_id: Uuid) -> SweepSummary {
        let mut summary = SweepSummary::default();

        let campaign = match self.campaigns.get(campaign_id) {
            Some(c) => c,
            None => {
                warn!(campaign_id = %campaign_id, "Sweep requested for unknown campaign");
                summary.errors += 1;
                return summary;
            }
        };
        if campaign.status != CampaignStatus::Active {
            debug!(campaign_id = %campaign_id, status = ?campaign.status, "Campaign not active, skipping sweep");
            return summary;
        }

        let now = self.clock.now();

        // One window check covers the whole batch; every enrollment in a
        // campaign shares the window.
        if !SendingWindow::from_campaign(&campaign).is_open(now) {
            debug!(campaign_id = %campaign_id, "Outside sending window, skipping sweep");
            return summary;
        }

        let due = self
            .enrollments
            .due(campaign_id, now, campaign.daily_limit);
        debug!(campaign_id = %campaign_id, due = due.len(), "Due enrollments selected");

        for enrollment in due {
            // An operator may pause mid-batch; stop dispatching immediately.
            if self.campaigns.status(campaign_id) != Some(CampaignStatus::Active) {
                info!(campaign_id = %campaign_id, "Campaign paused mid-sweep, stopping");
                break;
            }
            match self.process_enrollment(campaign_id, enrollment.id) {
                Ok(()) => summary.processed += 1,
                Err(OutreachError::Conflict(reason)) => {
                    // A concurrent sweep won the advance; its work stands.
                    debug!(enrollment_id = %enrollment.id, %reason, "Enrollment advance lost a race");
                }
                Err(err) => {
                    warn!(
                        enrollment_id = %enrollment.id,
                        error = %err,
                        "Enrollment processing failed"
                    );
                    summary.errors += 1;
                }
            }
        }
        summary
    }

    /// Advance one enrollment through consecutive due nodes, bounded by
    /// `max_chain_steps`. Returns after the first failure, the first advance
    /// into the future, or completion of the flow.
    pub fn process_enrollment(&self, campaign_id: Uuid, enrollment_id: Uuid) -> OutreachResult<()> {
        let now = self.clock.now();

        for step in 0..self.max_chain_steps {
            // Reload both sides each step: a pause or a concurrent advance
            // must be observed between chain links.
            let campaign = self.campaigns.get(campaign_id).ok_or_else(|| {
                OutreachError::DataIntegrity(format!("campaign {campaign_id} not found"))
            })?;
            if campaign.status != CampaignStatus::Active {
                return Ok(());
            }
            let enrollment = self.enrollments.get(enrollment_id).ok_or_else(|| {
                OutreachError::DataIntegrity(format!("enrollment {enrollment_id} not found"))
            })?;
            if enrollment.status != EnrollmentStatus::Active {
                return Ok(());
            }
            match enrollment.next_action_at {
                Some(at) if at > now => return Ok(()),
                None if enrollment.current_node_order != 0 => return Ok(()),
                _ => {}
            }

            let node = match campaign.node_at(enrollment.current_node_order) {
                Some(node) => node.clone(),
                None => {
                    // Walked past the last node: the flow is finished.
                    self.enrollments.complete(enrollment.id, now);
                    self.emit(
                        EventType::EnrollmentCompleted,
                        campaign_id,
                        Some(&enrollment),
                        None,
                        None,
                    );
                    metrics::counter!("engine.enrollments_completed").increment(1);
                    return Ok(());
                }
            };

            let contact = self.contacts.get(enrollment.contact_id).ok_or_else(|| {
                OutreachError::DataIntegrity(format!(
                    "contact {} not found for enrollment {enrollment_id}",
                    enrollment.contact_id
                ))
            })?;

            // Idempotency probe for side-effecting nodes: a prior non-failed
            // record means the send already happened (a previous invocation
            // died between dispatch and advance), so advance without sending.
            if has_side_effects(node.node_type) {
                if let Some(prior) = self.ledger.completed_execution(enrollment.id, node.id) {
                    debug!(
                        enrollment_id = %enrollment.id,
                        node_order = node.order,
                        "Node already executed, advancing without re-dispatch"
                    );
                    let next_at = prior.scheduled_for.unwrap_or(now);
                    self.enrollments.advance(
                        enrollment.id,
                        enrollment.version,
                        node.order + 1,
                        Some(next_at),
                    )?;
                    if next_at > now {
                        return Ok(());
                    }
                    continue;
                }
            }

            let processor = self
                .processors
                .iter()
                .find(|p| p.can_process(node.node_type))
                .ok_or_else(|| {
                    let reason = format!("no processor registered for {:?} nodes", node.node_type);
                    self.enrollments.flag_for_review(enrollment.id, &reason);
                    OutreachError::DataIntegrity(reason)
                })?;

            let ctx = ExecutionContext {
                campaign: &campaign,
                node: &node,
                enrollment: &enrollment,
                contact: &contact,
                now,
            };
            let outcome = processor.process(&ctx);

            let attempt = self.ledger.attempt_count(enrollment.id, node.id) + 1;
            self.ledger.append(ExecutionRecord {
                id: Uuid::new_v4(),
                enrollment_id: enrollment.id,
                node_id: node.id,
                node_order: node.order,
                attempt,
                status: outcome.status,
                executed_at: now,
                completed_at: outcome.is_success().then_some(now),
                scheduled_for: outcome.scheduled_for,
                subject: outcome.subject.clone(),
                body: outcome.body.clone(),
                message_id: outcome.message_id.clone(),
                error: outcome.error.clone(),
                opened_at: None,
                clicked_at: None,
                replied_at: None,
            });
            self.campaigns
                .record_node_result(campaign_id, node.order, outcome.is_success());

            if outcome.status == ExecutionStatus::Failed {
                metrics::counter!("engine.node_failures").increment(1);
                self.emit(
                    EventType::NodeFailed,
                    campaign_id,
                    Some(&enrollment),
                    Some(node.order),
                    None,
                );
                let error = outcome
                    .error
                    .unwrap_or_else(|| "node execution failed".to_string());
                return if outcome.terminal {
                    // Enrollment stays ACTIVE at the same node; a config fix
                    // lets the next sweep proceed.
                    self.enrollments.flag_for_review(enrollment.id, &error);
                    Err(OutreachError::Config(error))
                } else {
                    self.enrollments.record_failed_attempt(enrollment.id);
                    Err(OutreachError::Transport(error))
                };
            }

            metrics::counter!("engine.nodes_executed").increment(1);
            if outcome.status == ExecutionStatus::Skipped {
                self.emit(
                    EventType::NodeSkipped,
                    campaign_id,
                    Some(&enrollment),
                    Some(node.order),
                    None,
                );
            } else {
                self.emit(
                    EventType::NodeExecuted,
                    campaign_id,
                    Some(&enrollment),
                    Some(node.order),
                    outcome.message_id.clone(),
                );
                if let Some(sent_event) = send_event_type(node.node_type) {
                    self.campaigns.increment_total_sent(campaign_id);
                    self.emit(
                        sent_event,
                        campaign_id,
                        Some(&enrollment),
                        Some(node.order),
                        outcome.message_id.clone(),
                    );
                }
            }

            let (next_order, next_at) = match (outcome.next_node_order, outcome.next_action_at) {
                (Some(order), Some(at)) => (order, at),
                _ => {
                    return Err(OutreachError::DataIntegrity(
                        "successful outcome carried no advance target".to_string(),
                    ))
                }
            };
            self.enrollments
                .advance(enrollment.id, enrollment.version, next_order, Some(next_at))?;

            if next_at > now {
                // Scheduled into the future; this sweep is done with the
                // enrollment.
                return Ok(());
            }
            debug!(
                enrollment_id = %enrollment.id,
                step,
                next_order,
                "Chaining into next node"
            );
        }

        warn!(
            enrollment_id = %enrollment_id,
            max_chain_steps = self.max_chain_steps,
            "Chain step bound reached, deferring to next sweep"
        );
        metrics::counter!("engine.chain_bound_hits").increment(1);
        Ok(())
    }

    // ─── Campaign lifecycle ────────────────────────────────────────────────

    /// Activate a campaign and run its first processing pass immediately,
    /// without a sending-window check; starting is an explicit operator
    /// action.
    pub fn start_campaign(&self, campaign_id: Uuid) -> OutreachResult<SweepSummary> {
        let campaign = self.campaigns.get(campaign_id).ok_or_else(|| {
            OutreachError::DataIntegrity(format!("campaign {campaign_id} not found"))
        })?;
        if campaign.nodes.is_empty() {
            return Err(OutreachError::Config(
                "campaign has no flow nodes".to_string(),
            ));
        }
        if self.enrollments.active_count(campaign_id) == 0 {
            return Err(OutreachError::Config(
                "campaign has no active contacts enrolled".to_string(),
            ));
        }

        let now = self.clock.now();
        self.campaigns.mark_started(campaign_id, now);
        info!(campaign_id = %campaign_id, name = %campaign.name, "Campaign started");
        self.emit(EventType::CampaignStarted, campaign_id, None, None, None);

        let mut summary = SweepSummary::default();
        for enrollment in self.enrollments.for_campaign(campaign_id) {
            if enrollment.status != EnrollmentStatus::Active {
                continue;
            }
            match self.process_enrollment(campaign_id, enrollment.id) {
                Ok(()) => summary.processed += 1,
                Err(err) => {
                    warn!(enrollment_id = %enrollment.id, error = %err, "Initial pass failed");
                    summary.errors += 1;
                }
            }
        }
        Ok(summary)
    }

    pub fn pause_campaign(&self, campaign_id: Uuid) -> OutreachResult<Campaign> {
        let campaign = self
            .campaigns
            .set_status(campaign_id, CampaignStatus::Paused)
            .ok_or_else(|| {
                OutreachError::DataIntegrity(format!("campaign {campaign_id} not found"))
            })?;
        self.emit(EventType::CampaignPaused, campaign_id, None, None, None);
        Ok(campaign)
    }

    /// Reactivate a paused campaign and sweep it once so overdue enrollments
    /// catch up without waiting for the next cron tick.
    pub fn resume_campaign(&self, campaign_id: Uuid) -> OutreachResult<SweepSummary> {
        self.campaigns
            .set_status(campaign_id, CampaignStatus::Active)
            .ok_or_else(|| {
                OutreachError::DataIntegrity(format!("campaign {campaign_id} not found"))
            })?;
        self.emit(EventType::CampaignResumed, campaign_id, None, None, None);
        Ok(self.process_scheduled_contacts(campaign_id))
    }

    // ─── Enrollment management ─────────────────────────────────────────────

    pub fn add_contact_to_campaign(
        &self,
        campaign_id: Uuid,
        contact_id: Uuid,
        custom_variables: HashMap<String, String>,
    ) -> OutreachResult<EnrollOutcome> {
        self.campaigns.get(campaign_id).ok_or_else(|| {
            OutreachError::DataIntegrity(format!("campaign {campaign_id} not found"))
        })?;
        self.contacts.get(contact_id).ok_or_else(|| {
            OutreachError::DataIntegrity(format!("contact {contact_id} not found"))
        })?;

        let now = self.clock.now();
        match self
            .enrollments
            .enroll(campaign_id, contact_id, custom_variables, now)
        {
            Ok(enrollment) => {
                self.emit(
                    EventType::ContactEnrolled,
                    campaign_id,
                    Some(&enrollment),
                    None,
                    None,
                );
                Ok(EnrollOutcome::Enrolled(enrollment))
            }
            Err(OutreachError::Conflict(_)) => Ok(EnrollOutcome::AlreadyEnrolled),
            Err(err) => Err(err),
        }
    }

    pub fn remove_contact_from_campaign(&self, campaign_id: Uuid, contact_id: Uuid) -> bool {
        let removed = self.enrollments.remove(campaign_id, contact_id);
        if removed {
            let mut event = make_event(
                EventType::ContactRemoved,
                Some(campaign_id),
                None,
                Some(contact_id),
            );
            event.timestamp = self.clock.now();
            self.events.emit(event);
        }
        removed
    }

    // ─── Engagement ────────────────────────────────────────────────────────

    /// Record a webhook-reported engagement against the originating message
    /// and emit the matching event. Unknown message ids are ignored.
    pub fn record_engagement(
        &self,
        message_id: &str,
        kind: EngagementKind,
        at: DateTime<Utc>,
    ) -> Option<ExecutionRecord> {
        let record = self.ledger.record_engagement(message_id, kind, at)?;
        let enrollment = self.enrollments.get(record.enrollment_id);
        let event_type = match kind {
            EngagementKind::Open => EventType::EmailOpened,
            EngagementKind::Click => EventType::EmailClicked,
            EngagementKind::Reply => EventType::EmailReplied,
        };
        let mut event = make_event(
            event_type,
            enrollment.as_ref().map(|e| e.campaign_id),
            Some(record.enrollment_id),
            enrollment.as_ref().map(|e| e.contact_id),
        );
        event.message_id = Some(message_id.to_string());
        self.events.emit(event);
        Some(record)
    }

    fn emit(
        &self,
        event_type: EventType,
        campaign_id: Uuid,
        enrollment: Option<&ContactEnrollment>,
        node_order: Option<u32>,
        message_id: Option<String>,
    ) {
        let mut event = make_event(
            event_type,
            Some(campaign_id),
            enrollment.map(|e| e.id),
            enrollment.map(|e| e.contact_id),
        );
        event.node_order = node_order;
        event.message_id = message_id;
        event.timestamp = self.clock.now();
        self.events.emit(event);
    }
}

/// Node types whose execution leaves a mark outside this process.
fn has_side_effects(node_type: NodeType) -> bool {
    matches!(
        node_type,
        NodeType::ActionEmail
            | NodeType::ActionLinkedinConnect
            | NodeType::ActionLinkedinMessage
            | NodeType::ActionInstagramDm
    )
}

fn send_event_type(node_type: NodeType) -> Option<EventType> {
    match node_type {
        NodeType::ActionEmail => Some(EventType::EmailSent),
        NodeType::ActionLinkedinConnect => Some(EventType::LinkedinConnectSent),
        NodeType::ActionLinkedinMessage => Some(EventType::LinkedinMessageSent),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    use coldreach_channels::linkedin::LinkedInAutomationProvider;
    use coldreach_channels::{GmailRelayProvider, ScriptedGenerator};
    use coldreach_core::config::EmailConfig;
    use coldreach_core::event_bus::{capture_sink, CaptureSink};
    use coldreach_core::types::{
        business_days, Company, Contact, EmailAccount, EmailProviderKind, FlowNode, Platform,
    };
    use coldreach_delivery::DailyCapTracker;
    use coldreach_store::AccountStore;

    use crate::clock::ManualClock;
    use crate::processors::default_processors;

    struct Harness {
        engine: CampaignEngine,
        campaigns: Arc<CampaignStore>,
        contacts: Arc<ContactStore>,
        enrollments: Arc<EnrollmentStore>,
        clock: Arc<ManualClock>,
        events: Arc<CaptureSink>,
        email_account_id: Uuid,
    }

    impl Harness {
        fn new() -> Self {
            // Tuesday 2024-01-02 10:00 UTC, inside a business-hours window.
            let start = Utc.with_ymd_and_hms(2024, 1, 2, 10, 0, 0).unwrap();
            let clock = Arc::new(ManualClock::new(start));

            let campaigns = Arc::new(CampaignStore::new());
            let contacts = Arc::new(ContactStore::new());
            let enrollments = Arc::new(EnrollmentStore::new());
            let ledger = Arc::new(ExecutionLedger::new());
            let accounts = Arc::new(AccountStore::new());
            let events = capture_sink();

            let email_account_id = accounts.insert_email_account(EmailAccount {
                id: Uuid::new_v4(),
                email: "sales@coldreach.example".into(),
                display_name: "ColdReach Sales".into(),
                provider: EmailProviderKind::Gmail,
                is_active: true,
                daily_cap: 100,
            });

            let processors = default_processors(
                ledger.clone(),
                accounts,
                Arc::new(GmailRelayProvider::new(EmailConfig::default())),
                Arc::new(LinkedInAutomationProvider::new()),
                Arc::new(ScriptedGenerator::default()),
                Arc::new(DailyCapTracker::new()),
            );

            let engine = CampaignEngine::new(
                campaigns.clone(),
                contacts.clone(),
                enrollments.clone(),
                ledger,
                processors,
                clock.clone(),
                events.clone(),
                25,
            );

            Self {
                engine,
                campaigns,
                contacts,
                enrollments,
                clock,
                events,
                email_account_id,
            }
        }

        fn add_campaign(&self, nodes: fn(Uuid) -> Vec<FlowNode>) -> Uuid {
            let id = Uuid::new_v4();
            let now = self.clock.now();
            self.campaigns
                .insert(Campaign {
                    id,
                    name: "Test campaign".into(),
                    platform: Platform::Email,
                    status: CampaignStatus::Draft,
                    nodes: nodes(id),
                    email_account_id: Some(self.email_account_id),
                    linkedin_account_id: None,
                    product_prompt: None,
                    instructions_prompt: None,
                    utc_offset_minutes: 0,
                    sending_days: business_days(),
                    sending_start_hour: 9,
                    sending_end_hour: 17,
                    daily_limit: 50,
                    total_sent: 0,
                    started_at: None,
                    created_at: now,
                    updated_at: now,
                })
                .unwrap()
        }

        fn add_contact(&self) -> Uuid {
            self.contacts.insert(Contact {
                id: Uuid::new_v4(),
                first_name: "Ada".into(),
                last_name: "Lovelace".into(),
                email: Some("ada@analyticalengines.example".into()),
                phone: None,
                linkedin_url: None,
                job_title: None,
                company: Some(Company {
                    name: "Analytical Engines".into(),
                    industry: None,
                    website: None,
                }),
            })
        }
    }

    fn trigger_email_flow(campaign_id: Uuid) -> Vec<FlowNode> {
        let mut email = FlowNode::new(campaign_id, 1, NodeType::ActionEmail, "Intro");
        email.subject = Some("Hello {{firstName}}".into());
        email.body = Some("Hi {{firstName}}".into());
        vec![
            FlowNode::new(campaign_id, 0, NodeType::TriggerStart, "Start"),
            email,
        ]
    }

    #[test]
    fn test_start_requires_nodes_and_contacts() {
        let h = Harness::new();
        let empty = h.add_campaign(|_| Vec::new());
        assert!(matches!(
            h.engine.start_campaign(empty),
            Err(OutreachError::Config(_))
        ));

        let with_nodes = h.add_campaign(trigger_email_flow);
        assert!(matches!(
            h.engine.start_campaign(with_nodes),
            Err(OutreachError::Config(_))
        ));
    }

    #[test]
    fn test_start_runs_first_pass_to_completion() {
        let h = Harness::new();
        let campaign_id = h.add_campaign(trigger_email_flow);
        let contact_id = h.add_contact();
        h.engine
            .add_contact_to_campaign(campaign_id, contact_id, HashMap::new())
            .unwrap();

        let summary = h.engine.start_campaign(campaign_id).unwrap();
        assert_eq!(summary.processed, 1);
        assert_eq!(summary.errors, 0);

        // Trigger then email then off the end of the flow, all in one pass.
        let enrollment = h.enrollments.get_by_pair(campaign_id, contact_id).unwrap();
        assert_eq!(enrollment.status, EnrollmentStatus::Completed);
        assert_eq!(h.events.count_type(EventType::EmailSent), 1);
        assert_eq!(h.events.count_type(EventType::EnrollmentCompleted), 1);
        assert_eq!(h.campaigns.get(campaign_id).unwrap().total_sent, 1);
    }

    #[test]
    fn test_add_contact_is_soft_idempotent() {
        let h = Harness::new();
        let campaign_id = h.add_campaign(trigger_email_flow);
        let contact_id = h.add_contact();

        let first = h
            .engine
            .add_contact_to_campaign(campaign_id, contact_id, HashMap::new())
            .unwrap();
        assert!(matches!(first, EnrollOutcome::Enrolled(_)));

        let second = h
            .engine
            .add_contact_to_campaign(campaign_id, contact_id, HashMap::new())
            .unwrap();
        assert!(matches!(second, EnrollOutcome::AlreadyEnrolled));
        assert_eq!(h.events.count_type(EventType::ContactEnrolled), 1);
    }

    #[test]
    fn test_add_contact_unknown_campaign_is_error() {
        let h = Harness::new();
        let contact_id = h.add_contact();
        assert!(h
            .engine
            .add_contact_to_campaign(Uuid::new_v4(), contact_id, HashMap::new())
            .is_err());
    }

    #[test]
    fn test_remove_then_readd_conflicts() {
        let h = Harness::new();
        let campaign_id = h.add_campaign(trigger_email_flow);
        let contact_id = h.add_contact();
        h.engine
            .add_contact_to_campaign(campaign_id, contact_id, HashMap::new())
            .unwrap();

        assert!(h.engine.remove_contact_from_campaign(campaign_id, contact_id));
        assert_eq!(h.events.count_type(EventType::ContactRemoved), 1);

        let readd = h
            .engine
            .add_contact_to_campaign(campaign_id, contact_id, HashMap::new())
            .unwrap();
        assert!(matches!(readd, EnrollOutcome::AlreadyEnrolled));
    }

    #[test]
    fn test_pause_resume_events() {
        let h = Harness::new();
        let campaign_id = h.add_campaign(trigger_email_flow);
        let contact_id = h.add_contact();
        h.engine
            .add_contact_to_campaign(campaign_id, contact_id, HashMap::new())
            .unwrap();
        h.engine.start_campaign(campaign_id).unwrap();

        let paused = h.engine.pause_campaign(campaign_id).unwrap();
        assert_eq!(paused.status, CampaignStatus::Paused);
        assert_eq!(h.events.count_type(EventType::CampaignPaused), 1);

        h.engine.resume_campaign(campaign_id).unwrap();
        assert_eq!(
            h.campaigns.status(campaign_id),
            Some(CampaignStatus::Active)
        );
        assert_eq!(h.events.count_type(EventType::CampaignResumed), 1);
    }

    #[test]
    fn test_paused_campaign_not_swept() {
        let h = Harness::new();
        let campaign_id = h.add_campaign(trigger_email_flow);
        let contact_id = h.add_contact();
        h.engine
            .add_contact_to_campaign(campaign_id, contact_id, HashMap::new())
            .unwrap();
        // Still a draft: the cron sweep must not touch it.
        let summary = h.engine.process_all_scheduled();
        assert_eq!(summary.processed, 0);
        assert_eq!(h.events.count_type(EventType::EmailSent), 0);
    }

    #[test]
    fn test_node_without_processor_flags_review() {
        let h = Harness::new();
        let campaign_id = h.add_campaign(|id| {
            vec![
                FlowNode::new(id, 0, NodeType::TriggerStart, "Start"),
                FlowNode::new(id, 1, NodeType::ManualTask, "Call them"),
            ]
        });
        let contact_id = h.add_contact();
        h.engine
            .add_contact_to_campaign(campaign_id, contact_id, HashMap::new())
            .unwrap();

        let summary = h.engine.start_campaign(campaign_id).unwrap();
        assert_eq!(summary.errors, 1);

        let enrollment = h.enrollments.get_by_pair(campaign_id, contact_id).unwrap();
        assert_eq!(enrollment.status, EnrollmentStatus::Active);
        assert_eq!(enrollment.current_node_order, 1);
        assert!(enrollment.needs_review.is_some());
    }

    #[test]
    fn test_engagement_recorded_and_emitted() {
        let h = Harness::new();
        let campaign_id = h.add_campaign(trigger_email_flow);
        let contact_id = h.add_contact();
        h.engine
            .add_contact_to_campaign(campaign_id, contact_id, HashMap::new())
            .unwrap();
        h.engine.start_campaign(campaign_id).unwrap();

        let sent = h
            .events
            .events()
            .into_iter()
            .find(|e| e.event_type == EventType::EmailSent)
            .unwrap();
        let message_id = sent.message_id.unwrap();

        let record = h
            .engine
            .record_engagement(&message_id, EngagementKind::Reply, h.clock.now())
            .unwrap();
        assert!(record.replied_at.is_some());
        assert_eq!(h.events.count_type(EventType::EmailReplied), 1);

        assert!(h
            .engine
            .record_engagement("gm-nope", EngagementKind::Open, h.clock.now())
            .is_none());
    }
}
