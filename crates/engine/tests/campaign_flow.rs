//! End-to-end flow scenarios: sweeps over a controlled clock, sending
//! windows, idempotent re-invocation, skip conditions, caps, and chain
//! bounds.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use uuid::Uuid;

use coldreach_channels::linkedin::LinkedInAutomationProvider;
use coldreach_channels::{GmailRelayProvider, ScriptedGenerator};
use coldreach_core::config::EmailConfig;
use coldreach_core::event_bus::{capture_sink, CaptureSink, EventType};
use coldreach_core::types::{
    business_days, Campaign, CampaignStatus, Company, Contact, DelayUnit, EmailAccount,
    EmailProviderKind, EngagementKind, EnrollmentStatus, ExecutionStatus, FlowNode, NodeConditions,
    NodeType, Platform, SendingDay,
};
use coldreach_delivery::DailyCapTracker;
use coldreach_engine::clock::ManualClock;
use coldreach_engine::processors::{default_processors, TriggerProcessor};
use coldreach_engine::{CampaignEngine, Clock, ExecutionContext, ExecutionOutcome, NodeProcessor};
use coldreach_store::{
    AccountStore, CampaignStore, ContactStore, EnrollmentStore, ExecutionLedger,
};

// Tuesday 2024-01-02 10:00 UTC, inside the default business-hours window.
fn sweep_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 2, 10, 0, 0).unwrap()
}

struct World {
    engine: CampaignEngine,
    campaigns: Arc<CampaignStore>,
    contacts: Arc<ContactStore>,
    enrollments: Arc<EnrollmentStore>,
    ledger: Arc<ExecutionLedger>,
    email: Arc<GmailRelayProvider>,
    clock: Arc<ManualClock>,
    events: Arc<CaptureSink>,
    email_account_id: Uuid,
}

fn build_world(email_daily_cap: u32, max_chain_steps: u32) -> World {
    let clock = Arc::new(ManualClock::new(sweep_start()));
    let campaigns = Arc::new(CampaignStore::new());
    let contacts = Arc::new(ContactStore::new());
    let enrollments = Arc::new(EnrollmentStore::new());
    let ledger = Arc::new(ExecutionLedger::new());
    let accounts = Arc::new(AccountStore::new());
    let email = Arc::new(GmailRelayProvider::new(EmailConfig::default()));
    let events = capture_sink();

    let email_account_id = accounts.insert_email_account(EmailAccount {
        id: Uuid::new_v4(),
        email: "sales@coldreach.example".into(),
        display_name: "ColdReach Sales".into(),
        provider: EmailProviderKind::Gmail,
        is_active: true,
        daily_cap: email_daily_cap,
    });

    let processors = default_processors(
        ledger.clone(),
        accounts,
        email.clone(),
        Arc::new(LinkedInAutomationProvider::new()),
        Arc::new(ScriptedGenerator::default()),
        Arc::new(DailyCapTracker::new()),
    );

    let engine = CampaignEngine::new(
        campaigns.clone(),
        contacts.clone(),
        enrollments.clone(),
        ledger.clone(),
        processors,
        clock.clone(),
        events.clone(),
        max_chain_steps,
    );

    World {
        engine,
        campaigns,
        contacts,
        enrollments,
        ledger,
        email,
        clock,
        events,
        email_account_id,
    }
}

impl World {
    fn add_campaign(&self, nodes: Vec<FlowNode>, tweak: impl FnOnce(&mut Campaign)) -> Uuid {
        let now = self.clock.now();
        let mut campaign = Campaign {
            id: nodes
                .first()
                .map(|n| n.campaign_id)
                .unwrap_or_else(Uuid::new_v4),
            name: "Flow test".into(),
            platform: Platform::Email,
            status: CampaignStatus::Draft,
            nodes,
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
        };
        tweak(&mut campaign);
        self.campaigns.insert(campaign).unwrap()
    }

    fn add_contact(&self, first_name: &str, email: &str) -> Uuid {
        self.contacts.insert(Contact {
            id: Uuid::new_v4(),
            first_name: first_name.into(),
            last_name: "Example".into(),
            email: Some(email.into()),
            phone: None,
            linkedin_url: None,
            job_title: None,
            company: Some(Company {
                name: "Example Corp".into(),
                industry: None,
                website: None,
            }),
        })
    }

    fn enroll(&self, campaign_id: Uuid, contact_id: Uuid) {
        self.engine
            .add_contact_to_campaign(campaign_id, contact_id, HashMap::new())
            .unwrap();
    }
}

/// trigger -> email -> delay(1h) -> email
fn four_step_flow() -> Vec<FlowNode> {
    let campaign_id = Uuid::new_v4();

    let mut intro = FlowNode::new(campaign_id, 1, NodeType::ActionEmail, "Intro");
    intro.subject = Some("Hello {{firstName}}".into());
    intro.body = Some("Hi {{firstName}}".into());

    let mut wait = FlowNode::new(campaign_id, 2, NodeType::Delay, "Wait an hour");
    wait.delay_value = Some(1);
    wait.delay_unit = Some(DelayUnit::Hours);

    let mut follow_up = FlowNode::new(campaign_id, 3, NodeType::ActionEmail, "Follow-up");
    follow_up.subject = Some("Following up".into());
    follow_up.body = Some("Hi again {{firstName}}".into());

    vec![
        FlowNode::new(campaign_id, 0, NodeType::TriggerStart, "Start"),
        intro,
        wait,
        follow_up,
    ]
}

#[test]
fn test_flow_advances_across_sweeps() {
    let w = build_world(100, 25);
    let campaign_id = w.add_campaign(four_step_flow(), |_| {});
    let contact_id = w.add_contact("Ada", "ada@example.com");
    w.enroll(campaign_id, contact_id);
    w.engine.start_campaign(campaign_id).unwrap();

    // Trigger and first email chained in the starting pass; the delay parked
    // the enrollment an hour out.
    let enrollment = w.enrollments.get_by_pair(campaign_id, contact_id).unwrap();
    assert_eq!(enrollment.current_node_order, 3);
    assert_eq!(
        enrollment.next_action_at,
        Some(sweep_start() + Duration::hours(1))
    );
    assert_eq!(w.email.sent_count(), 1);

    // Half an hour later: not due yet.
    w.clock.advance(Duration::minutes(30));
    let summary = w.engine.process_all_scheduled();
    assert_eq!(summary.processed, 0);
    assert_eq!(w.email.sent_count(), 1);

    // At the hour the follow-up goes out and the flow completes.
    w.clock.advance(Duration::minutes(30));
    let summary = w.engine.process_all_scheduled();
    assert_eq!(summary.processed, 1);
    assert_eq!(w.email.sent_count(), 2);

    let enrollment = w.enrollments.get_by_pair(campaign_id, contact_id).unwrap();
    assert_eq!(enrollment.status, EnrollmentStatus::Completed);
    assert_eq!(w.events.count_type(EventType::EmailSent), 2);
    assert_eq!(w.campaigns.get(campaign_id).unwrap().total_sent, 2);
}

#[test]
fn test_repeated_sweeps_do_not_resend() {
    let w = build_world(100, 25);
    let campaign_id = w.add_campaign(four_step_flow(), |_| {});
    let contact_id = w.add_contact("Ada", "ada@example.com");
    w.enroll(campaign_id, contact_id);
    w.engine.start_campaign(campaign_id).unwrap();
    assert_eq!(w.email.sent_count(), 1);

    // Hammer the cron entry point; nothing is due, nothing resends.
    for _ in 0..5 {
        w.engine.process_all_scheduled();
    }
    assert_eq!(w.email.sent_count(), 1);

    w.clock.advance(Duration::hours(1));
    w.engine.process_all_scheduled();
    w.engine.process_all_scheduled();
    assert_eq!(w.email.sent_count(), 2);
}

#[test]
fn test_prior_record_advances_without_redispatch() {
    // A previous invocation died between dispatch and advance: the ledger
    // has a completed record for the node, but the enrollment still points
    // at it. The next sweep must advance without sending again.
    let w = build_world(100, 25);
    let campaign_id = w.add_campaign(four_step_flow(), |c| {
        c.status = CampaignStatus::Active;
    });
    let contact_id = w.add_contact("Ada", "ada@example.com");
    w.enroll(campaign_id, contact_id);

    let enrollment = w.enrollments.get_by_pair(campaign_id, contact_id).unwrap();
    let campaign = w.campaigns.get(campaign_id).unwrap();
    let email_node = campaign.node_at(1).unwrap().clone();

    // Hand-advance past the trigger, then forge the crashed invocation's
    // ledger record for the email node.
    w.enrollments
        .advance(enrollment.id, enrollment.version, 1, Some(w.clock.now()))
        .unwrap();
    w.ledger.append(coldreach_core::types::ExecutionRecord {
        id: Uuid::new_v4(),
        enrollment_id: enrollment.id,
        node_id: email_node.id,
        node_order: 1,
        attempt: 1,
        status: ExecutionStatus::Completed,
        executed_at: w.clock.now(),
        completed_at: Some(w.clock.now()),
        scheduled_for: None,
        subject: Some("Hello Ada".into()),
        body: Some("Hi Ada".into()),
        message_id: Some("gm-crashed".into()),
        error: None,
        opened_at: None,
        clicked_at: None,
        replied_at: None,
    });

    let summary = w.engine.process_all_scheduled();
    assert_eq!(summary.processed, 1);
    // The forged send is honored; only the node-3 follow-up will ever go out.
    assert_eq!(w.email.sent_count(), 0);
    let enrollment = w.enrollments.get_by_pair(campaign_id, contact_id).unwrap();
    assert_eq!(enrollment.current_node_order, 3);
}

#[test]
fn test_sending_window_blocks_dispatch() {
    let w = build_world(100, 25);
    // Monday-only window; the clock says Tuesday.
    let campaign_id = w.add_campaign(four_step_flow(), |c| {
        c.status = CampaignStatus::Active;
        c.sending_days = vec![SendingDay::Monday];
    });
    let contact_id = w.add_contact("Ada", "ada@example.com");
    w.enroll(campaign_id, contact_id);

    let summary = w.engine.process_all_scheduled();
    assert_eq!(summary.processed, 0);
    assert_eq!(w.email.sent_count(), 0);
    let enrollment = w.enrollments.get_by_pair(campaign_id, contact_id).unwrap();
    assert_eq!(enrollment.current_node_order, 0);

    // The following Monday the same sweep goes through.
    w.clock.advance(Duration::days(6));
    let summary = w.engine.process_all_scheduled();
    assert_eq!(summary.processed, 1);
    assert!(w.email.sent_count() > 0);
}

#[test]
fn test_reply_skips_conditional_follow_up() {
    let w = build_world(100, 25);
    let mut nodes = four_step_flow();
    nodes[3].conditions = Some(NodeConditions {
        only_if_no_reply: true,
        ..Default::default()
    });
    let campaign_id = w.add_campaign(nodes, |_| {});
    let contact_id = w.add_contact("Ada", "ada@example.com");
    w.enroll(campaign_id, contact_id);
    w.engine.start_campaign(campaign_id).unwrap();
    assert_eq!(w.email.sent_count(), 1);

    // The contact replies during the delay.
    let sent = w.email.list_sent(1);
    w.engine
        .record_engagement(
            &sent[0].message_id,
            EngagementKind::Reply,
            w.clock.now() + Duration::minutes(10),
        )
        .unwrap();

    w.clock.advance(Duration::hours(1));
    let summary = w.engine.process_all_scheduled();
    assert_eq!(summary.processed, 1);

    // Follow-up skipped, not sent; the flow still completes.
    assert_eq!(w.email.sent_count(), 1);
    assert_eq!(w.events.count_type(EventType::NodeSkipped), 1);
    let enrollment = w.enrollments.get_by_pair(campaign_id, contact_id).unwrap();
    assert_eq!(enrollment.status, EnrollmentStatus::Completed);
}

#[test]
fn test_missing_account_fails_terminally_but_recoverable() {
    let w = build_world(100, 25);
    let campaign_id = w.add_campaign(four_step_flow(), |c| {
        c.email_account_id = None;
    });
    let contact_id = w.add_contact("Ada", "ada@example.com");
    w.enroll(campaign_id, contact_id);

    let summary = w.engine.start_campaign(campaign_id).unwrap();
    assert_eq!(summary.errors, 1);
    assert_eq!(w.email.sent_count(), 0);

    // Flagged for review but still ACTIVE at the email node.
    let enrollment = w.enrollments.get_by_pair(campaign_id, contact_id).unwrap();
    assert_eq!(enrollment.status, EnrollmentStatus::Active);
    assert_eq!(enrollment.current_node_order, 1);
    assert!(enrollment.needs_review.is_some());

    let failures = w
        .ledger
        .for_enrollment(enrollment.id)
        .into_iter()
        .filter(|r| r.status == ExecutionStatus::Failed)
        .count();
    assert_eq!(failures, 1);

    // An operator fixes the config; the next sweep proceeds.
    if let Some(mut campaign) = w.campaigns.get(campaign_id) {
        campaign.email_account_id = Some(w.email_account_id);
        let nodes = campaign.nodes.clone();
        w.campaigns.insert(campaign).unwrap();
        w.campaigns.replace_nodes(campaign_id, nodes).unwrap();
    }
    let summary = w.engine.process_all_scheduled();
    assert_eq!(summary.processed, 1);
    assert_eq!(w.email.sent_count(), 1);
}

#[test]
fn test_daily_limit_caps_batch_size() {
    let w = build_world(100, 25);
    let campaign_id = w.add_campaign(four_step_flow(), |c| {
        c.status = CampaignStatus::Active;
        c.daily_limit = 1;
    });
    let ada = w.add_contact("Ada", "ada@example.com");
    let grace = w.add_contact("Grace", "grace@example.com");
    w.enroll(campaign_id, ada);
    w.enroll(campaign_id, grace);

    let summary = w.engine.process_all_scheduled();
    assert_eq!(summary.processed, 1);
    assert_eq!(w.email.sent_count(), 1);

    // The second contact is picked up by the next sweep.
    let summary = w.engine.process_all_scheduled();
    assert_eq!(summary.processed, 1);
    assert_eq!(w.email.sent_count(), 2);
}

#[test]
fn test_account_cap_blocks_then_window_rolls() {
    let w = build_world(1, 25);
    let campaign_id = w.add_campaign(four_step_flow(), |c| {
        c.status = CampaignStatus::Active;
    });
    let ada = w.add_contact("Ada", "ada@example.com");
    let grace = w.add_contact("Grace", "grace@example.com");
    w.enroll(campaign_id, ada);
    w.enroll(campaign_id, grace);

    // One send fits under the account cap; the other fails retryably.
    let summary = w.engine.process_all_scheduled();
    assert_eq!(summary.processed, 1);
    assert_eq!(summary.errors, 1);
    assert_eq!(w.email.sent_count(), 1);

    // 25 hours later the rolling window has room again (Wednesday 11:00).
    w.clock.advance(Duration::hours(25));
    let summary = w.engine.process_all_scheduled();
    assert!(summary.processed >= 1);
    assert_eq!(w.email.sent_count(), 2);
}

#[test]
fn test_chain_bound_defers_long_chains() {
    let w = build_world(100, 5);
    let campaign_id = Uuid::new_v4();
    // Trigger plus nine condition nodes, all zero-delay.
    let mut nodes = vec![FlowNode::new(
        campaign_id,
        0,
        NodeType::TriggerStart,
        "Start",
    )];
    for order in 1..10 {
        nodes.push(FlowNode::new(
            campaign_id,
            order,
            NodeType::Condition,
            "Check",
        ));
    }
    let campaign_id = w.add_campaign(nodes, |c| {
        c.status = CampaignStatus::Active;
    });
    let contact_id = w.add_contact("Ada", "ada@example.com");
    w.enroll(campaign_id, contact_id);

    w.engine.process_all_scheduled();
    let enrollment = w.enrollments.get_by_pair(campaign_id, contact_id).unwrap();
    assert_eq!(enrollment.status, EnrollmentStatus::Active);
    assert_eq!(enrollment.current_node_order, 5);

    // Subsequent sweeps finish the walk.
    w.engine.process_all_scheduled();
    w.engine.process_all_scheduled();
    let enrollment = w.enrollments.get_by_pair(campaign_id, contact_id).unwrap();
    assert_eq!(enrollment.status, EnrollmentStatus::Completed);
}

/// Email stand-in that pauses its own campaign as a side effect, simulating
/// an operator hitting pause while a batch is in flight.
struct PausingEmailProcessor {
    campaigns: Arc<CampaignStore>,
}

impl NodeProcessor for PausingEmailProcessor {
    fn can_process(&self, node_type: NodeType) -> bool {
        node_type == NodeType::ActionEmail
    }

    fn process(&self, ctx: &ExecutionContext<'_>) -> ExecutionOutcome {
        self.campaigns
            .set_status(ctx.campaign.id, CampaignStatus::Paused);
        ExecutionOutcome::completed(ctx.node.order + 1, ctx.now)
    }
}

#[test]
fn test_mid_sweep_pause_stops_remaining_batch() {
    let clock = Arc::new(ManualClock::new(sweep_start()));
    let campaigns = Arc::new(CampaignStore::new());
    let contacts = Arc::new(ContactStore::new());
    let enrollments = Arc::new(EnrollmentStore::new());
    let ledger = Arc::new(ExecutionLedger::new());

    let engine = CampaignEngine::new(
        campaigns.clone(),
        contacts.clone(),
        enrollments.clone(),
        ledger,
        vec![
            Box::new(TriggerProcessor),
            Box::new(PausingEmailProcessor {
                campaigns: campaigns.clone(),
            }),
        ],
        clock.clone(),
        capture_sink(),
        25,
    );

    let campaign_id = Uuid::new_v4();
    let now = clock.now();
    campaigns
        .insert(Campaign {
            id: campaign_id,
            name: "Pause mid-batch".into(),
            platform: Platform::Email,
            status: CampaignStatus::Active,
            nodes: vec![
                FlowNode::new(campaign_id, 0, NodeType::TriggerStart, "Start"),
                FlowNode::new(campaign_id, 1, NodeType::ActionEmail, "Send"),
            ],
            email_account_id: None,
            linkedin_account_id: None,
            product_prompt: None,
            instructions_prompt: None,
            utc_offset_minutes: 0,
            sending_days: business_days(),
            sending_start_hour: 9,
            sending_end_hour: 17,
            daily_limit: 50,
            total_sent: 0,
            started_at: Some(now),
            created_at: now,
            updated_at: now,
        })
        .unwrap();

    let mut contact_ids = Vec::new();
    for (name, email) in [("Ada", "ada@example.com"), ("Grace", "grace@example.com")] {
        let contact_id = contacts.insert(Contact {
            id: Uuid::new_v4(),
            first_name: name.into(),
            last_name: "Example".into(),
            email: Some(email.into()),
            phone: None,
            linkedin_url: None,
            job_title: None,
            company: None,
        });
        engine
            .add_contact_to_campaign(campaign_id, contact_id, HashMap::new())
            .unwrap();
        contact_ids.push(contact_id);
    }

    // The first enrollment's email node pauses the campaign; the second must
    // not be dispatched in the same batch.
    let summary = engine.process_scheduled_contacts(campaign_id);
    assert_eq!(summary.processed, 1);
    assert_eq!(campaigns.status(campaign_id), Some(CampaignStatus::Paused));

    let orders: Vec<u32> = contact_ids
        .iter()
        .map(|id| {
            enrollments
                .get_by_pair(campaign_id, *id)
                .unwrap()
                .current_node_order
        })
        .collect();
    let untouched = orders.iter().filter(|o| **o == 0).count();
    let advanced = orders.iter().filter(|o| **o == 2).count();
    assert_eq!(untouched, 1);
    assert_eq!(advanced, 1);
}

#[test]
fn test_condition_branch_jumps_over_nodes() {
    let w = build_world(100, 25);
    let campaign_id = Uuid::new_v4();

    let mut intro = FlowNode::new(campaign_id, 1, NodeType::ActionEmail, "Intro");
    intro.subject = Some("Hello".into());
    intro.body = Some("Hi {{firstName}}".into());

    let mut wait = FlowNode::new(campaign_id, 2, NodeType::Delay, "Wait a day");
    wait.delay_value = Some(1);
    wait.delay_unit = Some(DelayUnit::Days);

    // If the contact replied, branch past the nudge straight to the end.
    let mut check = FlowNode::new(campaign_id, 3, NodeType::Condition, "Replied?");
    check.conditions = Some(NodeConditions {
        only_if_no_reply: true,
        ..Default::default()
    });
    check.branch_order = Some(5);

    let mut nudge = FlowNode::new(campaign_id, 4, NodeType::ActionEmail, "Nudge");
    nudge.subject = Some("Nudge".into());
    nudge.body = Some("Still there?".into());

    let nodes = vec![
        FlowNode::new(campaign_id, 0, NodeType::TriggerStart, "Start"),
        intro,
        wait,
        check,
        nudge,
    ];
    let campaign_id = w.add_campaign(nodes, |c| {
        c.status = CampaignStatus::Active;
    });
    let contact_id = w.add_contact("Ada", "ada@example.com");
    w.enroll(campaign_id, contact_id);

    let summary = w.engine.process_all_scheduled();
    assert_eq!(summary.processed, 1);
    assert_eq!(w.email.sent_count(), 1);

    let sent = w.email.list_sent(1);
    w.engine
        .record_engagement(&sent[0].message_id, EngagementKind::Reply, w.clock.now())
        .unwrap();

    // A day later the condition takes the branch: the nudge never goes out
    // and the flow ends.
    w.clock.advance(Duration::days(1));
    w.engine.process_all_scheduled();
    assert_eq!(w.email.sent_count(), 1);
    let enrollment = w.enrollments.get_by_pair(campaign_id, contact_id).unwrap();
    assert_eq!(enrollment.status, EnrollmentStatus::Completed);
}
