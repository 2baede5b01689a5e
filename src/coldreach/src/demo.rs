//! Demo seed data: one campaign, a connected email account, and two
//! enrolled contacts. Behind the `--seed-demo` flag only.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use coldreach_core::config::AppConfig;
use coldreach_core::types::{
    business_days, Campaign, CampaignStatus, Company, Contact, DelayUnit, EmailAccount,
    EmailProviderKind, FlowNode, NodeConditions, NodeMode, NodeType, Platform,
};
use coldreach_engine::CampaignEngine;
use coldreach_store::{AccountStore, CampaignStore, ContactStore};

pub fn seed(
    campaigns: &Arc<CampaignStore>,
    contacts: &Arc<ContactStore>,
    accounts: &Arc<AccountStore>,
    engine: &Arc<CampaignEngine>,
    config: &AppConfig,
) -> anyhow::Result<()> {
    let account_id = accounts.insert_email_account(EmailAccount {
        id: Uuid::new_v4(),
        email: config.email.from_email.clone(),
        display_name: config.email.from_name.clone(),
        provider: EmailProviderKind::Gmail,
        is_active: true,
        daily_cap: 200,
    });

    let campaign_id = Uuid::new_v4();
    let nodes = demo_flow(campaign_id);

    let now = Utc::now();
    campaigns.insert(Campaign {
        id: campaign_id,
        name: "Demo: SaaS outbound".into(),
        platform: Platform::Email,
        status: CampaignStatus::Draft,
        nodes,
        email_account_id: Some(account_id),
        linkedin_account_id: None,
        product_prompt: Some("introduce our sales engagement platform".into()),
        instructions_prompt: None,
        utc_offset_minutes: 0,
        sending_days: business_days(),
        sending_start_hour: 0,
        sending_end_hour: 24,
        daily_limit: config.engine.default_daily_limit,
        total_sent: 0,
        started_at: None,
        created_at: now,
        updated_at: now,
    })?;

    for (first, last, email, company) in [
        ("Ada", "Lovelace", "ada@analyticalengines.example", "Analytical Engines"),
        ("Grace", "Hopper", "grace@flowmatic.example", "Flow-Matic"),
    ] {
        let contact_id = contacts.insert(Contact {
            id: Uuid::new_v4(),
            first_name: first.into(),
            last_name: last.into(),
            email: Some(email.into()),
            phone: None,
            linkedin_url: None,
            job_title: Some("Engineering Lead".into()),
            company: Some(Company {
                name: company.into(),
                industry: Some("Software".into()),
                website: None,
            }),
        });
        engine.add_contact_to_campaign(campaign_id, contact_id, HashMap::new())?;
    }

    let summary = engine.start_campaign(campaign_id)?;
    info!(
        campaign_id = %campaign_id,
        processed = summary.processed,
        errors = summary.errors,
        "Demo campaign seeded and started"
    );
    Ok(())
}

fn demo_flow(campaign_id: Uuid) -> Vec<FlowNode> {
    let mut intro = FlowNode::new(campaign_id, 1, NodeType::ActionEmail, "Intro email");
    intro.subject = Some("Quick question, {{firstName}}".into());
    intro.body = Some(
        "Hi {{firstName}},\n\nI noticed {{company}} is growing fast. \
         Worth a quick chat about how we help teams like yours?\n"
            .into(),
    );

    let mut wait = FlowNode::new(campaign_id, 2, NodeType::Delay, "Wait two days");
    wait.delay_value = Some(2);
    wait.delay_unit = Some(DelayUnit::Days);

    let mut follow_up = FlowNode::new(campaign_id, 3, NodeType::ActionEmail, "Follow-up");
    follow_up.mode = NodeMode::Ai;
    follow_up.prompt = Some("short follow-up nudging for a reply".into());
    follow_up.subject = Some("Re: Quick question".into());
    follow_up.body = Some("Hi {{firstName}}, just floating this back up.".into());
    follow_up.conditions = Some(NodeConditions {
        only_if_no_reply: true,
        ..Default::default()
    });

    vec![
        FlowNode::new(campaign_id, 0, NodeType::TriggerStart, "Start"),
        intro,
        wait,
        follow_up,
    ]
}
