//! Node processors — one per executable node type, selected from a registry
//! by a single dispatch probe.

mod condition;
mod delay;
mod email;
mod linkedin;
mod trigger;

pub use condition::ConditionProcessor;
pub use delay::DelayProcessor;
pub use email::EmailProcessor;
pub use linkedin::{LinkedInConnectProcessor, LinkedInMessageProcessor};
pub use trigger::TriggerProcessor;

use std::sync::Arc;

use coldreach_channels::ai::{GenerationRequest, Tone};
use coldreach_channels::{AiGenerator, EmailSender, LinkedInActor};
use coldreach_core::types::{ContactEnrollment, FlowNode, NodeType};
use coldreach_delivery::DailyCapTracker;
use coldreach_store::{AccountStore, ExecutionLedger};

use crate::outcome::{ExecutionContext, ExecutionOutcome};

/// A processor for one (or a few) node types. `can_process` is the dispatch
/// probe; the registry picks the first processor that accepts the node type.
pub trait NodeProcessor: Send + Sync {
    fn can_process(&self, node_type: NodeType) -> bool;
    fn process(&self, ctx: &ExecutionContext<'_>) -> ExecutionOutcome;
}

/// The full v1 registry. Instagram DMs and manual tasks intentionally have
/// no processor; the engine surfaces them as data-integrity errors.
#[allow(clippy::too_many_arguments)]
pub fn default_processors(
    ledger: Arc<ExecutionLedger>,
    accounts: Arc<AccountStore>,
    email_sender: Arc<dyn EmailSender>,
    linkedin: Arc<dyn LinkedInActor>,
    generator: Arc<dyn AiGenerator>,
    caps: Arc<DailyCapTracker>,
) -> Vec<Box<dyn NodeProcessor>> {
    vec![
        Box::new(TriggerProcessor),
        Box::new(DelayProcessor),
        Box::new(EmailProcessor::new(
            ledger.clone(),
            accounts.clone(),
            email_sender,
            generator.clone(),
            caps,
        )),
        Box::new(LinkedInConnectProcessor::new(
            ledger.clone(),
            accounts.clone(),
            linkedin.clone(),
            generator.clone(),
        )),
        Box::new(LinkedInMessageProcessor::new(
            ledger.clone(),
            accounts,
            linkedin,
            generator,
        )),
        Box::new(ConditionProcessor::new(ledger)),
    ]
}

/// Evaluate a node's skip conditions against the ledger. Returns the reason
/// to skip, or None to proceed.
pub(crate) fn skip_reason(
    ledger: &ExecutionLedger,
    node: &FlowNode,
    enrollment: &ContactEnrollment,
) -> Option<String> {
    let conditions = node.conditions.as_ref()?;
    if conditions.only_if_no_reply && ledger.has_reply(enrollment.id) {
        return Some("contact already replied".to_string());
    }
    if conditions.only_if_no_open && ledger.has_open(enrollment.id) {
        return Some("contact already opened".to_string());
    }
    if conditions.only_if_no_click && ledger.has_click(enrollment.id) {
        return Some("contact already clicked".to_string());
    }
    None
}

/// Assemble a generation request from node, campaign, and contact context.
/// The node-level prompt wins over the campaign product prompt.
pub(crate) fn generation_request(ctx: &ExecutionContext<'_>, tone: Tone) -> GenerationRequest {
    let purpose = ctx
        .node
        .prompt
        .clone()
        .or_else(|| ctx.campaign.product_prompt.clone())
        .unwrap_or_else(|| "introduce our product and ask for a brief call".to_string());

    GenerationRequest {
        contact_first_name: Some(ctx.contact.first_name.clone()),
        contact_last_name: Some(ctx.contact.last_name.clone()),
        contact_job_title: ctx.contact.job_title.clone(),
        company_name: ctx.contact.company.as_ref().map(|c| c.name.clone()),
        company_industry: ctx
            .contact
            .company
            .as_ref()
            .and_then(|c| c.industry.clone()),
        purpose,
        custom_instructions: ctx.campaign.instructions_prompt.clone(),
        tone,
        is_follow_up: ctx.node.order > 1,
        step_number: Some(ctx.node.order),
        prior_messages: Vec::new(),
    }
}
