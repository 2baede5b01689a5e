//! LinkedIn action nodes — connection requests and direct messages.

use std::sync::Arc;

use tracing::{debug, warn};

use coldreach_channels::ai::{AiGenerator, Tone};
use coldreach_channels::email::SendError;
use coldreach_channels::linkedin::{truncate_note, LinkedInActor};
use coldreach_channels::templates;
use coldreach_core::types::{LinkedInAccount, NodeMode, NodeType};
use coldreach_store::{AccountStore, ExecutionLedger};

use crate::outcome::{ExecutionContext, ExecutionOutcome};
use crate::processors::{generation_request, skip_reason, NodeProcessor};

/// Shared gates for both LinkedIn node types. Returns the profile URL and
/// sending account, or the terminal outcome that explains what is missing.
fn linkedin_gates(
    accounts: &AccountStore,
    ctx: &ExecutionContext<'_>,
) -> Result<(String, LinkedInAccount), ExecutionOutcome> {
    let profile_url = match &ctx.contact.linkedin_url {
        Some(url) => url.clone(),
        None => {
            return Err(ExecutionOutcome::terminal_failure(
                "contact has no LinkedIn profile URL",
            ))
        }
    };
    let account_id = match ctx.campaign.linkedin_account_id {
        Some(id) => id,
        None => {
            return Err(ExecutionOutcome::terminal_failure(
                "no LinkedIn account configured for this campaign",
            ))
        }
    };
    match accounts.linkedin_account(account_id) {
        Some(account) if account.is_active => Ok((profile_url, account)),
        _ => Err(ExecutionOutcome::terminal_failure(
            "LinkedIn account not found or inactive",
        )),
    }
}

/// Message body for a LinkedIn node: AI generation with template fallback in
/// AI mode, plain substitution otherwise.
fn build_body(generator: &dyn AiGenerator, ctx: &ExecutionContext<'_>, default: &str) -> String {
    let node = ctx.node;
    let template = node.body.as_deref().unwrap_or(default);

    if node.mode == NodeMode::Ai {
        match generator.generate(&generation_request(ctx, Tone::Friendly)) {
            Ok(body) => {
                return templates::render(&body, ctx.contact, &ctx.enrollment.custom_variables)
            }
            Err(err) => {
                warn!(error = %err, node_order = node.order, "AI generation failed, falling back to template");
            }
        }
    }

    templates::render(template, ctx.contact, &ctx.enrollment.custom_variables)
}

fn classify(err: SendError) -> ExecutionOutcome {
    match err {
        SendError::Transient(message) => ExecutionOutcome::retryable_failure(message),
        SendError::Permanent(message) => ExecutionOutcome::terminal_failure(message),
    }
}

// ─── Connection requests ───────────────────────────────────────────────────

pub struct LinkedInConnectProcessor {
    ledger: Arc<ExecutionLedger>,
    accounts: Arc<AccountStore>,
    linkedin: Arc<dyn LinkedInActor>,
    generator: Arc<dyn AiGenerator>,
}

impl LinkedInConnectProcessor {
    pub fn new(
        ledger: Arc<ExecutionLedger>,
        accounts: Arc<AccountStore>,
        linkedin: Arc<dyn LinkedInActor>,
        generator: Arc<dyn AiGenerator>,
    ) -> Self {
        Self {
            ledger,
            accounts,
            linkedin,
            generator,
        }
    }
}

impl NodeProcessor for LinkedInConnectProcessor {
    fn can_process(&self, node_type: NodeType) -> bool {
        node_type == NodeType::ActionLinkedinConnect
    }

    fn process(&self, ctx: &ExecutionContext<'_>) -> ExecutionOutcome {
        let node = ctx.node;

        if let Some(reason) = skip_reason(&self.ledger, node, ctx.enrollment) {
            debug!(node_order = node.order, %reason, "LinkedIn connect skipped");
            return ExecutionOutcome::skipped(reason, node.order + 1, ctx.now);
        }

        let (profile_url, account) = match linkedin_gates(&self.accounts, ctx) {
            Ok(pair) => pair,
            Err(outcome) => return outcome,
        };

        // A connect may go out without a note; one is attached only when the
        // node carries body text or asks for generation.
        let note = if node.body.is_some() || node.mode == NodeMode::Ai {
            Some(truncate_note(&build_body(
                self.generator.as_ref(),
                ctx,
                "Hi {{firstName}}, I'd love to connect.",
            )))
        } else {
            None
        };

        match self
            .linkedin
            .connect(&profile_url, note.as_deref(), account.id)
        {
            Ok(receipt) => ExecutionOutcome::completed(node.order + 1, ctx.now)
                .with_content(None, note)
                .with_message_id(receipt.action_id)
                .with_message(format!("connection request sent to {profile_url}")),
            Err(err) => classify(err),
        }
    }
}

// ─── Direct messages ───────────────────────────────────────────────────────

pub struct LinkedInMessageProcessor {
    ledger: Arc<ExecutionLedger>,
    accounts: Arc<AccountStore>,
    linkedin: Arc<dyn LinkedInActor>,
    generator: Arc<dyn AiGenerator>,
}

impl LinkedInMessageProcessor {
    pub fn new(
        ledger: Arc<ExecutionLedger>,
        accounts: Arc<AccountStore>,
        linkedin: Arc<dyn LinkedInActor>,
        generator: Arc<dyn AiGenerator>,
    ) -> Self {
        Self {
            ledger,
            accounts,
            linkedin,
            generator,
        }
    }
}

impl NodeProcessor for LinkedInMessageProcessor {
    fn can_process(&self, node_type: NodeType) -> bool {
        node_type == NodeType::ActionLinkedinMessage
    }

    fn process(&self, ctx: &ExecutionContext<'_>) -> ExecutionOutcome {
        let node = ctx.node;

        if let Some(reason) = skip_reason(&self.ledger, node, ctx.enrollment) {
            debug!(node_order = node.order, %reason, "LinkedIn message skipped");
            return ExecutionOutcome::skipped(reason, node.order + 1, ctx.now);
        }

        let (profile_url, account) = match linkedin_gates(&self.accounts, ctx) {
            Ok(pair) => pair,
            Err(outcome) => return outcome,
        };

        let body = build_body(
            self.generator.as_ref(),
            ctx,
            "Hi {{firstName}}, thanks for connecting!",
        );

        match self.linkedin.message(&profile_url, &body, account.id) {
            Ok(receipt) => ExecutionOutcome::completed(node.order + 1, ctx.now)
                .with_content(None, Some(body))
                .with_message_id(receipt.action_id)
                .with_message(format!("message sent to {profile_url}")),
            Err(err) => classify(err),
        }
    }
}
