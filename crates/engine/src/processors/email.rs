//! Email action node — renders or generates the message, dispatches it
//! through the email sender, and classifies failures for the engine.

use std::sync::Arc;

use tracing::{debug, warn};

use coldreach_channels::ai::{AiGenerator, PriorMessage, Tone};
use coldreach_channels::email::{EmailDispatch, EmailSender, SendError};
use coldreach_channels::templates;
use coldreach_core::types::{NodeMode, NodeType};
use coldreach_delivery::DailyCapTracker;
use coldreach_store::{AccountStore, ExecutionLedger};

use crate::outcome::{ExecutionContext, ExecutionOutcome};
use crate::processors::{generation_request, skip_reason, NodeProcessor};

pub struct EmailProcessor {
    ledger: Arc<ExecutionLedger>,
    accounts: Arc<AccountStore>,
    sender: Arc<dyn EmailSender>,
    generator: Arc<dyn AiGenerator>,
    caps: Arc<DailyCapTracker>,
}

impl EmailProcessor {
    pub fn new(
        ledger: Arc<ExecutionLedger>,
        accounts: Arc<AccountStore>,
        sender: Arc<dyn EmailSender>,
        generator: Arc<dyn AiGenerator>,
        caps: Arc<DailyCapTracker>,
    ) -> Self {
        Self {
            ledger,
            accounts,
            sender,
            generator,
            caps,
        }
    }

    /// Produce (subject, body): AI generation with template fallback when the
    /// node is in AI mode, plain variable substitution otherwise.
    fn build_content(&self, ctx: &ExecutionContext<'_>) -> (String, String) {
        let node = ctx.node;
        let contact = ctx.contact;
        let vars = &ctx.enrollment.custom_variables;

        let template_subject = node.subject.as_deref().unwrap_or("Hello {{firstName}}");
        let template_body = node
            .body
            .as_deref()
            .unwrap_or("Hi {{firstName}}, I wanted to reach out...");

        if node.mode == NodeMode::Ai {
            let mut request = generation_request(ctx, Tone::Professional);
            request.prior_messages = self
                .ledger
                .for_enrollment(ctx.enrollment.id)
                .into_iter()
                .filter_map(|record| {
                    record.body.map(|body| PriorMessage {
                        outbound: true,
                        body,
                    })
                })
                .collect();
            match self.generator.generate(&request) {
                Ok(body) => {
                    // The generator writes bodies only; subject comes from the
                    // template or a reference to the contact.
                    let subject = match &node.subject {
                        Some(s) => templates::render(s, contact, vars),
                        None => {
                            let reference = contact
                                .company
                                .as_ref()
                                .map(|c| c.name.clone())
                                .unwrap_or_else(|| contact.first_name.clone());
                            format!("Re: {reference}")
                        }
                    };
                    return (subject, templates::render(&body, contact, vars));
                }
                Err(err) => {
                    warn!(error = %err, node_order = node.order, "AI generation failed, falling back to template");
                }
            }
        }

        (
            templates::render(template_subject, contact, vars),
            templates::render(template_body, contact, vars),
        )
    }
}

impl NodeProcessor for EmailProcessor {
    fn can_process(&self, node_type: NodeType) -> bool {
        node_type == NodeType::ActionEmail
    }

    fn process(&self, ctx: &ExecutionContext<'_>) -> ExecutionOutcome {
        let node = ctx.node;

        if let Some(reason) = skip_reason(&self.ledger, node, ctx.enrollment) {
            debug!(node_order = node.order, %reason, "Email node skipped");
            return ExecutionOutcome::skipped(reason, node.order + 1, ctx.now);
        }

        // Configuration gates: these need an operator, not a retry.
        let account_id = match ctx.campaign.email_account_id {
            Some(id) => id,
            None => {
                return ExecutionOutcome::terminal_failure(
                    "no email account configured for this campaign",
                )
            }
        };
        let account = match self.accounts.email_account(account_id) {
            Some(account) if account.is_active => account,
            _ => {
                return ExecutionOutcome::terminal_failure("email account not found or inactive")
            }
        };
        let to = match &ctx.contact.email {
            Some(email) => email.clone(),
            None => return ExecutionOutcome::terminal_failure("contact has no email address"),
        };

        if !self.caps.can_send(account_id, account.daily_cap, ctx.now) {
            return ExecutionOutcome::retryable_failure(format!(
                "daily cap of {} reached for account {}",
                account.daily_cap, account.email
            ));
        }

        let (subject, body) = self.build_content(ctx);

        let dispatch = EmailDispatch {
            to: to.clone(),
            subject: subject.clone(),
            html_body: body.clone(),
            account_id,
            track_opens: true,
            track_clicks: true,
        };

        match self.sender.send(&dispatch) {
            Ok(receipt) => {
                self.caps.record_send(account_id, ctx.now);
                ExecutionOutcome::completed(node.order + 1, ctx.now)
                    .with_content(Some(subject), Some(body))
                    .with_message_id(receipt.message_id)
                    .with_message(format!("email sent to {to}"))
            }
            Err(SendError::Transient(err)) => ExecutionOutcome::retryable_failure(err),
            Err(SendError::Permanent(err)) => ExecutionOutcome::terminal_failure(err),
        }
    }
}
