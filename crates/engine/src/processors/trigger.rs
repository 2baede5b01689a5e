//! Trigger node — marks the contact as started; the flow proper begins at
//! the next node.

use coldreach_core::types::NodeType;

use crate::outcome::{ExecutionContext, ExecutionOutcome};
use crate::processors::NodeProcessor;

pub struct TriggerProcessor;

impl NodeProcessor for TriggerProcessor {
    fn can_process(&self, node_type: NodeType) -> bool {
        node_type == NodeType::TriggerStart
    }

    fn process(&self, ctx: &ExecutionContext<'_>) -> ExecutionOutcome {
        // Triggers always succeed and hand off immediately.
        ExecutionOutcome::completed(ctx.node.order + 1, ctx.now).with_message(format!(
            "{} started in campaign",
            ctx.contact.first_name
        ))
    }
}
