//! Condition node — branches the flow on recorded engagement.
//!
//! The predicate is the inverse of the node's skip conditions: a condition
//! node configured with `only_if_no_reply` asks "has this contact replied?"
//! and jumps to `branch_order` when the answer is yes. With no match (or no
//! conditions at all) the flow falls through to the next node.

use std::sync::Arc;

use tracing::debug;

use coldreach_core::types::{NodeConditions, NodeType};
use coldreach_store::ExecutionLedger;

use crate::outcome::{ExecutionContext, ExecutionOutcome};
use crate::processors::NodeProcessor;

pub struct ConditionProcessor {
    ledger: Arc<ExecutionLedger>,
}

impl ConditionProcessor {
    pub fn new(ledger: Arc<ExecutionLedger>) -> Self {
        Self { ledger }
    }

    fn engagement_matches(&self, conditions: &NodeConditions, enrollment_id: uuid::Uuid) -> bool {
        (conditions.only_if_no_reply && self.ledger.has_reply(enrollment_id))
            || (conditions.only_if_no_open && self.ledger.has_open(enrollment_id))
            || (conditions.only_if_no_click && self.ledger.has_click(enrollment_id))
    }
}

impl NodeProcessor for ConditionProcessor {
    fn can_process(&self, node_type: NodeType) -> bool {
        node_type == NodeType::Condition
    }

    fn process(&self, ctx: &ExecutionContext<'_>) -> ExecutionOutcome {
        let node = ctx.node;
        let fall_through = node.order + 1;

        let matched = node
            .conditions
            .as_ref()
            .map(|conditions| self.engagement_matches(conditions, ctx.enrollment.id))
            .unwrap_or(false);

        let next_order = if matched {
            node.branch_order.unwrap_or(fall_through)
        } else {
            fall_through
        };

        debug!(
            node_order = node.order,
            matched, next_order, "Condition evaluated"
        );

        ExecutionOutcome::completed(next_order, ctx.now).with_message(if matched {
            "condition matched, taking branch".to_string()
        } else {
            "condition not matched, falling through".to_string()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processors::test_fixtures::*;
    use coldreach_core::types::ExecutionStatus;

    fn processor(fx: &Fixture) -> ConditionProcessor {
        ConditionProcessor::new(fx.ledger.clone())
    }

    #[test]
    fn test_no_conditions_falls_through() {
        let fx = Fixture::new();
        let node = fx.node(NodeType::Condition, 2);
        let ctx = fx.context(&node);

        let outcome = processor(&fx).process(&ctx);
        assert_eq!(outcome.status, ExecutionStatus::Completed);
        assert_eq!(outcome.next_node_order, Some(3));
        assert_eq!(outcome.next_action_at, Some(fx.now));
    }

    #[test]
    fn test_matched_takes_branch() {
        let fx = Fixture::new();
        fx.record_reply_for_enrollment();
        let mut node = fx.node(NodeType::Condition, 2);
        node.conditions = Some(NodeConditions {
            only_if_no_reply: true,
            ..Default::default()
        });
        node.branch_order = Some(5);
        let ctx = fx.context(&node);

        let outcome = processor(&fx).process(&ctx);
        assert_eq!(outcome.next_node_order, Some(5));
    }

    #[test]
    fn test_matched_without_branch_falls_through() {
        let fx = Fixture::new();
        fx.record_reply_for_enrollment();
        let mut node = fx.node(NodeType::Condition, 2);
        node.conditions = Some(NodeConditions {
            only_if_no_reply: true,
            ..Default::default()
        });
        let ctx = fx.context(&node);

        let outcome = processor(&fx).process(&ctx);
        assert_eq!(outcome.next_node_order, Some(3));
    }

    #[test]
    fn test_unmatched_predicate_falls_through() {
        let fx = Fixture::new();
        let mut node = fx.node(NodeType::Condition, 2);
        node.conditions = Some(NodeConditions {
            only_if_no_open: true,
            ..Default::default()
        });
        node.branch_order = Some(7);
        let ctx = fx.context(&node);

        let outcome = processor(&fx).process(&ctx);
        assert_eq!(outcome.next_node_order, Some(3));
    }
}
