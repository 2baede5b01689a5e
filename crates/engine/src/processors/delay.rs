//! Delay node — schedules the enrollment's next action in the future.

use chrono::{DateTime, Duration, Utc};

use coldreach_core::types::{DelayUnit, NodeType};

use crate::outcome::{ExecutionContext, ExecutionOutcome};
use crate::processors::NodeProcessor;

pub struct DelayProcessor;

impl NodeProcessor for DelayProcessor {
    fn can_process(&self, node_type: NodeType) -> bool {
        node_type == NodeType::Delay
    }

    fn process(&self, ctx: &ExecutionContext<'_>) -> ExecutionOutcome {
        // Unconfigured delays default to one day.
        let value = ctx.node.delay_value.unwrap_or(1);
        let unit = ctx.node.delay_unit.unwrap_or(DelayUnit::Days);
        let next_action_at = next_action_time(ctx.now, value, unit);

        ExecutionOutcome::completed(ctx.node.order + 1, next_action_at)
            .with_scheduled_for(next_action_at)
            .with_message(format!("waiting {value} {unit:?}").to_lowercase())
    }
}

fn next_action_time(now: DateTime<Utc>, value: i64, unit: DelayUnit) -> DateTime<Utc> {
    match unit {
        DelayUnit::Minutes => now + Duration::minutes(value),
        DelayUnit::Hours => now + Duration::hours(value),
        DelayUnit::Days => now + Duration::days(value),
    }
}
