//! Execution ledger — append-only record of every node execution attempt.
//!
//! The ledger is the engine's idempotency anchor: before dispatching a node
//! with an external side effect, the engine asks for a prior non-failed
//! record of the same (enrollment, node) pair and treats a hit as an
//! already-done advance. It also carries the engagement timestamps (opens,
//! clicks, replies) that skip conditions evaluate.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::{debug, warn};
use uuid::Uuid;

use coldreach_core::types::{EngagementKind, ExecutionRecord, ExecutionStatus};

pub struct ExecutionLedger {
    records: DashMap<Uuid, ExecutionRecord>,
    by_enrollment: DashMap<Uuid, Vec<Uuid>>,
    by_message: DashMap<String, Uuid>,
}

impl ExecutionLedger {
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
            by_enrollment: DashMap::new(),
            by_message: DashMap::new(),
        }
    }

    pub fn append(&self, record: ExecutionRecord) -> Uuid {
        let id = record.id;
        debug!(
            record_id = %id,
            enrollment_id = %record.enrollment_id,
            node_order = record.node_order,
            status = ?record.status,
            attempt = record.attempt,
            "Execution recorded"
        );
        self.by_enrollment
            .entry(record.enrollment_id)
            .or_default()
            .push(id);
        if let Some(message_id) = &record.message_id {
            self.by_message.insert(message_id.clone(), id);
        }
        self.records.insert(id, record);
        id
    }

    /// All records for an enrollment, oldest first.
    pub fn for_enrollment(&self, enrollment_id: Uuid) -> Vec<ExecutionRecord> {
        let mut records: Vec<ExecutionRecord> = self
            .by_enrollment
            .get(&enrollment_id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| self.records.get(id).map(|r| r.value().clone()))
                    .collect()
            })
            .unwrap_or_default();
        records.sort_by_key(|r| r.executed_at);
        records
    }

    /// A prior successful (completed or skipped) execution of the given node
    /// for this enrollment, if any. This is the idempotency probe.
    pub fn completed_execution(
        &self,
        enrollment_id: Uuid,
        node_id: Uuid,
    ) -> Option<ExecutionRecord> {
        self.for_enrollment(enrollment_id)
            .into_iter()
            .find(|r| r.node_id == node_id && r.status != ExecutionStatus::Failed)
    }

    /// Number of attempts already recorded for this (enrollment, node) pair.
    pub fn attempt_count(&self, enrollment_id: Uuid, node_id: Uuid) -> u32 {
        self.for_enrollment(enrollment_id)
            .iter()
            .filter(|r| r.node_id == node_id)
            .count() as u32
    }

    pub fn has_reply(&self, enrollment_id: Uuid) -> bool {
        self.for_enrollment(enrollment_id)
            .iter()
            .any(|r| r.replied_at.is_some())
    }

    pub fn has_open(&self, enrollment_id: Uuid) -> bool {
        self.for_enrollment(enrollment_id)
            .iter()
            .any(|r| r.opened_at.is_some())
    }

    pub fn has_click(&self, enrollment_id: Uuid) -> bool {
        self.for_enrollment(enrollment_id)
            .iter()
            .any(|r| r.clicked_at.is_some())
    }

    /// Mark an engagement (open/click/reply) on the record that produced the
    /// given provider message id. Returns the updated record, or None if the
    /// message id is unknown.
    pub fn record_engagement(
        &self,
        message_id: &str,
        kind: EngagementKind,
        at: DateTime<Utc>,
    ) -> Option<ExecutionRecord> {
        let record_id = match self.by_message.get(message_id) {
            Some(id) => *id,
            None => {
                warn!(message_id, "Engagement for unknown message id, skipping");
                return None;
            }
        };
        self.records.get_mut(&record_id).map(|mut record| {
            match kind {
                EngagementKind::Open => record.opened_at.get_or_insert(at),
                EngagementKind::Click => record.clicked_at.get_or_insert(at),
                EngagementKind::Reply => record.replied_at.get_or_insert(at),
            };
            record.clone()
        })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Default for ExecutionLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(
        enrollment_id: Uuid,
        node_id: Uuid,
        status: ExecutionStatus,
        message_id: Option<&str>,
    ) -> ExecutionRecord {
        ExecutionRecord {
            id: Uuid::new_v4(),
            enrollment_id,
            node_id,
            node_order: 0,
            attempt: 1,
            status,
            executed_at: Utc::now(),
            completed_at: Some(Utc::now()),
            scheduled_for: None,
            subject: None,
            body: None,
            message_id: message_id.map(String::from),
            error: None,
            opened_at: None,
            clicked_at: None,
            replied_at: None,
        }
    }

    #[test]
    fn test_completed_execution_ignores_failures() {
        let ledger = ExecutionLedger::new();
        let enrollment_id = Uuid::new_v4();
        let node_id = Uuid::new_v4();

        ledger.append(record(enrollment_id, node_id, ExecutionStatus::Failed, None));
        assert!(ledger.completed_execution(enrollment_id, node_id).is_none());
        assert_eq!(ledger.attempt_count(enrollment_id, node_id), 1);

        ledger.append(record(
            enrollment_id,
            node_id,
            ExecutionStatus::Completed,
            Some("gm-1"),
        ));
        assert!(ledger.completed_execution(enrollment_id, node_id).is_some());
        assert_eq!(ledger.attempt_count(enrollment_id, node_id), 2);
    }

    #[test]
    fn test_skipped_counts_as_done() {
        let ledger = ExecutionLedger::new();
        let enrollment_id = Uuid::new_v4();
        let node_id = Uuid::new_v4();
        ledger.append(record(enrollment_id, node_id, ExecutionStatus::Skipped, None));
        assert!(ledger.completed_execution(enrollment_id, node_id).is_some());
    }

    #[test]
    fn test_engagement_by_message_id() {
        let ledger = ExecutionLedger::new();
        let enrollment_id = Uuid::new_v4();
        ledger.append(record(
            enrollment_id,
            Uuid::new_v4(),
            ExecutionStatus::Completed,
            Some("gm-42"),
        ));

        assert!(!ledger.has_reply(enrollment_id));
        let updated = ledger
            .record_engagement("gm-42", EngagementKind::Reply, Utc::now())
            .unwrap();
        assert!(updated.replied_at.is_some());
        assert!(ledger.has_reply(enrollment_id));

        assert!(ledger
            .record_engagement("gm-unknown", EngagementKind::Open, Utc::now())
            .is_none());
    }

    #[test]
    fn test_engagement_first_timestamp_wins() {
        let ledger = ExecutionLedger::new();
        ledger.append(record(
            Uuid::new_v4(),
            Uuid::new_v4(),
            ExecutionStatus::Completed,
            Some("gm-7"),
        ));

        let first = Utc::now();
        let later = first + chrono::Duration::hours(1);
        ledger.record_engagement("gm-7", EngagementKind::Open, first);
        let updated = ledger
            .record_engagement("gm-7", EngagementKind::Open, later)
            .unwrap();
        assert_eq!(updated.opened_at, Some(first));
    }
}
