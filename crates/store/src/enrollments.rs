//! Enrollment store — per (campaign, contact) progress records.
//!
//! Advancing an enrollment is version-checked: callers read the enrollment,
//! perform their side effect, then call [`EnrollmentStore::advance`] with the
//! version they read. A concurrent sweep that advanced the enrollment first
//! wins and the loser gets a `Conflict` to discard.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::{debug, info};
use uuid::Uuid;

use coldreach_core::error::{OutreachError, OutreachResult};
use coldreach_core::types::{ContactEnrollment, EnrollmentStatus};

pub struct EnrollmentStore {
    enrollments: DashMap<Uuid, ContactEnrollment>,
    /// (campaign_id, contact_id) -> enrollment id, enforcing one enrollment
    /// per pair.
    by_pair: DashMap<(Uuid, Uuid), Uuid>,
}

impl EnrollmentStore {
    pub fn new() -> Self {
        Self {
            enrollments: DashMap::new(),
            by_pair: DashMap::new(),
        }
    }

    /// Enroll a contact at node 0, eligible immediately. A duplicate
    /// (campaign, contact) pair is a `Conflict`, reported softly by callers.
    pub fn enroll(
        &self,
        campaign_id: Uuid,
        contact_id: Uuid,
        custom_variables: HashMap<String, String>,
        now: DateTime<Utc>,
    ) -> OutreachResult<ContactEnrollment> {
        let key = (campaign_id, contact_id);
        if self.by_pair.contains_key(&key) {
            return Err(OutreachError::Conflict(
                "contact is already in this campaign".into(),
            ));
        }

        let enrollment = ContactEnrollment {
            id: Uuid::new_v4(),
            campaign_id,
            contact_id,
            status: EnrollmentStatus::Active,
            current_node_order: 0,
            next_action_at: Some(now),
            custom_variables,
            needs_review: None,
            failed_attempts: 0,
            version: 1,
            enrolled_at: now,
            completed_at: None,
        };

        info!(
            enrollment_id = %enrollment.id,
            campaign_id = %campaign_id,
            contact_id = %contact_id,
            "Contact enrolled"
        );

        self.by_pair.insert(key, enrollment.id);
        self.enrollments.insert(enrollment.id, enrollment.clone());
        Ok(enrollment)
    }

    pub fn get(&self, id: Uuid) -> Option<ContactEnrollment> {
        self.enrollments.get(&id).map(|r| r.value().clone())
    }

    pub fn get_by_pair(&self, campaign_id: Uuid, contact_id: Uuid) -> Option<ContactEnrollment> {
        self.by_pair
            .get(&(campaign_id, contact_id))
            .and_then(|id| self.get(*id))
    }

    /// Enrollments due for action: ACTIVE and past due (or never scheduled at
    /// node 0), capped at `limit`, oldest due first.
    pub fn due(&self, campaign_id: Uuid, now: DateTime<Utc>, limit: usize) -> Vec<ContactEnrollment> {
        let mut due: Vec<ContactEnrollment> = self
            .enrollments
            .iter()
            .filter(|r| {
                let e = r.value();
                e.campaign_id == campaign_id
                    && e.status == EnrollmentStatus::Active
                    && match e.next_action_at {
                        Some(at) => at <= now,
                        None => e.current_node_order == 0,
                    }
            })
            .map(|r| r.value().clone())
            .collect();
        due.sort_by_key(|e| e.next_action_at.unwrap_or(e.enrolled_at));
        due.truncate(limit);
        due
    }

    pub fn for_campaign(&self, campaign_id: Uuid) -> Vec<ContactEnrollment> {
        self.enrollments
            .iter()
            .filter(|r| r.value().campaign_id == campaign_id)
            .map(|r| r.value().clone())
            .collect()
    }

    pub fn active_count(&self, campaign_id: Uuid) -> usize {
        self.enrollments
            .iter()
            .filter(|r| {
                r.value().campaign_id == campaign_id
                    && r.value().status == EnrollmentStatus::Active
            })
            .count()
    }

    /// Version-checked advance. The write happens only if the stored version
    /// still equals `expected_version`; otherwise a concurrent sweep already
    /// moved this enrollment and the caller must discard its work.
    pub fn advance(
        &self,
        id: Uuid,
        expected_version: u64,
        next_node_order: u32,
        next_action_at: Option<DateTime<Utc>>,
    ) -> OutreachResult<ContactEnrollment> {
        let mut entry = self
            .enrollments
            .get_mut(&id)
            .ok_or_else(|| OutreachError::DataIntegrity(format!("enrollment {id} not found")))?;

        if entry.version != expected_version {
            debug!(
                enrollment_id = %id,
                expected = expected_version,
                actual = entry.version,
                "Enrollment version conflict"
            );
            return Err(OutreachError::Conflict(format!(
                "enrollment {id} advanced by a concurrent sweep"
            )));
        }

        entry.current_node_order = next_node_order;
        entry.next_action_at = next_action_at;
        entry.failed_attempts = 0;
        entry.version += 1;
        Ok(entry.clone())
    }

    pub fn complete(&self, id: Uuid, now: DateTime<Utc>) -> Option<ContactEnrollment> {
        self.enrollments.get_mut(&id).map(|mut entry| {
            entry.status = EnrollmentStatus::Completed;
            entry.completed_at = Some(now);
            entry.next_action_at = None;
            entry.version += 1;
            info!(enrollment_id = %id, "Enrollment completed");
            entry.clone()
        })
    }

    pub fn set_status(&self, id: Uuid, status: EnrollmentStatus) -> Option<ContactEnrollment> {
        self.enrollments.get_mut(&id).map(|mut entry| {
            entry.status = status;
            entry.version += 1;
            entry.clone()
        })
    }

    /// Flag a configuration failure for operator review. The enrollment stays
    /// ACTIVE at the same node so a config fix lets the next sweep proceed.
    pub fn flag_for_review(&self, id: Uuid, reason: &str) {
        if let Some(mut entry) = self.enrollments.get_mut(&id) {
            entry.needs_review = Some(reason.to_string());
            entry.version += 1;
        }
    }

    pub fn clear_review_flag(&self, id: Uuid) {
        if let Some(mut entry) = self.enrollments.get_mut(&id) {
            entry.needs_review = None;
            entry.version += 1;
        }
    }

    pub fn record_failed_attempt(&self, id: Uuid) {
        if let Some(mut entry) = self.enrollments.get_mut(&id) {
            entry.failed_attempts += 1;
            entry.version += 1;
        }
    }

    /// Mark the enrollment REMOVED. The pair index entry is kept so a
    /// re-add surfaces as a conflict rather than double-enrolling.
    pub fn remove(&self, campaign_id: Uuid, contact_id: Uuid) -> bool {
        if let Some(id) = self.by_pair.get(&(campaign_id, contact_id)).map(|r| *r) {
            if let Some(mut entry) = self.enrollments.get_mut(&id) {
                entry.status = EnrollmentStatus::Removed;
                entry.next_action_at = None;
                entry.version += 1;
                info!(enrollment_id = %id, "Enrollment removed");
                return true;
            }
        }
        false
    }
}

impl Default for EnrollmentStore {
    fn default() -> Self {
        Self::new()
    }
}
