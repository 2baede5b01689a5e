//! Event bus — trait for emitting outreach lifecycle events from any module.
//!
//! The engine and channels accept an `Arc<dyn EventSink>` so that campaign
//! activity can be routed to analytics or webhooks without coupling to them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Kinds of outreach lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    CampaignStarted,
    CampaignPaused,
    CampaignResumed,
    ContactEnrolled,
    ContactRemoved,
    EnrollmentCompleted,
    NodeExecuted,
    NodeSkipped,
    NodeFailed,
    EmailSent,
    LinkedinConnectSent,
    LinkedinMessageSent,
    EmailOpened,
    EmailClicked,
    EmailReplied,
}

/// A single outreach event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutreachEvent {
    pub event_id: Uuid,
    pub event_type: EventType,
    pub campaign_id: Option<Uuid>,
    pub enrollment_id: Option<Uuid>,
    pub contact_id: Option<Uuid>,
    pub node_order: Option<u32>,
    pub message_id: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Trait for emitting outreach events.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: OutreachEvent);
}

/// No-op sink for tests and modules that don't need event emission.
pub struct NoOpSink;

impl EventSink for NoOpSink {
    fn emit(&self, _event: OutreachEvent) {}
}

/// In-memory sink that captures events for testing.
#[derive(Default)]
pub struct CaptureSink {
    events: Mutex<Vec<OutreachEvent>>,
}

impl CaptureSink {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn events(&self) -> Vec<OutreachEvent> {
        self.events.lock().expect("event bus mutex poisoned").clone()
    }

    pub fn count(&self) -> usize {
        self.events.lock().expect("event bus mutex poisoned").len()
    }

    pub fn count_type(&self, event_type: EventType) -> usize {
        self.events
            .lock()
            .expect("event bus mutex poisoned")
            .iter()
            .filter(|e| e.event_type == event_type)
            .count()
    }

    pub fn clear(&self) {
        self.events.lock().expect("event bus mutex poisoned").clear();
    }
}

impl EventSink for CaptureSink {
    fn emit(&self, event: OutreachEvent) {
        self.events.lock().expect("event bus mutex poisoned").push(event);
    }
}

/// Convenience builder for creating an `OutreachEvent` with minimal
/// boilerplate.
pub fn make_event(
    event_type: EventType,
    campaign_id: Option<Uuid>,
    enrollment_id: Option<Uuid>,
    contact_id: Option<Uuid>,
) -> OutreachEvent {
    OutreachEvent {
        event_id: Uuid::new_v4(),
        event_type,
        campaign_id,
        enrollment_id,
        contact_id,
        node_order: None,
        message_id: None,
        timestamp: Utc::now(),
    }
}

/// Convenience: create a no-op event bus for modules that don't need it.
pub fn noop_sink() -> Arc<dyn EventSink> {
    Arc::new(NoOpSink)
}

/// Convenience: create a capture sink for tests.
pub fn capture_sink() -> Arc<CaptureSink> {
    Arc::new(CaptureSink::new())
}
