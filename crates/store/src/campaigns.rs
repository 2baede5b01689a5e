//! Campaign store — definitions, status transitions, and per-node counters.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::info;
use uuid::Uuid;

use coldreach_core::error::{OutreachError, OutreachResult};
use coldreach_core::types::{Campaign, CampaignStatus, FlowNode};

/// Thread-safe in-memory store for campaign definitions.
pub struct CampaignStore {
    campaigns: DashMap<Uuid, Campaign>,
}

impl CampaignStore {
    pub fn new() -> Self {
        Self {
            campaigns: DashMap::new(),
        }
    }

    /// Insert a campaign after validating its flow: node orders must be
    /// dense and zero-based.
    pub fn insert(&self, campaign: Campaign) -> OutreachResult<Uuid> {
        validate_flow(&campaign.nodes)?;
        let id = campaign.id;
        info!(campaign_id = %id, name = %campaign.name, "Campaign created");
        self.campaigns.insert(id, campaign);
        Ok(id)
    }

    pub fn get(&self, id: Uuid) -> Option<Campaign> {
        self.campaigns.get(&id).map(|r| r.value().clone())
    }

    pub fn list(&self) -> Vec<Campaign> {
        let mut campaigns: Vec<Campaign> =
            self.campaigns.iter().map(|r| r.value().clone()).collect();
        campaigns.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        campaigns
    }

    pub fn list_active(&self) -> Vec<Campaign> {
        self.campaigns
            .iter()
            .filter(|r| r.value().status == CampaignStatus::Active)
            .map(|r| r.value().clone())
            .collect()
    }

    /// Current status without cloning the whole campaign. Used by the engine's
    /// mid-sweep pause check.
    pub fn status(&self, id: Uuid) -> Option<CampaignStatus> {
        self.campaigns.get(&id).map(|r| r.status)
    }

    pub fn set_status(&self, id: Uuid, status: CampaignStatus) -> Option<Campaign> {
        self.campaigns.get_mut(&id).map(|mut entry| {
            info!(campaign_id = %id, ?status, "Campaign status updated");
            entry.status = status;
            entry.updated_at = Utc::now();
            entry.clone()
        })
    }

    pub fn mark_started(&self, id: Uuid, at: DateTime<Utc>) {
        if let Some(mut entry) = self.campaigns.get_mut(&id) {
            entry.status = CampaignStatus::Active;
            entry.started_at = Some(at);
            entry.updated_at = at;
        }
    }

    /// Replace a campaign's flow. Only meaningful while the campaign is a
    /// draft; the flow editor is the caller.
    pub fn replace_nodes(&self, id: Uuid, nodes: Vec<FlowNode>) -> OutreachResult<()> {
        validate_flow(&nodes)?;
        let mut entry = self
            .campaigns
            .get_mut(&id)
            .ok_or_else(|| OutreachError::DataIntegrity(format!("campaign {id} not found")))?;
        entry.nodes = nodes;
        entry.updated_at = Utc::now();
        Ok(())
    }

    /// Bump the per-node success/failure counters after an execution attempt.
    pub fn record_node_result(&self, campaign_id: Uuid, order: u32, success: bool) {
        if let Some(mut entry) = self.campaigns.get_mut(&campaign_id) {
            if let Some(node) = entry.nodes.iter_mut().find(|n| n.order == order) {
                node.total_executed += 1;
                if success {
                    node.total_success += 1;
                } else {
                    node.total_failed += 1;
                }
            }
        }
    }

    pub fn increment_total_sent(&self, campaign_id: Uuid) {
        if let Some(mut entry) = self.campaigns.get_mut(&campaign_id) {
            entry.total_sent += 1;
        }
    }
}

impl Default for CampaignStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Node orders must be contiguous starting at zero.
fn validate_flow(nodes: &[FlowNode]) -> OutreachResult<()> {
    let mut orders: Vec<u32> = nodes.iter().map(|n| n.order).collect();
    orders.sort_unstable();
    for (expected, order) in orders.iter().enumerate() {
        if *order != expected as u32 {
            return Err(OutreachError::DataIntegrity(format!(
                "flow node orders must be dense from 0, found {order} at position {expected}"
            )));
        }
    }
    Ok(())
}
