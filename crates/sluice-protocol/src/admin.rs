//! Admin notifications sent to input and output hosts

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How much state the receiving host must reload on a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum NotificationType {
    /// Reload all state for the destination / consumer group
    All,
    /// Reconfigure connected clients only
    Client,
}

/// One destination change visible to an input host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestinationUpdatedNotification {
    pub destination_id: String,
    pub notification_type: NotificationType,
    pub extent_id: String,
    pub store_ids: Vec<String>,
}

/// Batch of destination updates pushed to a single input host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestinationsUpdatedRequest {
    /// Fresh per-request UUID for dedup and tracing
    pub update_uuid: String,
    pub updates: Vec<DestinationUpdatedNotification>,
}

impl DestinationsUpdatedRequest {
    /// Build a single-update request with a fresh update UUID
    pub fn single(update: DestinationUpdatedNotification) -> Self {
        Self {
            update_uuid: Uuid::new_v4().to_string(),
            updates: vec![update],
        }
    }
}

/// One consumer-group change visible to an output host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumerGroupUpdatedNotification {
    pub consumer_group_id: String,
    pub notification_type: NotificationType,
}

/// Batch of consumer-group updates pushed to a single output host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumerGroupsUpdatedRequest {
    /// Fresh per-request UUID for dedup and tracing
    pub update_uuid: String,
    pub updates: Vec<ConsumerGroupUpdatedNotification>,
}

impl ConsumerGroupsUpdatedRequest {
    /// Build a single-update request with a fresh update UUID
    pub fn single(update: ConsumerGroupUpdatedNotification) -> Self {
        Self {
            update_uuid: Uuid::new_v4().to_string(),
            updates: vec![update],
        }
    }
}
