//! Typed view of the metadata store
//!
//! The metadata store itself is an external collaborator; the controller
//! consumes it through [`MetadataGateway`]. Records here are the semantic
//! shapes the event handlers need, not the storage schema.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Extent lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ExtentStatus {
    Open,
    Sealed,
    Consumed,
    Archived,
    Deleted,
}

/// Consumer group lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ConsumerGroupStatus {
    Enabled,
    Disabled,
    Deleted,
}

/// Status of one extent within a consumer group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ConsumerGroupExtentStatus {
    Open,
    Consumed,
    Deleted,
}

/// Destination flavor, carried in the output-host result cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DestinationType {
    Plain,
    Timer,
}

/// Immutable extent descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extent {
    pub extent_id: String,
    pub destination_id: String,
    /// Input host accepting writes for this extent while it is OPEN
    pub input_host_id: String,
    /// Replica set; for remote-zone extents the first entry is the primary
    pub store_ids: Vec<String>,
    /// Zone the extent was created in; empty for local extents
    pub origin_zone: String,
}

impl Extent {
    /// True when the extent originated in another zone and is therefore
    /// replicated into this one rather than written here
    pub fn is_in_remote_zone(&self, local_zone: &str) -> bool {
        !self.origin_zone.is_empty() && self.origin_zone != local_zone
    }
}

/// Extent descriptor plus its current status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtentStats {
    pub extent: Extent,
    pub status: ExtentStatus,
}

/// Consumer group registration on a destination
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumerGroupDescription {
    pub consumer_group_id: String,
    pub destination_id: String,
    pub status: ConsumerGroupStatus,
}

/// Binding of an extent to a consumer group and the output host serving it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumerGroupExtent {
    pub consumer_group_id: String,
    pub extent_id: String,
    pub output_host_id: String,
    pub status: ConsumerGroupExtentStatus,
}

/// Metadata store errors
///
/// Opaque to handlers except [`MetadataError::IllegalState`], which
/// `seal_extent` returns when the record already advanced past OPEN.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetadataError {
    #[error("record state already advanced")]
    IllegalState,

    #[error("record not found: {0}")]
    NotFound(String),

    #[error("metadata store unavailable: {0}")]
    Unavailable(String),

    #[error("metadata internal error: {0}")]
    Internal(String),
}

/// Typed queries and mutations on extent / consumer-group records
#[async_trait]
pub trait MetadataGateway: Send + Sync {
    /// Extents on a destination, filtered by status
    async fn list_extents_by_dst_status(
        &self,
        destination_id: &str,
        statuses: &[ExtentStatus],
    ) -> Result<Vec<ExtentStats>, MetadataError>;

    /// Extents bound to a consumer group, filtered by binding status
    async fn list_extents_by_consumer_group(
        &self,
        destination_id: &str,
        consumer_group_id: &str,
        statuses: &[ConsumerGroupExtentStatus],
    ) -> Result<Vec<ConsumerGroupExtent>, MetadataError>;

    /// Extents served by an input host, filtered by status
    async fn list_extents_by_input_host_status(
        &self,
        input_host_id: &str,
        status: ExtentStatus,
    ) -> Result<Vec<ExtentStats>, MetadataError>;

    /// Extents replicated on a store host, filtered by status
    async fn list_extents_by_store_status(
        &self,
        store_id: &str,
        status: ExtentStatus,
    ) -> Result<Vec<ExtentStats>, MetadataError>;

    /// All consumer groups registered on a destination
    async fn list_consumer_groups_by_dst(
        &self,
        destination_id: &str,
    ) -> Result<Vec<ConsumerGroupDescription>, MetadataError>;

    /// Current descriptor and status of one extent
    async fn read_extent_stats(
        &self,
        destination_id: &str,
        extent_id: &str,
    ) -> Result<ExtentStats, MetadataError>;

    /// Mark the extent SEALED. Returns [`MetadataError::IllegalState`] when
    /// the record already moved past OPEN.
    async fn seal_extent(
        &self,
        destination_id: &str,
        extent_id: &str,
    ) -> Result<(), MetadataError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extent(origin_zone: &str) -> Extent {
        Extent {
            extent_id: "e1".into(),
            destination_id: "d1".into(),
            input_host_id: "in1".into(),
            store_ids: vec!["s1".into()],
            origin_zone: origin_zone.into(),
        }
    }

    #[test]
    fn test_remote_zone_detection() {
        assert!(!extent("").is_in_remote_zone("zone-a"));
        assert!(!extent("zone-a").is_in_remote_zone("zone-a"));
        assert!(extent("zone-b").is_in_remote_zone("zone-a"));
        // No zone configured locally: any originated extent counts as remote
        assert!(extent("zone-b").is_in_remote_zone(""));
    }
}
