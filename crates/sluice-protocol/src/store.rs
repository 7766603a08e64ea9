//! Extent lifecycle RPCs issued to store hosts

use serde::{Deserialize, Serialize};

/// Seal an extent on a single store, making it immutable
///
/// Sealing is idempotent at the store layer: re-sealing an already sealed
/// extent succeeds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealExtentRequest {
    pub extent_id: String,
    /// Seal at this sequence number; `None` lets the store pick its
    /// last written sequence
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence_number: Option<i64>,
}

impl SealExtentRequest {
    /// Build a seal request; a non-positive `seal_seq` means "let the store decide"
    pub fn new(extent_id: impl Into<String>, seal_seq: i64) -> Self {
        Self {
            extent_id: extent_id.into(),
            sequence_number: (seal_seq > 0).then_some(seal_seq),
        }
    }
}

/// Ask a store to replicate an extent from a peer store in the same zone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicateExtentRequest {
    pub destination_id: String,
    pub extent_id: String,
    /// Store to stream the extent from
    pub source_store_id: String,
}

/// Ask a store to replicate an extent from its origin zone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteReplicateExtentRequest {
    pub destination_id: String,
    pub extent_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seal_request_sequence_number() {
        assert_eq!(SealExtentRequest::new("ext-1", 0).sequence_number, None);
        assert_eq!(SealExtentRequest::new("ext-1", -1).sequence_number, None);
        assert_eq!(SealExtentRequest::new("ext-1", 42).sequence_number, Some(42));
    }

    #[test]
    fn test_seal_request_omits_absent_sequence_on_the_wire() {
        let json = serde_json::to_string(&SealExtentRequest::new("ext-1", 0)).unwrap();
        assert!(!json.contains("sequence_number"));
    }
}
