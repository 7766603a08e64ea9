//! Sluice Wire Protocol
//!
//! This crate defines the wire contracts the controller issues to data-plane
//! hosts. The shapes here are frozen for compatibility: input and output
//! hosts accept admin notifications (`DestinationsUpdatedRequest`,
//! `ConsumerGroupsUpdatedRequest`) and store hosts accept extent lifecycle
//! RPCs (`SealExtentRequest`, `ReplicateExtentRequest`,
//! `RemoteReplicateExtentRequest`).
//!
//! Every request carries a freshly generated update UUID so receivers can
//! deduplicate redelivery and operators can trace a reconfiguration across
//! hosts.

mod admin;
mod store;

pub use admin::{
    ConsumerGroupUpdatedNotification, ConsumerGroupsUpdatedRequest,
    DestinationUpdatedNotification, DestinationsUpdatedRequest, NotificationType,
};
pub use store::{RemoteReplicateExtentRequest, ReplicateExtentRequest, SealExtentRequest};

/// Protocol version for compatibility checking
pub const PROTOCOL_VERSION: u32 = 1;
