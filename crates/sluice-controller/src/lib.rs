//! # Sluice Controller
//!
//! Event-handling core of the Sluice control plane. The controller is the
//! authority coordinating three classes of data-plane hosts:
//!
//! - **Input hosts** accept writes for a destination's OPEN extents
//! - **Store hosts** replicate and persist extents (append-only units)
//! - **Output hosts** serve reads to consumer groups
//!
//! It reacts to lifecycle events (extent created, host failed, replica out
//! of sync, consumer group updated) by driving extents through their state
//! machine, fanning out reconfiguration notices, and keeping derived caches
//! coherent.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      Event Pipeline                          │
//! ├──────────────┬──────────────────┬────────────────────────────┤
//! │ Bounded queue│   Worker pool    │      Retry executor        │
//! │ non-blocking │ Event::handle    │ re-submits retryable       │
//! │ offer        │ per event        │ failures with backoff      │
//! ├──────────────┴──────────────────┴────────────────────────────┤
//! │ Handlers: extent created · cons group updated · host         │
//! │ notifications · host failed · extent down (seal) ·           │
//! │ replica out of sync · remote zone replication                │
//! ├──────────────────────────────────────────────────────────────┤
//! │ Shared state: seal rate limiter · in-progress / failed sets  │
//! │ Collaborators: metadata gateway · host directory · client    │
//! │ factory · extent monitor · result cache                      │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use sluice_controller::{Context, ControllerConfig, EventPipeline, ExtentCreatedEvent};
//! use std::sync::Arc;
//!
//! let pipeline = EventPipeline::new(4096);
//! let ctx = Arc::new(Context::new(
//!     ControllerConfig::default(),
//!     metadata, directory, clients, monitor, result_cache,
//!     pipeline.queue(),
//! ));
//! pipeline.start(Arc::clone(&ctx)).await;
//!
//! let event = ExtentCreatedEvent::new("dst-1", "in-1", "ext-1", store_ids);
//! if !pipeline.queue().add(Box::new(event)) {
//!     // queue full: best effort, the reconciler re-derives the work
//! }
//! ```

pub mod clients;
pub mod config;
pub mod context;
pub mod directory;
pub mod error;
pub mod handlers;
pub mod metadata;
pub mod monitor;
pub mod observability;
pub mod pipeline;
pub mod rate_limiter;
pub mod result_cache;
pub mod retry;
pub mod tracking;

// Re-export main types
pub use clients::{
    with_deadline, ClientFactory, InputHostAdminClient, OutputHostAdminClient, RpcError,
    StoreClient, StoreClientLease,
};
pub use config::{ControllerConfig, RetryProfiles, RpcDeadlines};
pub use context::Context;
pub use directory::{HostDirectory, ResolveError, ServiceKind};
pub use error::{ControllerError, Result};
pub use handlers::{
    add_extent_down_event, reasons, ConsGroupUpdatedEvent, ExtentCreatedEvent, ExtentDownEvent,
    InputHostFailedEvent, InputHostNotificationEvent, OutputHostNotificationEvent,
    RemoteZoneExtentCreatedEvent, StoreExtentStatusOutOfSyncEvent, StoreHostFailedEvent,
};
pub use metadata::{
    ConsumerGroupDescription, ConsumerGroupExtent, ConsumerGroupExtentStatus, ConsumerGroupStatus,
    DestinationType, Extent, ExtentStats, ExtentStatus, MetadataError, MetadataGateway,
};
pub use monitor::ExtentStateMonitor;
pub use observability::{ControllerMetrics, EventScope};
pub use pipeline::{Event, EventPipeline, EventQueue};
pub use rate_limiter::TokenBucket;
pub use result_cache::{now_nanos, CacheLookup, ResultCache, ResultCacheEntry};
pub use retry::{retry_with_policy, RetryPolicy};
pub use tracking::{ExtentSeals, FailedSet, InProgressSet};
