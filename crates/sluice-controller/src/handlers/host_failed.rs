//! Host failure handling
//!
//! A failed input or store host orphans its OPEN extents; each one gets an
//! `ExtentDownEvent` to drive the seal. A metadata read failure here is not
//! retried: the background extent monitor re-raises equivalent events on its
//! next cycle.

use super::create_extent_down_events;
use crate::context::Context;
use crate::error::Result;
use crate::metadata::ExtentStatus;
use crate::observability::{ControllerMetrics, EventScope};
use crate::pipeline::Event;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::error;

/// An input host dropped out of service discovery
pub struct InputHostFailedEvent {
    host_id: String,
}

impl InputHostFailedEvent {
    pub fn new(host_id: impl Into<String>) -> Self {
        Self {
            host_id: host_id.into(),
        }
    }
}

#[async_trait]
impl Event for InputHostFailedEvent {
    fn scope(&self) -> EventScope {
        EventScope::InputFailed
    }

    async fn handle(&mut self, ctx: &Arc<Context>) -> Result<()> {
        let stats = match ctx
            .metadata
            .list_extents_by_input_host_status(&self.host_id, ExtentStatus::Open)
            .await
        {
            Ok(stats) => stats,
            Err(err) => {
                ControllerMetrics::increment_failures(self.scope());
                ControllerMetrics::increment_metadata_read_errors(self.scope());
                error!(
                    input_host_id = %self.host_id,
                    error = %err,
                    "cannot list extents for failed input host, monitor will catch up"
                );
                return Ok(());
            }
        };
        create_extent_down_events(ctx, &stats);
        Ok(())
    }
}

/// A store host dropped out of service discovery
pub struct StoreHostFailedEvent {
    host_id: String,
}

impl StoreHostFailedEvent {
    pub fn new(host_id: impl Into<String>) -> Self {
        Self {
            host_id: host_id.into(),
        }
    }
}

#[async_trait]
impl Event for StoreHostFailedEvent {
    fn scope(&self) -> EventScope {
        EventScope::StoreFailed
    }

    async fn handle(&mut self, ctx: &Arc<Context>) -> Result<()> {
        let stats = match ctx
            .metadata
            .list_extents_by_store_status(&self.host_id, ExtentStatus::Open)
            .await
        {
            Ok(stats) => stats,
            Err(err) => {
                ControllerMetrics::increment_failures(self.scope());
                ControllerMetrics::increment_metadata_read_errors(self.scope());
                error!(
                    store_id = %self.host_id,
                    error = %err,
                    "cannot list extents for failed store host, monitor will catch up"
                );
                return Ok(());
            }
        };
        create_extent_down_events(ctx, &stats);
        Ok(())
    }
}
