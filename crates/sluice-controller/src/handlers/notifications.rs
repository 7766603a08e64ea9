//! Advisory reconfiguration notices to input and output hosts
//!
//! Notifications are best effort end to end: resolution failures, client
//! creation failures, and retry exhaustion are all logged, counted, and
//! swallowed. Correctness does not depend on delivery; the next
//! reconciliation tick re-derives host state.

use crate::clients::{with_deadline, RpcError};
use crate::context::Context;
use crate::directory::ServiceKind;
use crate::error::Result;
use crate::observability::{ControllerMetrics, EventScope};
use crate::pipeline::Event;
use crate::retry::retry_with_policy;
use async_trait::async_trait;
use sluice_protocol::{
    ConsumerGroupUpdatedNotification, ConsumerGroupsUpdatedRequest, DestinationUpdatedNotification,
    DestinationsUpdatedRequest, NotificationType,
};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Tell one input host that a destination it serves changed
pub struct InputHostNotificationEvent {
    destination_id: String,
    input_host_id: String,
    extent_id: String,
    store_ids: Vec<String>,
    reason: String,
    reason_context: String,
    notification_type: NotificationType,
}

impl InputHostNotificationEvent {
    pub fn new(
        destination_id: impl Into<String>,
        input_host_id: impl Into<String>,
        extent_id: impl Into<String>,
        store_ids: Vec<String>,
        reason: impl Into<String>,
        reason_context: impl Into<String>,
        notification_type: NotificationType,
    ) -> Self {
        Self {
            destination_id: destination_id.into(),
            input_host_id: input_host_id.into(),
            extent_id: extent_id.into(),
            store_ids,
            reason: reason.into(),
            reason_context: reason_context.into(),
            notification_type,
        }
    }
}

#[async_trait]
impl Event for InputHostNotificationEvent {
    fn scope(&self) -> EventScope {
        EventScope::InputNotify
    }

    async fn handle(&mut self, ctx: &Arc<Context>) -> Result<()> {
        let scope = self.scope();

        let addr = match ctx
            .directory
            .resolve_uuid(ServiceKind::InputHost, &self.input_host_id)
            .await
        {
            Ok(addr) => addr,
            Err(err) => {
                ControllerMetrics::increment_failures(scope);
                ControllerMetrics::increment_resolve_errors(scope);
                debug!(
                    input_host_id = %self.input_host_id,
                    error = %err,
                    "cannot send notification, input host did not resolve"
                );
                return Ok(());
            }
        };

        let client = match ctx.clients.input_host_admin_client(&addr) {
            Ok(client) => client,
            Err(err) => {
                ControllerMetrics::increment_failures(scope);
                ControllerMetrics::increment_client_create_errors(scope);
                error!(error = %err, "failed to create input host admin client");
                return Ok(());
            }
        };

        let req = DestinationsUpdatedRequest::single(DestinationUpdatedNotification {
            destination_id: self.destination_id.clone(),
            notification_type: self.notification_type,
            extent_id: self.extent_id.clone(),
            store_ids: self.store_ids.clone(),
        });

        info!(
            destination_id = %self.destination_id,
            extent_id = %self.extent_id,
            notify_type = ?self.notification_type,
            reason = %self.reason,
            reason_context = %self.reason_context,
            input_host_id = %self.input_host_id,
            update_uuid = %req.update_uuid,
            "sending notification to input host"
        );

        let deadline = ctx.config.rpc.notification;
        let result = retry_with_policy(
            ctx.config.retry.notification,
            |err: &RpcError| err.is_retryable(),
            || {
                let req = req.clone();
                let client = Arc::clone(&client);
                async move { with_deadline(deadline, client.destinations_updated(req)).await }
            },
        )
        .await;

        if let Err(err) = result {
            ControllerMetrics::increment_failures(scope);
            error!(
                destination_id = %self.destination_id,
                extent_id = %self.extent_id,
                notify_type = ?self.notification_type,
                reason = %self.reason,
                input_host_id = %self.input_host_id,
                update_uuid = %req.update_uuid,
                host_addr = %addr,
                error = %err,
                "failed to send notification to input host"
            );
        }

        Ok(())
    }
}

/// Tell one output host that a consumer group it serves changed
pub struct OutputHostNotificationEvent {
    destination_id: String,
    consumer_group_id: String,
    output_host_id: String,
    reason: String,
    reason_context: String,
    notification_type: NotificationType,
}

impl OutputHostNotificationEvent {
    pub fn new(
        destination_id: impl Into<String>,
        consumer_group_id: impl Into<String>,
        output_host_id: impl Into<String>,
        reason: impl Into<String>,
        reason_context: impl Into<String>,
        notification_type: NotificationType,
    ) -> Self {
        Self {
            destination_id: destination_id.into(),
            consumer_group_id: consumer_group_id.into(),
            output_host_id: output_host_id.into(),
            reason: reason.into(),
            reason_context: reason_context.into(),
            notification_type,
        }
    }
}

#[async_trait]
impl Event for OutputHostNotificationEvent {
    fn scope(&self) -> EventScope {
        EventScope::OutputNotify
    }

    async fn handle(&mut self, ctx: &Arc<Context>) -> Result<()> {
        let scope = self.scope();

        let addr = match ctx
            .directory
            .resolve_uuid(ServiceKind::OutputHost, &self.output_host_id)
            .await
        {
            Ok(addr) => addr,
            Err(err) => {
                ControllerMetrics::increment_failures(scope);
                ControllerMetrics::increment_resolve_errors(scope);
                debug!(
                    output_host_id = %self.output_host_id,
                    error = %err,
                    "cannot send notification, output host did not resolve"
                );
                return Ok(());
            }
        };

        let client = match ctx.clients.output_host_admin_client(&addr) {
            Ok(client) => client,
            Err(err) => {
                ControllerMetrics::increment_failures(scope);
                ControllerMetrics::increment_client_create_errors(scope);
                error!(error = %err, "failed to create output host admin client");
                return Ok(());
            }
        };

        let req = ConsumerGroupsUpdatedRequest::single(ConsumerGroupUpdatedNotification {
            consumer_group_id: self.consumer_group_id.clone(),
            notification_type: self.notification_type,
        });

        info!(
            destination_id = %self.destination_id,
            consumer_group_id = %self.consumer_group_id,
            notify_type = ?self.notification_type,
            reason = %self.reason,
            reason_context = %self.reason_context,
            output_host_id = %self.output_host_id,
            update_uuid = %req.update_uuid,
            "sending notification to output host"
        );

        let deadline = ctx.config.rpc.notification;
        let result = retry_with_policy(
            ctx.config.retry.notification,
            |err: &RpcError| err.is_retryable(),
            || {
                let req = req.clone();
                let client = Arc::clone(&client);
                async move { with_deadline(deadline, client.consumer_groups_updated(req)).await }
            },
        )
        .await;

        if let Err(err) = result {
            ControllerMetrics::increment_failures(scope);
            error!(
                destination_id = %self.destination_id,
                consumer_group_id = %self.consumer_group_id,
                notify_type = ?self.notification_type,
                reason = %self.reason,
                output_host_id = %self.output_host_id,
                update_uuid = %req.update_uuid,
                host_addr = %addr,
                error = %err,
                "failed to send notification to output host"
            );
        }

        Ok(())
    }
}
