//! Controller metrics
//!
//! Lightweight instrumentation over the `metrics` facade; without an
//! installed recorder every call is a no-op. Counters carry a `scope` label
//! naming the event kind so one family covers the whole pipeline.
//!
//! Metric naming follows `sluice_controller_{name}_{unit}`.

use std::time::Duration;

/// Event kinds, used as the `scope` metric label and in logs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventScope {
    ExtentCreated,
    ConsGroupUpdated,
    InputNotify,
    OutputNotify,
    InputFailed,
    StoreFailed,
    ExtentDown,
    StoreExtentOutOfSync,
    RemoteZoneExtentCreated,
}

impl EventScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventScope::ExtentCreated => "extent_created",
            EventScope::ConsGroupUpdated => "cons_group_updated",
            EventScope::InputNotify => "input_notify",
            EventScope::OutputNotify => "output_notify",
            EventScope::InputFailed => "input_failed",
            EventScope::StoreFailed => "store_failed",
            EventScope::ExtentDown => "extent_down",
            EventScope::StoreExtentOutOfSync => "store_extent_out_of_sync",
            EventScope::RemoteZoneExtentCreated => "remote_zone_extent_created",
        }
    }
}

/// Controller pipeline metrics
pub struct ControllerMetrics;

impl ControllerMetrics {
    // ---- Pipeline ----

    /// One event pulled off the queue and handled
    pub fn increment_requests(scope: EventScope) {
        metrics::counter!("sluice_controller_events_total", "scope" => scope.as_str())
            .increment(1);
    }

    /// Handler finished with a failure (terminal or retryable)
    pub fn increment_failures(scope: EventScope) {
        metrics::counter!("sluice_controller_event_failures_total", "scope" => scope.as_str())
            .increment(1);
    }

    /// Wall-clock duration of one `handle` invocation
    pub fn record_handler_latency(scope: EventScope, duration: Duration) {
        metrics::histogram!("sluice_controller_event_duration_seconds", "scope" => scope.as_str())
            .record(duration.as_secs_f64());
    }

    /// An event re-submitted by the retry executor
    pub fn increment_event_retries(scope: EventScope) {
        metrics::counter!("sluice_controller_event_retries_total", "scope" => scope.as_str())
            .increment(1);
    }

    /// Non-blocking enqueue rejected because the queue was full
    pub fn increment_queue_full() {
        metrics::counter!("sluice_controller_queue_full_total").increment(1);
    }

    /// Current depth of the event queue
    pub fn set_queue_depth(depth: usize) {
        metrics::gauge!("sluice_controller_queue_depth").set(depth as f64);
    }

    // ---- Collaborator errors ----

    pub fn increment_metadata_read_errors(scope: EventScope) {
        metrics::counter!("sluice_controller_metadata_read_errors_total", "scope" => scope.as_str())
            .increment(1);
    }

    pub fn increment_metadata_update_errors(scope: EventScope) {
        metrics::counter!("sluice_controller_metadata_update_errors_total", "scope" => scope.as_str())
            .increment(1);
    }

    pub fn increment_resolve_errors(scope: EventScope) {
        metrics::counter!("sluice_controller_resolve_errors_total", "scope" => scope.as_str())
            .increment(1);
    }

    pub fn increment_client_create_errors(scope: EventScope) {
        metrics::counter!("sluice_controller_client_create_errors_total", "scope" => scope.as_str())
            .increment(1);
    }

    // ---- Sealing ----

    pub fn increment_no_healthy_store() {
        metrics::counter!("sluice_controller_seal_no_healthy_store_total").increment(1);
    }

    pub fn increment_seal_failures() {
        metrics::counter!("sluice_controller_seal_failures_total").increment(1);
    }

    pub fn increment_seal_rate_limited() {
        metrics::counter!("sluice_controller_seal_rate_limited_total").increment(1);
    }

    pub fn set_failed_seal_set_size(size: usize) {
        metrics::gauge!("sluice_controller_failed_seal_set_size").set(size as f64);
    }

    pub fn set_in_progress_seal_count(count: usize) {
        metrics::gauge!("sluice_controller_in_progress_seals").set(count as f64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_labels_are_stable() {
        assert_eq!(EventScope::ExtentDown.as_str(), "extent_down");
        assert_eq!(EventScope::InputNotify.as_str(), "input_notify");
        assert_eq!(
            EventScope::RemoteZoneExtentCreated.as_str(),
            "remote_zone_extent_created"
        );
    }

    #[test]
    fn test_metrics_are_noops_without_recorder() {
        // Must not panic when no recorder is installed
        ControllerMetrics::increment_requests(EventScope::ExtentDown);
        ControllerMetrics::record_handler_latency(
            EventScope::ExtentDown,
            Duration::from_millis(5),
        );
        ControllerMetrics::increment_queue_full();
    }
}
