//! Shared handler context

use crate::clients::ClientFactory;
use crate::config::ControllerConfig;
use crate::directory::HostDirectory;
use crate::metadata::MetadataGateway;
use crate::monitor::ExtentStateMonitor;
use crate::pipeline::EventQueue;
use crate::result_cache::ResultCache;
use crate::tracking::ExtentSeals;
use std::sync::Arc;

/// Everything an event handler needs: collaborator handles, shared seal
/// state, and the queue for fan-out. One instance per controller process,
/// shared read-mostly across workers.
pub struct Context {
    pub config: ControllerConfig,
    pub metadata: Arc<dyn MetadataGateway>,
    pub directory: Arc<dyn HostDirectory>,
    pub clients: Arc<dyn ClientFactory>,
    pub monitor: Arc<dyn ExtentStateMonitor>,
    pub result_cache: Arc<dyn ResultCache>,
    pub seals: ExtentSeals,
    pub queue: EventQueue,
}

impl Context {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: ControllerConfig,
        metadata: Arc<dyn MetadataGateway>,
        directory: Arc<dyn HostDirectory>,
        clients: Arc<dyn ClientFactory>,
        monitor: Arc<dyn ExtentStateMonitor>,
        result_cache: Arc<dyn ResultCache>,
        queue: EventQueue,
    ) -> Self {
        let seals = ExtentSeals::new(
            config.max_failed_extent_seal_set_size,
            config.seal_token_burst,
            config.seal_tokens_per_second,
        );
        Self {
            config,
            metadata,
            directory,
            clients,
            monitor,
            result_cache,
            seals,
            queue,
        }
    }
}
