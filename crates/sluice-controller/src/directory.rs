//! Service-discovery seam
//!
//! Maps data-plane host UUIDs to network addresses. The registry behind it
//! is external; resolution failure usually means the host dropped out of
//! discovery and is treated as retryable by callers that need the host.

use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

/// Data-plane host classes the controller talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceKind {
    InputHost,
    OutputHost,
    StoreHost,
}

impl ServiceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceKind::InputHost => "input",
            ServiceKind::OutputHost => "output",
            ServiceKind::StoreHost => "store",
        }
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Host UUID could not be resolved to an address
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot resolve {service} host {uuid}: {reason}")]
pub struct ResolveError {
    pub service: ServiceKind,
    pub uuid: String,
    pub reason: String,
}

/// Resolves host UUIDs to dialable addresses
#[async_trait]
pub trait HostDirectory: Send + Sync {
    async fn resolve_uuid(
        &self,
        service: ServiceKind,
        uuid: &str,
    ) -> Result<String, ResolveError>;
}
