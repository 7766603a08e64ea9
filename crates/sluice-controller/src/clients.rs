//! RPC client seams and scoped store-client leases
//!
//! The transport is external; the controller consumes typed clients through
//! [`ClientFactory`]. Store clients are reference-counted by the factory:
//! every `store_client` acquisition must be paired with a release, which
//! [`StoreClientLease`] guarantees on all exit paths, including timeouts and
//! worker cancellation.

use async_trait::async_trait;
use sluice_protocol::{
    ConsumerGroupsUpdatedRequest, DestinationsUpdatedRequest, RemoteReplicateExtentRequest,
    ReplicateExtentRequest, SealExtentRequest,
};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Transport-level RPC errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RpcError {
    #[error("request timeout")]
    Timeout,

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("remote error: {0}")]
    Remote(String),
}

impl RpcError {
    /// Timeouts and transient network errors are retryable; semantic
    /// rejections from the remote side are not
    pub fn is_retryable(&self) -> bool {
        matches!(self, RpcError::Timeout | RpcError::Connection(_))
    }
}

/// Bound a client call by a deadline, mapping expiry to [`RpcError::Timeout`]
pub async fn with_deadline<T, F>(deadline: Duration, call: F) -> Result<T, RpcError>
where
    F: Future<Output = Result<T, RpcError>>,
{
    match tokio::time::timeout(deadline, call).await {
        Ok(result) => result,
        Err(_) => Err(RpcError::Timeout),
    }
}

/// Extent lifecycle RPCs on a store host
#[async_trait]
pub trait StoreClient: Send + Sync {
    async fn seal_extent(&self, req: SealExtentRequest) -> Result<(), RpcError>;
    async fn replicate_extent(&self, req: ReplicateExtentRequest) -> Result<(), RpcError>;
    async fn remote_replicate_extent(
        &self,
        req: RemoteReplicateExtentRequest,
    ) -> Result<(), RpcError>;
}

/// Admin surface of an input host
#[async_trait]
pub trait InputHostAdminClient: Send + Sync {
    async fn destinations_updated(&self, req: DestinationsUpdatedRequest) -> Result<(), RpcError>;
}

/// Admin surface of an output host
#[async_trait]
pub trait OutputHostAdminClient: Send + Sync {
    async fn consumer_groups_updated(
        &self,
        req: ConsumerGroupsUpdatedRequest,
    ) -> Result<(), RpcError>;
}

/// Caches and vends typed clients to data-plane hosts
///
/// `store_client` / `release_store_client` form a reference-counted pair;
/// use [`StoreClientLease`] rather than calling them directly.
pub trait ClientFactory: Send + Sync {
    fn store_client(&self, addr: &str, store_id: &str) -> Result<Arc<dyn StoreClient>, RpcError>;
    fn release_store_client(&self, store_id: &str);
    fn input_host_admin_client(&self, addr: &str)
        -> Result<Arc<dyn InputHostAdminClient>, RpcError>;
    fn output_host_admin_client(
        &self,
        addr: &str,
    ) -> Result<Arc<dyn OutputHostAdminClient>, RpcError>;
}

/// Scoped store-client acquisition; releases the factory reference on drop
pub struct StoreClientLease {
    factory: Arc<dyn ClientFactory>,
    store_id: String,
    client: Arc<dyn StoreClient>,
}

impl StoreClientLease {
    pub fn acquire(
        factory: &Arc<dyn ClientFactory>,
        addr: &str,
        store_id: &str,
    ) -> Result<Self, RpcError> {
        let client = factory.store_client(addr, store_id)?;
        Ok(Self {
            factory: Arc::clone(factory),
            store_id: store_id.to_owned(),
            client,
        })
    }

    pub fn client(&self) -> &dyn StoreClient {
        self.client.as_ref()
    }
}

impl Drop for StoreClientLease {
    fn drop(&mut self) {
        self.factory.release_store_client(&self.store_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    struct NoopStoreClient;

    #[async_trait]
    impl StoreClient for NoopStoreClient {
        async fn seal_extent(&self, _req: SealExtentRequest) -> Result<(), RpcError> {
            Ok(())
        }
        async fn replicate_extent(&self, _req: ReplicateExtentRequest) -> Result<(), RpcError> {
            Ok(())
        }
        async fn remote_replicate_extent(
            &self,
            _req: RemoteReplicateExtentRequest,
        ) -> Result<(), RpcError> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct CountingFactory {
        released: Mutex<Vec<String>>,
    }

    impl ClientFactory for CountingFactory {
        fn store_client(
            &self,
            _addr: &str,
            _store_id: &str,
        ) -> Result<Arc<dyn StoreClient>, RpcError> {
            Ok(Arc::new(NoopStoreClient))
        }
        fn release_store_client(&self, store_id: &str) {
            self.released.lock().push(store_id.to_owned());
        }
        fn input_host_admin_client(
            &self,
            _addr: &str,
        ) -> Result<Arc<dyn InputHostAdminClient>, RpcError> {
            Err(RpcError::Connection("unused".into()))
        }
        fn output_host_admin_client(
            &self,
            _addr: &str,
        ) -> Result<Arc<dyn OutputHostAdminClient>, RpcError> {
            Err(RpcError::Connection("unused".into()))
        }
    }

    #[test]
    fn test_lease_releases_on_drop() {
        let factory: Arc<CountingFactory> = Arc::new(CountingFactory::default());
        let dyn_factory: Arc<dyn ClientFactory> = factory.clone();
        {
            let _lease = StoreClientLease::acquire(&dyn_factory, "10.0.0.1:4000", "s1").unwrap();
            assert!(factory.released.lock().is_empty());
        }
        assert_eq!(*factory.released.lock(), vec!["s1".to_string()]);
    }

    #[tokio::test]
    async fn test_with_deadline_maps_expiry_to_timeout() {
        let slow = async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        };
        let result = with_deadline(Duration::from_millis(10), slow).await;
        assert_eq!(result, Err(RpcError::Timeout));
    }

    #[tokio::test]
    async fn test_with_deadline_passes_through_fast_results() {
        let fast = async { Err::<(), _>(RpcError::Remote("denied".into())) };
        let result = with_deadline(Duration::from_secs(1), fast).await;
        assert_eq!(result, Err(RpcError::Remote("denied".into())));
    }
}
