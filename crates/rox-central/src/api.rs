use std::future::Future;
use std::pin::Pin;

use crate::endpoint::Endpoint;
use crate::error::RemoteError;
use crate::token::BearerToken;
use crate::types::{
    Cluster, InitBundleGenRequest, InitBundleGenResponse, InitBundleMeta,
    InitBundleRevokeRequest, InitBundleRevokeResponse,
};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The Central RPCs the provider consumes.
///
/// Methods return boxed futures for dyn compatibility.
pub trait CentralApi: Send + Sync {
    /// All registered clusters, in the order Central returns them.
    fn get_clusters(&self) -> BoxFuture<'_, Result<Vec<Cluster>, RemoteError>>;

    /// Register a cluster. `None` when Central answers without a body.
    fn post_cluster(&self, cluster: Cluster) -> BoxFuture<'_, Result<Option<Cluster>, RemoteError>>;

    /// Full replace of the cluster identified by `cluster.id`.
    fn put_cluster(&self, cluster: Cluster) -> BoxFuture<'_, Result<Option<Cluster>, RemoteError>>;

    fn delete_cluster(&self, id: String) -> BoxFuture<'_, Result<(), RemoteError>>;

    fn get_init_bundles(&self) -> BoxFuture<'_, Result<Vec<InitBundleMeta>, RemoteError>>;

    fn generate_init_bundle(
        &self,
        request: InitBundleGenRequest,
    ) -> BoxFuture<'_, Result<InitBundleGenResponse, RemoteError>>;

    fn revoke_init_bundle(
        &self,
        request: InitBundleRevokeRequest,
    ) -> BoxFuture<'_, Result<InitBundleRevokeResponse, RemoteError>>;
}

/// A dialed, authenticated channel to Central.
pub trait Channel: CentralApi {
    fn as_api(&self) -> &dyn CentralApi;

    /// Release everything the channel holds.
    fn shutdown(&self) -> BoxFuture<'_, Result<(), RemoteError>>;
}

/// Dials channels. Owns TLS setup, per-call auth and retry/backoff.
pub trait Transport: Send + Sync {
    fn dial<'a>(
        &'a self,
        endpoint: &'a Endpoint,
        token: &'a BearerToken,
    ) -> BoxFuture<'a, Result<Box<dyn Channel>, RemoteError>>;
}

/// A live channel owned by exactly one reconciliation pass.
///
/// `close` is idempotent. Dropping an open connection releases the channel
/// without the graceful shutdown call.
pub struct Connection {
    endpoint: Endpoint,
    channel: Option<Box<dyn Channel>>,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("endpoint", &self.endpoint)
            .field("open", &self.channel.is_some())
            .finish()
    }
}

impl Connection {
    pub fn new(endpoint: Endpoint, channel: Box<dyn Channel>) -> Self {
        Self {
            endpoint,
            channel: Some(channel),
        }
    }

    /// Open the connection through `transport`.
    pub async fn open(
        transport: &dyn Transport,
        endpoint: Endpoint,
        token: &BearerToken,
    ) -> Result<Self, RemoteError> {
        let channel = transport.dial(&endpoint, token).await?;
        tracing::debug!(endpoint = %endpoint, "connection to Central opened");
        Ok(Self::new(endpoint, channel))
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn is_open(&self) -> bool {
        self.channel.is_some()
    }

    pub fn api(&self) -> Result<&dyn CentralApi, RemoteError> {
        match &self.channel {
            Some(channel) => Ok(channel.as_api()),
            None => Err(RemoteError::Closed),
        }
    }

    pub async fn close(&mut self) -> Result<(), RemoteError> {
        let Some(channel) = self.channel.take() else {
            return Ok(());
        };
        channel.shutdown().await?;
        tracing::debug!(endpoint = %self.endpoint, "connection to Central closed");
        Ok(())
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        if self.channel.is_some() {
            tracing::warn!(endpoint = %self.endpoint, "connection dropped without close");
        }
    }
}
