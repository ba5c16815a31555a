#![allow(dead_code)]

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use rox_central::types::{
    Cluster as RemoteCluster, InitBundleGenRequest, InitBundleGenResponse, InitBundleMeta,
    InitBundleRevokeRequest, InitBundleRevokeResponse,
};
use rox_central::{BearerToken, BoxFuture, CentralApi, Channel, Endpoint, RemoteError, Transport};
use rox_core::{
    Cluster, ClusterParameters, CredentialsSource, InitBundle, InitBundleParameters,
    ManagedResource, ProviderConfig, ResourceMeta, SecretKeySelector,
};
use rox_provisioner::{Connector, CredentialResolver, InMemorySecretStore, StaticProviderConfigs};

pub const PROVIDER_CONFIG: &str = "default";
pub const HELM_VALUES: &[u8] = b"helm-values-bundle";
pub const KUBECTL: &[u8] = b"kubectl-bundle";

#[derive(Default)]
struct State {
    clusters: Vec<RemoteCluster>,
    bundles: Vec<InitBundleMeta>,
    next_id: u32,
    list_delay: Duration,
    listing: usize,
    max_listing: usize,
}

/// Just enough of Central for whole sweeps.
#[derive(Clone, Default)]
pub struct FakeCentral {
    state: Arc<Mutex<State>>,
}

impl FakeCentral {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold every cluster listing open for `delay`, to observe overlap.
    pub fn slow_listing(self, delay: Duration) -> Self {
        self.lock().list_delay = delay;
        self
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    fn next_id(&self, prefix: &str) -> String {
        let mut state = self.lock();
        state.next_id += 1;
        format!("{prefix}-{}", state.next_id)
    }

    pub fn clusters(&self) -> Vec<RemoteCluster> {
        self.lock().clusters.clone()
    }

    pub fn bundles(&self) -> Vec<InitBundleMeta> {
        self.lock().bundles.clone()
    }

    /// Most cluster listings that were in progress at once.
    pub fn max_concurrent_listings(&self) -> usize {
        self.lock().max_listing
    }
}

impl CentralApi for FakeCentral {
    fn get_clusters(&self) -> BoxFuture<'_, Result<Vec<RemoteCluster>, RemoteError>> {
        Box::pin(async move {
            let delay = {
                let mut state = self.lock();
                state.listing += 1;
                state.max_listing = state.max_listing.max(state.listing);
                state.list_delay
            };
            tokio::time::sleep(delay).await;
            let mut state = self.lock();
            state.listing -= 1;
            Ok(state.clusters.clone())
        })
    }

    fn post_cluster(
        &self,
        cluster: RemoteCluster,
    ) -> BoxFuture<'_, Result<Option<RemoteCluster>, RemoteError>> {
        Box::pin(async move {
            let mut created = cluster;
            created.id = self.next_id("cluster");
            self.lock().clusters.push(created.clone());
            Ok(Some(created))
        })
    }

    fn put_cluster(
        &self,
        cluster: RemoteCluster,
    ) -> BoxFuture<'_, Result<Option<RemoteCluster>, RemoteError>> {
        Box::pin(async move {
            let mut state = self.lock();
            match state.clusters.iter_mut().find(|c| c.id == cluster.id) {
                Some(slot) => {
                    *slot = cluster.clone();
                    Ok(Some(cluster))
                }
                None => Err(RemoteError::NotFound(format!("cluster {}", cluster.id))),
            }
        })
    }

    fn delete_cluster(&self, id: String) -> BoxFuture<'_, Result<(), RemoteError>> {
        Box::pin(async move {
            let mut state = self.lock();
            let before = state.clusters.len();
            state.clusters.retain(|c| c.id != id);
            if state.clusters.len() == before {
                return Err(RemoteError::NotFound(format!("cluster {id}")));
            }
            Ok(())
        })
    }

    fn get_init_bundles(&self) -> BoxFuture<'_, Result<Vec<InitBundleMeta>, RemoteError>> {
        Box::pin(async move { Ok(self.bundles()) })
    }

    fn generate_init_bundle(
        &self,
        request: InitBundleGenRequest,
    ) -> BoxFuture<'_, Result<InitBundleGenResponse, RemoteError>> {
        Box::pin(async move {
            let meta = InitBundleMeta {
                id: self.next_id("bundle"),
                name: request.name,
                ..Default::default()
            };
            self.lock().bundles.push(meta.clone());
            Ok(InitBundleGenResponse {
                meta: Some(meta),
                helm_values_bundle: HELM_VALUES.to_vec(),
                kubectl_bundle: KUBECTL.to_vec(),
            })
        })
    }

    fn revoke_init_bundle(
        &self,
        request: InitBundleRevokeRequest,
    ) -> BoxFuture<'_, Result<InitBundleRevokeResponse, RemoteError>> {
        Box::pin(async move {
            let mut state = self.lock();
            state.bundles.retain(|b| !request.ids.contains(&b.id));
            Ok(InitBundleRevokeResponse {
                init_bundle_revoked_ids: request.ids,
                ..Default::default()
            })
        })
    }
}

impl Channel for FakeCentral {
    fn as_api(&self) -> &dyn CentralApi {
        self
    }

    fn shutdown(&self) -> BoxFuture<'_, Result<(), RemoteError>> {
        Box::pin(async { Ok(()) })
    }
}

struct FakeTransport {
    central: FakeCentral,
}

impl Transport for FakeTransport {
    fn dial<'a>(
        &'a self,
        _endpoint: &'a Endpoint,
        _token: &'a BearerToken,
    ) -> BoxFuture<'a, Result<Box<dyn Channel>, RemoteError>> {
        Box::pin(async move { Ok(Box::new(self.central.clone()) as Box<dyn Channel>) })
    }
}

/// A connector whose "default" provider config dials `central`.
pub fn connector(central: &FakeCentral) -> Connector {
    let selector = SecretKeySelector {
        namespace: "stackrox".into(),
        name: "central-token".into(),
        key: "token".into(),
    };
    let configs = StaticProviderConfigs::new();
    configs.insert(
        PROVIDER_CONFIG,
        ProviderConfig {
            endpoint: "central.stackrox.example:443".into(),
            credentials: CredentialsSource::Secret {
                secret_ref: selector.clone(),
            },
        },
    );
    let secrets = InMemorySecretStore::new();
    secrets.insert(selector, "s3cr3t");

    Connector::new(
        Arc::new(configs),
        CredentialResolver::new(Arc::new(secrets)),
        Arc::new(FakeTransport {
            central: central.clone(),
        }),
    )
    .unwrap()
}

pub fn cluster(name: &str, config: &str) -> ManagedResource {
    Cluster::new(
        ResourceMeta::new(name, config),
        ClusterParameters {
            name: name.into(),
            r#type: "KUBERNETES_CLUSTER".into(),
            ..Default::default()
        },
    )
    .into()
}

pub fn init_bundle(name: &str) -> ManagedResource {
    InitBundle::new(
        ResourceMeta::new(name, PROVIDER_CONFIG),
        InitBundleParameters { name: name.into() },
    )
    .into()
}
