#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use jiff::Timestamp;
use rox_central::types::{
    Cluster as RemoteCluster, ImpactedCluster, InitBundleGenRequest, InitBundleGenResponse,
    InitBundleMeta, InitBundleRevocationError, InitBundleRevokeRequest, InitBundleRevokeResponse,
    User, UserAttribute,
};
use rox_central::{
    BearerToken, BoxFuture, CentralApi, Channel, Endpoint, RemoteError, Transport,
};
use rox_core::{
    Cluster, ClusterParameters, CredentialsSource, InitBundle, InitBundleParameters,
    ProviderConfig, ResourceMeta, SecretKeySelector,
};
use rox_provisioner::{
    Connector, CredentialResolver, InMemorySecretStore, StaticProviderConfigs,
};

pub const PROVIDER_CONFIG: &str = "default";
pub const ENDPOINT: &str = "central.stackrox.example:443";
pub const TOKEN: &str = "s3cr3t-api-token";

pub const HELM_VALUES: &[u8] = b"helm-values-bundle";
pub const KUBECTL: &[u8] = b"kubectl-bundle";

#[derive(Default)]
struct State {
    clusters: Vec<RemoteCluster>,
    bundles: Vec<InitBundleMeta>,
    calls: Vec<&'static str>,
    failures: HashMap<&'static str, fn() -> RemoteError>,
    hanging: HashSet<&'static str>,
    revocation_error: Option<String>,
    posted: Vec<RemoteCluster>,
    replaced: Vec<RemoteCluster>,
    revoked: Vec<InitBundleRevokeRequest>,
    tokens: Vec<String>,
    endpoints: Vec<String>,
    next_id: u32,
    dials: u32,
    shutdowns: u32,
}

/// An in-memory Central with call recording and injectable failures.
#[derive(Clone, Default)]
pub struct FakeCentral {
    state: Arc<Mutex<State>>,
}

impl FakeCentral {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub fn with_cluster(self, cluster: RemoteCluster) -> Self {
        self.lock().clusters.push(cluster);
        self
    }

    pub fn with_bundle(self, bundle: InitBundleMeta) -> Self {
        self.lock().bundles.push(bundle);
        self
    }

    /// Every call to `rpc` fails with `err()` until cleared.
    pub fn fail_on(&self, rpc: &'static str, err: fn() -> RemoteError) {
        self.lock().failures.insert(rpc, err);
    }

    pub fn clear_failures(&self) {
        self.lock().failures.clear();
    }

    /// Calls to `rpc` never complete.
    pub fn hang_on(&self, rpc: &'static str) {
        self.lock().hanging.insert(rpc);
    }

    /// Revocations report `error` for every requested id.
    pub fn revocation_error(&self, error: &str) {
        self.lock().revocation_error = Some(error.to_string());
    }

    /// Drop a cluster behind the provider's back.
    pub fn remove_cluster(&self, name: &str) {
        self.lock().clusters.retain(|c| c.name != name);
    }

    pub fn clusters(&self) -> Vec<RemoteCluster> {
        self.lock().clusters.clone()
    }

    pub fn bundles(&self) -> Vec<InitBundleMeta> {
        self.lock().bundles.clone()
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.lock().calls.clone()
    }

    pub fn call_count(&self, rpc: &str) -> usize {
        self.lock().calls.iter().filter(|c| **c == rpc).count()
    }

    pub fn posted(&self) -> Vec<RemoteCluster> {
        self.lock().posted.clone()
    }

    pub fn replaced(&self) -> Vec<RemoteCluster> {
        self.lock().replaced.clone()
    }

    pub fn revoked(&self) -> Vec<InitBundleRevokeRequest> {
        self.lock().revoked.clone()
    }

    pub fn tokens(&self) -> Vec<String> {
        self.lock().tokens.clone()
    }

    pub fn endpoints(&self) -> Vec<String> {
        self.lock().endpoints.clone()
    }

    pub fn dials(&self) -> u32 {
        self.lock().dials
    }

    pub fn shutdowns(&self) -> u32 {
        self.lock().shutdowns
    }

    async fn gate(&self, rpc: &'static str) -> Result<(), RemoteError> {
        let (hang, failure) = {
            let mut state = self.lock();
            state.calls.push(rpc);
            (state.hanging.contains(rpc), state.failures.get(rpc).copied())
        };
        if hang {
            std::future::pending::<()>().await;
        }
        match failure {
            Some(err) => Err(err()),
            None => Ok(()),
        }
    }

    fn next_id(&self, prefix: &str) -> String {
        let mut state = self.lock();
        state.next_id += 1;
        format!("{prefix}-{}", state.next_id)
    }
}

impl CentralApi for FakeCentral {
    fn get_clusters(&self) -> BoxFuture<'_, Result<Vec<RemoteCluster>, RemoteError>> {
        Box::pin(async move {
            self.gate("GetClusters").await?;
            Ok(self.clusters())
        })
    }

    fn post_cluster(
        &self,
        cluster: RemoteCluster,
    ) -> BoxFuture<'_, Result<Option<RemoteCluster>, RemoteError>> {
        Box::pin(async move {
            self.gate("PostCluster").await?;
            let mut created = cluster.clone();
            created.id = self.next_id("cluster");
            let mut state = self.lock();
            state.posted.push(cluster);
            state.clusters.push(created.clone());
            Ok(Some(created))
        })
    }

    fn put_cluster(
        &self,
        cluster: RemoteCluster,
    ) -> BoxFuture<'_, Result<Option<RemoteCluster>, RemoteError>> {
        Box::pin(async move {
            self.gate("PutCluster").await?;
            let mut state = self.lock();
            state.replaced.push(cluster.clone());
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
            self.gate("DeleteCluster").await?;
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
        Box::pin(async move {
            self.gate("GetInitBundles").await?;
            Ok(self.bundles())
        })
    }

    fn generate_init_bundle(
        &self,
        request: InitBundleGenRequest,
    ) -> BoxFuture<'_, Result<InitBundleGenResponse, RemoteError>> {
        Box::pin(async move {
            self.gate("GenerateInitBundle").await?;
            let meta = bundle_meta(&self.next_id("bundle"), &request.name);
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
            self.gate("RevokeInitBundle").await?;
            let mut state = self.lock();
            state.revoked.push(request.clone());

            let mut response = InitBundleRevokeResponse::default();
            for id in request.ids {
                if let Some(error) = state.revocation_error.clone() {
                    response
                        .init_bundle_revocation_errors
                        .push(InitBundleRevocationError {
                            id,
                            error,
                            impacted_clusters: Vec::new(),
                        });
                    continue;
                }
                let before = state.bundles.len();
                state.bundles.retain(|b| b.id != id);
                if state.bundles.len() == before {
                    response
                        .init_bundle_revocation_errors
                        .push(InitBundleRevocationError {
                            error: format!("init bundle {id} not found"),
                            id,
                            impacted_clusters: Vec::new(),
                        });
                } else {
                    response.init_bundle_revoked_ids.push(id);
                }
            }
            Ok(response)
        })
    }
}

impl Channel for FakeCentral {
    fn as_api(&self) -> &dyn CentralApi {
        self
    }

    fn shutdown(&self) -> BoxFuture<'_, Result<(), RemoteError>> {
        Box::pin(async move {
            self.lock().shutdowns += 1;
            self.gate("Shutdown").await
        })
    }
}

/// Dials straight into a shared `FakeCentral`.
pub struct FakeTransport {
    central: FakeCentral,
}

impl FakeTransport {
    pub fn new(central: FakeCentral) -> Self {
        Self { central }
    }
}

impl Transport for FakeTransport {
    fn dial<'a>(
        &'a self,
        endpoint: &'a Endpoint,
        token: &'a BearerToken,
    ) -> BoxFuture<'a, Result<Box<dyn Channel>, RemoteError>> {
        Box::pin(async move {
            {
                let mut state = self.central.lock();
                state.dials += 1;
                state.tokens.push(token.expose().to_string());
                state.endpoints.push(endpoint.to_string());
            }
            self.central.gate("Dial").await?;
            Ok(Box::new(self.central.clone()) as Box<dyn Channel>)
        })
    }
}

pub fn token_selector() -> SecretKeySelector {
    SecretKeySelector {
        namespace: "crossplane-system".into(),
        name: "rox-credentials".into(),
        key: "token".into(),
    }
}

pub fn provider_config() -> ProviderConfig {
    ProviderConfig {
        endpoint: ENDPOINT.into(),
        credentials: CredentialsSource::Secret {
            secret_ref: token_selector(),
        },
    }
}

/// A connector wired to `central` with one secret-backed provider config.
pub fn connector(central: &FakeCentral) -> Connector {
    connector_with(central, provider_config())
}

pub fn connector_with(central: &FakeCentral, config: ProviderConfig) -> Connector {
    let configs = StaticProviderConfigs::new();
    configs.insert(PROVIDER_CONFIG, config);

    let secrets = InMemorySecretStore::new();
    secrets.insert(token_selector(), format!("  {TOKEN}\n"));

    Connector::new(
        Arc::new(configs),
        CredentialResolver::new(Arc::new(secrets)),
        Arc::new(FakeTransport::new(central.clone())),
    )
    .unwrap()
}

pub fn cluster(name: &str, params: ClusterParameters) -> Cluster {
    Cluster::new(ResourceMeta::new(name, PROVIDER_CONFIG), params)
}

pub fn prod_params() -> ClusterParameters {
    ClusterParameters {
        name: "prod".into(),
        r#type: "KUBERNETES_CLUSTER".into(),
        slim_collector: true,
        ..Default::default()
    }
}

pub fn full_params(name: &str) -> ClusterParameters {
    ClusterParameters {
        admission_controller: true,
        admission_controller_events: true,
        admission_controller_updates: false,
        central_api_endpoint: "central.stackrox:443".into(),
        collection_method: "CORE_BPF".into(),
        collector_image: "quay.io/stackrox-io/collector".into(),
        labels: [("env".to_string(), "prod".to_string())].into(),
        main_image: "quay.io/stackrox-io/main".into(),
        name: name.into(),
        slim_collector: true,
        tolerations: true,
        r#type: "OPENSHIFT4_CLUSTER".into(),
    }
}

pub fn init_bundle(name: &str) -> InitBundle {
    InitBundle::new(
        ResourceMeta::new(name, PROVIDER_CONFIG),
        InitBundleParameters { name: name.into() },
    )
}

/// A remote cluster as Central would list it.
pub fn remote_cluster(id: &str, name: &str) -> RemoteCluster {
    RemoteCluster {
        id: id.into(),
        name: name.into(),
        ..Default::default()
    }
}

pub fn bundle_meta(id: &str, name: &str) -> InitBundleMeta {
    InitBundleMeta {
        id: id.into(),
        name: name.into(),
        impacted_clusters: vec![ImpactedCluster {
            name: "prod".into(),
            id: "cluster-9".into(),
        }],
        created_at: Some(Timestamp::from_second(1_709_287_200).unwrap()),
        created_by: Some(User {
            id: "sso:admin".into(),
            auth_provider_id: "4df1b98c".into(),
            attributes: vec![UserAttribute {
                key: "role".into(),
                value: "Admin".into(),
            }],
        }),
        expires_at: Some(Timestamp::from_second(1_740_823_200).unwrap()),
    }
}
