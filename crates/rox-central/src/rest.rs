use std::time::Duration;

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Client, Method, Response};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde_json::Value;

use crate::api::{BoxFuture, CentralApi, Channel, Transport};
use crate::endpoint::Endpoint;
use crate::error::{RemoteError, format_err_chain};
use crate::retry::{RetryConfig, RetryPolicy, retry_with_policy};
use crate::token::BearerToken;
use crate::types::{
    Cluster, ClusterResponse, ClustersList, InitBundleGenRequest, InitBundleGenResponse,
    InitBundleMeta, InitBundleMetas, InitBundleRevokeRequest, InitBundleRevokeResponse,
};

/// Talks to Central's REST gateway over TLS, sending the API token as a
/// bearer credential on every request.
#[derive(Debug, Clone)]
pub struct RestTransport {
    retry: RetryConfig,
    request_timeout: Duration,
    ca_certificate_pem: Option<Vec<u8>>,
}

impl Default for RestTransport {
    fn default() -> Self {
        Self {
            retry: RetryConfig::default(),
            request_timeout: Duration::from_secs(30),
            ca_certificate_pem: None,
        }
    }
}

impl RestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Trust an additional CA, e.g. Central's self-signed service CA.
    pub fn with_ca_certificate(mut self, pem: Vec<u8>) -> Self {
        self.ca_certificate_pem = Some(pem);
        self
    }

    fn build_client(&self, token: &BearerToken) -> Result<Client, RemoteError> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", token.expose()))
            .map_err(|_| RemoteError::Transport("API token is not a valid header value".into()))?;
        auth.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let mut builder = Client::builder()
            .use_rustls_tls()
            .https_only(true)
            .default_headers(headers)
            .timeout(self.request_timeout);

        if let Some(pem) = &self.ca_certificate_pem {
            let cert = reqwest::Certificate::from_pem(pem)
                .map_err(|e| RemoteError::Transport(format_err_chain(&e)))?;
            builder = builder.add_root_certificate(cert);
        }

        builder
            .build()
            .map_err(|e| RemoteError::Transport(format_err_chain(&e)))
    }
}

impl Transport for RestTransport {
    fn dial<'a>(
        &'a self,
        endpoint: &'a Endpoint,
        token: &'a BearerToken,
    ) -> BoxFuture<'a, Result<Box<dyn Channel>, RemoteError>> {
        Box::pin(async move {
            let channel = RestChannel {
                client: self.build_client(token)?,
                base_url: endpoint.base_url(),
                retry: self.retry.clone(),
            };
            // Surface TLS and auth problems at connect time rather than on
            // the first real call.
            channel
                .send::<IgnoredAny>("ping", Method::GET, "/v1/ping", None)
                .await?;
            tracing::debug!(endpoint = %endpoint, "Central answered ping");
            Ok(Box::new(channel) as Box<dyn Channel>)
        })
    }
}

struct RestChannel {
    client: Client,
    base_url: String,
    retry: RetryConfig,
}

impl RestChannel {
    async fn send<T: DeserializeOwned>(
        &self,
        operation: &str,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<T, RemoteError> {
        let url = format!("{}{}", self.base_url, path);
        let policy = retry_policy(&method);
        retry_with_policy(&self.retry, policy, operation, || async {
            let mut request = self.client.request(method.clone(), &url);
            if let Some(body) = &body {
                request = request.json(body);
            }
            let response = request.send().await.map_err(|e| {
                if e.is_connect() {
                    RemoteError::Connect(format_err_chain(&e))
                } else {
                    RemoteError::Transport(format_err_chain(&e))
                }
            })?;
            decode(response).await
        })
        .await
    }
}

/// POST and PATCH create or revoke things on Central; a lost response does
/// not mean the call had no effect.
pub fn retry_policy(method: &Method) -> RetryPolicy {
    if *method == Method::POST || *method == Method::PATCH {
        RetryPolicy::NonIdempotent
    } else {
        RetryPolicy::Idempotent
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, RemoteError> {
    let status = response.status();
    let bytes = response
        .bytes()
        .await
        .map_err(|e| RemoteError::Transport(format_err_chain(&e)))?;

    if status.is_success() {
        let body: &[u8] = if bytes.is_empty() { b"{}" } else { &bytes };
        return Ok(serde_json::from_slice(body)?);
    }

    let message = error_message(&bytes);
    Err(match status.as_u16() {
        404 => RemoteError::NotFound(message),
        401 => RemoteError::Unauthenticated(message),
        403 => RemoteError::PermissionDenied(message),
        429 | 502 | 503 | 504 => RemoteError::Unavailable(message),
        status => RemoteError::Service { status, message },
    })
}

/// Pull the human-readable message out of a gateway error body.
pub fn error_message(body: &[u8]) -> String {
    if let Ok(json) = serde_json::from_slice::<Value>(body) {
        for key in ["message", "error"] {
            if let Some(msg) = json.get(key).and_then(|v| v.as_str()) {
                if !msg.is_empty() {
                    return msg.to_string();
                }
            }
        }
    }
    String::from_utf8_lossy(body).trim().to_string()
}

fn to_body<T: serde::Serialize>(value: &T) -> Result<Value, RemoteError> {
    Ok(serde_json::to_value(value)?)
}

impl CentralApi for RestChannel {
    fn get_clusters(&self) -> BoxFuture<'_, Result<Vec<Cluster>, RemoteError>> {
        Box::pin(async move {
            let list: ClustersList = self
                .send("GetClusters", Method::GET, "/v1/clusters", None)
                .await?;
            Ok(list.clusters)
        })
    }

    fn post_cluster(&self, cluster: Cluster) -> BoxFuture<'_, Result<Option<Cluster>, RemoteError>> {
        Box::pin(async move {
            let body = to_body(&cluster)?;
            let resp: ClusterResponse = self
                .send("PostCluster", Method::POST, "/v1/clusters", Some(body))
                .await?;
            Ok(resp.cluster)
        })
    }

    fn put_cluster(&self, cluster: Cluster) -> BoxFuture<'_, Result<Option<Cluster>, RemoteError>> {
        Box::pin(async move {
            let path = format!("/v1/clusters/{}", cluster.id);
            let body = to_body(&cluster)?;
            let resp: ClusterResponse = self
                .send("PutCluster", Method::PUT, &path, Some(body))
                .await?;
            Ok(resp.cluster)
        })
    }

    fn delete_cluster(&self, id: String) -> BoxFuture<'_, Result<(), RemoteError>> {
        Box::pin(async move {
            let path = format!("/v1/clusters/{id}");
            self.send::<IgnoredAny>("DeleteCluster", Method::DELETE, &path, None)
                .await?;
            Ok(())
        })
    }

    fn get_init_bundles(&self) -> BoxFuture<'_, Result<Vec<InitBundleMeta>, RemoteError>> {
        Box::pin(async move {
            let metas: InitBundleMetas = self
                .send(
                    "GetInitBundles",
                    Method::GET,
                    "/v1/cluster-init/init-bundles",
                    None,
                )
                .await?;
            Ok(metas.items)
        })
    }

    fn generate_init_bundle(
        &self,
        request: InitBundleGenRequest,
    ) -> BoxFuture<'_, Result<InitBundleGenResponse, RemoteError>> {
        Box::pin(async move {
            let body = to_body(&request)?;
            self.send(
                "GenerateInitBundle",
                Method::POST,
                "/v1/cluster-init/init-bundles",
                Some(body),
            )
            .await
        })
    }

    fn revoke_init_bundle(
        &self,
        request: InitBundleRevokeRequest,
    ) -> BoxFuture<'_, Result<InitBundleRevokeResponse, RemoteError>> {
        Box::pin(async move {
            let body = to_body(&request)?;
            self.send(
                "RevokeInitBundle",
                Method::PATCH,
                "/v1/cluster-init/init-bundles/revoke",
                Some(body),
            )
            .await
        })
    }
}

impl Channel for RestChannel {
    fn as_api(&self) -> &dyn CentralApi {
        self
    }

    fn shutdown(&self) -> BoxFuture<'_, Result<(), RemoteError>> {
        // reqwest pools are released on drop; nothing to flush.
        Box::pin(async { Ok(()) })
    }
}
