use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use rox_central::{BearerToken, BoxFuture};
use rox_core::{CredentialsSource, SecretKeySelector};
use thiserror::Error;

use crate::context::PassContext;
use crate::error::ProvisionerError;

#[derive(Debug, Error)]
#[error("{0}")]
pub struct CredentialSourceUnavailable(pub String);

/// Read access to secret material referenced by provider configs.
pub trait SecretStore: Send + Sync {
    fn get<'a>(
        &'a self,
        selector: &'a SecretKeySelector,
    ) -> BoxFuture<'a, Result<Vec<u8>, CredentialSourceUnavailable>>;
}

/// Secrets held in memory, keyed by namespace/name/key.
#[derive(Debug, Default, Clone)]
pub struct InMemorySecretStore {
    secrets: Arc<Mutex<HashMap<SecretKeySelector, Vec<u8>>>>,
}

impl InMemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, selector: SecretKeySelector, value: impl Into<Vec<u8>>) {
        let mut secrets = self.secrets.lock().unwrap_or_else(PoisonError::into_inner);
        secrets.insert(selector, value.into());
    }
}

impl SecretStore for InMemorySecretStore {
    fn get<'a>(
        &'a self,
        selector: &'a SecretKeySelector,
    ) -> BoxFuture<'a, Result<Vec<u8>, CredentialSourceUnavailable>> {
        Box::pin(async move {
            let secrets = self.secrets.lock().unwrap_or_else(PoisonError::into_inner);
            secrets.get(selector).cloned().ok_or_else(|| {
                CredentialSourceUnavailable(format!(
                    "secret {}/{} has no key {}",
                    selector.namespace, selector.name, selector.key
                ))
            })
        })
    }
}

/// Turns a credentials source into the bearer token presented to Central.
#[derive(Clone)]
pub struct CredentialResolver {
    secrets: Arc<dyn SecretStore>,
}

impl CredentialResolver {
    pub fn new(secrets: Arc<dyn SecretStore>) -> Self {
        Self { secrets }
    }

    pub async fn resolve(
        &self,
        ctx: &PassContext,
        source: &CredentialsSource,
    ) -> Result<BearerToken, ProvisionerError> {
        let raw = match source {
            CredentialsSource::None => {
                return Err(ProvisionerError::CredentialResolutionFailed(
                    "credentials source None carries no API token".into(),
                ));
            }
            CredentialsSource::Secret { secret_ref } => ctx
                .run("read credentials secret", self.secrets.get(secret_ref))
                .await?
                .map_err(|e| ProvisionerError::CredentialResolutionFailed(e.0))?,
            CredentialsSource::Environment { env } => std::env::var(&env.name)
                .map(String::into_bytes)
                .map_err(|e| {
                    ProvisionerError::CredentialResolutionFailed(format!(
                        "environment variable {}: {e}",
                        env.name
                    ))
                })?,
            CredentialsSource::Filesystem { fs } => ctx
                .run("read credentials file", tokio::fs::read(&fs.path))
                .await?
                .map_err(|e| {
                    ProvisionerError::CredentialResolutionFailed(format!(
                        "{}: {e}",
                        fs.path.display()
                    ))
                })?,
        };

        BearerToken::from_bytes(&raw).ok_or_else(|| {
            ProvisionerError::CredentialResolutionFailed(
                "API token is empty or not valid UTF-8".into(),
            )
        })
    }
}
