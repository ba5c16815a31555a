use std::sync::Arc;

use rox_central::{Connection, Endpoint, Transport};
use rox_core::{Managed, ResourceMeta};

use crate::context::PassContext;
use crate::credentials::CredentialResolver;
use crate::error::ProvisionerError;
use crate::external::Reconcilable;
use crate::mapper;
use crate::provider::ProviderConfigStore;

/// Produces an external client bound to a fresh Central connection.
///
/// Holds no per-pass state; one connector serves every pass.
#[derive(Clone)]
pub struct Connector {
    configs: Arc<dyn ProviderConfigStore>,
    credentials: CredentialResolver,
    transport: Arc<dyn Transport>,
}

impl Connector {
    /// Build a connector, refusing to start if any enum table is malformed.
    pub fn new(
        configs: Arc<dyn ProviderConfigStore>,
        credentials: CredentialResolver,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, ProvisionerError> {
        mapper::validate_tables()?;
        Ok(Self {
            configs,
            credentials,
            transport,
        })
    }

    /// Open a connection for the provider config the record references.
    pub async fn open(
        &self,
        ctx: &PassContext,
        meta: &ResourceMeta,
    ) -> Result<Connection, ProvisionerError> {
        let config = ctx
            .run("get provider config", self.configs.get(&meta.provider_config_ref))
            .await?
            .ok_or_else(|| ProvisionerError::ConfigNotFound {
                name: meta.provider_config_ref.clone(),
            })?;

        let token = self.credentials.resolve(ctx, &config.credentials).await?;
        let endpoint = Endpoint::parse(&config.endpoint).map_err(ProvisionerError::ConnectionFailed)?;

        let conn = ctx
            .run(
                "connect to Central",
                Connection::open(self.transport.as_ref(), endpoint, &token),
            )
            .await?
            .map_err(ProvisionerError::ConnectionFailed)?;

        tracing::debug!(
            resource = %meta.name,
            provider_config = %meta.provider_config_ref,
            endpoint = %conn.endpoint(),
            "connected"
        );
        Ok(conn)
    }

    /// Open a connection and bind the kind's external client to it.
    pub async fn connect<R: Reconcilable>(
        &self,
        ctx: &PassContext,
        cr: &R,
    ) -> Result<R::Client, ProvisionerError> {
        let conn = self.open(ctx, cr.meta()).await?;
        Ok(R::bind(conn))
    }
}
