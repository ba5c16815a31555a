use rox_central::types::{InitBundleMeta, InitBundleRevokeRequest};
use rox_central::{BoxFuture, CentralApi, Connection, format_err_chain};
use rox_core::{InitBundle, Kind, Managed, ReadyCondition};

use super::call;
use crate::context::PassContext;
use crate::error::{Operation, ProvisionerError};
use crate::external::{ExternalClient, ExternalCreation, ExternalObservation, Reconcilable};
use crate::mapper::init_bundle as mapper;

/// Keeps a cluster init bundle in Central in line with its record.
///
/// Central cannot modify a bundle once generated. Drift is resolved by
/// revoking the bundle; the next pass sees it gone and generates a new one.
pub struct InitBundleClient {
    conn: Connection,
    /// Ready condition the record carried into this pass, before observe
    /// marked it available.
    prior_ready: Option<ReadyCondition>,
}

impl InitBundleClient {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn,
            prior_ready: None,
        }
    }

    fn api(&self, op: Operation) -> Result<&dyn CentralApi, ProvisionerError> {
        self.conn
            .api()
            .map_err(|e| op.failed(Kind::InitBundle, format_err_chain(&e)))
    }

    async fn fetch(
        &self,
        ctx: &PassContext,
        name: &str,
    ) -> Result<Option<InitBundleMeta>, ProvisionerError> {
        let api = self.api(Operation::Observe)?;
        let bundles = call(
            ctx,
            Kind::InitBundle,
            Operation::Observe,
            "GetInitBundles",
            api.get_init_bundles(),
        )
        .await?;
        Ok(bundles.into_iter().find(|b| b.name == name))
    }

    /// Revoke the observed bundle. A bundle Central no longer knows counts as
    /// revoked.
    async fn revoke(
        &self,
        ctx: &PassContext,
        cr: &mut InitBundle,
        op: Operation,
    ) -> Result<(), ProvisionerError> {
        cr.status.conditions.set_ready(ReadyCondition::Deleting);

        let id = cr.status.at_provider.id.clone();
        if id.is_empty() {
            tracing::debug!(bundle = %cr.lookup_name(), "no remote id observed, nothing to revoke");
            return Ok(());
        }

        let request = InitBundleRevokeRequest {
            ids: vec![id.clone()],
            confirm_impacted_clusters_ids: Vec::new(),
        };
        let api = self.api(op)?;
        let response = match ctx.run("RevokeInitBundle", api.revoke_init_bundle(request)).await? {
            Ok(response) => response,
            Err(e) if e.is_not_found() => {
                tracing::debug!(bundle = %cr.lookup_name(), id = %id, "init bundle already revoked");
                return Ok(());
            }
            Err(e) => return Err(op.failed(Kind::InitBundle, format_err_chain(&e))),
        };

        for failure in response
            .init_bundle_revocation_errors
            .iter()
            .filter(|failure| failure.id == id)
        {
            if failure.error.to_lowercase().contains("not found") {
                tracing::debug!(bundle = %cr.lookup_name(), id = %id, "init bundle already revoked");
                continue;
            }
            return Err(op.failed(Kind::InitBundle, failure.error.clone()));
        }

        tracing::info!(bundle = %cr.lookup_name(), id = %id, "init bundle revoked");
        Ok(())
    }
}

impl ExternalClient<InitBundle> for InitBundleClient {
    fn observe<'a>(
        &'a mut self,
        ctx: &'a PassContext,
        cr: &'a mut InitBundle,
    ) -> BoxFuture<'a, Result<ExternalObservation, ProvisionerError>> {
        Box::pin(async move {
            self.prior_ready = Some(cr.status.conditions.ready);

            let name = cr.lookup_name().to_string();
            let Some(bundle) = self.fetch(ctx, &name).await? else {
                tracing::debug!(bundle = %name, "init bundle not found");
                return Ok(ExternalObservation::absent());
            };

            cr.status.at_provider = mapper::to_observation(&bundle);
            cr.status.conditions.set_ready(ReadyCondition::Available);

            let drift = mapper::diff(&cr.for_provider, &cr.status.at_provider);
            Ok(ExternalObservation {
                resource_exists: true,
                resource_up_to_date: drift.is_empty(),
                diff: drift.render("init bundle"),
            })
        })
    }

    fn create<'a>(
        &'a mut self,
        ctx: &'a PassContext,
        cr: &'a mut InitBundle,
    ) -> BoxFuture<'a, Result<ExternalCreation, ProvisionerError>> {
        Box::pin(async move {
            cr.status.conditions.set_ready(ReadyCondition::Creating);

            let request = mapper::to_request(&cr.for_provider);
            let api = self.api(Operation::Create)?;
            let response = call(
                ctx,
                Kind::InitBundle,
                Operation::Create,
                "GenerateInitBundle",
                api.generate_init_bundle(request),
            )
            .await?;

            match &response.meta {
                Some(meta) => {
                    cr.status.at_provider = mapper::to_observation(meta);
                    cr.metadata.external_name = meta.name.clone();
                }
                None => {
                    tracing::warn!(
                        bundle = %cr.for_provider.name,
                        "Central returned no bundle metadata, linking by requested name"
                    );
                    cr.metadata.external_name = cr.for_provider.name.clone();
                }
            }

            tracing::info!(
                bundle = %cr.metadata.external_name,
                id = %cr.status.at_provider.id,
                "init bundle generated"
            );
            Ok(ExternalCreation {
                connection_details: mapper::connection_details(&response),
            })
        })
    }

    fn update<'a>(
        &'a mut self,
        ctx: &'a PassContext,
        cr: &'a mut InitBundle,
    ) -> BoxFuture<'a, Result<(), ProvisionerError>> {
        Box::pin(async move {
            let prior = self.prior_ready.unwrap_or(cr.status.conditions.ready);
            if prior.is_transitioning() {
                tracing::info!(
                    bundle = %cr.lookup_name(),
                    ready = %prior,
                    "transition in flight, leaving init bundle as is"
                );
                return Ok(());
            }
            self.revoke(ctx, cr, Operation::Update).await
        })
    }

    fn delete<'a>(
        &'a mut self,
        ctx: &'a PassContext,
        cr: &'a mut InitBundle,
    ) -> BoxFuture<'a, Result<(), ProvisionerError>> {
        Box::pin(async move { self.revoke(ctx, cr, Operation::Delete).await })
    }

    fn disconnect(&mut self) -> BoxFuture<'_, Result<(), ProvisionerError>> {
        Box::pin(async move { self.conn.close().await.map_err(ProvisionerError::DisconnectFailed) })
    }
}

impl Reconcilable for InitBundle {
    type Client = InitBundleClient;

    fn bind(conn: Connection) -> InitBundleClient {
        InitBundleClient::new(conn)
    }
}
