use rox_central::types as remote;
use rox_central::{BoxFuture, CentralApi, Connection, format_err_chain};
use rox_core::{Cluster, Kind, Managed, ReadyCondition};

use super::call;
use crate::context::PassContext;
use crate::error::{Operation, ProvisionerError};
use crate::external::{ExternalClient, ExternalCreation, ExternalObservation, Reconcilable};
use crate::mapper::cluster as mapper;

/// Keeps a secured cluster registration in Central in line with its record.
///
/// Central has a full-replace call for clusters, so drift is fixed in place.
pub struct ClusterClient {
    conn: Connection,
}

impl ClusterClient {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    fn api(&self, op: Operation) -> Result<&dyn CentralApi, ProvisionerError> {
        self.conn
            .api()
            .map_err(|e| op.failed(Kind::Cluster, format_err_chain(&e)))
    }

    /// Find the registration named `name`. Central has no get-by-name, so
    /// this lists every cluster and searches.
    async fn fetch(
        &self,
        ctx: &PassContext,
        name: &str,
        op: Operation,
    ) -> Result<Option<remote::Cluster>, ProvisionerError> {
        let api = self.api(op)?;
        let clusters = call(ctx, Kind::Cluster, op, "GetClusters", api.get_clusters()).await?;
        Ok(clusters.into_iter().find(|c| c.name == name))
    }
}

impl ExternalClient<Cluster> for ClusterClient {
    fn observe<'a>(
        &'a mut self,
        ctx: &'a PassContext,
        cr: &'a mut Cluster,
    ) -> BoxFuture<'a, Result<ExternalObservation, ProvisionerError>> {
        Box::pin(async move {
            let name = cr.lookup_name().to_string();
            let Some(remote) = self.fetch(ctx, &name, Operation::Observe).await? else {
                tracing::debug!(cluster = %name, "cluster not registered");
                return Ok(ExternalObservation::absent());
            };

            cr.status.at_provider = mapper::to_observation(&remote);
            cr.status.conditions.set_ready(ReadyCondition::Available);

            let drift = mapper::diff(&cr.for_provider, &cr.status.at_provider);
            Ok(ExternalObservation {
                resource_exists: true,
                resource_up_to_date: drift.is_empty(),
                diff: drift.render("cluster"),
            })
        })
    }

    fn create<'a>(
        &'a mut self,
        ctx: &'a PassContext,
        cr: &'a mut Cluster,
    ) -> BoxFuture<'a, Result<ExternalCreation, ProvisionerError>> {
        Box::pin(async move {
            cr.status.conditions.set_ready(ReadyCondition::Creating);

            let request = mapper::to_remote(&cr.for_provider, None);
            let api = self.api(Operation::Create)?;
            let created = call(
                ctx,
                Kind::Cluster,
                Operation::Create,
                "PostCluster",
                api.post_cluster(request),
            )
            .await?;

            match created {
                Some(created) => {
                    cr.status.at_provider = mapper::to_observation(&created);
                    cr.metadata.external_name = created.name;
                }
                None => {
                    tracing::warn!(
                        cluster = %cr.for_provider.name,
                        "Central returned no cluster on create, linking by requested name"
                    );
                    cr.metadata.external_name = cr.for_provider.name.clone();
                }
            }

            tracing::info!(
                cluster = %cr.metadata.external_name,
                id = %cr.status.at_provider.id,
                "cluster registered"
            );
            Ok(ExternalCreation::default())
        })
    }

    fn update<'a>(
        &'a mut self,
        ctx: &'a PassContext,
        cr: &'a mut Cluster,
    ) -> BoxFuture<'a, Result<(), ProvisionerError>> {
        Box::pin(async move {
            let name = cr.lookup_name().to_string();
            let Some(current) = self.fetch(ctx, &name, Operation::Update).await? else {
                tracing::info!(cluster = %name, "cluster gone before update, nothing to replace");
                return Ok(());
            };

            let request = mapper::to_remote(&cr.for_provider, Some(current));
            let id = request.id.clone();
            let requested_name = request.name.clone();
            let api = self.api(Operation::Update)?;
            let updated = call(
                ctx,
                Kind::Cluster,
                Operation::Update,
                "PutCluster",
                api.put_cluster(request),
            )
            .await?;

            // A rename moves the registration; follow it.
            match updated {
                Some(updated) => {
                    cr.status.at_provider = mapper::to_observation(&updated);
                    cr.metadata.external_name = updated.name;
                }
                None => cr.metadata.external_name = requested_name,
            }

            tracing::info!(
                cluster = %cr.metadata.external_name,
                previous = %name,
                id = %id,
                "cluster updated"
            );
            Ok(())
        })
    }

    fn delete<'a>(
        &'a mut self,
        ctx: &'a PassContext,
        cr: &'a mut Cluster,
    ) -> BoxFuture<'a, Result<(), ProvisionerError>> {
        Box::pin(async move {
            cr.status.conditions.set_ready(ReadyCondition::Deleting);

            let id = cr.status.at_provider.id.clone();
            if id.is_empty() {
                tracing::debug!(cluster = %cr.lookup_name(), "no remote id observed, nothing to delete");
                return Ok(());
            }

            let api = self.api(Operation::Delete)?;
            match ctx.run("DeleteCluster", api.delete_cluster(id.clone())).await? {
                Ok(()) => tracing::info!(cluster = %cr.lookup_name(), id = %id, "cluster deleted"),
                Err(e) if e.is_not_found() => {
                    tracing::debug!(cluster = %cr.lookup_name(), id = %id, "cluster already deleted");
                }
                Err(e) => return Err(Operation::Delete.failed(Kind::Cluster, format_err_chain(&e))),
            }
            Ok(())
        })
    }

    fn disconnect(&mut self) -> BoxFuture<'_, Result<(), ProvisionerError>> {
        Box::pin(async move { self.conn.close().await.map_err(ProvisionerError::DisconnectFailed) })
    }
}

impl Reconcilable for Cluster {
    type Client = ClusterClient;

    fn bind(conn: Connection) -> ClusterClient {
        ClusterClient::new(conn)
    }
}
