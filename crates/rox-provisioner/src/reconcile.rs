use rox_core::{
    Cluster, CoreError, DeletionPolicy, InitBundle, Managed, ManagedResource, ReadyCondition,
    SyncedCondition,
};
use serde::Serialize;
use tracing::Instrument;

use crate::connector::Connector;
use crate::context::PassContext;
use crate::error::ProvisionerError;
use crate::external::{ConnectionDetails, ExternalClient, Reconcilable};

/// What a pass did to the remote resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    None,
    Created,
    Updated,
    Deleted,
    /// Deletion was requested but the policy keeps the remote resource.
    Orphaned,
}

/// The status projection handed back to the driver after a pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PassStatus<O> {
    pub exists: bool,
    pub ready: ReadyCondition,
    pub synced: SyncedCondition,
    pub observation: Option<O>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PassOutcome<O> {
    pub action: Action,
    pub status: PassStatus<O>,
    /// Set only by a create that produced secret material.
    pub connection_details: ConnectionDetails,
    /// The driver should run another pass soon to confirm the action.
    pub requeue: bool,
}

struct Driven {
    action: Action,
    exists: bool,
    diff: String,
    connection_details: ConnectionDetails,
}

/// Run one reconciliation pass for `cr`.
///
/// Connect, observe, then create, update or delete as needed. The connection
/// is closed on every path out, including errors and cancellation. On
/// failure the record keeps the observation it came in with; only its
/// conditions change.
pub async fn reconcile_pass<R: Reconcilable>(
    connector: &Connector,
    ctx: &PassContext,
    cr: &mut R,
) -> Result<PassOutcome<R::Observation>, ProvisionerError> {
    let kind = R::KIND;
    let span = tracing::info_span!("reconcile", kind = %kind, resource = %cr.meta().name);
    run_pass(connector, ctx, cr).instrument(span).await
}

async fn run_pass<R: Reconcilable>(
    connector: &Connector,
    ctx: &PassContext,
    cr: &mut R,
) -> Result<PassOutcome<R::Observation>, ProvisionerError> {
    let snapshot = cr.observation().clone();

    let mut client = match connector.connect(ctx, cr).await {
        Ok(client) => client,
        Err(e) => return Err(fail(cr, snapshot, e)),
    };

    let driven = drive(&mut client, ctx, cr).await;
    let disconnected = client.disconnect().await;

    let driven = match (driven, disconnected) {
        (Ok(driven), Ok(())) => driven,
        (Ok(driven), Err(e)) => {
            tracing::warn!(error = %e, "pass succeeded but the connection did not close cleanly");
            driven
        }
        (Err(e), disconnected) => {
            if let Err(close) = disconnected {
                tracing::warn!(error = %close, "failed to close connection after failed pass");
            }
            return Err(fail(cr, snapshot, e));
        }
    };

    cr.conditions_mut().reconcile_success();

    let conditions = cr.conditions();
    let status = PassStatus {
        exists: driven.exists,
        ready: conditions.ready,
        synced: conditions.synced.clone(),
        observation: driven.exists.then(|| cr.observation().clone()),
        diff: (!driven.diff.is_empty()).then_some(driven.diff),
    };

    tracing::info!(action = ?driven.action, exists = driven.exists, ready = %status.ready, "pass complete");

    Ok(PassOutcome {
        requeue: driven.action != Action::None,
        action: driven.action,
        status,
        connection_details: driven.connection_details,
    })
}

async fn drive<R: Reconcilable>(
    client: &mut R::Client,
    ctx: &PassContext,
    cr: &mut R,
) -> Result<Driven, ProvisionerError> {
    let observation = client.observe(ctx, cr).await?;
    let mut driven = Driven {
        action: Action::None,
        exists: observation.resource_exists,
        diff: observation.diff,
        connection_details: ConnectionDetails::new(),
    };

    if cr.meta().deletion_requested {
        driven.exists = false;
        if cr.meta().deletion_policy == DeletionPolicy::Orphan {
            tracing::info!("deletion policy is Orphan, leaving remote resource in place");
            driven.action = Action::Orphaned;
        } else if observation.resource_exists {
            client.delete(ctx, cr).await?;
            driven.action = Action::Deleted;
        } else {
            tracing::debug!("remote resource already gone");
        }
        return Ok(driven);
    }

    if !observation.resource_exists {
        let creation = client.create(ctx, cr).await?;
        driven.action = Action::Created;
        driven.connection_details = creation.connection_details;
    } else if !observation.resource_up_to_date {
        tracing::info!(diff = %driven.diff, "drift detected");
        client.update(ctx, cr).await?;
        driven.action = Action::Updated;
    } else {
        tracing::debug!("remote resource up to date");
    }

    Ok(driven)
}

/// Record a failed pass on the resource and hand the error back.
fn fail<R: Managed>(cr: &mut R, snapshot: R::Observation, err: ProvisionerError) -> ProvisionerError {
    let err = err.with_resource(&cr.meta().name);

    *cr.observation_mut() = snapshot;
    let conditions = cr.conditions_mut();
    if !conditions.ready.is_transitioning() {
        conditions.set_ready(ReadyCondition::Unavailable);
    }
    conditions.reconcile_error(err.to_string());

    tracing::warn!(error = %err, retryable = err.is_retryable(), "pass failed");
    err
}

/// Outcome of a pass over a record of either kind.
#[derive(Debug, Clone)]
pub enum ResourceOutcome {
    Cluster(PassOutcome<rox_core::ClusterObservation>),
    InitBundle(PassOutcome<rox_core::InitBundleObservation>),
}

impl ResourceOutcome {
    pub fn action(&self) -> Action {
        match self {
            Self::Cluster(outcome) => outcome.action,
            Self::InitBundle(outcome) => outcome.action,
        }
    }

    pub fn requeue(&self) -> bool {
        match self {
            Self::Cluster(outcome) => outcome.requeue,
            Self::InitBundle(outcome) => outcome.requeue,
        }
    }

    pub fn connection_details(&self) -> &ConnectionDetails {
        match self {
            Self::Cluster(outcome) => &outcome.connection_details,
            Self::InitBundle(outcome) => &outcome.connection_details,
        }
    }
}

/// Dispatch a pass on the record's kind.
pub async fn reconcile_resource(
    connector: &Connector,
    ctx: &PassContext,
    resource: &mut ManagedResource,
) -> Result<ResourceOutcome, ProvisionerError> {
    match resource {
        ManagedResource::Cluster(cr) => reconcile_pass::<Cluster>(connector, ctx, cr)
            .await
            .map(ResourceOutcome::Cluster),
        ManagedResource::InitBundle(cr) => reconcile_pass::<InitBundle>(connector, ctx, cr)
            .await
            .map(ResourceOutcome::InitBundle),
    }
}

/// Run a pass for a record the caller expects to be of kind `R`.
///
/// Returns the record with its updated status. A record of any other kind is
/// rejected with `NotThisKind` before anything is contacted.
pub async fn reconcile_record<R>(
    connector: &Connector,
    ctx: &PassContext,
    resource: ManagedResource,
) -> Result<(R, PassOutcome<R::Observation>), ProvisionerError>
where
    R: Reconcilable + TryFrom<ManagedResource, Error = CoreError>,
{
    let mut cr = R::try_from(resource)?;
    let outcome = reconcile_pass(connector, ctx, &mut cr).await?;
    Ok((cr, outcome))
}
