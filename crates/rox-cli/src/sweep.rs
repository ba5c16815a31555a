use std::path::Path;
use std::time::Duration;

use futures::StreamExt;
use rox_core::ManagedResource;
use rox_provisioner::{Action, Connector, PassContext, ProvisionerError, ResourceOutcome};
use tokio_util::sync::CancellationToken;

use crate::persistence::write_connection_details;

/// Settings for one sweep over every record.
#[derive(Debug, Clone)]
pub struct SweepOptions {
    pub pass_timeout: Duration,
    pub concurrency: usize,
}

/// Tally of one sweep.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SweepReport {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    pub orphaned: usize,
    pub unchanged: usize,
    pub failed: usize,
    /// Records whose deletion finished and were dropped from the store.
    pub released: Vec<String>,
    /// Some pass asked to be re-run soon.
    pub requeue: bool,
}

/// Run one pass per record, at most `concurrency` at a time.
///
/// Every pass gets its own context derived from `shutdown`, so cancelling it
/// stops all in-flight passes. Records whose deletion has completed are
/// removed from `resources`.
pub async fn sweep(
    connector: &Connector,
    shutdown: &CancellationToken,
    resources: &mut Vec<ManagedResource>,
    connection_details_dir: &Path,
    options: &SweepOptions,
) -> SweepReport {
    let results: Vec<(String, Result<ResourceOutcome, ProvisionerError>)> =
        futures::stream::iter(resources.iter_mut())
            .map(|resource| async move {
                let ctx = PassContext::child_of(shutdown);
                // A timeout too large to represent means no deadline.
                let ctx = match tokio::time::Instant::now().checked_add(options.pass_timeout) {
                    Some(deadline) => ctx.with_deadline(deadline),
                    None => ctx,
                };
                let name = resource.meta().name.clone();
                let result = rox_provisioner::reconcile_resource(connector, &ctx, resource).await;
                (name, result)
            })
            .buffer_unordered(options.concurrency.max(1))
            .collect()
            .await;

    let mut report = SweepReport::default();
    for (name, result) in results {
        match result {
            Ok(outcome) => {
                report.requeue |= outcome.requeue();
                // Central hands out bundle material once; losing it fails the pass.
                if let Err(e) =
                    write_connection_details(connection_details_dir, &name, outcome.connection_details())
                {
                    report.failed += 1;
                    tracing::error!(resource = %name, error = %e, "failed to write connection details");
                    if let Some(record) = resources.iter_mut().find(|r| r.meta().name == name) {
                        record
                            .conditions_mut()
                            .reconcile_error(format!("cannot store connection details: {e}"));
                    }
                    continue;
                }
                match outcome.action() {
                    Action::Created => report.created += 1,
                    Action::Updated => report.updated += 1,
                    Action::Deleted => report.deleted += 1,
                    Action::Orphaned => report.orphaned += 1,
                    Action::None => report.unchanged += 1,
                }
                if releasable(resources, &name, outcome.action()) {
                    report.released.push(name);
                }
            }
            Err(e) => {
                report.failed += 1;
                report.requeue |= e.is_retryable();
                tracing::error!(resource = %name, error = %e, "reconcile failed");
            }
        }
    }

    resources.retain(|r| !report.released.contains(&r.meta().name));
    for name in &report.released {
        tracing::info!(resource = %name, "deletion complete, record released");
    }
    report
}

/// A record can be forgotten once deletion was requested and the pass found
/// nothing left to delete, or the policy keeps the remote resource.
fn releasable(resources: &[ManagedResource], name: &str, action: Action) -> bool {
    resources
        .iter()
        .find(|r| r.meta().name == name)
        .is_some_and(|r| {
            r.meta().deletion_requested && matches!(action, Action::None | Action::Orphaned)
        })
}
