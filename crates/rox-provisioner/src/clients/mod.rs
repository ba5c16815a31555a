//! `ExternalClient` implementations, one per resource kind.

mod cluster;
mod init_bundle;

use std::future::Future;

use rox_central::{RemoteError, format_err_chain};
use rox_core::Kind;

use crate::context::PassContext;
use crate::error::{Operation, ProvisionerError};

pub use cluster::ClusterClient;
pub use init_bundle::InitBundleClient;

/// Issue one remote call under the pass context, wrapping any failure with
/// the operation it belongs to.
pub(crate) async fn call<T, F>(
    ctx: &PassContext,
    kind: Kind,
    op: Operation,
    rpc: &'static str,
    fut: F,
) -> Result<T, ProvisionerError>
where
    F: Future<Output = Result<T, RemoteError>>,
{
    ctx.run(rpc, fut)
        .await?
        .map_err(|e| op.failed(kind, format_err_chain(&e)))
}
