use std::collections::BTreeMap;

use rox_central::{BoxFuture, Connection};
use rox_core::Managed;

use crate::context::PassContext;
use crate::error::ProvisionerError;

/// Secret material handed back to the driver after a create.
pub type ConnectionDetails = BTreeMap<String, Vec<u8>>;

/// What an observe learned about the remote counterpart.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExternalObservation {
    pub resource_exists: bool,
    pub resource_up_to_date: bool,
    /// Human-readable drift; empty when up to date or absent.
    pub diff: String,
}

impl ExternalObservation {
    pub fn absent() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExternalCreation {
    pub connection_details: ConnectionDetails,
}

/// Drives one remote resource through a single pass.
///
/// A client is bound to one open connection and is used by exactly one pass.
/// Every operation may write status into the record it is handed.
pub trait ExternalClient<R: Managed>: Send {
    fn observe<'a>(
        &'a mut self,
        ctx: &'a PassContext,
        cr: &'a mut R,
    ) -> BoxFuture<'a, Result<ExternalObservation, ProvisionerError>>;

    fn create<'a>(
        &'a mut self,
        ctx: &'a PassContext,
        cr: &'a mut R,
    ) -> BoxFuture<'a, Result<ExternalCreation, ProvisionerError>>;

    fn update<'a>(
        &'a mut self,
        ctx: &'a PassContext,
        cr: &'a mut R,
    ) -> BoxFuture<'a, Result<(), ProvisionerError>>;

    fn delete<'a>(
        &'a mut self,
        ctx: &'a PassContext,
        cr: &'a mut R,
    ) -> BoxFuture<'a, Result<(), ProvisionerError>>;

    /// Close the underlying connection. Safe to call more than once.
    fn disconnect(&mut self) -> BoxFuture<'_, Result<(), ProvisionerError>>;
}

/// A record kind the provider knows how to reconcile.
pub trait Reconcilable: Managed + Sized {
    type Client: ExternalClient<Self>;

    fn bind(conn: Connection) -> Self::Client;
}
