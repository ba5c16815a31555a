//! rox-provisioner
//!
//! Reconciliation core for StackRox Central resources: cluster
//! registrations and init bundles.
//!
//! Public API:
//! - `Connector`: resolve provider config and credentials, open a connection,
//!   hand back a per-pass `ExternalClient`
//! - `ExternalClient`: observe / create / update / delete one remote resource
//! - `mapper`: pure translation between records and Central's representation
//! - `reconcile_pass()`: one full pass: connect → observe → act → disconnect

pub mod clients;
pub mod connector;
pub mod context;
pub mod credentials;
pub mod diff;
pub mod error;
pub mod external;
pub mod mapper;
pub mod provider;
pub mod reconcile;

pub use crate::clients::{ClusterClient, InitBundleClient};
pub use crate::connector::Connector;
pub use crate::context::PassContext;
pub use crate::credentials::{CredentialResolver, InMemorySecretStore, SecretStore};
pub use crate::error::{Operation, ProvisionerError};
pub use crate::external::{
    ConnectionDetails, ExternalClient, ExternalCreation, ExternalObservation, Reconcilable,
};
pub use crate::provider::{ProviderConfigStore, StaticProviderConfigs};
pub use crate::reconcile::{
    Action, PassOutcome, PassStatus, ResourceOutcome, reconcile_pass, reconcile_record,
    reconcile_resource,
};
