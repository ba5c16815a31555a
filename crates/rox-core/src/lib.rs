pub mod cluster;
pub mod conditions;
pub mod error;
pub mod init_bundle;
pub mod provider_config;
pub mod resource;

pub use crate::cluster::{Cluster, ClusterObservation, ClusterParameters, SensorDeployment};
pub use crate::conditions::{Conditions, ReadyCondition, SyncedCondition};
pub use crate::error::CoreError;
pub use crate::init_bundle::{
    ImpactedCluster, InitBundle, InitBundleObservation, InitBundleParameters, User,
};
pub use crate::provider_config::{
    CredentialsSource, EnvSelector, FsSelector, ProviderConfig, SecretKeySelector,
};
pub use crate::resource::{DeletionPolicy, Kind, Managed, ManagedResource, ResourceMeta};
