use std::fmt;

use serde::{Deserialize, Serialize};

use crate::cluster::Cluster;
use crate::conditions::Conditions;
use crate::error::CoreError;
use crate::init_bundle::InitBundle;

/// The managed resource kinds this provider reconciles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Kind {
    Cluster,
    InitBundle,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Cluster => write!(f, "Cluster"),
            Self::InitBundle => write!(f, "InitBundle"),
        }
    }
}

/// What happens to the remote resource when its record is deleted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeletionPolicy {
    #[default]
    Delete,
    Orphan,
}

/// Metadata shared by every managed resource record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceMeta {
    /// Name of the record itself, e.g. "prod".
    pub name: String,
    /// Name of the remote counterpart. Empty until the first successful create.
    #[serde(default)]
    pub external_name: String,
    /// Name of the `ProviderConfig` holding endpoint and credentials.
    pub provider_config_ref: String,
    #[serde(default)]
    pub deletion_policy: DeletionPolicy,
    /// Set by the driver once the user has asked for the record to go away.
    #[serde(default)]
    pub deletion_requested: bool,
}

impl ResourceMeta {
    pub fn new(name: impl Into<String>, provider_config_ref: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            external_name: String::new(),
            provider_config_ref: provider_config_ref.into(),
            deletion_policy: DeletionPolicy::default(),
            deletion_requested: false,
        }
    }
}

/// Common accessors the reconciliation core needs from every record.
pub trait Managed: Send {
    const KIND: Kind;

    /// The kind-specific remote projection stored in status.
    type Observation: Clone + fmt::Debug + Serialize + Send;

    fn meta(&self) -> &ResourceMeta;
    fn meta_mut(&mut self) -> &mut ResourceMeta;
    fn conditions(&self) -> &Conditions;
    fn conditions_mut(&mut self) -> &mut Conditions;
    fn observation(&self) -> &Self::Observation;
    fn observation_mut(&mut self) -> &mut Self::Observation;

    /// The name used to find the remote counterpart.
    ///
    /// Once linked this is the external name; before the first create it is
    /// the name the record asks the remote service to use.
    fn lookup_name(&self) -> &str;
}

/// A record of any kind, as handed over by the driver.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ManagedResource {
    Cluster(Cluster),
    InitBundle(InitBundle),
}

impl ManagedResource {
    pub fn kind(&self) -> Kind {
        match self {
            Self::Cluster(_) => Kind::Cluster,
            Self::InitBundle(_) => Kind::InitBundle,
        }
    }

    pub fn meta(&self) -> &ResourceMeta {
        match self {
            Self::Cluster(cr) => cr.meta(),
            Self::InitBundle(cr) => cr.meta(),
        }
    }

    pub fn meta_mut(&mut self) -> &mut ResourceMeta {
        match self {
            Self::Cluster(cr) => cr.meta_mut(),
            Self::InitBundle(cr) => cr.meta_mut(),
        }
    }

    pub fn conditions(&self) -> &Conditions {
        match self {
            Self::Cluster(cr) => cr.conditions(),
            Self::InitBundle(cr) => cr.conditions(),
        }
    }

    pub fn conditions_mut(&mut self) -> &mut Conditions {
        match self {
            Self::Cluster(cr) => cr.conditions_mut(),
            Self::InitBundle(cr) => cr.conditions_mut(),
        }
    }

    /// Check the fields every pass relies on are filled in.
    pub fn validate(&self) -> Result<(), CoreError> {
        let meta = self.meta();
        let invalid = |reason: &str| CoreError::InvalidRecord {
            name: meta.name.clone(),
            reason: reason.to_string(),
        };

        if meta.name.is_empty() {
            return Err(invalid("metadata.name is empty"));
        }
        // Drivers key files and directories by record name.
        if meta.name.contains(['/', '\\']) || meta.name == "." || meta.name == ".." {
            return Err(invalid("metadata.name must be a single path component"));
        }
        if meta.provider_config_ref.is_empty() {
            return Err(invalid("metadata.providerConfigRef is empty"));
        }
        let requested = match self {
            Self::Cluster(cr) => &cr.for_provider.name,
            Self::InitBundle(cr) => &cr.for_provider.name,
        };
        if requested.is_empty() && meta.external_name.is_empty() {
            return Err(invalid("forProvider.name is empty"));
        }
        Ok(())
    }

    /// Parse a JSON array of records and validate each one.
    pub fn parse_all(raw: &str) -> Result<Vec<Self>, CoreError> {
        let records: Vec<Self> = serde_json::from_str(raw)?;
        for record in &records {
            record.validate()?;
        }
        Ok(records)
    }
}

impl From<Cluster> for ManagedResource {
    fn from(cr: Cluster) -> Self {
        Self::Cluster(cr)
    }
}

impl From<InitBundle> for ManagedResource {
    fn from(cr: InitBundle) -> Self {
        Self::InitBundle(cr)
    }
}

impl TryFrom<ManagedResource> for Cluster {
    type Error = CoreError;

    fn try_from(value: ManagedResource) -> Result<Self, Self::Error> {
        match value {
            ManagedResource::Cluster(cr) => Ok(cr),
            other => Err(CoreError::NotThisKind {
                expected: Kind::Cluster,
                actual: other.kind(),
            }),
        }
    }
}

impl TryFrom<ManagedResource> for InitBundle {
    type Error = CoreError;

    fn try_from(value: ManagedResource) -> Result<Self, Self::Error> {
        match value {
            ManagedResource::InitBundle(cr) => Ok(cr),
            other => Err(CoreError::NotThisKind {
                expected: Kind::InitBundle,
                actual: other.kind(),
            }),
        }
    }
}
