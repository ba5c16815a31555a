use std::collections::BTreeMap;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::conditions::Conditions;
use crate::resource::{Kind, Managed, ResourceMeta};

/// The configurable fields of an init bundle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InitBundleParameters {
    pub name: String,
}

/// A secured cluster that was set up with an init bundle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ImpactedCluster {
    pub id: String,
    pub name: String,
}

/// The actor that generated an init bundle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct User {
    pub attributes: BTreeMap<String, String>,
    #[serde(rename = "authProviderID")]
    pub auth_provider_id: String,
    pub id: String,
}

/// The observable fields of an init bundle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InitBundleObservation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
    pub created_by: User,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<Timestamp>,
    pub id: String,
    pub impacted_clusters: Vec<ImpactedCluster>,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InitBundleStatus {
    #[serde(flatten)]
    pub conditions: Conditions,
    pub at_provider: InitBundleObservation,
}

/// Desired-state record for a cluster init bundle.
///
/// The generated bundle material is never stored here; it is handed to the
/// driver as connection details on create.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitBundle {
    pub metadata: ResourceMeta,
    pub for_provider: InitBundleParameters,
    #[serde(default)]
    pub status: InitBundleStatus,
}

impl InitBundle {
    pub fn new(metadata: ResourceMeta, for_provider: InitBundleParameters) -> Self {
        Self {
            metadata,
            for_provider,
            status: InitBundleStatus::default(),
        }
    }
}

impl Managed for InitBundle {
    const KIND: Kind = Kind::InitBundle;
    type Observation = InitBundleObservation;

    fn meta(&self) -> &ResourceMeta {
        &self.metadata
    }

    fn meta_mut(&mut self) -> &mut ResourceMeta {
        &mut self.metadata
    }

    fn conditions(&self) -> &Conditions {
        &self.status.conditions
    }

    fn conditions_mut(&mut self) -> &mut Conditions {
        &mut self.status.conditions
    }

    fn observation(&self) -> &InitBundleObservation {
        &self.status.at_provider
    }

    fn observation_mut(&mut self) -> &mut InitBundleObservation {
        &mut self.status.at_provider
    }

    fn lookup_name(&self) -> &str {
        if self.metadata.external_name.is_empty() {
            &self.for_provider.name
        } else {
            &self.metadata.external_name
        }
    }
}
