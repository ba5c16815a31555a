use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::conditions::Conditions;
use crate::resource::{Kind, Managed, ResourceMeta};

/// The configurable fields of a secured cluster registration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClusterParameters {
    pub admission_controller: bool,
    pub admission_controller_events: bool,
    pub admission_controller_updates: bool,
    #[serde(rename = "centralAPIEndpoint")]
    pub central_api_endpoint: String,
    /// e.g. "CORE_BPF"
    pub collection_method: String,
    pub collector_image: String,
    pub labels: BTreeMap<String, String>,
    pub main_image: String,
    pub name: String,
    pub slim_collector: bool,
    /// User-facing toggle; the remote service stores the inverse.
    pub tolerations: bool,
    /// e.g. "KUBERNETES_CLUSTER"
    pub r#type: String,
}

/// Information about the last sensor that connected for the cluster.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SensorDeployment {
    pub app_namespace: String,
    #[serde(rename = "appNamespaceID")]
    pub app_namespace_id: String,
    #[serde(rename = "appServiceAccountID")]
    pub app_service_account_id: String,
    #[serde(rename = "defaultNamespaceID")]
    pub default_namespace_id: String,
    #[serde(rename = "k8sNodeName")]
    pub k8s_node_name: String,
    #[serde(rename = "systemNamespaceID")]
    pub system_namespace_id: String,
}

/// The observable fields of a cluster registration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClusterObservation {
    pub admission_controller: bool,
    pub admission_controller_events: bool,
    pub admission_controller_updates: bool,
    #[serde(rename = "centralAPIEndpoint")]
    pub central_api_endpoint: String,
    pub collection_method: String,
    pub collector_image: String,
    pub id: String,
    #[serde(rename = "initBundleID")]
    pub init_bundle_id: String,
    pub labels: BTreeMap<String, String>,
    pub main_image: String,
    pub managed_by: String,
    pub most_recent_sensor: SensorDeployment,
    pub name: String,
    pub slim_collector: bool,
    pub tolerations: bool,
    pub r#type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClusterStatus {
    #[serde(flatten)]
    pub conditions: Conditions,
    pub at_provider: ClusterObservation,
}

/// Desired-state record for a secured cluster registered with Central.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cluster {
    pub metadata: ResourceMeta,
    pub for_provider: ClusterParameters,
    #[serde(default)]
    pub status: ClusterStatus,
}

impl Cluster {
    pub fn new(metadata: ResourceMeta, for_provider: ClusterParameters) -> Self {
        Self {
            metadata,
            for_provider,
            status: ClusterStatus::default(),
        }
    }
}

impl Managed for Cluster {
    const KIND: Kind = Kind::Cluster;
    type Observation = ClusterObservation;

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

    fn observation(&self) -> &ClusterObservation {
        &self.status.at_provider
    }

    fn observation_mut(&mut self) -> &mut ClusterObservation {
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
