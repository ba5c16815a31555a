//! Remote representations, shaped like Central's v1 JSON API.
//!
//! Enumerated fields are kept as their numeric codes; the `enums` tables
//! translate them. Fields this crate does not model are carried in `extra`
//! so a full-replace call sends them back untouched.

use std::collections::BTreeMap;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::enums;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Cluster {
    pub id: String,
    pub name: String,
    #[serde(deserialize_with = "enums::cluster_type")]
    pub r#type: i32,
    pub labels: BTreeMap<String, String>,
    pub main_image: String,
    pub collector_image: String,
    pub central_api_endpoint: String,
    #[serde(deserialize_with = "enums::collection_method")]
    pub collection_method: i32,
    pub admission_controller: bool,
    pub admission_controller_updates: bool,
    pub admission_controller_events: bool,
    pub slim_collector: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tolerations_config: Option<TolerationsConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub most_recent_sensor_id: Option<SensorDeploymentIdentification>,
    #[serde(deserialize_with = "enums::manager_type")]
    pub managed_by: i32,
    pub init_bundle_id: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TolerationsConfig {
    pub disabled: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SensorDeploymentIdentification {
    pub system_namespace_id: String,
    pub default_namespace_id: String,
    pub app_namespace: String,
    pub app_namespace_id: String,
    pub app_serviceaccount_id: String,
    pub k8s_node_name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct ClustersList {
    pub clusters: Vec<Cluster>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct ClusterResponse {
    pub cluster: Option<Cluster>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InitBundleMeta {
    pub id: String,
    pub name: String,
    pub impacted_clusters: Vec<ImpactedCluster>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<User>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<Timestamp>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImpactedCluster {
    pub name: String,
    pub id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub auth_provider_id: String,
    pub attributes: Vec<UserAttribute>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserAttribute {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct InitBundleMetas {
    pub items: Vec<InitBundleMeta>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitBundleGenRequest {
    pub name: String,
}

/// Response to generating an init bundle.
///
/// The two bundles are one-time secret material: Central never returns
/// them again.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InitBundleGenResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<InitBundleMeta>,
    #[serde(with = "base64_bytes")]
    pub helm_values_bundle: Vec<u8>,
    #[serde(with = "base64_bytes")]
    pub kubectl_bundle: Vec<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitBundleRevokeRequest {
    pub ids: Vec<String>,
    #[serde(default)]
    pub confirm_impacted_clusters_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InitBundleRevokeResponse {
    pub init_bundle_revocation_errors: Vec<InitBundleRevocationError>,
    pub init_bundle_revoked_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InitBundleRevocationError {
    pub id: String,
    pub error: String,
    pub impacted_clusters: Vec<ImpactedCluster>,
}

/// Protobuf `bytes` fields travel as standard base64 strings.
mod base64_bytes {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        let encoded = Option::<String>::deserialize(d)?.unwrap_or_default();
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}
