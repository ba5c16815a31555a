use rox_central::enums::{CLUSTER_TYPE, COLLECTION_METHOD, MANAGER_TYPE};
use rox_central::types::{self as remote, TolerationsConfig};
use rox_core::{ClusterObservation, ClusterParameters, SensorDeployment};

use super::{code_for, default_label, label_for};
use crate::diff::{Drift, diff_fields};

/// Build the request body for a create (`base = None`) or a full replace.
///
/// On replace every field the record declares overwrites `base`; identifiers,
/// sensor metadata and fields this provider does not model are kept as
/// Central sent them.
pub fn to_remote(params: &ClusterParameters, base: Option<remote::Cluster>) -> remote::Cluster {
    let mut cluster = base.unwrap_or_default();

    cluster.name = params.name.clone();
    cluster.r#type = code_for(&CLUSTER_TYPE, &params.r#type);
    cluster.labels = params.labels.clone();
    cluster.main_image = params.main_image.clone();
    cluster.collector_image = params.collector_image.clone();
    cluster.central_api_endpoint = params.central_api_endpoint.clone();
    cluster.collection_method = code_for(&COLLECTION_METHOD, &params.collection_method);
    cluster.admission_controller = params.admission_controller;
    cluster.admission_controller_updates = params.admission_controller_updates;
    cluster.admission_controller_events = params.admission_controller_events;
    cluster.slim_collector = params.slim_collector;
    // Central stores the inverse of the user-facing toggle.
    cluster.tolerations_config = Some(TolerationsConfig {
        disabled: !params.tolerations,
    });

    cluster
}

pub fn to_observation(cluster: &remote::Cluster) -> ClusterObservation {
    let sensor = cluster.most_recent_sensor_id.clone().unwrap_or_default();

    ClusterObservation {
        admission_controller: cluster.admission_controller,
        admission_controller_events: cluster.admission_controller_events,
        admission_controller_updates: cluster.admission_controller_updates,
        central_api_endpoint: cluster.central_api_endpoint.clone(),
        collection_method: label_for(&COLLECTION_METHOD, cluster.collection_method),
        collector_image: cluster.collector_image.clone(),
        id: cluster.id.clone(),
        init_bundle_id: cluster.init_bundle_id.clone(),
        labels: cluster.labels.clone(),
        main_image: cluster.main_image.clone(),
        managed_by: label_for(&MANAGER_TYPE, cluster.managed_by),
        most_recent_sensor: SensorDeployment {
            app_namespace: sensor.app_namespace,
            app_namespace_id: sensor.app_namespace_id,
            app_service_account_id: sensor.app_serviceaccount_id,
            default_namespace_id: sensor.default_namespace_id,
            k8s_node_name: sensor.k8s_node_name,
            system_namespace_id: sensor.system_namespace_id,
        },
        name: cluster.name.clone(),
        slim_collector: cluster.slim_collector,
        // A missing config means Central applies its default: tolerations on.
        tolerations: !cluster
            .tolerations_config
            .as_ref()
            .is_some_and(|config| config.disabled),
        r#type: label_for(&CLUSTER_TYPE, cluster.r#type),
    }
}

/// The parameter view of an observation, for comparison with the record.
pub fn to_parameters(observed: &ClusterObservation) -> ClusterParameters {
    ClusterParameters {
        admission_controller: observed.admission_controller,
        admission_controller_events: observed.admission_controller_events,
        admission_controller_updates: observed.admission_controller_updates,
        central_api_endpoint: observed.central_api_endpoint.clone(),
        collection_method: observed.collection_method.clone(),
        collector_image: observed.collector_image.clone(),
        labels: observed.labels.clone(),
        main_image: observed.main_image.clone(),
        name: observed.name.clone(),
        slim_collector: observed.slim_collector,
        tolerations: observed.tolerations,
        r#type: observed.r#type.clone(),
    }
}

/// Drift between the record's parameters and what Central holds.
pub fn diff(params: &ClusterParameters, observed: &ClusterObservation) -> Drift {
    let mut desired = params.clone();
    if desired.r#type.is_empty() {
        desired.r#type = default_label(&CLUSTER_TYPE);
    }
    if desired.collection_method.is_empty() {
        desired.collection_method = default_label(&COLLECTION_METHOD);
    }
    diff_fields(&desired, &to_parameters(observed))
}
