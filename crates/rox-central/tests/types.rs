use rox_central::rest::error_message;
use rox_central::types::{Cluster, InitBundleGenResponse, InitBundleMeta};
use serde_json::json;

#[test]
fn cluster_enums_decode_from_names_or_codes() {
    let by_name: Cluster = serde_json::from_value(json!({
        "id": "c-1",
        "name": "prod",
        "type": "OPENSHIFT4_CLUSTER",
        "collectionMethod": "CORE_BPF",
        "managedBy": "MANAGER_TYPE_HELM_CHART",
    }))
    .unwrap();
    assert_eq!(by_name.r#type, 5);
    assert_eq!(by_name.collection_method, 4);
    assert_eq!(by_name.managed_by, 2);

    let by_code: Cluster = serde_json::from_value(json!({
        "name": "prod",
        "type": 1,
        "collectionMethod": 3,
    }))
    .unwrap();
    assert_eq!(by_code.r#type, 1);
    assert_eq!(by_code.collection_method, 3);
    assert_eq!(by_code.managed_by, 0);
}

#[test]
fn unknown_enum_name_decodes_to_unknown_code() {
    let cluster: Cluster = serde_json::from_value(json!({
        "name": "prod",
        "type": "SWARM_CLUSTER",
    }))
    .unwrap();
    assert_eq!(cluster.r#type, -1);
}

#[test]
fn unmodelled_cluster_fields_survive_a_round_trip() {
    let cluster: Cluster = serde_json::from_value(json!({
        "id": "c-1",
        "name": "prod",
        "healthStatus": {"overallHealthStatus": "HEALTHY"},
        "helmConfig": null,
    }))
    .unwrap();
    assert!(cluster.extra.contains_key("healthStatus"));

    let back = serde_json::to_value(&cluster).unwrap();
    assert_eq!(back["healthStatus"]["overallHealthStatus"], "HEALTHY");
    assert_eq!(back["id"], "c-1");
}

#[test]
fn tolerations_and_sensor_are_read() {
    let cluster: Cluster = serde_json::from_value(json!({
        "name": "prod",
        "tolerationsConfig": {"disabled": true},
        "mostRecentSensorId": {"appNamespace": "stackrox", "k8sNodeName": "node-1"},
    }))
    .unwrap();
    assert!(cluster.tolerations_config.unwrap().disabled);
    let sensor = cluster.most_recent_sensor_id.unwrap();
    assert_eq!(sensor.app_namespace, "stackrox");
    assert_eq!(sensor.k8s_node_name, "node-1");
}

#[test]
fn init_bundle_meta_parses_timestamps() {
    let meta: InitBundleMeta = serde_json::from_value(json!({
        "id": "b-1",
        "name": "prod-bundle",
        "createdAt": "2024-03-01T10:00:00Z",
        "expiresAt": "2025-03-01T10:00:00.5Z",
        "createdBy": {
            "id": "sso:admin",
            "authProviderId": "sso",
            "attributes": [{"key": "role", "value": "Admin"}],
        },
        "impactedClusters": [{"id": "c-1", "name": "prod"}],
    }))
    .unwrap();
    assert_eq!(meta.created_at.unwrap().as_second(), 1_709_287_200);
    assert!(meta.expires_at.is_some());
    assert_eq!(meta.created_by.unwrap().attributes[0].value, "Admin");
    assert_eq!(meta.impacted_clusters.len(), 1);
}

#[test]
fn generated_bundles_are_base64_decoded() {
    let resp: InitBundleGenResponse = serde_json::from_value(json!({
        "meta": {"id": "b-1", "name": "prod-bundle"},
        "helmValuesBundle": "aGVsbQ==",
        "kubectlBundle": "a3ViZWN0bA==",
    }))
    .unwrap();
    assert_eq!(resp.helm_values_bundle, b"helm");
    assert_eq!(resp.kubectl_bundle, b"kubectl");
}

#[test]
fn error_message_prefers_gateway_message() {
    assert_eq!(
        error_message(br#"{"code":5,"message":"cluster not found"}"#),
        "cluster not found"
    );
    assert_eq!(error_message(br#"{"error":"boom","message":""}"#), "boom");
    assert_eq!(error_message(b"  plain text  "), "plain text");
}
