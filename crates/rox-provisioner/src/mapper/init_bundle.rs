use rox_central::types::{self as remote, InitBundleGenRequest, InitBundleGenResponse};
use rox_core::{ImpactedCluster, InitBundleObservation, InitBundleParameters, User};

use crate::diff::{Drift, diff_fields};
use crate::external::ConnectionDetails;

pub const HELM_VALUES_BUNDLE: &str = "helmValuesBundle";
pub const KUBECTL_BUNDLE: &str = "kubectlBundle";

pub fn to_request(params: &InitBundleParameters) -> InitBundleGenRequest {
    InitBundleGenRequest {
        name: params.name.clone(),
    }
}

pub fn to_observation(meta: &remote::InitBundleMeta) -> InitBundleObservation {
    let created_by = meta
        .created_by
        .as_ref()
        .map(|user| User {
            attributes: user
                .attributes
                .iter()
                .map(|attr| (attr.key.clone(), attr.value.clone()))
                .collect(),
            auth_provider_id: user.auth_provider_id.clone(),
            id: user.id.clone(),
        })
        .unwrap_or_default();

    InitBundleObservation {
        created_at: meta.created_at,
        created_by,
        expires_at: meta.expires_at,
        id: meta.id.clone(),
        impacted_clusters: meta
            .impacted_clusters
            .iter()
            .map(|c| ImpactedCluster {
                id: c.id.clone(),
                name: c.name.clone(),
            })
            .collect(),
        name: meta.name.clone(),
    }
}

pub fn to_parameters(observed: &InitBundleObservation) -> InitBundleParameters {
    InitBundleParameters {
        name: observed.name.clone(),
    }
}

pub fn diff(params: &InitBundleParameters, observed: &InitBundleObservation) -> Drift {
    diff_fields(params, &to_parameters(observed))
}

/// The one-time bundle material, keyed for the driver's secret store.
pub fn connection_details(response: &InitBundleGenResponse) -> ConnectionDetails {
    ConnectionDetails::from([
        (HELM_VALUES_BUNDLE.to_string(), response.helm_values_bundle.clone()),
        (KUBECTL_BUNDLE.to_string(), response.kubectl_bundle.clone()),
    ])
}
