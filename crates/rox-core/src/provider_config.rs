use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Connection settings for one Central instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    /// `host:port` of the Central API, e.g. "central.stackrox:443".
    pub endpoint: String,
    pub credentials: CredentialsSource,
}

/// Where the API token for a provider config comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "PascalCase")]
pub enum CredentialsSource {
    None,
    Secret {
        #[serde(rename = "secretRef")]
        secret_ref: SecretKeySelector,
    },
    Environment {
        env: EnvSelector,
    },
    Filesystem {
        fs: FsSelector,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SecretKeySelector {
    pub namespace: String,
    pub name: String,
    pub key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvSelector {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FsSelector {
    pub path: PathBuf,
}
