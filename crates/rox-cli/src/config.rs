use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rox_core::ProviderConfig;
use serde::{Deserialize, Serialize};

/// Current config version. Bump this when adding fields or changing shape.
/// Each bump requires a corresponding entry in [`migrate`].
pub const CURRENT_VERSION: u32 = 2;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoxConfig {
    /// Schema version. Missing or 0 = pre-versioned config.
    #[serde(default)]
    pub config_version: u32,
    /// Central connection settings by name, referenced from each record's
    /// `providerConfigRef`.
    pub provider_configs: BTreeMap<String, ProviderConfig>,
    /// JSON array of managed resource records, rewritten with status after
    /// every sweep.
    pub resources_path: PathBuf,
    /// Root of secret material: `<dir>/<namespace>/<name>/<key>`.
    #[serde(default)]
    pub secrets_dir: Option<PathBuf>,
    /// Where connection details from creates are written.
    pub connection_details_dir: PathBuf,
    /// PEM bundle trusted in addition to the system roots.
    #[serde(default)]
    pub ca_certificate: Option<PathBuf>,
    /// Added in v1.
    #[serde(default = "default_pass_timeout_secs")]
    pub pass_timeout_secs: u64,
    /// Added in v2.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

fn default_pass_timeout_secs() -> u64 {
    60
}

fn default_concurrency() -> usize {
    4
}

impl RoxConfig {
    pub fn pass_timeout(&self) -> Duration {
        Duration::from_secs(self.pass_timeout_secs)
    }

    /// Resolve relative paths against the directory holding the config file.
    pub fn resolve_paths(&mut self, base: &Path) {
        let resolve = |path: &mut PathBuf| {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        };
        resolve(&mut self.resources_path);
        resolve(&mut self.connection_details_dir);
        if let Some(dir) = self.secrets_dir.as_mut() {
            resolve(dir);
        }
        if let Some(ca) = self.ca_certificate.as_mut() {
            resolve(ca);
        }
    }
}

pub fn default_config_path() -> eyre::Result<PathBuf> {
    let base = dirs::config_dir().ok_or_else(|| eyre::eyre!("no config directory found"))?;
    Ok(base.join("rox-provisioner").join("config.json"))
}

pub fn load_config(path: &Path) -> eyre::Result<RoxConfig> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("failed to read config at {}: {e}", path.display()))?;

    // Parse as raw JSON so we can run migrations before deserializing.
    let json: serde_json::Value = serde_json::from_str(&contents)?;
    let raw_version = json
        .get("config_version")
        .and_then(|v| v.as_u64())
        .unwrap_or(0);
    let on_disk_version = u32::try_from(raw_version)
        .map_err(|_| eyre::eyre!("config_version {raw_version} is out of range"))?;

    let migrated = migrate(json, on_disk_version)?;
    let mut config: RoxConfig = serde_json::from_value(migrated)?;

    if config.concurrency == 0 {
        return Err(eyre::eyre!("concurrency must be at least 1"));
    }
    if let Some(base) = path.parent() {
        config.resolve_paths(base);
    }
    Ok(config)
}

/// Run sequential migrations from `from_version` up to [`CURRENT_VERSION`].
///
/// Each migration is a pure transform on the raw JSON value.
pub fn migrate(mut json: serde_json::Value, from_version: u32) -> eyre::Result<serde_json::Value> {
    if from_version > CURRENT_VERSION {
        return Err(eyre::eyre!(
            "config_version {from_version} is newer than this build supports ({CURRENT_VERSION}). \
             Please update rox-provisioner."
        ));
    }

    let obj = json
        .as_object_mut()
        .ok_or_else(|| eyre::eyre!("config is not a JSON object"))?;

    // v0 → v1: `providers` renamed to `provider_configs`, pass timeout added
    if from_version < 1 {
        if let Some(providers) = obj.remove("providers") {
            obj.entry("provider_configs").or_insert(providers);
        }
        obj.entry("pass_timeout_secs")
            .or_insert(serde_json::Value::Number(default_pass_timeout_secs().into()));
        tracing::info!("migrated config v0 → v1 (provider_configs, pass_timeout_secs)");
    }

    // v1 → v2: bounded concurrency across resources
    if from_version < 2 {
        obj.entry("concurrency")
            .or_insert(serde_json::Value::Number(default_concurrency().into()));
        tracing::info!("migrated config v1 → v2 (added concurrency)");
    }

    obj.insert(
        "config_version".to_string(),
        serde_json::Value::Number(CURRENT_VERSION.into()),
    );

    Ok(json)
}

pub fn save_config(path: &Path, config: &RoxConfig) -> eyre::Result<()> {
    // Always write the current version, regardless of what was loaded.
    let mut stamped = config.clone();
    stamped.config_version = CURRENT_VERSION;

    let json = serde_json::to_vec_pretty(&stamped)?;
    crate::persistence::write_private(path, &json)?;

    tracing::info!(path = %path.display(), "config saved");
    Ok(())
}
