use std::collections::HashSet;
use std::path::{Path, PathBuf};

use rox_core::ManagedResource;
use rox_provisioner::ConnectionDetails;

/// Write `bytes` to `path` atomically (tmp + rename), readable by the owner
/// only on unix.
pub fn write_private(path: &Path, bytes: &[u8]) -> eyre::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);
    std::fs::write(&tmp_path, bytes)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&tmp_path, std::fs::Permissions::from_mode(0o600))?;
    }

    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

/// The managed resource records, kept as one JSON array on local disk.
pub struct ResourceStore {
    path: PathBuf,
}

impl ResourceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load and validate every record. A missing file is an empty store.
    pub fn load(&self) -> eyre::Result<Vec<ManagedResource>> {
        if !self.path.exists() {
            tracing::debug!(path = %self.path.display(), "no resource file, starting empty");
            return Ok(Vec::new());
        }
        let raw = std::fs::read_to_string(&self.path)
            .map_err(|e| eyre::eyre!("failed to read {}: {e}", self.path.display()))?;
        let records = ManagedResource::parse_all(&raw)
            .map_err(|e| eyre::eyre!("invalid resource file {}: {e}", self.path.display()))?;

        let mut seen = HashSet::new();
        for record in &records {
            if !seen.insert(record.meta().name.as_str()) {
                return Err(eyre::eyre!(
                    "duplicate resource name {} in {}",
                    record.meta().name,
                    self.path.display()
                ));
            }
        }
        tracing::debug!(path = %self.path.display(), count = records.len(), "resources loaded");
        Ok(records)
    }

    pub fn flush(&self, records: &[ManagedResource]) -> eyre::Result<()> {
        let json = serde_json::to_vec_pretty(records)?;
        write_private(&self.path, &json)?;
        tracing::debug!(path = %self.path.display(), count = records.len(), "resources flushed");
        Ok(())
    }
}

/// Store connection details as `<dir>/<resource>/<key>`, one file per key.
pub fn write_connection_details(
    dir: &Path,
    resource: &str,
    details: &ConnectionDetails,
) -> eyre::Result<()> {
    if details.is_empty() {
        return Ok(());
    }
    check_component(resource)?;
    let target = dir.join(resource);
    for (key, value) in details {
        check_component(key)?;
        write_private(&target.join(key), value)?;
    }
    tracing::info!(
        resource,
        dir = %target.display(),
        keys = details.len(),
        "connection details written"
    );
    Ok(())
}

/// Reject names that would land outside the directory they are joined to.
fn check_component(part: &str) -> eyre::Result<()> {
    if part.is_empty() || part.contains(['/', '\\']) || part == "." || part == ".." {
        return Err(eyre::eyre!("invalid path component {part:?}"));
    }
    Ok(())
}
