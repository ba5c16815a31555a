use std::path::PathBuf;

use rox_central::BoxFuture;
use rox_core::SecretKeySelector;
use rox_provisioner::SecretStore;
use rox_provisioner::credentials::CredentialSourceUnavailable;

/// Secrets laid out on disk as `<root>/<namespace>/<name>/<key>`, the way a
/// mounted secret volume looks.
#[derive(Debug, Clone)]
pub struct FileSecretStore {
    root: PathBuf,
}

impl FileSecretStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_of(&self, selector: &SecretKeySelector) -> Result<PathBuf, CredentialSourceUnavailable> {
        for part in [&selector.namespace, &selector.name, &selector.key] {
            if part.is_empty() || part.contains(['/', '\\']) || part == ".." || part == "." {
                return Err(CredentialSourceUnavailable(format!(
                    "invalid secret reference component {part:?}"
                )));
            }
        }
        Ok(self
            .root
            .join(&selector.namespace)
            .join(&selector.name)
            .join(&selector.key))
    }
}

impl SecretStore for FileSecretStore {
    fn get<'a>(
        &'a self,
        selector: &'a SecretKeySelector,
    ) -> BoxFuture<'a, Result<Vec<u8>, CredentialSourceUnavailable>> {
        Box::pin(async move {
            let path = self.path_of(selector)?;
            tokio::fs::read(&path)
                .await
                .map_err(|e| CredentialSourceUnavailable(format!("{}: {e}", path.display())))
        })
    }
}
