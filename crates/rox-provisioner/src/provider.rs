use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use rox_central::BoxFuture;
use rox_core::ProviderConfig;

/// Looks up `ProviderConfig`s by name.
pub trait ProviderConfigStore: Send + Sync {
    fn get<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Option<ProviderConfig>>;
}

/// A fixed set of provider configs, loaded once by the driver.
#[derive(Debug, Default, Clone)]
pub struct StaticProviderConfigs {
    configs: Arc<RwLock<HashMap<String, ProviderConfig>>>,
}

impl StaticProviderConfigs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, name: impl Into<String>, config: ProviderConfig) {
        let mut configs = self.configs.write().unwrap_or_else(PoisonError::into_inner);
        configs.insert(name.into(), config);
    }
}

impl FromIterator<(String, ProviderConfig)> for StaticProviderConfigs {
    fn from_iter<I: IntoIterator<Item = (String, ProviderConfig)>>(iter: I) -> Self {
        Self {
            configs: Arc::new(RwLock::new(iter.into_iter().collect())),
        }
    }
}

impl ProviderConfigStore for StaticProviderConfigs {
    fn get<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Option<ProviderConfig>> {
        Box::pin(async move {
            self.configs
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .get(name)
                .cloned()
        })
    }
}
