//! Remote collaborators of a run: the resource store and the pinner.

use anyhow::{Context, Result, anyhow};
use std::sync::Arc;
use url::Url;

use crate::config::{PinningConfig, PublishConfig};
use crate::log;
use crate::pinning::{HashPinner, PinataClient, Pinner};
use crate::store::{HttpStore, MemoryStore, ResourceStore};

pub struct Services {
    pub store: Arc<dyn ResourceStore>,
    pub pinner: Arc<dyn Pinner>,
    /// The offline store, kept readable for the dry-run summary.
    pub preview: Option<Arc<MemoryStore>>,
}

impl Services {
    pub fn new(store: Arc<dyn ResourceStore>, pinner: Arc<dyn Pinner>) -> Self {
        Self {
            store,
            pinner,
            preview: None,
        }
    }

    /// In-memory store and content-hash pinner.
    pub fn offline() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            store: store.clone(),
            pinner: Arc::new(HashPinner),
            preview: Some(store),
        }
    }

    /// Clients for the configured relay and pinning service, bound to the
    /// store at `address`. Dry runs get [`Services::offline`].
    pub fn connect(config: &PublishConfig, address: &str) -> Result<Self> {
        if config.dry_run {
            log!("dry-run"; "using in-memory store and local content hashes");
            return Ok(Self::offline());
        }

        let endpoint = config
            .store
            .endpoint
            .as_deref()
            .ok_or_else(|| anyhow!("`store.endpoint` is not configured"))?;
        let endpoint = Url::parse(endpoint)
            .with_context(|| format!("Invalid store endpoint `{endpoint}`"))?;
        let store = HttpStore::new(endpoint, address, config.store.token());

        let services = Self::new(Arc::new(store), Arc::new(pinata(&config.pinning)?));
        log!("store"; "{}", services.store.describe());
        Ok(services)
    }
}

fn pinata(config: &PinningConfig) -> Result<PinataClient> {
    let (api_key, secret_key) = config.credentials().ok_or_else(|| {
        anyhow!(
            "pinning credentials missing: set `{}` and `{}`",
            config.api_key_env,
            config.secret_key_env
        )
    })?;
    let endpoint = Url::parse(&config.endpoint)
        .with_context(|| format!("Invalid pinning endpoint `{}`", config.endpoint))?;
    Ok(PinataClient::new(endpoint, api_key, secret_key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;

    #[test]
    fn test_dry_run_is_offline() {
        let mut config = test_parse_config("");
        config.dry_run = true;
        let services = Services::connect(&config, "0xabc").unwrap();
        assert_eq!(services.store.describe(), MemoryStore::new().describe());
        assert!(services.preview.is_some());
    }

    #[test]
    fn test_missing_endpoint() {
        let config = test_parse_config("");
        let err = Services::connect(&config, "0xabc").err().unwrap();
        assert!(err.to_string().contains("store.endpoint"));
    }

    #[test]
    fn test_missing_credentials() {
        let config = test_parse_config(
            "[store]\nendpoint = \"http://127.0.0.1:8545/relay\"\n[pinning]\napi_key_env = \"WTTP_TEST_UNSET_KEY\"\nsecret_key_env = \"WTTP_TEST_UNSET_SECRET\"",
        );
        let err = Services::connect(&config, "0xabc").err().unwrap();
        assert!(err.to_string().contains("WTTP_TEST_UNSET_KEY"));
    }
}
