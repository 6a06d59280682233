//! `[store]`, `[pinning]` and `[strategy]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [store]
//! scheme = "wttp"                              # Address scheme
//! endpoint = "http://127.0.0.1:8545/relay"     # Chunk relay endpoint
//! token_env = "WTTP_RELAY_TOKEN"               # Env var holding the relay bearer token
//! chunk_size = 14576                           # Characters per chunk
//! on_chunk_failure = "continue"                # continue | abort
//!
//! [pinning]
//! endpoint = "https://api.pinata.cloud/pinning/pinFileToIPFS"
//! gateway = "https://gateway.pinata.cloud/ipfs"
//! api_key_env = "PINATA_API_KEY"
//! secret_key_env = "PINATA_SECRET_API_KEY"
//!
//! [strategy]
//! inline_bundles = true                        # false: pin the css/js bundles too
//! ```

use serde::{Deserialize, Serialize};
use url::Url;

use crate::codec::DEFAULT_CHUNK_SIZE;
use crate::config::util::env_secret;
use crate::config::{ConfigDiagnostics, FieldPath};
use crate::publish::FailurePolicy;
use crate::rewrite::address::DEFAULT_SCHEME;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub scheme: String,

    /// Relay accepting `POST <endpoint>/chunks`. Required unless dry-run.
    pub endpoint: Option<String>,

    /// Environment variable holding the relay bearer token (optional).
    pub token_env: String,

    /// Maximum characters per chunk.
    pub chunk_size: usize,

    pub on_chunk_failure: FailurePolicy,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            scheme: DEFAULT_SCHEME.to_string(),
            endpoint: None,
            token_env: "WTTP_RELAY_TOKEN".to_string(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            on_chunk_failure: FailurePolicy::Continue,
        }
    }
}

impl StoreConfig {
    pub const SCHEME: FieldPath = FieldPath::new("store.scheme");
    pub const ENDPOINT: FieldPath = FieldPath::new("store.endpoint");
    pub const CHUNK_SIZE: FieldPath = FieldPath::new("store.chunk_size");

    pub fn token(&self) -> Option<String> {
        env_secret(&self.token_env)
    }

    pub fn validate(&self, dry_run: bool, diag: &mut ConfigDiagnostics) {
        if self.chunk_size == 0 {
            diag.error(Self::CHUNK_SIZE, "must be greater than zero");
        }

        if self.scheme.is_empty() || !self.scheme.bytes().all(|b| b.is_ascii_alphanumeric()) {
            diag.error_with_hint(
                Self::SCHEME,
                format!("`{}` is not a valid address scheme", self.scheme),
                format!("use \"{DEFAULT_SCHEME}\""),
            );
        }

        match (&self.endpoint, dry_run) {
            (Some(endpoint), _) => validate_http_url(Self::ENDPOINT, endpoint, diag),
            (None, false) => diag.error_with_hint(
                Self::ENDPOINT,
                "no store relay endpoint configured",
                "set store.endpoint or pass --dry-run",
            ),
            (None, true) => {}
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PinningConfig {
    /// Multipart upload endpoint.
    pub endpoint: String,

    /// Retrieval prefix; links are `<gateway>/<cid>`.
    pub gateway: String,

    pub api_key_env: String,
    pub secret_key_env: String,
}

impl Default for PinningConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.pinata.cloud/pinning/pinFileToIPFS".to_string(),
            gateway: "https://gateway.pinata.cloud/ipfs".to_string(),
            api_key_env: "PINATA_API_KEY".to_string(),
            secret_key_env: "PINATA_SECRET_API_KEY".to_string(),
        }
    }
}

impl PinningConfig {
    pub const ENDPOINT: FieldPath = FieldPath::new("pinning.endpoint");
    pub const GATEWAY: FieldPath = FieldPath::new("pinning.gateway");
    pub const API_KEY_ENV: FieldPath = FieldPath::new("pinning.api_key_env");
    pub const SECRET_KEY_ENV: FieldPath = FieldPath::new("pinning.secret_key_env");

    /// `(api_key, secret_key)` from the environment.
    pub fn credentials(&self) -> Option<(String, String)> {
        Some((env_secret(&self.api_key_env)?, env_secret(&self.secret_key_env)?))
    }

    pub fn validate(&self, dry_run: bool, diag: &mut ConfigDiagnostics) {
        validate_http_url(Self::GATEWAY, &self.gateway, diag);
        if dry_run {
            return;
        }

        validate_http_url(Self::ENDPOINT, &self.endpoint, diag);
        for (field, var) in [
            (Self::API_KEY_ENV, &self.api_key_env),
            (Self::SECRET_KEY_ENV, &self.secret_key_env),
        ] {
            if env_secret(var).is_none() {
                diag.error_with_hint(
                    field,
                    format!("environment variable `{var}` is not set"),
                    "export it or add it to .env",
                );
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    /// Store the style and script bundles inline instead of pinning them.
    pub inline_bundles: bool,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            inline_bundles: true,
        }
    }
}

fn validate_http_url(field: FieldPath, value: &str, diag: &mut ConfigDiagnostics) {
    match Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        Ok(url) => diag.error(
            field,
            format!("`{value}` uses unsupported scheme `{}`", url.scheme()),
        ),
        Err(err) => diag.error(field, format!("`{value}` is not a valid URL: {err}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;

    #[test]
    fn test_store_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.store.scheme, "wttp");
        assert_eq!(config.store.chunk_size, 14_576);
        assert_eq!(config.store.on_chunk_failure, FailurePolicy::Continue);
        assert!(config.store.endpoint.is_none());
        assert!(config.strategy.inline_bundles);
        assert_eq!(config.pinning.gateway, "https://gateway.pinata.cloud/ipfs");
    }

    #[test]
    fn test_failure_policy_parse() {
        let config = test_parse_config("[store]\non_chunk_failure = \"abort\"");
        assert_eq!(config.store.on_chunk_failure, FailurePolicy::Abort);
    }

    #[test]
    fn test_invalid_failure_policy_rejected() {
        let content = "[store]\non_chunk_failure = \"retry\"";
        assert!(toml::from_str::<crate::config::PublishConfig>(content).is_err());
    }

    #[test]
    fn test_store_validation_collects_errors() {
        let config = test_parse_config("[store]\nchunk_size = 0\nscheme = \"wt tp\"");
        let mut diag = ConfigDiagnostics::new();
        config.store.validate(false, &mut diag);
        // chunk size, scheme, missing endpoint
        assert_eq!(diag.len(), 3);
    }

    #[test]
    fn test_endpoint_optional_in_dry_run() {
        let config = test_parse_config("");
        let mut diag = ConfigDiagnostics::new();
        config.store.validate(true, &mut diag);
        assert!(diag.is_empty());
    }

    #[test]
    fn test_endpoint_must_be_http() {
        let config = test_parse_config("[store]\nendpoint = \"ftp://relay\"");
        let mut diag = ConfigDiagnostics::new();
        config.store.validate(true, &mut diag);
        assert_eq!(diag.len(), 1);
        assert_eq!(diag.errors()[0].field, StoreConfig::ENDPOINT);
    }

    #[test]
    fn test_pinning_dry_run_skips_credentials() {
        let config = test_parse_config(
            "[pinning]\napi_key_env = \"WTTP_TEST_UNSET_KEY\"\nsecret_key_env = \"WTTP_TEST_UNSET_SECRET\"",
        );
        let mut diag = ConfigDiagnostics::new();
        config.pinning.validate(true, &mut diag);
        assert!(diag.is_empty());

        config.pinning.validate(false, &mut diag);
        assert_eq!(diag.len(), 2);
        assert!(config.pinning.credentials().is_none());
    }
}
