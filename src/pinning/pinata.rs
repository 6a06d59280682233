//! Pinata-compatible pinning client (`pinFileToIPFS`).

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::path::Path;
use url::Url;

use super::{PinError, PinnedFile, Pinner};

/// Pins files with a multipart `POST` carrying the file under `file`.
pub struct PinataClient {
    client: reqwest::Client,
    endpoint: Url,
    api_key: String,
    secret_key: String,
}

#[derive(Deserialize)]
struct PinResponse {
    #[serde(rename = "IpfsHash")]
    ipfs_hash: String,
}

impl PinataClient {
    pub fn new(endpoint: Url, api_key: String, secret_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            api_key,
            secret_key,
        }
    }
}

#[async_trait]
impl Pinner for PinataClient {
    async fn pin(&self, path: &Path) -> Result<PinnedFile, PinError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| PinError::Io(path.to_path_buf(), e))?;
        let size = bytes.len() as u64;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "file".to_string());

        let form = Form::new().part("file", Part::bytes(bytes).file_name(file_name));
        let response = self
            .client
            .post(self.endpoint.clone())
            .header("pinata_api_key", &self.api_key)
            .header("pinata_secret_api_key", &self.secret_key)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(PinError::Rejected(format!("{status}: {}", text.trim())));
        }

        let body: PinResponse = response
            .json()
            .await
            .map_err(|e| PinError::InvalidResponse(e.to_string()))?;
        if body.ipfs_hash.is_empty() {
            return Err(PinError::InvalidResponse("empty IpfsHash".into()));
        }

        Ok(PinnedFile {
            cid: body.ipfs_hash,
            size,
        })
    }
}
