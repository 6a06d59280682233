//! HTTP relay client for the resource store.
//!
//! The relay owns the publishing identity and turns each request into one
//! signed `setResourceChunk` transaction, answering once it is mined:
//!
//! ```text
//! POST <endpoint>/chunks
//! { "address": "0x…", "path": "/logo.png", "payload": "0x7b22…",
//!   "contentType": "ipfs", "index": 0, "flag": 0 }
//!
//! 200 OK
//! { "transactionHash": "0xabc…" }
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

use super::{ResourceStore, StoreError};
use crate::codec::Chunk;

/// Resource store reached through an HTTP relay.
pub struct HttpStore {
    client: reqwest::Client,
    endpoint: Url,
    address: String,
    token: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ChunkRequest<'a> {
    address: &'a str,
    path: &'a str,
    payload: &'a str,
    content_type: &'a str,
    index: usize,
    flag: u8,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChunkResponse {
    transaction_hash: String,
}

impl HttpStore {
    pub fn new(endpoint: Url, address: impl Into<String>, token: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            address: address.into(),
            token,
        }
    }

    fn chunks_url(&self) -> String {
        format!("{}/chunks", self.endpoint.as_str().trim_end_matches('/'))
    }
}

#[async_trait]
impl ResourceStore for HttpStore {
    async fn set_chunk(&self, chunk: &Chunk) -> Result<String, StoreError> {
        let body = ChunkRequest {
            address: &self.address,
            path: &chunk.resource_path,
            payload: &chunk.payload,
            content_type: &chunk.content_type,
            index: chunk.index,
            flag: chunk.flag,
        };

        let mut request = self.client.post(self.chunks_url()).json(&body);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(StoreError::Rejected(format!("{status}: {}", text.trim())));
        }

        let receipt: ChunkResponse = response
            .json()
            .await
            .map_err(|e| StoreError::InvalidResponse(e.to_string()))?;
        if receipt.transaction_hash.is_empty() {
            return Err(StoreError::InvalidResponse("empty transaction hash".into()));
        }
        Ok(receipt.transaction_hash)
    }

    fn describe(&self) -> String {
        format!("{} via {}", self.address, self.endpoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunks_url_joins_once() {
        let store = HttpStore::new(
            Url::parse("http://127.0.0.1:8545/relay/").unwrap(),
            "0xSTORE",
            None,
        );
        assert_eq!(store.chunks_url(), "http://127.0.0.1:8545/relay/chunks");
    }

    #[test]
    fn test_request_body_shape() {
        let body = ChunkRequest {
            address: "0xSTORE",
            path: "/logo.png",
            payload: "0x7b7d",
            content_type: "ipfs",
            index: 2,
            flag: 0,
        };
        let json = serde_json::to_string(&body).unwrap();
        assert_eq!(
            json,
            r#"{"address":"0xSTORE","path":"/logo.png","payload":"0x7b7d","contentType":"ipfs","index":2,"flag":0}"#
        );
    }

    #[test]
    fn test_response_parse() {
        let receipt: ChunkResponse =
            serde_json::from_str(r#"{"transactionHash":"0xabc","blockNumber":7}"#).unwrap();
        assert_eq!(receipt.transaction_hash, "0xabc");
    }
}
