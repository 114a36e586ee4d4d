//! Client for a Kubo-compatible RPC API (`/api/v0/*`).
//!
//! Every RPC is a POST. Errors come back as non-2xx with a JSON body such as
//! `{"Message": "...", "Code": 0, "Type": "error"}`; the body is kept verbatim.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use cas::ContentId;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::{BackendError, PinnedObject, StorageBackend};

#[derive(Debug, Deserialize)]
struct AddResponse {
    #[serde(rename = "Hash")]
    hash: String,
}

#[derive(Debug, Deserialize)]
struct PinLsResponse {
    #[serde(rename = "Keys", default)]
    keys: HashMap<String, PinInfo>,
}

#[derive(Debug, Deserialize)]
struct PinInfo {
    #[serde(rename = "Type")]
    pin_type: String,
}

#[derive(Debug, Deserialize)]
struct VersionResponse {
    #[serde(rename = "Version")]
    version: String,
}

#[derive(Debug, Clone)]
pub struct KuboBackend {
    client: Client,
    api_url: String,
}

impl KuboBackend {
    /// `api_url` is the node's RPC base, e.g. `http://127.0.0.1:5001`.
    pub fn new(api_url: &str, timeout: Duration) -> Result<Self, BackendError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &gateconf::BackendConfig) -> Result<Self, BackendError> {
        Self::new(&config.api_url, Duration::from_millis(config.timeout_ms))
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn endpoint(&self, rpc: &str) -> String {
        format!("{}/api/v0/{}", self.api_url, rpc)
    }

    async fn check(response: Response) -> Result<Response, BackendError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(BackendError::Status {
            status: status.as_u16(),
            body,
        })
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, BackendError> {
        let bytes = Self::check(response).await?.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| BackendError::Decode(e.to_string()))
    }
}

#[async_trait]
impl StorageBackend for KuboBackend {
    async fn add(&self, payload: Bytes) -> Result<ContentId, BackendError> {
        let size = payload.len();
        let part = Part::stream_with_length(payload, size as u64).file_name("file");
        let form = Form::new().part("file", part);

        let response = self
            .client
            .post(self.endpoint("add"))
            .query(&[("pin", "true")])
            .multipart(form)
            .send()
            .await?;

        let added: AddResponse = Self::decode(response).await?;
        let id = ContentId::new(added.hash)
            .map_err(|e| BackendError::Decode(format!("add response: {}", e)))?;
        tracing::debug!(cid = %id, size, "added to backend");
        Ok(id)
    }

    async fn fetch(&self, id: &ContentId) -> Result<Bytes, BackendError> {
        let response = self
            .client
            .post(self.endpoint("cat"))
            .query(&[("arg", id.as_str())])
            .send()
            .await?;

        Ok(Self::check(response).await?.bytes().await?)
    }

    async fn list_pinned(&self) -> Result<Vec<PinnedObject>, BackendError> {
        let response = self
            .client
            .post(self.endpoint("pin/ls"))
            .query(&[("type", "recursive")])
            .send()
            .await?;

        let listed: PinLsResponse = Self::decode(response).await?;
        listed
            .keys
            .into_iter()
            .map(|(cid, info)| {
                let id = ContentId::new(cid)
                    .map_err(|e| BackendError::Decode(format!("pin/ls response: {}", e)))?;
                Ok(PinnedObject {
                    id,
                    pin_type: info.pin_type,
                })
            })
            .collect()
    }

    async fn version(&self) -> Result<String, BackendError> {
        let response = self.client.post(self.endpoint("version")).send().await?;
        let v: VersionResponse = Self::decode(response).await?;
        Ok(v.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let kubo = KuboBackend::new("http://node:5001/", Duration::from_secs(1)).unwrap();
        assert_eq!(kubo.api_url(), "http://node:5001");
        assert_eq!(kubo.endpoint("pin/ls"), "http://node:5001/api/v0/pin/ls");
    }

    #[test]
    fn test_pin_ls_decodes_missing_keys_as_empty() {
        let listed: PinLsResponse = serde_json::from_str("{}").unwrap();
        assert!(listed.keys.is_empty());
    }

    #[test]
    fn test_add_response_ignores_extra_fields() {
        let added: AddResponse =
            serde_json::from_str(r#"{"Name":"file","Hash":"QmAbc","Size":"12"}"#).unwrap();
        assert_eq!(added.hash, "QmAbc");
    }
}
