use std::fs::File;
use std::path::Path;
use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ReadsError;

/// Pointer to a blob store node, as embedded in reads objects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Handle {
    pub id: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub file_name: Option<String>,
}

pub trait BlobStoreClient: Send + Sync {
    /// The file name the blob store recorded for the node.
    fn node_file_name(&self, handle: &Handle, token: &str) -> Result<String, ReadsError>;
    fn download(&self, handle: &Handle, token: &str, destination: &Path) -> Result<(), ReadsError>;
}

impl<T: BlobStoreClient + ?Sized> BlobStoreClient for &T {
    fn node_file_name(&self, handle: &Handle, token: &str) -> Result<String, ReadsError> {
        (**self).node_file_name(handle, token)
    }

    fn download(&self, handle: &Handle, token: &str, destination: &Path) -> Result<(), ReadsError> {
        (**self).download(handle, token, destination)
    }
}

#[derive(Clone)]
pub struct ShockHttpClient {
    client: Client,
    default_url: Option<String>,
}

impl ShockHttpClient {
    pub fn new(default_url: Option<String>) -> Result<Self, ReadsError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("reads-to-fastq/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| ReadsError::BlobStoreHttp(err.to_string()))?,
        );
        // Reads files can be large; transfers run until the server closes.
        let client = Client::builder()
            .default_headers(headers)
            .timeout(None::<Duration>)
            .build()
            .map_err(|err| ReadsError::BlobStoreHttp(err.to_string()))?;
        Ok(Self {
            client,
            default_url,
        })
    }

    fn node_url(&self, handle: &Handle) -> Result<String, ReadsError> {
        let base = Some(handle.url.as_str())
            .filter(|url| !url.is_empty())
            .or(self.default_url.as_deref())
            .ok_or_else(|| {
                ReadsError::BlobStoreHttp(format!("handle {} has no blob store URL", handle.id))
            })?;
        Ok(format!("{}/node/{}", base.trim_end_matches('/'), handle.id))
    }

    fn authorized(&self, request: RequestBuilder, token: &str) -> RequestBuilder {
        request.header(AUTHORIZATION, format!("OAuth {token}"))
    }

    fn send(&self, request: RequestBuilder) -> Result<Response, ReadsError> {
        let response = request
            .send()
            .map_err(|err| ReadsError::BlobStoreHttp(err.to_string()))?;
        check_response(response)
    }
}

/// Surfaces the first entry of the node's `error` list, or the bare HTTP
/// status when the body is not a structured error.
pub fn check_response(response: Response) -> Result<Response, ReadsError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response.text().unwrap_or_default();
    let message = structured_error(&body).unwrap_or_else(|| status.to_string());
    Err(ReadsError::BlobStoreStatus {
        status: status.as_u16(),
        message,
    })
}

pub fn structured_error(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let first = value.get("error")?.as_array()?.first()?;
    match first {
        Value::String(text) => Some(text.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

impl BlobStoreClient for ShockHttpClient {
    fn node_file_name(&self, handle: &Handle, token: &str) -> Result<String, ReadsError> {
        let url = self.node_url(handle)?;
        let response = self.send(self.authorized(self.client.get(&url), token))?;
        let body: Value = response
            .json()
            .map_err(|err| ReadsError::BlobStoreHttp(err.to_string()))?;
        Ok(body
            .get("data")
            .and_then(|value| value.get("file"))
            .and_then(|value| value.get("name"))
            .and_then(|value| value.as_str())
            .unwrap_or_default()
            .to_string())
    }

    fn download(&self, handle: &Handle, token: &str, destination: &Path) -> Result<(), ReadsError> {
        let url = self.node_url(handle)?;
        let request = self.client.get(&url).query(&[("download", "")]);
        let mut response = self.send(self.authorized(request, token))?;
        let mut file = File::create(destination).map_err(|err| {
            ReadsError::Filesystem(format!("create {}: {err}", destination.display()))
        })?;
        std::io::copy(&mut response, &mut file)
            .map_err(|err| ReadsError::BlobStoreHttp(err.to_string()))?;
        Ok(())
    }
}
