use reqwest::blocking::Client;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};
use serde_json::{Value, json};

use crate::domain::ObjectRef;
use crate::error::ReadsError;

/// The parts of a workspace object info tuple the converter needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectInfo {
    pub reference: ObjectRef,
    pub name: String,
    pub type_string: String,
}

#[derive(Debug, Clone)]
pub struct WorkspaceObject {
    pub info: ObjectInfo,
    pub data: Value,
}

pub trait WorkspaceClient: Send + Sync {
    /// Fetches objects by `workspace/name` reference, in request order.
    fn get_objects(
        &self,
        refs: &[String],
        token: &str,
    ) -> Result<Vec<WorkspaceObject>, ReadsError>;
}

impl<T: WorkspaceClient + ?Sized> WorkspaceClient for &T {
    fn get_objects(
        &self,
        refs: &[String],
        token: &str,
    ) -> Result<Vec<WorkspaceObject>, ReadsError> {
        (**self).get_objects(refs, token)
    }
}

#[derive(Clone)]
pub struct WorkspaceHttpClient {
    client: Client,
    url: String,
}

impl WorkspaceHttpClient {
    pub fn new(url: impl Into<String>) -> Result<Self, ReadsError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("reads-to-fastq/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| ReadsError::WorkspaceHttp(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|err| ReadsError::WorkspaceHttp(err.to_string()))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    fn call(&self, method: &str, params: Value, token: &str) -> Result<Value, ReadsError> {
        let body = json!({
            "method": method,
            "params": params,
            "version": "1.1",
            "id": std::process::id().to_string(),
        });
        let response = self
            .client
            .post(&self.url)
            .header(AUTHORIZATION, token)
            .json(&body)
            .send()
            .map_err(|err| ReadsError::WorkspaceHttp(err.to_string()))?;
        let status = response.status();
        let text = response
            .text()
            .map_err(|err| ReadsError::WorkspaceHttp(err.to_string()))?;
        let payload: Option<Value> = serde_json::from_str(&text).ok();

        if let Some(error) = payload.as_ref().and_then(rpc_error) {
            return Err(error);
        }
        if !status.is_success() {
            return Err(ReadsError::WorkspaceStatus {
                status: status.as_u16(),
                message: text,
            });
        }
        payload
            .and_then(|mut value| value.get_mut("result").map(Value::take))
            .ok_or_else(|| ReadsError::WorkspaceHttp("response has no result".to_string()))
    }
}

/// Extracts a JSON-RPC error object, logging the server-side detail.
fn rpc_error(payload: &Value) -> Option<ReadsError> {
    let error = payload.get("error").filter(|value| value.is_object())?;
    let name = error
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or("JSONRPCError")
        .to_string();
    let message = error
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("unknown workspace error")
        .to_string();
    if let Some(detail) = error.get("error").and_then(Value::as_str) {
        tracing::error!(%name, "workspace error detail:\n{detail}");
    }
    Some(ReadsError::WorkspaceRpc { name, message })
}

pub fn parse_object_info(info: &Value) -> Result<ObjectInfo, ReadsError> {
    let malformed = || ReadsError::WorkspaceHttp(format!("malformed object info: {info}"));
    let fields = info.as_array().ok_or_else(malformed)?;
    let number = |index: usize| fields.get(index).and_then(Value::as_u64).ok_or_else(malformed);
    let text = |index: usize| {
        fields
            .get(index)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(malformed)
    };
    Ok(ObjectInfo {
        reference: ObjectRef {
            workspace_id: number(6)?,
            object_id: number(0)?,
            version: number(4)?,
        },
        name: text(1)?,
        type_string: text(2)?,
    })
}

impl WorkspaceClient for WorkspaceHttpClient {
    fn get_objects(
        &self,
        refs: &[String],
        token: &str,
    ) -> Result<Vec<WorkspaceObject>, ReadsError> {
        let ids = refs
            .iter()
            .map(|reference| json!({ "ref": reference }))
            .collect::<Vec<_>>();
        let result = self.call("Workspace.get_objects", json!([ids]), token)?;
        let objects = result
            .get(0)
            .and_then(Value::as_array)
            .ok_or_else(|| ReadsError::WorkspaceHttp("unexpected get_objects result".to_string()))?;

        objects
            .iter()
            .map(|object| {
                let info = parse_object_info(object.get("info").unwrap_or(&Value::Null))?;
                let data = object.get("data").cloned().unwrap_or(Value::Null);
                Ok(WorkspaceObject { info, data })
            })
            .collect()
    }
}
