use crate::domain::error::{XapiFailure, XenError, XenResult};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    method: &'a str,
    params: &'a [Value],
    id: u64,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    #[serde(default)]
    message: String,
    #[serde(default)]
    data: Option<Value>,
}

impl From<RpcError> for XapiFailure {
    fn from(error: RpcError) -> Self {
        let params = match error.data {
            Some(Value::Array(items)) => items.into_iter().map(value_to_string).collect(),
            Some(Value::Null) | None => Vec::new(),
            Some(other) => vec![value_to_string(other)],
        };
        XapiFailure::new(error.message, params)
    }
}

fn value_to_string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

/// JSON-RPC 2.0 client for the XAPI `/jsonrpc` endpoint.
pub struct JsonRpcClient {
    http: Client,
    endpoint: String,
    next_id: AtomicU64,
}

impl JsonRpcClient {
    pub fn new(host: &str, timeout: Duration) -> XenResult<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| XenError::Connection {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            http,
            endpoint: endpoint_url(host),
            next_id: AtomicU64::new(1),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Invoke `method` and decode its result.
    ///
    /// Transport problems become [`XenError::Connection`]; an `error`
    /// member in the response becomes [`XenError::Api`].
    pub async fn call<T: DeserializeOwned>(&self, method: &str, params: &[Value]) -> XenResult<T> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        debug!("XAPI call {} (id {})", method, id);

        let request = RpcRequest {
            jsonrpc: "2.0",
            method,
            params,
            id,
        };

        let response = self
            .http
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| XenError::Connection {
                message: format!("{} request to {} failed: {}", method, self.endpoint, e),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(XenError::Connection {
                message: format!("{} returned HTTP {}", self.endpoint, status),
            });
        }

        let body: RpcResponse = response.json().await.map_err(|e| XenError::Connection {
            message: format!("Invalid response to {}: {}", method, e),
        })?;

        if let Some(error) = body.error {
            let failure = XapiFailure::from(error);
            debug!("XAPI call {} failed: {}", method, failure);
            return Err(failure.into());
        }

        serde_json::from_value(body.result.unwrap_or(Value::Null)).map_err(|e| XenError::Connection {
            message: format!("Unexpected result for {}: {}", method, e),
        })
    }
}

/// `xen01` -> `http://xen01/jsonrpc`; explicit schemes are kept.
pub fn endpoint_url(host: &str) -> String {
    let host = host.trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        format!("{}/jsonrpc", host)
    } else {
        format!("http://{}/jsonrpc", host)
    }
}
