//! Builds authenticated requests and decodes responses for the registry API.
//!
//! # Design
//! `RequestExecutor` holds the immutable `ClientConfig` and a shared
//! `Transport`, and carries no mutable state between calls. Every call is
//! split the same way:
//!
//! - `build` produces an `HttpRequest` (pure),
//! - the transport performs the round-trip (the only I/O),
//! - `parse` turns the `HttpResponse` into a JSON object or an `ApiError` (pure).
//!
//! `execute` chains the three. `build` and `parse` stay public so a host that
//! does its own I/O can drive them directly.

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::classify::classify_response;
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, QueryValue, Transport};

/// A decoded JSON object response.
pub type JsonObject = Map<String, Value>;

#[derive(Clone)]
pub struct RequestExecutor {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
}

impl RequestExecutor {
    /// Executor backed by a blocking `ureq` transport.
    #[cfg(feature = "ureq")]
    pub fn new(config: ClientConfig) -> Self {
        Self::with_transport(config, crate::http::UreqTransport::new())
    }

    pub fn with_transport<T>(config: ClientConfig, transport: T) -> Self
    where
        T: Transport + 'static,
    {
        Self {
            config,
            transport: Arc::new(transport),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Absolute URL for an API-relative `path`. Leading slashes on `path` are
    /// dropped so the join always has exactly one separator.
    pub fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url(), path.trim_start_matches('/'))
    }

    pub fn build(
        &self,
        method: HttpMethod,
        path: &str,
        query: &[(&str, QueryValue)],
        body: Option<&Value>,
    ) -> HttpRequest {
        let mut url = self.url_for(path);
        if method == HttpMethod::Get && !query.is_empty() {
            let mut serializer = url::form_urlencoded::Serializer::new(String::new());
            for (key, value) in query {
                serializer.append_pair(key, &value.to_string());
            }
            url.push('?');
            url.push_str(&serializer.finish());
        }

        let body = match method {
            HttpMethod::Post => Some(body.map_or_else(|| "{}".to_string(), Value::to_string)),
            HttpMethod::Get => None,
        };

        HttpRequest {
            method,
            url,
            headers: vec![
                (
                    "Authorization".to_string(),
                    format!("Bearer {}", self.config.api_key()),
                ),
                ("Accept".to_string(), "application/json".to_string()),
                ("Content-Type".to_string(), "application/json".to_string()),
            ],
            body,
            timeout: self.config.timeout(),
        }
    }

    /// Decode a 2xx body, or classify anything else.
    ///
    /// Empty, malformed, or non-object 2xx bodies decode to an empty object.
    pub fn parse(&self, response: HttpResponse) -> Result<JsonObject, ApiError> {
        if !response.is_success() {
            return Err(classify_response(&response));
        }
        if response.body.trim().is_empty() {
            return Ok(JsonObject::new());
        }
        match serde_json::from_str::<Value>(&response.body) {
            Ok(Value::Object(object)) => Ok(object),
            Ok(other) => {
                tracing::warn!(
                    status = response.status,
                    json_type = json_type(&other),
                    "successful response is not a JSON object, treating as empty"
                );
                Ok(JsonObject::new())
            }
            Err(e) => {
                tracing::warn!(
                    status = response.status,
                    error = %e,
                    "successful response is not valid JSON, treating as empty"
                );
                Ok(JsonObject::new())
            }
        }
    }

    pub fn execute(
        &self,
        method: HttpMethod,
        path: &str,
        query: &[(&str, QueryValue)],
        body: Option<&Value>,
    ) -> Result<JsonObject, ApiError> {
        let request = self.build(method, path, query, body);
        tracing::debug!(method = %request.method, url = %request.url, "sending API request");

        let response = self.transport.send(&request).map_err(|e| {
            tracing::debug!(
                method = %request.method,
                url = %request.url,
                error = %e,
                "API request failed without a response"
            );
            ApiError::network(e)
        })?;

        tracing::debug!(status = response.status, url = %request.url, "received API response");
        self.parse(response)
    }

    pub fn get(&self, path: &str, query: &[(&str, QueryValue)]) -> Result<JsonObject, ApiError> {
        self.execute(HttpMethod::Get, path, query, None)
    }

    pub fn post(&self, path: &str, body: &Value) -> Result<JsonObject, ApiError> {
        self.execute(HttpMethod::Post, path, &[], Some(body))
    }
}

impl fmt::Debug for RequestExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestExecutor")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
