//! Error taxonomy for the registry API client.
//!
//! # Design
//! One `ApiError` struct carries the fields every failure shares (message,
//! status code, optional cause) and an `ErrorKind` tag carrying whatever is
//! specific to the variant. Callers branch with `match err.kind()` instead of
//! parsing messages: field-level validation messages and the rate-limit delay
//! are available as data.

use indexmap::IndexMap;
use serde_json::Value;

type Cause = Box<dyn std::error::Error + Send + Sync>;

/// Validation messages keyed by field name, in the order the server sent them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(IndexMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages for `field`; empty when the server reported nothing for it.
    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn insert(&mut self, field: impl Into<String>, messages: Vec<String>) {
        self.0.insert(field.into(), messages);
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Best-effort conversion of an `errors` payload.
    ///
    /// Arrays keep their string entries; a bare string becomes a one-element
    /// list. Anything that is not an object yields no field errors.
    pub fn from_json(value: &Value) -> Self {
        let mut errors = Self::new();
        let Some(object) = value.as_object() else {
            return errors;
        };
        for (field, messages) in object {
            let messages = match messages {
                Value::Array(items) => items
                    .iter()
                    .filter_map(|item| item.as_str().map(str::to_string))
                    .collect(),
                Value::String(message) => vec![message.clone()],
                _ => Vec::new(),
            };
            errors.insert(field.clone(), messages);
        }
        errors
    }
}

/// Which failure happened, plus the data specific to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// No HTTP response was obtained (DNS, connect, TLS, timeout).
    Network,
    /// 401: missing or invalid API key.
    Authentication,
    /// 403: the key is valid but the plan does not allow this call.
    Forbidden,
    /// 404
    NotFound,
    /// 422: the server rejected the input.
    Validation { field_errors: FieldErrors },
    /// 429: back off for `retry_after_seconds` before resubmitting.
    RateLimit { retry_after_seconds: u64 },
    /// Any other non-2xx status.
    Generic,
}

impl ErrorKind {
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::Network => "network",
            ErrorKind::Authentication => "authentication",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Validation { .. } => "validation",
            ErrorKind::RateLimit { .. } => "rate_limit",
            ErrorKind::Generic => "generic",
        }
    }
}

/// Error returned by every `RequestExecutor` call and every resource method.
///
/// `status_code` is the HTTP status of the failed response, or `0` for
/// `ErrorKind::Network`.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct ApiError {
    kind: ErrorKind,
    message: String,
    status_code: u16,
    #[source]
    cause: Option<Cause>,
}

impl ApiError {
    pub fn new(kind: ErrorKind, message: impl Into<String>, status_code: u16) -> Self {
        Self {
            kind,
            message: message.into(),
            status_code,
            cause: None,
        }
    }

    /// A transport-level failure: status 0, message prefixed `Network error: `.
    pub fn network<E>(cause: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self {
            kind: ErrorKind::Network,
            message: format!("Network error: {cause}"),
            status_code: 0,
            cause: Some(Box::new(cause)),
        }
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    /// Validation messages for `field`. Empty for unknown fields and for
    /// every non-validation error.
    pub fn field_errors(&self, field: &str) -> &[String] {
        match &self.kind {
            ErrorKind::Validation { field_errors } => field_errors.get(field),
            _ => &[],
        }
    }

    /// All validation messages, if this is a validation error.
    pub fn validation_errors(&self) -> Option<&FieldErrors> {
        match &self.kind {
            ErrorKind::Validation { field_errors } => Some(field_errors),
            _ => None,
        }
    }

    /// Seconds to wait before retrying, if this is a rate-limit error.
    pub fn retry_after(&self) -> Option<u64> {
        match self.kind {
            ErrorKind::RateLimit { retry_after_seconds } => Some(retry_after_seconds),
            _ => None,
        }
    }

    /// Network failures and rate limiting are worth resubmitting later.
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind, ErrorKind::Network | ErrorKind::RateLimit { .. })
    }
}
