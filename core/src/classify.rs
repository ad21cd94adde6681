//! Maps a failed HTTP response onto the `ApiError` taxonomy.
//!
//! Classification is a pure function of status, body text and headers. A
//! malformed error body never makes classification itself fail; it only
//! costs the caller the server-supplied message.

use serde_json::{Map, Value};

use crate::error::{ApiError, ErrorKind, FieldErrors};
use crate::http::{find_header, HttpResponse};

/// Delay used when a 429 carries no usable `Retry-After` header.
pub const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rule {
    Authentication,
    Forbidden,
    NotFound,
    Validation,
    RateLimit,
}

/// Statuses with dedicated handling. Anything else is `ErrorKind::Generic`.
const STATUS_RULES: &[(u16, Rule)] = &[
    (401, Rule::Authentication),
    (403, Rule::Forbidden),
    (404, Rule::NotFound),
    (422, Rule::Validation),
    (429, Rule::RateLimit),
];

fn rule_for(status: u16) -> Option<Rule> {
    STATUS_RULES
        .iter()
        .find(|(code, _)| *code == status)
        .map(|(_, rule)| *rule)
}

/// Build the `ApiError` for a non-2xx response.
pub fn classify(status: u16, body: &str, headers: &[(String, String)]) -> ApiError {
    let body = parse_body(body);
    let message = extract_message(&body, status);

    let (kind, message) = match rule_for(status) {
        Some(Rule::Authentication) => (ErrorKind::Authentication, message),
        Some(Rule::Forbidden) => (ErrorKind::Forbidden, format!("Forbidden: {message}")),
        Some(Rule::NotFound) => (ErrorKind::NotFound, format!("Not found: {message}")),
        Some(Rule::Validation) => {
            let field_errors = body
                .get("errors")
                .map(FieldErrors::from_json)
                .unwrap_or_default();
            (ErrorKind::Validation { field_errors }, message)
        }
        Some(Rule::RateLimit) => {
            let retry_after_seconds = parse_retry_after(find_header(headers, "Retry-After"));
            (ErrorKind::RateLimit { retry_after_seconds }, message)
        }
        None => (ErrorKind::Generic, message),
    };

    tracing::debug!(status, kind = kind.name(), "classified API error response");
    ApiError::new(kind, message, status)
}

pub fn classify_response(response: &HttpResponse) -> ApiError {
    classify(response.status, &response.body, &response.headers)
}

fn parse_body(body: &str) -> Map<String, Value> {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(object)) => object,
        _ => Map::new(),
    }
}

/// `message`, then `error`, then a description of the bare status.
fn extract_message(body: &Map<String, Value>, status: u16) -> String {
    ["message", "error"]
        .iter()
        .find_map(|key| body.get(*key).and_then(Value::as_str))
        .map(str::to_string)
        .unwrap_or_else(|| format!("Request failed with status {status}"))
}

/// Seconds from a `Retry-After` header. Absent, empty, non-numeric or zero
/// values fall back to [`DEFAULT_RETRY_AFTER_SECS`].
pub fn parse_retry_after(header: Option<&str>) -> u64 {
    header
        .and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .unwrap_or(DEFAULT_RETRY_AFTER_SECS)
}
