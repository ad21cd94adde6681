//! Blocking client for the FirmAPI Slovak company-registry API.
//!
//! # Overview
//! Company lookup by IČO / ORSR ID, name and IČO search, batch jobs, and
//! account usage. Every call goes through one pipeline: build an
//! authenticated request, send it over a `Transport`, then decode the JSON
//! object or classify the failure into a typed `ApiError`.
//!
//! # Design
//! - `RequestExecutor` is stateless apart from the immutable `ClientConfig`.
//!   Its `build` / `parse` halves are pure and public, so the I/O boundary is
//!   explicit and a host can do its own round-trip.
//! - `classify` is a pure function from status, body and headers to an
//!   `ApiError`; callers branch on `ErrorKind` rather than on messages.
//! - No retries, caching or pooling happen here. `ApiError::retry_after` and
//!   `ApiError::is_retryable` give callers what they need to resubmit.
//! - Resource façades (`companies()`, `search()`, `batch()`, `account()`) only
//!   supply paths and parameters.

pub mod classify;
pub mod client;
pub mod config;
pub mod error;
pub mod executor;
pub mod http;
pub mod resources;

#[cfg(test)]
mod testing;

pub use classify::classify;
pub use client::FirmApiClient;
pub use config::{ClientConfig, ConfigError};
pub use error::{ApiError, ErrorKind, FieldErrors};
pub use executor::{JsonObject, RequestExecutor};
pub use http::{HttpMethod, HttpRequest, HttpResponse, QueryValue, Transport, TransportError};
#[cfg(feature = "ureq")]
pub use http::UreqTransport;
pub use resources::{Account, Batch, Companies, Page, Search};
