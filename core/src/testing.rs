//! In-memory transport for unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::config::ClientConfig;
use crate::executor::RequestExecutor;
use crate::http::{HttpRequest, HttpResponse, Transport, TransportError};

pub const TEST_API_KEY: &str = "test-api-key";
pub const TEST_BASE_URL: &str = "https://api.test/v1";

/// Replays queued outcomes in order and records every request it is handed.
#[derive(Clone, Default)]
pub struct RecordingTransport {
    outcomes: Arc<Mutex<VecDeque<Result<HttpResponse, TransportError>>>>,
    requests: Arc<Mutex<Vec<HttpRequest>>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, status: u16, body: &str) -> Self {
        self.respond_with_headers(status, body, Vec::new())
    }

    pub fn respond_with_headers(self, status: u16, body: &str, headers: Vec<(&str, &str)>) -> Self {
        let response = HttpResponse {
            status,
            headers: headers
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            body: body.to_string(),
        };
        self.outcomes.lock().unwrap().push_back(Ok(response));
        self
    }

    pub fn fail(self, message: &str) -> Self {
        self.outcomes
            .lock()
            .unwrap()
            .push_back(Err(TransportError::new(message)));
        self
    }

    pub fn last_request(&self) -> HttpRequest {
        self.requests
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no request was sent")
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl Transport for RecordingTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.lock().unwrap().push(request.clone());
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::new("no response queued")))
    }
}

/// An executor wired to `transport` with the test key and base URL.
pub fn executor(transport: &RecordingTransport) -> RequestExecutor {
    let config = ClientConfig::new(TEST_API_KEY).with_base_url(TEST_BASE_URL);
    RequestExecutor::with_transport(config, transport.clone())
}
