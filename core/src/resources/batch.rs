use serde_json::json;

use crate::error::ApiError;
use crate::executor::{JsonObject, RequestExecutor};

/// Asynchronous batch jobs. Submitting returns a job ID whose status and
/// results are polled separately.
#[derive(Debug, Clone, Copy)]
pub struct Batch<'a> {
    executor: &'a RequestExecutor,
}

impl<'a> Batch<'a> {
    pub(crate) fn new(executor: &'a RequestExecutor) -> Self {
        Self { executor }
    }

    pub fn by_ico<I>(&self, icos: I) -> Result<JsonObject, ApiError>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let icos: Vec<String> = icos.into_iter().map(Into::into).collect();
        self.executor.post("/batch/ico", &json!({ "icos": icos }))
    }

    pub fn by_names<I>(&self, names: I) -> Result<JsonObject, ApiError>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        self.executor.post("/batch/names", &json!({ "names": names }))
    }

    pub fn status(&self, batch_id: &str) -> Result<JsonObject, ApiError> {
        self.executor.get(&format!("/batch/{batch_id}/status"), &[])
    }

    pub fn results(&self, batch_id: &str) -> Result<JsonObject, ApiError> {
        self.executor.get(&format!("/batch/{batch_id}/results"), &[])
    }
}
