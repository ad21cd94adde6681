use crate::error::ApiError;
use crate::executor::{JsonObject, RequestExecutor};

/// Single-company lookups.
#[derive(Debug, Clone, Copy)]
pub struct Companies<'a> {
    executor: &'a RequestExecutor,
}

impl<'a> Companies<'a> {
    pub(crate) fn new(executor: &'a RequestExecutor) -> Self {
        Self { executor }
    }

    /// Look up a company by its 8-digit IČO.
    pub fn by_ico(&self, ico: &str) -> Result<JsonObject, ApiError> {
        self.executor.get(&format!("/company/ico/{ico}"), &[])
    }

    /// Look up a company by its ORSR record ID.
    pub fn by_orsr_id(&self, orsr_id: &str) -> Result<JsonObject, ApiError> {
        self.executor.get(&format!("/company/id/{orsr_id}"), &[])
    }

    /// Look up a company by the API's internal database ID.
    pub fn by_id(&self, id: u64) -> Result<JsonObject, ApiError> {
        self.executor.get(&format!("/company/{id}"), &[])
    }
}
