use crate::error::ApiError;
use crate::executor::{JsonObject, RequestExecutor};

/// Usage and quota of the API key's account.
#[derive(Debug, Clone, Copy)]
pub struct Account<'a> {
    executor: &'a RequestExecutor,
}

impl<'a> Account<'a> {
    pub(crate) fn new(executor: &'a RequestExecutor) -> Self {
        Self { executor }
    }

    /// Usage statistics for the current billing period.
    pub fn usage(&self) -> Result<JsonObject, ApiError> {
        self.executor.get("/account/usage", &[])
    }

    /// Remaining quota for the current billing period.
    pub fn quota(&self) -> Result<JsonObject, ApiError> {
        self.executor.get("/account/quota", &[])
    }

    /// Usage history; how far back it reaches depends on the plan.
    pub fn history(&self) -> Result<JsonObject, ApiError> {
        self.executor.get("/account/history", &[])
    }
}
