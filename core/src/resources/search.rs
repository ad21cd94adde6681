use crate::error::ApiError;
use crate::executor::{JsonObject, RequestExecutor};
use crate::http::QueryValue;

/// The API rejects autocomplete limits above this value.
pub const AUTOCOMPLETE_MAX_LIMIT: u32 = 20;

/// Pagination for the search endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: u32,
    pub offset: u32,
}

impl Default for Page {
    fn default() -> Self {
        Self { limit: 10, offset: 0 }
    }
}

/// Company search endpoints.
#[derive(Debug, Clone, Copy)]
pub struct Search<'a> {
    executor: &'a RequestExecutor,
}

impl<'a> Search<'a> {
    pub(crate) fn new(executor: &'a RequestExecutor) -> Self {
        Self { executor }
    }

    /// Select2-style autocomplete. `limit` is clamped to
    /// [`AUTOCOMPLETE_MAX_LIMIT`].
    pub fn autocomplete(&self, query: &str, limit: u32) -> Result<JsonObject, ApiError> {
        let limit = limit.min(AUTOCOMPLETE_MAX_LIMIT);
        self.executor.get(
            "/search/autocomplete",
            &[("q", query.into()), ("limit", limit.into())],
        )
    }

    pub fn by_name(&self, name: &str, exact: bool, page: Page) -> Result<JsonObject, ApiError> {
        self.executor.get(
            "/search/name",
            &[
                ("q", name.into()),
                ("exact", exact.into()),
                ("limit", page.limit.into()),
                ("offset", page.offset.into()),
            ],
        )
    }

    /// Search by a partial IČO.
    pub fn by_ico(&self, partial_ico: &str, page: Page) -> Result<JsonObject, ApiError> {
        self.executor.get(
            "/search/ico",
            &[
                ("q", partial_ico.into()),
                ("limit", page.limit.into()),
                ("offset", page.offset.into()),
            ],
        )
    }

    /// Multi-field search. Parameters (`name`, `city`, `legal_form`, ...) are
    /// passed through as given.
    pub fn advanced(&self, params: &[(&str, QueryValue)]) -> Result<JsonObject, ApiError> {
        self.executor.get("/search/advanced", params)
    }
}
