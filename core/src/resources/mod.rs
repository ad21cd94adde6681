//! Endpoint façades over `RequestExecutor`.
//!
//! Each façade only knows its endpoint paths and parameter names. Responses
//! are returned as decoded, and errors propagate unchanged.

mod account;
mod batch;
mod companies;
mod search;

pub use account::Account;
pub use batch::Batch;
pub use companies::Companies;
pub use search::{Page, Search, AUTOCOMPLETE_MAX_LIMIT};
