//! Entry point for the registry API.
//!
//! `FirmApiClient` owns one `RequestExecutor` and hands out borrowed
//! façades per endpoint group. Cloning is cheap: the config is small and the
//! transport sits behind an `Arc`.

use crate::config::ClientConfig;
use crate::executor::RequestExecutor;
use crate::http::Transport;
use crate::resources::{Account, Batch, Companies, Search};

#[derive(Debug, Clone)]
pub struct FirmApiClient {
    executor: RequestExecutor,
}

impl FirmApiClient {
    /// Client for the production API with default timeout.
    #[cfg(feature = "ureq")]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::from_config(ClientConfig::new(api_key))
    }

    #[cfg(feature = "ureq")]
    pub fn from_config(config: ClientConfig) -> Self {
        Self {
            executor: RequestExecutor::new(config),
        }
    }

    /// Client configured from `FIRMAPI_*` environment variables.
    #[cfg(feature = "ureq")]
    pub fn from_env() -> Result<Self, crate::config::ConfigError> {
        Ok(Self::from_config(ClientConfig::from_env()?))
    }

    pub fn with_transport<T>(config: ClientConfig, transport: T) -> Self
    where
        T: Transport + 'static,
    {
        Self {
            executor: RequestExecutor::with_transport(config, transport),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        self.executor.config()
    }

    /// Direct access for endpoints that have no façade yet.
    pub fn executor(&self) -> &RequestExecutor {
        &self.executor
    }

    pub fn companies(&self) -> Companies<'_> {
        Companies::new(&self.executor)
    }

    pub fn search(&self) -> Search<'_> {
        Search::new(&self.executor)
    }

    pub fn batch(&self) -> Batch<'_> {
        Batch::new(&self.executor)
    }

    pub fn account(&self) -> Account<'_> {
        Account::new(&self.executor)
    }
}
