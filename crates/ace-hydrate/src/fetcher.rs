//! The injected fetch seam
//!
//! The default production fetcher (network transport, auth interceptors)
//! is supplied by the embedding application; the core only depends on
//! this trait. [`StaticFetcher`] serves canned responses for offline use
//! and tests.

use crate::error::FetchError;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;

/// Fetches the data behind one endpoint key
#[async_trait]
pub trait DataFetcher: Send + Sync {
    /// Fetch one endpoint.
    ///
    /// # Errors
    /// [`FetchError`] for any failure; the orchestrator owns retry,
    /// timeout, and caching around this call.
    async fn fetch(&self, endpoint: &str) -> Result<Value, FetchError>;
}

/// In-memory fetcher serving a fixed endpoint→response map
#[derive(Debug, Clone, Default)]
pub struct StaticFetcher {
    responses: HashMap<String, Value>,
}

impl StaticFetcher {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a canned response
    #[must_use]
    pub fn with_response(mut self, endpoint: impl Into<String>, response: Value) -> Self {
        self.responses.insert(endpoint.into(), response);
        self
    }
}

#[async_trait]
impl DataFetcher for StaticFetcher {
    async fn fetch(&self, endpoint: &str) -> Result<Value, FetchError> {
        self.responses
            .get(endpoint)
            .cloned()
            .ok_or_else(|| FetchError::new(endpoint, "no canned response"))
    }
}
