//! Hydration errors
//!
//! Both types are `Clone`: coalesced cache loads hand the same terminal
//! error to every waiter, and fallback outcomes carry it for diagnostics.

/// A single fetch attempt's failure, reported by the injected fetcher
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("endpoint `{endpoint}` failed: {message}")]
pub struct FetchError {
    pub endpoint: String,
    pub message: String,
}

impl FetchError {
    #[inline]
    #[must_use]
    pub fn new(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }
}

/// Terminal hydration failure for one endpoint, after retries
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HydrationError {
    /// The single allowed attempt timed out
    #[error("endpoint `{endpoint}` timed out after {timeout_ms}ms")]
    Timeout { endpoint: String, timeout_ms: u64 },

    /// Every attempt failed or timed out
    #[error("endpoint `{endpoint}` exhausted {attempts} attempts: {last_error}")]
    RetriesExhausted {
        endpoint: String,
        attempts: u32,
        last_error: String,
    },
}

impl HydrationError {
    /// The endpoint this failure belongs to
    #[must_use]
    pub fn endpoint(&self) -> &str {
        match self {
            Self::Timeout { endpoint, .. } | Self::RetriesExhausted { endpoint, .. } => endpoint,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_name_their_endpoint() {
        let err = HydrationError::RetriesExhausted {
            endpoint: "/api/kpi".into(),
            attempts: 3,
            last_error: "connection refused".into(),
        };
        assert_eq!(err.endpoint(), "/api/kpi");
        assert!(err.to_string().contains("3 attempts"));
        assert!(err.to_string().contains("connection refused"));
    }
}
