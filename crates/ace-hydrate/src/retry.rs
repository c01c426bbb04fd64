//! Timeout-bounded fetch with exponential backoff
//!
//! Each attempt is bounded by the configured request timeout; failed
//! attempts re-suspend for `base_backoff * 2^(attempt-1)` plus jitter.

use crate::error::HydrationError;
use crate::fetcher::DataFetcher;
use crate::orchestrator::HydrationConfig;
use rand::Rng;
use serde_json::Value;
use std::time::Duration;

pub(crate) async fn fetch_with_retry(
    fetcher: &dyn DataFetcher,
    endpoint: &str,
    config: &HydrationConfig,
) -> Result<Value, HydrationError> {
    let attempts = config.max_attempts.max(1);
    let mut last_error = String::new();
    let mut last_was_timeout = false;

    for attempt in 1..=attempts {
        match tokio::time::timeout(config.request_timeout, fetcher.fetch(endpoint)).await {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(err)) => {
                last_error = err.to_string();
                last_was_timeout = false;
                tracing::debug!(endpoint, attempt, error = %last_error, "fetch attempt failed");
            }
            Err(_) => {
                last_error = format!("timed out after {}ms", config.request_timeout.as_millis());
                last_was_timeout = true;
                tracing::debug!(endpoint, attempt, "fetch attempt timed out");
            }
        }

        if attempt < attempts {
            tokio::time::sleep(backoff_delay(config.base_backoff, attempt)).await;
        }
    }

    if attempts == 1 && last_was_timeout {
        return Err(HydrationError::Timeout {
            endpoint: endpoint.to_string(),
            timeout_ms: config.request_timeout.as_millis() as u64,
        });
    }
    Err(HydrationError::RetriesExhausted {
        endpoint: endpoint.to_string(),
        attempts,
        last_error,
    })
}

fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    // Exponent capped so pathological attempt counts cannot overflow
    let exp = base.saturating_mul(1u32 << (attempt - 1).min(10));
    let jitter_cap = (exp.as_millis() as u64 / 2).max(1);
    let jitter = rand::rng().random_range(0..=jitter_cap);
    exp + Duration::from_millis(jitter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct FailsThenSucceeds {
        failures: u32,
        calls: AtomicU32,
    }

    #[async_trait]
    impl DataFetcher for FailsThenSucceeds {
        async fn fetch(&self, endpoint: &str) -> Result<Value, FetchError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                Err(FetchError::new(endpoint, "flaky"))
            } else {
                Ok(json!({ "ok": true }))
            }
        }
    }

    fn quick_config(max_attempts: u32) -> HydrationConfig {
        HydrationConfig::default()
            .with_max_attempts(max_attempts)
            .with_request_timeout(Duration::from_millis(20))
            .with_base_backoff(Duration::from_millis(1))
    }

    #[tokio::test]
    async fn retries_until_success() {
        let fetcher = FailsThenSucceeds {
            failures: 2,
            calls: AtomicU32::new(0),
        };
        let value = fetch_with_retry(&fetcher, "/api/kpi", &quick_config(3))
            .await
            .unwrap();
        assert_eq!(value["ok"], true);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhausted_attempts_reported() {
        let fetcher = FailsThenSucceeds {
            failures: 10,
            calls: AtomicU32::new(0),
        };
        let err = fetch_with_retry(&fetcher, "/api/kpi", &quick_config(3))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            HydrationError::RetriesExhausted { attempts: 3, .. }
        ));
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 3);
    }

    struct NeverResolves;

    #[async_trait]
    impl DataFetcher for NeverResolves {
        async fn fetch(&self, _endpoint: &str) -> Result<Value, FetchError> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn single_attempt_timeout_is_timeout_error() {
        let err = fetch_with_retry(&NeverResolves, "/api/slow", &quick_config(1))
            .await
            .unwrap_err();
        assert!(matches!(err, HydrationError::Timeout { .. }));
    }

    #[test]
    fn backoff_grows_exponentially() {
        let base = Duration::from_millis(100);
        let first = backoff_delay(base, 1);
        let third = backoff_delay(base, 3);
        assert!(first >= base);
        assert!(first <= base + base / 2 + Duration::from_millis(1));
        assert!(third >= base * 4);
    }
}
