//! Settle-all hydration over a layout tree
//!
//! The orchestrator walks a vetted tree, fetches every declared endpoint
//! through the shared cache, and reports a per-leaf outcome. It never
//! mutates the tree itself; callers fold the outcomes back in as
//! ordinary prop updates.

use crate::cache::HydrationCache;
use crate::error::HydrationError;
use crate::fetcher::DataFetcher;
use crate::retry::fetch_with_retry;
use ace_schema::{ComponentNode, Fallback, LayoutNode};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Tunables for cache, timeout, and retry behavior
#[derive(Debug, Clone)]
pub struct HydrationConfig {
    /// Cache entry lifetime, checked at read time
    pub ttl: Duration,
    /// Upper bound on one fetch attempt
    pub request_timeout: Duration,
    /// Attempts per endpoint before declaring terminal failure
    pub max_attempts: u32,
    /// First retry delay; doubles per attempt, plus jitter
    pub base_backoff: Duration,
    /// Maximum cached endpoints
    pub cache_capacity: u64,
}

impl Default for HydrationConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(60),
            request_timeout: Duration::from_secs(10),
            max_attempts: 3,
            base_backoff: Duration::from_millis(250),
            cache_capacity: 1024,
        }
    }
}

impl HydrationConfig {
    #[inline]
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_base_backoff(mut self, backoff: Duration) -> Self {
        self.base_backoff = backoff;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_cache_capacity(mut self, capacity: u64) -> Self {
        self.cache_capacity = capacity;
        self
    }
}

/// Outcome of hydrating one leaf
#[derive(Debug, Clone, PartialEq)]
pub enum LeafHydration {
    /// Every endpoint resolved; `props` is the leaf's full prop map with
    /// the responses merged in
    Hydrated {
        component_id: String,
        props: Map<String, Value>,
    },
    /// At least one endpoint terminally failed; render the declared
    /// fallback (or a generic degraded state when none was declared)
    Fallback {
        component_id: String,
        fallback: Option<Fallback>,
        error: HydrationError,
    },
}

impl LeafHydration {
    /// The leaf this outcome belongs to
    #[must_use]
    pub fn component_id(&self) -> &str {
        match self {
            Self::Hydrated { component_id, .. } | Self::Fallback { component_id, .. } => {
                component_id
            }
        }
    }

    #[inline]
    #[must_use]
    pub fn is_hydrated(&self) -> bool {
        matches!(self, Self::Hydrated { .. })
    }
}

/// Per-leaf outcomes for one tree pass
#[derive(Debug, Clone, Default)]
pub struct HydrationSummary {
    /// One entry per leaf that declared at least one endpoint
    pub outcomes: Vec<LeafHydration>,
}

impl HydrationSummary {
    /// Leaves whose every endpoint resolved
    #[must_use]
    pub fn hydrated_component_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_hydrated()).count()
    }

    /// Leaves degraded to their fallback
    #[must_use]
    pub fn fallback_component_count(&self) -> usize {
        self.outcomes.len() - self.hydrated_component_count()
    }

    /// Outcome for one leaf, if it declared any endpoint
    #[must_use]
    pub fn outcome_for(&self, component_id: &str) -> Option<&LeafHydration> {
        self.outcomes.iter().find(|o| o.component_id() == component_id)
    }
}

/// Drives cache, retry, and merge for a whole tree
#[derive(Clone)]
pub struct HydrationOrchestrator {
    fetcher: Arc<dyn DataFetcher>,
    cache: HydrationCache,
    config: HydrationConfig,
}

impl HydrationOrchestrator {
    #[must_use]
    pub fn new(fetcher: Arc<dyn DataFetcher>, config: HydrationConfig) -> Self {
        let cache = HydrationCache::new(config.ttl, config.cache_capacity);
        Self {
            fetcher,
            cache,
            config,
        }
    }

    /// The shared endpoint cache
    #[inline]
    #[must_use]
    pub fn cache(&self) -> &HydrationCache {
        &self.cache
    }

    /// Fetch one endpoint through the cache, with timeout and retry.
    ///
    /// # Errors
    /// [`HydrationError`] once every attempt has failed.
    pub async fn fetch_endpoint(&self, endpoint: &str) -> Result<Value, HydrationError> {
        self.cache
            .get_or_fetch(endpoint, fetch_with_retry(&*self.fetcher, endpoint, &self.config))
            .await
    }

    /// Hydrate one leaf: all its endpoints in parallel, settle-all.
    ///
    /// Responses merge into a clone of the leaf's props in declaration
    /// order; any terminal failure degrades the whole leaf to its
    /// fallback.
    pub async fn hydrate_leaf(&self, leaf: &ComponentNode) -> LeafHydration {
        let fetches = leaf
            .hydrate_with
            .iter()
            .map(|source| self.fetch_endpoint(&source.endpoint));
        let results = futures::future::join_all(fetches).await;

        let mut props = leaf.props.clone();
        for (source, result) in leaf.hydrate_with.iter().zip(results) {
            match result {
                Ok(value) => merge_response(&mut props, source.merge_key.as_deref(), &source.endpoint, value),
                Err(error) => {
                    tracing::warn!(
                        component_id = %leaf.component_id,
                        endpoint = %source.endpoint,
                        %error,
                        "hydration failed, degrading to fallback"
                    );
                    return LeafHydration::Fallback {
                        component_id: leaf.component_id.clone(),
                        fallback: leaf.fallback.clone(),
                        error,
                    };
                }
            }
        }

        LeafHydration::Hydrated {
            component_id: leaf.component_id.clone(),
            props,
        }
    }

    /// Hydrate every leaf of `tree` that declares at least one endpoint.
    ///
    /// Leaves hydrate in parallel and all settle; a slow endpoint on one
    /// leaf never blocks another leaf's outcome.
    pub async fn hydrate_tree(&self, tree: &LayoutNode) -> HydrationSummary {
        let leaves: Vec<_> = tree
            .leaves()
            .into_iter()
            .filter(|leaf| !leaf.hydrate_with.is_empty())
            .collect();

        let outcomes =
            futures::future::join_all(leaves.iter().map(|leaf| self.hydrate_leaf(leaf))).await;

        let summary = HydrationSummary { outcomes };
        tracing::debug!(
            hydrated = summary.hydrated_component_count(),
            fallbacks = summary.fallback_component_count(),
            "tree hydration settled"
        );
        summary
    }

    /// Spawn `hydrate_tree` as an abortable background task
    #[must_use]
    pub fn hydrate_tree_handle(&self, tree: &LayoutNode) -> HydrationHandle {
        let this = self.clone();
        let tree = tree.clone();
        HydrationHandle {
            join: tokio::spawn(async move { this.hydrate_tree(&tree).await }),
        }
    }
}

impl std::fmt::Debug for HydrationOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HydrationOrchestrator")
            .field("config", &self.config)
            .field("cached_endpoints", &self.cache.entry_count())
            .finish_non_exhaustive()
    }
}

/// A running background hydration pass
#[derive(Debug)]
pub struct HydrationHandle {
    join: JoinHandle<HydrationSummary>,
}

impl HydrationHandle {
    /// Cancel the pass; in-flight fetches are dropped
    #[inline]
    pub fn abort(&self) {
        self.join.abort();
    }

    /// Wait for the pass to settle; `None` if it was aborted
    pub async fn settled(self) -> Option<HydrationSummary> {
        self.join.await.ok()
    }
}

fn merge_response(props: &mut Map<String, Value>, merge_key: Option<&str>, endpoint: &str, value: Value) {
    match (merge_key, value) {
        (Some(key), value) => {
            props.insert(key.to_string(), value);
        }
        (None, Value::Object(fields)) => {
            for (key, field) in fields {
                props.insert(key, field);
            }
        }
        (None, scalar) => {
            props.insert(endpoint.to_string(), scalar);
        }
    }
}
