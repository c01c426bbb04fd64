//! Testing utilities for the ACE workspace
//!
//! Raw-JSON layout builders (pre-gate shape, camelCase wire fields) and
//! scripted fetchers for hydration tests.

#![allow(missing_docs)]

use ace_hydrate::{DataFetcher, FetchError};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};

/// A leaf component in wire shape
pub fn component(id: &str, name: &str) -> Value {
    json!({
        "type": "Component",
        "componentId": id,
        "component": name,
    })
}

/// A leaf with props
pub fn component_with_props(id: &str, name: &str, props: Value) -> Value {
    json!({
        "type": "Component",
        "componentId": id,
        "component": name,
        "props": props,
    })
}

/// A leaf that hydrates from one endpoint
pub fn hydrated_component(id: &str, name: &str, endpoint: &str) -> Value {
    json!({
        "type": "Component",
        "componentId": id,
        "component": name,
        "hydrateWith": [{ "endpoint": endpoint }],
        "fallback": { "component": "narrative_text",
                      "props": { "text": "data unavailable" } },
    })
}

pub fn vertical_split(ratios: Vec<f64>, children: Vec<Value>) -> Value {
    json!({ "type": "VerticalSplit", "ratios": ratios, "children": children })
}

pub fn horizontal_split(ratios: Vec<f64>, children: Vec<Value>) -> Value {
    json!({ "type": "HorizontalSplit", "ratios": ratios, "children": children })
}

pub fn grid(columns: u32, children: Vec<Value>) -> Value {
    json!({ "type": "Grid", "columns": columns, "children": children })
}

pub fn panel(title: &str, children: Vec<Value>) -> Value {
    json!({ "type": "Panel", "title": title, "children": children })
}

/// A small but representative dashboard: KPI row over a chart and table
pub fn sample_dashboard() -> Value {
    vertical_split(
        vec![1.0, 3.0],
        vec![
            grid(
                2,
                vec![
                    component_with_props("kpi_revenue", "kpi_card", json!({ "label": "Revenue" })),
                    component_with_props("kpi_churn", "kpi_card", json!({ "label": "Churn" })),
                ],
            ),
            horizontal_split(
                vec![2.0, 1.0],
                vec![
                    component("chart_trend", "line_chart"),
                    component("table_detail", "data_table"),
                ],
            ),
        ],
    )
}

/// Fails the first `failures` calls, then succeeds
pub struct FlakyFetcher {
    failures: usize,
    calls: AtomicUsize,
    response: Value,
}

impl FlakyFetcher {
    pub fn new(failures: usize, response: Value) -> Self {
        Self {
            failures,
            calls: AtomicUsize::new(0),
            response,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DataFetcher for FlakyFetcher {
    async fn fetch(&self, endpoint: &str) -> Result<Value, FetchError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) < self.failures {
            Err(FetchError::new(endpoint, "transient failure"))
        } else {
            Ok(self.response.clone())
        }
    }
}

/// Hangs forever; exercises timeout and abort paths
pub struct NeverResolves;

#[async_trait]
impl DataFetcher for NeverResolves {
    async fn fetch(&self, _endpoint: &str) -> Result<Value, FetchError> {
        std::future::pending().await
    }
}

/// Records every fetch; exercises cache and dedup paths
pub struct CountingFetcher {
    calls: AtomicUsize,
    response: Value,
}

impl CountingFetcher {
    pub fn new(response: Value) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            response,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DataFetcher for CountingFetcher {
    async fn fetch(&self, _endpoint: &str) -> Result<Value, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.response.clone())
    }
}
