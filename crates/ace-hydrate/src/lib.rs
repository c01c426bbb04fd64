//! ACE Hydrate - the data-hydration orchestrator
//!
//! Leaves that declare a `hydrateWith` endpoint list get their data
//! fetched after initial render:
//! - all endpoints of a leaf fetch in parallel, settle-all: one slow or
//!   broken endpoint never blocks sibling leaves
//! - per-endpoint cache with TTL-at-read; concurrent identical requests
//!   are coalesced into a single fetch
//! - each fetch is bounded by a timeout and wrapped in exponential
//!   backoff retry
//! - terminal failure degrades the leaf to its declared fallback; the
//!   page as a whole still renders
//!
//! The actual transport is injected through [`DataFetcher`]; auth headers
//! and interceptors are a collaborator concern, not a core one.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod cache;
pub mod error;
pub mod fetcher;
pub mod orchestrator;
mod retry;

pub use cache::HydrationCache;
pub use error::{FetchError, HydrationError};
pub use fetcher::{DataFetcher, StaticFetcher};
pub use orchestrator::{
    HydrationConfig, HydrationHandle, HydrationOrchestrator, HydrationSummary, LeafHydration,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
