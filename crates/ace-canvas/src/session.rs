//! One canvas session: store, registry, hydrator, and bus wired together
//!
//! The session is the single entry point an embedding host needs: agent
//! emissions come in through [`CanvasSession::apply_emission`], user
//! interactions through [`CanvasSession::emit_user_event`], and the
//! rendered tree out through [`CanvasSession::render`].

use crate::error::CanvasError;
use crate::events::{EventBus, EventError, Subscription};
use crate::store::{CanvasStore, Commit};
use ace_hydrate::{HydrationOrchestrator, HydrationSummary, LeafHydration};
use ace_registry::{render_tree, ComponentRegistry, RenderedTree};
use ace_schema::{
    CanvasEvent, CanvasEventKind, CanvasOperation, Delta, Emission, EventEnvelope, LayoutNode,
    PatchOp,
};
use std::sync::Arc;

/// A live canvas plus its collaborators
pub struct CanvasSession {
    store: CanvasStore,
    registry: Arc<ComponentRegistry>,
    hydrator: HydrationOrchestrator,
    bus: EventBus,
    session_id: Option<String>,
}

impl CanvasSession {
    #[must_use]
    pub fn new(
        canvas_id: impl Into<String>,
        registry: Arc<ComponentRegistry>,
        hydrator: HydrationOrchestrator,
    ) -> Self {
        Self {
            store: CanvasStore::new(canvas_id),
            registry,
            hydrator,
            bus: EventBus::new(),
            session_id: None,
        }
    }

    #[must_use]
    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    #[inline]
    #[must_use]
    pub fn store(&self) -> &CanvasStore {
        &self.store
    }

    #[inline]
    #[must_use]
    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Current vetted tree, if a layout is installed
    #[inline]
    #[must_use]
    pub fn tree(&self) -> Option<&LayoutNode> {
        self.store.tree()
    }

    /// Dispatch one agent emission to the store.
    ///
    /// `replace` and `patch` commit immediately; `stream` opens a stream
    /// on first use, buffers chunks, and commits once a chunk is marked
    /// last; `reset` retires the canvas and commits nothing.
    ///
    /// # Errors
    /// [`CanvasError::EmptyEmission`] when the payload for the operation
    /// is missing, plus the store's own errors.
    pub fn apply_emission(&mut self, emission: &Emission) -> Result<Option<Commit>, CanvasError> {
        tracing::debug!(
            canvas_id = %self.store.canvas_id(),
            operation = ?emission.operation,
            agent_version = emission.version,
            "emission received"
        );
        match emission.operation {
            CanvasOperation::Replace => {
                let layout = emission
                    .layout
                    .as_ref()
                    .ok_or(CanvasError::EmptyEmission { operation: "replace" })?;
                self.store.set_canvas(layout, None).map(Some)
            }
            CanvasOperation::Patch => {
                let delta = emission
                    .delta
                    .as_ref()
                    .ok_or(CanvasError::EmptyEmission { operation: "patch" })?;
                self.store.patch_canvas(delta).map(Some)
            }
            CanvasOperation::Stream => {
                let chunks = emission
                    .chunks
                    .as_ref()
                    .filter(|chunks| !chunks.is_empty())
                    .ok_or(CanvasError::EmptyEmission { operation: "stream" })?;
                if !self.store.is_streaming() {
                    self.store.start_streaming()?;
                }
                let finish = chunks.iter().any(|chunk| chunk.last);
                for chunk in chunks {
                    self.store.add_stream_chunk(chunk.clone())?;
                }
                if finish {
                    self.store.complete_streaming().map(Some)
                } else {
                    Ok(None)
                }
            }
            CanvasOperation::Reset => {
                self.store.reset();
                Ok(None)
            }
        }
    }

    /// Render the current tree through the registry.
    ///
    /// # Errors
    /// [`CanvasError::NoCanvas`] before the first layout.
    pub fn render(&self) -> Result<RenderedTree, CanvasError> {
        let tree = self.store.tree().ok_or(CanvasError::NoCanvas)?;
        Ok(render_tree(tree, &self.registry))
    }

    /// Hydrate every leaf that declares endpoints, then fold the merged
    /// props back into the tree as one prop-update commit.
    ///
    /// Degraded leaves keep their pre-hydration props; their fallbacks
    /// surface through the returned summary.
    ///
    /// # Errors
    /// [`CanvasError::NoCanvas`] before the first layout, plus the
    /// store's patch errors.
    pub async fn hydrate(&mut self) -> Result<HydrationSummary, CanvasError> {
        let tree = self.store.tree().ok_or(CanvasError::NoCanvas)?;
        let summary = self.hydrator.hydrate_tree(tree).await;

        let operations: Vec<PatchOp> = summary
            .outcomes
            .iter()
            .filter_map(|outcome| match outcome {
                LeafHydration::Hydrated { component_id, props } => Some(PatchOp::UpdateProps {
                    component_id: component_id.clone(),
                    props: props.clone(),
                }),
                LeafHydration::Fallback { .. } => None,
            })
            .collect();

        if !operations.is_empty() {
            self.store
                .patch_canvas(&Delta::new(operations).with_reason("hydration"))?;
        }
        Ok(summary)
    }

    /// Handle one user interaction.
    ///
    /// Undo and redo requests mutate the store before fan-out, so
    /// subscribers observe the post-change canvas. Every event, handled
    /// or not, is forwarded to the bus; returns the delivery count.
    ///
    /// # Errors
    /// The store's undo/redo errors; the event is not forwarded when the
    /// request failed.
    pub fn emit_user_event(&mut self, event: CanvasEvent) -> Result<usize, CanvasError> {
        match event.kind() {
            CanvasEventKind::UndoRequest => {
                self.store.undo()?;
            }
            CanvasEventKind::RedoRequest => {
                self.store.redo()?;
            }
            _ => {}
        }

        let mut envelope = EventEnvelope::new(event, self.store.canvas_id());
        if let Some(session_id) = &self.session_id {
            envelope = envelope.with_session(session_id.clone());
        }
        Ok(self.bus.emit(&envelope))
    }

    /// Subscribe to the session's event stream
    #[must_use]
    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&EventEnvelope) -> Result<(), EventError> + Send + Sync + 'static,
    {
        self.bus.subscribe(handler)
    }
}

impl std::fmt::Debug for CanvasSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CanvasSession")
            .field("canvas_id", &self.store.canvas_id())
            .field("version", &self.store.version())
            .field("subscribers", &self.bus.len())
            .finish_non_exhaustive()
    }
}
