//! Canvas state: the gated tree, commit history, and streaming assembly
//!
//! Every mutation path converges on [`CanvasStore::commit`]: the candidate
//! tree passes the validation gate, becomes a history snapshot, and bumps
//! the monotonic version. Undo and redo move the history cursor only; the
//! next commit truncates any redo tail, exactly like an editor.

use crate::error::CanvasError;
use ace_patch::{apply_delta, validate_delta, SkippedOp};
use ace_schema::{now_millis, sanitized_tree, Chunk, Delta, LayoutNode};
use serde_json::{json, Value};
use std::collections::VecDeque;

/// Default number of retained history snapshots
pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

/// One committed canvas state
#[derive(Debug, Clone, PartialEq)]
pub struct HistorySnapshot {
    /// The vetted tree at this point
    pub tree: LayoutNode,
    /// Monotonic commit version
    pub version: u64,
    /// Agent-supplied reason, when the commit came from a delta
    pub reason: Option<String>,
    /// Commit time, milliseconds since the Unix epoch
    pub timestamp: i64,
}

/// What a mutation committed
#[derive(Debug, Clone, PartialEq)]
pub struct Commit {
    /// Version of the new snapshot
    pub version: u64,
    /// Operations skipped under best-effort semantics (empty for
    /// `set_canvas` and `batch`)
    pub skipped: Vec<SkippedOp>,
}

impl Commit {
    /// Whether every operation applied
    #[inline]
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }
}

#[derive(Debug, Default)]
struct StreamAssembly {
    chunks: Vec<Chunk>,
}

/// State for one canvas: current tree, history, and any open stream
#[derive(Debug)]
pub struct CanvasStore {
    canvas_id: String,
    history: VecDeque<HistorySnapshot>,
    /// Index of the current snapshot; meaningless while history is empty
    cursor: usize,
    capacity: usize,
    next_version: u64,
    stream: Option<StreamAssembly>,
}

impl CanvasStore {
    #[must_use]
    pub fn new(canvas_id: impl Into<String>) -> Self {
        Self::with_capacity(canvas_id, DEFAULT_HISTORY_CAPACITY)
    }

    /// Create a store retaining at most `capacity` snapshots
    #[must_use]
    pub fn with_capacity(canvas_id: impl Into<String>, capacity: usize) -> Self {
        Self {
            canvas_id: canvas_id.into(),
            history: VecDeque::new(),
            cursor: 0,
            capacity: capacity.max(1),
            next_version: 0,
            stream: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn canvas_id(&self) -> &str {
        &self.canvas_id
    }

    /// The current vetted tree, if a layout has been installed
    #[must_use]
    pub fn tree(&self) -> Option<&LayoutNode> {
        self.history.get(self.cursor).map(|snapshot| &snapshot.tree)
    }

    /// Version of the current snapshot, 0 before the first commit
    #[must_use]
    pub fn version(&self) -> u64 {
        self.history
            .get(self.cursor)
            .map_or(0, |snapshot| snapshot.version)
    }

    /// Retained snapshot count
    #[inline]
    #[must_use]
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    #[inline]
    #[must_use]
    pub fn is_streaming(&self) -> bool {
        self.stream.is_some()
    }

    /// Install a full layout, superseding the current tree.
    ///
    /// # Errors
    /// [`CanvasError::Schema`] when the layout fails the gate.
    pub fn set_canvas(&mut self, layout: &Value, reason: Option<String>) -> Result<Commit, CanvasError> {
        let tree = sanitized_tree(layout)?;
        Ok(self.commit(tree, reason, Vec::new()))
    }

    /// Apply a delta best-effort: failing operations are skipped and
    /// reported, the rest commit.
    ///
    /// # Errors
    /// [`CanvasError::NoCanvas`] before the first layout, or
    /// [`CanvasError::Schema`] when the patched tree fails the gate.
    pub fn patch_canvas(&mut self, delta: &Delta) -> Result<Commit, CanvasError> {
        let current = serde_json::to_value(self.tree().ok_or(CanvasError::NoCanvas)?)
            .map_err(ace_schema::SchemaError::from)?;
        let outcome = apply_delta(&current, delta);
        let tree = sanitized_tree(&outcome.tree)?;
        Ok(self.commit(tree, delta.reason.clone(), outcome.skipped))
    }

    /// Apply a delta all-or-nothing: the batch is pre-flighted and
    /// rejected whole if any operation would fail.
    ///
    /// # Errors
    /// [`CanvasError::BatchRejected`] listing every failing operation,
    /// plus the `patch_canvas` errors.
    pub fn batch(&mut self, delta: &Delta) -> Result<Commit, CanvasError> {
        let current = serde_json::to_value(self.tree().ok_or(CanvasError::NoCanvas)?)
            .map_err(ace_schema::SchemaError::from)?;
        let report = validate_delta(&current, delta);
        if !report.is_valid() {
            return Err(CanvasError::BatchRejected {
                errors: report
                    .errors
                    .iter()
                    .map(|skip| format!("op {}: {}", skip.index, skip.error))
                    .collect(),
            });
        }
        self.patch_canvas(delta)
    }

    /// Open a stream; chunks accumulate until [`complete_streaming`].
    ///
    /// # Errors
    /// [`CanvasError::AlreadyStreaming`] when a stream is open.
    ///
    /// [`complete_streaming`]: CanvasStore::complete_streaming
    pub fn start_streaming(&mut self) -> Result<(), CanvasError> {
        if self.stream.is_some() {
            return Err(CanvasError::AlreadyStreaming);
        }
        self.stream = Some(StreamAssembly::default());
        tracing::debug!(canvas_id = %self.canvas_id, "stream opened");
        Ok(())
    }

    /// Buffer one chunk; chunks may arrive out of order.
    ///
    /// # Errors
    /// [`CanvasError::NotStreaming`] when no stream is open.
    pub fn add_stream_chunk(&mut self, chunk: Chunk) -> Result<(), CanvasError> {
        self.stream
            .as_mut()
            .ok_or(CanvasError::NotStreaming)?
            .chunks
            .push(chunk);
        Ok(())
    }

    /// Assemble the buffered chunks into one commit.
    ///
    /// Fragments are ordered by chunk index; a single fragment installs
    /// as-is, several wrap in a panel. Delta chunks then apply
    /// best-effort, in index order, on top.
    ///
    /// # Errors
    /// [`CanvasError::NotStreaming`] when no stream is open,
    /// [`CanvasError::EmptyEmission`] when the stream carried neither a
    /// fragment nor a delta, or [`CanvasError::Schema`] when the
    /// assembled tree fails the gate.
    pub fn complete_streaming(&mut self) -> Result<Commit, CanvasError> {
        let mut assembly = self.stream.take().ok_or(CanvasError::NotStreaming)?;
        assembly.chunks.sort_by_key(|chunk| chunk.index);
        if assembly
            .chunks
            .iter()
            .all(|chunk| chunk.fragment.is_none() && chunk.delta.is_none())
        {
            return Err(CanvasError::EmptyEmission { operation: "stream" });
        }

        let fragments: Vec<&Value> = assembly
            .chunks
            .iter()
            .filter_map(|chunk| chunk.fragment.as_ref())
            .collect();

        let mut working = match fragments.as_slice() {
            [] => match self.tree() {
                Some(tree) => serde_json::to_value(tree).map_err(ace_schema::SchemaError::from)?,
                None => return Err(CanvasError::NoCanvas),
            },
            [only] => (*only).clone(),
            many => json!({
                "type": "Panel",
                "children": many.iter().map(|f| (*f).clone()).collect::<Vec<_>>(),
            }),
        };

        let mut skipped = Vec::new();
        let mut reason = None;
        for chunk in &assembly.chunks {
            if let Some(delta) = &chunk.delta {
                let outcome = apply_delta(&working, delta);
                working = outcome.tree;
                skipped.extend(outcome.skipped);
                if delta.reason.is_some() {
                    reason = delta.reason.clone();
                }
            }
        }

        let tree = sanitized_tree(&working)?;
        tracing::debug!(
            canvas_id = %self.canvas_id,
            chunks = assembly.chunks.len(),
            "stream assembled"
        );
        Ok(self.commit(tree, reason, skipped))
    }

    /// Whether `undo` would succeed
    #[inline]
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.cursor > 0 && !self.history.is_empty()
    }

    /// Whether `redo` would succeed
    #[inline]
    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.history.is_empty() && self.cursor + 1 < self.history.len()
    }

    /// Move the cursor one snapshot back.
    ///
    /// # Errors
    /// [`CanvasError::NothingToUndo`] at the oldest snapshot.
    pub fn undo(&mut self) -> Result<&LayoutNode, CanvasError> {
        if !self.can_undo() {
            return Err(CanvasError::NothingToUndo);
        }
        self.cursor -= 1;
        tracing::debug!(canvas_id = %self.canvas_id, version = self.version(), "undo");
        Ok(&self.history[self.cursor].tree)
    }

    /// Move the cursor one snapshot forward.
    ///
    /// # Errors
    /// [`CanvasError::NothingToRedo`] at the newest snapshot.
    pub fn redo(&mut self) -> Result<&LayoutNode, CanvasError> {
        if !self.can_redo() {
            return Err(CanvasError::NothingToRedo);
        }
        self.cursor += 1;
        tracing::debug!(canvas_id = %self.canvas_id, version = self.version(), "redo");
        Ok(&self.history[self.cursor].tree)
    }

    /// Retire the canvas: drop the tree, the history, and any open stream
    pub fn reset(&mut self) {
        self.history.clear();
        self.cursor = 0;
        self.stream = None;
        tracing::debug!(canvas_id = %self.canvas_id, "canvas reset");
    }

    /// History snapshots, oldest first; the cursor marks the current one
    #[must_use]
    pub fn snapshots(&self) -> impl Iterator<Item = &HistorySnapshot> {
        self.history.iter()
    }

    fn commit(&mut self, tree: LayoutNode, reason: Option<String>, skipped: Vec<SkippedOp>) -> Commit {
        // A commit after undo truncates the redo tail
        if !self.history.is_empty() {
            self.history.truncate(self.cursor + 1);
        }

        self.next_version += 1;
        let version = self.next_version;
        self.history.push_back(HistorySnapshot {
            tree,
            version,
            reason,
            timestamp: now_millis(),
        });

        while self.history.len() > self.capacity {
            self.history.pop_front();
        }
        self.cursor = self.history.len() - 1;

        tracing::debug!(
            canvas_id = %self.canvas_id,
            version,
            history = self.history.len(),
            "commit"
        );
        Commit { version, skipped }
    }
}
