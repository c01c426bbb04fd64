//! Wire shapes exchanged with agents
//!
//! Inbound: an agent emits a full layout (`replace`), a delta batch
//! (`patch`), partial chunks (`stream`), or a `reset`. Outbound: canvas
//! events flow back to the agent loop through [`EventEnvelope`]s. The
//! layout payload stays a raw [`serde_json::Value`] here; it is untrusted
//! until the validation gate has passed it.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Milliseconds since the Unix epoch, the timestamp unit on the wire
#[inline]
#[must_use]
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// What an emission asks the canvas to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CanvasOperation {
    /// Install a full layout, superseding the current tree
    Replace,
    /// Apply a delta batch to the current tree
    Patch,
    /// Append streaming chunks
    Stream,
    /// Retire the canvas entirely
    Reset,
}

/// One agent emission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Emission {
    pub operation: CanvasOperation,
    pub canvas_id: String,
    /// Agent-side world-model version, recorded for diagnostics
    pub version: u64,
    /// Untrusted layout, present for `replace`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<Value>,
    /// Delta batch, present for `patch`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta: Option<Delta>,
    /// Stream chunks, present for `stream`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunks: Option<Vec<Chunk>>,
}

/// An ordered batch of tree mutations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Delta {
    /// Applied strictly in list order
    pub operations: Vec<PatchOp>,
    /// Human-readable reason, carried into history snapshots
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub timestamp: i64,
}

impl Delta {
    #[inline]
    #[must_use]
    pub fn new(operations: Vec<PatchOp>) -> Self {
        Self {
            operations,
            reason: None,
            timestamp: now_millis(),
        }
    }

    #[inline]
    #[must_use]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

/// One mutation inside a delta
///
/// `replace`/`add`/`remove`/`reorder` are path-addressed; `update_props`
/// and `update_data` are addressed by `componentId` (tree-searched, not
/// path-searched) so they survive reordering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum PatchOp {
    /// Overwrite the value at a slash-delimited path
    Replace { path: String, value: Value },
    /// Insert at a path; an array index equal to the length appends
    Add { path: String, value: Value },
    /// Delete the terminal key or splice the array index
    Remove { path: String },
    /// Shallow-merge into the addressed leaf's props
    UpdateProps {
        component_id: String,
        props: Map<String, Value>,
    },
    /// Replace the addressed leaf's data wholesale
    UpdateData { component_id: String, data: Value },
    /// Move a child within a container's `children` array
    Reorder {
        parent_path: String,
        from_index: usize,
        to_index: usize,
    },
}

/// One streaming chunk: a layout fragment, a delta, or both absent (no-op)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chunk {
    /// Assembly order; chunks may arrive out of order
    pub index: u32,
    /// Untrusted layout fragment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fragment: Option<Value>,
    /// Delta applied after fragments are assembled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta: Option<Delta>,
    /// Marks the final chunk of the stream
    #[serde(default)]
    pub last: bool,
}

impl Chunk {
    #[inline]
    #[must_use]
    pub fn fragment(index: u32, fragment: Value) -> Self {
        Self {
            index,
            fragment: Some(fragment),
            delta: None,
            last: false,
        }
    }

    #[inline]
    #[must_use]
    pub fn delta(index: u32, delta: Delta) -> Self {
        Self {
            index,
            fragment: None,
            delta: Some(delta),
            last: false,
        }
    }

    #[inline]
    #[must_use]
    pub fn finishing(mut self) -> Self {
        self.last = true;
        self
    }
}

/// A canvas-origin event, the only sanctioned path from rendered UI back
/// into agent reasoning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum CanvasEvent {
    /// User clicked inside a rendered leaf
    Click {
        component_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        detail: Option<Value>,
    },
    /// An input's value changed
    ValueChange { component_id: String, value: Value },
    /// User drilled into a chart/table dimension
    DrillDown {
        component_id: String,
        dimension: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<Value>,
    },
    /// A filter was applied, scoped to a leaf or the whole canvas
    FilterApplied {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        component_id: Option<String>,
        filter: Value,
    },
    /// User asked to export a leaf's contents
    ExportRequest { component_id: String, format: String },
    /// Free-text question typed at the canvas
    Question {
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        component_id: Option<String>,
    },
    /// User asked the canvas to undo
    UndoRequest,
    /// User asked the canvas to redo
    RedoRequest,
}

impl CanvasEvent {
    /// Discriminant used for subscriber filtering
    #[must_use]
    pub fn kind(&self) -> CanvasEventKind {
        match self {
            Self::Click { .. } => CanvasEventKind::Click,
            Self::ValueChange { .. } => CanvasEventKind::ValueChange,
            Self::DrillDown { .. } => CanvasEventKind::DrillDown,
            Self::FilterApplied { .. } => CanvasEventKind::FilterApplied,
            Self::ExportRequest { .. } => CanvasEventKind::ExportRequest,
            Self::Question { .. } => CanvasEventKind::Question,
            Self::UndoRequest => CanvasEventKind::UndoRequest,
            Self::RedoRequest => CanvasEventKind::RedoRequest,
        }
    }
}

/// Event discriminant, for subscription filters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanvasEventKind {
    Click,
    ValueChange,
    DrillDown,
    FilterApplied,
    ExportRequest,
    Question,
    UndoRequest,
    RedoRequest,
}

/// A canvas event plus its delivery context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventEnvelope {
    pub event: CanvasEvent,
    pub canvas_id: String,
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
}

impl EventEnvelope {
    #[inline]
    #[must_use]
    pub fn new(event: CanvasEvent, canvas_id: impl Into<String>) -> Self {
        Self {
            event,
            canvas_id: canvas_id.into(),
            timestamp: now_millis(),
            session_id: None,
            user_id: None,
            tenant_id: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    #[inline]
    #[must_use]
    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    #[inline]
    #[must_use]
    pub fn with_tenant(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn emission_wire_shape() {
        let raw = json!({
            "operation": "replace",
            "canvasId": "cv_1",
            "version": 3,
            "layout": { "type": "Panel", "children": [] },
        });

        let emission: Emission = serde_json::from_value(raw).unwrap();
        assert_eq!(emission.operation, CanvasOperation::Replace);
        assert_eq!(emission.canvas_id, "cv_1");
        assert!(emission.layout.is_some());
        assert!(emission.delta.is_none());
    }

    #[test]
    fn patch_op_tags_snake_case() {
        let op = PatchOp::UpdateProps {
            component_id: "kpi_1".into(),
            props: Map::new(),
        };
        let value = serde_json::to_value(&op).unwrap();
        assert_eq!(value["op"], "update_props");
        assert_eq!(value["componentId"], "kpi_1");
    }

    #[test]
    fn delta_round_trip() {
        let delta = Delta::new(vec![PatchOp::Remove {
            path: "/children/0".into(),
        }])
        .with_reason("drop stale chart");

        let value = serde_json::to_value(&delta).unwrap();
        assert_eq!(value["reason"], "drop stale chart");
        assert!(value["timestamp"].as_i64().unwrap() > 0);

        let back: Delta = serde_json::from_value(value).unwrap();
        assert_eq!(back, delta);
    }

    #[test]
    fn event_kind_matches_variant() {
        let event = CanvasEvent::DrillDown {
            component_id: "chart_1".into(),
            dimension: "region".into(),
            value: None,
        };
        assert_eq!(event.kind(), CanvasEventKind::DrillDown);
        assert_eq!(CanvasEvent::UndoRequest.kind(), CanvasEventKind::UndoRequest);
    }

    #[test]
    fn envelope_context_builders() {
        let envelope = EventEnvelope::new(CanvasEvent::RedoRequest, "cv_9")
            .with_session("s1")
            .with_user("u1")
            .with_tenant("t1");

        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(value["canvasId"], "cv_9");
        assert_eq!(value["event"]["type"], "redo_request");
        assert_eq!(value["sessionId"], "s1");
        assert_eq!(value["userId"], "u1");
        assert_eq!(value["tenantId"], "t1");
    }

    #[test]
    fn chunk_builders() {
        let chunk = Chunk::fragment(0, json!({"type": "Panel", "children": []})).finishing();
        assert!(chunk.last);
        assert!(chunk.fragment.is_some());
        assert!(chunk.delta.is_none());
    }
}
