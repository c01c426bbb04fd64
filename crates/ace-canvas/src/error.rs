//! Canvas-level errors

use ace_schema::SchemaError;

/// Anything a canvas mutation or query can fail with
#[derive(Debug, thiserror::Error)]
pub enum CanvasError {
    /// The emission failed the validation gate
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// No layout has been installed yet
    #[error("no canvas installed")]
    NoCanvas,

    /// A stream operation arrived while no stream is open
    #[error("no stream in progress")]
    NotStreaming,

    /// A second stream was opened before the first completed
    #[error("a stream is already in progress")]
    AlreadyStreaming,

    /// The emission carried no payload for its operation
    #[error("emission carries no payload for `{operation}`")]
    EmptyEmission { operation: &'static str },

    /// Undo requested at the oldest snapshot
    #[error("nothing to undo")]
    NothingToUndo,

    /// Redo requested at the newest snapshot
    #[error("nothing to redo")]
    NothingToRedo,

    /// An atomic batch pre-flight found failing operations
    #[error("batch rejected: {}", errors.join("; "))]
    BatchRejected { errors: Vec<String> },
}
