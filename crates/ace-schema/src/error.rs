//! Error types for the schema gate
//!
//! Schema failures are fail-closed: a rejected layout never reaches the
//! canvas, and the caller gets the full error list up front.

/// Why an untrusted layout was rejected by the gate
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// Validation produced one or more errors; nothing was rendered
    #[error("layout rejected: {}", errors.join("; "))]
    Invalid {
        /// Every validation error, with its tree path
        errors: Vec<String>,
    },

    /// The sanitized tree failed to deserialize into the typed layout
    #[error("layout deserialization failed: {0}")]
    Deserialize(#[from] serde_json::Error),
}

impl SchemaError {
    /// Number of individual validation errors carried
    #[inline]
    #[must_use]
    pub fn error_count(&self) -> usize {
        match self {
            Self::Invalid { errors } => errors.len(),
            Self::Deserialize(_) => 1,
        }
    }
}
