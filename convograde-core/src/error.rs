//! Error types for convograde-core

use thiserror::Error;

/// Main error type for the convograde-core library
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Input text was not valid JSON at all
    #[error("file is not valid JSON: {0}")]
    Syntax(serde_json::Error),

    /// Valid JSON that does not conform to the export contract
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// JSON serialization error outside the import boundary
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// LLM error
    #[error("LLM error: {0}")]
    Llm(String),

    /// Rating error (unknown dimension, out-of-range score)
    #[error("rating error: {0}")]
    Rating(String),
}

impl Error {
    /// The validation failure behind this error, if that is what it is.
    ///
    /// Import failures are the primary user-facing error surface, so
    /// callers frequently need the field-specific detail back.
    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            Error::Validation(v) => Some(v),
            _ => None,
        }
    }
}

/// Field-specific failures raised while validating a raw conversation export.
///
/// Checks run fail-fast in the order the variants are declared here, and
/// every node-level variant names the offending mapping key so a bad record
/// can be located inside a large export.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The top-level value is not a JSON object
    #[error("conversation must be a JSON object")]
    InvalidShape,

    /// `title` is missing, not a string, or empty
    #[error("conversation title must be a non-empty string")]
    MissingTitle,

    /// `mapping` is missing or not an object
    #[error("conversation mapping must be an object")]
    MissingMapping,

    /// `mapping` is an object with no entries
    #[error("conversation mapping has no nodes")]
    EmptyMapping,

    /// A mapping value is not an object
    #[error("node `{node_id}` is not an object")]
    InvalidNode { node_id: String },

    /// A node carries an `id` that differs from its mapping key
    #[error("node `{node_id}` has mismatched id `{found}`")]
    NodeIdMismatch { node_id: String, found: String },

    /// A node's message violates the message-shape rules
    #[error("node `{node_id}` has an invalid message: {reason}")]
    InvalidMessage { node_id: String, reason: String },

    /// No node in the whole mapping yields extractable content
    #[error("conversation has no messages with extractable content")]
    NoValidMessages,
}

impl ValidationError {
    /// Stable machine-readable name for the failure kind.
    pub fn kind(&self) -> &'static str {
        match self {
            ValidationError::InvalidShape => "invalid_shape",
            ValidationError::MissingTitle => "missing_title",
            ValidationError::MissingMapping => "missing_mapping",
            ValidationError::EmptyMapping => "empty_mapping",
            ValidationError::InvalidNode { .. } => "invalid_node",
            ValidationError::NodeIdMismatch { .. } => "node_id_mismatch",
            ValidationError::InvalidMessage { .. } => "invalid_message",
            ValidationError::NoValidMessages => "no_valid_messages",
        }
    }

    /// Mapping key of the node the failure points at, where one exists.
    pub fn node_id(&self) -> Option<&str> {
        match self {
            ValidationError::InvalidNode { node_id }
            | ValidationError::NodeIdMismatch { node_id, .. }
            | ValidationError::InvalidMessage { node_id, .. } => Some(node_id),
            _ => None,
        }
    }
}

/// Result type alias for convograde-core
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_kinds_are_distinct() {
        let errors = [
            ValidationError::InvalidShape,
            ValidationError::MissingTitle,
            ValidationError::MissingMapping,
            ValidationError::EmptyMapping,
            ValidationError::InvalidNode {
                node_id: "a".into(),
            },
            ValidationError::NodeIdMismatch {
                node_id: "a".into(),
                found: "b".into(),
            },
            ValidationError::InvalidMessage {
                node_id: "a".into(),
                reason: "broken".into(),
            },
            ValidationError::NoValidMessages,
        ];

        let mut kinds: Vec<&str> = errors.iter().map(|e| e.kind()).collect();
        kinds.sort_unstable();
        kinds.dedup();
        assert_eq!(kinds.len(), errors.len());
    }

    #[test]
    fn node_errors_carry_the_mapping_key() {
        let err = ValidationError::NodeIdMismatch {
            node_id: "node-7".into(),
            found: "node-8".into(),
        };
        assert_eq!(err.node_id(), Some("node-7"));
        assert!(err.to_string().contains("node-7"));
        assert!(err.to_string().contains("node-8"));

        assert_eq!(ValidationError::NoValidMessages.node_id(), None);
    }
}
