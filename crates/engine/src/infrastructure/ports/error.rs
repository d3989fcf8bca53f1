//! Error types for port operations.

/// A call into the host failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortError {
    /// Document not found - includes document type and ID for actionable messages.
    #[error("{entity_type} not found: {id}")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// Host operation failed - includes operation name for tracing.
    #[error("Host error in {operation}: {message}")]
    Host {
        operation: &'static str,
        message: String,
    },

    /// Serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Template rendering failed.
    #[error("Template error in {path}: {message}")]
    Template { path: String, message: String },

    /// The dice evaluator rejected the formula or its references.
    #[error("Roll evaluation failed: {0}")]
    Evaluation(String),
}

impl PortError {
    pub fn not_found(entity_type: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity_type,
            id: id.to_string(),
        }
    }

    pub fn host(operation: &'static str, message: impl ToString) -> Self {
        Self::Host {
            operation,
            message: message.to_string(),
        }
    }

    pub fn serialization(message: impl ToString) -> Self {
        Self::Serialization(message.to_string())
    }

    pub fn template(path: impl Into<String>, message: impl ToString) -> Self {
        Self::Template {
            path: path.into(),
            message: message.to_string(),
        }
    }

    pub fn evaluation(message: impl ToString) -> Self {
        Self::Evaluation(message.to_string())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Formula problems degrade a roll instead of failing it.
    pub fn is_evaluation(&self) -> bool {
        matches!(self, Self::Evaluation(_))
    }
}

impl From<serde_json::Error> for PortError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(err)
    }
}
