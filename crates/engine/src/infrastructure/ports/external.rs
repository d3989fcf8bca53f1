//! Host service ports: chat, templates, dice and the query dialog.

use async_trait::async_trait;
use kitsheet_domain::{FormulaEvaluation, QueryDescriptor, RollData, RollMode};

use super::error::PortError;
use super::types::ChatMessage;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatPort: Send + Sync {
    async fn create_message(&self, message: ChatMessage) -> Result<(), PortError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TemplatePort: Send + Sync {
    async fn render(&self, path: &str, context: &serde_json::Value) -> Result<String, PortError>;
}

/// The host's roll engine.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DiceEvaluatorPort: Send + Sync {
    async fn evaluate(
        &self,
        formula: &str,
        data: &RollData,
        mode: RollMode,
    ) -> Result<FormulaEvaluation, PortError>;
}

/// Dialog asking the user to answer query descriptors before a roll.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QueryPromptPort: Send + Sync {
    /// One answer per descriptor, in descriptor order. `None` when the
    /// dialog was closed without submitting.
    async fn prompt(
        &self,
        title: &str,
        queries: &[QueryDescriptor],
    ) -> Result<Option<Vec<String>>, PortError>;
}
