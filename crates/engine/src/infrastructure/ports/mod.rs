//! Port traits for infrastructure boundaries.
//!
//! These are the ONLY abstractions in the engine. Everything else is concrete types.
//! Ports exist for:
//! - Document persistence (owned by the host)
//! - Chat broadcast and template rendering (owned by the host)
//! - Dice evaluation (host roll engine, or the built-in evaluator)
//! - The query dialog (host UI, or the console)
//! - Clock/Random (for testing)

mod documents;
mod error;
mod external;
mod testing;
pub mod types;

pub use documents::DocumentPort;
pub use external::{ChatPort, DiceEvaluatorPort, QueryPromptPort, TemplatePort};
pub use types::{ChatMessage, ChatSpeaker, RollSummary};

#[cfg(test)]
pub use documents::MockDocumentPort;
#[cfg(test)]
pub use external::{MockChatPort, MockDiceEvaluatorPort, MockQueryPromptPort, MockTemplatePort};

pub use testing::{ClockPort, RandomPort};

pub use error::PortError;
