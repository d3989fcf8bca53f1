//! Built-in dice evaluator.
//!
//! Stands in for the host's roll engine: parses the formula with the
//! domain grammar and draws faces from a [`RandomPort`].

use std::sync::Arc;

use async_trait::async_trait;
use kitsheet_domain::{DiceExpression, FormulaEvaluation, RollData, RollMode};

use crate::infrastructure::ports::{DiceEvaluatorPort, PortError, RandomPort};

pub struct BuiltinDiceEvaluator {
    random: Arc<dyn RandomPort>,
}

impl BuiltinDiceEvaluator {
    pub fn new(random: Arc<dyn RandomPort>) -> Self {
        Self { random }
    }
}

#[async_trait]
impl DiceEvaluatorPort for BuiltinDiceEvaluator {
    async fn evaluate(
        &self,
        formula: &str,
        data: &RollData,
        mode: RollMode,
    ) -> Result<FormulaEvaluation, PortError> {
        let expression = DiceExpression::parse(formula).map_err(PortError::evaluation)?;
        let evaluation = expression
            .evaluate(data, mode, |sides| self.random.roll_die(sides))
            .map_err(PortError::evaluation)?;

        tracing::debug!(
            formula = %formula,
            mode = ?mode,
            total = evaluation.total,
            breakdown = %evaluation.breakdown,
            "Evaluated dice formula"
        );
        Ok(evaluation)
    }
}
