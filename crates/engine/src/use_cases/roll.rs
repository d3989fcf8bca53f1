//! Roll a feature into the chat log.
//!
//! Each call works from a snapshot taken at the start: the description,
//! the query descriptors found in it and the roll data. Two concurrent
//! rolls of the same feature never share answers or descriptors.
//!
//! Steps:
//! 1. Plan: an empty or malformed formula forces a post with formula `"1"`.
//! 2. Evaluate: actual, maximized and minimized totals in parallel, used to
//!    classify crits. A formula the evaluator rejects degrades to a post.
//! 3. Ask: one answer per query descriptor. Closing the dialog aborts the
//!    roll and nothing is sent.
//! 4. Render and broadcast.

use std::sync::Arc;

use kitsheet_domain::{
    classify_crit, label_keys, Character, CritKind, Enricher, Feature, QueryDescriptor, RollData,
    RollMode, RollPlan, SystemConfig,
};
use serde_json::json;

use crate::infrastructure::ports::{
    ChatMessage, ChatPort, ChatSpeaker, ClockPort, DiceEvaluatorPort, PortError, QueryPromptPort,
    RollSummary, TemplatePort,
};
use crate::infrastructure::templates::FEATURE_ROLL_TEMPLATE;

#[derive(Debug, thiserror::Error)]
pub enum RollError {
    #[error("Port error: {0}")]
    Port(#[from] PortError),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RollOptions {
    /// Broadcast the description without evaluating the formula
    pub post: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RollOutcome {
    Posted(ChatMessage),
    /// The query dialog was closed; nothing was sent.
    Cancelled,
}

/// Everything a roll reads from the documents, captured once.
struct RollSnapshot {
    description: String,
    queries: Vec<QueryDescriptor>,
    data: RollData,
}

pub struct RollFeature {
    dice: Arc<dyn DiceEvaluatorPort>,
    prompt: Arc<dyn QueryPromptPort>,
    templates: Arc<dyn TemplatePort>,
    chat: Arc<dyn ChatPort>,
    clock: Arc<dyn ClockPort>,
    config: Arc<SystemConfig>,
}

impl RollFeature {
    pub fn new(
        dice: Arc<dyn DiceEvaluatorPort>,
        prompt: Arc<dyn QueryPromptPort>,
        templates: Arc<dyn TemplatePort>,
        chat: Arc<dyn ChatPort>,
        clock: Arc<dyn ClockPort>,
        config: Arc<SystemConfig>,
    ) -> Self {
        Self {
            dice,
            prompt,
            templates,
            chat,
            clock,
            config,
        }
    }

    pub async fn execute(
        &self,
        feature: &Feature,
        owner: Option<&Character>,
        options: RollOptions,
    ) -> Result<RollOutcome, RollError> {
        let enricher = Enricher::for_feature(feature, owner, &self.config);
        let snapshot = RollSnapshot {
            description: feature.system.description.clone(),
            queries: enricher.enrich(&feature.system.description).queries,
            data: enricher.context().roll_data(),
        };

        let configured = feature.system.details.formula.as_str();
        let plan = RollPlan::from_formula(configured, options.post);
        if plan.is_fallback() && !configured.trim().is_empty() {
            tracing::warn!(
                feature_id = %feature.id,
                formula = %configured,
                "Formula is not valid, posting instead"
            );
        }

        let roll = if plan.post {
            None
        } else {
            match self.evaluate(&plan.formula, &snapshot.data).await {
                Ok(summary) => Some(summary),
                Err(e) if e.is_evaluation() => {
                    tracing::warn!(
                        feature_id = %feature.id,
                        formula = %plan.formula,
                        error = %e,
                        "Formula could not be evaluated, posting instead"
                    );
                    None
                }
                Err(e) => return Err(e.into()),
            }
        };

        let answers = if snapshot.queries.is_empty() {
            Vec::new()
        } else {
            let title = self
                .config
                .format(label_keys::QUERY_TITLE, &[("feature", feature.name.as_str())]);
            match self.prompt.prompt(&title, &snapshot.queries).await? {
                Some(answers) => answers,
                None => {
                    tracing::info!(feature_id = %feature.id, "Roll cancelled from query dialog");
                    return Ok(RollOutcome::Cancelled);
                }
            }
        };

        let content = enricher.enrich_chat(&snapshot.description, &answers).html;
        let crit = roll.as_ref().and_then(|r| r.crit);
        let context = json!({
            "feature": feature.name,
            "character": owner.map(|o| o.name.as_str()),
            "content": content,
            "formula": plan.formula,
            "roll": roll,
            "crit": crit,
            "critLabel": crit.map(|c| self.crit_label(c)),
            "post": roll.is_none(),
            "palette": feature.palette(owner, &self.config),
        });
        let content = self.templates.render(FEATURE_ROLL_TEMPLATE, &context).await?;

        let flavor = match owner {
            Some(owner) => self.config.format(
                label_keys::ROLL_FLAVOR,
                &[("feature", feature.name.as_str()), ("character", owner.name.as_str())],
            ),
            None => feature.name.clone(),
        };

        let message = ChatMessage {
            speaker: ChatSpeaker {
                character: owner.map(|o| o.id),
                feature: feature.id,
                alias: owner.map_or_else(|| feature.name.clone(), |o| o.name.clone()),
            },
            flavor,
            content,
            formula: plan.formula,
            post: roll.is_none(),
            roll,
            timestamp: self.clock.now(),
        };
        self.chat.create_message(message.clone()).await?;

        tracing::info!(
            feature_id = %feature.id,
            post = message.post,
            total = ?message.roll.as_ref().map(|r| r.total),
            crit = ?crit,
            answers = answers.len(),
            "Feature rolled"
        );
        Ok(RollOutcome::Posted(message))
    }

    async fn evaluate(&self, formula: &str, data: &RollData) -> Result<RollSummary, PortError> {
        let (actual, max, min) = tokio::try_join!(
            self.dice.evaluate(formula, data, RollMode::Normal),
            self.dice.evaluate(formula, data, RollMode::Maximize),
            self.dice.evaluate(formula, data, RollMode::Minimize),
        )?;

        tracing::debug!(
            formula = %formula,
            total = actual.total,
            max = max.total,
            min = min.total,
            deterministic = actual.deterministic,
            "Evaluated roll"
        );
        Ok(RollSummary {
            crit: classify_crit(actual.total, max.total, min.total, actual.deterministic),
            formula: actual.formula,
            total: actual.total,
            breakdown: actual.breakdown,
        })
    }

    fn crit_label(&self, crit: CritKind) -> String {
        let key = match crit {
            CritKind::Success => label_keys::CRIT_SUCCESS,
            CritKind::Failure => label_keys::CRIT_FAILURE,
        };
        self.config.label(key).to_string()
    }
}
