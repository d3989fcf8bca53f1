//! Built-in chat card templates.
//!
//! The host normally renders Handlebars files; this adapter covers the
//! templates the engine uses with plain string formatting so the binary
//! works without a host.

use async_trait::async_trait;
use kitsheet_domain::common::escape_html;
use serde_json::Value;

use crate::infrastructure::ports::{PortError, TemplatePort};

pub const FEATURE_ROLL_TEMPLATE: &str = "templates/chat/feature-roll.hbs";

#[derive(Debug, Default)]
pub struct BuiltinTemplates;

impl BuiltinTemplates {
    pub fn new() -> Self {
        Self
    }
}

fn text<'a>(context: &'a Value, key: &str) -> &'a str {
    context.get(key).and_then(Value::as_str).unwrap_or_default()
}

fn feature_roll(context: &Value) -> String {
    let palette = &context["palette"];
    let mut html = format!(
        "<div class=\"kit-card\" style=\"--kit-primary: {}; --kit-secondary: {}; --kit-contrast: {}\">",
        escape_html(text(palette, "primary")),
        escape_html(text(palette, "secondary")),
        escape_html(text(palette, "contrast")),
    );
    html.push_str(&format!(
        "<header class=\"kit-card-title\">{}</header>",
        escape_html(text(context, "feature"))
    ));

    if let Some(roll) = context.get("roll").filter(|r| !r.is_null()) {
        let crit = text(context, "crit");
        let crit_class = if crit.is_empty() {
            String::new()
        } else {
            format!(" kit-crit-{}", crit)
        };
        html.push_str(&format!(
            "<div class=\"kit-roll{}\" data-tooltip=\"{}\"><span class=\"kit-roll-formula\">{}</span> <span class=\"kit-roll-total\">{}</span></div>",
            crit_class,
            escape_html(text(roll, "breakdown")),
            escape_html(text(roll, "formula")),
            roll.get("total").and_then(Value::as_i64).unwrap_or_default(),
        ));
        let label = text(context, "critLabel");
        if !label.is_empty() {
            html.push_str(&format!(
                "<div class=\"kit-crit-label\">{}</div>",
                escape_html(label)
            ));
        }
    }

    // Already enriched HTML.
    html.push_str(&format!(
        "<section class=\"kit-card-content\">{}</section></div>",
        text(context, "content")
    ));
    html
}

#[async_trait]
impl TemplatePort for BuiltinTemplates {
    async fn render(&self, path: &str, context: &Value) -> Result<String, PortError> {
        match path {
            FEATURE_ROLL_TEMPLATE => Ok(feature_roll(context)),
            other => Err(PortError::template(other, "unknown template")),
        }
    }
}
