//! Kitsheet Engine - console entry point.
//!
//! Runs the sheet pipeline against a JSON sheet file:
//!
//! ```text
//! kitsheet-engine <sheet.json> sheet
//! kitsheet-engine <sheet.json> feature <name>
//! kitsheet-engine <sheet.json> roll <name> [--post]
//! kitsheet-engine <sheet.json> add-category <name> [color]
//! kitsheet-engine <sheet.json> add-stat <tag> <value> [color]
//! kitsheet-engine schema
//! ```

use std::sync::Arc;

use anyhow::{anyhow, bail, Context};
use kitsheet_domain::{Character, Feature, Stat, StatColor};
use kitsheet_engine::infrastructure::{
    clock::{SystemClock, SystemRandom},
    config::{config_path_from_env, load_system_config},
    console::{ConsoleChat, ConsolePrompt},
    dice::BuiltinDiceEvaluator,
    documents::JsonFileDocuments,
    templates::BuiltinTemplates,
};
use kitsheet_engine::use_cases::{RollOptions, RollOutcome};
use kitsheet_engine::{App, HostPorts};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const USAGE: &str = "usage: kitsheet-engine <sheet.json> <sheet|feature|roll|add-category|add-stat> [args]\n       kitsheet-engine schema";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv_from_repo_root();

    // Logs go to stderr; stdout carries the JSON output.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kitsheet_engine=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = load_system_config(config_path_from_env().as_deref())?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.first().map(String::as_str) == Some("schema") {
        let schemas = [Character::schema(&config), Feature::schema()];
        println!("{}", serde_json::to_string_pretty(&schemas)?);
        return Ok(());
    }

    let [path, command, rest @ ..] = args.as_slice() else {
        bail!(USAGE);
    };

    let documents = Arc::new(JsonFileDocuments::new(path));
    let app = App::new(
        HostPorts {
            documents: documents.clone(),
            chat: Arc::new(ConsoleChat::stdout()),
            templates: Arc::new(BuiltinTemplates::new()),
            dice: Arc::new(BuiltinDiceEvaluator::new(Arc::new(SystemRandom::new()))),
            prompt: Arc::new(ConsolePrompt::stdio()),
            clock: Arc::new(SystemClock::new()),
        },
        config,
    );

    let sheet = documents
        .load()
        .await
        .with_context(|| format!("Failed to load sheet file {}", path))?;
    tracing::info!(
        path = %path,
        character = %sheet.character.name,
        features = sheet.features.len(),
        "Loaded sheet"
    );

    match (command.as_str(), rest) {
        ("sheet", []) => {
            let prepared = app.sheet.character(&sheet.character, &sheet.features);
            println!("{}", serde_json::to_string_pretty(&prepared)?);
        }
        ("feature", [name]) => {
            let feature = find_feature(&sheet.features, name)?;
            let prepared = app.sheet.feature(feature, Some(&sheet.character));
            println!("{}", serde_json::to_string_pretty(&prepared)?);
        }
        ("roll", [name, flags @ ..]) => {
            let feature = find_feature(&sheet.features, name)?;
            let post = match flags {
                [] => false,
                [flag] if flag == "--post" => true,
                _ => bail!(USAGE),
            };
            let outcome = app
                .roll
                .execute(feature, Some(&sheet.character), RollOptions { post })
                .await?;
            if outcome == RollOutcome::Cancelled {
                eprintln!("Roll cancelled");
            }
        }
        ("add-category", [name, color @ ..]) => {
            let color = match color {
                [] => None,
                [color] => Some(color.as_str()),
                _ => bail!(USAGE),
            };
            app.categories.add(&sheet.character, name, color).await?;
        }
        ("add-stat", [tag, value, color @ ..]) => {
            let value: f64 = value
                .parse()
                .with_context(|| format!("Not a number: {}", value))?;
            let color = match color {
                [] => None,
                [color] => Some(parse_color(color)?),
                _ => bail!(USAGE),
            };
            app.stats
                .add_color_stat(&sheet.character, Stat::value(tag, value), color)
                .await?;
        }
        _ => bail!(USAGE),
    }

    Ok(())
}

fn find_feature<'a>(features: &'a [Feature], name: &str) -> anyhow::Result<&'a Feature> {
    features
        .iter()
        .find(|f| f.name.eq_ignore_ascii_case(name))
        .ok_or_else(|| anyhow!("No feature named '{}'", name))
}

fn parse_color(name: &str) -> anyhow::Result<StatColor> {
    name.parse::<StatColor>()
        .with_context(|| format!("Unknown colour '{}'", name))
}

fn load_dotenv_from_repo_root() {
    let repo_root = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..");

    // Prefer local overrides.
    for filename in [".env.local", ".env"] {
        let path = repo_root.join(filename);
        if path.exists() {
            let _ = dotenvy::from_path(path);
        }
    }
}
