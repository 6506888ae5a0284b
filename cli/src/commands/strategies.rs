use anyhow::Result;
use clap::{Args, Subcommand};
use colored::Colorize;
use errors::EngineError;
use serde::Serialize;
use strategy::{SelectionTrace, StrategyRegistry, provider_from_config};

use crate::output;
use crate::session::Session;

#[derive(Subcommand)]
pub enum StrategiesCommand {
    #[command(about = "List registered strategies")]
    List,

    #[command(about = "Show which strategy a task would get")]
    Select(SelectArgs)
}

#[derive(Args)]
pub struct SelectArgs {
    #[arg(help = "Task description")]
    pub task: String,

    #[arg(short, long, help = "Target language")]
    pub language: String
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SelectionPreview {
    heuristic: SelectionTrace,
    recommendation: feedback::Recommendation,
    selected: String,
    selected_by: &'static str
}

pub async fn run(cmd: StrategiesCommand, session: &Session) -> Result<()> {
    let provider = provider_from_config(&session.config.providers).map_err(EngineError::from)?;
    let registry = StrategyRegistry::with_builtin(provider);
    match cmd {
        StrategiesCommand::List => list(&registry, session),
        StrategiesCommand::Select(args) => select(args, &registry, session).await
    }
}

fn list(registry: &StrategyRegistry, session: &Session) -> Result<()> {
    let infos = registry.infos();
    if session.json {
        return output::json(&infos);
    }

    output::header("Strategies");
    for info in &infos {
        println!();
        println!(
            "  {} {} {}",
            info.id.cyan().bold(),
            info.name,
            format!("({})", info.complexity).dimmed()
        );
        println!("    {}", info.description);
        if !info.suitable_for.is_empty() {
            println!("    {} {}", "good for:".green(), info.suitable_for.join(", "));
        }
        if !info.not_suitable_for.is_empty() {
            println!("    {} {}", "avoid for:".yellow(), info.not_suitable_for.join(", "));
        }
    }
    Ok(())
}

/// Mirrors the order generation uses: an informed recommendation first,
/// the keyword heuristic otherwise.
async fn select(args: SelectArgs, registry: &StrategyRegistry, session: &Session) -> Result<()> {
    let heuristic = registry.selection_trace(&args.task, &args.language);
    let recommendation = session
        .learner()
        .await
        .get_recommendation(&args.task, &args.language)
        .await;

    let (selected, selected_by) =
        if recommendation.is_informed() && registry.contains(&recommendation.strategy) {
            (recommendation.strategy.clone(), "recommendation")
        } else {
            (heuristic.selected.clone(), "heuristic")
        };

    let preview = SelectionPreview {
        heuristic,
        recommendation,
        selected,
        selected_by
    };

    if session.json {
        return output::json(&preview);
    }

    output::header("Strategy Selection");
    println!();
    output::field("selected", &preview.selected);
    output::field("selected by", preview.selected_by);
    println!();
    output::subheader("Heuristic");
    output::field("rule", preview.heuristic.rule.unwrap_or("default"));
    output::field("preferred", preview.heuristic.preferred);
    if preview.heuristic.fell_back {
        output::warn(&format!(
            "'{}' is not registered; fell back to direct",
            preview.heuristic.preferred
        ));
    }
    println!();
    output::subheader("Feedback");
    output::field("strategy", &preview.recommendation.strategy);
    output::field(
        "confidence",
        &format!("{:.2}", preview.recommendation.confidence)
    );
    output::field("samples", &preview.recommendation.sample_size.to_string());
    Ok(())
}
