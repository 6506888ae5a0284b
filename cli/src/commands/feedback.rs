use anyhow::Result;
use clap::{Args, Subcommand};
use colored::Colorize;
use feedback::{FeedbackDetails, FeedbackStats};
use st_core::{FeedbackItem, FeedbackType};

use crate::output;
use crate::session::Session;

#[derive(Subcommand)]
pub enum FeedbackCommand {
    #[command(about = "Record the outcome of a generation")]
    Add(AddArgs),

    #[command(about = "Show aggregate feedback statistics")]
    Stats,

    #[command(about = "List recorded feedback")]
    List(ListArgs),

    #[command(about = "Remove all recorded feedback")]
    Clear,

    #[command(about = "Recommend a strategy for a language")]
    Recommend(RecommendArgs)
}

#[derive(Args)]
pub struct AddArgs {
    #[arg(help = "Task the code was generated for")]
    pub prompt: String,

    #[arg(help = "The generated code")]
    pub result: String,

    #[arg(long = "type", help = "positive, negative or neutral")]
    pub feedback_type: FeedbackType,

    #[arg(long)]
    pub language: Option<String>,

    #[arg(long, help = "Strategy id that produced the result")]
    pub strategy: Option<String>,

    #[arg(long)]
    pub comments: Option<String>,

    #[arg(long, help = "How the result was changed before use")]
    pub modifications: Option<String>
}

#[derive(Args)]
pub struct ListArgs {
    #[arg(long = "type", help = "Only items of this type")]
    pub feedback_type: Option<FeedbackType>,

    #[arg(long, help = "Only items for this language")]
    pub language: Option<String>,

    #[arg(long, help = "Only items for this strategy")]
    pub strategy: Option<String>,

    #[arg(long, default_value = "20", help = "Maximum items to show")]
    pub limit: usize
}

#[derive(Args)]
pub struct RecommendArgs {
    #[arg(help = "Target language")]
    pub language: String,

    #[arg(long, default_value = "", help = "Task being planned")]
    pub task: String
}

pub async fn run(cmd: FeedbackCommand, session: &Session) -> Result<()> {
    match cmd {
        FeedbackCommand::Add(args) => add(args, session).await,
        FeedbackCommand::Stats => stats(session).await,
        FeedbackCommand::List(args) => list(args, session).await,
        FeedbackCommand::Clear => clear(session).await,
        FeedbackCommand::Recommend(args) => recommend(args, session).await
    }
}

async fn add(args: AddArgs, session: &Session) -> Result<()> {
    let learner = session.learner().await;
    let details = FeedbackDetails {
        comments: args.comments,
        modifications: args.modifications,
        language: args.language,
        strategy: args.strategy
    };

    let id = learner
        .add_feedback(&args.prompt, &args.result, args.feedback_type, details)
        .await;

    if session.json {
        return output::json(&serde_json::json!({ "id": id }));
    }
    output::success(&format!("Recorded {} feedback {}", args.feedback_type, id.cyan()));
    Ok(())
}

async fn stats(session: &Session) -> Result<()> {
    let stats = session.learner().await.get_stats().await;

    if session.json {
        return output::json(&stats);
    }
    print_stats(&stats);
    Ok(())
}

fn print_stats(stats: &FeedbackStats) {
    output::header("Feedback Statistics");
    println!();
    output::field("total", &stats.total_feedback.to_string());
    output::field("positive", &stats.positive_feedback.to_string());
    output::field("negative", &stats.negative_feedback.to_string());
    output::field("neutral", &stats.neutral_feedback.to_string());

    for (title, counts) in [
        ("By language", &stats.feedback_by_language),
        ("By strategy", &stats.feedback_by_strategy)
    ] {
        if counts.is_empty() {
            continue;
        }
        println!();
        output::subheader(title);
        for (key, count) in counts {
            output::field(key, &count.to_string());
        }
    }

    if !stats.recent_feedback.is_empty() {
        println!();
        output::subheader("Recent");
        for item in &stats.recent_feedback {
            print_item(item);
        }
    }
}

async fn list(args: ListArgs, session: &Session) -> Result<()> {
    let learner = session.learner().await;
    let mut items = match args.feedback_type {
        Some(feedback_type) => learner.get_feedback_by_type(feedback_type).await,
        None => learner.get_all_feedback().await
    };
    if let Some(language) = &args.language {
        items.retain(|i| i.language.as_ref() == Some(language));
    }
    if let Some(strategy) = &args.strategy {
        items.retain(|i| i.strategy.as_ref() == Some(strategy));
    }
    items.truncate(args.limit);

    if session.json {
        return output::json(&items);
    }
    if items.is_empty() {
        println!("{}", "No feedback recorded".dimmed());
        return Ok(());
    }
    output::header(&format!("Feedback ({})", items.len()));
    println!();
    for item in &items {
        print_item(item);
    }
    Ok(())
}

fn print_item(item: &FeedbackItem) {
    let kind = match item.feedback_type {
        FeedbackType::Positive => "positive".green(),
        FeedbackType::Negative => "negative".red(),
        FeedbackType::Neutral => "neutral".yellow()
    };
    let tags: Vec<&str> = [item.language.as_deref(), item.strategy.as_deref()]
        .into_iter()
        .flatten()
        .collect();
    println!(
        "  {} {:<8} {} {}",
        item.timestamp.format("%Y-%m-%d %H:%M").to_string().dimmed(),
        kind,
        item.prompt,
        format!("[{}]", tags.join(", ")).dimmed()
    );
}

async fn clear(session: &Session) -> Result<()> {
    let learner = session.learner().await;
    let removed = learner.len().await;
    learner.clear_feedback().await;

    if session.json {
        return output::json(&serde_json::json!({ "removed": removed }));
    }
    output::success(&format!("Removed {removed} feedback items"));
    Ok(())
}

async fn recommend(args: RecommendArgs, session: &Session) -> Result<()> {
    let recommendation = session
        .learner()
        .await
        .get_recommendation(&args.task, &args.language)
        .await;

    if session.json {
        return output::json(&recommendation);
    }
    output::header(&format!("Recommendation for {}", args.language));
    println!();
    output::field("strategy", &recommendation.strategy);
    output::field("confidence", &format!("{:.2}", recommendation.confidence));
    output::field("samples", &recommendation.sample_size.to_string());
    if !recommendation.is_informed() {
        println!();
        output::hint("no positive history yet; generation will use the keyword heuristic");
    }
    Ok(())
}
