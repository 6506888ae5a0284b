pub mod completion;
pub mod context;
pub mod extensions;
pub mod feedback;
pub mod generate;
pub mod strategies;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "strata",
    author,
    version,
    about = "Strata - context-aware code generation that learns from feedback",
    long_about = "Generates code with pluggable strategies, informed by the surrounding \
                  file, directory, project and workspace.\n\nEvery command works without \
                  configuration; the default model provider is an offline mock."
)]
pub struct Cli {
    #[arg(
        long,
        global = true,
        env = "STRATA_CONFIG",
        help = "Configuration file (.toml, .yaml or .yml)"
    )]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, help = "Output as JSON")]
    pub json: bool,

    #[arg(
        long,
        global = true,
        help = "Log verbosity (trace, debug, info, warn, error)"
    )]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Generate code for a task")]
    Generate(generate::GenerateArgs),

    #[command(subcommand, about = "Record, inspect and learn from feedback")]
    Feedback(feedback::FeedbackCommand),

    #[command(subcommand, about = "Show code context for a path")]
    Context(context::ContextCommand),

    #[command(subcommand, about = "List strategies and preview selection")]
    Strategies(strategies::StrategiesCommand),

    #[command(subcommand, about = "Discover capability modules")]
    Extensions(extensions::ExtensionsCommand),

    #[command(about = "Generate shell completions")]
    Completion(completion::CompletionArgs)
}
