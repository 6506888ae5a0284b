use anyhow::Result;
use clap::Parser;
use errors::EngineError;
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod commands;
mod output;
mod session;
pub mod ux_error;

use commands::{Cli, Commands};
use session::Session;
use ux_error::UxError;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let json = cli.json;

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report(&err, json);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    if let Commands::Completion(args) = cli.command {
        return commands::completion::run(args);
    }

    let overrides = cli.log_level.map(|level| {
        let mut config = config::Config::default();
        config.observability.logging_level = level.to_lowercase();
        config
    });
    let config = config::load(cli.config.as_deref(), overrides)
        .map_err(|e| ux_error::config_error(&e.to_string()))?;

    // RUST_LOG wins over the configured level. Logs go to stderr so
    // --json output stays parseable.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.observability.logging_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    tracing::debug!(
        provider = %config.providers.provider,
        feedback = %config.feedback.store_path.display(),
        "Configuration resolved"
    );

    let session = Session::new(config, cli.json);
    match cli.command {
        Commands::Generate(args) => commands::generate::run(args, &session).await,
        Commands::Feedback(cmd) => commands::feedback::run(cmd, &session).await,
        Commands::Context(cmd) => commands::context::run(cmd, &session).await,
        Commands::Strategies(cmd) => commands::strategies::run(cmd, &session).await,
        Commands::Extensions(cmd) => commands::extensions::run(cmd, &session).await,
        Commands::Completion(args) => commands::completion::run(args)
    }
}

fn report(err: &anyhow::Error, json: bool) {
    let fallback;
    let ux = if let Some(engine) = err.downcast_ref::<EngineError>() {
        fallback = ux_error::from_engine(engine);
        &fallback
    } else if let Some(ux) = err.downcast_ref::<UxError>() {
        ux
    } else {
        fallback = UxError::new(format!("{err:#}"));
        &fallback
    };

    if json {
        print_body(&ux.to_body());
    } else {
        ux.display();
    }
}

fn print_body(body: &errors::ErrorBody) {
    match serde_json::to_string_pretty(&serde_json::json!({ "error": body })) {
        Ok(text) => println!("{text}"),
        Err(_) => output::warn(&body.message)
    }
}
