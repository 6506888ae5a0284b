use agent_dispatch::{Dispatcher, InMemoryTransport};
use anyhow::Result;
use clap::{Args, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;

use crate::output;
use crate::session::Session;
use crate::ux_error;

#[derive(Subcommand)]
pub enum ExtensionsCommand {
    #[command(about = "Load every capability module under a directory")]
    Discover(DiscoverArgs)
}

#[derive(Args)]
pub struct DiscoverArgs {
    #[arg(help = "Module root; defaults to integration.extensions_dir")]
    pub dir: Option<PathBuf>
}

pub async fn run(cmd: ExtensionsCommand, session: &Session) -> Result<()> {
    match cmd {
        ExtensionsCommand::Discover(args) => discover(args, session).await
    }
}

async fn discover(args: DiscoverArgs, session: &Session) -> Result<()> {
    let dir = args
        .dir
        .or_else(|| session.config.integration.extensions_dir.clone())
        .ok_or_else(ux_error::no_extensions_dir)?;

    let dispatcher = Dispatcher::from_config(
        &session.config.integration,
        Arc::new(InMemoryTransport::new())
    );
    let loaded = dispatcher.discover(&dir).await;
    dispatcher.deactivate_all().await;

    if session.json {
        return output::json(&loaded);
    }
    if loaded.is_empty() {
        println!(
            "{}",
            format!("No capability modules found in {}", dir.display()).dimmed()
        );
        return Ok(());
    }

    output::header(&format!("Capability Modules ({})", loaded.len()));
    println!();
    for module in &loaded {
        println!(
            "  {} {} {}",
            module.id.cyan(),
            module.kind,
            module.path.display().to_string().dimmed()
        );
    }
    Ok(())
}
