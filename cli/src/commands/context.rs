use anyhow::Result;
use clap::{Args, Subcommand, ValueEnum};
use colored::Colorize;
use context::{ContextProvider, OutlineSymbolProvider};
use st_core::{ContextLevel, ContextSnapshot};
use std::path::PathBuf;
use std::sync::Arc;

use crate::output;
use crate::session::Session;

const PREVIEW_LINES: usize = 40;

#[derive(Subcommand)]
pub enum ContextCommand {
    #[command(about = "Show context snapshots for a path")]
    Show(ShowArgs),

    #[command(about = "List the imports of a file")]
    Imports(ImportsArgs)
}

#[derive(Args)]
pub struct ShowArgs {
    #[arg(help = "File or directory; defaults to the workspace")]
    pub path: Option<PathBuf>,

    #[arg(long, help = "Only this level")]
    pub level: Option<LevelArg>,

    #[arg(long, help = "Print snapshot content in full")]
    pub full: bool
}

#[derive(Args)]
pub struct ImportsArgs {
    #[arg(help = "Source file")]
    pub path: PathBuf
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LevelArg {
    File,
    Directory,
    Project,
    Workspace
}

impl From<LevelArg> for ContextLevel {
    fn from(level: LevelArg) -> Self {
        match level {
            LevelArg::File => ContextLevel::File,
            LevelArg::Directory => ContextLevel::Directory,
            LevelArg::Project => ContextLevel::Project,
            LevelArg::Workspace => ContextLevel::Workspace
        }
    }
}

pub async fn run(cmd: ContextCommand, session: &Session) -> Result<()> {
    let provider = ContextProvider::from_config(
        &session.config.context,
        Arc::new(OutlineSymbolProvider::new())
    );
    match cmd {
        ContextCommand::Show(args) => show(args, &provider, session).await,
        ContextCommand::Imports(args) => imports(args, &provider, session).await
    }
}

async fn show(args: ShowArgs, provider: &ContextProvider, session: &Session) -> Result<()> {
    let path = args.path.as_deref();
    let snapshots = match args.level {
        Some(level) => provider
            .get_context(level.into(), path)
            .await
            .into_iter()
            .collect(),
        None => provider.get_all_contexts(path).await
    };

    if session.json {
        return output::json(&snapshots);
    }
    if snapshots.is_empty() {
        println!("{}", "No context available for this path".dimmed());
        output::hint("paths outside the configured workspace roots only resolve at file level");
        return Ok(());
    }

    for snapshot in &snapshots {
        print_snapshot(snapshot, args.full);
        println!();
    }
    Ok(())
}

fn print_snapshot(snapshot: &ContextSnapshot, full: bool) {
    output::header(&format!("{} context", snapshot.level));
    if let Some(path) = &snapshot.path {
        output::field("path", &path.display().to_string());
    }
    if let Some(language) = &snapshot.language {
        output::field("language", language);
    }
    if let Some(symbols) = &snapshot.symbols {
        let names: Vec<String> = symbols
            .iter()
            .map(|s| format!("{} {}:{}", s.kind, s.name, s.line))
            .collect();
        output::field("symbols", &names.join(", "));
    }
    if let Some(imports) = &snapshot.imports {
        output::field("imports", &imports.join(", "));
    }
    if let Some(dependencies) = &snapshot.dependencies {
        let names: Vec<String> = dependencies
            .iter()
            .map(|d| match &d.version {
                Some(version) => format!("{}@{}", d.name, version),
                None => d.name.clone()
            })
            .collect();
        output::field("dependencies", &names.join(", "));
    }

    println!();
    let lines: Vec<&str> = snapshot.content.lines().collect();
    let shown = if full { lines.len() } else { lines.len().min(PREVIEW_LINES) };
    for line in &lines[..shown] {
        println!("    {}", line.dimmed());
    }
    if shown < lines.len() {
        println!("    {}", format!("… {} more lines (--full)", lines.len() - shown).dimmed());
    }
}

async fn imports(args: ImportsArgs, provider: &ContextProvider, session: &Session) -> Result<()> {
    let imports = provider.get_imports(Some(&args.path)).await;

    if session.json {
        return output::json(&imports);
    }
    if imports.is_empty() {
        println!("{}", "No imports found".dimmed());
        return Ok(());
    }
    for import in &imports {
        println!("  {}", import.cyan());
    }
    Ok(())
}
