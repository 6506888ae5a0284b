use anyhow::Result;
use clap::Args;
use colored::Colorize;
use serde_json::Value;
use st_core::GenerationOptions;
use std::path::PathBuf;

use crate::output;
use crate::session::Session;
use crate::ux_error;

#[derive(Args)]
pub struct GenerateArgs {
    #[arg(help = "What the code should do")]
    pub task: String,

    #[arg(short, long, help = "Target language (e.g. rust, python, typescript)")]
    pub language: String,

    #[arg(short, long, help = "Strategy id; omit to let Strata choose")]
    pub strategy: Option<String>,

    #[arg(
        short = 'o',
        long = "option",
        value_name = "KEY=VALUE",
        help = "Generation option; values are parsed as JSON when possible (e.g. iterations=3)"
    )]
    pub options: Vec<String>,

    #[arg(long, help = "File being worked on; its content is passed as context")]
    pub file: Option<PathBuf>
}

pub async fn run(args: GenerateArgs, session: &Session) -> Result<()> {
    let options = parse_options(&args.options)?;
    let engine = session.engine().await?;

    if let Some(file) = &args.file {
        engine.context.set_active_artifact(Some(file)).await;
    }

    let outcome = engine
        .generate(&args.task, &args.language, args.strategy.as_deref(), options)
        .await?;

    if session.json {
        return output::json(&outcome);
    }

    output::header("Generated Code");
    println!();
    output::field("strategy", &outcome.strategy_id);
    output::field("selected by", outcome.selected_by.as_str());
    output::field("language", &outcome.language);
    println!();
    println!("{}", outcome.code);
    println!();
    output::hint(&format!(
        "record the outcome with: strata feedback add {} <result> --type positive --language {} --strategy {}",
        format!("{:?}", args.task).dimmed(),
        outcome.language,
        outcome.strategy_id
    ));

    Ok(())
}

/// `key=value` pairs into options. Values that parse as JSON keep their
/// type; anything else is a string.
pub fn parse_options(pairs: &[String]) -> Result<GenerationOptions> {
    let mut options = GenerationOptions::new();
    for pair in pairs {
        let (key, raw) = utils::split_key_value(pair).ok_or_else(|| ux_error::invalid_option(pair))?;
        let value = serde_json::from_str::<Value>(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        options.insert(key, value);
    }
    Ok(options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_options_keeps_json_types() {
        let options = parse_options(&[
            "iterations=3".to_string(),
            "context=fn main() {}".to_string(),
            "examples=[\"a\", \"b\"]".to_string(),
        ])
        .unwrap();

        assert_eq!(options.get_u64("iterations"), Some(3));
        assert_eq!(options.context(), Some("fn main() {}"));
        assert_eq!(options.examples(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_parse_options_rejects_bare_words() {
        let err = parse_options(&["iterations".to_string()]).unwrap_err();
        assert!(err.downcast_ref::<ux_error::UxError>().is_some());
    }
}
