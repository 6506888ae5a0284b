use colored::Colorize;
use errors::{EngineError, ErrorBody};

#[derive(Debug)]
pub struct UxError {
    pub what: String,
    pub why: Option<String>,
    pub how_to_fix: Vec<String>,
    pub suggested_command: Option<String>,
    pub code: &'static str
}

impl UxError {
    pub fn new(what: impl Into<String>) -> Self {
        Self {
            what: what.into(),
            why: None,
            how_to_fix: Vec::new(),
            suggested_command: None,
            code: "CLI_ERROR"
        }
    }

    pub fn why(mut self, reason: impl Into<String>) -> Self {
        self.why = Some(reason.into());
        self
    }

    pub fn fix(mut self, suggestion: impl Into<String>) -> Self {
        self.how_to_fix.push(suggestion.into());
        self
    }

    pub fn suggest(mut self, cmd: impl Into<String>) -> Self {
        self.suggested_command = Some(cmd.into());
        self
    }

    pub fn code(mut self, code: &'static str) -> Self {
        self.code = code;
        self
    }

    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            code: self.code.to_string(),
            message: self.what.clone()
        }
    }

    pub fn display(&self) {
        eprintln!();
        eprintln!("{} {}", "error:".red().bold(), self.what.white().bold());

        if let Some(why) = &self.why {
            eprintln!("       {}", why.dimmed());
        }

        if !self.how_to_fix.is_empty() {
            eprintln!();
            eprintln!("{}", "How to fix:".yellow().bold());
            for (i, fix) in self.how_to_fix.iter().enumerate() {
                eprintln!("  {}. {}", i + 1, fix);
            }
        }

        if let Some(cmd) = &self.suggested_command {
            eprintln!();
            eprintln!("{}", "Try this:".green().bold());
            eprintln!("  $ {}", cmd.cyan());
        }
        eprintln!();
    }
}

impl std::fmt::Display for UxError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.what)
    }
}

impl std::error::Error for UxError {}

pub fn invalid_option(pair: &str) -> UxError {
    UxError::new(format!("Invalid generation option: '{}'", pair))
        .why("Options are written as key=value")
        .fix("Recognised keys: context, examples, iterations, temperature, max_tokens")
        .suggest("strata generate \"parse a date\" --language rust --option iterations=3")
        .code("INVALID_OPTION")
}

pub fn no_extensions_dir() -> UxError {
    UxError::new("No capability module directory given")
        .why("Neither a directory argument nor integration.extensions_dir is set")
        .fix("Pass the directory explicitly")
        .fix("Or set STRATA_EXTENSIONS_DIR")
        .suggest("strata extensions discover ./extensions")
        .code("NO_EXTENSIONS_DIR")
}

pub fn config_error(message: &str) -> UxError {
    UxError::new(format!("Configuration error: {}", message))
        .why("The configuration file or a STRATA_* variable holds an invalid value")
        .fix("Check the file passed with --config")
        .fix("Check STRATA_* environment variables")
        .code("CONFIG_ERROR")
}

/// Operator-facing rendering of an engine failure.
pub fn from_engine(err: &EngineError) -> UxError {
    let base = UxError::new(err.to_string()).code(err.error_code());
    match err.error_code() {
        "GENERATION_FAILED" | "PROVIDER_UNAVAILABLE" => base
            .why("The model provider did not produce a usable answer")
            .fix("Check providers.endpoints / STRATA_PROVIDER_URLS are reachable")
            .fix("Check STRATA_API_KEY for hosted providers")
            .suggest("STRATA_MODEL_PROVIDER=mock strata generate \"<task>\" --language <lang>"),
        "PROVIDER_NOT_CONFIGURED" => base
            .why("providers.provider must be one of: openai, ollama, mock")
            .fix("Set STRATA_MODEL_PROVIDER or providers.provider"),
        "NO_STRATEGY_AVAILABLE" => base
            .why("Neither the selected strategy nor the direct fallback is registered")
            .suggest("strata strategies list"),
        "INTEGRATION_DISABLED" => base
            .fix("Set integration.enabled and integration.agent_communication_enabled"),
        "PERSISTENCE_ERROR" => base
            .why("The feedback store could not be written")
            .fix("Check feedback.store_path / STRATA_FEEDBACK_PATH is writable"),
        _ => base
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use errors::{ProviderError, StrategyError};

    #[test]
    fn test_ux_error_builder_chain() {
        let err = UxError::new("test error")
            .why("because reasons")
            .fix("try this")
            .fix("or this")
            .suggest("run command");

        assert_eq!(err.what, "test error");
        assert_eq!(err.why, Some("because reasons".to_string()));
        assert_eq!(err.how_to_fix.len(), 2);
        assert_eq!(err.suggested_command, Some("run command".to_string()));
        assert_eq!(err.code, "CLI_ERROR");
    }

    #[test]
    fn test_invalid_option() {
        let err = invalid_option("iterations");
        assert!(err.what.contains("iterations"));
        assert_eq!(err.to_body().code, "INVALID_OPTION");
    }

    #[test]
    fn test_from_engine_generation_failed() {
        let err: EngineError = StrategyError::generation_failed("direct", "timeout").into();
        let ux = from_engine(&err);
        assert_eq!(ux.code, "GENERATION_FAILED");
        assert!(ux.what.contains("direct"));
        assert!(!ux.how_to_fix.is_empty());
    }

    #[test]
    fn test_from_engine_not_configured() {
        let err: EngineError = ProviderError::NotConfigured {
            provider: "carrier-pigeon".to_string()
        }
        .into();
        let ux = from_engine(&err);
        assert_eq!(ux.code, "PROVIDER_NOT_CONFIGURED");
        assert!(ux.why.unwrap().contains("mock"));
    }
}
