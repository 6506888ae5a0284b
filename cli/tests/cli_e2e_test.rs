use assert_cmd::{Command, cargo_bin_cmd};
use serde_json::Value;
use tempfile::TempDir;

/// A throwaway workspace plus a `strata` command isolated to it.
struct Sandbox {
    dir: TempDir
}

impl Sandbox {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("src")).unwrap();
        std::fs::write(
            dir.path().join("Cargo.toml"),
            "[package]\nname = \"demo\"\n\n[dependencies]\nserde = \"1\"\n"
        )
        .unwrap();
        std::fs::write(
            dir.path().join("src/lib.rs"),
            "use std::fmt;\n\npub struct Demo;\n\npub fn run() {}\n"
        )
        .unwrap();
        Self { dir }
    }

    fn strata(&self) -> Command {
        let mut cmd = cargo_bin_cmd!("strata");
        cmd.current_dir(self.dir.path())
            .env("STRATA_MODEL_PROVIDER", "mock")
            .env("STRATA_WORKSPACE_ROOTS", self.dir.path())
            .env("STRATA_FEEDBACK_PATH", self.dir.path().join(".strata/feedback.json"))
            .env("STRATA_LOG_LEVEL", "warn")
            .env_remove("STRATA_CONFIG")
            .env_remove("STRATA_EXTENSIONS_DIR")
            .env_remove("RUST_LOG");
        cmd
    }

    fn json(&self, args: &[&str]) -> Value {
        let output = self.strata().arg("--json").args(args).output().unwrap();
        assert!(
            output.status.success(),
            "strata {args:?} failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        serde_json::from_slice(&output.stdout).unwrap()
    }

    fn json_failure(&self, args: &[&str]) -> Value {
        let output = self.strata().arg("--json").args(args).output().unwrap();
        assert!(!output.status.success());
        serde_json::from_slice(&output.stdout).unwrap()
    }
}

mod help_and_version {
    use super::*;
    use predicates::prelude::predicate;

    #[test]
    fn test_help_lists_commands() {
        Sandbox::new()
            .strata()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("generate"))
            .stdout(predicate::str::contains("feedback"))
            .stdout(predicate::str::contains("context"))
            .stdout(predicate::str::contains("strategies"))
            .stdout(predicate::str::contains("extensions"));
    }

    #[test]
    fn test_version_flag() {
        Sandbox::new()
            .strata()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("strata"));
    }

    #[test]
    fn test_no_args_shows_usage() {
        Sandbox::new()
            .strata()
            .assert()
            .failure()
            .stderr(predicate::str::contains("Usage:"));
    }
}

mod generate {
    use super::*;
    use predicates::prelude::predicate;

    #[test]
    fn test_generate_defaults_to_direct() {
        let sandbox = Sandbox::new();
        let outcome = sandbox.json(&["generate", "write a greeting", "--language", "rust"]);

        assert_eq!(outcome["strategyId"], "direct");
        assert_eq!(outcome["selectedBy"], "heuristic");
        assert_eq!(outcome["language"], "rust");
        assert!(outcome["code"].as_str().unwrap().contains("(mock)"));
    }

    #[test]
    fn test_generate_uses_keyword_heuristic() {
        let sandbox = Sandbox::new();
        let outcome = sandbox.json(&["generate", "Optimize the inner loop", "--language", "go"]);

        assert_eq!(outcome["strategyId"], "iterative-refinement");
    }

    #[test]
    fn test_generate_explicit_strategy_with_options() {
        let sandbox = Sandbox::new();
        let outcome = sandbox.json(&[
            "generate",
            "write a greeting",
            "--language",
            "rust",
            "--strategy",
            "iterative-refinement",
            "--option",
            "iterations=1",
            "--file",
            "src/lib.rs",
        ]);

        assert_eq!(outcome["strategyId"], "iterative-refinement");
        assert_eq!(outcome["selectedBy"], "explicit");
    }

    #[test]
    fn test_generate_rejects_malformed_option() {
        let sandbox = Sandbox::new();
        sandbox
            .strata()
            .args(["generate", "x", "--language", "rust", "--option", "iterations"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid generation option"));

        let body = sandbox.json_failure(&["generate", "x", "--language", "rust", "-o", "nokey"]);
        assert_eq!(body["error"]["code"], "INVALID_OPTION");
    }

    #[test]
    fn test_human_output() {
        Sandbox::new()
            .strata()
            .args(["generate", "write a greeting", "--language", "python"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Generated Code"))
            .stdout(predicate::str::contains("direct"));
    }
}

mod feedback {
    use super::*;
    use predicates::prelude::predicate;

    fn add(sandbox: &Sandbox, feedback_type: &str, language: &str, strategy: &str) -> String {
        let body = sandbox.json(&[
            "feedback",
            "add",
            "parse a csv row",
            "fn parse() {}",
            "--type",
            feedback_type,
            "--language",
            language,
            "--strategy",
            strategy,
        ]);
        body["id"].as_str().unwrap().to_string()
    }

    #[test]
    fn test_add_then_stats() {
        let sandbox = Sandbox::new();
        add(&sandbox, "positive", "rust", "test-driven");
        add(&sandbox, "negative", "go", "direct");

        let stats = sandbox.json(&["feedback", "stats"]);
        assert_eq!(stats["totalFeedback"], 2);
        assert_eq!(stats["positiveFeedback"], 1);
        assert_eq!(stats["negativeFeedback"], 1);
        assert_eq!(stats["feedbackByLanguage"]["rust"], 1);
        assert_eq!(stats["recentFeedback"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_list_filters() {
        let sandbox = Sandbox::new();
        add(&sandbox, "positive", "rust", "test-driven");
        add(&sandbox, "negative", "rust", "direct");
        add(&sandbox, "positive", "go", "direct");

        let positive = sandbox.json(&["feedback", "list", "--type", "positive"]);
        assert_eq!(positive.as_array().unwrap().len(), 2);

        let rust_direct = sandbox.json(&["feedback", "list", "--language", "rust", "--strategy", "direct"]);
        assert_eq!(rust_direct.as_array().unwrap().len(), 1);
        assert_eq!(rust_direct[0]["type"], "negative");
    }

    #[test]
    fn test_recommendation_drives_generation() {
        let sandbox = Sandbox::new();

        let neutral = sandbox.json(&["feedback", "recommend", "rust"]);
        assert_eq!(neutral["strategy"], "direct");
        assert_eq!(neutral["confidence"], 0.5);
        assert_eq!(neutral["sampleSize"], 0);

        add(&sandbox, "positive", "rust", "example-based");

        let informed = sandbox.json(&["feedback", "recommend", "rust"]);
        assert_eq!(informed["strategy"], "example-based");
        assert_eq!(informed["confidence"], 1.0);

        let outcome = sandbox.json(&["generate", "write a greeting", "--language", "rust"]);
        assert_eq!(outcome["strategyId"], "example-based");
        assert_eq!(outcome["selectedBy"], "recommendation");
    }

    #[test]
    fn test_clear_persists() {
        let sandbox = Sandbox::new();
        add(&sandbox, "neutral", "rust", "direct");

        let cleared = sandbox.json(&["feedback", "clear"]);
        assert_eq!(cleared["removed"], 1);

        let stats = sandbox.json(&["feedback", "stats"]);
        assert_eq!(stats["totalFeedback"], 0);
    }

    #[test]
    fn test_invalid_type_is_rejected() {
        Sandbox::new()
            .strata()
            .args(["feedback", "add", "p", "r", "--type", "maybe"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("maybe"));
    }
}

mod context {
    use super::*;

    #[test]
    fn test_show_file_context() {
        let sandbox = Sandbox::new();
        let snapshots = sandbox.json(&["context", "show", "src/lib.rs"]);
        let snapshots = snapshots.as_array().unwrap();

        let levels: Vec<_> = snapshots.iter().map(|s| s["level"].as_str().unwrap()).collect();
        assert_eq!(levels, ["file", "directory", "project", "workspace"]);
        assert_eq!(snapshots[0]["language"], "rust");

        let project = &snapshots[2];
        assert_eq!(project["dependencies"][0]["name"], "serde");
    }

    #[test]
    fn test_show_single_level() {
        let sandbox = Sandbox::new();
        let snapshots = sandbox.json(&["context", "show", "src/lib.rs", "--level", "directory"]);
        let snapshots = snapshots.as_array().unwrap();

        assert_eq!(snapshots.len(), 1);
        assert!(snapshots[0]["content"].as_str().unwrap().contains("lib.rs"));
    }

    #[test]
    fn test_imports() {
        let sandbox = Sandbox::new();
        let imports = sandbox.json(&["context", "imports", "src/lib.rs"]);
        assert_eq!(imports, serde_json::json!(["std::fmt"]));
    }
}

mod strategies {
    use super::*;

    #[test]
    fn test_list() {
        let sandbox = Sandbox::new();
        let infos = sandbox.json(&["strategies", "list"]);
        let ids: Vec<_> = infos
            .as_array()
            .unwrap()
            .iter()
            .map(|i| i["id"].as_str().unwrap())
            .collect();
        assert_eq!(
            ids,
            ["direct", "divide-and-conquer", "test-driven", "example-based", "iterative-refinement"]
        );
    }

    #[test]
    fn test_select_preview() {
        let sandbox = Sandbox::new();
        let preview = sandbox.json(&["strategies", "select", "design the system architecture", "--language", "java"]);

        assert_eq!(preview["selected"], "divide-and-conquer");
        assert_eq!(preview["selectedBy"], "heuristic");
        assert_eq!(preview["heuristic"]["rule"], "complexity");
    }
}

mod extensions {
    use super::*;

    #[test]
    fn test_discover_directory() {
        let sandbox = Sandbox::new();
        let ext = sandbox.dir.path().join("ext/notes");
        std::fs::create_dir_all(&ext).unwrap();
        std::fs::write(ext.join("capability.toml"), "id = \"notes\"\nkind = \"passive\"\n").unwrap();

        let loaded = sandbox.json(&["extensions", "discover", "ext"]);
        assert_eq!(loaded[0]["id"], "notes");
        assert_eq!(loaded[0]["kind"], "passive");
    }

    #[test]
    fn test_discover_without_directory() {
        let body = Sandbox::new().json_failure(&["extensions", "discover"]);
        assert_eq!(body["error"]["code"], "NO_EXTENSIONS_DIR");
    }
}

mod configuration {
    use super::*;

    #[test]
    fn test_invalid_provider_is_a_config_error() {
        let sandbox = Sandbox::new();
        let output = sandbox
            .strata()
            .env("STRATA_MODEL_PROVIDER", "carrier-pigeon")
            .args(["--json", "strategies", "list"])
            .output()
            .unwrap();

        assert!(!output.status.success());
        let body: Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(body["error"]["code"], "CONFIG_ERROR");
    }

    #[test]
    fn test_config_file_is_applied() {
        let sandbox = Sandbox::new();
        let path = sandbox.dir.path().join("strata.toml");
        std::fs::write(&path, "[feedback]\nrecent_limit = 1\n").unwrap();

        for _ in 0..2 {
            sandbox.json(&["feedback", "add", "p", "r", "--type", "neutral"]);
        }
        let output = sandbox
            .strata()
            .args(["--json", "--config"])
            .arg(&path)
            .args(["feedback", "stats"])
            .output()
            .unwrap();
        let stats: Value = serde_json::from_slice(&output.stdout).unwrap();

        assert_eq!(stats["totalFeedback"], 2);
        assert_eq!(stats["recentFeedback"].as_array().unwrap().len(), 1);
    }
}
