//! Integration tests for the showcase CLI
//!
//! These run the built binary against throwaway workspaces. Nothing here
//! reaches the network: every generate invocation fails before a clone.

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Helper to create a showcase Command isolated from the caller's
/// environment and user-level config.
fn showcase(home: &TempDir) -> Command {
    let mut cmd = cargo_bin_cmd!("showcase");
    cmd.env_remove("SHOWCASE_API_KEY")
        .env_remove("OPENAI_API_KEY")
        .env_remove("SHOWCASE_MODEL")
        .env_remove("SHOWCASE_ENDPOINT")
        .env_remove("RUST_LOG")
        .env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join(".config"));
    cmd
}

fn create_temp_dir() -> TempDir {
    TempDir::new().unwrap()
}

// =============================================================================
// Basic CLI Tests
// =============================================================================

mod cli_basics {
    use super::*;

    #[test]
    fn test_showcase_help() {
        let home = create_temp_dir();
        showcase(&home)
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("generate"))
            .stdout(predicate::str::contains("serve"));
    }

    #[test]
    fn test_showcase_version() {
        let home = create_temp_dir();
        showcase(&home).arg("--version").assert().success();
    }

    #[test]
    fn test_generate_requires_a_repository() {
        let home = create_temp_dir();
        showcase(&home).arg("generate").assert().failure();
    }
}

// =============================================================================
// Classify Tests
// =============================================================================

mod classify {
    use super::*;

    #[test]
    fn test_notebook_beats_dockerfile() {
        let home = create_temp_dir();
        let repo = create_temp_dir();
        fs::write(repo.path().join("train.ipynb"), "{}").unwrap();
        fs::write(repo.path().join("Dockerfile"), "FROM python:3.12\n").unwrap();

        showcase(&home)
            .arg("classify")
            .arg(repo.path())
            .assert()
            .success()
            .stdout(predicate::str::starts_with("ml"))
            .stdout(predicate::str::contains("Research Lab"));
    }

    #[test]
    fn test_empty_directory_is_generic() {
        let home = create_temp_dir();
        let repo = create_temp_dir();

        showcase(&home)
            .arg("classify")
            .arg(repo.path())
            .assert()
            .success()
            .stdout(predicate::str::starts_with("generic"))
            .stdout(predicate::str::contains("no rule matched"));
    }

    #[test]
    fn test_missing_path_fails() {
        let home = create_temp_dir();
        let dir = create_temp_dir();

        showcase(&home)
            .arg("classify")
            .arg(dir.path().join("nope"))
            .assert()
            .failure()
            .stderr(predicate::str::contains("is not a directory"));
    }
}

// =============================================================================
// Generate Tests
// =============================================================================

mod generate {
    use super::*;

    #[test]
    fn test_more_than_five_repositories_rejected() {
        let home = create_temp_dir();
        let workspace = create_temp_dir();

        showcase(&home)
            .current_dir(workspace.path())
            .args(["generate", "a/1", "a/2", "a/3", "a/4", "a/5", "a/6"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Too many repositories requested: 6 (max 5)"));

        assert!(!workspace.path().join("showcase").exists());
    }

    #[test]
    fn test_missing_api_key_fails() {
        let home = create_temp_dir();
        let workspace = create_temp_dir();

        showcase(&home)
            .arg("--workspace")
            .arg(workspace.path())
            .args(["generate", "octo/widget", "--skip-push"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("No model API key configured"));
    }

    #[test]
    fn test_zero_iterations_rejected_by_parser() {
        let home = create_temp_dir();
        let workspace = create_temp_dir();

        showcase(&home)
            .current_dir(workspace.path())
            .args(["generate", "octo/widget", "--iterations", "0"])
            .assert()
            .failure();
    }

    #[test]
    fn test_all_invalid_references_generate_nothing() {
        let home = create_temp_dir();
        let workspace = create_temp_dir();

        showcase(&home)
            .current_dir(workspace.path())
            .env("SHOWCASE_API_KEY", "sk-test")
            .args(["generate", "noslash", "too/many/parts", "--skip-push"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid repository reference 'noslash'"))
            .stderr(predicate::str::contains("No repository was generated successfully"));

        assert!(!workspace.path().join("showcase/manifest.json").exists());
    }
}

// =============================================================================
// Config Tests
// =============================================================================

mod config {
    use super::*;

    #[test]
    fn test_workspace_file_and_env_are_layered() {
        let home = create_temp_dir();
        let workspace = create_temp_dir();
        fs::write(
            workspace.path().join("showcase.toml"),
            "[generation]\niterations = 7\n\n[model]\nmodel = \"from-file\"\n",
        )
        .unwrap();

        showcase(&home)
            .current_dir(workspace.path())
            .env("SHOWCASE_MODEL", "from-env")
            .arg("config")
            .assert()
            .success()
            .stdout(predicate::str::contains("iterations = 7"))
            .stdout(predicate::str::contains("model = \"from-env\""));
    }

    #[test]
    fn test_api_key_is_redacted() {
        let home = create_temp_dir();
        let workspace = create_temp_dir();

        showcase(&home)
            .current_dir(workspace.path())
            .env("SHOWCASE_API_KEY", "sk-verysecretvalue")
            .arg("config")
            .assert()
            .success()
            .stdout(predicate::str::contains("sk-v"))
            .stdout(predicate::str::contains("verysecretvalue").not());
    }

    #[test]
    fn test_invalid_config_file_fails() {
        let home = create_temp_dir();
        let workspace = create_temp_dir();
        fs::write(workspace.path().join("showcase.toml"), "[generation\n").unwrap();

        showcase(&home)
            .current_dir(workspace.path())
            .arg("config")
            .assert()
            .failure();
    }
}
