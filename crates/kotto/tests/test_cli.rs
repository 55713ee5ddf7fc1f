//! CLI tests for kotto

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// kotto with HOME pointed at a scratch directory and no key in the env
fn kotto(home: &TempDir) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_kotto"));
    cmd.env("HOME", home.path());
    cmd.env_remove("OPENAI_KEY");
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_help_flag() {
    let home = TempDir::new().unwrap();
    kotto(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Let a language model drive your program"))
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_version_flag() {
    let home = TempDir::new().unwrap();
    kotto(&home)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("0.1.0"));
}

#[test]
fn test_no_args_shows_usage() {
    let home = TempDir::new().unwrap();
    kotto(&home)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_run_help_lists_flags() {
    let home = TempDir::new().unwrap();
    kotto(&home)
        .args(["run", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--trace"))
        .stdout(predicate::str::contains("--no-exit"))
        .stdout(predicate::str::contains("--max-turns"))
        .stdout(predicate::str::contains("--prompts"));
}

#[test]
fn test_agents_lists_bundled() {
    let home = TempDir::new().unwrap();
    kotto(&home)
        .arg("agents")
        .assert()
        .success()
        .stdout(predicate::str::contains("hello"))
        .stdout(predicate::str::contains("hello-world"))
        .stdout(predicate::str::contains("extract"));
}

#[test]
fn test_config_writes_file() {
    let home = TempDir::new().unwrap();
    kotto(&home)
        .args(["config", "openai.key", "sk-test"])
        .assert()
        .success()
        .stdout(predicate::str::contains("openai.key updated"));

    let path = home.path().join(".config").join("kotto").join("config.json");
    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
    assert_eq!(raw["openai"]["key"], "sk-test");
}

#[test]
fn test_config_keeps_other_attributes() {
    let home = TempDir::new().unwrap();
    kotto(&home)
        .args(["config", "openai.key", "sk-test"])
        .assert()
        .success();
    kotto(&home)
        .args(["config", "openai.model", "gpt-4"])
        .assert()
        .success();

    let path = home.path().join(".config").join("kotto").join("config.json");
    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
    assert_eq!(raw["openai"]["key"], "sk-test");
    assert_eq!(raw["openai"]["model"], "gpt-4");
}

#[test]
fn test_config_unknown_attribute_fails() {
    let home = TempDir::new().unwrap();
    kotto(&home)
        .args(["config", "openai.color", "blue"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains(
            "error: unknown configuration attribute 'openai.color'",
        ));
}

#[test]
fn test_config_empty_key_fails() {
    let home = TempDir::new().unwrap();
    kotto(&home)
        .args(["config", "openai.key", ""])
        .assert()
        .failure()
        .stderr(predicate::str::contains("must not be empty"));
}

#[test]
fn test_run_without_key_hints_at_config() {
    let home = TempDir::new().unwrap();
    kotto(&home)
        .args(["run", "hello"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("kotto config openai.key"));
}

#[test]
fn test_run_unknown_agent_fails() {
    let home = TempDir::new().unwrap();
    kotto(&home)
        .args(["run", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown agent 'nope'"));
}

#[test]
fn test_run_prompts_and_source_conflict() {
    let home = TempDir::new().unwrap();
    kotto(&home)
        .args(["run", "hello", "--prompts", "a.prompts.js", "--source", "a.ts"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}
