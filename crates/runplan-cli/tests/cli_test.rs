//! Integration tests for the offline `runplan` commands.
//!
//! These run the built binary and need neither a database nor a model.

use std::path::Path;
use std::process::{Command, Output};

use runplan_test_utils::{sample_reply, sample_request};

fn runplan(args: &[&str], config_home: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_runplan"))
        .args(args)
        .env("XDG_CONFIG_HOME", config_home)
        .env_remove("RUNPLAN_DATABASE_URL")
        .env_remove("RUNPLAN_MODEL")
        .env_remove("GEMINI_API_KEY")
        .env("RUST_LOG", "warn")
        .output()
        .expect("failed to run runplan binary")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn methods_lists_every_method() {
    let tmp = tempfile::TempDir::new().unwrap();
    let out = runplan(&["methods"], tmp.path());
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    let text = stdout(&out);
    for id in ["Gebalanceerd", "Polarized", "Norwegian", "MAF", "Lydiard"] {
        assert!(text.contains(id), "missing {id} in:\n{text}");
    }
    assert!(text.contains("  1. "));
}

#[test]
fn prompt_prints_week_count_and_language() {
    let tmp = tempfile::TempDir::new().unwrap();
    let request_path = tmp.path().join("request.json");
    std::fs::write(
        &request_path,
        serde_json::to_string(&sample_request()).unwrap(),
    )
    .unwrap();

    let out = runplan(&["prompt", request_path.to_str().unwrap()], tmp.path());
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    let text = stdout(&out);
    assert!(text.contains("exactly 10 entries"), "prompt:\n{text}");
    assert!(text.contains("Balanced (Gebalanceerd)"));
}

#[test]
fn validate_repairs_saved_reply() {
    let tmp = tempfile::TempDir::new().unwrap();
    let reply_path = tmp.path().join("reply.txt");
    std::fs::write(&reply_path, sample_reply(3, "rustig")).unwrap();

    let out = runplan(&["validate", reply_path.to_str().unwrap()], tmp.path());
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    let schedule: serde_json::Value = serde_json::from_str(&stdout(&out)).unwrap();
    assert_eq!(schedule["weeks"].as_array().unwrap().len(), 3);
    assert_eq!(schedule["weeks"][2]["weekNumber"], 3);
    assert_eq!(schedule["weeks"][0]["days"][0]["intensity"], "Light");
    assert!(stderr(&out).contains("Repairs:"));
}

#[test]
fn validate_fails_without_json() {
    let tmp = tempfile::TempDir::new().unwrap();
    let reply_path = tmp.path().join("reply.txt");
    std::fs::write(&reply_path, "no schedule today").unwrap();

    let out = runplan(&["validate", reply_path.to_str().unwrap()], tmp.path());
    assert!(!out.status.success());
    assert!(stderr(&out).contains("no JSON"), "stderr: {}", stderr(&out));
}

#[test]
fn init_writes_config_and_refuses_overwrite() {
    let tmp = tempfile::TempDir::new().unwrap();
    let out = runplan(
        &["init", "--backend", "command", "--model", "sonnet"],
        tmp.path(),
    );
    assert!(out.status.success(), "stderr: {}", stderr(&out));

    let path = tmp.path().join("runplan").join("config.toml");
    let contents = std::fs::read_to_string(&path).unwrap();
    assert!(contents.contains("backend = \"command\""));
    assert!(contents.contains("model = \"sonnet\""));

    let again = runplan(&["init"], tmp.path());
    assert!(!again.status.success());
    assert!(stderr(&again).contains("already exists"));

    let forced = runplan(&["init", "--force"], tmp.path());
    assert!(forced.status.success(), "stderr: {}", stderr(&forced));
}

#[test]
fn generate_without_api_key_fails_cleanly() {
    let tmp = tempfile::TempDir::new().unwrap();
    let request_path = tmp.path().join("request.json");
    std::fs::write(
        &request_path,
        serde_json::to_string(&sample_request()).unwrap(),
    )
    .unwrap();

    let out = runplan(
        &["generate", request_path.to_str().unwrap(), "--no-store"],
        tmp.path(),
    );
    assert!(!out.status.success());
    assert!(stderr(&out).contains("GEMINI_API_KEY"), "stderr: {}", stderr(&out));
}
