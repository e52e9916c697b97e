//! Integration tests for the `fieldops` CLI binary.
//!
//! Argument parsing, help output, and completions run offline. Record
//! commands run against a wiremock server in the test process.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::{Value, json};
use wiremock::matchers::{bearer_token, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

const NOWHERE: &str = "/tmp/fieldops-cli-test-nonexistent";

/// Build a [`Command`] for the `fieldops` binary with env isolation.
///
/// Clears all `FIELDOPS_*` env vars and points config and data
/// directories at a nonexistent path so tests never touch real settings.
fn fieldops_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("fieldops");
    cmd.env("HOME", NOWHERE)
        .env("XDG_CONFIG_HOME", NOWHERE)
        .env("XDG_DATA_HOME", NOWHERE)
        .env("FIELDOPS_CONFIG", format!("{NOWHERE}/config.toml"))
        .env_remove("FIELDOPS_PROFILE")
        .env_remove("FIELDOPS_API_URL")
        .env_remove("FIELDOPS_TOKEN")
        .env_remove("FIELDOPS_OUTPUT")
        .env_remove("FIELDOPS_INSECURE")
        .env_remove("FIELDOPS_TIMEOUT")
        .env_remove("FIELDOPS_PAGE_SIZE");
    cmd
}

/// Command wired to a mock API with a token from the environment.
fn api_cmd(server: &MockServer) -> assert_cmd::Command {
    let mut cmd = fieldops_cmd();
    cmd.env("FIELDOPS_TOKEN", "test-token")
        .args(["--api-url", &server.uri()]);
    cmd
}

fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

fn work_order(id: u32, status: &str) -> Value {
    json!({ "id": id, "number": format!("WO-{id}"), "title": format!("Service {id}"), "status": status })
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = fieldops_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("Usage"));
}

#[test]
fn test_help_lists_commands() {
    fieldops_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("list")
            .and(predicate::str::contains("delete"))
            .and(predicate::str::contains("pipeline")),
    );
}

#[test]
fn test_version_flag() {
    fieldops_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("fieldops"));
}

#[test]
fn test_completions_bash() {
    fieldops_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_unknown_entity_is_usage_error() {
    let output = fieldops_cmd().args(["list", "invoices"]).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("work-orders"));
}

#[test]
fn test_missing_config_explains_setup() {
    let output = fieldops_cmd().args(["list", "customers"]).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    let text = combined_output(&output);
    assert!(text.contains("No API URL configured"), "{text}");
    assert!(text.contains("fieldops config init"), "{text}");
}

#[test]
fn test_config_path_honours_override() {
    fieldops_cmd()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("fieldops-cli-test-nonexistent/config.toml"));
}

// ── Record commands ─────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_list_sends_query_and_prints_ids() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/work-orders"))
        .and(bearer_token("test-token"))
        .and(query_param("page", "1"))
        .and(query_param("limit", "10"))
        .and(query_param("status", "open"))
        .and(query_param("search", "pump"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [work_order(1, "open"), work_order(3, "open")],
            "pagination": { "page": 1, "pages": 1, "total": 2, "limit": 10 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    api_cmd(&server)
        .args(["--page-size", "10", "-o", "plain"])
        .args(["list", "work-orders", "-s", " pump ", "-f", "status=open", "-f", "priority=all"])
        .assert()
        .success()
        .stdout("1\n3\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_list_all_walks_every_page() {
    let server = MockServer::start().await;
    for (page, ids) in [(1, [1, 2]), (2, [3, 4])] {
        Mock::given(method("GET"))
            .and(path("/work-orders"))
            .and(query_param("page", page.to_string()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": ids.iter().map(|i| work_order(*i, "open")).collect::<Vec<_>>(),
                "pagination": { "page": page, "pages": 2, "total": 4, "limit": 2 }
            })))
            .expect(1)
            .mount(&server)
            .await;
    }

    api_cmd(&server)
        .args(["--page-size", "2", "-o", "plain", "list", "work-orders", "--all"])
        .assert()
        .success()
        .stdout("1\n2\n3\n4\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_list_page_past_the_end_is_usage_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/work-orders"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [work_order(1, "open"), work_order(2, "open")],
            "pagination": { "page": 1, "pages": 2, "total": 4, "limit": 2 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let output = api_cmd(&server)
        .args(["--page-size", "2", "-o", "plain", "list", "work-orders", "--page", "99"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("past the last page (2)"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_list_page_in_range_is_fetched() {
    let server = MockServer::start().await;
    for (page, ids) in [(1, [1, 2]), (2, [3, 4])] {
        Mock::given(method("GET"))
            .and(path("/work-orders"))
            .and(query_param("page", page.to_string()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": ids.iter().map(|i| work_order(*i, "open")).collect::<Vec<_>>(),
                "pagination": { "page": page, "pages": 2, "total": 4, "limit": 2 }
            })))
            .expect(1)
            .mount(&server)
            .await;
    }

    api_cmd(&server)
        .args(["--page-size", "2", "-o", "plain", "list", "work-orders", "--page", "2"])
        .assert()
        .success()
        .stdout("3\n4\n");
}

#[test]
fn test_list_page_zero_is_rejected() {
    let output = fieldops_cmd()
        .args(["list", "work-orders", "--page", "0"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_delete_locked_record_never_sends_delete() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/work-orders/8"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "data": work_order(8, "completed") })),
        )
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    let output = api_cmd(&server)
        .args(["--yes", "delete", "work-orders", "8"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(6));
    assert!(combined_output(&output).contains("cannot be deleted"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_delete_requires_yes_without_terminal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/work-orders/7"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "data": work_order(7, "open") })),
        )
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    let output = api_cmd(&server)
        .args(["delete", "work-orders", "7"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("--yes"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_delete_with_yes_deletes_and_reports() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/work-orders/7"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "data": work_order(7, "open") })),
        )
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/work-orders/7"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/work-orders"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [],
            "pagination": { "page": 1, "pages": 0, "total": 0, "limit": 25 }
        })))
        .mount(&server)
        .await;

    api_cmd(&server)
        .args(["--yes", "--color", "never", "rm", "work-orders", "7"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Deleted work order 'Service 7'"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_create_with_invalid_fields_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let output = api_cmd(&server)
        .args(["create", "customers", "--set", "name=A", "--set", "email=nope"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    let text = combined_output(&output);
    assert!(text.contains("at least 2 characters"), "{text}");
    assert!(text.contains("valid email"), "{text}");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_server_error_message_is_shown() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/quotes/q-1"))
        .respond_with(
            ResponseTemplate::new(409).set_body_json(json!({ "message": "Quote is archived" })),
        )
        .mount(&server)
        .await;

    let output = api_cmd(&server)
        .args(["get", "quotes", "q-1"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(6));
    assert!(combined_output(&output).contains("Quote is archived"));
}

// ── Columns ─────────────────────────────────────────────────────────

#[test]
fn test_column_toggle_persists_between_runs() {
    let data = tempfile::tempdir().unwrap();
    let run = |args: &[&str]| {
        let output = fieldops_cmd()
            .env("XDG_DATA_HOME", data.path())
            .env("FIELDOPS_TOKEN", "unused")
            .args(["--api-url", "http://127.0.0.1:9", "-o", "json", "columns", "customers"])
            .args(args)
            .output()
            .unwrap();
        assert!(output.status.success(), "{}", combined_output(&output));
        let columns: Vec<Value> = serde_json::from_slice(&output.stdout).unwrap();
        columns
            .into_iter()
            .map(|c| (c["key"].as_str().unwrap().to_owned(), c["visible"].as_bool().unwrap()))
            .collect::<std::collections::HashMap<_, _>>()
    };

    assert!(run(&[])["email"]);
    assert!(!run(&["toggle", "email"])["email"]);
    assert!(!run(&["show"])["email"]);
    assert!(run(&["reset"])["email"]);
}

#[test]
fn test_unknown_column_is_rejected() {
    let output = fieldops_cmd()
        .env("FIELDOPS_TOKEN", "unused")
        .args(["--api-url", "http://127.0.0.1:9", "columns", "customers", "toggle", "shoe_size"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("shoe_size"));
}
