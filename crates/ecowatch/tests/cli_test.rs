//! Integration tests for the `ecowatch` CLI binary.
//!
//! Argument parsing, help output, completions and config handling run
//! without a server; grid tests point the binary at a wiremock server.
#![allow(clippy::unwrap_used)]

use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::{Value, json};
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a command for the `ecowatch` binary with env isolation.
///
/// Clears every `ECOWATCH_*` variable and points config and state at
/// `dir` so tests never touch the user's real files.
fn ecowatch_cmd(dir: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("ecowatch");
    cmd.env("HOME", dir)
        .env("XDG_CONFIG_HOME", dir)
        .env("XDG_DATA_HOME", dir)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .env_remove("ECOWATCH_PROFILE")
        .env_remove("ECOWATCH_BASE_URL")
        .env_remove("ECOWATCH_TOKEN")
        .env_remove("ECOWATCH_OUTPUT")
        .env_remove("ECOWATCH_TIMEOUT")
        .env_remove("ECOWATCH_INSECURE")
        .env("ECOWATCH_CONFIG", config_file(dir))
        .env("ECOWATCH_STATE", state_file(dir));
    cmd
}

fn config_file(dir: &Path) -> PathBuf {
    dir.join("config.toml")
}

fn state_file(dir: &Path) -> PathBuf {
    dir.join("state.json")
}

fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

fn write_config(dir: &Path, base_url: &str) {
    let toml = format!(
        r#"
default_profile = "default"

[profiles.default]
base_url = "{base_url}"

[grid]
page_size = 2

[tables.stations]
path = "/stations"

[[tables.stations.columns]]
id = "name"
header = "Station"
locked = true

[[tables.stations.columns]]
id = "region"
header = "Region"

[[tables.stations.columns]]
id = "aqi"
header = "AQI"
field = "latest.aqi"
"#
    );
    std::fs::write(config_file(dir), toml).unwrap();
}

fn stations() -> Value {
    json!([
        {"name": "Oslo", "region": "north", "latest": {"aqi": 12}},
        {"name": "Bergen", "region": "west", "latest": {"aqi": 30}},
        {"name": "Tromso", "region": "north", "latest": {"aqi": 7}},
        {"name": "Stavanger", "region": "west", "latest": {"aqi": null}},
        {"name": "Alta", "region": "north", "latest": {"aqi": 19}}
    ])
}

/// Run the binary off the async runtime so the mock server keeps serving.
async fn run(dir: &Path, args: &[&str]) -> std::process::Output {
    let dir = dir.to_owned();
    let args: Vec<String> = args.iter().map(|a| (*a).to_owned()).collect();
    tokio::task::spawn_blocking(move || ecowatch_cmd(&dir).args(&args).output().unwrap())
        .await
        .unwrap()
}

async fn mock_stations() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/stations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(stations()))
        .mount(&server)
        .await;
    server
}

fn stdout_json(output: &std::process::Output) -> Value {
    assert!(
        output.status.success(),
        "command failed:\n{}",
        combined_output(output)
    );
    serde_json::from_slice(&output.stdout).unwrap()
}

fn first_cells(view: &Value) -> Vec<String> {
    view["rows"]
        .as_array()
        .unwrap()
        .iter()
        .map(|row| row["cells"][0].as_str().unwrap().to_owned())
        .collect()
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn no_args_shows_help() {
    let dir = TempDir::new().unwrap();
    let output = ecowatch_cmd(dir.path()).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("Usage"));
}

#[test]
fn help_lists_commands() {
    let dir = TempDir::new().unwrap();
    ecowatch_cmd(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("grid")
                .and(predicate::str::contains("columns"))
                .and(predicate::str::contains("sort")),
        );
}

#[test]
fn version_flag() {
    let dir = TempDir::new().unwrap();
    ecowatch_cmd(dir.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("ecowatch"));
}

#[test]
fn completions_bash() {
    let dir = TempDir::new().unwrap();
    ecowatch_cmd(dir.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn invalid_subcommand_fails() {
    let dir = TempDir::new().unwrap();
    ecowatch_cmd(dir.path())
        .arg("frobnicate")
        .assert()
        .failure()
        .code(2);
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn grid_without_table_config_is_not_found() {
    let dir = TempDir::new().unwrap();
    let output = ecowatch_cmd(dir.path())
        .args(["grid", "stations"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(4));
    assert!(combined_output(&output).contains("stations"));
}

#[test]
fn ad_hoc_table_without_base_url_fails() {
    let dir = TempDir::new().unwrap();
    let output = ecowatch_cmd(dir.path())
        .args(["grid", "alerts", "/alerts"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(combined_output(&output).contains("base URL"));
}

#[test]
fn config_init_then_show() {
    let dir = TempDir::new().unwrap();
    ecowatch_cmd(dir.path())
        .args(["config", "init"])
        .assert()
        .success();
    assert!(config_file(dir.path()).exists());

    // A second init refuses to clobber the file.
    ecowatch_cmd(dir.path())
        .args(["config", "init"])
        .assert()
        .failure();
    ecowatch_cmd(dir.path())
        .args(["config", "init", "--force"])
        .assert()
        .success();

    ecowatch_cmd(dir.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[tables.stations]"));
}

#[test]
fn config_show_masks_tokens() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        config_file(dir.path()),
        "[profiles.default]\nbase_url = \"http://localhost:1\"\ntoken = \"s3cret\"\n",
    )
    .unwrap();
    ecowatch_cmd(dir.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("****").and(predicate::str::contains("s3cret").not()));
}

#[test]
fn config_path_reports_overrides() {
    let dir = TempDir::new().unwrap();
    ecowatch_cmd(dir.path())
        .args(["config", "path", "-o", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml").and(predicate::str::contains("state.json")));
}

#[test]
fn invalid_config_is_rejected() {
    let dir = TempDir::new().unwrap();
    std::fs::write(config_file(dir.path()), "[grid]\npage_size = 0\n").unwrap();
    ecowatch_cmd(dir.path())
        .args(["config", "show"])
        .assert()
        .failure()
        .code(2);
}

// ── Grid against a mock server ──────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn grid_renders_first_page() {
    let server = mock_stations().await;
    let dir = TempDir::new().unwrap();
    write_config(dir.path(), &server.uri());

    let output = run(dir.path(), &["grid", "stations"]).await;
    assert!(output.status.success(), "{}", combined_output(&output));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Station") && stdout.contains("Oslo") && stdout.contains("Bergen"));
    assert!(!stdout.contains("Tromso"), "page size is 2:\n{stdout}");
    assert!(String::from_utf8_lossy(&output.stderr).contains("page 1/3"));
}

#[tokio::test(flavor = "multi_thread")]
async fn grid_sorts_and_pages() {
    let server = mock_stations().await;
    let dir = TempDir::new().unwrap();
    write_config(dir.path(), &server.uri());

    let view = stdout_json(&run(dir.path(), &["grid", "stations", "--sort", "aqi:desc", "-o", "json"]).await);
    assert_eq!(first_cells(&view), ["Bergen", "Alta"]);
    assert_eq!(view["sort"]["direction"], "desc");

    // Sort persisted; page 3 holds the row without a value.
    let view = stdout_json(&run(dir.path(), &["grid", "stations", "--page", "3", "-o", "json"]).await);
    assert_eq!(first_cells(&view), ["Stavanger"]);
    assert_eq!(view["page"]["page"], 3);
}

#[tokio::test(flavor = "multi_thread")]
async fn grid_filters_and_searches() {
    let server = mock_stations().await;
    let dir = TempDir::new().unwrap();
    write_config(dir.path(), &server.uri());

    let view = stdout_json(
        &run(
            dir.path(),
            &["grid", "stations", "--filter", "region=north", "--page-size", "10", "-o", "json"],
        )
        .await,
    );
    assert_eq!(view["matching_rows"], 3);

    let view = stdout_json(
        &run(dir.path(), &["grid", "stations", "--search", "TROM", "-o", "json"]).await,
    );
    assert_eq!(first_cells(&view), ["Tromso"]);
    assert_eq!(view["filters"]["region"], "north");

    let view = stdout_json(
        &run(
            dir.path(),
            &["grid", "stations", "--search", "", "--clear-filters", "-o", "json"],
        )
        .await,
    );
    assert_eq!(view["matching_rows"], 5);
}

#[tokio::test(flavor = "multi_thread")]
async fn hidden_columns_persist_across_runs() {
    let server = mock_stations().await;
    let dir = TempDir::new().unwrap();
    write_config(dir.path(), &server.uri());

    let output = run(dir.path(), &["columns", "stations", "hide", "region"]).await;
    assert!(output.status.success(), "{}", combined_output(&output));

    let view = stdout_json(&run(dir.path(), &["grid", "stations", "-o", "json"]).await);
    let ids: Vec<&str> = view["columns"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, ["name", "aqi"]);

    // The locked column stays.
    let output = run(dir.path(), &["columns", "stations", "hide", "name"]).await;
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("locked"));

    let output = run(dir.path(), &["columns", "stations", "hide", "nope"]).await;
    assert_eq!(output.status.code(), Some(4));
}

#[tokio::test(flavor = "multi_thread")]
async fn sort_command_cycles() {
    let server = mock_stations().await;
    let dir = TempDir::new().unwrap();
    write_config(dir.path(), &server.uri());

    for expected in ["aqi asc", "aqi desc", "none"] {
        let output = run(dir.path(), &["sort", "stations", "aqi"]).await;
        assert!(output.status.success(), "{}", combined_output(&output));
        assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), expected);
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn server_side_sends_view_params() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/stations"))
        .and(query_param("page", "2"))
        .and(query_param("page_size", "2"))
        .and(query_param("sort", "aqi"))
        .and(query_param("order", "desc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {"name": "Alta", "region": "north", "latest": {"aqi": 19}},
                {"name": "Oslo", "region": "north", "latest": {"aqi": 12}}
            ],
            "meta": {"page": 2, "total_pages": 3}
        })))
        .expect(1)
        .mount(&server)
        .await;
    let dir = TempDir::new().unwrap();
    write_config(dir.path(), &server.uri());

    let view = stdout_json(
        &run(
            dir.path(),
            &[
                "grid", "stations", "--server-side", "--page", "2", "--sort", "aqi:desc", "-o",
                "json",
            ],
        )
        .await,
    );
    assert_eq!(first_cells(&view), ["Alta", "Oslo"]);
    assert_eq!(view["page"]["page"], 2);
    assert_eq!(view["page"]["total_pages"], 3);
    assert_eq!(view["page"]["server_side"], true);
}

#[tokio::test(flavor = "multi_thread")]
async fn server_errors_map_to_exit_codes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/stations"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    let dir = TempDir::new().unwrap();
    write_config(dir.path(), &server.uri());

    let output = run(dir.path(), &["grid", "stations"]).await;
    assert_eq!(output.status.code(), Some(3), "{}", combined_output(&output));
}
