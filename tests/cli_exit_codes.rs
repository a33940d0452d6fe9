//! End-to-end runs of the binary against a mock Metabase.

use assert_cmd::Command;
use mockito::{Matcher, Server};
use predicates::prelude::*;
use std::path::Path;

fn metabase_export(host: &str, folder: &Path, file_type: &str) -> Command {
    let mut cmd = Command::cargo_bin("metabase-export").unwrap();
    cmd.env("METABASE_RC", folder.join("no-such-rc"))
        .env_remove("METABASE_URL")
        .env_remove("METABASE_USERNAME")
        .env_remove("METABASE_PASSWORD")
        .env_remove("RUST_LOG")
        .args([
            "--metabase-url",
            host,
            "--username",
            "u",
            "--password",
            "p",
            "--dashboard-id",
            "5",
            "--dashcard-id",
            "9",
            "--card-id",
            "3",
            "--dest-file-name",
            "out.csv",
            "--file-type",
            file_type,
            "--no-progress",
            "--log-level",
            "warn",
        ])
        .arg("--dest-folder-name")
        .arg(folder);
    cmd
}

fn mock_session(server: &mut Server, status: usize) -> mockito::Mock {
    server
        .mock("POST", "/api/session")
        .match_body(Matcher::Json(serde_json::json!({"username": "u", "password": "p"})))
        .with_status(status)
        .with_body(if status == 200 { r#"{"id":"abc123"}"# } else { "" })
        .create()
}

#[test]
fn successful_export_writes_file_and_exits_zero() {
    let mut server = Server::new();
    mock_session(&mut server, 200);
    let export = server
        .mock("POST", "/api/dashboard/5/dashcard/9/card/3/query/csv")
        .match_header("X-Metabase-Session", "abc123")
        .with_status(200)
        .with_body("a,b\n1,2\n")
        .create();

    let dir = tempfile::tempdir().unwrap();
    let folder = dir.path().join("out");

    // Bare host, as operators usually pass it.
    metabase_export(&server.host_with_port(), &folder, "CSV")
        .assert()
        .success()
        .stdout(predicate::str::contains("successfully written"))
        .stdout(predicate::str::contains("out.csv"));

    assert_eq!(std::fs::read(folder.join("out.csv")).unwrap(), b"a,b\n1,2\n");
    export.assert();
}

#[test]
fn failed_login_exits_200_without_exporting() {
    let mut server = Server::new();
    mock_session(&mut server, 403);
    let export = server
        .mock("POST", Matcher::Regex("^/api/dashboard/".into()))
        .expect(0)
        .create();

    let dir = tempfile::tempdir().unwrap();
    let folder = dir.path().join("out");

    metabase_export(&server.url(), &folder, "csv")
        .assert()
        .code(200)
        .stderr(predicate::str::contains("check if username or password are correct"));

    assert!(!folder.join("out.csv").exists());
    export.assert();
}

#[test]
fn unauthorized_export_exits_200() {
    let mut server = Server::new();
    mock_session(&mut server, 200);
    server
        .mock("POST", "/api/dashboard/5/dashcard/9/card/3/query/csv")
        .with_status(401)
        .create();

    let dir = tempfile::tempdir().unwrap();
    metabase_export(&server.url(), dir.path(), "csv")
        .assert()
        .code(200)
        .stderr(predicate::str::contains("Unauthorized"));
}

#[test]
fn missing_card_exits_201() {
    let mut server = Server::new();
    mock_session(&mut server, 200);
    server
        .mock("POST", "/api/dashboard/5/dashcard/9/card/3/query/csv")
        .with_status(404)
        .create();

    let dir = tempfile::tempdir().unwrap();
    metabase_export(&server.url(), dir.path(), "csv")
        .assert()
        .code(201)
        .stderr(predicate::str::contains("report id or run id not found"));
    assert!(!dir.path().join("out.csv").exists());
}

#[test]
fn server_error_exits_202_with_status_and_body() {
    let mut server = Server::new();
    mock_session(&mut server, 200);
    server
        .mock("POST", "/api/dashboard/5/dashcard/9/card/3/query/csv")
        .with_status(500)
        .with_body("query execution failed")
        .create();

    let dir = tempfile::tempdir().unwrap();
    metabase_export(&server.url(), dir.path(), "csv")
        .assert()
        .code(202)
        .stderr(predicate::str::contains("500"))
        .stderr(predicate::str::contains("query execution failed"));
}

#[test]
fn invalid_file_type_is_rejected_before_any_request() {
    let mut server = Server::new();
    let session = server
        .mock("POST", Matcher::Any)
        .expect(0)
        .create();

    let dir = tempfile::tempdir().unwrap();
    metabase_export(&server.url(), dir.path(), "pdf")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("pdf"));

    session.assert();
}

#[test]
fn missing_password_is_a_configuration_error() {
    let dir = tempfile::tempdir().unwrap();

    Command::cargo_bin("metabase-export")
        .unwrap()
        .env("METABASE_RC", dir.path().join("no-such-rc"))
        .env_remove("METABASE_URL")
        .env_remove("METABASE_USERNAME")
        .env_remove("METABASE_PASSWORD")
        .args([
            "--metabase-url",
            "127.0.0.1:9",
            "--username",
            "u",
            "--dashboard-id",
            "5",
            "--dashcard-id",
            "9",
            "--card-id",
            "3",
            "--dest-file-name",
            "out.csv",
            "--file-type",
            "csv",
            "--log-level",
            "off",
        ])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Missing configuration: password"));
}
