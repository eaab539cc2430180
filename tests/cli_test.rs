//! E2E tests for the billcrawl binary.
//!
//! Covers:
//! - Fail-fast configuration errors and their exit codes
//! - Offline commands (status, export) on an empty store
//! - A full crawl, status and export against a mocked upstream

use assert_cmd::Command;
use predicates::prelude::*;

mod common;

use common::fixtures::FakeUpstream;
use common::logger::TestLogger;

use billcrawl::test_utils::TestDir;

const CREDENTIAL_VARS: [&str; 4] = ["MERCHANT_ID", "PLACE_ID", "CLIENT_ID", "SECRET"];

/// A command isolated from the caller's environment and config.
#[allow(deprecated)]
fn billcrawl(dir: &TestDir) -> Command {
    let mut cmd = Command::cargo_bin("billcrawl").unwrap();
    for var in CREDENTIAL_VARS {
        cmd.env_remove(var);
    }
    cmd.env_remove("RUST_LOG")
        .env("NO_COLOR", "1")
        .env("BILLCRAWL_CONFIG", dir.file_path("config.toml"))
        .env("BILLCRAWL_DATABASE", dir.file_path("records.sqlite"))
        .env("BILLCRAWL_EXPORT", dir.file_path("bill_details.csv"))
        .env("BILLCRAWL_LOG", "warn");
    cmd
}

#[test]
fn missing_credentials_exit_with_config_error() {
    let log = TestLogger::new("missing_credentials_exit_with_config_error");
    log.phase("execute");
    let dir = TestDir::new();

    billcrawl(&dir)
        .args(["crawl", "all"])
        .env("MERCHANT_ID", "m1")
        .env("PLACE_ID", "p1")
        .env("CLIENT_ID", "cid")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("SECRET"))
        .stderr(predicate::str::contains("BILL-C001"));

    log.phase("verify");
    assert!(!dir.file_path("records.sqlite").exists());
    log.finish_ok();
}

#[test]
fn missing_merchant_is_reported_first() {
    let dir = TestDir::new();

    billcrawl(&dir)
        .args(["crawl", "bills"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("MERCHANT_ID"));
}

#[test]
fn invalid_concurrency_is_a_config_error() {
    let dir = TestDir::new();

    billcrawl(&dir)
        .args(["crawl", "details", "--concurrency", "0"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("concurrency"));
}

#[test]
fn malformed_config_file_is_a_config_error() {
    let dir = TestDir::new();
    dir.create_file("config.toml", "[api\nconcurrency = ");

    billcrawl(&dir)
        .arg("status")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("BILL-C003"));
}

#[test]
fn unknown_crawl_target_is_rejected() {
    let dir = TestDir::new();

    billcrawl(&dir)
        .args(["crawl", "everything"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn status_works_offline_on_empty_store() {
    let dir = TestDir::new();

    billcrawl(&dir)
        .args(["status", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"bills\": 0"))
        .stdout(predicate::str::contains("\"pending_details\": 0"));
}

#[test]
fn export_of_empty_store_writes_header_only() {
    let dir = TestDir::new();

    billcrawl(&dir)
        .arg("export")
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported 0 rows"));

    let csv = dir.read_file("bill_details.csv").unwrap();
    assert_eq!(csv.lines().count(), 1);
    assert!(csv.starts_with("billId,"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn crawl_status_and_export_end_to_end() {
    let log = TestLogger::new("crawl_status_and_export_end_to_end");
    log.phase("setup");
    let upstream = FakeUpstream::start().await;
    upstream.mount_token().await;
    upstream.mount_page(1, &["b2", "b1"], None, 1).await;
    upstream.mount_detail("b2", 2, 1).await;
    upstream.mount_detail("b1", 1, 1).await;
    let dir = TestDir::new();
    let uri = upstream.uri();

    log.phase("execute");
    let crawl = tokio::task::spawn_blocking({
        let mut cmd = billcrawl(&dir);
        cmd.args(["crawl", "all", "--json"])
            .env("MERCHANT_ID", common::fixtures::MERCHANT)
            .env("PLACE_ID", common::fixtures::PLACE)
            .env("CLIENT_ID", "client-id")
            .env("SECRET", "client-secret")
            .env("BILLCRAWL_API_URL", &uri)
            .env("BILLCRAWL_AUTH_URL", format!("{uri}{}", common::fixtures::AUTH_PATH));
        move || {
            let mut cmd = cmd;
            cmd.assert().success().get_output().stdout.clone()
        }
    })
    .await
    .unwrap();

    log.phase("verify");
    let reports: serde_json::Value = serde_json::from_slice(&crawl).unwrap();
    assert_eq!(reports[0]["crawler"], "bills");
    assert_eq!(reports[0]["records_written"], 2);
    assert_eq!(reports[1]["crawler"], "bill_details");
    assert_eq!(reports[1]["stop"], "completed");

    billcrawl(&dir)
        .args(["status", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"bill_details\": 2"))
        .stdout(predicate::str::contains("\"pending_details\": 0"));

    billcrawl(&dir)
        .arg("export")
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported 3 rows"));
    log.finish_ok();
}
