use predicates::prelude::*;
use test_support::{History, bare_cmd, report_cmd};

#[test]
fn missing_url_is_reported() {
  bare_cmd()
    .args(["--out", "-"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("Provide --url"));
}

#[test]
fn user_without_token_is_rejected() {
  bare_cmd()
    .args(["--url", "http://127.0.0.1:9", "--user", "alice", "--out", "-"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("--user and --token"));
}

#[test]
fn unknown_timezone_is_rejected() {
  let fx = History::new().job("api", &[(5, "SUCCESS")]).write();
  bare_cmd()
    .env("JENKINS_REPORT_FIXTURE", fx.path())
    .args(["--tz", "Mars/Olympus", "--out", "-"])
    .assert()
    .failure()
    .stdout(predicate::str::is_empty())
    .stderr(predicate::str::contains("unknown timezone `Mars/Olympus`"));
}

#[test]
fn named_timezone_moves_the_week_start() {
  // Monday 00:30 UTC is still Sunday in New York, so that build is last week there.
  let fx = History::new().job("api", &[(600, "SUCCESS"), (30, "FAILURE")]).write();
  bare_cmd()
    .env("JENKINS_REPORT_FIXTURE", fx.path())
    .args(["--tz", "America/New_York", "--now-override", test_support::NOW, "--out", "-"])
    .assert()
    .success()
    .stdout("JOB_NAME, SUCCESS, NOT_SUCCESS, TOTAL\napi, 1, 0, 1\n");
}

#[test]
fn relative_url_is_a_config_error() {
  bare_cmd()
    .args(["--url", "ci.example.com", "--job", "api", "--out", "-"])
    .assert()
    .failure()
    .stdout(predicate::str::is_empty())
    .stderr(predicate::str::contains("invalid --url `ci.example.com`"));
}

#[test]
fn future_since_is_rejected() {
  let fx = History::new().job("api", &[(5, "SUCCESS")]).write();
  report_cmd(&fx)
    .args(["--since", "2025-09-01", "--out", "-"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("in the future"));
}

#[test]
fn zero_page_size_is_a_usage_error() {
  let fx = History::new().write();
  report_cmd(&fx).args(["--page-size", "0"]).assert().failure().code(2);
}

#[test]
fn unreachable_server_fails_without_output() {
  let td = tempfile::TempDir::new().unwrap();
  bare_cmd()
    .args(["--url", "http://127.0.0.1:9", "--timeout-secs", "2", "--job", "api"])
    .args(["--now-override", test_support::NOW, "--tz", "utc"])
    .arg("--dir")
    .arg(td.path())
    .assert()
    .failure()
    .stdout(predicate::str::is_empty())
    .stderr(predicate::str::contains("api"));
  assert!(std::fs::read_dir(td.path()).unwrap().next().is_none());
}

#[test]
fn fixture_that_is_not_json_fails() {
  let td = tempfile::TempDir::new().unwrap();
  let path = td.path().join("history.json");
  std::fs::write(&path, "not json").unwrap();
  bare_cmd()
    .env("JENKINS_REPORT_FIXTURE", &path)
    .args(["--out", "-"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("parsing fixture"));
}
