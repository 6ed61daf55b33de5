use predicates::prelude::*;
use serde_json::json;
use test_support::{History, report_cmd, week_start_ms};

fn mixed() -> test_support::Fixture {
  History::new()
    .job("api", &[(30, "SUCCESS"), (20, "FAILURE")])
    .broken_job("flaky", "connection reset by peer")
    .job("web", &[(10, "SUCCESS")])
    .write()
}

#[test]
fn abort_is_the_default_and_names_the_job() {
  let fx = mixed();
  report_cmd(&fx)
    .args(["--out", "-"])
    .assert()
    .failure()
    .stdout(predicate::str::is_empty())
    .stderr(predicate::str::contains("flaky").and(predicate::str::contains("connection reset")));
}

#[test]
fn abort_writes_no_report_file() {
  let fx = mixed();
  let dir = fx.dir().join("out");
  report_cmd(&fx).arg("--dir").arg(&dir).assert().failure();
  assert!(!dir.join("REPORT-2025-08-15.csv").exists());
}

#[test]
fn record_policy_lists_unreadable_jobs_apart_from_tallies() {
  let fx = mixed();
  let out = report_cmd(&fx)
    .args(["--on-fetch-error", "record", "--format", "json", "--out", "-"])
    .output()
    .unwrap();
  assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));

  let v: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
  let agg = &v["aggregate"];
  let names: Vec<&str> = agg["jobs"]
    .as_array()
    .unwrap()
    .iter()
    .map(|j| j["job"].as_str().unwrap())
    .collect();
  assert_eq!(names, vec!["api", "web"]);
  assert_eq!(agg["total_success"], 2);
  assert_eq!(agg["total_failure"], 1);

  let failed = agg["failed_jobs"].as_array().unwrap();
  assert_eq!(failed.len(), 1);
  assert_eq!(failed[0]["job"], "flaky");
  assert!(failed[0]["error"].as_str().unwrap().contains("connection reset"));

  // the warning goes to stderr, never into the report
  assert!(String::from_utf8_lossy(&out.stderr).contains("flaky"));
}

#[test]
fn record_policy_csv_still_excludes_failed_job() {
  let fx = mixed();
  let out = report_cmd(&fx)
    .args(["--on-fetch-error", "record", "--out", "-"])
    .output()
    .unwrap();
  assert!(out.status.success());
  let s = String::from_utf8(out.stdout).unwrap();
  assert!(!s.contains("flaky"));
  assert!(s.contains("api, 1, 1, 2"));
}

#[test]
fn malformed_page_is_never_masked() {
  let start = week_start_ms();
  let fx = History::new()
    .raw_job(
      "api",
      json!([
        {"number": 9, "timestamp": start + 5_000, "result": "SUCCESS"},
        {"number": 8, "result": "SUCCESS"}
      ]),
    )
    .write();

  // even under the record policy a malformed page shows up, as a failed job
  let out = report_cmd(&fx)
    .args(["--on-fetch-error", "record", "--format", "json", "--out", "-"])
    .output()
    .unwrap();
  assert!(out.status.success());
  let v: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
  assert_eq!(v["aggregate"]["failed_jobs"][0]["job"], "api");
  assert!(v["aggregate"]["jobs"].as_array().unwrap().is_empty());

  report_cmd(&fx)
    .args(["--out", "-"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("malformed").and(predicate::str::contains("timestamp")));
}
