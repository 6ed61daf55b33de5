use test_support::{History, report_cmd};

#[test]
fn csv_report_snapshot() {
  let fx = History::new()
    .job("backend, api", &[(90, "SUCCESS"), (45, "FAILURE")])
    .job("frontend", &[(15, "SUCCESS"), (14, "SUCCESS"), (13, "NOT_BUILT")])
    .job("legacy", &[(-15, "SUCCESS")])
    .write();

  let out = report_cmd(&fx).args(["--out", "-"]).output().unwrap();
  assert!(out.status.success());
  let s = String::from_utf8(out.stdout).unwrap();

  insta::assert_snapshot!(s.trim_end(), @r#"
  JOB_NAME, SUCCESS, NOT_SUCCESS, TOTAL
  "backend, api", 1, 1, 2
  frontend, 2, 1, 3
  "#);
}
