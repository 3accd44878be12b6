//! Regression tests for the demo runner binary: exit-code mapping and the
//! summary surface a driver relies on.

use assert_cmd::Command;
use predicates::prelude::*;

fn demo_suite() -> Command {
    Command::cargo_bin("demo_suite").expect("demo_suite binary builds")
}

#[test]
fn passes_by_default_with_exit_zero() {
    demo_suite()
        .assert()
        .success()
        .stdout(predicate::str::contains("demo_suite results: [PASSED]"))
        .stdout(predicate::str::contains("test cases passed: 3"));
}

#[test]
fn with_failures_flag_exits_nonzero() {
    demo_suite()
        .arg("--with-failures")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("did not pass"));
}

#[test]
fn details_flag_prints_expression_sources() {
    demo_suite()
        .arg("--details")
        .assert()
        .success()
        .stdout(predicate::str::contains("EXPR_A code: 1 + 1"))
        .stdout(predicate::str::contains("EXPR_A value: 2"));
}

#[test]
fn json_flag_emits_a_parseable_summary() {
    let output = demo_suite().arg("--json").output().expect("runs");
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).expect("utf-8 output");
    let json_start = stdout.find('{').expect("summary object in output");
    let summary: serde_json::Value =
        serde_json::from_str(stdout[json_start..].trim()).expect("valid JSON summary");

    assert_eq!(summary["suite"], "demo_suite");
    assert_eq!(summary["verdict"], "passed");
    assert_eq!(summary["with_errors"], false);
    assert_eq!(summary["passed_cases"], 3);
    assert_eq!(summary["failed_cases"], 0);
}
