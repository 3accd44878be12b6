//! Test suites: an ordered collection of named test cases, run in sequence.

use std::cell::RefCell;
use std::rc::Rc;

use serde::Serialize;
use thiserror::Error;

use crate::case::TestCase;
use crate::check::Verdict;
use crate::output::{Reporter, BLUE, GREEN, MAGENTA, RED, YELLOW};

/// A named, ordered collection of test cases.
///
/// Registration order is display order. A name may be declared without a
/// case; declared-but-unset entries are silently skipped by `run_all`.
pub struct TestSuite {
    name: String,
    cases: Vec<(String, Option<TestCase>)>,
    suppress_details: bool,
    passed_cases: i64,
    mixed_cases: i64,
    failed_cases: i64,
    errored_cases: i64,
}

/// Counter snapshot for drivers that want a machine-readable result.
#[derive(Debug, Clone, Serialize)]
pub struct SuiteSummary {
    pub suite: String,
    pub verdict: &'static str,
    pub with_errors: bool,
    pub passed_cases: i64,
    pub mixed_cases: i64,
    pub failed_cases: i64,
    pub errored_cases: i64,
}

/// Returned by [`TestSuite::require_passed`] when the run was not clean.
/// Drivers map this to a nonzero exit code.
#[derive(Debug, Error)]
#[error(
    "test suite '{suite}' did not pass: {failed_cases} failed, {mixed_cases} mixed, \
     {errored_cases} with unexpected errors"
)]
pub struct SuiteFailure {
    pub suite: String,
    pub failed_cases: i64,
    pub mixed_cases: i64,
    pub errored_cases: i64,
}

impl TestSuite {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cases: Vec::new(),
            // Suites default to the terse one-line-per-check mode; individual
            // cases run directly default to full detail.
            suppress_details: true,
            passed_cases: 0,
            mixed_cases: 0,
            failed_cases: 0,
            errored_cases: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register `case` under `name`. Re-registration replaces the case in
    /// place without changing its position in the run order.
    pub fn register(&mut self, name: &str, case: TestCase) {
        if let Some(slot) = self.slot_mut(name) {
            *slot = Some(case);
        } else {
            self.cases.push((name.to_string(), Some(case)));
        }
    }

    /// Reserve a position for `name` with no case attached. Does nothing if
    /// the name is already present.
    pub fn declare(&mut self, name: &str) {
        if self.slot_mut(name).is_none() {
            self.cases.push((name.to_string(), None));
        }
    }

    pub fn case(&self, name: &str) -> Option<&TestCase> {
        self.cases
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, case)| case.as_ref())
    }

    pub fn case_mut(&mut self, name: &str) -> Option<&mut TestCase> {
        self.slot_mut(name).and_then(|slot| slot.as_mut())
    }

    pub fn case_names(&self) -> Vec<&str> {
        self.cases.iter().map(|(n, _)| n.as_str()).collect()
    }

    fn slot_mut(&mut self, name: &str) -> Option<&mut Option<TestCase>> {
        self.cases
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, slot)| slot)
    }

    pub fn suppress_details(&self) -> bool {
        self.suppress_details
    }

    pub fn set_suppress_details(&mut self, suppress_details: bool) {
        self.suppress_details = suppress_details;
    }

    pub fn passed_cases(&self) -> i64 {
        self.passed_cases
    }

    pub fn mixed_cases(&self) -> i64 {
        self.mixed_cases
    }

    pub fn failed_cases(&self) -> i64 {
        self.failed_cases
    }

    pub fn errored_cases(&self) -> i64 {
        self.errored_cases
    }

    /// Passed when nothing failed or mixed, Failed when nothing passed or
    /// mixed, Mixed otherwise.
    pub fn verdict(&self) -> Verdict {
        if self.failed_cases == 0 && self.mixed_cases == 0 {
            Verdict::Passed
        } else if self.passed_cases == 0 && self.mixed_cases == 0 {
            Verdict::Failed
        } else {
            Verdict::Mixed
        }
    }

    pub fn has_errors(&self) -> bool {
        self.errored_cases > 0
    }

    /// Run every registered case against stdout.
    pub fn run_all(&mut self) {
        self.run_all_with(&mut Reporter::stdout());
    }

    /// Run every registered case in registration order, aggregating case
    /// verdicts into the suite counters.
    ///
    /// Each case runs with the suite's `suppress_details` imposed for the
    /// duration of the call; the case's own flag is restored afterwards.
    /// A case counts toward exactly one of passed/failed/mixed, and
    /// independently toward errored when any of its checks errored.
    pub fn run_all_with(&mut self, reporter: &mut Reporter) {
        reporter.suite_rule();
        reporter.blank();
        let title = reporter.colorize(&self.name, BLUE);
        reporter.line(&format!("{title} running..."));
        reporter.blank();
        reporter.suite_rule();

        let mut passed = 0;
        let mut mixed = 0;
        let mut failed = 0;
        let mut errored = 0;

        for (_, slot) in &mut self.cases {
            let Some(case) = slot.as_mut() else { continue };

            let previous_suppress = case.suppress_details();
            case.set_suppress_details(self.suppress_details);
            case.run_with(reporter);
            case.set_suppress_details(previous_suppress);

            match case.verdict() {
                Verdict::Passed => passed += 1,
                Verdict::Failed => failed += 1,
                Verdict::Mixed => mixed += 1,
            }
            if case.errored_checks() > 0 {
                errored += 1;
            }
        }

        self.passed_cases = passed;
        self.mixed_cases = mixed;
        self.failed_cases = failed;
        self.errored_cases = errored;

        reporter.suite_rule();
        reporter.blank();

        let verdict = self.verdict();
        let mut results = reporter.colorize(verdict.label(), verdict.color());
        if self.errored_cases > 0 {
            let qualifier = reporter.colorize("with errors", MAGENTA);
            results.push(' ');
            results.push_str(&qualifier);
        }

        let title = reporter.colorize(&self.name, BLUE);
        reporter.line(&format!("{title} results: {results}"));
        let passed = reporter.colorize(&self.passed_cases.to_string(), GREEN);
        reporter.line(&format!("    test cases passed: {passed}"));
        let mixed = reporter.colorize(&self.mixed_cases.to_string(), YELLOW);
        reporter.line(&format!("    test cases mixed: {mixed}"));
        let failed = reporter.colorize(&self.failed_cases.to_string(), RED);
        reporter.line(&format!("    test cases failed: {failed}"));
        let errored = reporter.colorize(&self.errored_cases.to_string(), MAGENTA);
        reporter.line(&format!("    test cases with unexpected errors: {errored}"));
        reporter.blank();
        reporter.suite_rule();
    }

    pub fn summary(&self) -> SuiteSummary {
        SuiteSummary {
            suite: self.name.clone(),
            verdict: self.verdict().name(),
            with_errors: self.has_errors(),
            passed_cases: self.passed_cases,
            mixed_cases: self.mixed_cases,
            failed_cases: self.failed_cases,
            errored_cases: self.errored_cases,
        }
    }

    /// Ok only when the most recent run had no failed, mixed, or errored
    /// cases. Unexpected diagnostics count as failure at this boundary.
    pub fn require_passed(&self) -> Result<(), SuiteFailure> {
        if self.failed_cases == 0 && self.mixed_cases == 0 && self.errored_cases == 0 {
            Ok(())
        } else {
            Err(SuiteFailure {
                suite: self.name.clone(),
                failed_cases: self.failed_cases,
                mixed_cases: self.mixed_cases,
                errored_cases: self.errored_cases,
            })
        }
    }

    /// Zero-argument handle bound to `run_all`, for externally triggered
    /// ad-hoc invocation.
    pub fn runner(suite: &Rc<RefCell<TestSuite>>) -> impl Fn() {
        let suite = Rc::clone(suite);
        move || suite.borrow_mut().run_all()
    }
}
