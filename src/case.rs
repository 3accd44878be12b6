//! Test cases: a named body of checks with per-run counters.

use std::cell::RefCell;
use std::rc::Rc;

use crate::check::{CheckContext, CheckCounters, Verdict};
use crate::output::{Reporter, BLUE, GREEN, MAGENTA, RED};

/// A named test case. The body receives a [`CheckContext`] and registers its
/// checks through the `check_*!` macros; the case keeps the counters from its
/// most recent run.
pub struct TestCase {
    name: String,
    body: Box<dyn FnMut(&mut CheckContext)>,
    suppress_details: bool,
    counters: CheckCounters,
}

impl TestCase {
    pub fn new(name: impl Into<String>, body: impl FnMut(&mut CheckContext) + 'static) -> Self {
        Self {
            name: name.into(),
            body: Box::new(body),
            suppress_details: false,
            counters: CheckCounters::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Suppresses per-check detail output. The pass/fail/error banner line
    /// still prints for every check.
    pub fn suppress_details(&self) -> bool {
        self.suppress_details
    }

    pub fn set_suppress_details(&mut self, suppress_details: bool) {
        self.suppress_details = suppress_details;
    }

    pub fn counters(&self) -> CheckCounters {
        self.counters
    }

    pub fn passed_checks(&self) -> i64 {
        self.counters.passed
    }

    pub fn failed_checks(&self) -> i64 {
        self.counters.failed
    }

    pub fn errored_checks(&self) -> i64 {
        self.counters.errored
    }

    pub fn verdict(&self) -> Verdict {
        self.counters.verdict()
    }

    pub fn has_errors(&self) -> bool {
        self.counters.has_errors()
    }

    /// Run the case against stdout.
    pub fn run(&mut self) {
        self.run_with(&mut Reporter::stdout());
    }

    /// Run the case: reset the counters, execute the body, print the summary.
    ///
    /// Never returns an error. A check whose expression misbehaves is
    /// absorbed into the errored counter, not propagated.
    pub fn run_with(&mut self, reporter: &mut Reporter) {
        reporter.case_rule();
        reporter.blank();
        let title = reporter.colorize(&self.name, BLUE);
        reporter.line(&format!("{title} running..."));
        reporter.blank();

        self.counters = CheckCounters::default();
        let mut ctx = CheckContext::new(self.suppress_details, reporter);
        (self.body)(&mut ctx);
        self.counters = ctx.into_counters();

        if self.suppress_details {
            reporter.blank();
        }

        let verdict = self.verdict();
        let mut results = reporter.colorize(verdict.label(), verdict.color());
        if self.counters.errored > 0 {
            let qualifier = reporter.colorize("with errors", MAGENTA);
            results.push(' ');
            results.push_str(&qualifier);
        }

        let title = reporter.colorize(&self.name, BLUE);
        reporter.line(&format!("{title} results: {results}"));
        let passed = reporter.colorize(&self.counters.passed.to_string(), GREEN);
        reporter.line(&format!("    checks passed: {passed}"));
        let failed = reporter.colorize(&self.counters.failed.to_string(), RED);
        reporter.line(&format!("    checks failed: {failed}"));
        let errored = reporter.colorize(&self.counters.errored.to_string(), MAGENTA);
        reporter.line(&format!("    checks with unexpected errors: {errored}"));
        reporter.blank();
        reporter.case_rule();
    }

    /// Zero-argument handle bound to `run`, for externally triggered ad-hoc
    /// invocation.
    pub fn runner(case: &Rc<RefCell<TestCase>>) -> impl Fn() {
        let case = Rc::clone(case);
        move || case.borrow_mut().run()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{raise_error, test_support};
    use crate::output::OutputBuffer;
    use crate::{check_equal, check_true};

    fn buffered() -> (Reporter, OutputBuffer) {
        let buffer = OutputBuffer::new();
        (Reporter::buffered(buffer.clone()), buffer)
    }

    #[test]
    fn run_resets_counters_each_time() {
        let _serial = test_support::serial();
        let mut case = TestCase::new("resets", |t| {
            check_equal!(t, 1, 1);
            check_equal!(t, 1, 2);
        });
        let (mut reporter, _) = buffered();
        case.run_with(&mut reporter);
        case.run_with(&mut reporter);
        assert_eq!(case.passed_checks(), 1);
        assert_eq!(case.failed_checks(), 1);
        assert_eq!(case.errored_checks(), 0);
    }

    #[test]
    fn errored_check_yields_passed_with_errors_verdict() {
        let _serial = test_support::serial();
        let noisy_true = || {
            raise_error("side effect");
            true
        };
        let mut case = TestCase::new("noisy", move |t| {
            check_true!(t, noisy_true());
        });
        let (mut reporter, _) = buffered();
        case.run_with(&mut reporter);
        assert_eq!(case.failed_checks(), 0);
        assert_eq!(case.errored_checks(), 1);
        assert_eq!(case.verdict(), Verdict::Passed);
        assert!(case.has_errors());
    }

    #[test]
    fn case_with_no_checks_passes() {
        let _serial = test_support::serial();
        let mut case = TestCase::new("empty", |_| {});
        let (mut reporter, _) = buffered();
        case.run_with(&mut reporter);
        assert_eq!(case.verdict(), Verdict::Passed);
        assert!(!case.has_errors());
    }

    #[test]
    fn summary_banner_reports_name_and_counts() {
        let _serial = test_support::serial();
        let mut case = TestCase::new("banner_case", |t| {
            check_equal!(t, 2, 2);
        });
        let (mut reporter, buffer) = buffered();
        case.run_with(&mut reporter);
        let text = buffer.as_text();
        assert!(text.contains("banner_case running..."));
        assert!(text.contains("banner_case results: [PASSED]"));
        assert!(text.contains("checks passed: 1"));
        assert!(text.contains("checks failed: 0"));
        assert!(text.contains("checks with unexpected errors: 0"));
    }

    #[test]
    fn runner_handle_invokes_run() {
        let _serial = test_support::serial();
        let case = Rc::new(RefCell::new(TestCase::new("handle", |t| {
            check_equal!(t, 1, 1);
        })));
        let run = TestCase::runner(&case);
        run();
        assert_eq!(case.borrow().passed_checks(), 1);
    }
}
