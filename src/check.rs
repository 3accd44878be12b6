//! The check evaluator.
//!
//! Every assertion in a test body goes through one of three evaluator shapes
//! on [`CheckContext`]: value-classifying checks (a boolean expression, or two
//! expressions under a comparison predicate), diagnostic-count checks, and
//! manual checks. The `check_*!` macros are thin fronts that capture the
//! expression source text with `stringify!` and pick the predicate; all of the
//! actual protocol lives in the generic methods.
//!
//! Value-classifying checks treat unexpected diagnostics as a first-class
//! signal: if evaluating the checked expression recorded anything in the
//! diagnostic log, the check is Errored no matter what the expression
//! returned. Diagnostic-count checks are *about* diagnostics, so any count is
//! a legitimate data point and the outcome is only ever Passed or Failed.

use std::fmt;

use crate::diagnostics::{self, Scope};
use crate::output::{Reporter, GREEN, MAGENTA, RED, YELLOW};

// ============================================================================
// OUTCOMES, COUNTERS, VERDICTS
// ============================================================================

/// Classification of a single check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    Passed,
    Failed,
    /// The checked expression triggered unexpected diagnostics.
    Errored,
}

impl CheckOutcome {
    pub fn tag(self) -> &'static str {
        match self {
            CheckOutcome::Passed => "[PASSED]",
            CheckOutcome::Failed => "[FAILED]",
            CheckOutcome::Errored => "[ERRORED]",
        }
    }

    pub(crate) fn color(self) -> &'static str {
        match self {
            CheckOutcome::Passed => GREEN,
            CheckOutcome::Failed => RED,
            CheckOutcome::Errored => MAGENTA,
        }
    }
}

/// Per-case check tallies. Reset at the start of every run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CheckCounters {
    pub passed: i64,
    pub failed: i64,
    pub errored: i64,
}

impl CheckCounters {
    /// Passed when nothing failed, Failed when nothing passed, Mixed
    /// otherwise. Errored checks do not participate; they carry the
    /// "with errors" qualifier instead.
    pub fn verdict(&self) -> Verdict {
        if self.failed == 0 {
            Verdict::Passed
        } else if self.passed == 0 {
            Verdict::Failed
        } else {
            Verdict::Mixed
        }
    }

    pub fn has_errors(&self) -> bool {
        self.errored > 0
    }
}

/// Aggregate classification of a case or suite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Passed,
    Failed,
    Mixed,
}

impl Verdict {
    pub fn label(self) -> &'static str {
        match self {
            Verdict::Passed => "[PASSED]",
            Verdict::Failed => "[FAILED]",
            Verdict::Mixed => "[MIXED]",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Verdict::Passed => "passed",
            Verdict::Failed => "failed",
            Verdict::Mixed => "mixed",
        }
    }

    pub(crate) fn color(self) -> &'static str {
        match self {
            Verdict::Passed => GREEN,
            Verdict::Failed => RED,
            Verdict::Mixed => YELLOW,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================================================
// APPROXIMATE EQUALITY
// ============================================================================

/// Equality with a tolerance appropriate to the type's representation.
///
/// Floating-point types compare with a relative tolerance floored at an
/// absolute epsilon; everything else compares exactly. Implement this for
/// your own types to use them with `check_approx_equal!`.
pub trait ApproxEq {
    fn approx_eq(&self, other: &Self) -> bool;
}

const APPROX_TOLERANCE_F64: f64 = 1e-5;
const APPROX_TOLERANCE_F32: f32 = 1e-5;

impl ApproxEq for f64 {
    fn approx_eq(&self, other: &Self) -> bool {
        if self == other {
            return true;
        }
        let tolerance = (APPROX_TOLERANCE_F64 * self.abs()).max(APPROX_TOLERANCE_F64);
        (self - other).abs() < tolerance
    }
}

impl ApproxEq for f32 {
    fn approx_eq(&self, other: &Self) -> bool {
        if self == other {
            return true;
        }
        let tolerance = (APPROX_TOLERANCE_F32 * self.abs()).max(APPROX_TOLERANCE_F32);
        (self - other).abs() < tolerance
    }
}

macro_rules! approx_is_exact {
    ($($ty:ty),* $(,)?) => {
        $(
            impl ApproxEq for $ty {
                fn approx_eq(&self, other: &Self) -> bool {
                    self == other
                }
            }
        )*
    };
}

approx_is_exact!(
    bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, String
);

impl ApproxEq for &str {
    fn approx_eq(&self, other: &Self) -> bool {
        self == other
    }
}

// ============================================================================
// COUNT EXPECTATIONS
// ============================================================================

/// What a diagnostic-count check demands of the observed delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountExpectation {
    /// Exactly this many diagnostics.
    Exactly(usize),
    /// More than zero.
    AtLeastOne,
    /// None at all.
    Zero,
}

impl CountExpectation {
    pub fn matches(self, count: usize) -> bool {
        match self {
            CountExpectation::Exactly(n) => count == n,
            CountExpectation::AtLeastOne => count > 0,
            CountExpectation::Zero => count == 0,
        }
    }
}

// ============================================================================
// THE EVALUATOR
// ============================================================================

/// Handed to each test body; owns the counters for the run in progress and
/// the evaluation protocol behind every `check_*!` macro.
pub struct CheckContext<'r> {
    counters: CheckCounters,
    suppress_details: bool,
    reporter: &'r mut Reporter,
}

impl<'r> CheckContext<'r> {
    pub(crate) fn new(suppress_details: bool, reporter: &'r mut Reporter) -> Self {
        Self {
            counters: CheckCounters::default(),
            suppress_details,
            reporter,
        }
    }

    pub fn counters(&self) -> CheckCounters {
        self.counters
    }

    pub(crate) fn into_counters(self) -> CheckCounters {
        self.counters
    }

    pub fn suppress_details(&self) -> bool {
        self.suppress_details
    }

    /// Boolean check of one expression. The expression is evaluated exactly
    /// once, with all channels suppressed and the diagnostic delta measured
    /// across the evaluation.
    pub fn check_bool(
        &mut self,
        check_string: &str,
        code: &str,
        expect_true: bool,
        expr: impl FnOnce() -> bool,
    ) -> CheckOutcome {
        let saved = diagnostics::suppress_all();
        let before = diagnostics::total_count();
        let value = expr();
        let delta = diagnostics::total_count() - before;
        drop(saved);

        let outcome = if delta > 0 {
            CheckOutcome::Errored
        } else if value == expect_true {
            CheckOutcome::Passed
        } else {
            CheckOutcome::Failed
        };

        self.banner(outcome, check_string);
        if !self.suppress_details {
            self.detail(&format!("EXPR code: {code}"));
            self.detail(&format!("EXPR value: {value}"));
            if outcome == CheckOutcome::Errored {
                let messages = diagnostics::last_n(Scope::All, delta);
                self.detail_diagnostics(&messages);
            }
        }
        self.finish(outcome, 1)
    }

    /// Comparison check of two expressions. Both are evaluated exactly once,
    /// in order, inside one suppressed window; the predicate only runs when
    /// the window stayed clean.
    pub fn check_compare<T: fmt::Display>(
        &mut self,
        check_string: &str,
        code_a: &str,
        code_b: &str,
        predicate: impl FnOnce(&T, &T) -> bool,
        expr_a: impl FnOnce() -> T,
        expr_b: impl FnOnce() -> T,
    ) -> CheckOutcome {
        let saved = diagnostics::suppress_all();
        let before = diagnostics::total_count();
        let value_a = expr_a();
        let value_b = expr_b();
        let delta = diagnostics::total_count() - before;
        drop(saved);

        let outcome = if delta > 0 {
            CheckOutcome::Errored
        } else if predicate(&value_a, &value_b) {
            CheckOutcome::Passed
        } else {
            CheckOutcome::Failed
        };

        self.banner(outcome, check_string);
        if !self.suppress_details {
            self.detail(&format!("EXPR_A code: {code_a}"));
            self.detail(&format!("EXPR_A value: {value_a}"));
            self.detail(&format!("EXPR_B code: {code_b}"));
            self.detail(&format!("EXPR_B value: {value_b}"));
            if outcome == CheckOutcome::Errored {
                let messages = diagnostics::last_n(Scope::All, delta);
                self.detail_diagnostics(&messages);
            }
        }
        self.finish(outcome, 1)
    }

    /// Diagnostic-count check: evaluate once with only the targeted scope
    /// suppressed, then compare the scope's count delta against the
    /// expectation. Never Errored; the diagnostics are the data.
    pub fn check_diagnostics<R>(
        &mut self,
        check_string: &str,
        code: &str,
        scope: Scope,
        expectation: CountExpectation,
        expr: impl FnOnce() -> R,
    ) -> CheckOutcome {
        let saved = diagnostics::suppress_scope(scope);
        let before = diagnostics::count_in(scope);
        let _ = expr();
        let count = diagnostics::count_in(scope) - before;
        drop(saved);

        let outcome = if expectation.matches(count) {
            CheckOutcome::Passed
        } else {
            CheckOutcome::Failed
        };

        self.banner(outcome, check_string);
        if !self.suppress_details {
            self.detail(&format!("EXPR code: {code}"));
            let messages = diagnostics::last_n(scope, count);
            self.detail_diagnostics(&messages);
        }
        self.finish(outcome, 1)
    }

    /// Manually record one passed check.
    pub fn pass(&mut self) -> CheckOutcome {
        self.banner(CheckOutcome::Passed, "check_pass()");
        self.finish(CheckOutcome::Passed, 1)
    }

    /// Manually record one failed check.
    pub fn fail(&mut self) -> CheckOutcome {
        self.banner(CheckOutcome::Failed, "check_fail()");
        self.finish(CheckOutcome::Failed, 1)
    }

    /// Manually record `count` passed checks with a caller-supplied message.
    pub fn pass_with(&mut self, count: i64, message: &str) -> CheckOutcome {
        self.banner(CheckOutcome::Passed, "check_pass_with(COUNT, MESSAGE)");
        if !self.suppress_details {
            self.detail(&format!("count: {count}"));
            self.detail(&format!("message: {message}"));
        }
        self.finish(CheckOutcome::Passed, count)
    }

    /// Manually record `count` failed checks with a caller-supplied message.
    pub fn fail_with(&mut self, count: i64, message: &str) -> CheckOutcome {
        self.banner(CheckOutcome::Failed, "check_fail_with(COUNT, MESSAGE)");
        if !self.suppress_details {
            self.detail(&format!("count: {count}"));
            self.detail(&format!("message: {message}"));
        }
        self.finish(CheckOutcome::Failed, count)
    }

    // The banner line always prints, even with details suppressed; it is the
    // one-line-per-check mode.
    fn banner(&mut self, outcome: CheckOutcome, check_string: &str) {
        let tag = self.reporter.colorize(outcome.tag(), outcome.color());
        self.reporter.line(&format!("    {tag} {check_string}"));
    }

    fn detail(&mut self, text: &str) {
        self.reporter.line(&format!("        {text}"));
    }

    fn detail_diagnostics(&mut self, messages: &[String]) {
        match messages {
            [] => {}
            [single] => self.detail(&format!("diagnostic: {single}")),
            many => {
                self.detail("diagnostics:");
                for message in many {
                    self.reporter.line(&format!("            {message}"));
                }
            }
        }
    }

    fn finish(&mut self, outcome: CheckOutcome, amount: i64) -> CheckOutcome {
        match outcome {
            CheckOutcome::Passed => self.counters.passed += amount,
            CheckOutcome::Failed => self.counters.failed += amount,
            CheckOutcome::Errored => self.counters.errored += amount,
        }
        if !self.suppress_details {
            self.reporter.blank();
        }
        outcome
    }
}

// ============================================================================
// CHECK MACROS
// ============================================================================

/// Check that an expression is true.
#[macro_export]
macro_rules! check_true {
    ($ctx:expr, $e:expr) => {
        $ctx.check_bool("check_true!(EXPR)", stringify!($e), true, || $e)
    };
}

/// Check that an expression is false.
#[macro_export]
macro_rules! check_false {
    ($ctx:expr, $e:expr) => {
        $ctx.check_bool("check_false!(EXPR)", stringify!($e), false, || $e)
    };
}

/// Check that two expressions are equal.
#[macro_export]
macro_rules! check_equal {
    ($ctx:expr, $a:expr, $b:expr) => {
        $ctx.check_compare(
            "check_equal!(EXPR_A, EXPR_B)",
            stringify!($a),
            stringify!($b),
            |a, b| a == b,
            || $a,
            || $b,
        )
    };
}

/// Check that two expressions are not equal.
#[macro_export]
macro_rules! check_not_equal {
    ($ctx:expr, $a:expr, $b:expr) => {
        $ctx.check_compare(
            "check_not_equal!(EXPR_A, EXPR_B)",
            stringify!($a),
            stringify!($b),
            |a, b| a != b,
            || $a,
            || $b,
        )
    };
}

/// Check that the first expression is less than the second.
#[macro_export]
macro_rules! check_less {
    ($ctx:expr, $a:expr, $b:expr) => {
        $ctx.check_compare(
            "check_less!(EXPR_A, EXPR_B)",
            stringify!($a),
            stringify!($b),
            |a, b| a < b,
            || $a,
            || $b,
        )
    };
}

/// Check that the first expression is less than or equal to the second.
#[macro_export]
macro_rules! check_less_or_equal {
    ($ctx:expr, $a:expr, $b:expr) => {
        $ctx.check_compare(
            "check_less_or_equal!(EXPR_A, EXPR_B)",
            stringify!($a),
            stringify!($b),
            |a, b| a <= b,
            || $a,
            || $b,
        )
    };
}

/// Check that the first expression is greater than the second.
#[macro_export]
macro_rules! check_greater {
    ($ctx:expr, $a:expr, $b:expr) => {
        $ctx.check_compare(
            "check_greater!(EXPR_A, EXPR_B)",
            stringify!($a),
            stringify!($b),
            |a, b| a > b,
            || $a,
            || $b,
        )
    };
}

/// Check that the first expression is greater than or equal to the second.
#[macro_export]
macro_rules! check_greater_or_equal {
    ($ctx:expr, $a:expr, $b:expr) => {
        $ctx.check_compare(
            "check_greater_or_equal!(EXPR_A, EXPR_B)",
            stringify!($a),
            stringify!($b),
            |a, b| a >= b,
            || $a,
            || $b,
        )
    };
}

/// Check that two expressions are approximately equal (see [`ApproxEq`]).
#[macro_export]
macro_rules! check_approx_equal {
    ($ctx:expr, $a:expr, $b:expr) => {
        $ctx.check_compare(
            "check_approx_equal!(EXPR_A, EXPR_B)",
            stringify!($a),
            stringify!($b),
            |a, b| $crate::check::ApproxEq::approx_eq(a, b),
            || $a,
            || $b,
        )
    };
}

/// Check that evaluating an expression records exactly `n` diagnostics
/// across all channels.
#[macro_export]
macro_rules! check_n_diagnostics {
    ($ctx:expr, $e:expr, $n:expr) => {
        $ctx.check_diagnostics(
            "check_n_diagnostics!(EXPR, N)",
            stringify!($e),
            $crate::diagnostics::Scope::All,
            $crate::check::CountExpectation::Exactly($n),
            || $e,
        )
    };
}

/// Check that evaluating an expression records exactly `n` printed errors.
#[macro_export]
macro_rules! check_n_print_errors {
    ($ctx:expr, $e:expr, $n:expr) => {
        $ctx.check_diagnostics(
            "check_n_print_errors!(EXPR, N)",
            stringify!($e),
            $crate::diagnostics::Scope::Channel($crate::diagnostics::Channel::PrintError),
            $crate::check::CountExpectation::Exactly($n),
            || $e,
        )
    };
}

/// Check that evaluating an expression records exactly `n` raised errors.
#[macro_export]
macro_rules! check_n_raised_errors {
    ($ctx:expr, $e:expr, $n:expr) => {
        $ctx.check_diagnostics(
            "check_n_raised_errors!(EXPR, N)",
            stringify!($e),
            $crate::diagnostics::Scope::Channel($crate::diagnostics::Channel::RaisedError),
            $crate::check::CountExpectation::Exactly($n),
            || $e,
        )
    };
}

/// Check that evaluating an expression records exactly `n` raised warnings.
#[macro_export]
macro_rules! check_n_raised_warnings {
    ($ctx:expr, $e:expr, $n:expr) => {
        $ctx.check_diagnostics(
            "check_n_raised_warnings!(EXPR, N)",
            stringify!($e),
            $crate::diagnostics::Scope::Channel($crate::diagnostics::Channel::RaisedWarning),
            $crate::check::CountExpectation::Exactly($n),
            || $e,
        )
    };
}

/// Check that evaluating an expression records at least one diagnostic.
#[macro_export]
macro_rules! check_some_diagnostics {
    ($ctx:expr, $e:expr) => {
        $ctx.check_diagnostics(
            "check_some_diagnostics!(EXPR)",
            stringify!($e),
            $crate::diagnostics::Scope::All,
            $crate::check::CountExpectation::AtLeastOne,
            || $e,
        )
    };
}

/// Check that evaluating an expression records at least one printed error.
#[macro_export]
macro_rules! check_some_print_errors {
    ($ctx:expr, $e:expr) => {
        $ctx.check_diagnostics(
            "check_some_print_errors!(EXPR)",
            stringify!($e),
            $crate::diagnostics::Scope::Channel($crate::diagnostics::Channel::PrintError),
            $crate::check::CountExpectation::AtLeastOne,
            || $e,
        )
    };
}

/// Check that evaluating an expression records at least one raised error.
#[macro_export]
macro_rules! check_some_raised_errors {
    ($ctx:expr, $e:expr) => {
        $ctx.check_diagnostics(
            "check_some_raised_errors!(EXPR)",
            stringify!($e),
            $crate::diagnostics::Scope::Channel($crate::diagnostics::Channel::RaisedError),
            $crate::check::CountExpectation::AtLeastOne,
            || $e,
        )
    };
}

/// Check that evaluating an expression records at least one raised warning.
#[macro_export]
macro_rules! check_some_raised_warnings {
    ($ctx:expr, $e:expr) => {
        $ctx.check_diagnostics(
            "check_some_raised_warnings!(EXPR)",
            stringify!($e),
            $crate::diagnostics::Scope::Channel($crate::diagnostics::Channel::RaisedWarning),
            $crate::check::CountExpectation::AtLeastOne,
            || $e,
        )
    };
}

/// Check that evaluating an expression records no diagnostics at all.
#[macro_export]
macro_rules! check_no_diagnostics {
    ($ctx:expr, $e:expr) => {
        $ctx.check_diagnostics(
            "check_no_diagnostics!(EXPR)",
            stringify!($e),
            $crate::diagnostics::Scope::All,
            $crate::check::CountExpectation::Zero,
            || $e,
        )
    };
}

/// Check that evaluating an expression records no printed errors.
#[macro_export]
macro_rules! check_no_print_errors {
    ($ctx:expr, $e:expr) => {
        $ctx.check_diagnostics(
            "check_no_print_errors!(EXPR)",
            stringify!($e),
            $crate::diagnostics::Scope::Channel($crate::diagnostics::Channel::PrintError),
            $crate::check::CountExpectation::Zero,
            || $e,
        )
    };
}

/// Check that evaluating an expression records no raised errors.
#[macro_export]
macro_rules! check_no_raised_errors {
    ($ctx:expr, $e:expr) => {
        $ctx.check_diagnostics(
            "check_no_raised_errors!(EXPR)",
            stringify!($e),
            $crate::diagnostics::Scope::Channel($crate::diagnostics::Channel::RaisedError),
            $crate::check::CountExpectation::Zero,
            || $e,
        )
    };
}

/// Check that evaluating an expression records no raised warnings.
#[macro_export]
macro_rules! check_no_raised_warnings {
    ($ctx:expr, $e:expr) => {
        $ctx.check_diagnostics(
            "check_no_raised_warnings!(EXPR)",
            stringify!($e),
            $crate::diagnostics::Scope::Channel($crate::diagnostics::Channel::RaisedWarning),
            $crate::check::CountExpectation::Zero,
            || $e,
        )
    };
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::diagnostics::{
        raise_error, raise_warning, suppress, suppression, test_support, Suppression,
    };
    use crate::output::OutputBuffer;

    fn run_checks(
        suppress_details: bool,
        body: impl FnOnce(&mut CheckContext),
    ) -> (CheckCounters, OutputBuffer) {
        let buffer = OutputBuffer::new();
        let mut reporter = Reporter::buffered(buffer.clone());
        let mut ctx = CheckContext::new(suppress_details, &mut reporter);
        body(&mut ctx);
        (ctx.into_counters(), buffer)
    }

    #[test]
    fn equal_values_pass() {
        let _serial = test_support::serial();
        let (counters, _) = run_checks(false, |t| {
            let outcome = check_equal!(t, 1, 1);
            assert_eq!(outcome, CheckOutcome::Passed);
        });
        assert_eq!(
            counters,
            CheckCounters {
                passed: 1,
                failed: 0,
                errored: 0
            }
        );
    }

    #[test]
    fn unequal_values_fail() {
        let _serial = test_support::serial();
        let (counters, _) = run_checks(false, |t| {
            let outcome = check_equal!(t, 1, 2);
            assert_eq!(outcome, CheckOutcome::Failed);
        });
        assert_eq!(
            counters,
            CheckCounters {
                passed: 0,
                failed: 1,
                errored: 0
            }
        );
    }

    #[test]
    fn float_sum_fails_exact_but_passes_approximate() {
        let _serial = test_support::serial();
        let (counters, _) = run_checks(false, |t| {
            assert_eq!(check_equal!(t, 0.3, 0.1 + 0.2), CheckOutcome::Failed);
            assert_eq!(check_approx_equal!(t, 0.3, 0.1 + 0.2), CheckOutcome::Passed);
        });
        assert_eq!(counters.passed, 1);
        assert_eq!(counters.failed, 1);
    }

    #[test]
    fn ordering_checks_apply_their_predicates() {
        let _serial = test_support::serial();
        let (counters, _) = run_checks(false, |t| {
            assert_eq!(check_less!(t, 1, 2), CheckOutcome::Passed);
            assert_eq!(check_less_or_equal!(t, 2, 2), CheckOutcome::Passed);
            assert_eq!(check_greater!(t, 2, 2), CheckOutcome::Failed);
            assert_eq!(check_greater_or_equal!(t, 3, 2), CheckOutcome::Passed);
            assert_eq!(check_not_equal!(t, 1, 2), CheckOutcome::Passed);
        });
        assert_eq!(counters.passed, 4);
        assert_eq!(counters.failed, 1);
    }

    #[test]
    fn diagnostics_override_a_true_value() {
        let _serial = test_support::serial();
        let noisy_true = || {
            raise_error("unexpected");
            true
        };
        let (counters, _) = run_checks(false, |t| {
            let outcome = check_true!(t, noisy_true());
            assert_eq!(outcome, CheckOutcome::Errored);
        });
        assert_eq!(
            counters,
            CheckCounters {
                passed: 0,
                failed: 0,
                errored: 1
            }
        );
    }

    #[test]
    fn diagnostics_override_comparisons_too() {
        let _serial = test_support::serial();
        let noisy_one = || {
            raise_warning("wobbly");
            1
        };
        let (counters, _) = run_checks(false, |t| {
            assert_eq!(check_equal!(t, noisy_one(), 1), CheckOutcome::Errored);
        });
        assert_eq!(counters.errored, 1);
        assert_eq!(counters.passed, 0);
    }

    #[test]
    fn expressions_evaluate_exactly_once() {
        let _serial = test_support::serial();
        let left = Cell::new(0);
        let right = Cell::new(0);
        let (_, _) = run_checks(false, |t| {
            check_equal!(
                t,
                {
                    left.set(left.get() + 1);
                    1
                },
                {
                    right.set(right.get() + 1);
                    1
                }
            );
        });
        assert_eq!(left.get(), 1);
        assert_eq!(right.get(), 1);
    }

    #[test]
    fn bool_check_evaluates_exactly_once() {
        let _serial = test_support::serial();
        let calls = Cell::new(0);
        let (_, _) = run_checks(false, |t| {
            check_true!(t, {
                calls.set(calls.get() + 1);
                true
            });
        });
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn count_checks_classify_without_erroring() {
        let _serial = test_support::serial();
        let raise_two = || {
            raise_error("one");
            raise_error("two");
        };
        let (counters, _) = run_checks(false, |t| {
            assert_eq!(check_n_raised_errors!(t, raise_two(), 2), CheckOutcome::Passed);
            assert_eq!(check_n_raised_errors!(t, raise_two(), 1), CheckOutcome::Failed);
            assert_eq!(check_some_diagnostics!(t, raise_two()), CheckOutcome::Passed);
            assert_eq!(check_no_diagnostics!(t, raise_two()), CheckOutcome::Failed);
            assert_eq!(check_no_diagnostics!(t, 1 + 1), CheckOutcome::Passed);
        });
        assert_eq!(counters.errored, 0);
        assert_eq!(counters.passed, 3);
        assert_eq!(counters.failed, 2);
    }

    #[test]
    fn count_checks_see_only_their_channel() {
        let _serial = test_support::serial();
        let warn = || raise_warning("advisory");
        let (counters, _) = run_checks(false, |t| {
            assert_eq!(check_some_raised_errors!(t, warn()), CheckOutcome::Failed);
            assert_eq!(check_some_raised_warnings!(t, warn()), CheckOutcome::Passed);
            assert_eq!(check_no_print_errors!(t, warn()), CheckOutcome::Passed);
        });
        assert_eq!(counters.passed, 2);
        assert_eq!(counters.failed, 1);
    }

    #[test]
    fn manual_checks_adjust_counters_directly() {
        let _serial = test_support::serial();
        let (counters, buffer) = run_checks(false, |t| {
            assert_eq!(t.pass(), CheckOutcome::Passed);
            assert_eq!(t.pass_with(3, "batch of three"), CheckOutcome::Passed);
            assert_eq!(t.fail_with(2, "known gaps"), CheckOutcome::Failed);
            assert_eq!(t.fail(), CheckOutcome::Failed);
        });
        assert_eq!(counters.passed, 4);
        assert_eq!(counters.failed, 3);
        assert_eq!(counters.errored, 0);
        assert!(buffer.as_text().contains("message: batch of three"));
    }

    #[test]
    fn checks_restore_the_callers_suppression() {
        let _serial = test_support::serial();
        let callers = Suppression {
            print_error: true,
            raised_error: false,
            raised_warning: false,
        };
        let guard = suppress(callers);
        let (_, _) = run_checks(false, |t| {
            check_equal!(t, 1, 1);
            check_some_raised_errors!(t, raise_error("expected"));
        });
        // Restored to what the caller had, not to NONE.
        assert_eq!(suppression(), callers);
        drop(guard);
    }

    #[test]
    fn banner_prints_even_with_details_suppressed() {
        let _serial = test_support::serial();
        let (_, buffer) = run_checks(true, |t| {
            check_equal!(t, 1, 1);
            check_equal!(t, 1, 2);
        });
        let text = buffer.as_text();
        assert!(text.contains("[PASSED] check_equal!(EXPR_A, EXPR_B)"));
        assert!(text.contains("[FAILED] check_equal!(EXPR_A, EXPR_B)"));
        assert!(!text.contains("EXPR_A code:"));
    }

    #[test]
    fn details_include_code_value_and_captured_diagnostics() {
        let _serial = test_support::serial();
        let noisy_true = || {
            raise_error("boom");
            true
        };
        let (_, buffer) = run_checks(false, |t| {
            check_true!(t, noisy_true());
        });
        let text = buffer.as_text();
        assert!(text.contains("EXPR code: noisy_true()"));
        assert!(text.contains("EXPR value: true"));
        assert!(text.contains("diagnostic: boom"));
    }

    #[test]
    fn approx_eq_uses_relative_tolerance_with_floor() {
        assert!(0.3f64.approx_eq(&(0.1 + 0.2)));
        assert!(!1.0f64.approx_eq(&1.1));
        assert!(1_000_000.0f64.approx_eq(&1_000_001.0));
        assert!(0.3f32.approx_eq(&(0.1 + 0.2)));
        assert!(7i64.approx_eq(&7));
        assert!(!"a".approx_eq(&"b"));
    }
}
