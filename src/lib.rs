//! Verita: a self-contained check-based test framework with diagnostic
//! interception.
//!
//! Checks classify themselves as Passed, Failed, or Errored based on whether
//! evaluating the checked expression triggered unexpected diagnostics; test
//! cases aggregate check outcomes, and test suites aggregate case verdicts.
//! See [`check`] for the evaluation protocol and [`diagnostics`] for the
//! interception log.

pub use crate::case::TestCase;
pub use crate::check::{
    ApproxEq, CheckContext, CheckCounters, CheckOutcome, CountExpectation, Verdict,
};
pub use crate::diagnostics::{
    CapturedDiagnostics, Channel, ConsoleDiagnosticSink, DiagnosticSink, Scope, Suppression,
    SuppressionGuard,
};
pub use crate::output::{OutputBuffer, OutputSink, Reporter, StdoutSink};
pub use crate::suite::{SuiteFailure, SuiteSummary, TestSuite};

pub mod case;
pub mod check;
pub mod diagnostics;
pub mod output;
pub mod suite;
