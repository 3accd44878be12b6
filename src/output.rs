//! Console reporting for check banners and run summaries.
//!
//! This module owns the report stream: where per-check banners, detail lines,
//! and case/suite summaries are written. It is separate from the diagnostic
//! log in [`crate::diagnostics`]: report output is the framework talking about
//! the run, diagnostics are the code under test talking about itself.

use std::cell::RefCell;
use std::rc::Rc;

use once_cell::sync::Lazy;

// ============================================================================
// OUTPUT SINKS: StdoutSink and OutputBuffer implementations
// ============================================================================

/// Receives report lines from a [`Reporter`].
pub trait OutputSink {
    fn emit(&mut self, text: &str);
}

/// Writes report lines to stdout.
pub struct StdoutSink;

impl OutputSink for StdoutSink {
    fn emit(&mut self, text: &str) {
        println!("{text}");
    }
}

/// Collects report lines into a shared buffer for tests or programmatic
/// capture. Cloning shares the underlying buffer.
#[derive(Clone, Default)]
pub struct OutputBuffer {
    lines: Rc<RefCell<Vec<String>>>,
}

impl OutputBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// All captured lines joined with newlines.
    pub fn as_text(&self) -> String {
        self.lines.borrow().join("\n")
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.borrow().clone()
    }

    pub fn clear(&self) {
        self.lines.borrow_mut().clear();
    }
}

impl OutputSink for OutputBuffer {
    fn emit(&mut self, text: &str) {
        self.lines.borrow_mut().push(text.to_string());
    }
}

// ============================================================================
// ANSI COLOR CONSTANTS
// ============================================================================

// Bold variants throughout; banners are meant to stand out from the detail
// lines around them.
pub(crate) const RESET: &str = "\x1b[0m";
pub(crate) const GREEN: &str = "\x1b[1;32m";
pub(crate) const RED: &str = "\x1b[1;31m";
pub(crate) const MAGENTA: &str = "\x1b[1;35m";
pub(crate) const YELLOW: &str = "\x1b[1;33m";
pub(crate) const BLUE: &str = "\x1b[1;34m";

static SUITE_RULE: Lazy<String> = Lazy::new(|| "=".repeat(80));
static CASE_RULE: Lazy<String> = Lazy::new(|| "-".repeat(80));

// ============================================================================
// REPORTER
// ============================================================================

/// A colorizing line writer over an [`OutputSink`].
pub struct Reporter {
    colors: bool,
    sink: Box<dyn OutputSink>,
}

impl Reporter {
    /// Reporter over stdout, with colors when stdout is a terminal.
    pub fn stdout() -> Self {
        Self {
            colors: atty::is(atty::Stream::Stdout),
            sink: Box::new(StdoutSink),
        }
    }

    /// Reporter over a shared capture buffer, colors off.
    pub fn buffered(buffer: OutputBuffer) -> Self {
        Self {
            colors: false,
            sink: Box::new(buffer),
        }
    }

    pub fn with_sink(sink: Box<dyn OutputSink>, colors: bool) -> Self {
        Self { colors, sink }
    }

    pub fn line(&mut self, text: &str) {
        self.sink.emit(text);
    }

    pub fn blank(&mut self) {
        self.sink.emit("");
    }

    /// The `-` rule that frames a test case.
    pub fn case_rule(&mut self) {
        let rule = CASE_RULE.clone();
        self.sink.emit(&rule);
    }

    /// The `=` rule that frames a test suite.
    pub fn suite_rule(&mut self) {
        let rule = SUITE_RULE.clone();
        self.sink.emit(&rule);
    }

    /// Apply color formatting to text if colors are enabled.
    pub fn colorize(&self, text: &str, color: &str) -> String {
        if self.colors {
            format!("{color}{text}{RESET}")
        } else {
            text.to_string()
        }
    }
}
