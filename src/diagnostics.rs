//! Process-wide diagnostic log with per-channel suppression.
//!
//! Code under test reports problems through three channels: printed errors,
//! raised errors, and raised warnings. Every emission is recorded in one
//! append-only log regardless of suppression; suppression only decides whether
//! the message also reaches the external sink. The check evaluator in
//! [`crate::check`] reads count deltas across this log to decide whether an
//! expression misbehaved while it was being evaluated.
//!
//! The log is process-wide mutable state. The framework runs checks strictly
//! in sequence and relies on that: a count delta is only attributable to one
//! expression because nothing else can emit in between. Suppression changes
//! follow a save-and-restore discipline enforced by [`SuppressionGuard`].

use std::io::Write;
use std::sync::{Arc, Mutex, MutexGuard};

use lazy_static::lazy_static;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

// ============================================================================
// CHANNELS AND SCOPES
// ============================================================================

/// The three diagnostic channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// Error text printed directly, stderr-style.
    PrintError,
    /// An error raised through the reporting API.
    RaisedError,
    /// A warning raised through the reporting API.
    RaisedWarning,
}

impl Channel {
    /// Severity prefix used by the console sink.
    fn severity(self) -> &'static str {
        match self {
            Channel::PrintError | Channel::RaisedError => "error",
            Channel::RaisedWarning => "warning",
        }
    }
}

/// Selects either one channel or the whole log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    All,
    Channel(Channel),
}

// ============================================================================
// SUPPRESSION
// ============================================================================

/// Per-channel suppression flags, saved and restored as a unit.
///
/// A suppressed channel still records its messages; it only stops forwarding
/// them to the sink.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Suppression {
    pub print_error: bool,
    pub raised_error: bool,
    pub raised_warning: bool,
}

impl Suppression {
    pub const NONE: Suppression = Suppression {
        print_error: false,
        raised_error: false,
        raised_warning: false,
    };

    pub const ALL: Suppression = Suppression {
        print_error: true,
        raised_error: true,
        raised_warning: true,
    };

    pub fn is_suppressed(&self, channel: Channel) -> bool {
        match channel {
            Channel::PrintError => self.print_error,
            Channel::RaisedError => self.raised_error,
            Channel::RaisedWarning => self.raised_warning,
        }
    }

    fn set(&mut self, channel: Channel, on: bool) {
        match channel {
            Channel::PrintError => self.print_error = on,
            Channel::RaisedError => self.raised_error = on,
            Channel::RaisedWarning => self.raised_warning = on,
        }
    }
}

/// Restores the suppression flags it saved when dropped.
///
/// Guards nest: each one restores exactly the flags that were current when it
/// was created, so an inner guard ending leaves the outer guard's flags in
/// force rather than "unsuppressed".
#[must_use = "dropping the guard immediately restores the previous suppression"]
pub struct SuppressionGuard {
    previous: Suppression,
}

impl Drop for SuppressionGuard {
    fn drop(&mut self) {
        log().suppress = self.previous;
    }
}

/// Replace the suppression flags wholesale, restoring the prior flags on drop.
pub fn suppress(flags: Suppression) -> SuppressionGuard {
    let mut log = log();
    let previous = log.suppress;
    log.suppress = flags;
    SuppressionGuard { previous }
}

/// Suppress all three channels until the guard drops.
pub fn suppress_all() -> SuppressionGuard {
    suppress(Suppression::ALL)
}

/// Suppress one channel, leaving the other flags as found.
pub fn suppress_channel(channel: Channel) -> SuppressionGuard {
    let mut log = log();
    let previous = log.suppress;
    let mut flags = previous;
    flags.set(channel, true);
    log.suppress = flags;
    SuppressionGuard { previous }
}

/// Suppress whatever `scope` covers: one channel, or all three.
pub fn suppress_scope(scope: Scope) -> SuppressionGuard {
    match scope {
        Scope::All => suppress_all(),
        Scope::Channel(channel) => suppress_channel(channel),
    }
}

// ============================================================================
// SINKS
// ============================================================================

/// Receives diagnostics that were not suppressed.
///
/// The sink runs while the log's lock is held; a sink that emits back into
/// the log would deadlock.
pub trait DiagnosticSink: Send {
    fn forward(&mut self, channel: Channel, message: &str);
}

/// Writes diagnostics to stderr with a colored severity prefix.
pub struct ConsoleDiagnosticSink {
    stream: StandardStream,
}

impl ConsoleDiagnosticSink {
    pub fn stderr() -> Self {
        let choice = if atty::is(atty::Stream::Stderr) {
            ColorChoice::Auto
        } else {
            ColorChoice::Never
        };
        Self {
            stream: StandardStream::stderr(choice),
        }
    }
}

impl DiagnosticSink for ConsoleDiagnosticSink {
    fn forward(&mut self, channel: Channel, message: &str) {
        let color = match channel {
            Channel::RaisedWarning => Color::Yellow,
            _ => Color::Red,
        };
        let _ = self
            .stream
            .set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true));
        let _ = write!(self.stream, "{}:", channel.severity());
        let _ = self.stream.reset();
        let _ = writeln!(self.stream, " {message}");
    }
}

/// A cloneable handle that records every forwarded diagnostic.
///
/// Install with [`replace_sink`]; all clones observe the same record.
#[derive(Clone, Default)]
pub struct CapturedDiagnostics {
    forwarded: Arc<Mutex<Vec<(Channel, String)>>>,
}

impl CapturedDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink recording into this handle.
    pub fn sink(&self) -> Box<dyn DiagnosticSink> {
        Box::new(CaptureSink {
            forwarded: Arc::clone(&self.forwarded),
        })
    }

    /// Everything forwarded so far, clearing the record.
    pub fn take(&self) -> Vec<(Channel, String)> {
        std::mem::take(&mut *lock_captured(&self.forwarded))
    }

    pub fn len(&self) -> usize {
        lock_captured(&self.forwarded).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

struct CaptureSink {
    forwarded: Arc<Mutex<Vec<(Channel, String)>>>,
}

impl DiagnosticSink for CaptureSink {
    fn forward(&mut self, channel: Channel, message: &str) {
        lock_captured(&self.forwarded).push((channel, message.to_string()));
    }
}

fn lock_captured(
    forwarded: &Arc<Mutex<Vec<(Channel, String)>>>,
) -> MutexGuard<'_, Vec<(Channel, String)>> {
    forwarded.lock().unwrap_or_else(|poison| poison.into_inner())
}

// ============================================================================
// THE LOG
// ============================================================================

struct DiagnosticLog {
    messages: Vec<String>,
    print_error_indexes: Vec<usize>,
    raised_error_indexes: Vec<usize>,
    raised_warning_indexes: Vec<usize>,
    suppress: Suppression,
    sink: Box<dyn DiagnosticSink>,
}

impl DiagnosticLog {
    fn new() -> Self {
        Self {
            messages: Vec::new(),
            print_error_indexes: Vec::new(),
            raised_error_indexes: Vec::new(),
            raised_warning_indexes: Vec::new(),
            suppress: Suppression::NONE,
            sink: Box::new(ConsoleDiagnosticSink::stderr()),
        }
    }

    fn indexes(&self, channel: Channel) -> &[usize] {
        match channel {
            Channel::PrintError => &self.print_error_indexes,
            Channel::RaisedError => &self.raised_error_indexes,
            Channel::RaisedWarning => &self.raised_warning_indexes,
        }
    }

    fn indexes_mut(&mut self, channel: Channel) -> &mut Vec<usize> {
        match channel {
            Channel::PrintError => &mut self.print_error_indexes,
            Channel::RaisedError => &mut self.raised_error_indexes,
            Channel::RaisedWarning => &mut self.raised_warning_indexes,
        }
    }

    fn record(&mut self, channel: Channel, message: String) {
        let index = self.messages.len();
        self.indexes_mut(channel).push(index);
        self.messages.push(message);
        if !self.suppress.is_suppressed(channel) {
            self.sink.forward(channel, &self.messages[index]);
        }
    }

    fn count_in(&self, scope: Scope) -> usize {
        match scope {
            Scope::All => self.messages.len(),
            Scope::Channel(channel) => self.indexes(channel).len(),
        }
    }

    fn last_n(&self, scope: Scope, n: usize) -> Vec<String> {
        match scope {
            Scope::All => tail(&self.messages, n).to_vec(),
            Scope::Channel(channel) => tail(self.indexes(channel), n)
                .iter()
                .map(|&index| self.messages[index].clone())
                .collect(),
        }
    }
}

/// Up to the last `n` items; fewer exist means all of them.
fn tail<T>(items: &[T], n: usize) -> &[T] {
    &items[items.len().saturating_sub(n)..]
}

lazy_static! {
    static ref LOG: Mutex<DiagnosticLog> = Mutex::new(DiagnosticLog::new());
}

// A panicking test body must not wedge the log for the rest of the run.
fn log() -> MutexGuard<'static, DiagnosticLog> {
    LOG.lock().unwrap_or_else(|poison| poison.into_inner())
}

// ============================================================================
// PUBLIC SURFACE
// ============================================================================

/// Record `message` on `channel`, forwarding to the sink unless suppressed.
pub fn emit(channel: Channel, message: impl Into<String>) {
    log().record(channel, message.into());
}

/// Emit on the printed-error channel.
pub fn print_error(message: impl Into<String>) {
    emit(Channel::PrintError, message);
}

/// Emit on the raised-error channel.
pub fn raise_error(message: impl Into<String>) {
    emit(Channel::RaisedError, message);
}

/// Emit on the raised-warning channel.
pub fn raise_warning(message: impl Into<String>) {
    emit(Channel::RaisedWarning, message);
}

/// Total number of messages recorded across all channels.
pub fn total_count() -> usize {
    log().messages.len()
}

/// Number of messages recorded on one channel.
pub fn count_of(channel: Channel) -> usize {
    log().indexes(channel).len()
}

/// Number of messages recorded in `scope`.
pub fn count_in(scope: Scope) -> usize {
    log().count_in(scope)
}

/// The last `n` messages in `scope`, in emission order. Fewer than `n`
/// recorded means all of them; never an error.
pub fn last_n(scope: Scope, n: usize) -> Vec<String> {
    log().last_n(scope, n)
}

/// Current suppression flags.
pub fn suppression() -> Suppression {
    log().suppress
}

/// Overwrite the suppression flags as a unit.
pub fn set_suppression(flags: Suppression) {
    log().suppress = flags;
}

/// Install a sink, returning the previous one so callers can restore it.
pub fn replace_sink(sink: Box<dyn DiagnosticSink>) -> Box<dyn DiagnosticSink> {
    std::mem::replace(&mut log().sink, sink)
}

// ============================================================================
// EMISSION MACROS
// ============================================================================

/// Emit a formatted message on the printed-error channel.
#[macro_export]
macro_rules! print_error {
    ($($arg:tt)*) => {
        $crate::diagnostics::print_error(format!($($arg)*))
    };
}

/// Emit a formatted message on the raised-error channel.
#[macro_export]
macro_rules! raise_error {
    ($($arg:tt)*) => {
        $crate::diagnostics::raise_error(format!($($arg)*))
    };
}

/// Emit a formatted message on the raised-warning channel.
#[macro_export]
macro_rules! raise_warning {
    ($($arg:tt)*) => {
        $crate::diagnostics::raise_warning(format!($($arg)*))
    };
}

// ============================================================================
// TEST SUPPORT
// ============================================================================

// The log is process-wide and cargo runs tests on multiple threads; any test
// that reads counts or installs a sink must hold this lock for its duration.
#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::{Mutex, MutexGuard};

    static SERIAL: Mutex<()> = Mutex::new(());

    pub fn serial() -> MutexGuard<'static, ()> {
        SERIAL.lock().unwrap_or_else(|poison| poison.into_inner())
    }
}
