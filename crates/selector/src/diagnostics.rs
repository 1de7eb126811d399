//! Caller-supplied sinks for query tracing.
//!
//! The engine never reaches for a global logger. Each query receives a
//! `&dyn DiagnosticSink`; [`NoopSink`] is used when the caller does not care.
use std::cell::RefCell;
use std::fmt;

pub trait DiagnosticSink {
    /// Lets callers skip formatting work when nobody is listening.
    fn enabled(&self) -> bool {
        true
    }

    fn emit(&self, args: fmt::Arguments<'_>);
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl DiagnosticSink for NoopSink {
    fn enabled(&self) -> bool {
        false
    }

    fn emit(&self, _args: fmt::Arguments<'_>) {}
}

/// Forwards diagnostics to the `log` facade at `debug` level under the
/// `jsonselect` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn enabled(&self) -> bool {
        log::log_enabled!(target: "jsonselect", log::Level::Debug)
    }

    fn emit(&self, args: fmt::Arguments<'_>) {
        log::debug!(target: "jsonselect", "{}", args);
    }
}

/// Collects diagnostics in memory. Mostly useful in tests.
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: RefCell<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.borrow().clone()
    }
}

impl DiagnosticSink for MemorySink {
    fn emit(&self, args: fmt::Arguments<'_>) {
        self.lines.borrow_mut().push(args.to_string());
    }
}

/// Formats and emits a diagnostic only when the sink is listening.
macro_rules! diag {
    ($sink:expr, $($arg:tt)+) => {{
        let sink: &dyn $crate::diagnostics::DiagnosticSink = $sink;
        if sink.enabled() {
            sink.emit(format_args!($($arg)+));
        }
    }};
}
pub(crate) use diag;
