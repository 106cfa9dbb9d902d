//! Sink used when no wrapper is evaluating our output.

use std::io::{self, Write};
use tracing::warn;

use crate::ShellSink;

/// Prints messages straight to the terminal.
///
/// Exports and unsets can't reach the parent shell without the wrapper, so
/// they are dropped with a warning.
pub struct TerminalSink {
    out: Box<dyn Write + Send>,
    err: Box<dyn Write + Send>,
}

impl TerminalSink {
    /// Write to the process stdout and stderr.
    pub fn stdio() -> Self {
        Self::new(Box::new(io::stdout()), Box::new(io::stderr()))
    }

    /// Write to the given streams.
    pub fn new(out: Box<dyn Write + Send>, err: Box<dyn Write + Send>) -> Self {
        Self { out, err }
    }
}

impl ShellSink for TerminalSink {
    fn export(&mut self, name: &str, _value: &str) {
        warn!(name, "Not running under the shell wrapper, export dropped");
    }

    fn unset(&mut self, name: &str) {
        warn!(name, "Not running under the shell wrapper, unset dropped");
    }

    fn echo(&mut self, message: &str) {
        let _ = writeln!(self.out, "{}", message);
    }

    fn err_echo(&mut self, message: &str) {
        let _ = writeln!(self.err, "{}", message);
    }
}
