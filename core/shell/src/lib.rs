//! Shell integration for Rapture.
//!
//! Rapture runs as a child of the user's shell and can't change its parent's
//! environment directly. Instead a wrapper function evaluates whatever the
//! command prints on stdout. A [`ShellSink`] collects the effects a command
//! wants to have on the parent shell: exports, unsets and messages.
//!
//! Messages are rendered as `echo` commands writing to stderr so they reach
//! the terminal even though stdout is captured.

pub mod dialect;
pub mod generator;
pub mod terminal;

pub use dialect::Dialect;
pub use generator::{ShellEffect, ShellGenerator};
pub use terminal::TerminalSink;

use rapture_common::Environment;

/// Environment variable set by the wrapper function when it evaluates our
/// output.
pub const WRAPPED_ENV_VAR: &str = "RAPTURE_WRAPPED";

/// Receiver of a command's effects on the parent shell.
pub trait ShellSink {
    /// Export `name=value` in the parent shell.
    fn export(&mut self, name: &str, value: &str);

    /// Remove `name` from the parent shell.
    fn unset(&mut self, name: &str);

    /// Show an informational message.
    fn echo(&mut self, message: &str);

    /// Show an error message.
    fn err_echo(&mut self, message: &str);
}

/// Whether `name` can be used as a shell variable name.
pub fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}

/// Dialect requested by the wrapper, or `None` when not wrapped.
///
/// Unknown marker values fall back to POSIX.
pub fn wrapped_dialect(env: &dyn Environment) -> Option<Dialect> {
    env.get(WRAPPED_ENV_VAR)
        .map(|marker| marker.parse().unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_names() {
        assert!(is_valid_name("AWS_ACCESS_KEY_ID"));
        assert!(is_valid_name("_private"));
        assert!(is_valid_name("x1"));
        assert!(!is_valid_name(""));
        assert!(!is_valid_name("1x"));
        assert!(!is_valid_name("A-B"));
        assert!(!is_valid_name("A B"));
        assert!(!is_valid_name("$(rm)"));
    }

    #[test]
    fn test_wrapped_dialect() {
        use rapture_common::MemoryEnv;

        assert_eq!(wrapped_dialect(&MemoryEnv::new()), None);
        let posix = MemoryEnv::new().with(WRAPPED_ENV_VAR, "1");
        assert_eq!(wrapped_dialect(&posix), Some(Dialect::Posix));
        let fish = MemoryEnv::new().with(WRAPPED_ENV_VAR, "fish");
        assert_eq!(wrapped_dialect(&fish), Some(Dialect::Fish));
    }
}
