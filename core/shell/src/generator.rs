//! Shell code generator.

use std::collections::{BTreeMap, BTreeSet};
use std::io::{self, Write};
use tracing::warn;

use crate::dialect::Dialect;
use crate::{is_valid_name, ShellSink};

/// One effect on the parent shell, in emission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellEffect {
    Export { name: String, value: String },
    Unset { name: String },
    Echo(String),
    ErrEcho(String),
}

/// Collects effects and renders them as a script for the wrapper to eval.
#[derive(Debug, Default)]
pub struct ShellGenerator {
    dialect: Dialect,
    effects: Vec<ShellEffect>,
}

impl ShellGenerator {
    /// Create an empty generator for `dialect`.
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            effects: Vec::new(),
        }
    }

    /// Effects recorded so far.
    pub fn effects(&self) -> &[ShellEffect] {
        &self.effects
    }

    /// Variables the parent shell will have exported after evaluating the
    /// script, considering only names this script touches. Unset names are
    /// absent.
    pub fn exports(&self) -> BTreeMap<String, String> {
        let mut state = BTreeMap::new();
        for effect in &self.effects {
            match effect {
                ShellEffect::Export { name, value } => {
                    state.insert(name.clone(), value.clone());
                }
                ShellEffect::Unset { name } => {
                    state.remove(name);
                }
                _ => {}
            }
        }
        state
    }

    /// Names unset by the script and not exported again afterwards, sorted
    /// and without duplicates.
    pub fn unsets(&self) -> Vec<String> {
        let exported = self.exports();
        let names: BTreeSet<&String> = self
            .effects
            .iter()
            .filter_map(|e| match e {
                ShellEffect::Unset { name } if !exported.contains_key(name) => Some(name),
                _ => None,
            })
            .collect();
        names.into_iter().cloned().collect()
    }

    /// Render the script.
    pub fn script(&self) -> String {
        let mut out = String::new();
        for effect in &self.effects {
            let line = match effect {
                ShellEffect::Export { name, value } => self.dialect.export(name, value),
                ShellEffect::Unset { name } => self.dialect.unset(name),
                ShellEffect::Echo(msg) | ShellEffect::ErrEcho(msg) => {
                    self.dialect.echo_stderr(msg)
                }
            };
            out.push_str(&line);
            out.push('\n');
        }
        out
    }

    /// Write the script to `out`.
    pub fn write_to(&self, mut out: impl Write) -> io::Result<()> {
        out.write_all(self.script().as_bytes())?;
        out.flush()
    }
}

impl ShellSink for ShellGenerator {
    fn export(&mut self, name: &str, value: &str) {
        if !is_valid_name(name) {
            warn!(name, "Refusing to export invalid variable name");
            return;
        }
        self.effects.push(ShellEffect::Export {
            name: name.to_string(),
            value: value.to_string(),
        });
    }

    fn unset(&mut self, name: &str) {
        if !is_valid_name(name) {
            warn!(name, "Refusing to unset invalid variable name");
            return;
        }
        self.effects.push(ShellEffect::Unset {
            name: name.to_string(),
        });
    }

    fn echo(&mut self, message: &str) {
        self.effects.push(ShellEffect::Echo(message.to_string()));
    }

    fn err_echo(&mut self, message: &str) {
        self.effects.push(ShellEffect::ErrEcho(message.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_rendering() {
        let mut shell = ShellGenerator::new(Dialect::Posix);
        shell.unset("RAPTURE_ASSUMED_ROLE_ARN");
        shell.export("AWS_ACCESS_KEY_ID", "AKIA");
        shell.err_echo("ERROR: it's broken");

        assert_eq!(
            shell.script(),
            "unset RAPTURE_ASSUMED_ROLE_ARN\nexport AWS_ACCESS_KEY_ID='AKIA'\necho 'ERROR: it'\\''s broken' >&2\n"
        );
    }

    #[test]
    fn test_net_exports_and_unsets() {
        let mut shell = ShellGenerator::default();
        shell.export("A", "1");
        shell.unset("A");
        shell.unset("B");
        shell.unset("C");
        shell.export("C", "3");

        assert_eq!(
            shell.exports().into_iter().collect::<Vec<_>>(),
            vec![("C".to_string(), "3".to_string())]
        );
        assert_eq!(shell.unsets(), vec!["A", "B"]);
    }

    #[test]
    fn test_unsets_listed_once() {
        let mut shell = ShellGenerator::default();
        shell.unset("B");
        shell.unset("A");
        shell.export("X", "1");
        shell.unset("B");

        assert_eq!(shell.unsets(), vec!["A", "B"]);
    }

    #[test]
    fn test_invalid_names_dropped() {
        let mut shell = ShellGenerator::default();
        shell.export("BAD;rm -rf", "x");
        shell.unset("1BAD");
        assert!(shell.effects().is_empty());
    }

    #[test]
    fn test_write_to() {
        let mut shell = ShellGenerator::new(Dialect::Fish);
        shell.export("X", "y");
        let mut buf = Vec::new();
        shell.write_to(&mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "set -gx X 'y'\n");
    }
}
