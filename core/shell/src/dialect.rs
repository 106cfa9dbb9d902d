//! Shell dialects and their quoting rules.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use rapture_common::{Error, Result};

/// Shell language to emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// bash, zsh and other POSIX shells.
    #[default]
    Posix,
    /// fish.
    Fish,
}

impl Dialect {
    /// Quote `value` as a single shell word.
    pub fn quote(&self, value: &str) -> String {
        match self {
            // Single quotes can't be escaped inside single quotes: close,
            // emit an escaped quote, reopen.
            Dialect::Posix => format!("'{}'", value.replace('\'', r"'\''")),
            Dialect::Fish => format!("'{}'", value.replace('\\', r"\\").replace('\'', r"\'")),
        }
    }

    /// Render an export statement.
    pub fn export(&self, name: &str, value: &str) -> String {
        match self {
            Dialect::Posix => format!("export {}={}", name, self.quote(value)),
            Dialect::Fish => format!("set -gx {} {}", name, self.quote(value)),
        }
    }

    /// Render an unset statement.
    pub fn unset(&self, name: &str) -> String {
        match self {
            Dialect::Posix => format!("unset {}", name),
            Dialect::Fish => format!("set -e {}", name),
        }
    }

    /// Render a statement printing `message` to stderr.
    pub fn echo_stderr(&self, message: &str) -> String {
        format!("echo {} >&2", self.quote(message))
    }

    /// Wrapper function the user installs in their shell rc file.
    ///
    /// The function runs the real binary with `RAPTURE_WRAPPED` set and
    /// evaluates its stdout in the current shell. The marker value names
    /// the dialect the binary should emit; `1` means POSIX.
    pub fn wrapper(&self, program: &str) -> String {
        match self {
            Dialect::Posix => format!(
                "rapture() {{\n  eval \"$({}=1 command {} \"$@\")\"\n}}\n",
                crate::WRAPPED_ENV_VAR,
                program
            ),
            Dialect::Fish => format!(
                "function rapture\n  {}=fish command {} $argv | source\nend\n",
                crate::WRAPPED_ENV_VAR,
                program
            ),
        }
    }
}

impl FromStr for Dialect {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "bash" | "zsh" | "sh" | "posix" => Ok(Dialect::Posix),
            "fish" => Ok(Dialect::Fish),
            other => Err(Error::InvalidInput(format!("Unsupported shell '{}'", other))),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::Posix => write!(f, "posix"),
            Dialect::Fish => write!(f, "fish"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Undo POSIX quoting for a single word made only of quoted segments.
    fn posix_unquote(word: &str) -> String {
        let mut out = String::new();
        let mut chars = word.chars();
        while let Some(c) = chars.next() {
            match c {
                '\'' => {
                    for q in chars.by_ref() {
                        if q == '\'' {
                            break;
                        }
                        out.push(q);
                    }
                }
                '\\' => {
                    if let Some(next) = chars.next() {
                        out.push(next);
                    }
                }
                other => out.push(other),
            }
        }
        out
    }

    #[test]
    fn test_posix_statements() {
        let d = Dialect::Posix;
        assert_eq!(d.export("A", "it's"), r"export A='it'\''s'");
        assert_eq!(d.unset("A"), "unset A");
        assert_eq!(d.echo_stderr("hi"), "echo 'hi' >&2");
    }

    #[test]
    fn test_fish_statements() {
        let d = Dialect::Fish;
        assert_eq!(d.export("A", r"it's \o/"), r"set -gx A 'it\'s \\o/'");
        assert_eq!(d.unset("A"), "set -e A");
    }

    #[test]
    fn test_parse_dialect() {
        assert_eq!("zsh".parse::<Dialect>().unwrap(), Dialect::Posix);
        assert_eq!("fish".parse::<Dialect>().unwrap(), Dialect::Fish);
        assert!("powershell".parse::<Dialect>().is_err());
    }

    #[test]
    fn test_wrapper_sets_marker() {
        assert!(Dialect::Posix.wrapper("rapture").contains("RAPTURE_WRAPPED=1 command rapture"));
        assert!(Dialect::Fish.wrapper("rapture").contains("RAPTURE_WRAPPED=fish command rapture"));
        assert!(Dialect::Fish.wrapper("rapture").contains("| source"));
    }

    proptest! {
        #[test]
        fn prop_posix_quote_is_one_literal_word(value in any::<String>()) {
            let quoted = Dialect::Posix.quote(&value);
            prop_assert_eq!(posix_unquote(&quoted), value);
        }
    }
}
