//! Provider backed by the `vaulted` command-line tool.

use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use crate::provider::{VaultProvider, VaultVars};
use rapture_common::{Error, Result};

/// Default executable name looked up on `PATH`.
pub const VAULTED_PROGRAM: &str = "vaulted";

/// Runs `vaulted` as a child process.
///
/// `ls` output is captured. `env` inherits the terminal on stdin and stderr
/// because vaulted prompts there for the vault password.
#[derive(Debug, Clone)]
pub struct VaultedCli {
    program: PathBuf,
    search_path: Option<OsString>,
}

impl VaultedCli {
    /// Look up `vaulted` on the process `PATH`.
    pub fn new() -> Self {
        Self {
            program: PathBuf::from(VAULTED_PROGRAM),
            search_path: std::env::var_os("PATH"),
        }
    }

    /// Use a specific executable instead of searching `PATH`.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            search_path: None,
        }
    }

    /// Resolve the executable, if it can be found.
    pub fn locate(&self) -> Option<PathBuf> {
        if self.program.components().count() > 1 {
            return is_executable(&self.program).then(|| self.program.clone());
        }
        let search_path = self.search_path.as_ref()?;
        std::env::split_paths(search_path)
            .map(|dir| dir.join(&self.program))
            .find(|candidate| is_executable(candidate))
    }

    fn command(&self) -> Result<Command> {
        let program = self.locate().ok_or_else(|| {
            Error::Provider(format!("can't find '{}' in your path", self.program.display()))
        })?;
        Ok(Command::new(program))
    }
}

impl Default for VaultedCli {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// Parse `vaulted ls` output: one vault name per line.
fn parse_names(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

/// Parse `vaulted env --format=json` output.
///
/// Accepts either a flat object of strings or one carrying them under
/// `"vars"`.
fn parse_vars(stdout: &[u8]) -> Result<VaultVars> {
    let value: serde_json::Value = serde_json::from_slice(stdout)
        .map_err(|e| Error::Provider(format!("Could not parse vaulted output: {}", e)))?;

    let object = match value.get("vars") {
        Some(vars) => vars.as_object(),
        None => value.as_object(),
    }
    .ok_or_else(|| Error::Provider("Unexpected vaulted output: not an object".to_string()))?;

    object
        .iter()
        .map(|(name, value)| match value.as_str() {
            Some(s) => Ok((name.clone(), s.to_string())),
            None => Err(Error::Provider(format!(
                "Unexpected vaulted output: '{}' is not a string",
                name
            ))),
        })
        .collect()
}

#[async_trait]
impl VaultProvider for VaultedCli {
    fn name(&self) -> &str {
        "vaulted"
    }

    async fn is_available(&self) -> bool {
        self.locate().is_some()
    }

    async fn list_vaults(&self) -> Result<Vec<String>> {
        let output = self
            .command()?
            .arg("ls")
            .stdin(Stdio::null())
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Provider(match stderr.trim() {
                "" => format!("vaulted ls failed: {}", output.status),
                msg => msg.to_string(),
            }));
        }

        let names = parse_names(&String::from_utf8_lossy(&output.stdout));
        debug!(count = names.len(), "Listed vaults");
        Ok(names)
    }

    async fn load_vault(&self, name: &str) -> Result<VaultVars> {
        let output = self
            .command()?
            .args(["env", "--format=json", name])
            .stdin(Stdio::inherit())
            .stderr(Stdio::inherit())
            .stdout(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            return Err(Error::Provider(format!(
                "vaulted could not load '{}': {}",
                name, output.status
            )));
        }

        let vars = parse_vars(&output.stdout)?;
        debug!(vault = name, count = vars.len(), "Loaded vault");
        Ok(vars)
    }
}
