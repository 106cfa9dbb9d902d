//! `rapture init`: start a fresh credential session from a vault.
//!
//! One run walks through [`InitStage`] in order. Any stage can fail, which
//! ends the run; nothing is rolled back once credentials have started to be
//! installed.

use std::fmt;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::whoami::IdentityReporter;
use crate::EXIT_FAILURE;
use rapture_common::{Environment, Error, Result, SessionId, VaultError, VaultName};
use rapture_config::{display_path, RaptureConfig};
use rapture_session::names::is_reserved;
use rapture_session::SessionManager;
use rapture_shell::{is_valid_name, ShellSink, WRAPPED_ENV_VAR};
use rapture_vaulted::{VaultProvider, VaultVars};

/// Overrides the configured default vault.
pub const VAULTED_ENV_VAR: &str = "VAULTED_ENV";

/// The only init method currently supported.
pub const VAULTED_INIT_METHOD: &str = "vaulted";

/// Steps of one init run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitStage {
    CheckPreconditions,
    ResolveVault,
    ValidateVault,
    FetchCredentials,
    ClearStaleSession,
    InstallCredentials,
    PersistSession,
    Done,
}

impl fmt::Display for InitStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InitStage::CheckPreconditions => "check-preconditions",
            InitStage::ResolveVault => "resolve-vault",
            InitStage::ValidateVault => "validate-vault",
            InitStage::FetchCredentials => "fetch-credentials",
            InitStage::ClearStaleSession => "clear-stale-session",
            InitStage::InstallCredentials => "install-credentials",
            InitStage::PersistSession => "persist-session",
            InitStage::Done => "done",
        };
        f.write_str(name)
    }
}

/// Result of a successful init.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitOutcome {
    /// Vault the credentials came from.
    pub vault: VaultName,
    /// Session now current in the shell.
    pub session_id: SessionId,
    /// Whether the session was constructed by this run.
    pub new_session: bool,
    /// Whether the session record was persisted.
    pub saved: bool,
    /// Names of the installed variables.
    pub installed: Vec<String>,
}

/// Pick the vault name: explicit argument, then `VAULTED_ENV`, then the
/// configured default.
pub fn resolve_vault_name(
    arg: Option<&str>,
    env: &dyn Environment,
    config: &RaptureConfig,
) -> String {
    if let Some(name) = arg {
        return name.to_string();
    }
    env.get(VAULTED_ENV_VAR)
        .unwrap_or_else(|| config.default_vault.clone())
}

/// Check `name` against the provider's vaults.
///
/// `explicit` tells whether the name came from the command line; it decides
/// which error is reported when the name is unknown.
pub fn validate_vault(
    name: &str,
    explicit: bool,
    names: &[String],
    config_file: &Path,
) -> Result<VaultName> {
    if names.iter().any(|n| n == name) {
        return VaultName::new(name);
    }

    let err = match (explicit, names.is_empty()) {
        (true, _) => VaultError::NoSuchVault(name.to_string()),
        (false, false) => VaultError::NoDefaultVault {
            config_file: display_path(config_file),
        },
        (false, true) => VaultError::NoVaultsAvailable,
    };
    Err(err.into())
}

/// Reject variables that can't be exported or that collide with names
/// owned by the session.
fn check_vars(vault: &VaultName, vars: &VaultVars) -> Result<()> {
    for name in vars.keys() {
        if !is_valid_name(name) || is_reserved(name) {
            return Err(Error::Provider(format!(
                "Vault '{}' defines unusable variable '{}'",
                vault, name
            )));
        }
    }
    Ok(())
}

/// Runs `rapture init`.
pub struct Initializer {
    config: RaptureConfig,
    config_file: PathBuf,
    provider: Arc<dyn VaultProvider>,
    sessions: SessionManager,
    progress: Box<dyn Write + Send>,
}

impl Initializer {
    /// Create an initializer.
    ///
    /// `config_file` is only used to point the user at the file in error
    /// messages. Progress lines go to stderr.
    pub fn new(
        config: RaptureConfig,
        config_file: impl Into<PathBuf>,
        provider: Arc<dyn VaultProvider>,
        sessions: SessionManager,
    ) -> Self {
        Self {
            config,
            config_file: config_file.into(),
            provider,
            sessions,
            progress: Box::new(io::stderr()),
        }
    }

    /// Send progress lines somewhere other than stderr.
    ///
    /// Progress is written immediately rather than through the shell sink,
    /// because the provider may prompt on the terminal in between.
    pub fn with_progress(mut self, progress: Box<dyn Write + Send>) -> Self {
        self.progress = progress;
        self
    }

    /// Run init and map the result to an exit status.
    ///
    /// Errors are echoed through the shell sink. On success the identity
    /// reporter runs and its status is returned.
    pub async fn run(
        &mut self,
        vault_arg: Option<&str>,
        env: &mut dyn Environment,
        shell: &mut dyn ShellSink,
        reporter: &dyn IdentityReporter,
    ) -> i32 {
        match self.init(vault_arg, env, shell).await {
            Ok(outcome) => {
                if !self.config.quiet {
                    shell.echo(&format!("Initialized vault '{}'", outcome.vault));
                }
                reporter.report(&*env, shell)
            }
            Err(e) => {
                shell.err_echo(&format!("ERROR: {}", e));
                EXIT_FAILURE
            }
        }
    }

    /// Run every init stage.
    pub async fn init(
        &mut self,
        vault_arg: Option<&str>,
        env: &mut dyn Environment,
        shell: &mut dyn ShellSink,
    ) -> Result<InitOutcome> {
        let mut stage = InitStage::CheckPreconditions;
        let result = self.drive(&mut stage, vault_arg, env, shell).await;
        match &result {
            Ok(outcome) => {
                info!(vault = %outcome.vault, session = %outcome.session_id, "Init complete")
            }
            Err(e) => debug!(%stage, error = %e, "Init failed"),
        }
        result
    }

    async fn drive(
        &mut self,
        stage: &mut InitStage,
        vault_arg: Option<&str>,
        env: &mut dyn Environment,
        shell: &mut dyn ShellSink,
    ) -> Result<InitOutcome> {
        *stage = InitStage::CheckPreconditions;
        if !env.contains(WRAPPED_ENV_VAR) {
            return Err(Error::Precondition(
                "rapture init must run through the rapture shell function. See 'rapture shell-init'."
                    .to_string(),
            ));
        }
        if self.config.init_method != VAULTED_INIT_METHOD {
            return Err(Error::Precondition(format!(
                "Unsupported init method '{}'",
                self.config.init_method
            )));
        }
        if !self.provider.is_available().await {
            return Err(Error::Provider(format!(
                "can't find '{}' in your path",
                self.provider.name()
            )));
        }

        *stage = InitStage::ResolveVault;
        let requested = resolve_vault_name(vault_arg, &*env, &self.config);
        debug!(%stage, vault = %requested, explicit = vault_arg.is_some());

        *stage = InitStage::ValidateVault;
        let names = self
            .provider
            .list_vaults()
            .await
            .map_err(|e| Error::Provider(format!("Could not load list of vaults: {}", e)))?;
        let vault = validate_vault(&requested, vault_arg.is_some(), &names, &self.config_file)?;

        *stage = InitStage::FetchCredentials;
        if !self.config.quiet {
            let _ = writeln!(self.progress, "Initializing vaulted env '{}':", vault);
        }
        let vars = self.provider.load_vault(vault.as_str()).await?;
        check_vars(&vault, &vars)?;

        // From here on the shell and process are modified.
        *stage = InitStage::ClearStaleSession;
        self.sessions.supersede(env, shell).await;

        *stage = InitStage::InstallCredentials;
        for (name, value) in &vars {
            shell.export(name, value);
            env.set(name, value);
        }
        debug!(%stage, count = vars.len(), "Installed credentials");

        *stage = InitStage::PersistSession;
        let (session, new_session) = self.sessions.current_session(&*env).await?;
        if new_session {
            debug!("Started a new session");
        } else {
            warn!(
                session = %session.id(),
                "Using an existing session, that is probably wrong for init"
            );
        }
        session.clear_assumed_role();
        session.replace_vars(&vars);
        let session_id = session.id();

        let saved = match self.sessions.save(env, shell).await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Session was not persisted");
                shell.err_echo(&format!("ERROR: Failed to save session: {}", e));
                false
            }
        };

        *stage = InitStage::Done;
        Ok(InitOutcome {
            vault,
            session_id,
            new_session,
            saved,
            installed: vars.keys().cloned().collect(),
        })
    }
}
