//! Session lifecycle: lookup, supersession and persistence.

use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::names::{
    ASSUMED_ROLE_VARS, IDENTITY_VARS, SESSION_ID_VAR, SESSION_KEY_VAR, SESSION_SALT_VAR,
    SESSION_VARS_VAR,
};
use crate::session::Session;
use rapture_common::{Environment, Error, Result, SessionId};
use rapture_crypto::{KdfParams, Salt, SessionKey};
use rapture_shell::{is_valid_name, ShellSink};
use rapture_storage::{StoragePath, StorageProvider};

/// Directory holding session records inside the storage provider.
pub const SESSIONS_DIRNAME: &str = "sessions";

/// Owns the current session of this process.
///
/// The session is found through the identity variables in the environment
/// and cached after the first lookup, so repeated calls return the same
/// session.
pub struct SessionManager {
    store: Arc<dyn StorageProvider>,
    kdf_params: KdfParams,
    current: Option<Session>,
}

impl SessionManager {
    /// Create a manager persisting records through `store`.
    pub fn new(store: Arc<dyn StorageProvider>) -> Self {
        Self {
            store,
            kdf_params: KdfParams::session(),
            current: None,
        }
    }

    fn record_path(id: SessionId) -> Result<StoragePath> {
        StoragePath::parse(SESSIONS_DIRNAME)?.join(&format!("{}.json", id))
    }

    /// Read the identity triple from the environment.
    ///
    /// Returns `None` unless all three variables are set.
    fn identity_from_env(env: &dyn Environment) -> Result<Option<(SessionId, SessionKey, Salt)>> {
        let (Some(id), Some(key), Some(salt)) = (
            env.get(SESSION_ID_VAR),
            env.get(SESSION_KEY_VAR),
            env.get(SESSION_SALT_VAR),
        ) else {
            if IDENTITY_VARS.iter().any(|name| env.contains(name)) {
                debug!("Ignoring incomplete session identity in environment");
            }
            return Ok(None);
        };

        Ok(Some((
            SessionId::parse(&id)?,
            SessionKey::from_base64(&key)?,
            Salt::from_base64(&salt)?,
        )))
    }

    /// Load the session named by the environment, if any.
    ///
    /// # Errors
    /// - Identity variables are malformed
    /// - The record is missing or can't be opened with the exported key
    pub async fn load(&self, env: &dyn Environment) -> Result<Option<Session>> {
        let Some((id, key, salt)) = Self::identity_from_env(env)? else {
            return Ok(None);
        };

        let path = Self::record_path(id)?;
        let bytes = match self.store.get(&path).await {
            Ok(bytes) => bytes,
            Err(Error::NotFound(_)) => {
                return Err(Error::Session(format!("No stored session {}", id)));
            }
            Err(e) => return Err(e),
        };

        let session = Session::open(&bytes, id, key, salt)?;
        debug!(session = %id, vars = session.vars().len(), "Loaded session");
        Ok(Some(session))
    }

    /// Return the current session, creating a fresh one if none exists.
    ///
    /// The flag is `true` when the session was constructed by this call and
    /// `false` when an existing one was reused.
    ///
    /// # Errors
    /// - The environment names a session that can't be loaded
    pub async fn current_session(&mut self, env: &dyn Environment) -> Result<(&mut Session, bool)> {
        let is_new = if self.current.is_some() {
            false
        } else {
            let (session, is_new) = match self.load(env).await? {
                Some(session) => (session, false),
                None => (Session::new(), true),
            };
            self.current = Some(session);
            is_new
        };

        let session = self
            .current
            .as_mut()
            .ok_or_else(|| Error::Session("No current session".to_string()))?;
        Ok((session, is_new))
    }

    /// Discard the previous session before a fresh init.
    ///
    /// Removes, from both the process and the shell, every variable the
    /// previous session installed, the identity triple and the assumed-role
    /// variables. Must run before any new credentials are installed.
    ///
    /// The installed variables are taken from the previous record and from
    /// the exported name list, so they are cleared even when the record was
    /// never saved or has been deleted. Never fails.
    pub async fn supersede(&mut self, env: &mut dyn Environment, shell: &mut dyn ShellSink) {
        let previous = match self.current.take() {
            Some(session) => Some(session),
            None => match self.load(env).await {
                Ok(previous) => previous,
                Err(e) => {
                    warn!(error = %e, "Could not load previous session, its variables stay set");
                    None
                }
            },
        };

        let mut stale = env
            .get(SESSION_VARS_VAR)
            .map(|list| parse_var_names(&list))
            .unwrap_or_default();

        if let Some(previous) = previous {
            debug!(session = %previous.id(), vars = previous.vars().len(), "Superseding session");
            stale.extend(previous.vars().keys().cloned());
            if let Ok(path) = Self::record_path(previous.id()) {
                if let Err(e) = self.store.delete(&path).await {
                    debug!(error = %e, "Could not delete previous session record");
                }
            }
        }

        for name in &stale {
            env.unset(name);
            shell.unset(name);
        }
        env.unset(SESSION_VARS_VAR);
        shell.unset(SESSION_VARS_VAR);
        for name in IDENTITY_VARS {
            env.unset(name);
            shell.unset(name);
        }
        for name in ASSUMED_ROLE_VARS {
            env.unset(name);
            shell.unset(name);
        }
    }

    /// Export the current session and persist its record.
    ///
    /// Exports happen first and are not rolled back if persistence fails:
    /// the process environment stays authoritative for this run.
    ///
    /// # Errors
    /// - There is no current session
    /// - Sealing or storing the record failed
    pub async fn save(&self, env: &mut dyn Environment, shell: &mut dyn ShellSink) -> Result<()> {
        let session = self
            .current
            .as_ref()
            .ok_or_else(|| Error::Session("No current session to save".to_string()))?;

        let id = session.id().to_string();
        let key = session.key().to_base64();
        let salt = session.salt().to_base64();
        let names = session
            .vars()
            .keys()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(",");
        for (name, value) in [
            (SESSION_ID_VAR, id.as_str()),
            (SESSION_KEY_VAR, key.as_str()),
            (SESSION_SALT_VAR, salt.as_str()),
            (SESSION_VARS_VAR, names.as_str()),
        ] {
            shell.export(name, value);
            env.set(name, value);
        }

        let record = session.seal(&self.kdf_params)?;
        self.store
            .put(&Self::record_path(session.id())?, record)
            .await
            .map_err(|e| Error::Storage(format!("Could not persist session {}: {}", id, e)))?;

        info!(session = %id, vars = session.vars().len(), "Saved session");
        Ok(())
    }
}

/// Split an exported name list, dropping anything that isn't a variable name.
fn parse_var_names(list: &str) -> BTreeSet<String> {
    list.split(',')
        .map(str::trim)
        .filter(|name| is_valid_name(name))
        .map(String::from)
        .collect()
}
