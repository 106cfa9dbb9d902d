//! Session state and its sealed on-disk record.

use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use zeroize::Zeroize;

use rapture_common::{Error, Result, SessionId};
use rapture_crypto::{decrypt, derive_storage_key, encrypt, KdfParams, Salt, SessionKey};

/// Current record format version.
const RECORD_VERSION: u32 = 1;

/// Role assumed on top of the base credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssumedRole {
    pub arn: String,
    pub alias: Option<String>,
    pub expiration: DateTime<Utc>,
}

/// A local credential session.
///
/// Variable values are zeroized when the session is dropped.
pub struct Session {
    id: SessionId,
    key: SessionKey,
    salt: Salt,
    created_at: DateTime<Utc>,
    assumed_role: Option<AssumedRole>,
    vars: BTreeMap<String, String>,
}

/// Persisted form. Only the variables are secret, and only they are sealed.
#[derive(Serialize, Deserialize)]
struct SessionRecord {
    version: u32,
    id: SessionId,
    created_at: DateTime<Utc>,
    kdf_params: KdfParams,
    assumed_role: Option<AssumedRole>,
    sealed_vars: String,
}

impl Session {
    /// Start a fresh session: new identity, no variables, no assumed role.
    pub fn new() -> Self {
        Self::with_identity(SessionId::generate(), SessionKey::generate(), Salt::generate())
    }

    fn with_identity(id: SessionId, key: SessionKey, salt: Salt) -> Self {
        Self {
            id,
            key,
            salt,
            created_at: Utc::now(),
            assumed_role: None,
            vars: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn key(&self) -> &SessionKey {
        &self.key
    }

    pub fn salt(&self) -> &Salt {
        &self.salt
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Base credential variables held by this session.
    pub fn vars(&self) -> &BTreeMap<String, String> {
        &self.vars
    }

    /// Record a credential variable.
    pub fn set_var(&mut self, name: impl Into<String>, value: impl Into<String>) {
        if let Some(mut old) = self.vars.insert(name.into(), value.into()) {
            old.zeroize();
        }
    }

    /// Replace all credential variables.
    pub fn replace_vars(&mut self, vars: &BTreeMap<String, String>) {
        self.clear_vars();
        for (name, value) in vars {
            self.set_var(name.as_str(), value.as_str());
        }
    }

    fn clear_vars(&mut self) {
        for value in self.vars.values_mut() {
            value.zeroize();
        }
        self.vars.clear();
    }

    pub fn clear_assumed_role(&mut self) {
        self.assumed_role = None;
    }

    /// Serialize and seal for storage.
    ///
    /// The id is bound as associated data, so the record only opens under
    /// the name it was written for.
    pub fn seal(&self, params: &KdfParams) -> Result<Vec<u8>> {
        let storage_key = derive_storage_key(&self.key, &self.salt, params)?;
        let mut plaintext = serde_json::to_vec(&self.vars)?;
        let sealed = encrypt(&storage_key, &plaintext, self.id.to_string().as_bytes());
        plaintext.zeroize();

        let record = SessionRecord {
            version: RECORD_VERSION,
            id: self.id,
            created_at: self.created_at,
            kdf_params: params.clone(),
            assumed_role: self.assumed_role.clone(),
            sealed_vars: STANDARD.encode(sealed?),
        };
        Ok(serde_json::to_vec_pretty(&record)?)
    }

    /// Open a record produced by [`Session::seal`].
    ///
    /// # Errors
    /// - Unsupported record version
    /// - Record belongs to a different session id
    /// - Wrong key or salt, or tampered record
    pub fn open(bytes: &[u8], id: SessionId, key: SessionKey, salt: Salt) -> Result<Self> {
        let record: SessionRecord = serde_json::from_slice(bytes)?;
        if record.version != RECORD_VERSION {
            return Err(Error::Session(format!(
                "Unsupported session record version {}",
                record.version
            )));
        }
        if record.id != id {
            return Err(Error::Session(format!(
                "Session record {} does not match session {}",
                record.id, id
            )));
        }

        let sealed = STANDARD
            .decode(&record.sealed_vars)
            .map_err(|e| Error::Serialization(format!("Invalid sealed vars: {}", e)))?;
        let storage_key = derive_storage_key(&key, &salt, &record.kdf_params)?;
        let mut plaintext = decrypt(&storage_key, &sealed, id.to_string().as_bytes())?;
        let vars = serde_json::from_slice(&plaintext);
        plaintext.zeroize();

        Ok(Self {
            id,
            key,
            salt,
            created_at: record.created_at,
            assumed_role: record.assumed_role,
            vars: vars?,
        })
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.clear_vars();
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("created_at", &self.created_at)
            .field("assumed_role", &self.assumed_role)
            .field("vars", &self.vars.keys().collect::<Vec<_>>())
            .finish()
    }
}
