//! Common types used throughout Rapture.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Name of a vault held by the external credential provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VaultName(String);

impl VaultName {
    /// Create a new VaultName from a string.
    ///
    /// # Errors
    /// - Returns error if the name is empty or contains a line break
    pub fn new(name: impl Into<String>) -> crate::Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(crate::Error::InvalidInput(
                "Vault name cannot be empty".to_string(),
            ));
        }
        if name.contains(['\n', '\r']) {
            return Err(crate::Error::InvalidInput(
                "Vault name cannot contain line breaks".to_string(),
            ));
        }
        Ok(Self(name))
    }

    /// Get the inner string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VaultName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl PartialEq<str> for VaultName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

/// Unique identifier for a credential session.
///
/// Always a UUID, so it is safe to use as a file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Generate a new random session identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse an identifier previously produced by [`SessionId::generate`].
    pub fn parse(s: &str) -> crate::Result<Self> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| crate::Error::InvalidInput(format!("Invalid session id '{}': {}", s, e)))
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vault_name_creation() {
        let name = VaultName::new("work").unwrap();
        assert_eq!(name.as_str(), "work");
        assert!(name == *"work");
    }

    #[test]
    fn test_vault_name_empty_fails() {
        assert!(VaultName::new("").is_err());
        assert!(VaultName::new("a\nb").is_err());
    }

    #[test]
    fn test_session_id_unique() {
        assert_ne!(SessionId::generate(), SessionId::generate());
    }

    #[test]
    fn test_session_id_parse_display() {
        let id = SessionId::generate();
        let parsed = SessionId::parse(&id.to_string()).unwrap();
        assert_eq!(parsed, id);
        assert!(SessionId::parse("../../etc/passwd").is_err());
    }
}
