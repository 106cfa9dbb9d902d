//! Common error types for Rapture.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for Rapture operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be read or parsed.
    #[error("Config error: {0}")]
    Config(String),

    /// Cryptographic operation failed.
    #[error("Cryptographic error: {0}")]
    Crypto(String),

    /// Storage operation failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid input provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The external credential provider failed. The message is the
    /// provider's own and is shown to the user verbatim.
    #[error("{0}")]
    Provider(String),

    /// Session state is unusable.
    #[error("Session error: {0}")]
    Session(String),

    /// A precondition for running the command does not hold.
    #[error("{0}")]
    Precondition(String),

    /// The requested vault could not be selected.
    #[error(transparent)]
    Vault(#[from] VaultError),
}

/// Reasons a vault name fails validation against the provider's list.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VaultError {
    /// No name was given and the configured default is not a known vault.
    #[error("No default vault is defined. Consider setting 'default_vault' in {}.", config_file.display())]
    NoDefaultVault { config_file: PathBuf },

    /// No name was given and the provider has no vaults at all.
    #[error("No Vaulted vaults are available. Please use Vaulted to store your base credentials.")]
    NoVaultsAvailable,

    /// An explicitly named vault does not exist.
    #[error("No such vault '{0}'")]
    NoSuchVault(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

/// Result type alias using the common Error.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vault_error_messages_are_distinct() {
        let no_default = VaultError::NoDefaultVault {
            config_file: PathBuf::from("~/.rapture/config.json"),
        };
        assert_eq!(
            no_default.to_string(),
            "No default vault is defined. Consider setting 'default_vault' in ~/.rapture/config.json."
        );
        assert!(VaultError::NoVaultsAvailable
            .to_string()
            .contains("No Vaulted vaults are available"));
        assert_eq!(
            VaultError::NoSuchVault("missing".to_string()).to_string(),
            "No such vault 'missing'"
        );
    }

    #[test]
    fn test_provider_error_is_verbatim() {
        let err = Error::Provider("vault is locked".to_string());
        assert_eq!(err.to_string(), "vault is locked");
    }
}
