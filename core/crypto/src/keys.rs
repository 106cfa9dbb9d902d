//! Key types with secure memory handling.
//!
//! All key types automatically zeroize their memory on drop to prevent
//! sensitive data from persisting in memory.

use base64::{engine::general_purpose::STANDARD, Engine};
use rand::RngCore;
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

use rapture_common::{Error, Result};

/// Length of encryption keys in bytes (256-bit).
pub const KEY_LENGTH: usize = 32;

/// Length of salts in bytes.
pub const SALT_LENGTH: usize = 32;

fn decode_fixed<const N: usize>(what: &str, encoded: &str) -> Result<[u8; N]> {
    let mut decoded = STANDARD
        .decode(encoded.trim())
        .map_err(|e| Error::Crypto(format!("Invalid {} encoding: {}", what, e)))?;
    if decoded.len() != N {
        let len = decoded.len();
        decoded.zeroize();
        return Err(Error::Crypto(format!(
            "Invalid {} length: expected {}, got {}",
            what, N, len
        )));
    }
    let mut out = [0u8; N];
    out.copy_from_slice(&decoded);
    decoded.zeroize();
    Ok(out)
}

/// Symmetric key identifying a session.
///
/// The key lives only in the shell environment; the persisted session record
/// can't be opened without it.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SessionKey {
    key: [u8; KEY_LENGTH],
}

impl SessionKey {
    /// Generate a random session key.
    pub fn generate() -> Self {
        let mut key = [0u8; KEY_LENGTH];
        rand::thread_rng().fill_bytes(&mut key);
        Self { key }
    }

    /// Create a session key from raw bytes.
    pub fn from_bytes(key: [u8; KEY_LENGTH]) -> Self {
        Self { key }
    }

    /// Get the key bytes.
    ///
    /// # Security
    /// The returned slice should be used immediately and not stored.
    pub fn as_bytes(&self) -> &[u8; KEY_LENGTH] {
        &self.key
    }

    /// Encode for export through the environment.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.key)
    }

    /// Decode a key read back from the environment.
    ///
    /// # Errors
    /// - Invalid base64
    /// - Decoded length is not KEY_LENGTH
    pub fn from_base64(encoded: &str) -> Result<Self> {
        decode_fixed::<KEY_LENGTH>("session key", encoded).map(Self::from_bytes)
    }
}

impl fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionKey([REDACTED])")
    }
}

/// Key sealing the persisted session record, derived from the session key.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct StorageKey {
    key: [u8; KEY_LENGTH],
}

impl StorageKey {
    /// Create a storage key from raw bytes.
    pub fn from_bytes(key: [u8; KEY_LENGTH]) -> Self {
        Self { key }
    }

    /// Get the key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_LENGTH] {
        &self.key
    }
}

impl fmt::Debug for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StorageKey([REDACTED])")
    }
}

/// Salt for key derivation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Salt(pub [u8; SALT_LENGTH]);

impl Salt {
    /// Generate a random salt.
    pub fn generate() -> Self {
        let mut salt = [0u8; SALT_LENGTH];
        rand::thread_rng().fill_bytes(&mut salt);
        Self(salt)
    }

    /// Create from bytes.
    pub fn from_bytes(bytes: [u8; SALT_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Get the salt bytes.
    pub fn as_bytes(&self) -> &[u8; SALT_LENGTH] {
        &self.0
    }

    /// Encode for export through the environment.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.0)
    }

    /// Decode a salt read back from the environment.
    pub fn from_base64(encoded: &str) -> Result<Self> {
        decode_fixed::<SALT_LENGTH>("salt", encoded).map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_key_generate() {
        let key1 = SessionKey::generate();
        let key2 = SessionKey::generate();

        // Random keys should be different
        assert_ne!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_session_key_base64() {
        let key = SessionKey::from_bytes([7u8; KEY_LENGTH]);
        let restored = SessionKey::from_base64(&key.to_base64()).unwrap();
        assert_eq!(restored.as_bytes(), key.as_bytes());
    }

    #[test]
    fn test_session_key_rejects_bad_input() {
        assert!(SessionKey::from_base64("not base64!!").is_err());
        assert!(SessionKey::from_base64(&STANDARD.encode([1u8; 16])).is_err());
    }

    #[test]
    fn test_session_key_debug_redacted() {
        let key = SessionKey::generate();
        assert_eq!(format!("{:?}", key), "SessionKey([REDACTED])");
    }

    #[test]
    fn test_salt_generate() {
        let salt1 = Salt::generate();
        let salt2 = Salt::generate();

        // Random salts should be different
        assert_ne!(salt1.as_bytes(), salt2.as_bytes());
        assert_eq!(Salt::from_base64(&salt1.to_base64()).unwrap(), salt1);
    }
}
