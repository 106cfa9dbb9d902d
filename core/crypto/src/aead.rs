//! Authenticated encryption of session records.
//!
//! Records are sealed with XChaCha20-Poly1305. The session id is bound as
//! associated data, so a record copied under another session's name fails
//! to open.

use chacha20poly1305::{
    aead::{generic_array::GenericArray, Aead, AeadCore, KeyInit, OsRng, Payload},
    XChaCha20Poly1305,
};

use crate::keys::StorageKey;
use rapture_common::{Error, Result};

/// Nonce size for XChaCha20-Poly1305 (24 bytes).
pub const NONCE_SIZE: usize = 24;

/// Authentication tag size (16 bytes).
pub const TAG_SIZE: usize = 16;

/// Seal `plaintext` under `key`, authenticating `aad` alongside it.
///
/// # Postconditions
/// - Returns nonce || ciphertext || tag with a fresh random nonce
pub fn encrypt(key: &StorageKey, plaintext: &[u8], aad: &[u8]) -> Result<Vec<u8>> {
    let cipher = XChaCha20Poly1305::new(GenericArray::from_slice(key.as_bytes()));
    let nonce = XChaCha20Poly1305::generate_nonce(&mut OsRng);

    let sealed = cipher
        .encrypt(&nonce, Payload { msg: plaintext, aad })
        .map_err(|e| Error::Crypto(format!("Encryption failed: {}", e)))?;

    let mut out = Vec::with_capacity(NONCE_SIZE + sealed.len());
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&sealed);
    Ok(out)
}

/// Open a buffer produced by [`encrypt`].
///
/// # Errors
/// - Buffer shorter than NONCE_SIZE + TAG_SIZE
/// - Wrong key, wrong `aad`, or tampered data
pub fn decrypt(key: &StorageKey, sealed: &[u8], aad: &[u8]) -> Result<Vec<u8>> {
    if sealed.len() < NONCE_SIZE + TAG_SIZE {
        return Err(Error::Crypto("Ciphertext too short".to_string()));
    }

    let (nonce, body) = sealed.split_at(NONCE_SIZE);
    let cipher = XChaCha20Poly1305::new(GenericArray::from_slice(key.as_bytes()));

    cipher
        .decrypt(GenericArray::from_slice(nonce), Payload { msg: body, aad })
        .map_err(|e| Error::Crypto(format!("Decryption failed: {}", e)))
}
