//! Cryptographic primitives for Rapture sessions.
//!
//! This module provides:
//! - Random session keys and salts, exported to the shell as base64
//! - Derivation of the at-rest storage key using Argon2id
//! - Authenticated encryption of session records using XChaCha20-Poly1305
//!
//! # Security Guarantees
//! - All key material is automatically zeroized on drop
//! - No plaintext or key material is ever logged

pub mod aead;
pub mod kdf;
pub mod keys;

pub use aead::{decrypt, encrypt};
pub use kdf::{derive_storage_key, KdfParams};
pub use keys::{Salt, SessionKey, StorageKey};
