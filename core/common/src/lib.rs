//! Common utilities and types shared across Rapture crates.
//!
//! This module provides foundational types that are used throughout the codebase:
//! the error taxonomy, validated names, and the process environment abstraction
//! through which sessions are propagated between sequential commands.

pub mod env;
pub mod error;
pub mod types;

pub use env::{Environment, MemoryEnv, ProcessEnv};
pub use error::{Error, Result, VaultError};
pub use types::{SessionId, VaultName};
