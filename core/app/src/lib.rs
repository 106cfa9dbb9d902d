//! Application layer for Rapture.
//!
//! Ties configuration, the vault provider and the session manager together
//! into the user-facing operations:
//! - [`Initializer`]: `rapture init`, start a fresh credential session
//! - [`EnvIdentity`]: `rapture whoami`, report the active identity

pub mod init;
pub mod whoami;

pub use init::{
    resolve_vault_name, validate_vault, InitOutcome, InitStage, Initializer, VAULTED_ENV_VAR,
};
pub use whoami::{EnvIdentity, IdentityReporter};

/// Process exit status on success.
pub const EXIT_SUCCESS: i32 = 0;

/// Process exit status on any failure.
pub const EXIT_FAILURE: i32 = 1;
