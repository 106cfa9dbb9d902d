//! Base-credential sources for Rapture.
//!
//! Rapture never stores long-lived credentials itself. A [`VaultProvider`]
//! holds them in named vaults; `init` asks it for the variables of one vault
//! and installs them into the shell.
//!
//! # Providers
//! - [`VaultedCli`]: shells out to the `vaulted` tool
//! - [`StaticVaults`]: fixed in-memory vaults, for tests

pub mod cli;
pub mod fixed;
pub mod provider;

pub use cli::VaultedCli;
pub use fixed::StaticVaults;
pub use provider::{VaultProvider, VaultVars};
