//! Vault provider trait definition.

use async_trait::async_trait;
use std::collections::BTreeMap;

use rapture_common::Result;

/// Variables stored in a vault, keyed by environment variable name.
pub type VaultVars = BTreeMap<String, String>;

/// External source of base credentials.
#[async_trait]
pub trait VaultProvider: Send + Sync {
    /// Get the provider name (e.g., "vaulted").
    fn name(&self) -> &str;

    /// Whether the provider can be used at all. Checked before any other call.
    async fn is_available(&self) -> bool;

    /// Names of all configured vaults, in the provider's order.
    ///
    /// # Errors
    /// - The provider could not be queried
    async fn list_vaults(&self) -> Result<Vec<String>>;

    /// Load the variables stored in the named vault.
    ///
    /// # Errors
    /// - `Error::Provider` carrying the provider's own message, shown to the
    ///   user verbatim
    async fn load_vault(&self, name: &str) -> Result<VaultVars>;
}
