//! In-memory vault provider for testing.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use crate::provider::{VaultProvider, VaultVars};
use rapture_common::{Error, Result};

/// Vault provider serving a fixed set of vaults.
///
/// Vaults are listed in insertion order. Clones share the load log, so a
/// test can check which vaults were actually loaded.
#[derive(Clone)]
pub struct StaticVaults {
    available: bool,
    vaults: Vec<(String, VaultVars)>,
    list_error: Option<String>,
    load_errors: BTreeMap<String, String>,
    loads: Arc<Mutex<Vec<String>>>,
}

impl StaticVaults {
    /// Create an available provider with no vaults.
    pub fn new() -> Self {
        Self {
            available: true,
            vaults: Vec::new(),
            list_error: None,
            load_errors: BTreeMap::new(),
            loads: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Add a vault with the given variables.
    pub fn with_vault<'a>(
        mut self,
        name: &str,
        vars: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Self {
        let vars = vars
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self.vaults.push((name.to_string(), vars));
        self
    }

    /// Mark the provider as not installed.
    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    /// Make `list_vaults` fail with `message`.
    pub fn failing_list(mut self, message: &str) -> Self {
        self.list_error = Some(message.to_string());
        self
    }

    /// Make loading `name` fail with `message`.
    pub fn failing_load(mut self, name: &str, message: &str) -> Self {
        self.load_errors.insert(name.to_string(), message.to_string());
        self
    }

    /// Names passed to `load_vault`, in call order.
    pub fn loads(&self) -> Vec<String> {
        self.loads.lock().map(|l| l.clone()).unwrap_or_default()
    }
}

impl Default for StaticVaults {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VaultProvider for StaticVaults {
    fn name(&self) -> &str {
        "static"
    }

    async fn is_available(&self) -> bool {
        self.available
    }

    async fn list_vaults(&self) -> Result<Vec<String>> {
        if let Some(message) = &self.list_error {
            return Err(Error::Provider(message.clone()));
        }
        Ok(self.vaults.iter().map(|(name, _)| name.clone()).collect())
    }

    async fn load_vault(&self, name: &str) -> Result<VaultVars> {
        if let Ok(mut loads) = self.loads.lock() {
            loads.push(name.to_string());
        }
        if let Some(message) = self.load_errors.get(name) {
            return Err(Error::Provider(message.clone()));
        }
        self.vaults
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, vars)| vars.clone())
            .ok_or_else(|| Error::Provider(format!("vault '{}' does not exist", name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_vaults() {
        let provider = StaticVaults::new()
            .with_vault("default", [("AWS_ACCESS_KEY_ID", "AKIA1")])
            .with_vault("work", [("AWS_ACCESS_KEY_ID", "AKIA2")])
            .failing_load("work", "wrong password");

        assert!(provider.is_available().await);
        assert_eq!(provider.list_vaults().await.unwrap(), vec!["default", "work"]);

        let vars = provider.load_vault("default").await.unwrap();
        assert_eq!(vars["AWS_ACCESS_KEY_ID"], "AKIA1");

        let err = provider.load_vault("work").await.unwrap_err();
        assert_eq!(err.to_string(), "wrong password");
        assert_eq!(provider.loads(), vec!["default", "work"]);
    }

    #[tokio::test]
    async fn test_unavailable_and_failing_list() {
        let provider = StaticVaults::new().unavailable().failing_list("boom");
        assert!(!provider.is_available().await);
        assert!(provider.list_vaults().await.is_err());
    }
}
