//! Logical paths inside a storage provider.

use serde::{Deserialize, Serialize};
use std::fmt;

use rapture_common::{Error, Result};

/// A relative path within a storage provider, independent of the backend.
///
/// Components are validated so a path can never escape the provider root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StoragePath {
    components: Vec<String>,
}

impl StoragePath {
    /// Parse a `/`-separated path. Leading and trailing separators are ignored.
    ///
    /// # Errors
    /// - Empty path
    /// - Empty, `.` or `..` components, or components containing `\`
    pub fn parse(path: &str) -> Result<Self> {
        let trimmed = path.trim_matches('/');
        if trimmed.is_empty() {
            return Err(Error::InvalidInput("Storage path cannot be empty".to_string()));
        }
        let mut out = Self { components: Vec::new() };
        for comp in trimmed.split('/') {
            out = out.join(comp)?;
        }
        Ok(out)
    }

    /// Join this path with a child component.
    pub fn join(&self, child: &str) -> Result<Self> {
        if child.is_empty() || child == "." || child == ".." {
            return Err(Error::InvalidInput(format!(
                "Invalid path component '{}'",
                child
            )));
        }
        if child.contains('/') || child.contains('\\') {
            return Err(Error::InvalidInput(
                "Path component cannot contain separators".to_string(),
            ));
        }
        let mut components = self.components.clone();
        components.push(child.to_string());
        Ok(Self { components })
    }

    /// Last component.
    pub fn name(&self) -> &str {
        self.components.last().map(String::as_str).unwrap_or_default()
    }

    /// Get the path components.
    pub fn components(&self) -> &[String] {
        &self.components
    }
}

impl fmt::Display for StoragePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.components.join("/"))
    }
}
