//! Config directory layout.

use std::path::{Path, PathBuf};

use rapture_common::{Error, Result};

/// Name of the config directory under the user's home.
pub const CONFIG_DIRNAME: &str = ".rapture";

/// Configuration file name in the config directory.
pub const CONFIG_FILENAME: &str = "config.json";

/// Per-user config directory, `~/.rapture`.
///
/// # Errors
/// - The home directory cannot be determined
pub fn config_dir() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|home| home.join(CONFIG_DIRNAME))
        .ok_or_else(|| Error::Config("Could not determine home directory".to_string()))
}

/// Path of the configuration file inside `dir`.
pub fn config_file(dir: &Path) -> PathBuf {
    dir.join(CONFIG_FILENAME)
}

/// Render a path for user-facing messages, abbreviating the home directory
/// to `~`.
pub fn display_path(path: &Path) -> PathBuf {
    match dirs::home_dir() {
        Some(home) => abbreviate(path, &home),
        None => path.to_path_buf(),
    }
}

fn abbreviate(path: &Path, home: &Path) -> PathBuf {
    match path.strip_prefix(home) {
        Ok(rest) if !home.as_os_str().is_empty() => Path::new("~").join(rest),
        _ => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abbreviate_home() {
        let home = Path::new("/home/alice");
        assert_eq!(
            abbreviate(Path::new("/home/alice/.rapture/config.json"), home),
            PathBuf::from("~/.rapture/config.json")
        );
        assert_eq!(
            abbreviate(Path::new("/etc/rapture.json"), home),
            PathBuf::from("/etc/rapture.json")
        );
    }

    #[test]
    fn test_config_file_name() {
        let dir = Path::new("/tmp/rapture");
        assert_eq!(config_file(dir), PathBuf::from("/tmp/rapture/config.json"));
    }
}
