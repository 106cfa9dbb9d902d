//! Configuration for Rapture.
//!
//! The configuration is a JSON file in the per-user config directory. Every
//! field is optional; absent fields take the built-in defaults. Callers get
//! a usable configuration even when the file is missing or broken, while
//! tooling that must tell those cases apart uses [`RaptureConfig::load_raw`].

pub mod config;
pub mod paths;

pub use config::{RaptureConfig, RawConfig, DEFAULT_AWS_REGION};
pub use paths::{config_dir, config_file, display_path, CONFIG_FILENAME};
