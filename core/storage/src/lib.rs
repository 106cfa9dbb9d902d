//! Storage provider abstraction for Rapture session records.
//!
//! Session persistence goes through [`StorageProvider`] so the on-disk
//! layout under the config directory can be replaced by [`MemoryProvider`]
//! in tests.

pub mod local;
pub mod memory;
pub mod path;
pub mod provider;

pub use local::LocalProvider;
pub use memory::MemoryProvider;
pub use path::StoragePath;
pub use provider::StorageProvider;
