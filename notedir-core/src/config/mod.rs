//! Configuration types for notedir.

mod obsidian;
mod vault_config;

pub use vault_config::{DirectoryConfig, DriveConfig, FilterConfig, IndexConfig, VaultConfig};
