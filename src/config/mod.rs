#[cfg(feature = "cli")]
pub mod cli;
pub mod database;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli::{CliConfig, Command, OutputFormat};
pub use database::DatabaseConfig;
pub use toml_config::TomlConfig;
