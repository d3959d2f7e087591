pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::{DatabaseConfig, TomlConfig};

#[cfg(feature = "postgres")]
pub use adapters::PostgresSink;
pub use adapters::MemorySink;

pub use core::{etl::IngestEngine, ingestor::BatchIngestor};
pub use domain::model::{AgeReport, FlatRecord, IngestResult, NestedValue};
pub use utils::error::{IngestError, Result};
