use crate::utils::error::{IngestError, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const DEFAULT_FILTER: &str = "people_etl=info";
pub const VERBOSE_FILTER: &str = "people_etl=debug,info";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

/// CLI 旗標與 `[logging]` 區段合併後的日誌設定
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogSettings {
    pub format: LogFormat,
    pub verbose: bool,
    pub filter: Option<String>,
}

impl LogSettings {
    /// 設定的 filter 優先，否則依 verbose 選預設值
    pub fn directives(&self) -> &str {
        match self.filter.as_deref().map(str::trim) {
            Some(filter) if !filter.is_empty() => filter,
            _ if self.verbose => VERBOSE_FILTER,
            _ => DEFAULT_FILTER,
        }
    }
}

/// RUST_LOG 有設定時一律以它為準
pub fn init_logger(settings: &LogSettings) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::try_new(settings.directives()).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    });

    let layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    let registry = tracing_subscriber::registry().with(filter);
    match settings.format {
        LogFormat::Compact => registry.with(layer.compact()).init(),
        LogFormat::Json => registry.with(layer.json()).init(),
    }
}

pub fn validate_filter(field_name: &str, value: &str) -> Result<()> {
    EnvFilter::try_new(value)
        .map(|_| ())
        .map_err(|e| IngestError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Invalid log filter: {}", e),
        })
}
