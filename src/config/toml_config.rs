use crate::config::database::DatabaseConfig;
use crate::core::validator::DEFAULT_REQUIRED_FIELDS;
use crate::core::ConfigProvider;
use crate::utils::error::{IngestError, Result};
use crate::utils::logger::{validate_filter, LogFormat, LogSettings};
use crate::utils::validation::{validate_path, validate_required_paths, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub validation: ValidationConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceConfig {
    pub csv_path: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationConfig {
    pub required_fields: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportConfig {
    pub enabled: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub json: Option<bool>,
    pub verbose: Option<bool>,
    /// EnvFilter 語法，例如 "people_etl=debug,sqlx=warn"
    pub filter: Option<String>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(IngestError::Io)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| IngestError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${DB_PASSWORD})；未設定的保留原字樣
    fn substitute_env_vars(content: &str) -> String {
        static ENV_VAR: OnceLock<Regex> = OnceLock::new();
        let re = ENV_VAR.get_or_init(|| {
            Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("valid env var pattern")
        });

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .into_owned()
    }

    pub fn log_settings(&self) -> LogSettings {
        LogSettings {
            format: if self.logging.json.unwrap_or(false) {
                LogFormat::Json
            } else {
                LogFormat::Compact
            },
            verbose: self.logging.verbose.unwrap_or(false),
            filter: self.logging.filter.clone(),
        }
    }
}

impl ConfigProvider for TomlConfig {
    fn csv_path(&self) -> Option<&str> {
        self.source.csv_path.as_deref()
    }

    fn required_fields(&self) -> Vec<String> {
        self.validation
            .required_fields
            .clone()
            .unwrap_or_else(|| DEFAULT_REQUIRED_FIELDS.iter().map(|s| s.to_string()).collect())
    }

    fn report_after_ingest(&self) -> bool {
        self.report.enabled.unwrap_or(true)
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        if let Some(path) = &self.source.csv_path {
            validate_path("source.csv_path", path)?;
        }
        validate_required_paths("validation.required_fields", &self.required_fields())?;
        if let Some(filter) = &self.logging.filter {
            validate_filter("logging.filter", filter)?;
        }
        Ok(())
    }
}
