use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Malformed row at line {line}: expected {expected} columns, found {found}")]
    MalformedRow {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("Missing mandatory field: {path}")]
    MissingField { path: String },

    #[error("Invalid value for field '{path}': '{value}' ({reason})")]
    InvalidField {
        path: String,
        value: String,
        reason: String,
    },

    #[error("CSV source must contain at least a header and one data row")]
    EmptySource,

    #[error("Sink transaction rolled back after {inserted_before_failure} inserts: {source}")]
    SinkTransaction {
        inserted_before_failure: usize,
        #[source]
        source: Box<IngestError>,
    },

    #[error("Sink error: {message}")]
    Sink { message: String },

    #[cfg(feature = "postgres")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("CSV processing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid configuration value for '{field}': '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl IngestError {
    /// 單列錯誤：記錄後跳過，不中斷整批
    pub fn is_row_level(&self) -> bool {
        matches!(
            self,
            IngestError::MalformedRow { .. }
                | IngestError::MissingField { .. }
                | IngestError::InvalidField { .. }
        )
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            IngestError::MalformedRow { .. }
            | IngestError::MissingField { .. }
            | IngestError::InvalidField { .. } => ErrorSeverity::Low,
            IngestError::SinkTransaction { .. } | IngestError::Sink { .. } => {
                ErrorSeverity::Medium
            }
            #[cfg(feature = "postgres")]
            IngestError::Database(_) => ErrorSeverity::Medium,
            IngestError::EmptySource
            | IngestError::Csv(_)
            | IngestError::Serialization(_)
            | IngestError::ConfigError { .. }
            | IngestError::InvalidConfigValueError { .. }
            | IngestError::MissingConfigError { .. } => ErrorSeverity::High,
            IngestError::Io(_) => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            IngestError::MalformedRow { .. } => "Check the row has one value per header column",
            IngestError::MissingField { .. } => {
                "Fill in name.firstName, name.lastName and age for every row"
            }
            IngestError::InvalidField { .. } => "Use a non-negative whole number for age",
            IngestError::EmptySource => "Provide a header line followed by at least one data row",
            IngestError::SinkTransaction { .. } | IngestError::Sink { .. } => {
                "No rows from this batch were stored; fix the cause and re-run the ingest"
            }
            #[cfg(feature = "postgres")]
            IngestError::Database(_) => "Check DATABASE_URL or the DB_* settings and that the server is reachable",
            IngestError::Csv(_) | IngestError::Serialization(_) => "Check the output destination",
            IngestError::Io(_) => "Check the file path exists and is readable",
            IngestError::ConfigError { .. }
            | IngestError::InvalidConfigValueError { .. }
            | IngestError::MissingConfigError { .. } => "Review the configuration file and CLI flags",
        }
    }
}

pub type Result<T> = std::result::Result<T, IngestError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_row_level_classification() {
        assert!(IngestError::MissingField { path: "age".into() }.is_row_level());
        assert!(IngestError::MalformedRow { line: 3, expected: 4, found: 2 }.is_row_level());
        assert!(!IngestError::EmptySource.is_row_level());
    }

    #[test]
    fn test_sink_transaction_exposes_cause() {
        let err = IngestError::SinkTransaction {
            inserted_before_failure: 2,
            source: Box::new(IngestError::Sink {
                message: "disk full".to_string(),
            }),
        };

        assert!(err.to_string().contains("disk full"));
        let cause = err.source().unwrap();
        assert_eq!(cause.to_string(), "Sink error: disk full");
        assert_eq!(err.severity(), ErrorSeverity::Medium);
    }
}
