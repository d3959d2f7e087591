use crate::core::etl::DEFAULT_LIST_LIMIT;
use crate::core::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::logger::{validate_filter, LogFormat, LogSettings};
use crate::utils::validation::{
    validate_database_url, validate_path, validate_positive_number, validate_required_paths,
    Validate,
};
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Debug, Clone, Parser)]
#[command(name = "people-etl")]
#[command(about = "Load people CSV files into PostgreSQL and report the age distribution")]
pub struct CliConfig {
    #[arg(long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Emit JSON formatted logs")]
    pub json_logs: bool,

    #[arg(long, global = true, env = "PEOPLE_ETL_LOG", help = "Log filter, e.g. people_etl=debug")]
    pub log_filter: Option<String>,

    #[arg(long, global = true, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,

    #[arg(long, global = true, help = "Use an in-process sink instead of PostgreSQL")]
    pub memory: bool,

    #[arg(
        long,
        global = true,
        value_delimiter = ',',
        default_value = "name.firstName,name.lastName,age"
    )]
    pub required_fields: Vec<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Ingest a CSV file, then print the age distribution
    Ingest {
        #[arg(env = "CSV_FILE_PATH")]
        file: String,

        #[arg(long, help = "Skip the age distribution report")]
        no_report: bool,

        #[arg(long, help = "Print the result as JSON")]
        json: bool,
    },
    /// Print the age distribution of stored records
    Report {
        #[arg(long, help = "Print the report as JSON")]
        json: bool,
    },
    /// List stored records ordered by id
    List {
        #[arg(long, default_value_t = DEFAULT_LIST_LIMIT)]
        limit: usize,

        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
    /// Create the users table if it does not exist
    InitDb,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl CliConfig {
    pub fn log_settings(&self) -> LogSettings {
        LogSettings {
            format: if self.json_logs {
                LogFormat::Json
            } else {
                LogFormat::Compact
            },
            verbose: self.verbose,
            filter: self.log_filter.clone(),
        }
    }
}

impl ConfigProvider for CliConfig {
    fn csv_path(&self) -> Option<&str> {
        match &self.command {
            Command::Ingest { file, .. } => Some(file),
            _ => None,
        }
    }

    fn required_fields(&self) -> Vec<String> {
        self.required_fields.clone()
    }

    fn report_after_ingest(&self) -> bool {
        !matches!(self.command, Command::Ingest { no_report: true, .. })
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_required_paths("--required-fields", &self.required_fields)?;
        if let Some(filter) = &self.log_filter {
            validate_filter("--log-filter", filter)?;
        }

        if !self.memory {
            if let Some(url) = &self.database_url {
                validate_database_url("--database-url", url)?;
            }
        }

        match &self.command {
            Command::Ingest { file, .. } => validate_path("file", file),
            Command::List { limit, .. } => validate_positive_number("--limit", *limit, 1),
            Command::Report { .. } | Command::InitDb => Ok(()),
        }
    }
}
