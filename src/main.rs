use clap::Parser;
use people_etl::config::{Command, OutputFormat};
use people_etl::core::Sink;
use people_etl::utils::error::ErrorSeverity;
use people_etl::utils::output::{format_records_table, write_records_csv};
use people_etl::utils::{logger, validation::Validate};
use people_etl::{CliConfig, IngestEngine, MemorySink, Result};

#[tokio::main]
async fn main() {
    let config = CliConfig::parse();

    logger::init_logger(&config.log_settings());

    tracing::info!("Starting people-etl CLI");
    tracing::debug!("Command: {:?}", config.command);

    if let Err(e) = run(&config).await {
        tracing::error!("❌ people-etl failed: {} (Severity: {:?})", e, e.severity());
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e);
        eprintln!("💡 {}", e.recovery_suggestion());

        let exit_code = match e.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };
        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }
}

async fn run(config: &CliConfig) -> Result<()> {
    config.validate()?;

    if config.memory {
        tracing::info!("🧪 Using in-process sink; nothing will be persisted");
        let engine = IngestEngine::from_config(MemorySink::new(), config);
        return execute(&engine, config).await;
    }

    #[cfg(feature = "postgres")]
    {
        use people_etl::{DatabaseConfig, PostgresSink};

        let database = DatabaseConfig {
            url: config.database_url.clone(),
            ..Default::default()
        }
        .merged_with(DatabaseConfig::from_env()?);
        database.validate()?;

        let sink = PostgresSink::connect(&database.connection_url()?, database.max_connections()).await?;
        let engine = IngestEngine::from_config(sink, config);
        execute(&engine, config).await
    }

    #[cfg(not(feature = "postgres"))]
    {
        Err(people_etl::IngestError::ConfigError {
            message: "built without the `postgres` feature; re-run with --memory".to_string(),
        })
    }
}

async fn execute<S: Sink>(engine: &IngestEngine<S>, config: &CliConfig) -> Result<()> {
    match &config.command {
        Command::InitDb => {
            engine.sink().ensure_schema().await?;
            println!("✅ Users table ready");
        }
        Command::Ingest { file, json, .. } => {
            engine.sink().ensure_schema().await?;
            let outcome = engine.process_file(file).await?;

            if *json {
                let payload = serde_json::json!({
                    "success": true,
                    "status": outcome.ingest.status(),
                    "records_processed": outcome.ingest.inserted_count,
                    "records_rejected": outcome.ingest.rejected_count,
                    "rejections": outcome.ingest.rejections,
                    "completed_at": outcome.ingest.completed_at,
                    "age_distribution": outcome.report,
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                println!("{}", outcome.ingest);
                for rejection in &outcome.ingest.rejections {
                    println!("  ⚠️ line {}: {}", rejection.line, rejection.reason);
                }
                if let Some(report) = outcome.report {
                    println!("\n{}", report);
                }
            }
        }
        Command::Report { json } => {
            let report = engine.report().await?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{}", report);
            }
        }
        Command::List { limit, format } => {
            let records = engine.list_records(*limit).await?;
            match format {
                OutputFormat::Table => print!("{}", format_records_table(&records)),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&records)?),
                OutputFormat::Csv => write_records_csv(&records, std::io::stdout().lock())?,
            }
        }
    }

    Ok(())
}
