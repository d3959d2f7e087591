use anyhow::Context;
use clap::Parser;
use people_etl::core::{ConfigProvider, Sink};
use people_etl::utils::logger;
use people_etl::utils::validation::{validate_required_field, Validate};
use people_etl::{BatchIngestor, IngestEngine, MemorySink, TomlConfig};

#[derive(Parser)]
#[command(name = "toml-ingest")]
#[command(about = "Ingest a people CSV file using a TOML configuration")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "people-etl.toml")]
    config: String,

    /// Override the CSV path from the config
    #[arg(long)]
    csv: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Use an in-process sink instead of the configured database
    #[arg(long)]
    memory: bool,

    /// Dry run - transform the file and show what would be inserted
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // 載入 TOML 配置
    let mut config = TomlConfig::from_file(&args.config)
        .with_context(|| format!("failed to load config file '{}'", args.config))?;

    let mut log_settings = config.log_settings();
    log_settings.verbose |= args.verbose;
    logger::init_logger(&log_settings);

    tracing::info!("🚀 Starting TOML-based ingest");
    tracing::info!("📁 Loaded configuration from: {}", args.config);

    // 應用命令列覆蓋設定
    if let Some(csv) = &args.csv {
        config.source.csv_path = Some(csv.clone());
        tracing::info!("🔧 CSV path overridden to: {}", csv);
    }

    config.validate().context("configuration validation failed")?;
    display_config_summary(&config, &args);

    let csv_path = validate_required_field("source.csv_path", &config.source.csv_path)
        .context("no CSV file configured; set [source] csv_path or pass --csv")?
        .clone();

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - nothing will be written");
        return perform_dry_run(&config, &csv_path).await;
    }

    if args.memory {
        let engine = IngestEngine::from_config(MemorySink::new(), &config);
        return run(&engine, &csv_path).await;
    }

    #[cfg(feature = "postgres")]
    {
        use people_etl::{DatabaseConfig, PostgresSink};

        let database = config.database.clone().merged_with(DatabaseConfig::from_env()?);
        database.validate()?;
        let sink = PostgresSink::connect(&database.connection_url()?, database.max_connections())
            .await
            .context("failed to connect to PostgreSQL")?;
        let engine = IngestEngine::from_config(sink, &config);
        run(&engine, &csv_path).await
    }

    #[cfg(not(feature = "postgres"))]
    {
        anyhow::bail!("built without the `postgres` feature; re-run with --memory")
    }
}

async fn run<S: Sink>(engine: &IngestEngine<S>, csv_path: &str) -> anyhow::Result<()> {
    engine.sink().ensure_schema().await?;
    let outcome = engine.process_file(csv_path).await?;

    println!("{}", outcome.ingest);
    for rejection in &outcome.ingest.rejections {
        println!("  ⚠️ line {}: {}", rejection.line, rejection.reason);
    }
    if let Some(report) = outcome.report {
        println!("\n{}", report);
    }
    Ok(())
}

fn display_config_summary(config: &TomlConfig, args: &Args) {
    println!("📋 Configuration Summary:");
    println!("  Source: {}", config.csv_path().unwrap_or("(not set)"));
    println!("  Required fields: {}", config.required_fields().join(", "));
    println!("  Report after ingest: {}", config.report_after_ingest());
    println!(
        "  Sink: {}",
        if args.memory { "in-process" } else { "PostgreSQL" }
    );

    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }

    println!();
}

async fn perform_dry_run(config: &TomlConfig, csv_path: &str) -> anyhow::Result<()> {
    let source_text = tokio::fs::read_to_string(csv_path)
        .await
        .with_context(|| format!("failed to read '{}'", csv_path))?;

    let ingestor = BatchIngestor::new(people_etl::core::validator::RecordValidator::new(
        config.required_fields(),
    ));
    let batch = ingestor.prepare(&source_text)?;

    println!("🔍 Dry Run Analysis:");
    println!("  Would insert: {} records", batch.accepted.len());
    println!("  Would reject: {} rows", batch.rejected_count());
    for rejection in &batch.rejections {
        println!("    line {}: {}", rejection.line, rejection.reason);
    }

    println!();
    println!("📊 Age distribution of this batch:");
    println!(
        "{}",
        people_etl::core::report::report(batch.accepted.iter().map(|r| r.age))
    );

    Ok(())
}
