use crate::core::ingestor::BatchIngestor;
use crate::core::validator::RecordValidator;
use crate::core::{ConfigProvider, Sink, SinkConnection};
use crate::domain::model::{AgeReport, IngestResult, StoredRecord};
use crate::utils::error::Result;
use std::path::Path;

pub const DEFAULT_LIST_LIMIT: usize = 100;

/// 對外入口：持有注入的 sink，每次呼叫都建立新的 ingestor
pub struct IngestEngine<S: Sink> {
    sink: S,
    required_fields: Vec<String>,
    report_after_ingest: bool,
}

#[derive(Debug, Clone)]
pub struct ProcessOutcome {
    pub ingest: IngestResult,
    pub report: Option<AgeReport>,
}

impl<S: Sink> IngestEngine<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            required_fields: RecordValidator::default().required_fields().to_vec(),
            report_after_ingest: true,
        }
    }

    pub fn from_config<C: ConfigProvider>(sink: S, config: &C) -> Self {
        Self {
            sink,
            required_fields: config.required_fields(),
            report_after_ingest: config.report_after_ingest(),
        }
    }

    pub fn with_required_fields(mut self, required_fields: Vec<String>) -> Self {
        self.required_fields = required_fields;
        self
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    fn ingestor(&self) -> BatchIngestor {
        BatchIngestor::new(RecordValidator::new(self.required_fields.clone()))
    }

    pub async fn ingest(&self, source_text: &str) -> Result<IngestResult> {
        tracing::info!("📥 Starting ingest ({} bytes)", source_text.len());
        let result = self.ingestor().ingest(&self.sink, source_text).await?;
        tracing::info!(
            "✅ Ingest finished: {} inserted, {} rejected",
            result.inserted_count,
            result.rejected_count
        );
        Ok(result)
    }

    pub async fn report(&self) -> Result<AgeReport> {
        let mut conn = self.sink.acquire().await?;
        let counts = conn.age_counts().await?;
        tracing::debug!("📊 Age counts: {:?}", counts);

        let report = AgeReport::from_counts(&counts);
        if report == AgeReport::NoData {
            tracing::info!("No records found for age distribution report");
        }
        Ok(report)
    }

    /// 讀檔、寫入，再視設定產生年齡分佈報表
    pub async fn process_file<P: AsRef<Path>>(&self, path: P) -> Result<ProcessOutcome> {
        let path = path.as_ref();
        tracing::info!("📁 Processing CSV file: {}", path.display());
        let source_text = tokio::fs::read_to_string(path).await?;

        let ingest = self.ingest(&source_text).await?;
        let report = if self.report_after_ingest {
            let report = self.report().await?;
            tracing::info!("\n{}", report);
            Some(report)
        } else {
            None
        };

        Ok(ProcessOutcome { ingest, report })
    }

    pub async fn list_records(&self, limit: usize) -> Result<Vec<StoredRecord>> {
        let mut conn = self.sink.acquire().await?;
        conn.fetch_records(limit).await
    }
}
