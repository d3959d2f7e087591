use crate::core::path_builder::PathBuilder;
use crate::core::tokenizer::tokenize_line;
use crate::core::transformer::RecordTransformer;
use crate::core::validator::RecordValidator;
use crate::domain::model::{FlatRecord, IngestResult, PreparedBatch, RowRejection};
use crate::domain::ports::{Sink, SinkConnection};
use crate::utils::error::{IngestError, Result};

/// 逐列執行 tokenize → 路徑展開 → 驗證 → 轉換，單列失敗只計數不中斷
#[derive(Debug, Clone, Default)]
pub struct BatchIngestor {
    transformer: RecordTransformer,
}

impl BatchIngestor {
    pub fn new(validator: RecordValidator) -> Self {
        Self {
            transformer: RecordTransformer::new(validator),
        }
    }

    /// 只做轉換，不碰 sink
    pub fn prepare(&self, source: &str) -> Result<PreparedBatch> {
        // 行號以原始檔案的實體行計算（從 1 開始）
        let mut lines = source
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(index, line)| (index + 1, line));

        let (header_line, data) = match (lines.next(), lines.next()) {
            (Some((_, header)), Some(first)) => (header, std::iter::once(first).chain(lines)),
            _ => return Err(IngestError::EmptySource),
        };

        let headers = tokenize_line(header_line);
        let builder = PathBuilder::new(&headers);
        tracing::debug!("📋 Headers ({}): {:?}", builder.column_count(), headers);

        let mut batch = PreparedBatch::default();
        for (line_no, line) in data {
            let values = tokenize_line(line);
            let outcome = builder
                .build(line_no, &values)
                .and_then(|nested| self.transformer.transform(nested));

            match outcome {
                Ok(record) => {
                    tracing::debug!("✅ Line {}: accepted '{}'", line_no, record.name);
                    batch.accepted.push(record);
                }
                Err(e) if e.is_row_level() => {
                    tracing::warn!("⚠️ Skipping row {}: {}", line_no, e);
                    batch.rejections.push(RowRejection {
                        line: line_no,
                        reason: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }

        tracing::info!(
            "🔄 Prepared {} records ({} rejected)",
            batch.accepted.len(),
            batch.rejected_count()
        );
        Ok(batch)
    }

    /// 轉換後一次性寫入；寫入失敗時整批回滾
    pub async fn ingest<S: Sink>(&self, sink: &S, source: &str) -> Result<IngestResult> {
        let batch = self.prepare(source)?;

        let inserted_count = if batch.accepted.is_empty() {
            tracing::warn!("No valid records to insert");
            0
        } else {
            let mut conn = sink.acquire().await?;
            insert_all(&mut conn, &batch.accepted).await?
        };

        Ok(IngestResult {
            inserted_count,
            rejected_count: batch.rejected_count(),
            rejections: batch.rejections,
            completed_at: chrono::Utc::now(),
        })
    }
}

/// 在單一交易中寫入全部紀錄；任一筆失敗即回滾並回傳原因
pub async fn insert_all<C: SinkConnection>(conn: &mut C, records: &[FlatRecord]) -> Result<usize> {
    if let Err(e) = conn.begin().await {
        return Err(IngestError::SinkTransaction {
            inserted_before_failure: 0,
            source: Box::new(e),
        });
    }

    for (index, record) in records.iter().enumerate() {
        if let Err(e) = conn.insert(record).await {
            tracing::error!("❌ Insert {} of {} failed, rolling back: {}", index + 1, records.len(), e);
            rollback_quietly(conn).await;
            return Err(IngestError::SinkTransaction {
                inserted_before_failure: index,
                source: Box::new(e),
            });
        }
    }

    if let Err(e) = conn.commit().await {
        tracing::error!("❌ Commit failed, rolling back: {}", e);
        rollback_quietly(conn).await;
        return Err(IngestError::SinkTransaction {
            inserted_before_failure: records.len(),
            source: Box::new(e),
        });
    }

    tracing::info!("💾 Inserted {} records", records.len());
    Ok(records.len())
}

async fn rollback_quietly<C: SinkConnection>(conn: &mut C) {
    if let Err(e) = conn.rollback().await {
        tracing::warn!("Rollback failed: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "name.firstName,name.lastName,age,address.line1,address.city,gender";

    #[test]
    fn test_prepare_accepts_and_rejects() {
        let source = format!(
            "{}\nRohit,Prasad,35,A-563 Rakshak Society,Pune,male\nAnn,Lee,,1 Main St,Paris,female\nonly,two\n",
            HEADER
        );
        let batch = BatchIngestor::default().prepare(&source).unwrap();

        assert_eq!(batch.accepted.len(), 1);
        assert_eq!(batch.rejected_count(), 2);
        assert_eq!(batch.accepted[0].name, "Rohit Prasad");
        assert_eq!(
            batch.accepted[0].address,
            Some(serde_json::json!({"line1": "A-563 Rakshak Society", "city": "Pune"}))
        );
        assert_eq!(
            batch.accepted[0].additional_info,
            Some(serde_json::json!({"gender": "male"}))
        );
        assert_eq!(batch.rejections[0].line, 3);
        assert!(batch.rejections[0].reason.contains("age"));
        assert_eq!(batch.rejections[1].line, 4);
        assert!(batch.rejections[1].reason.contains("expected 6 columns"));
    }

    #[test]
    fn test_blank_lines_are_ignored_and_line_numbers_are_physical() {
        let source = "name.firstName,name.lastName,age\n\n   \nAnn,Lee,30\n\nBob,,20\n";
        let batch = BatchIngestor::default().prepare(source).unwrap();
        assert_eq!(batch.accepted.len(), 1);
        assert_eq!(batch.rejections[0].line, 6);
    }

    #[test]
    fn test_crlf_source() {
        let source = "name.firstName,name.lastName,age\r\nAnn,Lee,30\r\n";
        let batch = BatchIngestor::default().prepare(source).unwrap();
        assert_eq!(batch.accepted.len(), 1);
        assert_eq!(batch.accepted[0].age, 30);
    }

    #[test]
    fn test_header_only_is_empty_source() {
        let err = BatchIngestor::default()
            .prepare("name.firstName,name.lastName,age\n\n")
            .unwrap_err();
        assert!(matches!(err, IngestError::EmptySource));
    }

    #[test]
    fn test_blank_source_is_empty_source() {
        assert!(matches!(
            BatchIngestor::default().prepare("  \n\n"),
            Err(IngestError::EmptySource)
        ));
    }

    #[test]
    fn test_quoted_field_with_comma() {
        let source = "name.firstName,name.lastName,age,address.line1\nAnn,Lee,30,\"12, Rue de Rivoli\"\n";
        let batch = BatchIngestor::default().prepare(source).unwrap();
        assert_eq!(
            batch.accepted[0].address,
            Some(serde_json::json!({"line1": "12, Rue de Rivoli"}))
        );
    }
}
