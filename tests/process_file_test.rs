use anyhow::Result;
use people_etl::config::TomlConfig;
use people_etl::domain::model::AgeReport;
use people_etl::{IngestEngine, IngestError, MemorySink};
use tempfile::TempDir;

const PEOPLE_CSV: &str = "\
name.firstName,name.lastName,age,address.line1,address.city,gender,contact.email
Rohit,Prasad,35,A-563 Rakshak Society,Pune,male,rohit@example.com
Ann,Lee,17,\"1, Main Street\",Paris,female,ann@example.com

Old,Timer,88,,,,
Broken,Row,not-a-number,x,y,z,w
Missing,Columns,40
";

#[tokio::test]
async fn test_process_file_ingests_and_reports() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let csv_path = temp_dir.path().join("data.csv");
    tokio::fs::write(&csv_path, PEOPLE_CSV).await?;

    let sink = MemorySink::new();
    let engine = IngestEngine::new(sink.clone());
    let outcome = engine.process_file(&csv_path).await?;

    assert_eq!(outcome.ingest.inserted_count, 3);
    assert_eq!(outcome.ingest.rejected_count, 2);
    let rejected_lines: Vec<usize> = outcome.ingest.rejections.iter().map(|r| r.line).collect();
    assert_eq!(rejected_lines, vec![6, 7]);

    let stored = sink.records().await;
    let old_timer = &stored[2].record;
    assert_eq!(old_timer.name, "Old Timer");
    // 空白的 address 子欄位仍保留為空字串
    assert_eq!(
        old_timer.address,
        Some(serde_json::json!({"line1": "", "city": ""}))
    );
    assert_eq!(
        stored[0].record.additional_info,
        Some(serde_json::json!({"gender": "male", "contact": {"email": "rohit@example.com"}}))
    );

    match outcome.report {
        Some(AgeReport::Distribution(d)) => {
            assert_eq!(d.under_20, 33.33);
            assert_eq!(d.between_20_40, 33.33);
            assert_eq!(d.between_40_60, 0.0);
            assert_eq!(d.over_60, 33.33);
        }
        other => panic!("expected a distribution, got {:?}", other),
    }
    Ok(())
}

#[tokio::test]
async fn test_process_file_honours_toml_settings() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let csv_path = temp_dir.path().join("data.csv");
    tokio::fs::write(&csv_path, PEOPLE_CSV).await?;

    let config = TomlConfig::from_toml_str(
        r#"
[validation]
required_fields = ["name.firstName", "name.lastName", "age", "contact.email"]

[report]
enabled = false
"#,
    )?;

    let engine = IngestEngine::from_config(MemorySink::new(), &config);
    let outcome = engine.process_file(&csv_path).await?;

    // Old Timer 沒有 email
    assert_eq!(outcome.ingest.inserted_count, 2);
    assert_eq!(outcome.ingest.rejected_count, 3);
    assert!(outcome.report.is_none());
    Ok(())
}

#[tokio::test]
async fn test_missing_file_is_io_error() {
    let engine = IngestEngine::new(MemorySink::new());
    let err = engine
        .process_file("/definitely/not/here/data.csv")
        .await
        .unwrap_err();
    assert!(matches!(err, IngestError::Io(_)));
}

#[tokio::test]
async fn test_toml_relaxed_required_fields_still_need_a_name() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let csv_path = temp_dir.path().join("nameless.csv");
    tokio::fs::write(&csv_path, "name.firstName,name.lastName,age\n,,30\nAnn,Lee,31\n").await?;

    let config = TomlConfig::from_toml_str(
        r#"
[validation]
required_fields = ["age"]
"#,
    )?;

    let sink = MemorySink::new();
    let engine = IngestEngine::from_config(sink.clone(), &config);
    let outcome = engine.process_file(&csv_path).await?;

    assert_eq!(outcome.ingest.inserted_count, 1);
    assert_eq!(outcome.ingest.rejected_count, 1);
    let stored = sink.records().await;
    assert!(stored.iter().all(|row| !row.record.name.is_empty()));
    Ok(())
}
