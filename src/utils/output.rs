use crate::domain::model::StoredRecord;
use crate::utils::error::Result;
use std::io::Write;

fn json_cell(value: &Option<serde_json::Value>) -> String {
    value.as_ref().map(|v| v.to_string()).unwrap_or_default()
}

/// 以 CSV 輸出；address / additional_info 為 JSON 字串，null 輸出空欄
pub fn write_records_csv<W: Write>(records: &[StoredRecord], writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(["id", "name", "age", "address", "additional_info"])?;

    for row in records {
        csv_writer.write_record([
            row.id.to_string(),
            row.record.name.clone(),
            row.record.age.to_string(),
            json_cell(&row.record.address),
            json_cell(&row.record.additional_info),
        ])?;
    }

    csv_writer.flush()?;
    Ok(())
}

pub fn format_records_table(records: &[StoredRecord]) -> String {
    let name_width = records
        .iter()
        .map(|row| row.record.name.chars().count())
        .max()
        .unwrap_or(0)
        .max("name".len());

    let mut out = format!("{:>6} | {:<name_width$} | {:>4} | address\n", "id", "name", "age");
    for row in records {
        out.push_str(&format!(
            "{:>6} | {:<name_width$} | {:>4} | {}\n",
            row.id,
            row.record.name,
            row.record.age,
            json_cell(&row.record.address)
        ));
    }
    out
}
