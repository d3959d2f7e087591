use crate::domain::model::NestedValue;
use crate::utils::error::{IngestError, Result};

pub const DEFAULT_REQUIRED_FIELDS: [&str; 3] = ["name.firstName", "name.lastName", "age"];

#[derive(Debug, Clone)]
pub struct RecordValidator {
    required: Vec<String>,
}

impl Default for RecordValidator {
    fn default() -> Self {
        Self::new(DEFAULT_REQUIRED_FIELDS.iter().map(|s| s.to_string()).collect())
    }
}

impl RecordValidator {
    pub fn new(required: Vec<String>) -> Self {
        Self { required }
    }

    pub fn required_fields(&self) -> &[String] {
        &self.required
    }

    /// 依設定順序檢查，回報第一個缺少的路徑
    pub fn validate(&self, record: &NestedValue) -> Result<()> {
        match self.required.iter().find(|path| !is_present(record, path)) {
            Some(path) => Err(IngestError::MissingField { path: path.clone() }),
            None => Ok(()),
        }
    }
}

// 必填路徑必須落在非空的葉節點上
fn is_present(record: &NestedValue, path: &str) -> bool {
    match record.get_path(path.split('.')) {
        Some(NestedValue::Leaf(scalar)) => !scalar.is_blank(),
        Some(NestedValue::Node(_)) | None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::path_builder::PathBuilder;

    fn record(headers: &[&str], values: &[&str]) -> NestedValue {
        let headers: Vec<String> = headers.iter().map(|s| s.to_string()).collect();
        let values: Vec<String> = values.iter().map(|s| s.to_string()).collect();
        PathBuilder::new(&headers).build(2, &values).unwrap()
    }

    #[test]
    fn test_complete_record_passes() {
        let rec = record(&["name.firstName", "name.lastName", "age"], &["Ann", "Lee", "30"]);
        assert!(RecordValidator::default().validate(&rec).is_ok());
    }

    #[test]
    fn test_missing_age_column() {
        let rec = record(&["name.firstName", "name.lastName"], &["Ann", "Lee"]);
        let err = RecordValidator::default().validate(&rec).unwrap_err();
        assert!(matches!(err, IngestError::MissingField { path } if path == "age"));
    }

    #[test]
    fn test_empty_string_counts_as_missing() {
        let rec = record(&["name.firstName", "name.lastName", "age"], &["Ann", "", "30"]);
        let err = RecordValidator::default().validate(&rec).unwrap_err();
        assert!(matches!(err, IngestError::MissingField { path } if path == "name.lastName"));
    }

    #[test]
    fn test_numeric_zero_is_present() {
        let rec = record(&["name.firstName", "name.lastName", "age"], &["Ann", "Lee", "0"]);
        assert!(RecordValidator::default().validate(&rec).is_ok());
    }

    #[test]
    fn test_leaf_where_node_expected_is_missing() {
        let rec = record(&["name", "age"], &["Ann Lee", "30"]);
        let err = RecordValidator::default().validate(&rec).unwrap_err();
        assert!(matches!(err, IngestError::MissingField { path } if path == "name.firstName"));
    }

    #[test]
    fn test_first_missing_path_wins() {
        let rec = record(&["other"], &["x"]);
        let err = RecordValidator::default().validate(&rec).unwrap_err();
        assert_eq!(err.to_string(), "Missing mandatory field: name.firstName");
    }

    #[test]
    fn test_custom_required_fields() {
        let validator = RecordValidator::new(vec!["contact.email".to_string()]);
        let rec = record(&["contact.email"], &["a@b.c"]);
        assert!(validator.validate(&rec).is_ok());
        assert!(validator.validate(&record(&["contact.phone"], &["1"])).is_err());
    }
}
