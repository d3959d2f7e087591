use crate::domain::model::{NestedValue, Scalar};
use crate::utils::error::{IngestError, Result};
use std::collections::BTreeMap;

/// 判斷欄位值是否為數字
///
/// 去除空白後非空、且能完整解析為有限的十進位數字才算數字；整數優先保留為整數。
/// 其餘（含空字串）保留為去除空白後的文字。
pub fn classify_scalar(raw: &str) -> Scalar {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Scalar::Text(String::new());
    }

    if let Ok(int) = trimmed.parse::<i64>() {
        return Scalar::Number(int.into());
    }

    // f64 也接受 "inf"/"NaN"，from_f64 會把非有限值擋掉
    if let Some(number) = trimmed
        .parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
    {
        return Scalar::Number(number);
    }

    Scalar::Text(trimmed.to_string())
}

/// 依標頭的點分路徑把每列值組成巢狀紀錄
#[derive(Debug, Clone)]
pub struct PathBuilder {
    paths: Vec<Vec<String>>,
}

impl PathBuilder {
    pub fn new(headers: &[String]) -> Self {
        let paths = headers
            .iter()
            .map(|header| {
                header
                    .trim()
                    .split('.')
                    .map(|segment| segment.trim().to_string())
                    .collect()
            })
            .collect();
        Self { paths }
    }

    pub fn column_count(&self) -> usize {
        self.paths.len()
    }

    /// 欄位數與標頭數不符時回傳 `MalformedRow`，由呼叫端計數後跳過
    pub fn build(&self, line: usize, values: &[String]) -> Result<NestedValue> {
        if values.len() != self.paths.len() {
            return Err(IngestError::MalformedRow {
                line,
                expected: self.paths.len(),
                found: values.len(),
            });
        }

        let mut root = BTreeMap::new();
        for (segments, value) in self.paths.iter().zip(values) {
            insert_at_path(&mut root, segments, classify_scalar(value));
        }

        Ok(NestedValue::Node(root))
    }
}

/// 路徑衝突時後寫入者勝：既有葉節點會被新的對映取代，反之亦然
fn insert_at_path(root: &mut BTreeMap<String, NestedValue>, segments: &[String], value: Scalar) {
    let Some((last, parents)) = segments.split_last() else {
        return;
    };

    let mut current = root;
    for segment in parents {
        let slot = current.entry(segment.clone()).or_default();
        if let NestedValue::Leaf(_) = slot {
            *slot = NestedValue::default();
        }
        let NestedValue::Node(children) = slot else {
            unreachable!("leaf slots are replaced with nodes above");
        };
        current = children;
    }

    current.insert(last.clone(), NestedValue::Leaf(value));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_classify_scalar() {
        assert_eq!(classify_scalar("30"), Scalar::Number(30.into()));
        assert_eq!(classify_scalar(" -7 "), Scalar::Number((-7).into()));
        assert_eq!(
            classify_scalar("12.5"),
            Scalar::Number(serde_json::Number::from_f64(12.5).unwrap())
        );
        assert_eq!(classify_scalar("0"), Scalar::Number(0.into()));
        assert_eq!(classify_scalar(""), Scalar::Text(String::new()));
        assert_eq!(classify_scalar("   "), Scalar::Text(String::new()));
        assert_eq!(classify_scalar(" Paris "), Scalar::Text("Paris".to_string()));
        assert_eq!(classify_scalar("30abc"), Scalar::Text("30abc".to_string()));
    }

    #[test]
    fn test_classify_rejects_non_finite_words() {
        assert_eq!(classify_scalar("NaN"), Scalar::Text("NaN".to_string()));
        assert_eq!(classify_scalar("inf"), Scalar::Text("inf".to_string()));
        assert_eq!(classify_scalar("1e400"), Scalar::Text("1e400".to_string()));
    }

    #[test]
    fn test_build_nested_record() {
        let builder = PathBuilder::new(&strings(&[
            "name.firstName",
            "name.lastName",
            "age",
            "address.city",
        ]));
        let record = builder
            .build(2, &strings(&["Ann", "Lee", "30", "Paris"]))
            .unwrap();

        assert_eq!(
            record.to_json(),
            serde_json::json!({
                "name": {"firstName": "Ann", "lastName": "Lee"},
                "age": 30,
                "address": {"city": "Paris"}
            })
        );
    }

    #[test]
    fn test_header_segments_are_trimmed() {
        let builder = PathBuilder::new(&strings(&[" address . line1 "]));
        let record = builder.build(2, &strings(&["221B"])).unwrap();
        assert_eq!(
            record.get_path(["address", "line1"]),
            Some(&NestedValue::text("221B"))
        );
    }

    #[test]
    fn test_column_count_mismatch_is_malformed_row() {
        let builder = PathBuilder::new(&strings(&["a", "b"]));
        let err = builder.build(7, &strings(&["1"])).unwrap_err();
        assert!(matches!(
            err,
            IngestError::MalformedRow { line: 7, expected: 2, found: 1 }
        ));
    }

    #[test]
    fn test_leaf_then_node_collision_last_write_wins() {
        let builder = PathBuilder::new(&strings(&["address", "address.city"]));
        let record = builder.build(2, &strings(&["somewhere", "Paris"])).unwrap();
        assert_eq!(
            record.get("address").unwrap().to_json(),
            serde_json::json!({"city": "Paris"})
        );
    }

    #[test]
    fn test_node_then_leaf_collision_last_write_wins() {
        let builder = PathBuilder::new(&strings(&["address.city", "address"]));
        let record = builder.build(2, &strings(&["Paris", "somewhere"])).unwrap();
        assert_eq!(record.get("address"), Some(&NestedValue::text("somewhere")));
    }

    #[test]
    fn test_build_then_flatten_reconstructs_pairs() {
        let headers = strings(&["name.firstName", "name.lastName", "age", "meta.tags.primary", "note"]);
        let values = strings(&["Ann", "Lee", "30", "vip", ""]);
        let record = PathBuilder::new(&headers).build(2, &values).unwrap();

        let mut expected: Vec<(String, String)> = headers.into_iter().zip(values).collect();
        expected.sort();

        let flattened: Vec<(String, String)> = record
            .leaf_paths()
            .into_iter()
            .map(|(path, scalar)| (path, scalar.to_string()))
            .collect();

        assert_eq!(flattened, expected);
    }
}
