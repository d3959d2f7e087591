use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// CSV 欄位值經分類後的葉節點
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Number(serde_json::Number),
    Text(String),
}

impl Scalar {
    /// 空字串視為缺值；數字 0 不算
    pub fn is_blank(&self) -> bool {
        matches!(self, Scalar::Text(s) if s.is_empty())
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Scalar::Number(n) => serde_json::Value::Number(n.clone()),
            Scalar::Text(s) => serde_json::Value::String(s.clone()),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // 1e3 之類的整數值浮點數輸出為 1000，不帶 .0
            Scalar::Number(n) => match n.as_f64() {
                Some(value) if n.is_f64() && value.fract() == 0.0 && value.abs() < 1e15 => {
                    write!(f, "{}", value as i64)
                }
                _ => write!(f, "{}", n),
            },
            Scalar::Text(s) => f.write_str(s),
        }
    }
}

/// 以點分標頭展開而成的巢狀紀錄
#[derive(Debug, Clone, PartialEq)]
pub enum NestedValue {
    Leaf(Scalar),
    Node(BTreeMap<String, NestedValue>),
}

impl Default for NestedValue {
    fn default() -> Self {
        NestedValue::Node(BTreeMap::new())
    }
}

impl NestedValue {
    pub fn text(value: impl Into<String>) -> Self {
        NestedValue::Leaf(Scalar::Text(value.into()))
    }

    pub fn as_node(&self) -> Option<&BTreeMap<String, NestedValue>> {
        match self {
            NestedValue::Node(children) => Some(children),
            NestedValue::Leaf(_) => None,
        }
    }

    pub fn as_leaf(&self) -> Option<&Scalar> {
        match self {
            NestedValue::Leaf(scalar) => Some(scalar),
            NestedValue::Node(_) => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&NestedValue> {
        self.as_node().and_then(|children| children.get(key))
    }

    /// 依序走訪每一段；中途遇到葉節點即回傳 None
    pub fn get_path<'a, I>(&self, segments: I) -> Option<&NestedValue>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut current = self;
        for segment in segments {
            current = current.get(segment)?;
        }
        Some(current)
    }

    pub fn is_empty_node(&self) -> bool {
        matches!(self, NestedValue::Node(children) if children.is_empty())
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            NestedValue::Leaf(scalar) => scalar.to_json(),
            NestedValue::Node(children) => serde_json::Value::Object(
                children
                    .iter()
                    .map(|(key, child)| (key.clone(), child.to_json()))
                    .collect(),
            ),
        }
    }

    /// 把樹攤平回 (點分路徑, 葉值) 清單，順序為鍵的字典序
    pub fn leaf_paths(&self) -> Vec<(String, Scalar)> {
        let mut out = Vec::new();
        collect_leaves(self, String::new(), &mut out);
        out
    }
}

fn collect_leaves(value: &NestedValue, prefix: String, out: &mut Vec<(String, Scalar)>) {
    match value {
        NestedValue::Leaf(scalar) => out.push((prefix, scalar.clone())),
        NestedValue::Node(children) => {
            for (key, child) in children {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", prefix, key)
                };
                collect_leaves(child, path, out);
            }
        }
    }
}

/// 寫入 sink 的扁平紀錄
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatRecord {
    pub name: String,
    pub age: i32,
    pub address: Option<serde_json::Value>,
    pub additional_info: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub id: i32,
    #[serde(flatten)]
    pub record: FlatRecord,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowRejection {
    pub line: usize,
    pub reason: String,
}

/// 轉換完成但尚未寫入的批次
#[derive(Debug, Clone, Default)]
pub struct PreparedBatch {
    pub accepted: Vec<FlatRecord>,
    pub rejections: Vec<RowRejection>,
}

impl PreparedBatch {
    pub fn rejected_count(&self) -> usize {
        self.rejections.len()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestResult {
    pub inserted_count: usize,
    pub rejected_count: usize,
    pub rejections: Vec<RowRejection>,
    pub completed_at: DateTime<Utc>,
}

impl IngestResult {
    pub fn is_partial(&self) -> bool {
        self.rejected_count > 0
    }

    pub fn status(&self) -> &'static str {
        if self.is_partial() {
            "partial"
        } else {
            "complete"
        }
    }
}

impl fmt::Display for IngestResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_partial() {
            write!(
                f,
                "⚠️ Partially processed: {} records inserted, {} rows rejected",
                self.inserted_count, self.rejected_count
            )
        } else {
            write!(f, "✅ Successfully processed {} records", self.inserted_count)
        }
    }
}

/// 聚合查詢回傳的五個計數
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AgeCounts {
    pub total: u64,
    pub under_20: u64,
    pub between_20_40: u64,
    pub between_40_60: u64,
    pub over_60: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AgeDistribution {
    #[serde(rename = "< 20", serialize_with = "as_percent")]
    pub under_20: f64,
    #[serde(rename = "20 to 40", serialize_with = "as_percent")]
    pub between_20_40: f64,
    #[serde(rename = "40 to 60", serialize_with = "as_percent")]
    pub between_40_60: f64,
    #[serde(rename = "> 60", serialize_with = "as_percent")]
    pub over_60: f64,
}

fn as_percent<S: serde::Serializer>(value: &f64, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&format!("{:.2}%", value))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AgeReport {
    NoData,
    Distribution(AgeDistribution),
}

impl Serialize for AgeReport {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            AgeReport::NoData => serializer.serialize_str("No data"),
            AgeReport::Distribution(distribution) => distribution.serialize(serializer),
        }
    }
}

impl fmt::Display for AgeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgeReport::NoData => writeln!(f, "No records found for age distribution report"),
            AgeReport::Distribution(d) => {
                writeln!(f, "=================================")?;
                writeln!(f, "|    AGE DISTRIBUTION REPORT    |")?;
                writeln!(f, "=================================")?;
                writeln!(f, "| Age-Group    | % Distribution |")?;
                writeln!(f, "|--------------|----------------|")?;
                for (label, value) in [
                    ("< 20", d.under_20),
                    ("20 to 40", d.between_20_40),
                    ("40 to 60", d.between_40_60),
                    ("> 60", d.over_60),
                ] {
                    writeln!(f, "| {:<12} | {:>14} |", label, format!("{:.2}%", value))?;
                }
                writeln!(f, "=================================")
            }
        }
    }
}
