use crate::core::validator::RecordValidator;
use crate::domain::model::{FlatRecord, NestedValue, Scalar};
use crate::utils::error::{IngestError, Result};

/// 把通過驗證的巢狀紀錄轉成可寫入的扁平紀錄
#[derive(Debug, Clone, Default)]
pub struct RecordTransformer {
    validator: RecordValidator,
}

impl RecordTransformer {
    pub fn new(validator: RecordValidator) -> Self {
        Self { validator }
    }

    pub fn transform(&self, record: NestedValue) -> Result<FlatRecord> {
        self.validator.validate(&record)?;

        let mut fields = match record {
            NestedValue::Node(fields) => fields,
            NestedValue::Leaf(_) => {
                return Err(IngestError::MissingField {
                    path: "name".to_string(),
                })
            }
        };

        let name_node = fields.remove("name");
        let name = compose_name(name_node.as_ref())?;

        let age_leaf = fields.remove("age");
        let age = match age_leaf.as_ref().and_then(NestedValue::as_leaf) {
            Some(scalar) => parse_age(scalar)?,
            None => {
                return Err(IngestError::MissingField {
                    path: "age".to_string(),
                })
            }
        };

        let address = fields.remove("address").and_then(|address| match address {
            NestedValue::Leaf(scalar) if scalar.is_blank() => None,
            other => Some(other.to_json()),
        });

        let remainder = NestedValue::Node(fields);
        let additional_info = if remainder.is_empty_node() {
            None
        } else {
            Some(remainder.to_json())
        };

        Ok(FlatRecord {
            name,
            age,
            address,
            additional_info,
        })
    }
}

/// 不論必填設定為何，組出的姓名都不得為空
fn compose_name(name: Option<&NestedValue>) -> Result<String> {
    let part = |key: &str| -> Result<String> {
        match name.and_then(|n| n.get(key)) {
            Some(NestedValue::Leaf(scalar)) => Ok(scalar.to_string()),
            Some(NestedValue::Node(_)) => Err(IngestError::MissingField {
                path: format!("name.{}", key),
            }),
            None => Ok(String::new()),
        }
    };

    let composed = format!("{} {}", part("firstName")?, part("lastName")?)
        .trim()
        .to_string();
    if composed.is_empty() {
        return Err(IngestError::MissingField {
            path: "name".to_string(),
        });
    }
    Ok(composed)
}

/// 數字直接向零截斷；文字取開頭的整數部分（可帶正負號）
pub fn parse_age(scalar: &Scalar) -> Result<i32> {
    let invalid = |reason: &str| IngestError::InvalidField {
        path: "age".to_string(),
        value: scalar.to_string(),
        reason: reason.to_string(),
    };

    let age = match scalar {
        Scalar::Number(n) => match n.as_i64() {
            Some(int) => int,
            None => n
                .as_f64()
                .map(|f| f.trunc())
                .filter(|f| f.abs() < i64::MAX as f64)
                .map(|f| f as i64)
                .ok_or_else(|| invalid("not a finite number"))?,
        },
        Scalar::Text(text) => {
            parse_int_prefix(text).ok_or_else(|| invalid("not an integer"))?
        }
    };

    if age < 0 {
        return Err(invalid("age cannot be negative"));
    }
    i32::try_from(age).map_err(|_| invalid("age out of range"))
}

fn parse_int_prefix(text: &str) -> Option<i64> {
    let text = text.trim_start();
    let (sign, rest) = match text.as_bytes().first() {
        Some(b'-') => (-1, &text[1..]),
        Some(b'+') => (1, &text[1..]),
        _ => (1, text),
    };

    let digits_end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    if digits_end == 0 {
        return None;
    }

    rest[..digits_end].parse::<i64>().ok().map(|v| sign * v)
}
