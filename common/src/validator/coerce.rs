use crate::error::{Result, Text2SqlError};
use crate::schema::model::ValidationModel;
use crate::table::ColumnType;
use crate::validator::ValidatedRow;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::{Map, Number, Value};

/// numbers above this magnitude are read as unix milliseconds, not seconds
const UNIX_MILLIS_THRESHOLD: f64 = 2e10;

/// serialized shape of coerced timestamps
const OUTPUT_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// coerce one json row against the model. missing or null fields take
/// their default, keys outside the model are ignored
pub fn coerce_row(item: &Value, model: &ValidationModel) -> Result<ValidatedRow> {
    let obj = item.as_object().ok_or_else(|| {
        Text2SqlError::Validation(format!("expected an object, got {}", item))
    })?;

    let mut fields = Map::with_capacity(model.len());
    for field in &model.fields {
        let value = match obj.get(&field.name) {
            None | Some(Value::Null) => {
                if field.required {
                    return Err(Text2SqlError::Validation(format!(
                        "field '{}' is required",
                        field.name
                    )));
                }
                field.default.clone()
            }
            Some(raw) => coerce_value(raw, field.field_type).map_err(|e| {
                Text2SqlError::Validation(format!("field '{}': {}", field.name, e))
            })?,
        };
        fields.insert(field.name.clone(), value);
    }

    Ok(ValidatedRow::new(fields))
}

/// lax coercion of a single non-null value into the field type
pub fn coerce_value(raw: &Value, field_type: ColumnType) -> Result<Value> {
    let coerced = match field_type {
        ColumnType::Integer => coerce_integer(raw).map(Value::from),
        ColumnType::Float => coerce_float(raw)
            .and_then(Number::from_f64)
            .map(Value::Number),
        ColumnType::Boolean => coerce_boolean(raw).map(Value::Bool),
        ColumnType::Timestamp => coerce_timestamp(raw)
            .map(|ts| Value::String(ts.format(OUTPUT_TIMESTAMP_FORMAT).to_string())),
        ColumnType::Text => raw.as_str().map(|s| Value::String(s.to_string())),
    };

    coerced.ok_or_else(|| {
        Text2SqlError::Validation(format!("{} is not a valid {}", raw, field_type.as_str()))
    })
}

fn coerce_integer(raw: &Value) -> Option<i64> {
    match raw {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::Bool(b) => Some(i64::from(*b)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

fn coerce_float(raw: &Value) -> Option<f64> {
    match raw {
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

fn coerce_boolean(raw: &Value) -> Option<bool> {
    match raw {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_f64() {
            Some(f) if f == 0.0 => Some(false),
            Some(f) if f == 1.0 => Some(true),
            _ => None,
        },
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "0" | "off" | "f" | "false" | "n" | "no" => Some(false),
            "1" | "on" | "t" | "true" | "y" | "yes" => Some(true),
            _ => None,
        },
        _ => None,
    }
}

fn coerce_timestamp(raw: &Value) -> Option<NaiveDateTime> {
    match raw {
        Value::String(s) => parse_timestamp(s.trim()),
        Value::Number(n) => {
            let f = n.as_f64()?;
            let seconds = if f.abs() > UNIX_MILLIS_THRESHOLD { f / 1000.0 } else { f };
            let whole = seconds.floor();
            let nanos = ((seconds - whole) * 1e9).round() as u32;
            DateTime::from_timestamp(whole as i64, nanos.min(999_999_999)).map(|dt| dt.naive_utc())
        }
        _ => None,
    }
}

fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f"))
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.naive_utc()))
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coerce_integer() {
        assert_eq!(coerce_value(&json!(30), ColumnType::Integer).unwrap(), json!(30));
        assert_eq!(coerce_value(&json!(30.0), ColumnType::Integer).unwrap(), json!(30));
        assert_eq!(coerce_value(&json!(" 12 "), ColumnType::Integer).unwrap(), json!(12));
        assert!(coerce_value(&json!(30.5), ColumnType::Integer).is_err());
        assert!(coerce_value(&json!("thirty"), ColumnType::Integer).is_err());
        assert!(coerce_value(&json!([1]), ColumnType::Integer).is_err());
    }

    #[test]
    fn test_coerce_float() {
        assert_eq!(coerce_value(&json!(3), ColumnType::Float).unwrap(), json!(3.0));
        assert_eq!(coerce_value(&json!("2.5"), ColumnType::Float).unwrap(), json!(2.5));
        assert!(coerce_value(&json!("inf"), ColumnType::Float).is_err());
    }

    #[test]
    fn test_coerce_boolean() {
        assert_eq!(coerce_value(&json!(1), ColumnType::Boolean).unwrap(), json!(true));
        assert_eq!(coerce_value(&json!(0), ColumnType::Boolean).unwrap(), json!(false));
        assert_eq!(coerce_value(&json!("Yes"), ColumnType::Boolean).unwrap(), json!(true));
        assert!(coerce_value(&json!(2), ColumnType::Boolean).is_err());
        assert!(coerce_value(&json!("maybe"), ColumnType::Boolean).is_err());
    }

    #[test]
    fn test_coerce_timestamp() {
        assert_eq!(
            coerce_value(&json!("2024-01-02 03:04:05"), ColumnType::Timestamp).unwrap(),
            json!("2024-01-02T03:04:05")
        );
        assert_eq!(
            coerce_value(&json!("2024-01-02"), ColumnType::Timestamp).unwrap(),
            json!("2024-01-02T00:00:00")
        );
        assert_eq!(
            coerce_value(&json!("2024-01-02T03:04:05+02:00"), ColumnType::Timestamp).unwrap(),
            json!("2024-01-02T01:04:05")
        );
        assert_eq!(
            coerce_value(&json!(0), ColumnType::Timestamp).unwrap(),
            json!("1970-01-01T00:00:00")
        );
        assert_eq!(
            coerce_value(&json!(86_400_000_000i64), ColumnType::Timestamp).unwrap(),
            json!("1972-09-27T00:00:00")
        );
        assert!(coerce_value(&json!("yesterday"), ColumnType::Timestamp).is_err());
    }

    #[test]
    fn test_coerce_text_requires_string() {
        assert_eq!(coerce_value(&json!("Ana"), ColumnType::Text).unwrap(), json!("Ana"));
        assert!(coerce_value(&json!(5), ColumnType::Text).is_err());
    }

    #[test]
    fn test_coerce_row_rejects_non_object() {
        let model = ValidationModel::default();
        assert!(matches!(
            coerce_row(&json!([1, 2]), &model),
            Err(Text2SqlError::Validation(_))
        ));
    }
}
