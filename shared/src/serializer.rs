//! Row normalization
//!
//! Turns driver-native values into things every transport can carry:
//! temporal values become ISO-8601 strings, decimals become `f64`, the rest is
//! left alone. Nothing in here fails; values we do not understand are passed
//! through.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::prelude::ToPrimitive;
use serde_json::{Map, Number, Value};

use crate::database::{SqlRow, SqlValue};

pub const ISO_DATETIME: &str = "%Y-%m-%dT%H:%M:%S%.f";
const ISO_DATE: &str = "%Y-%m-%d";
const ISO_TIME: &str = "%H:%M:%S%.f";

pub fn iso_datetime(value: &NaiveDateTime) -> String {
    value.format(ISO_DATETIME).to_string()
}

fn iso_date(value: &NaiveDate) -> String {
    value.format(ISO_DATE).to_string()
}

fn iso_time(value: &NaiveTime) -> String {
    value.format(ISO_TIME).to_string()
}

pub fn serialize_value(value: SqlValue) -> SqlValue {
    match value {
        SqlValue::DateTime(dt) => SqlValue::Text(iso_datetime(&dt)),
        SqlValue::Date(d) => SqlValue::Text(iso_date(&d)),
        SqlValue::Time(t) => SqlValue::Text(iso_time(&t)),
        SqlValue::Decimal(d) => match d.to_f64() {
            Some(f) => SqlValue::Float(f),
            None => SqlValue::Decimal(d),
        },
        other => other,
    }
}

pub fn serialize_row(row: SqlRow) -> SqlRow {
    row.into_iter()
        .map(|(name, value)| (name, serialize_value(value)))
        .collect()
}

/// One step of the `levels` decoding chain. Each step either transforms the
/// value or hands it back unchanged.
pub type LevelsStep = fn(SqlValue) -> SqlValue;

/// Bytes that are valid UTF-8 become text.
pub fn decode_utf8(value: SqlValue) -> SqlValue {
    match value {
        SqlValue::Bytes(bytes) => match String::from_utf8(bytes) {
            Ok(text) => SqlValue::Text(text),
            Err(err) => SqlValue::Bytes(err.into_bytes()),
        },
        other => other,
    }
}

/// Text that parses as JSON becomes structured JSON.
pub fn parse_json_text(value: SqlValue) -> SqlValue {
    match value {
        SqlValue::Text(text) => match serde_json::from_str::<Value>(&text) {
            Ok(parsed) => SqlValue::Json(parsed),
            Err(_) => SqlValue::Text(text),
        },
        other => other,
    }
}

pub const LEVELS_CHAIN: [LevelsStep; 2] = [decode_utf8, parse_json_text];

pub fn decode_levels(value: SqlValue) -> SqlValue {
    LEVELS_CHAIN.iter().fold(value, |value, step| step(value))
}

/// Apply the `levels` chain to the named column, if the row has it.
pub fn decode_levels_column(mut row: SqlRow, column: &str) -> SqlRow {
    if let Some(value) = row.take(column) {
        row.insert(column, decode_levels(value));
    }
    row
}

/// JSON view of a value. Temporal and decimal values are normalized on the
/// way out even if `serialize_value` was skipped.
pub fn to_json(value: SqlValue) -> Value {
    match value {
        SqlValue::Null => Value::Null,
        SqlValue::Bool(b) => Value::Bool(b),
        SqlValue::Int(i) => Value::from(i),
        SqlValue::UInt(u) => Value::from(u),
        SqlValue::Float(f) => Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
        SqlValue::Decimal(d) => match d.to_f64().and_then(Number::from_f64) {
            Some(n) => Value::Number(n),
            None => Value::String(d.to_string()),
        },
        SqlValue::Text(s) => Value::String(s),
        SqlValue::Bytes(bytes) => Value::Array(bytes.into_iter().map(Value::from).collect()),
        SqlValue::Json(json) => json,
        SqlValue::DateTime(dt) => Value::String(iso_datetime(&dt)),
        SqlValue::Date(d) => Value::String(iso_date(&d)),
        SqlValue::Time(t) => Value::String(iso_time(&t)),
    }
}

pub fn to_json_object(row: SqlRow) -> Map<String, Value> {
    row.into_iter()
        .map(|(name, value)| (name, to_json(value)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use serde_json::json;
    use std::str::FromStr;

    fn datetime(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f").unwrap()
    }

    #[test]
    fn test_datetime_becomes_iso_string() {
        let value = serialize_value(SqlValue::DateTime(datetime("2024-03-05 09:15:00")));
        assert_eq!(value, SqlValue::Text("2024-03-05T09:15:00".to_string()));
    }

    #[test]
    fn test_datetime_round_trip() {
        for raw in ["2024-03-05 09:15:00", "1999-12-31 23:59:59.123456", "2024-02-29 00:00:00.5"] {
            let original = datetime(raw);
            let SqlValue::Text(iso) = serialize_value(SqlValue::DateTime(original)) else {
                panic!("expected text");
            };
            let parsed = NaiveDateTime::parse_from_str(&iso, ISO_DATETIME).unwrap();
            assert_eq!(parsed, original);
        }
    }

    #[test]
    fn test_date_and_time() {
        let d = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let t = NaiveTime::from_hms_opt(3, 4, 5).unwrap();
        assert_eq!(serialize_value(SqlValue::Date(d)), SqlValue::Text("2024-01-02".into()));
        assert_eq!(serialize_value(SqlValue::Time(t)), SqlValue::Text("03:04:05".into()));
    }

    #[test]
    fn test_decimal_becomes_float() {
        let value = serialize_value(SqlValue::Decimal(Decimal::from_str("48123.55").unwrap()));
        assert_eq!(value, SqlValue::Float(48123.55));
    }

    #[test]
    fn test_other_values_pass_through() {
        for value in [
            SqlValue::Null,
            SqlValue::Int(-4),
            SqlValue::UInt(7),
            SqlValue::Bool(true),
            SqlValue::Text("NSE".into()),
            SqlValue::Bytes(vec![0xff, 0x00]),
            SqlValue::Json(json!({"a": 1})),
        ] {
            assert_eq!(serialize_value(value.clone()), value);
        }
    }

    #[test]
    fn test_serialize_row_keeps_order_and_nulls() {
        let row = SqlRow::new()
            .with("timestamp", SqlValue::DateTime(datetime("2024-03-05 09:15:00")))
            .with("close", SqlValue::Decimal(Decimal::from_str("1.5").unwrap()))
            .with("exchange", SqlValue::Null);
        let out = serialize_row(row);
        let pairs: Vec<(&str, &SqlValue)> = out.columns().collect();
        assert_eq!(pairs[0], ("timestamp", &SqlValue::Text("2024-03-05T09:15:00".into())));
        assert_eq!(pairs[1], ("close", &SqlValue::Float(1.5)));
        assert_eq!(pairs[2], ("exchange", &SqlValue::Null));
    }

    #[test]
    fn test_levels_json_string_is_parsed() {
        let out = decode_levels(SqlValue::Text(r#"{"a":1}"#.into()));
        assert_eq!(out, SqlValue::Json(json!({"a": 1})));
    }

    #[test]
    fn test_levels_json_bytes_are_parsed() {
        let out = decode_levels(SqlValue::Bytes(br#"[{"price":101.5,"buy":3}]"#.to_vec()));
        assert_eq!(out, SqlValue::Json(json!([{"price": 101.5, "buy": 3}])));
    }

    #[test]
    fn test_levels_not_json_stays_text() {
        let out = decode_levels(SqlValue::Text("not json".into()));
        assert_eq!(out, SqlValue::Text("not json".into()));
    }

    #[test]
    fn test_levels_utf8_text_that_is_not_json() {
        let out = decode_levels(SqlValue::Bytes(b"plain".to_vec()));
        assert_eq!(out, SqlValue::Text("plain".into()));
    }

    #[test]
    fn test_levels_invalid_utf8_stays_bytes() {
        let out = decode_levels(SqlValue::Bytes(vec![0xc3, 0x28]));
        assert_eq!(out, SqlValue::Bytes(vec![0xc3, 0x28]));
    }

    #[test]
    fn test_levels_structured_and_null_untouched() {
        assert_eq!(decode_levels(SqlValue::Json(json!([1, 2]))), SqlValue::Json(json!([1, 2])));
        assert_eq!(decode_levels(SqlValue::Null), SqlValue::Null);
    }

    #[test]
    fn test_decode_levels_column_missing_is_noop() {
        let row = SqlRow::new().with("poc", SqlValue::Float(1.0));
        assert_eq!(decode_levels_column(row.clone(), "levels"), row);
    }

    #[test]
    fn test_to_json_object() {
        let row = SqlRow::new()
            .with("fp_id", SqlValue::Int(3))
            .with("levels", SqlValue::Bytes(vec![1, 2]))
            .with("poc", SqlValue::Float(f64::NAN));
        let obj = to_json_object(row);
        assert_eq!(obj["fp_id"], json!(3));
        assert_eq!(obj["levels"], json!([1, 2]));
        assert_eq!(obj["poc"], Value::Null);
    }
}
