use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Accept a string, a number or null where we expect text. Timestamps are
/// usually DATETIME columns but some tables keep them as epoch numbers.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandleRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exchange: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub time_frame: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub open: Option<f64>,
    #[serde(default)]
    pub high: Option<f64>,
    #[serde(default)]
    pub low: Option<f64>,
    #[serde(default)]
    pub close: Option<f64>,
    #[serde(default)]
    pub volume: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VolumeFootprintRow {
    #[serde(default)]
    pub fp_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exchange: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub time_frame: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub poc: Option<f64>,
    #[serde(default)]
    pub vah: Option<f64>,
    #[serde(default)]
    pub val: Option<f64>,
    #[serde(default)]
    pub volume_delta: Option<f64>,
    /// Structured JSON when it decoded, otherwise the raw text or bytes.
    #[serde(default)]
    pub levels: Option<Value>,
    #[serde(default)]
    pub total_fp_volume: Option<f64>,
    #[serde(default)]
    pub volume_diff: Option<f64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub created_at: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CvdRow {
    #[serde(default)]
    pub cvd_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exchange: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub time_frame: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub open: Option<f64>,
    #[serde(default)]
    pub high: Option<f64>,
    #[serde(default)]
    pub low: Option<f64>,
    #[serde(default)]
    pub close: Option<f64>,
    // Chart colours, stored as ints or hex strings depending on the writer.
    #[serde(default)]
    pub ohlc_color: Option<Value>,
    #[serde(default)]
    pub wick_color: Option<Value>,
    #[serde(default)]
    pub border_color: Option<Value>,
}

/// EMA values keep their digit-leading column names (`20_ema`) and also get
/// `_20_ema` style copies for encoders that reject such field names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmaRow {
    #[serde(default)]
    pub e_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exchange: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub time_frame: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub timestamp: Option<String>,
    #[serde(default, rename = "20_ema")]
    pub ema_20: Option<f64>,
    #[serde(default, rename = "50_ema")]
    pub ema_50: Option<f64>,
    #[serde(default, rename = "100_ema")]
    pub ema_100: Option<f64>,
    #[serde(default, rename = "200_ema")]
    pub ema_200: Option<f64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub date_time: Option<String>,
    #[serde(default, rename = "_20_ema")]
    pub ema_20_alias: Option<f64>,
    #[serde(default, rename = "_50_ema")]
    pub ema_50_alias: Option<f64>,
    #[serde(default, rename = "_100_ema")]
    pub ema_100_alias: Option<f64>,
    #[serde(default, rename = "_200_ema")]
    pub ema_200_alias: Option<f64>,
}

impl EmaRow {
    /// Copy every `N_ema` value into its `_N_ema` twin.
    pub fn with_underscore_aliases(mut self) -> Self {
        self.ema_20_alias = self.ema_20;
        self.ema_50_alias = self.ema_50;
        self.ema_100_alias = self.ema_100;
        self.ema_200_alias = self.ema_200;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_candle_without_exchange_omits_field() {
        let row: CandleRow = serde_json::from_value(json!({
            "symbol": "BANKNIFTY1!",
            "time_frame": "30m",
            "timestamp": "2024-03-05T09:15:00",
            "open": 1.0, "high": 2.0, "low": 0.5, "close": 1.5, "volume": 100
        }))
        .unwrap();
        let out = serde_json::to_value(&row).unwrap();
        assert!(out.get("exchange").is_none());
        assert_eq!(out["volume"], json!(100.0));
    }

    #[test]
    fn test_null_exchange_is_omitted_but_value_kept() {
        let row: CvdRow = serde_json::from_value(json!({"exchange": "NSE", "cvd_id": 4})).unwrap();
        assert_eq!(serde_json::to_value(&row).unwrap()["exchange"], json!("NSE"));
    }

    #[test]
    fn test_numeric_timestamp_is_stringified() {
        let row: CandleRow = serde_json::from_value(json!({"timestamp": 1709630100})).unwrap();
        assert_eq!(row.timestamp.as_deref(), Some("1709630100"));
    }

    #[test]
    fn test_footprint_levels_any_shape() {
        for levels in [json!({"a": 1}), json!("not json"), json!([104, 105]), Value::Null] {
            let row: VolumeFootprintRow =
                serde_json::from_value(json!({"fp_id": 1, "levels": levels.clone()})).unwrap();
            let out = serde_json::to_value(&row).unwrap();
            assert_eq!(out["levels"], levels);
        }
    }

    #[test]
    fn test_ema_aliases() {
        let row: EmaRow = serde_json::from_value(json!({
            "e_id": 9, "20_ema": 10.5, "50_ema": 11.0, "100_ema": 12.0, "200_ema": null
        }))
        .unwrap();
        let out = serde_json::to_value(row.with_underscore_aliases()).unwrap();
        assert_eq!(out["20_ema"], json!(10.5));
        assert_eq!(out["_20_ema"], json!(10.5));
        assert_eq!(out["_50_ema"], json!(11.0));
        assert_eq!(out["_100_ema"], json!(12.0));
        assert_eq!(out["200_ema"], Value::Null);
        assert_eq!(out["_200_ema"], Value::Null);
    }

    #[test]
    fn test_text_in_price_column_is_rejected() {
        let err = serde_json::from_value::<CandleRow>(json!({"open": "abc"}));
        assert!(err.is_err());
    }
}
