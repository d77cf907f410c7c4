//! Response envelope: `{start_timestamp, end_timestamp, count, <key>: rows}`.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::models::{CandleRow, CvdRow, EmaRow, VolumeFootprintRow};

const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A row type that can be wrapped in an [`Envelope`].
pub trait EnvelopeRow: Serialize {
    /// Name of the list field in the envelope.
    const KEY: &'static str;

    fn timestamp(&self) -> Option<&str>;
}

impl EnvelopeRow for CandleRow {
    const KEY: &'static str = "candles";

    fn timestamp(&self) -> Option<&str> {
        self.timestamp.as_deref()
    }
}

impl EnvelopeRow for VolumeFootprintRow {
    const KEY: &'static str = "footprints";

    fn timestamp(&self) -> Option<&str> {
        self.timestamp.as_deref()
    }
}

impl EnvelopeRow for CvdRow {
    const KEY: &'static str = "cvd";

    fn timestamp(&self) -> Option<&str> {
        self.timestamp.as_deref()
    }
}

impl EnvelopeRow for EmaRow {
    const KEY: &'static str = "ema";

    fn timestamp(&self) -> Option<&str> {
        self.timestamp.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Envelope<T> {
    pub start_timestamp: Option<String>,
    pub end_timestamp: Option<String>,
    pub count: usize,
    pub rows: Vec<T>,
}

impl<T: EnvelopeRow> Envelope<T> {
    /// `rows` must already be in ascending time order.
    pub fn new(rows: Vec<T>) -> Self {
        let start_timestamp = rows.first().and_then(|row| display_timestamp(row.timestamp()));
        let end_timestamp = rows.last().and_then(|row| display_timestamp(row.timestamp()));
        Self {
            start_timestamp,
            end_timestamp,
            count: rows.len(),
            rows,
        }
    }
}

impl<T: EnvelopeRow> Serialize for Envelope<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(4))?;
        map.serialize_entry("start_timestamp", &self.start_timestamp)?;
        map.serialize_entry("end_timestamp", &self.end_timestamp)?;
        map.serialize_entry("count", &self.count)?;
        map.serialize_entry(T::KEY, &self.rows)?;
        map.end()
    }
}

/// Reformat an ISO-8601 timestamp as `YYYY-MM-DD HH:MM:SS`. Input we cannot
/// parse is returned as is; empty input gives `None`.
pub fn display_timestamp(value: Option<&str>) -> Option<String> {
    let value = value.filter(|v| !v.is_empty())?;
    Some(parse_iso(value).map_or_else(
        || value.to_string(),
        |dt| dt.format(DISPLAY_FORMAT).to_string(),
    ))
}

fn parse_iso(value: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_local());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt);
        }
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%:z"] {
        if let Ok(dt) = DateTime::parse_from_str(value, format) {
            return Some(dt.naive_local());
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}
