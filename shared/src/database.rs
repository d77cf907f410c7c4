use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use sqlx::mysql::{MySqlColumn, MySqlConnectOptions, MySqlPoolOptions, MySqlRow};
use sqlx::{Column, MySqlPool, Row, TypeInfo};
use tracing::{debug, info};

use crate::config::DatabaseConfig;

pub type DbPool = MySqlPool;

pub async fn get_pool(config: &DatabaseConfig) -> Result<DbPool> {
    info!(
        "Connecting to database at: {}:{}/{}",
        config.host, config.port, config.database
    );
    let options = MySqlConnectOptions::new()
        .host(&config.host)
        .port(config.port)
        .username(&config.user)
        .password(&config.password)
        .database(&config.database)
        .charset("utf8mb4");
    let pool = MySqlPoolOptions::new()
        .max_connections(config.max_connections)
        .connect_with(options)
        .await?;
    Ok(pool)
}

/// A value bound to a `?` placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Text(String),
    Int(i64),
}

/// A column value as the driver handed it to us.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Decimal(Decimal),
    Text(String),
    Bytes(Vec<u8>),
    Json(serde_json::Value),
    DateTime(NaiveDateTime),
    Date(NaiveDate),
    Time(NaiveTime),
}

/// One result row, columns kept in select order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SqlRow {
    columns: Vec<(String, SqlValue)>,
}

impl SqlRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&SqlValue> {
        self.columns.iter().find(|(key, _)| key == name).map(|(_, value)| value)
    }

    /// Replace the value of an existing column, or append a new one.
    pub fn insert(&mut self, name: impl Into<String>, value: SqlValue) {
        let name = name.into();
        match self.columns.iter_mut().find(|(key, _)| *key == name) {
            Some((_, slot)) => *slot = value,
            None => self.columns.push((name, value)),
        }
    }

    /// Builder-style `insert`.
    pub fn with(mut self, name: impl Into<String>, value: SqlValue) -> Self {
        self.insert(name, value);
        self
    }

    pub fn take(&mut self, name: &str) -> Option<SqlValue> {
        let index = self.columns.iter().position(|(key, _)| key == name)?;
        Some(std::mem::replace(&mut self.columns[index].1, SqlValue::Null))
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &SqlValue)> {
        self.columns.iter().map(|(key, value)| (key.as_str(), value))
    }
}

impl IntoIterator for SqlRow {
    type Item = (String, SqlValue);
    type IntoIter = std::vec::IntoIter<(String, SqlValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.columns.into_iter()
    }
}

impl FromIterator<(String, SqlValue)> for SqlRow {
    fn from_iter<I: IntoIterator<Item = (String, SqlValue)>>(iter: I) -> Self {
        Self {
            columns: iter.into_iter().collect(),
        }
    }
}

/// Executes one read statement and hands back every row.
#[async_trait]
pub trait Gateway: Send + Sync {
    async fn fetch_all(&self, sql: &str, params: &[SqlParam]) -> Result<Vec<SqlRow>, sqlx::Error>;
}

pub struct MySqlGateway {
    pool: DbPool,
}

impl MySqlGateway {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Gateway for MySqlGateway {
    async fn fetch_all(&self, sql: &str, params: &[SqlParam]) -> Result<Vec<SqlRow>, sqlx::Error> {
        // Returned to the pool when dropped, whichever way we leave.
        let mut conn = self.pool.acquire().await?;

        let mut query = sqlx::query(sql);
        for param in params {
            query = match param {
                SqlParam::Text(value) => query.bind(value.as_str()),
                SqlParam::Int(value) => query.bind(*value),
            };
        }

        let rows = query.fetch_all(&mut *conn).await?;
        Ok(rows.iter().map(decode_row).collect())
    }
}

fn decode_row(row: &MySqlRow) -> SqlRow {
    row.columns()
        .iter()
        .map(|column| (column.name().to_string(), decode_column(row, column)))
        .collect()
}

fn decode_column(row: &MySqlRow, column: &MySqlColumn) -> SqlValue {
    let index = column.ordinal();
    let type_name = column.type_info().name();

    let decoded = match type_name {
        "BOOLEAN" => row
            .try_get::<Option<bool>, _>(index)
            .map(|v| v.map(SqlValue::Bool)),
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => row
            .try_get::<Option<i64>, _>(index)
            .map(|v| v.map(SqlValue::Int)),
        name if name.ends_with("UNSIGNED") => row
            .try_get::<Option<u64>, _>(index)
            .map(|v| v.map(SqlValue::UInt)),
        "FLOAT" => row
            .try_get::<Option<f32>, _>(index)
            .map(|v| v.map(|f| SqlValue::Float(f64::from(f)))),
        "DOUBLE" => row
            .try_get::<Option<f64>, _>(index)
            .map(|v| v.map(SqlValue::Float)),
        "DECIMAL" => row
            .try_get::<Option<Decimal>, _>(index)
            .map(|v| v.map(SqlValue::Decimal)),
        "DATETIME" => row
            .try_get::<Option<NaiveDateTime>, _>(index)
            .map(|v| v.map(SqlValue::DateTime)),
        // sqlx only maps TIMESTAMP onto the UTC type.
        "TIMESTAMP" => row
            .try_get::<Option<DateTime<Utc>>, _>(index)
            .map(|v| v.map(|dt| SqlValue::DateTime(dt.naive_utc()))),
        "DATE" => row
            .try_get::<Option<NaiveDate>, _>(index)
            .map(|v| v.map(SqlValue::Date)),
        "TIME" => row
            .try_get::<Option<NaiveTime>, _>(index)
            .map(|v| v.map(SqlValue::Time)),
        "JSON" => row
            .try_get::<Option<serde_json::Value>, _>(index)
            .map(|v| v.map(SqlValue::Json)),
        "BINARY" | "VARBINARY" | "TINYBLOB" | "BLOB" | "MEDIUMBLOB" | "LONGBLOB" => row
            .try_get::<Option<Vec<u8>>, _>(index)
            .map(|v| v.map(SqlValue::Bytes)),
        "CHAR" | "VARCHAR" | "TINYTEXT" | "TEXT" | "MEDIUMTEXT" | "LONGTEXT" | "ENUM" | "SET" => row
            .try_get::<Option<String>, _>(index)
            .map(|v| v.map(SqlValue::Text)),
        _ => return decode_fallback(row, index, type_name),
    };

    match decoded {
        Ok(Some(value)) => value,
        Ok(None) => SqlValue::Null,
        Err(_) => decode_fallback(row, index, type_name),
    }
}

/// Unknown or mismatched column types: keep whatever the driver gives us.
fn decode_fallback(row: &MySqlRow, index: usize, type_name: &str) -> SqlValue {
    if let Ok(value) = row.try_get_unchecked::<Option<String>, _>(index) {
        return value.map(SqlValue::Text).unwrap_or(SqlValue::Null);
    }
    if let Ok(value) = row.try_get_unchecked::<Option<Vec<u8>>, _>(index) {
        return value.map(SqlValue::Bytes).unwrap_or(SqlValue::Null);
    }
    debug!("Could not decode column {} of type {}, returning null", index, type_name);
    SqlValue::Null
}
