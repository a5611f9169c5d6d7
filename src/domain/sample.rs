// Sample and merged-row domain models
use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use serde::de::{Deserialize, Deserializer, Error as _};
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;

/// Alignment key of a row: epoch millis, or an hour/day/month index.
pub type BucketKey = i64;

/// One row as reported by the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub key: BucketKey,
    pub values: BTreeMap<String, f64>,
    pub tag: Option<String>,
}

impl Sample {
    #[cfg(test)]
    pub fn new(key: BucketKey) -> Self {
        Self {
            key,
            values: BTreeMap::new(),
            tag: None,
        }
    }

    #[cfg(test)]
    pub fn with_value(mut self, field: &str, value: f64) -> Self {
        self.values.insert(field.to_string(), value);
        self
    }

    #[cfg(test)]
    pub fn with_tag(mut self, tag: &str) -> Self {
        self.tag = Some(tag.to_lowercase());
        self
    }

    pub fn value(&self, field: &str) -> Option<f64> {
        self.values.get(field).copied()
    }

    /// Move a field to a new name, e.g. `kWh` -> `verbruik`.
    pub fn rename(mut self, from: &str, to: &str) -> Self {
        if let Some(value) = self.values.remove(from) {
            self.values.insert(to.to_string(), value);
        }
        self
    }

    /// Parse a backend row. Rows without a usable bucket key yield `None`;
    /// non-numeric fields are left out rather than rejected.
    pub fn from_json(row: &Value, key_field: &str, tag_field: Option<&str>) -> Option<Self> {
        let object = row.as_object()?;
        let key = parse_bucket_key(object.get(key_field)?)?;

        let values = object
            .iter()
            .filter(|(name, _)| name.as_str() != key_field)
            .filter_map(|(name, value)| value.as_f64().map(|v| (name.clone(), v)))
            .collect();

        let tag = tag_field
            .and_then(|field| object.get(field))
            .and_then(Value::as_str)
            .map(str::to_lowercase);

        Some(Self { key, values, tag })
    }
}

/// Accepts JSON numbers (epoch millis or indexes), RFC 3339 timestamps and
/// ISO timestamps without offset, which are read as local time.
pub fn parse_bucket_key(value: &Value) -> Option<BucketKey> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
        Value::String(s) => s
            .parse::<i64>()
            .ok()
            .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|t| t.timestamp_millis()))
            .or_else(|| local_timestamp_millis(s)),
        _ => None,
    }
}

fn local_timestamp_millis(s: &str) -> Option<BucketKey> {
    let naive = s.parse::<NaiveDateTime>().ok()?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|t| t.timestamp_millis())
}

/// Serde adapter for timestamp fields in any format [`parse_bucket_key`]
/// understands.
pub fn deserialize_timestamp<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BucketKey, D::Error> {
    let value = Value::deserialize(deserializer)?;
    parse_bucket_key(&value).ok_or_else(|| D::Error::custom(format!("invalid timestamp: {}", value)))
}

/// One output row of the reshaping stage.
///
/// Fields that were never reported stay absent; they are omitted when the row
/// is serialized instead of showing up as `0` or `null`.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedRow {
    pub key_field: &'static str,
    pub key: BucketKey,
    pub fields: BTreeMap<String, f64>,
}

impl MergedRow {
    pub fn new(key_field: &'static str, key: BucketKey) -> Self {
        Self {
            key_field,
            key,
            fields: BTreeMap::new(),
        }
    }

    #[cfg(test)]
    pub fn with_field(mut self, column: &str, value: f64) -> Self {
        self.set(column, value);
        self
    }

    pub fn set(&mut self, column: &str, value: f64) {
        self.fields.insert(column.to_string(), value);
    }

    pub fn get(&self, column: &str) -> Option<f64> {
        self.fields.get(column).copied()
    }
}

impl Serialize for MergedRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len() + 1))?;
        map.serialize_entry(self.key_field, &self.key)?;
        for (column, value) in &self.fields {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}
