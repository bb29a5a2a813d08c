//! Flat records and cursor markers.
//!
//! A `Record` is one row emitted by a connector: a flat JSON object that
//! always carries its owning ticker under the `"ticker"` field. A `Marker`
//! is the per-ticker progress value extracted from a record's cursor field —
//! either a calendar date (price history) or a sequence index (intraday).

use chrono::NaiveDate;
use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Field name under which every record carries its owning ticker.
pub const TICKER_FIELD: &str = "ticker";

/// One flat record emitted by a connector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: Map<String, Value>,
}

impl Record {
    /// Build a record from a parsed JSON object, stamping the owning ticker.
    /// An existing `"ticker"` field is overwritten with the stamp.
    pub fn from_object(mut fields: Map<String, Value>, ticker: &str) -> Self {
        fields.insert(TICKER_FIELD.to_string(), Value::String(ticker.to_string()));
        Self { fields }
    }

    /// A minimal record carrying only the ticker field.
    pub fn from_ticker(ticker: &str) -> Self {
        Self::from_object(Map::new(), ticker)
    }

    /// The owning ticker. Present by construction; empty only if a record
    /// was deserialized from a source that lost the stamp.
    pub fn ticker(&self) -> &str {
        self.fields
            .get(TICKER_FIELD)
            .and_then(Value::as_str)
            .unwrap_or("")
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn set(&mut self, field: &str, value: Value) {
        self.fields.insert(field.to_string(), value);
    }

    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.fields.remove(field)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Extract the marker stored under `field`, if present and parseable.
    pub fn marker(&self, field: &str) -> Option<Marker> {
        self.fields.get(field).and_then(Marker::from_value)
    }
}

/// Per-ticker sync progress marker.
///
/// All records of one stream carry the same marker kind, so the derived
/// ordering (dates with dates, sequence ids with sequence ids) is the only
/// comparison that ever happens in practice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Marker {
    /// Calendar-date marker (e.g. a bar's trading date).
    Date(NaiveDate),
    /// Monotonically increasing sequence index.
    Seq(i64),
}

impl Marker {
    /// The minimum date marker — seeds a fresh date-cursored sync.
    pub fn epoch_date() -> Self {
        Marker::Date(NaiveDate::from_ymd_opt(1970, 1, 1).unwrap())
    }

    /// The minimum sequence marker — seeds a fresh sequence-cursored sync.
    /// Starts below zero so record id 0 is admitted.
    pub fn seq_start() -> Self {
        Marker::Seq(-1)
    }

    /// Parse a marker out of a JSON value.
    ///
    /// Integers become sequence markers. Strings are read as ISO dates,
    /// tolerating a trailing time component (`"2024-01-02T00:00:00.000Z"`).
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().map(Marker::Seq),
            Value::String(s) => {
                let date_part = s.get(..10).unwrap_or(s.as_str());
                NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
                    .ok()
                    .map(Marker::Date)
            }
            _ => None,
        }
    }
}

impl std::fmt::Display for Marker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Marker::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Marker::Seq(n) => write!(f, "{n}"),
        }
    }
}

// Wire shape: an ISO date string or a bare integer, matching the persisted
// state handed back to `restore()` between runs.
impl Serialize for Marker {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Marker::Date(d) => serializer.serialize_str(&d.format("%Y-%m-%d").to_string()),
            Marker::Seq(n) => serializer.serialize_i64(*n),
        }
    }
}

impl<'de> Deserialize<'de> for Marker {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Marker::from_value(&value)
            .ok_or_else(|| D::Error::custom(format!("invalid cursor marker: {value}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(v: Value) -> Map<String, Value> {
        v.as_object().unwrap().clone()
    }

    #[test]
    fn record_is_stamped_with_ticker() {
        let rec = Record::from_object(object(json!({"open": 24.5, "close": 25.0})), "TCB");
        assert_eq!(rec.ticker(), "TCB");
        assert_eq!(rec.get("open"), Some(&json!(24.5)));
    }

    #[test]
    fn stamp_overwrites_existing_ticker_field() {
        let rec = Record::from_object(object(json!({"ticker": "WRONG"})), "VVS");
        assert_eq!(rec.ticker(), "VVS");
    }

    #[test]
    fn marker_from_integer_field() {
        let rec = Record::from_object(object(json!({"id": 417})), "XDC");
        assert_eq!(rec.marker("id"), Some(Marker::Seq(417)));
    }

    #[test]
    fn marker_from_date_field_with_time_suffix() {
        let rec = Record::from_object(
            object(json!({"tradingDate": "2024-01-02T00:00:00.000Z"})),
            "TCB",
        );
        assert_eq!(
            rec.marker("tradingDate"),
            Some(Marker::Date(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()))
        );
    }

    #[test]
    fn marker_missing_or_unparseable_is_none() {
        let rec = Record::from_object(object(json!({"tradingDate": "not a date"})), "TCB");
        assert_eq!(rec.marker("tradingDate"), None);
        assert_eq!(rec.marker("absent"), None);
    }

    #[test]
    fn markers_order_within_kind() {
        let d1 = Marker::Date(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        let d2 = Marker::Date(NaiveDate::from_ymd_opt(2024, 1, 3).unwrap());
        assert!(d1 < d2);
        assert!(Marker::Seq(3) < Marker::Seq(10));
        assert!(Marker::seq_start() < Marker::Seq(0));
    }

    #[test]
    fn marker_wire_shapes() {
        let date = Marker::Date(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(serde_json::to_value(date).unwrap(), json!("2024-01-02"));
        assert_eq!(serde_json::to_value(Marker::Seq(42)).unwrap(), json!(42));

        let back: Marker = serde_json::from_value(json!("2024-01-02")).unwrap();
        assert_eq!(back, date);
        let back: Marker = serde_json::from_value(json!(42)).unwrap();
        assert_eq!(back, Marker::Seq(42));
    }
}
