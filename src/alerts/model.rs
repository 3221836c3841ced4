//! Alert document type

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Status assigned to alerts written without one
pub const DEFAULT_STATUS: &str = "Open";

/// Unix seconds of `0001-01-01T00:00:00Z`, the zero instant older
/// collaborators write for an unset time.
const LEGACY_ZERO_UNIX_SECS: i64 = -62_135_596_800;

/// Alert document stored under its ID
///
/// Fields other than `ID`, `Status` and `Time` are kept opaque and survive
/// a trip through storage unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    /// Unique key, supplied by the caller
    #[serde(rename = "ID")]
    pub id: String,
    /// Lifecycle status, `"Open"` when left empty
    #[serde(rename = "Status", default)]
    pub status: String,
    /// Time the alert was raised, filled with now when unset
    ///
    /// Kept with the offset it was written in.
    #[serde(
        rename = "Time",
        default,
        skip_serializing_if = "Option::is_none",
        with = "rfc3339"
    )]
    pub time: Option<DateTime<FixedOffset>>,
    /// Caller-defined fields
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Alert {
    /// Create an alert with empty status and unset time
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: String::new(),
            time: None,
            extra: serde_json::Map::new(),
        }
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }

    pub fn with_time(mut self, time: DateTime<FixedOffset>) -> Self {
        self.time = Some(time);
        self
    }

    /// Attach a caller-defined field
    pub fn with_field(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra.insert(name.into(), value);
        self
    }

    /// Whether the time is unset or the legacy zero instant
    pub fn has_zero_time(&self) -> bool {
        match self.time {
            None => true,
            Some(t) => t.timestamp() == LEGACY_ZERO_UNIX_SECS && t.timestamp_subsec_nanos() == 0,
        }
    }

    /// Fill the write-time defaults: now for a zero time, `"Open"` for an
    /// empty status.
    pub fn fill_defaults(&mut self, now: DateTime<FixedOffset>) {
        if self.has_zero_time() {
            self.time = Some(now);
        }
        if self.status.is_empty() {
            self.status = DEFAULT_STATUS.to_string();
        }
    }
}

/// RFC 3339 with `Z` for a zero offset and the written offset otherwise
mod rfc3339 {
    use chrono::{DateTime, FixedOffset, SecondsFormat};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(
        time: &Option<DateTime<FixedOffset>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match time {
            Some(t) => serializer.serialize_str(&t.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<FixedOffset>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<DateTime<FixedOffset>>::deserialize(deserializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<FixedOffset> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap().fixed_offset()
    }

    #[test]
    fn test_fill_defaults() {
        let now = utc(2024, 5, 1, 12, 0, 0);
        let mut alert = Alert::new("x1");
        alert.fill_defaults(now);

        assert_eq!(alert.status, "Open");
        assert_eq!(alert.time, Some(now));
    }

    #[test]
    fn test_fill_defaults_keeps_set_values() {
        let raised = utc(2023, 1, 2, 3, 4, 5);
        let now = utc(2024, 5, 1, 12, 0, 0);
        let mut alert = Alert::new("x2").with_status("Closed").with_time(raised);
        alert.fill_defaults(now);

        assert_eq!(alert.status, "Closed");
        assert_eq!(alert.time, Some(raised));
    }

    #[test]
    fn test_legacy_zero_time_is_zero() {
        let alert: Alert =
            serde_json::from_str(r#"{"ID":"a","Status":"","Time":"0001-01-01T00:00:00Z"}"#)
                .unwrap();
        assert!(alert.has_zero_time());

        let alert = Alert::new("a").with_time(utc(2020, 1, 1, 0, 0, 0));
        assert!(!alert.has_zero_time());
    }

    #[test]
    fn test_field_names_and_extras() {
        let raw = r#"{"ID":"db-1","Status":"Acked","Time":"2024-05-01T12:00:00Z","Service":"db","Count":3}"#;
        let alert: Alert = serde_json::from_str(raw).unwrap();

        assert_eq!(alert.id, "db-1");
        assert_eq!(alert.status, "Acked");
        assert_eq!(alert.extra.get("Service"), Some(&serde_json::json!("db")));
        assert_eq!(alert.extra.get("Count"), Some(&serde_json::json!(3)));

        let encoded = serde_json::to_value(&alert).unwrap();
        assert_eq!(encoded["ID"], "db-1");
        assert_eq!(encoded["Service"], "db");
        assert_eq!(encoded["Time"], "2024-05-01T12:00:00Z");
    }

    #[test]
    fn test_missing_status_and_time_deserialize() {
        let alert: Alert = serde_json::from_str(r#"{"ID":"only-id"}"#).unwrap();
        assert_eq!(alert, Alert::new("only-id"));
    }

    #[test]
    fn test_time_offset_round_trips() {
        let raw = r#"{"ID":"tz","Status":"Open","Time":"2024-01-01T10:00:00+02:00"}"#;
        let alert: Alert = serde_json::from_str(raw).unwrap();

        let encoded = serde_json::to_value(&alert).unwrap();
        assert_eq!(encoded["Time"], "2024-01-01T10:00:00+02:00");

        let mut filled = alert.clone();
        filled.fill_defaults(utc(2030, 1, 1, 0, 0, 0));
        assert_eq!(filled, alert);
    }
}
