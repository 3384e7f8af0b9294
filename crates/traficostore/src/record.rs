//! Traffic-event record model
//!
//! Records come from a third-party geofeed where identifier encodings are
//! not consistent: jam identifiers are predominantly JSON integers while
//! alert identifiers are strings, with exceptions in both populations.
//! The store keys records by their exact stored encoding; bridging
//! encodings is the lookup path's job, not the store's.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

/// The two record populations served by the lookup API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordKind {
    /// Punctual traffic alert (accident, hazard, closure)
    #[serde(rename = "alerta")]
    Alert,

    /// Traffic jam segment
    #[serde(rename = "atasco")]
    Jam,
}

impl RecordKind {
    /// Both kinds, in the order the API lists them
    pub const ALL: [RecordKind; 2] = [RecordKind::Alert, RecordKind::Jam];

    /// Name used in routes, cache keys and artifacts
    pub fn wire_name(&self) -> &'static str {
        match self {
            RecordKind::Alert => "alerta",
            RecordKind::Jam => "atasco",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// A stored identifier in whichever encoding the feed materialized it
///
/// `Int(123)` and `Str("123")` are distinct keys on purpose.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IdentValue {
    /// Integer-encoded identifier (common for jams)
    Int(u64),
    /// String-encoded identifier, possibly hyphen-stripped
    Str(String),
}

impl fmt::Display for IdentValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentValue::Int(n) => write!(f, "{}", n),
            IdentValue::Str(s) => write!(f, "{}", s),
        }
    }
}

impl From<u64> for IdentValue {
    fn from(n: u64) -> Self {
        IdentValue::Int(n)
    }
}

impl From<&str> for IdentValue {
    fn from(s: &str) -> Self {
        IdentValue::Str(s.to_string())
    }
}

/// An immutable traffic event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    /// Application-level identifier, in its stored encoding
    pub uuid: IdentValue,

    /// Record population this event belongs to
    pub kind: RecordKind,

    /// Full source document, kept opaque
    #[serde(default)]
    pub payload: serde_json::Value,

    /// Reporting region (comuna / city), empty when absent
    #[serde(default)]
    pub region: String,

    /// Event timestamp
    pub observed_at: DateTime<Utc>,
}

impl Record {
    /// Build a record from a raw feed document
    ///
    /// The document must carry a `uuid` field (string or integer). The
    /// timestamp comes from the feed's `pubMillis` when present, or an
    /// RFC 3339 `observed_at`, falling back to the load time. The whole
    /// document is retained as the payload.
    pub fn from_doc(kind: RecordKind, doc: &serde_json::Value) -> Result<Record> {
        let uuid = match doc.get("uuid") {
            Some(serde_json::Value::String(s)) => IdentValue::Str(s.clone()),
            Some(serde_json::Value::Number(n)) => match n.as_u64() {
                Some(v) => IdentValue::Int(v),
                None => {
                    return Err(Error::Parse(format!("uuid is not a valid integer: {}", n)))
                }
            },
            _ => return Err(Error::Parse("document has no uuid".to_string())),
        };

        let observed_at = if let Some(ms) = doc.get("pubMillis").and_then(|v| v.as_i64()) {
            Utc.timestamp_millis_opt(ms)
                .single()
                .ok_or_else(|| Error::Parse(format!("pubMillis out of range: {}", ms)))?
        } else if let Some(s) = doc.get("observed_at").and_then(|v| v.as_str()) {
            s.parse::<DateTime<Utc>>()
                .map_err(|e| Error::Parse(format!("bad observed_at: {}", e)))?
        } else {
            Utc::now()
        };

        let region = doc
            .get("comuna")
            .or_else(|| doc.get("city"))
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string();

        Ok(Record {
            uuid,
            kind,
            payload: doc.clone(),
            region,
            observed_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ident_encodings_are_distinct() {
        assert_ne!(IdentValue::Int(123), IdentValue::Str("123".to_string()));
        assert_eq!(IdentValue::from(123u64).to_string(), "123");
        assert_eq!(IdentValue::from("ab-cd").to_string(), "ab-cd");
    }

    #[test]
    fn test_ident_serde_untagged() {
        let int: IdentValue = serde_json::from_str("42").unwrap();
        assert_eq!(int, IdentValue::Int(42));

        let s: IdentValue = serde_json::from_str("\"42\"").unwrap();
        assert_eq!(s, IdentValue::Str("42".to_string()));

        assert_eq!(serde_json::to_string(&IdentValue::Int(42)).unwrap(), "42");
    }

    #[test]
    fn test_record_from_doc_string_uuid() {
        let doc = json!({
            "uuid": "a1b2-c3d4",
            "city": "Providencia",
            "pubMillis": 1714000000000i64,
            "type": "ACCIDENT"
        });

        let record = Record::from_doc(RecordKind::Alert, &doc).unwrap();
        assert_eq!(record.uuid, IdentValue::Str("a1b2-c3d4".to_string()));
        assert_eq!(record.region, "Providencia");
        assert_eq!(record.payload["type"], "ACCIDENT");
    }

    #[test]
    fn test_record_from_doc_int_uuid() {
        let doc = json!({ "uuid": 9876543, "comuna": "Santiago" });

        let record = Record::from_doc(RecordKind::Jam, &doc).unwrap();
        assert_eq!(record.uuid, IdentValue::Int(9876543));
        assert_eq!(record.region, "Santiago");
    }

    #[test]
    fn test_record_from_doc_missing_uuid() {
        let doc = json!({ "city": "Santiago" });
        let result = Record::from_doc(RecordKind::Alert, &doc);
        assert!(matches!(result, Err(Error::Parse(_))));
    }
}
