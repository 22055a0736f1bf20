use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use crate::stamp::{format_timestamp, stamp_at};

/// Result of one cycle: either a converted document or the reason it failed.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Available { payload: Value },
    Unavailable { error: String },
}

/// Immutable record of one fetch-convert cycle.
///
/// The timestamp is taken when the reading is constructed, i.e. once the
/// outcome is final. For available readings the same instant is injected
/// into the payload's `timestamp` field.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    timestamp: DateTime<Utc>,
    source_url: String,
    outcome: Outcome,
}

impl Reading {
    /// A successful reading. `payload` is stamped with the reading time.
    pub fn available(source_url: impl Into<String>, payload: Value) -> Self {
        Self::available_at(source_url, payload, Utc::now())
    }

    pub fn available_at(source_url: impl Into<String>, payload: Value, at: DateTime<Utc>) -> Self {
        Self {
            timestamp: at,
            source_url: source_url.into(),
            outcome: Outcome::Available {
                payload: stamp_at(payload, at),
            },
        }
    }

    /// A failed reading carrying a human-readable cause.
    pub fn unavailable(source_url: impl Into<String>, error: impl Into<String>) -> Self {
        Self::unavailable_at(source_url, error, Utc::now())
    }

    pub fn unavailable_at(
        source_url: impl Into<String>,
        error: impl Into<String>,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            timestamp: at,
            source_url: source_url.into(),
            outcome: Outcome::Unavailable {
                error: error.into(),
            },
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn timestamp_iso(&self) -> String {
        format_timestamp(self.timestamp)
    }

    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    pub fn is_available(&self) -> bool {
        matches!(self.outcome, Outcome::Available { .. })
    }

    pub fn payload(&self) -> Option<&Value> {
        match &self.outcome {
            Outcome::Available { payload } => Some(payload),
            Outcome::Unavailable { .. } => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Available { .. } => None,
            Outcome::Unavailable { error } => Some(error),
        }
    }

    /// JSON written to the snapshot file.
    ///
    /// Available: the stamped payload. Unavailable:
    /// `{ "timestamp", "is_available": false, "error" }`.
    pub fn snapshot(&self) -> Value {
        match &self.outcome {
            Outcome::Available { payload } => payload.clone(),
            Outcome::Unavailable { error } => stamp_at(
                json!({
                    "timestamp": Value::Null,
                    "is_available": false,
                    "error": error,
                }),
                self.timestamp,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn available_reading_has_payload_only() {
        let r = Reading::available("https://example.com/feed.xml", json!({"root": "x"}));
        assert!(r.is_available());
        assert!(r.payload().is_some());
        assert!(r.error_message().is_none());
    }

    #[test]
    fn unavailable_reading_has_error_only() {
        let r = Reading::unavailable("https://example.com/feed.xml", "HTTP 404 Not Found");
        assert!(!r.is_available());
        assert!(r.payload().is_none());
        assert_eq!(r.error_message(), Some("HTTP 404 Not Found"));
    }

    #[test]
    fn payload_timestamp_matches_reading_time() {
        let r = Reading::available("u", json!({"root": null}));
        assert_eq!(r.payload().unwrap()["timestamp"], r.timestamp_iso().as_str());
    }

    #[test]
    fn failure_snapshot_shape() {
        let r = Reading::unavailable("u", "empty response");
        let snap = r.snapshot();
        let keys: Vec<_> = snap.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["timestamp", "is_available", "error"]);
        assert_eq!(snap["is_available"], false);
        assert_eq!(snap["error"], "empty response");
        assert_eq!(snap["timestamp"], r.timestamp_iso().as_str());
    }

    #[test]
    fn success_snapshot_is_payload() {
        let r = Reading::available("u", json!({"weather": {"city": "Brno"}}));
        assert_eq!(&r.snapshot(), r.payload().unwrap());
    }
}
