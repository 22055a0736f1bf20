use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;

/// Field injected into every JSON payload.
pub const TIMESTAMP_FIELD: &str = "timestamp";

/// ISO-8601 UTC with microseconds and a `Z` suffix.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Stamp `json` with the current UTC instant.
pub fn stamp(json: Value) -> Value {
    stamp_at(json, Utc::now())
}

/// Set the `timestamp` field of a JSON object to `at`, replacing any prior
/// value in place. Non-object values are returned unchanged.
pub fn stamp_at(mut json: Value, at: DateTime<Utc>) -> Value {
    if let Value::Object(ref mut map) = json {
        map.insert(
            TIMESTAMP_FIELD.to_string(),
            Value::String(format_timestamp(at)),
        );
    }
    json
}
