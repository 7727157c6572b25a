//! Serialization helpers for snapshot fields that have not been observed yet.
//!
//! The dashboard never receives `null`: an unknown value is rendered as the
//! placeholder marker instead.

use serde::{Serialize, Serializer};

/// Marker emitted for any snapshot field without a known value.
pub const UNKNOWN: &str = "--";

pub fn or_unknown<T, S>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
where
    T: Serialize,
    S: Serializer,
{
    match value {
        Some(inner) => inner.serialize(serializer),
        None => serializer.serialize_str(UNKNOWN),
    }
}

#[cfg(test)]
mod tests {
    use serde::Serialize;

    #[derive(Serialize)]
    struct Reading {
        #[serde(serialize_with = "super::or_unknown")]
        value: Option<f64>,
    }

    #[test]
    fn missing_value_serializes_as_marker() {
        let json = serde_json::to_value(Reading { value: None }).unwrap();
        assert_eq!(json["value"], "--");
    }

    #[test]
    fn known_value_serializes_as_number() {
        let json = serde_json::to_value(Reading { value: Some(72.0) }).unwrap();
        assert_eq!(json["value"], 72.0);
    }
}
