//! Case-insensitive, typed view over a loosely structured device payload.

use std::collections::HashMap;

use log::warn;
use serde_json::{Map, Value};

const MISSING_MARKERS: &[&str] = &["", "--", "null", "none", "nan", "n/a", "na"];

/// Keys are trimmed and lower-cased once; lookups use the same folding.
/// Keys that fold to the same name keep all of their values.
#[derive(Debug, Clone, Default)]
pub struct Payload {
    fields: HashMap<String, Vec<Value>>,
}

impl Payload {
    pub fn from_map(map: &Map<String, Value>) -> Self {
        let mut fields: HashMap<String, Vec<Value>> = HashMap::new();
        for (key, value) in map {
            fields.entry(fold_key(key)).or_default().push(value.clone());
        }
        Self { fields }
    }

    /// Non-object payloads carry no fields; they are reported and treated as
    /// empty.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Object(map) => Self::from_map(map),
            other => {
                warn!("Ignoring non-object payload: {other}");
                Self::default()
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn raw(&self, key: &str) -> Option<&Value> {
        self.fields.get(&fold_key(key))?.first()
    }

    /// Every validated, non-negative finite number stored under `key`.
    pub fn numbers<'a>(&'a self, key: &str) -> impl Iterator<Item = f64> + 'a {
        self.fields
            .get(&fold_key(key))
            .into_iter()
            .flatten()
            .filter_map(parse_number)
    }

    /// A validated number stored under `key`, preferring a non-zero one when
    /// several keys fold to the same name.
    pub fn number(&self, key: &str) -> Option<f64> {
        let mut first = None;
        for value in self.numbers(key) {
            if value != 0.0 {
                return Some(value);
            }
            if first.is_none() {
                first = Some(value);
            }
        }
        first
    }

    pub fn text(&self, key: &str) -> Option<String> {
        match self.raw(key)? {
            Value::String(text) => {
                let trimmed = text.trim();
                (!is_missing_marker(trimmed)).then(|| trimmed.to_string())
            }
            Value::Number(number) => Some(number.to_string()),
            _ => None,
        }
    }

    pub fn flag(&self, key: &str) -> Option<bool> {
        match self.raw(key)? {
            Value::Bool(flag) => Some(*flag),
            Value::Number(number) => number.as_f64().map(|value| value != 0.0),
            Value::String(text) => match text.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "y" | "on" | "1" => Some(true),
                "false" | "no" | "n" | "off" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    /// First alias that carries a number.
    pub fn first_number<S: AsRef<str>>(&self, aliases: &[S]) -> Option<f64> {
        aliases.iter().find_map(|alias| self.number(alias.as_ref()))
    }

    pub fn first_text<S: AsRef<str>>(&self, aliases: &[S]) -> Option<String> {
        aliases.iter().find_map(|alias| self.text(alias.as_ref()))
    }

    pub fn first_flag<S: AsRef<str>>(&self, aliases: &[S]) -> Option<bool> {
        aliases.iter().find_map(|alias| self.flag(alias.as_ref()))
    }
}

fn fold_key(key: &str) -> String {
    key.trim().to_lowercase()
}

fn is_missing_marker(text: &str) -> bool {
    MISSING_MARKERS
        .iter()
        .any(|marker| text.eq_ignore_ascii_case(marker))
}

fn parse_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(number) => number.as_f64()?,
        Value::String(text) => {
            let trimmed = text.trim();
            if is_missing_marker(trimmed) {
                return None;
            }
            trimmed.parse::<f64>().ok()?
        }
        _ => return None,
    };

    (number.is_finite() && number >= 0.0).then_some(number)
}
