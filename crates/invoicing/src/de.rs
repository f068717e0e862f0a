//! Lenient field deserializers for hand-maintained invoice data.

use serde::de::{self, Deserialize, Deserializer};
use serde_json::Value;

/// Text field that may have been typed as a number (state codes, SAC codes).
pub(crate) fn opt_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(other) => Err(de::Error::custom(format!("expected text, got {other}"))),
    }
}

/// Boolean flag that may arrive as `true`, `"yes"`, `1`, ...
pub(crate) fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(b)) => Ok(b),
        Some(Value::Number(n)) => Ok(n.as_f64().is_some_and(|v| v != 0.0)),
        Some(Value::String(s)) => parse_flag(&s)
            .ok_or_else(|| de::Error::custom(format!("expected a yes/no flag, got {s:?}"))),
        Some(other) => Err(de::Error::custom(format!("expected a flag, got {other}"))),
    }
}

/// Parse the textual spellings of a yes/no flag.
pub(crate) fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "yes" | "y" | "1" => Some(true),
        "false" | "no" | "n" | "0" | "" => Some(false),
        _ => None,
    }
}
