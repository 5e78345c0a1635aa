//! Serde helpers for loosely typed JSON coming from the oracle and the web form.
//!
//! Integers may arrive as numbers or numeric strings; empty strings and
//! `null` are treated as absent.

use serde::{de, Deserialize, Deserializer};
use serde_json::Value;

pub(crate) fn opt_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_u64()
            .and_then(|v| u32::try_from(v).ok())
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("expected a non-negative integer, got {n}"))),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => s
            .trim()
            .parse::<u32>()
            .map(Some)
            .map_err(|_| de::Error::custom(format!("expected an integer, got \"{s}\""))),
        Some(other) => Err(de::Error::custom(format!("expected an integer, got {other}"))),
    }
}

pub(crate) fn opt_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_u64()
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("expected a non-negative integer, got {n}"))),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => s
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|_| de::Error::custom(format!("expected an integer, got \"{s}\""))),
        Some(other) => Err(de::Error::custom(format!("expected an integer, got {other}"))),
    }
}

pub(crate) fn opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
        }
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(de::Error::custom(format!("expected a string, got {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "opt_u32")]
        n: Option<u32>,
        #[serde(default, deserialize_with = "opt_string")]
        s: Option<String>,
    }

    #[test]
    fn test_numbers_and_numeric_strings() {
        let p: Probe = serde_json::from_str(r#"{"n": 5, "s": "cash"}"#).unwrap();
        assert_eq!(p.n, Some(5));
        assert_eq!(p.s.as_deref(), Some("cash"));

        let p: Probe = serde_json::from_str(r#"{"n": " 12 "}"#).unwrap();
        assert_eq!(p.n, Some(12));
        assert_eq!(p.s, None);
    }

    #[test]
    fn test_blank_values_are_absent() {
        let p: Probe = serde_json::from_str(r#"{"n": "", "s": "  "}"#).unwrap();
        assert_eq!(p.n, None);
        assert_eq!(p.s, None);

        let p: Probe = serde_json::from_str(r#"{"n": null, "s": null}"#).unwrap();
        assert_eq!(p.n, None);
        assert_eq!(p.s, None);
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(serde_json::from_str::<Probe>(r#"{"n": "five"}"#).is_err());
        assert!(serde_json::from_str::<Probe>(r#"{"n": -3}"#).is_err());
        assert!(serde_json::from_str::<Probe>(r#"{"s": [1]}"#).is_err());
    }
}
