//! Shared utility functions for tolerant JSON field extraction.
//!
//! ## JSON Extraction Helpers
//!
//! Model output is loosely typed: numbers arrive as strings ("25.5g"),
//! lists arrive as prose ("rice, beans; salsa"). These helpers coerce such
//! values into the strict shapes the domain records need and never fail:
//! - `json_string`, `json_string_or` - Extract strings
//! - `json_string_list` - Extract string lists from arrays or separated prose
//! - `json_f64`, `json_opt_f64`, `json_u32` - Extract numbers with coercion

use regex::Regex;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::LazyLock;

use crate::constants::provider::CHARS_PER_TOKEN;

static LEADING_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-?\d+(?:\.\d+)?").expect("valid number regex"));

static LIST_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[,;\n]").expect("valid separator regex"));

// =============================================================================
// JSON Value Extraction Helpers
// =============================================================================

/// Extract a non-empty string from JSON value by key.
#[inline]
pub fn json_string(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)?
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

/// Extract string with default value.
#[inline]
pub fn json_string_or(value: &Value, key: &str, default: &str) -> String {
    json_string(value, key).unwrap_or_else(|| default.to_string())
}

/// Coerce a JSON value into a number.
///
/// Accepts numbers and strings that contain one ("about 450 kcal").
pub fn coerce_f64(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => LEADING_NUMBER
            .find(s)
            .and_then(|m| m.as_str().parse::<f64>().ok()),
        _ => None,
    };
    number.filter(|n| n.is_finite())
}

/// Extract f64, defaulting when absent or non-numeric.
#[inline]
pub fn json_f64(value: &Value, key: &str, default: f64) -> f64 {
    value.get(key).and_then(coerce_f64).unwrap_or(default)
}

/// Extract an optional f64; absent, null, non-numeric and zero all map to None.
#[inline]
pub fn json_opt_f64(value: &Value, key: &str) -> Option<f64> {
    value
        .get(key)
        .and_then(coerce_f64)
        .filter(|n| *n != 0.0)
}

/// Extract a non-negative integer with default (fractions are rounded).
#[inline]
pub fn json_u32(value: &Value, key: &str, default: u32) -> u32 {
    value
        .get(key)
        .and_then(coerce_f64)
        .filter(|n| *n >= 0.0)
        .map(|n| n.round().min(u32::MAX as f64) as u32)
        .unwrap_or(default)
}

/// Split prose like "rice, beans; salsa" into trimmed items.
pub fn split_list(text: &str) -> Vec<String> {
    LIST_SEPARATOR
        .split(text)
        .map(|item| item.trim().trim_start_matches(['-', '*', '•']).trim())
        .filter(|item| !item.is_empty())
        .map(String::from)
        .collect()
}

/// Extract a string list from either a JSON array or a separated string.
///
/// Array elements that are not strings are rendered with their JSON text.
pub fn json_string_list(value: &Value, key: &str) -> Vec<String> {
    match value.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.trim().to_string()),
                Value::Null => None,
                other => Some(other.to_string()),
            })
            .filter(|s| !s.is_empty())
            .collect(),
        Some(Value::String(s)) => split_list(s),
        _ => Vec::new(),
    }
}

/// Extract a string -> string map (values of other types are stringified).
pub fn json_string_map(value: &Value, key: &str) -> BTreeMap<String, String> {
    value
        .get(key)
        .and_then(|v| v.as_object())
        .map(|obj| {
            obj.iter()
                .map(|(k, v)| {
                    let rendered = match v {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    };
                    (k.clone(), rendered)
                })
                .collect()
        })
        .unwrap_or_default()
}

// =============================================================================
// Text Utilities
// =============================================================================

/// Rough token estimate for providers that omit usage data
#[inline]
pub fn estimate_tokens(text: &str) -> u32 {
    (text.chars().count() / CHARS_PER_TOKEN) as u32
}

/// First `max_chars` characters, with an ellipsis when truncated.
pub fn preview(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}
