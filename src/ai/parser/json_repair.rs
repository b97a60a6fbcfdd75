//! JSON Repair Mechanism
//!
//! Locates and parses the JSON payload inside free-form model output.
//!
//! Handles common model output issues:
//! - Markdown code fence wrapping (```json ... ```)
//! - JSON embedded in explanatory text
//! - Missing closing braces/brackets
//! - Trailing commas
//! - Truncated strings
//! - Control characters in strings
//!
//! The first candidate tried is the widest span from the first opener to
//! the last closer, so commentary before and after the payload is ignored.

use serde_json::Value;
use tracing::debug;

use crate::constants::parser::MAX_REPAIR_ATTEMPTS;
use crate::types::{Result, SarmaError, preview};

/// Top-level JSON shape the caller expects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonShape {
    Object,
    Array,
}

impl JsonShape {
    fn delimiters(&self) -> (char, char) {
        match self {
            JsonShape::Object => ('{', '}'),
            JsonShape::Array => ('[', ']'),
        }
    }

    fn matches(&self, value: &Value) -> bool {
        match self {
            JsonShape::Object => value.is_object(),
            JsonShape::Array => value.is_array(),
        }
    }
}

/// JSON extraction and repair strategies
pub struct JsonRepairer {
    max_repair_attempts: usize,
}

impl Default for JsonRepairer {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonRepairer {
    pub fn new() -> Self {
        Self {
            max_repair_attempts: MAX_REPAIR_ATTEMPTS,
        }
    }

    /// Parse the payload of the expected shape, repairing if needed
    ///
    /// Returns (Value, was_repaired)
    pub fn parse_or_repair(&self, raw: &str, shape: JsonShape) -> Result<(Value, bool)> {
        let cleaned = self.preprocess(raw);
        let parse = |s: &str| {
            serde_json::from_str::<Value>(s)
                .ok()
                .filter(|v| shape.matches(v))
        };

        if let Some(value) = parse(&cleaned) {
            return Ok((value, false));
        }

        let Some(span) = self.widest_span(&cleaned, shape) else {
            return Err(SarmaError::Parse {
                message: format!(
                    "no JSON {} found in response: {}",
                    if shape == JsonShape::Object { "object" } else { "array" },
                    preview(&cleaned, 80)
                ),
            });
        };

        if let Some(value) = parse(span) {
            return Ok((value, false));
        }

        debug!("JSON parse failed, attempting repair");

        for attempt in 1..=self.max_repair_attempts {
            let repaired = self.repair_attempt(span, attempt);
            if let Some(value) = parse(&repaired) {
                debug!("JSON repaired on attempt {}", attempt);
                return Ok((value, true));
            }
        }

        // Widest span may straddle two payloads; fall back to the first balanced one
        if let Some(extracted) = self.first_balanced(&cleaned, shape)
            && let Some(value) = parse(extracted)
        {
            debug!("JSON extracted from first balanced structure");
            return Ok((value, true));
        }

        Err(SarmaError::Parse {
            message: format!(
                "failed to parse or repair JSON after {} attempts: {}",
                self.max_repair_attempts,
                preview(&cleaned, 200)
            ),
        })
    }

    /// Preprocess raw input
    fn preprocess(&self, raw: &str) -> String {
        let s = raw.trim().trim_start_matches('\u{feff}');
        self.strip_code_fences(s).trim().to_string()
    }

    /// Strip a fence that wraps the whole response
    fn strip_code_fences(&self, s: &str) -> String {
        let mut result = s;

        if result.starts_with("```")
            && let Some(first_newline) = result.find('\n')
        {
            result = &result[first_newline + 1..];
        }

        if let Some(stripped) = result.trim_end().strip_suffix("```") {
            result = stripped.trim_end();
        }

        result.to_string()
    }

    /// First opener through last closer (or end of text when truncated)
    fn widest_span<'a>(&self, s: &'a str, shape: JsonShape) -> Option<&'a str> {
        let (open, close) = shape.delimiters();
        let start = s.find(open)?;
        let end = s
            .rfind(close)
            .filter(|&end| end > start)
            .map(|end| end + close.len_utf8())
            .unwrap_or(s.len());
        Some(&s[start..end])
    }

    /// Attempt repair with increasing aggressiveness
    fn repair_attempt(&self, s: &str, level: usize) -> String {
        match level {
            1 => self.balance_brackets(&self.fix_trailing_commas(s)),
            2 => self.balance_brackets(&self.fix_truncated_strings(&self.fix_trailing_commas(s))),
            _ => {
                let result = self.remove_control_chars(&self.fix_trailing_commas(s));
                let result = self.balance_brackets(&self.fix_truncated_strings(&result));
                self.truncate_to_valid(&result)
            }
        }
    }

    /// Fix trailing commas before ] or }
    fn fix_trailing_commas(&self, s: &str) -> String {
        let chars: Vec<char> = s.chars().collect();
        let mut result = String::with_capacity(s.len());
        let mut in_string = false;
        let mut escape = false;

        for (i, &ch) in chars.iter().enumerate() {
            if escape {
                escape = false;
                result.push(ch);
                continue;
            }
            match ch {
                '\\' if in_string => escape = true,
                '"' => in_string = !in_string,
                ',' if !in_string => {
                    let next = chars[i + 1..].iter().find(|c| !c.is_whitespace());
                    if matches!(next, Some(']') | Some('}')) {
                        continue;
                    }
                }
                _ => {}
            }
            result.push(ch);
        }

        result
    }

    /// Balance brackets by adding missing closers in nesting order
    fn balance_brackets(&self, s: &str) -> String {
        let mut result = s.to_string();
        let mut stack = Vec::new();
        let mut in_string = false;
        let mut escape = false;

        for ch in s.chars() {
            if escape {
                escape = false;
                continue;
            }

            match ch {
                '\\' if in_string => escape = true,
                '"' => in_string = !in_string,
                '{' if !in_string => stack.push('}'),
                '[' if !in_string => stack.push(']'),
                '}' | ']' if !in_string => {
                    stack.pop();
                }
                _ => {}
            }
        }

        if in_string {
            result.push('"');
        }
        while let Some(closer) = stack.pop() {
            result.push(closer);
        }

        result
    }

    /// Fix truncated strings by closing them
    fn fix_truncated_strings(&self, s: &str) -> String {
        let mut result = String::with_capacity(s.len() + 10);
        let mut in_string = false;
        let mut escape = false;

        for ch in s.chars() {
            if escape {
                escape = false;
                result.push(ch);
                continue;
            }

            match ch {
                '\\' if in_string => {
                    escape = true;
                    result.push(ch);
                }
                '"' => {
                    in_string = !in_string;
                    result.push(ch);
                }
                '\n' | '\r' if in_string => {
                    // Unterminated string at newline - close it
                    result.push('"');
                    in_string = false;
                    result.push(ch);
                }
                _ => result.push(ch),
            }
        }

        if in_string {
            result.push('"');
        }

        result
    }

    /// Remove control characters that break JSON parsing
    fn remove_control_chars(&self, s: &str) -> String {
        s.chars()
            .filter(|c| !c.is_control() || matches!(c, '\n' | '\r' | '\t'))
            .collect()
    }

    /// Truncate to last complete top-level structure
    fn truncate_to_valid(&self, s: &str) -> String {
        let mut last_valid = 0;
        let mut depth = 0i32;
        let mut in_string = false;
        let mut escape = false;

        for (i, ch) in s.char_indices() {
            if escape {
                escape = false;
                continue;
            }

            match ch {
                '\\' if in_string => escape = true,
                '"' => in_string = !in_string,
                '{' | '[' if !in_string => depth += 1,
                '}' | ']' if !in_string => {
                    depth -= 1;
                    if depth == 0 {
                        last_valid = i + 1;
                    }
                }
                _ => {}
            }
        }

        if last_valid > 0 && last_valid < s.len() {
            s[..last_valid].to_string()
        } else {
            s.to_string()
        }
    }

    /// First balanced structure of the expected shape
    fn first_balanced<'a>(&self, s: &'a str, shape: JsonShape) -> Option<&'a str> {
        let (open, _) = shape.delimiters();
        let start = s.find(open)?;

        let mut depth = 0i32;
        let mut in_string = false;
        let mut escape = false;

        for (i, ch) in s[start..].char_indices() {
            if escape {
                escape = false;
                continue;
            }

            match ch {
                '\\' if in_string => escape = true,
                '"' => in_string = !in_string,
                '{' | '[' if !in_string => depth += 1,
                '}' | ']' if !in_string => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(&s[start..start + i + 1]);
                    }
                }
                _ => {}
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object(input: &str) -> Result<(Value, bool)> {
        JsonRepairer::new().parse_or_repair(input, JsonShape::Object)
    }

    #[test]
    fn test_parse_valid_json() {
        let (_, repaired) = object(r#"{"key": "value"}"#).unwrap();
        assert!(!repaired);
    }

    #[test]
    fn test_strip_code_fences() {
        let (value, _) = object("```json\n{\"key\": \"value\"}\n```").unwrap();
        assert_eq!(value["key"], "value");
    }

    #[test]
    fn test_commentary_around_payload() {
        let input = "Here is the analysis:\n```json\n{\"calories\": 520}\n```\nHope this helps!";
        let (value, repaired) = object(input).unwrap();
        assert!(!repaired);
        assert_eq!(value["calories"], 520);
    }

    #[test]
    fn test_fix_trailing_comma() {
        let (value, repaired) = object(r#"{"ingredients": ["rice", "egg",],}"#).unwrap();
        assert!(repaired);
        assert_eq!(value["ingredients"][1], "egg");
    }

    #[test]
    fn test_comma_inside_string_kept() {
        let (value, _) = object(r#"{"note": "a, ]", "x": [1,]}"#).unwrap();
        assert_eq!(value["note"], "a, ]");
    }

    #[test]
    fn test_balance_brackets_in_order() {
        let (value, repaired) = object(r#"{"meal": {"items": [{"name": "toast"}"#).unwrap();
        assert!(repaired);
        assert_eq!(value["meal"]["items"][0]["name"], "toast");
    }

    #[test]
    fn test_truncated_string() {
        let input = "{\"name\": \"unterminated\n, \"other\": \"value\"}";
        assert!(object(input).is_ok());
    }

    #[test]
    fn test_two_objects_falls_back_to_first() {
        let input = r#"{"calories": 300} and also {"calories": 500}"#;
        let (value, _) = object(input).unwrap();
        assert_eq!(value["calories"], 300);
    }

    #[test]
    fn test_array_shape() {
        let input = "Suggestions:\n[{\"name\": \"Soup\"}, {\"name\": \"Salad\"}]\nEnjoy";
        let (value, _) = JsonRepairer::new()
            .parse_or_repair(input, JsonShape::Array)
            .unwrap();
        assert_eq!(value.as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_no_json_is_error() {
        let err = object("The meal has about 450 calories.").unwrap_err();
        assert!(matches!(err, SarmaError::Parse { .. }));
    }

    #[test]
    fn test_wrong_shape_rejected() {
        assert!(object("[1, 2, 3]").is_err());
    }
}
