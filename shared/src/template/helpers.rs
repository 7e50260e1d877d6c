//! The fixed helper vocabulary available to template authors
//!
//! Helpers only transform data. Nothing here evaluates author-supplied code.

use std::cmp::Ordering;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use handlebars::{handlebars_helper, Handlebars};
use serde_json::Value;

use crate::types::Language;

/// Names of every helper a template may invoke, built-ins included.
pub const HELPER_NAMES: &[&str] = &[
    "formatDate",
    "formatNumber",
    "uppercase",
    "lowercase",
    "eq",
    "gt",
    "lt",
    // handlebars built-ins
    "if",
    "unless",
    "each",
    "with",
    "lookup",
    "log",
    "else",
];

handlebars_helper!(format_date_en: |value: Json| format_date(value, Language::English));
handlebars_helper!(format_date_th: |value: Json| format_date(value, Language::Thai));
handlebars_helper!(format_number: |value: Json| format_number_value(value));
handlebars_helper!(uppercase: |value: Json| text_of(value).to_uppercase());
handlebars_helper!(lowercase: |value: Json| text_of(value).to_lowercase());
handlebars_helper!(eq: |a: Json, b: Json| values_equal(a, b));
handlebars_helper!(gt: |a: Json, b: Json| compare(a, b) == Some(Ordering::Greater));
handlebars_helper!(lt: |a: Json, b: Json| compare(a, b) == Some(Ordering::Less));

/// Register the helper set on a registry for the given locale
pub fn register_helpers(registry: &mut Handlebars<'static>, language: Language) {
    match language {
        Language::English => registry.register_helper("formatDate", Box::new(format_date_en)),
        Language::Thai => registry.register_helper("formatDate", Box::new(format_date_th)),
    }
    registry.register_helper("formatNumber", Box::new(format_number));
    registry.register_helper("uppercase", Box::new(uppercase));
    registry.register_helper("lowercase", Box::new(lowercase));
    registry.register_helper("eq", Box::new(eq));
    registry.register_helper("gt", Box::new(gt));
    registry.register_helper("lt", Box::new(lt));
}

/// Parse a date-like value. Numbers are treated as epoch milliseconds.
pub fn parse_date(value: &Value) -> Option<NaiveDate> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Some(dt.date_naive());
            }
            if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
                return Some(date);
            }
            ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|dt| dt.date())
        }
        Value::Number(n) => n
            .as_i64()
            .and_then(DateTime::from_timestamp_millis)
            .map(|dt| dt.date_naive()),
        _ => None,
    }
}

/// Long date: `January 5, 2025` in English, `5 มกราคม 2568` in Thai
/// (Buddhist era). Empty when the value is not a date.
pub fn format_date(value: &Value, language: Language) -> String {
    let Some(date) = parse_date(value) else {
        return String::new();
    };
    let month = language.month_name(date.month());
    match language {
        Language::English => format!("{} {}, {}", month, date.day(), date.year()),
        Language::Thai => format!("{} {} {}", date.day(), month, date.year() + 543),
    }
}

/// Thousands-grouped number with at most three fraction digits.
/// Empty when the value is not numeric.
pub fn format_number_value(value: &Value) -> String {
    match as_number(value) {
        Some(n) if n.is_finite() => group_thousands(n),
        _ => String::new(),
    }
}

fn group_thousands(n: f64) -> String {
    let fixed = format!("{:.3}", n.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    let frac = frac_part.trim_end_matches('0');

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let negative = n < 0.0 && (grouped != "0" || !frac.is_empty());
    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(&grouped);
    if !frac.is_empty() {
        out.push('.');
        out.push_str(frac);
    }
    out
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// JavaScript-style truthiness
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(false, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn text_of(value: &Value) -> String {
    if !is_truthy(value) {
        return String::new();
    }
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::String(x), Value::String(y)) => match (as_number(a), as_number(b)) {
            (Some(x), Some(y)) => x.partial_cmp(&y),
            _ => Some(x.cmp(y)),
        },
        _ => as_number(a)?.partial_cmp(&as_number(b)?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn english_long_date() {
        assert_eq!(format_date(&json!("2025-01-05"), Language::English), "January 5, 2025");
        assert_eq!(
            format_date(&json!("2025-03-09T10:30:00Z"), Language::English),
            "March 9, 2025"
        );
    }

    #[test]
    fn thai_long_date_uses_buddhist_era() {
        assert_eq!(format_date(&json!("2025-01-05"), Language::Thai), "5 มกราคม 2568");
    }

    #[test]
    fn unparseable_dates_are_empty() {
        assert_eq!(format_date(&json!("next tuesday"), Language::English), "");
        assert_eq!(format_date(&Value::Null, Language::English), "");
        assert_eq!(format_date(&json!(true), Language::English), "");
    }

    #[test]
    fn numbers_are_grouped() {
        assert_eq!(format_number_value(&json!(1234567)), "1,234,567");
        assert_eq!(format_number_value(&json!(1234.5)), "1,234.5");
        assert_eq!(format_number_value(&json!("40")), "40");
        assert_eq!(format_number_value(&json!(-9876.125)), "-9,876.125");
        assert_eq!(format_number_value(&json!(0)), "0");
        assert_eq!(format_number_value(&json!("abc")), "");
    }

    #[test]
    fn falsy_text_is_empty() {
        assert_eq!(text_of(&Value::Null), "");
        assert_eq!(text_of(&json!("")), "");
        assert_eq!(text_of(&json!(0)), "");
        assert_eq!(text_of(&json!("Ada")), "Ada");
    }

    #[test]
    fn comparisons_are_numeric_when_possible() {
        assert_eq!(compare(&json!(10), &json!(9)), Some(Ordering::Greater));
        assert_eq!(compare(&json!("10"), &json!("9")), Some(Ordering::Greater));
        assert_eq!(compare(&json!("b"), &json!("a")), Some(Ordering::Greater));
        assert_eq!(compare(&json!(null), &json!(1)), None);
        assert!(values_equal(&json!(1), &json!(1.0)));
        assert!(!values_equal(&json!("1"), &json!(1)));
    }
}
