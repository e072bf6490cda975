use chrono::{DateTime, NaiveDate};
use serde_json::Value;

/// Money fields arrive as numbers or as display strings ("$1,234.56 ").
/// Anything unparseable is a null, never an error.
pub fn parse_money(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let cleaned: String = s
                .chars()
                .filter(|c| !matches!(c, '$' | ',') && !c.is_whitespace())
                .collect();
            if cleaned.is_empty() {
                return None;
            }
            cleaned.parse::<f64>().ok()
        }
        _ => None,
    }
}

/// Years arrive bare ("2021"), decorated ("Tax Period 2021"), or numeric.
/// Strips non-digits and keeps anything in a plausible filing range.
pub fn parse_year(value: &Value) -> Option<i32> {
    let digits: String = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.chars().filter(|c| c.is_ascii_digit()).collect(),
        _ => return None,
    };
    let year = digits.parse::<i32>().ok()?;
    (1900..=2100).contains(&year).then_some(year)
}

/// Known date shapes, tried in fixed order; the first success wins.
const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%m/%d/%Y", "%m-%d-%Y", "%B %d, %Y"];

pub fn parse_date_str(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.date_naive());
    }
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(trimmed, format).ok())
}

pub fn parse_date(value: &Value) -> Option<NaiveDate> {
    parse_date_str(value.as_str()?)
}

/// Flag fields show up as booleans or as words ("Filed", "Yes", "true").
pub fn parse_flag(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "filed" | "yes" | "true" | "y" | "1" => Some(true),
            "not filed" | "no" | "false" | "n" | "0" => Some(false),
            _ => None,
        },
        Value::Number(n) => n.as_i64().map(|n| n != 0),
        _ => None,
    }
}

/// Counts arrive as numbers or numeric strings ("1").
pub fn parse_count(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse::<u32>().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn money_strips_currency_symbols_separators_and_whitespace() {
        assert_eq!(parse_money(&json!("$1,234.56 ")), Some(1234.56));
        assert_eq!(parse_money(&json!("  45000")), Some(45000.0));
        assert_eq!(parse_money(&json!(1234.5)), Some(1234.5));
        assert_eq!(parse_money(&json!("-$500.00")), Some(-500.0));
    }

    #[test]
    fn unparseable_money_is_null_not_an_error() {
        assert_eq!(parse_money(&json!("N/A")), None);
        assert_eq!(parse_money(&json!("")), None);
        assert_eq!(parse_money(&json!(true)), None);
    }

    #[test]
    fn year_strips_decoration() {
        assert_eq!(parse_year(&json!("2021")), Some(2021));
        assert_eq!(parse_year(&json!("Tax Period 2018")), Some(2018));
        assert_eq!(parse_year(&json!(2024)), Some(2024));
        assert_eq!(parse_year(&json!("12")), None);
        assert_eq!(parse_year(&json!("n/a")), None);
    }

    #[test]
    fn date_formats_are_tried_in_fixed_order() {
        let expected = NaiveDate::from_ymd_opt(2014, 4, 15).expect("date");
        assert_eq!(parse_date_str("2014-04-15"), Some(expected));
        assert_eq!(parse_date_str("04/15/2014"), Some(expected));
        assert_eq!(parse_date_str("04-15-2014"), Some(expected));
        assert_eq!(parse_date_str("April 15, 2014"), Some(expected));
        assert_eq!(parse_date_str("2014-04-15T08:30:00Z"), Some(expected));
        assert_eq!(parse_date_str("not a date"), None);
    }

    #[test]
    fn filed_flags_parse_from_words_and_booleans() {
        assert_eq!(parse_flag(&json!("Filed")), Some(true));
        assert_eq!(parse_flag(&json!("Not Filed")), Some(false));
        assert_eq!(parse_flag(&json!(true)), Some(true));
        assert_eq!(parse_flag(&json!("maybe")), None);
    }
}
