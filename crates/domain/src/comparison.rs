//! Value comparison rules used by equality predicates.
//!
//! Numbers are compared after rounding both sides to [`DECIMAL_PLACES`]
//! decimals, half away from zero. The server formats averages with five
//! decimals, so `2.473684` observed locally and `2.47368` in a fixture are the
//! same value. Strings compare byte for byte.

use serde_json::Value;

/// Number of decimals kept when comparing numbers.
pub const DECIMAL_PLACES: i32 = 5;

/// Rounds `value` to [`DECIMAL_PLACES`] decimals, half away from zero.
#[must_use]
pub fn round_decimals(value: f64) -> f64 {
    let scale = 10f64.powi(DECIMAL_PLACES);
    (value * scale).round() / scale
}

/// Returns true if both numbers are equal once rounded.
#[must_use]
#[allow(clippy::float_cmp)]
pub fn numbers_match(actual: f64, expected: f64) -> bool {
    let scale = 10f64.powi(DECIMAL_PLACES);
    // Both sides are integral after scaling, so exact equality is sound.
    (actual * scale).round() == (expected * scale).round()
}

/// Structural equality with the numeric rounding rule applied at every level.
#[must_use]
pub fn values_match(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Number(a), Value::Number(b)) => match (a.as_f64(), b.as_f64()) {
            (Some(a), Some(b)) => numbers_match(a, b),
            _ => a == b,
        },
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| values_match(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(key, x)| b.get(key).is_some_and(|y| values_match(x, y)))
        }
        _ => actual == expected,
    }
}

/// Renders a value the way verdict lines show it: strings without quotes.
#[must_use]
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_numbers_round_to_five_decimals() {
        assert!(numbers_match(2.473_684, 2.47368));
        assert!(numbers_match(2.473_676, 2.47368));
        assert!(!numbers_match(2.47367, 2.47368));
        assert!(numbers_match(3.0, 3.0));
    }

    #[test]
    fn test_round_decimals() {
        assert!(numbers_match(round_decimals(2.642_857_1), 2.64286));
        assert!(numbers_match(round_decimals(-1.000_006), -1.00001));
    }

    #[test]
    fn test_integer_and_float_are_equal() {
        assert!(values_match(&json!(3), &json!(3.0)));
        assert!(values_match(&json!(404), &json!(404)));
        assert!(!values_match(&json!(404), &json!(400)));
    }

    #[test]
    fn test_strings_are_exact() {
        assert!(values_match(&json!("Пётр"), &json!("Пётр")));
        assert!(!values_match(&json!("Петр"), &json!("Пётр")));
        assert!(!values_match(&json!("53"), &json!(53)));
    }

    #[test]
    fn test_nested_structures() {
        assert!(values_match(&json!({}), &json!({})));
        assert!(!values_match(&json!({"a": 1}), &json!({})));
        assert!(values_match(
            &json!({"avg": 2.500_001, "tags": [1, 2]}),
            &json!({"avg": 2.5, "tags": [1.0, 2.0]})
        ));
    }

    #[test]
    fn test_display_value() {
        assert_eq!(display_value(&json!("Санктгород")), "Санктгород");
        assert_eq!(display_value(&json!(31)), "31");
        assert_eq!(display_value(&json!({})), "{}");
    }
}
