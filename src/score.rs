use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

/// Highest number of points a single choice may award.
pub const MAX_CHOICE_SCORE: i64 = 100;

fn integer_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^-?[0-9]+$").expect("integer pattern is valid"))
}

/// Parse a raw choice score into a value in `0..=100`.
///
/// Booleans are always rejected. Integers pass through, floats only when they
/// have no fractional part, and strings only when the trimmed text is an
/// optionally negative run of digits. Everything else is rejected.
pub fn coerce_score(raw: &Value) -> Option<u32> {
    let score = match raw {
        Value::Bool(_) => return None,
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i
            } else if let Some(u) = n.as_u64() {
                i64::try_from(u).ok()?
            } else {
                let f = n.as_f64()?;
                if f.fract() != 0.0 || !f.is_finite() {
                    return None;
                }
                // Anything outside the i64 range is out of 0..=100 anyway.
                if f.abs() > 1e15 {
                    return None;
                }
                f as i64
            }
        }
        Value::String(s) => {
            let trimmed = s.trim();
            if !integer_pattern().is_match(trimmed) {
                return None;
            }
            trimmed.parse::<i64>().ok()?
        }
        Value::Null | Value::Array(_) | Value::Object(_) => return None,
    };

    if (0..=MAX_CHOICE_SCORE).contains(&score) {
        Some(score as u32)
    } else {
        None
    }
}

/// Read-time variant of [`coerce_score`]: anything invalid counts as zero.
pub fn coerce_score_or_zero(raw: &Value) -> u32 {
    coerce_score(raw).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_integers_in_range() {
        assert_eq!(coerce_score(&json!(0)), Some(0));
        assert_eq!(coerce_score(&json!(40)), Some(40));
        assert_eq!(coerce_score(&json!(100)), Some(100));
        assert_eq!(coerce_score(&json!(101)), None);
        assert_eq!(coerce_score(&json!(-1)), None);
    }

    #[test]
    fn test_booleans_rejected() {
        assert_eq!(coerce_score(&json!(true)), None);
        assert_eq!(coerce_score(&json!(false)), None);
    }

    #[test]
    fn test_floats_must_be_integral() {
        assert_eq!(coerce_score(&json!(12.0)), Some(12));
        assert_eq!(coerce_score(&json!(12.5)), None);
        assert_eq!(coerce_score(&json!(100.0)), Some(100));
        assert_eq!(coerce_score(&json!(-3.0)), None);
    }

    #[test]
    fn test_numeric_strings() {
        assert_eq!(coerce_score(&json!("50")), Some(50));
        assert_eq!(coerce_score(&json!("  7 ")), Some(7));
        assert_eq!(coerce_score(&json!("-5")), None);
        assert_eq!(coerce_score(&json!("")), None);
        assert_eq!(coerce_score(&json!("   ")), None);
        assert_eq!(coerce_score(&json!("12.0")), None);
        assert_eq!(coerce_score(&json!("ten")), None);
        assert_eq!(coerce_score(&json!("--5")), None);
        assert_eq!(coerce_score(&json!("99999999999999999999999")), None);
    }

    #[test]
    fn test_other_shapes_rejected() {
        assert_eq!(coerce_score(&Value::Null), None);
        assert_eq!(coerce_score(&json!([10])), None);
        assert_eq!(coerce_score(&json!({"score": 10})), None);
    }

    #[test]
    fn test_or_zero_defaults_invalid() {
        assert_eq!(coerce_score_or_zero(&json!("abc")), 0);
        assert_eq!(coerce_score_or_zero(&json!(30)), 30);
    }

    fn any_json() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(|i| json!(i)),
            any::<u64>().prop_map(|u| json!(u)),
            (-1.0e6f64..1.0e6).prop_map(|f| json!(f)),
            ".*".prop_map(Value::String),
            "-?[0-9]{1,4}".prop_map(Value::String),
        ]
    }

    proptest! {
        #[test]
        fn prop_coercion_is_total_and_bounded(raw in any_json()) {
            if let Some(score) = coerce_score(&raw) {
                prop_assert!(score <= 100);
                prop_assert!(!raw.is_boolean());
            }
        }

        #[test]
        fn prop_digit_strings_match_integers(n in 0i64..=200) {
            let from_string = coerce_score(&Value::String(n.to_string()));
            let from_number = coerce_score(&json!(n));
            prop_assert_eq!(from_string, from_number);
        }
    }
}
