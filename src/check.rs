//! Value checker: decide whether one configuration value satisfies its rule
//! set, and ask the operator for a replacement when it does not.
//!
//! Tests run in a fixed order and the first failure wins:
//!
//! 1. an empty table means the key was never set
//! 2. `type` coercion (the coerced value is what later tests see)
//! 3. `options` membership
//! 4. `regex`, matched from the start of a string value
//! 5. `nmin`/`nmax`, against the length of strings, arrays and tables, or
//!    against the value itself for numbers and booleans

use std::fmt;

use toml::Value;

use crate::coerce::Coercion;
use crate::error::ConfguardError;
use crate::prompt::{PromptRequest, Prompter};
use crate::template::{RuleSet, format_value};

/// Why a value was not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Unset,
    WrongType(Coercion),
    NotAnOption,
    PatternMismatch,
    OutOfBounds,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::Unset => write!(f, "value is unset"),
            Rejection::WrongType(c) => write!(f, "value is not a valid {c}"),
            Rejection::NotAnOption => write!(f, "value is not one of the allowed options"),
            Rejection::PatternMismatch => write!(f, "value does not match the required pattern"),
            Rejection::OutOfBounds => write!(f, "value is out of bounds"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    /// The value, after coercion.
    Accepted(Value),
    Rejected(Rejection),
}

/// Run the acceptance tests without prompting.
///
/// Only fails when bounds are declared for a value that has neither a length
/// nor a numeric order (a datetime, for instance).
pub fn evaluate(value: Value, rules: &RuleSet, key: &str) -> Result<Verdict, ConfguardError> {
    if is_unset(&value) {
        return Ok(Verdict::Rejected(Rejection::Unset));
    }

    let value = match rules.coercion {
        Some(coercion) => match coercion.apply(&value) {
            Some(coerced) => coerced,
            None => return Ok(Verdict::Rejected(Rejection::WrongType(coercion))),
        },
        None => value,
    };

    if let Some(options) = &rules.options
        && !options.iter().any(|option| loosely_equal(option, &value))
    {
        return Ok(Verdict::Rejected(Rejection::NotAnOption));
    }

    if let Some(pattern) = &rules.pattern {
        let matched = value.as_str().is_some_and(|s| pattern.matches_start(s));
        if !matched {
            return Ok(Verdict::Rejected(Rejection::PatternMismatch));
        }
    }

    if rules.nmin.is_some() || rules.nmax.is_some() {
        let measure = measure(&value).ok_or_else(|| ConfguardError::Incomparable {
            key: key.to_string(),
            value: format_value(&value),
        })?;
        let below = rules.nmin.is_some_and(|min| measure < min);
        let above = rules.nmax.is_some_and(|max| measure > max);
        if below || above {
            return Ok(Verdict::Rejected(Rejection::OutOfBounds));
        }
    }

    Ok(Verdict::Accepted(value))
}

/// Return `value` if it passes, otherwise whatever the prompter supplies.
///
/// The prompter's answer is not re-checked here; it owns the retry loop.
pub fn check(
    value: Value,
    rules: &RuleSet,
    key: &str,
    prompter: &mut dyn Prompter,
) -> Result<Value, ConfguardError> {
    match evaluate(value, rules, key)? {
        Verdict::Accepted(value) => Ok(value),
        Verdict::Rejected(reason) => {
            tracing::debug!(key, %reason, "requesting a corrected value");
            prompter.collect(&PromptRequest::new(key, rules, reason))
        }
    }
}

/// The "never set" sentinel: an empty table.
pub fn is_unset(value: &Value) -> bool {
    value.as_table().is_some_and(|t| t.is_empty())
}

/// Length for sized values, the number itself for scalars.
fn measure(value: &Value) -> Option<f64> {
    match value {
        Value::String(s) => Some(s.chars().count() as f64),
        Value::Array(a) => Some(a.len() as f64),
        Value::Table(t) => Some(t.len() as f64),
        Value::Integer(i) => Some(*i as f64),
        Value::Float(f) => Some(*f),
        Value::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Datetime(_) => None,
    }
}

/// TOML equality, except integers and floats compare by numeric value.
fn loosely_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Integer(i), Value::Float(f)) | (Value::Float(f), Value::Integer(i)) => {
            *i as f64 == *f
        }
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::ScriptedPrompter;
    use crate::template::{Pattern, Template};
    use toml::Table;

    fn bounds(nmin: f64, nmax: f64) -> RuleSet {
        RuleSet {
            nmin: Some(nmin),
            nmax: Some(nmax),
            ..RuleSet::default()
        }
    }

    fn unset() -> Value {
        Value::Table(Table::new())
    }

    #[test]
    fn in_bounds_number_passes_without_prompt() {
        let mut prompter = ScriptedPrompter::new(vec![]);
        let out = check(Value::Integer(5), &bounds(1.0, 10.0), "x", &mut prompter).unwrap();
        assert_eq!(out, Value::Integer(5));
        assert!(prompter.requests.is_empty());
    }

    #[test]
    fn out_of_bounds_number_prompts_once() {
        let mut prompter = ScriptedPrompter::new(vec![Value::Integer(7)]);
        let out = check(Value::Integer(15), &bounds(1.0, 10.0), "x", &mut prompter).unwrap();
        assert_eq!(out, Value::Integer(7));
        assert_eq!(prompter.requests, vec![("x".to_string(), Rejection::OutOfBounds)]);
    }

    #[test]
    fn failed_coercion_prompts_instead_of_erroring() {
        let rules = RuleSet {
            coercion: Some(Coercion::Int),
            ..RuleSet::default()
        };
        let mut prompter = ScriptedPrompter::new(vec![Value::Integer(3)]);
        let out = check(Value::String("abc".into()), &rules, "x", &mut prompter).unwrap();
        assert_eq!(out, Value::Integer(3));
        assert_eq!(
            prompter.requests,
            vec![("x".to_string(), Rejection::WrongType(Coercion::Int))]
        );
    }

    #[test]
    fn empty_table_always_prompts() {
        let mut prompter = ScriptedPrompter::new(vec![Value::String("filled".into())]);
        let out = check(unset(), &RuleSet::default(), "x", &mut prompter).unwrap();
        assert_eq!(out, Value::String("filled".into()));
        assert_eq!(prompter.requests, vec![("x".to_string(), Rejection::Unset)]);
    }

    #[test]
    fn prompter_answer_is_not_rechecked() {
        let mut prompter = ScriptedPrompter::new(vec![Value::Integer(99)]);
        let out = check(Value::Integer(0), &bounds(1.0, 10.0), "x", &mut prompter).unwrap();
        assert_eq!(out, Value::Integer(99));
        assert_eq!(prompter.requests.len(), 1);
    }

    #[test]
    fn permissive_rules_accept_anything_set() {
        let rules = RuleSet::default();
        for value in [
            Value::Boolean(false),
            Value::String(String::new()),
            Value::Array(vec![]),
        ] {
            assert_eq!(
                evaluate(value.clone(), &rules, "x").unwrap(),
                Verdict::Accepted(value)
            );
        }
    }

    #[test]
    fn coerced_value_is_returned() {
        let rules = RuleSet {
            coercion: Some(Coercion::Int),
            ..bounds(1.0, 10.0)
        };
        let verdict = evaluate(Value::String("4".into()), &rules, "x").unwrap();
        assert_eq!(verdict, Verdict::Accepted(Value::Integer(4)));
    }

    #[test]
    fn options_membership() {
        let rules = RuleSet {
            options: Some(vec![Value::String("a".into()), Value::String("b".into())]),
            ..RuleSet::default()
        };
        assert!(matches!(
            evaluate(Value::String("b".into()), &rules, "x").unwrap(),
            Verdict::Accepted(_)
        ));
        assert_eq!(
            evaluate(Value::String("c".into()), &rules, "x").unwrap(),
            Verdict::Rejected(Rejection::NotAnOption)
        );
    }

    #[test]
    fn options_compare_numbers_across_int_and_float() {
        let rules = RuleSet {
            coercion: Some(Coercion::Float),
            options: Some(vec![Value::Integer(1), Value::Integer(2)]),
            ..RuleSet::default()
        };
        let verdict = evaluate(Value::Integer(2), &rules, "x").unwrap();
        assert_eq!(verdict, Verdict::Accepted(Value::Float(2.0)));
    }

    #[test]
    fn regex_matches_prefix_only() {
        let rules = RuleSet {
            pattern: Some(Pattern::new("[0-9]+").unwrap()),
            ..RuleSet::default()
        };
        assert!(matches!(
            evaluate(Value::String("123abc".into()), &rules, "x").unwrap(),
            Verdict::Accepted(_)
        ));
        assert_eq!(
            evaluate(Value::String("abc123".into()), &rules, "x").unwrap(),
            Verdict::Rejected(Rejection::PatternMismatch)
        );
    }

    #[test]
    fn regex_rejects_non_strings() {
        let rules = RuleSet {
            pattern: Some(Pattern::new("[0-9]+").unwrap()),
            ..RuleSet::default()
        };
        assert_eq!(
            evaluate(Value::Integer(123), &rules, "x").unwrap(),
            Verdict::Rejected(Rejection::PatternMismatch)
        );
    }

    #[test]
    fn string_bounds_use_character_count() {
        let rules = bounds(3.0, 4.0);
        assert!(matches!(
            evaluate(Value::String("héhé".into()), &rules, "x").unwrap(),
            Verdict::Accepted(_)
        ));
        assert_eq!(
            evaluate(Value::String("ab".into()), &rules, "x").unwrap(),
            Verdict::Rejected(Rejection::OutOfBounds)
        );
    }

    #[test]
    fn array_bounds_use_length() {
        let rules = bounds(0.0, 1.0);
        let arr = Value::Array(vec![Value::Integer(100), Value::Integer(200)]);
        assert_eq!(
            evaluate(arr, &rules, "x").unwrap(),
            Verdict::Rejected(Rejection::OutOfBounds)
        );
    }

    #[test]
    fn bounds_are_inclusive() {
        let rules = bounds(1.0, 10.0);
        for n in [1, 10] {
            assert!(matches!(
                evaluate(Value::Integer(n), &rules, "x").unwrap(),
                Verdict::Accepted(_)
            ));
        }
    }

    #[test]
    fn only_one_bound_declared() {
        let rules = RuleSet {
            nmin: Some(0.5),
            ..RuleSet::default()
        };
        assert!(matches!(
            evaluate(Value::Float(1e9), &rules, "x").unwrap(),
            Verdict::Accepted(_)
        ));
        assert_eq!(
            evaluate(Value::Float(0.1), &rules, "x").unwrap(),
            Verdict::Rejected(Rejection::OutOfBounds)
        );
    }

    #[test]
    fn datetime_with_bounds_is_an_error() {
        let table: Table = toml::from_str("when = 1979-05-27").unwrap();
        let when = table["when"].clone();
        let err = evaluate(when, &bounds(0.0, 1.0), "settings.when").unwrap_err();
        assert!(matches!(
            err,
            ConfguardError::Incomparable { ref key, .. } if key == "settings.when"
        ));
    }

    #[test]
    fn datetime_without_bounds_is_accepted() {
        let table: Table = toml::from_str("when = 1979-05-27").unwrap();
        let when = table["when"].clone();
        assert!(matches!(
            evaluate(when, &RuleSet::default(), "x").unwrap(),
            Verdict::Accepted(_)
        ));
    }

    #[test]
    fn first_failing_test_wins() {
        let template = Template::parse(
            "x = { type = \"str\", options = [\"abc\"], regex = \"z\", nmin = 10 }\n",
        )
        .unwrap();
        let rules = template.rules_at(&["x"]).unwrap();
        assert_eq!(
            evaluate(Value::String("zzz".into()), rules, "x").unwrap(),
            Verdict::Rejected(Rejection::NotAnOption)
        );
        assert_eq!(
            evaluate(Value::String("abc".into()), rules, "x").unwrap(),
            Verdict::Rejected(Rejection::PatternMismatch)
        );
    }
}
