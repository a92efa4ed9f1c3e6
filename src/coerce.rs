//! Named value coercions for the `type` rule attribute.
//!
//! Coercions form a closed set resolved when the template is loaded. A value
//! that cannot be converted is reported as `None` and treated by the checker
//! as a wrong-type rejection.

use std::fmt;
use std::str::FromStr;

use toml::Value;

use crate::template::format_value;

/// A conversion a rule set may apply before its other tests run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coercion {
    Int,
    Float,
    Bool,
    Str,
}

impl Coercion {
    /// Convert `value`, returning `None` when it has no representation in the
    /// target type.
    pub fn apply(self, value: &Value) -> Option<Value> {
        match self {
            Coercion::Int => to_int(value).map(Value::Integer),
            Coercion::Float => to_float(value).map(Value::Float),
            Coercion::Bool => to_bool(value).map(Value::Boolean),
            Coercion::Str => Some(Value::String(format_value(value))),
        }
    }

    /// Convert raw operator input. Same rules as [`apply`](Self::apply) on a
    /// string value.
    pub fn parse(self, raw: &str) -> Option<Value> {
        self.apply(&Value::String(raw.to_string()))
    }

    pub fn name(self) -> &'static str {
        match self {
            Coercion::Int => "int",
            Coercion::Float => "float",
            Coercion::Bool => "bool",
            Coercion::Str => "str",
        }
    }
}

impl FromStr for Coercion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "int" => Ok(Coercion::Int),
            "float" => Ok(Coercion::Float),
            "bool" => Ok(Coercion::Bool),
            "str" => Ok(Coercion::Str),
            other => Err(format!(
                "unknown type '{other}' (expected one of: int, float, bool, str)"
            )),
        }
    }
}

impl fmt::Display for Coercion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn to_int(value: &Value) -> Option<i64> {
    match value {
        Value::Integer(i) => Some(*i),
        Value::Float(f) if f.is_finite() && f.trunc().abs() < i64::MAX as f64 => {
            Some(f.trunc() as i64)
        }
        Value::Boolean(b) => Some(i64::from(*b)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

fn to_float(value: &Value) -> Option<f64> {
    match value {
        Value::Float(f) => Some(*f),
        Value::Integer(i) => Some(*i as f64),
        Value::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn to_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Boolean(b) => Some(*b),
        Value::Integer(0) => Some(false),
        Value::Integer(1) => Some(true),
        Value::String(s) => {
            let s = s.trim();
            if s.eq_ignore_ascii_case("true") || s == "1" {
                Some(true)
            } else if s.eq_ignore_ascii_case("false") || s == "0" {
                Some(false)
            } else {
                None
            }
        }
        _ => None,
    }
}
