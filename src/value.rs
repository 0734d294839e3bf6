//! Scalar value and SQL type model (§3, §4.3 of the design).
//!
//! [`Value`] is the tagged runtime representation every row cell holds.
//! [`SqlType`] is the declared column type; [`SqlType::coerce`] implements
//! the write-time `TypeValidator` coercion rules.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::error::{ConstraintKind, Error, Result};

/// A tagged scalar value (§3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Integer(i64),
    Text(String),
    Boolean(bool),
    Real(f64),
    /// Epoch milliseconds.
    Date(i64),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// SQL type name this value carries, for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            Value::Integer(_) => "INTEGER",
            Value::Text(_) => "TEXT",
            Value::Boolean(_) => "BOOLEAN",
            Value::Real(_) => "REAL",
            Value::Date(_) => "DATE",
        }
    }

    /// Lowercase text, identity otherwise — the normalisation rule shared by
    /// equality and index keys (§4.3, §3).
    pub fn normalised(&self) -> Value {
        match self {
            Value::Text(s) => Value::Text(s.to_lowercase()),
            other => other.clone(),
        }
    }

    /// Render this value as a normalised index key. Returns `None` for NULL,
    /// which is never indexed.
    pub fn index_key(&self) -> Option<IndexKey> {
        match self.normalised() {
            Value::Null => None,
            Value::Integer(n) => Some(IndexKey::Integer(n)),
            Value::Text(s) => Some(IndexKey::Text(s)),
            Value::Boolean(b) => Some(IndexKey::Boolean(b)),
            Value::Real(f) => Some(IndexKey::Real(f.to_bits())),
            Value::Date(d) => Some(IndexKey::Date(d)),
        }
    }

    /// Coerce this value to a number for ordering comparisons (§4.3).
    /// `TEXT` is parsed numerically; non-numeric text yields `None`.
    pub fn as_ordering_number(&self) -> Option<f64> {
        match self {
            Value::Integer(n) => Some(*n as f64),
            Value::Real(f) => Some(*f),
            Value::Date(ms) => Some(*ms as f64),
            Value::Text(s) => s.trim().parse::<f64>().ok(),
            Value::Boolean(_) | Value::Null => None,
        }
    }

    /// `=` semantics from §4.3: text is case-insensitive, NULL is only equal
    /// to NULL, other types compare by value identity.
    pub fn sql_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Null, _) | (_, Value::Null) => false,
            (Value::Text(a), Value::Text(b)) => a.eq_ignore_ascii_case(b),
            _ => self == other,
        }
    }

    /// Ordering comparison per §4.3; `None` when NULL is involved or the
    /// operands are not numerically coercible.
    pub fn sql_partial_cmp(&self, other: &Value) -> Option<Ordering> {
        if self.is_null() || other.is_null() {
            return None;
        }
        let a = self.as_ordering_number()?;
        let b = other.as_ordering_number()?;
        a.partial_cmp(&b)
    }

    /// String form used for ORDER BY fallback comparisons and DESCRIBE/debug
    /// output.
    pub fn display_string(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::Integer(n) => n.to_string(),
            Value::Text(s) => s.clone(),
            Value::Boolean(b) => b.to_string(),
            Value::Real(f) => f.to_string(),
            Value::Date(ms) => ms.to_string(),
        }
    }
}

/// A hashable, orderable form of [`Value`] used as an index key. NULL has no
/// representation here because NULL is never indexed (§3).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IndexKey {
    Integer(i64),
    Text(String),
    Boolean(bool),
    Real(u64),
    Date(i64),
}

/// Declared SQL column type (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SqlType {
    Integer,
    Text,
    Boolean,
    Real,
    Date,
}

impl std::fmt::Display for SqlType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SqlType::Integer => "INTEGER",
            SqlType::Text => "TEXT",
            SqlType::Boolean => "BOOLEAN",
            SqlType::Real => "REAL",
            SqlType::Date => "DATE",
        };
        f.write_str(s)
    }
}

impl SqlType {
    /// Coerce `value` into this type per the write-time rules of §4.3.
    /// Returns a `TYPE_MISMATCH` constraint violation on failure; the caller
    /// supplies the column name for the error.
    pub fn coerce(&self, value: &Value, column: &str) -> Result<Value> {
        if value.is_null() {
            return Ok(Value::Null);
        }
        match self {
            SqlType::Integer => coerce_integer(value, column),
            SqlType::Text => coerce_text(value, column),
            SqlType::Boolean => coerce_boolean(value, column),
            SqlType::Real => coerce_real(value, column),
            SqlType::Date => coerce_date(value, column),
        }
    }

    fn mismatch(value: &Value, column: &str, target: SqlType) -> Error {
        Error::constraint(
            ConstraintKind::TypeMismatch,
            column,
            value.clone(),
            format!("cannot coerce {} value to {}", value.type_name(), target),
        )
    }
}

fn coerce_integer(value: &Value, column: &str) -> Result<Value> {
    match value {
        Value::Integer(_) => Ok(value.clone()),
        Value::Text(s) => {
            let trimmed = s.trim();
            match trimmed.parse::<i64>() {
                Ok(n) if n.to_string() == trimmed => Ok(Value::Integer(n)),
                _ => Err(SqlType::mismatch(value, column, SqlType::Integer)),
            }
        }
        _ => Err(SqlType::mismatch(value, column, SqlType::Integer)),
    }
}

fn coerce_text(value: &Value, _column: &str) -> Result<Value> {
    match value {
        Value::Text(_) => Ok(value.clone()),
        Value::Integer(n) => Ok(Value::Text(n.to_string())),
        Value::Real(f) => Ok(Value::Text(f.to_string())),
        Value::Boolean(b) => Ok(Value::Text(b.to_string())),
        Value::Date(ms) => Ok(Value::Text(ms.to_string())),
        Value::Null => Ok(Value::Null),
    }
}

fn coerce_boolean(value: &Value, column: &str) -> Result<Value> {
    match value {
        Value::Boolean(_) => Ok(value.clone()),
        Value::Integer(n) => Ok(Value::Boolean(*n != 0)),
        Value::Real(f) => Ok(Value::Boolean(*f != 0.0)),
        Value::Text(s) => match s.to_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(Value::Boolean(true)),
            "false" | "0" | "no" => Ok(Value::Boolean(false)),
            _ => Err(SqlType::mismatch(value, column, SqlType::Boolean)),
        },
        _ => Err(SqlType::mismatch(value, column, SqlType::Boolean)),
    }
}

fn coerce_real(value: &Value, column: &str) -> Result<Value> {
    match value {
        Value::Real(f) if f.is_finite() => Ok(Value::Real(*f)),
        Value::Integer(n) => Ok(Value::Real(*n as f64)),
        Value::Text(s) => match s.trim().parse::<f64>() {
            Ok(f) if f.is_finite() => Ok(Value::Real(f)),
            _ => Err(SqlType::mismatch(value, column, SqlType::Real)),
        },
        _ => Err(SqlType::mismatch(value, column, SqlType::Real)),
    }
}

fn coerce_date(value: &Value, column: &str) -> Result<Value> {
    match value {
        Value::Date(_) => Ok(value.clone()),
        Value::Integer(ms) => Ok(Value::Date(*ms)),
        Value::Text(s) => parse_date_text(s)
            .map(Value::Date)
            .ok_or_else(|| SqlType::mismatch(value, column, SqlType::Date)),
        _ => Err(SqlType::mismatch(value, column, SqlType::Date)),
    }
}

/// Parse a handful of common date/datetime text forms into epoch
/// milliseconds. Not a full ISO-8601 parser; sufficient for the DATE type's
/// scope in this engine.
fn parse_date_text(s: &str) -> Option<i64> {
    let s = s.trim();
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.and_utc().timestamp_millis());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.and_utc().timestamp_millis());
    }
    if let Ok(date) = chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc().timestamp_millis());
    }
    s.parse::<i64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_coerces_from_round_tripping_string() {
        let v = SqlType::Integer
            .coerce(&Value::Text("42".into()), "n")
            .unwrap();
        assert_eq!(v, Value::Integer(42));
    }

    #[test]
    fn integer_rejects_non_round_tripping_string() {
        let err = SqlType::Integer.coerce(&Value::Text("x".into()), "n");
        assert!(err.is_err());
    }

    #[test]
    fn boolean_coerces_from_yes_no() {
        assert_eq!(
            SqlType::Boolean
                .coerce(&Value::Text("yes".into()), "b")
                .unwrap(),
            Value::Boolean(true)
        );
        assert_eq!(
            SqlType::Boolean
                .coerce(&Value::Text("NO".into()), "b")
                .unwrap(),
            Value::Boolean(false)
        );
    }

    #[test]
    fn real_rejects_non_finite_text() {
        assert!(SqlType::Real
            .coerce(&Value::Text("nan".into()), "r")
            .is_err());
    }

    #[test]
    fn text_equality_is_case_insensitive() {
        assert!(Value::Text("A@X".into()).sql_eq(&Value::Text("a@x".into())));
    }

    #[test]
    fn null_equals_only_null() {
        assert!(Value::Null.sql_eq(&Value::Null));
        assert!(!Value::Null.sql_eq(&Value::Integer(0)));
    }

    #[test]
    fn ordering_coerces_date_and_text_numerically() {
        assert_eq!(
            Value::Text("3".into()).sql_partial_cmp(&Value::Integer(4)),
            Some(Ordering::Less)
        );
        assert_eq!(
            Value::Text("abc".into()).sql_partial_cmp(&Value::Integer(4)),
            None
        );
    }
}
