//! Error taxonomy for the engine.
//!
//! Every fallible path in the crate returns [`Result`], whose error side is a
//! single [`Error`] enum matching the taxonomy a host collaborator needs to
//! dispatch on: syntax errors carry a byte position, constraint violations
//! carry the offending column and value, and so on.

use crate::value::Value;
use thiserror::Error as ThisError;

/// The sub-kind of a constraint violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConstraintKind {
    PrimaryKey,
    Unique,
    NotNull,
    TypeMismatch,
}

impl std::fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ConstraintKind::PrimaryKey => "PRIMARY_KEY",
            ConstraintKind::Unique => "UNIQUE",
            ConstraintKind::NotNull => "NOT_NULL",
            ConstraintKind::TypeMismatch => "TYPE_MISMATCH",
        };
        f.write_str(s)
    }
}

/// The crate-wide error type.
#[derive(Debug, Clone, ThisError)]
pub enum Error {
    #[error("syntax error: {message} (at byte {position})")]
    Syntax { message: String, position: usize },

    #[error("table not found: {table}")]
    TableNotFound { table: String },

    #[error("table already exists: {table}")]
    TableAlreadyExists { table: String },

    #[error("column not found: {column}{}", message.as_ref().map(|m| format!(" ({m})")).unwrap_or_default())]
    ColumnNotFound {
        column: String,
        message: Option<String>,
    },

    #[error("{kind} constraint violation on column {column}: {message}")]
    Constraint {
        kind: ConstraintKind,
        column: String,
        value: Value,
        message: String,
    },

    #[error("execution error: {0}")]
    Execution(String),

    #[error("transaction error: {0}")]
    Transaction(String),
}

impl Error {
    pub fn syntax(message: impl Into<String>, position: usize) -> Self {
        Error::Syntax {
            message: message.into(),
            position,
        }
    }

    pub fn table_not_found(table: impl Into<String>) -> Self {
        Error::TableNotFound {
            table: table.into(),
        }
    }

    pub fn table_already_exists(table: impl Into<String>) -> Self {
        Error::TableAlreadyExists {
            table: table.into(),
        }
    }

    pub fn column_not_found(column: impl Into<String>) -> Self {
        Error::ColumnNotFound {
            column: column.into(),
            message: None,
        }
    }

    pub fn column_not_found_with(column: impl Into<String>, message: impl Into<String>) -> Self {
        Error::ColumnNotFound {
            column: column.into(),
            message: Some(message.into()),
        }
    }

    pub fn constraint(
        kind: ConstraintKind,
        column: impl Into<String>,
        value: Value,
        message: impl Into<String>,
    ) -> Self {
        Error::Constraint {
            kind,
            column: column.into(),
            value,
            message: message.into(),
        }
    }

    pub fn execution(message: impl Into<String>) -> Self {
        Error::Execution(message.into())
    }

    pub fn transaction(message: impl Into<String>) -> Self {
        Error::Transaction(message.into())
    }
}

/// A specialized `Result` for this crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn syntax_error_display_includes_position() {
        let err = Error::syntax("unexpected token", 12);
        let msg = format!("{err}");
        assert!(msg.contains("12"));
    }

    #[test]
    fn constraint_error_carries_column_and_value() {
        let err = Error::constraint(
            ConstraintKind::Unique,
            "email",
            Value::Text("a@x".into()),
            "duplicate key",
        );
        match err {
            Error::Constraint { kind, column, .. } => {
                assert_eq!(kind, ConstraintKind::Unique);
                assert_eq!(column, "email");
            }
            _ => panic!("wrong variant"),
        }
    }
}
