//! The discriminated result shape returned to callers (§6).
//!
//! This is the boundary external collaborators (a REPL, an HTTP handler, an
//! ORM adapter) consume; none of them are part of this crate, but the shape
//! they see is.

use std::collections::HashMap;
use std::time::Duration;

use serde::Serialize;

use crate::catalog::schema::Column;
use crate::error::{ConstraintKind, Error};
use crate::value::{SqlType, Value};

/// A single query's outcome, carrying a per-kind payload plus how long it
/// took to execute (§6).
#[derive(Debug, Clone, Serialize)]
pub struct QueryResult {
    pub success: bool,
    #[serde(flatten)]
    pub kind: QueryResultKind,
    pub execution_time_ms: f64,
}

impl QueryResult {
    pub fn new(kind: QueryResultKind, elapsed: Duration) -> Self {
        Self {
            success: !matches!(kind, QueryResultKind::Error { .. }),
            kind,
            execution_time_ms: elapsed.as_secs_f64() * 1000.0,
        }
    }

    pub fn error(error: Error, elapsed: Duration) -> Self {
        Self::new(
            QueryResultKind::Error {
                error: ErrorPayload::from(&error),
            },
            elapsed,
        )
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind")]
pub enum QueryResultKind {
    #[serde(rename = "SELECT")]
    Select {
        rows: Vec<HashMap<String, Value>>,
        row_count: usize,
    },
    #[serde(rename = "INSERT")]
    Insert {
        rows_affected: u64,
        last_insert_id: Option<i64>,
    },
    #[serde(rename = "UPDATE")]
    Update { rows_affected: u64 },
    #[serde(rename = "DELETE")]
    Delete { rows_affected: u64 },
    #[serde(rename = "CREATE_TABLE")]
    CreateTable { table: String },
    #[serde(rename = "DROP_TABLE")]
    DropTable { table: String },
    #[serde(rename = "SHOW_TABLES")]
    ShowTables { tables: Vec<String> },
    #[serde(rename = "DESCRIBE")]
    Describe { schema: TableDescription },
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "ERROR")]
    Error { error: ErrorPayload },
}

/// The full schema of a table, as returned by DESCRIBE (§4.5, §6).
#[derive(Debug, Clone, Serialize)]
pub struct TableDescription {
    pub table: String,
    pub columns: Vec<ColumnDescription>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ColumnDescription {
    pub name: String,
    pub data_type: SqlType,
    pub primary_key: bool,
    pub auto_increment: bool,
    pub unique: bool,
    pub not_null: bool,
}

impl From<&Column> for ColumnDescription {
    fn from(col: &Column) -> Self {
        Self {
            name: col.name.clone(),
            data_type: col.data_type,
            primary_key: col.primary_key,
            auto_increment: col.auto_increment,
            unique: col.unique,
            not_null: col.not_null,
        }
    }
}

/// The wire-shaped form of [`Error`] (§7): a kind tag plus whichever fields
/// that kind carries, so a caller can match on `kind` instead of parsing
/// `message`.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorPayload {
    pub kind: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub constraint_kind: Option<ConstraintKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<usize>,
}

impl From<&Error> for ErrorPayload {
    fn from(err: &Error) -> Self {
        let message = err.to_string();
        match err {
            Error::Syntax { position, .. } => ErrorPayload {
                kind: "SYNTAX_ERROR",
                message,
                table: None,
                column: None,
                value: None,
                constraint_kind: None,
                position: Some(*position),
            },
            Error::TableNotFound { table } => ErrorPayload {
                kind: "TABLE_NOT_FOUND",
                message,
                table: Some(table.clone()),
                column: None,
                value: None,
                constraint_kind: None,
                position: None,
            },
            Error::TableAlreadyExists { table } => ErrorPayload {
                kind: "TABLE_ALREADY_EXISTS",
                message,
                table: Some(table.clone()),
                column: None,
                value: None,
                constraint_kind: None,
                position: None,
            },
            Error::ColumnNotFound { column, .. } => ErrorPayload {
                kind: "COLUMN_NOT_FOUND",
                message,
                table: None,
                column: Some(column.clone()),
                value: None,
                constraint_kind: None,
                position: None,
            },
            Error::Constraint {
                kind,
                column,
                value,
                ..
            } => ErrorPayload {
                kind: "CONSTRAINT_VIOLATION",
                message,
                table: None,
                column: Some(column.clone()),
                value: Some(value.clone()),
                constraint_kind: Some(*kind),
                position: None,
            },
            Error::Execution(_) => ErrorPayload {
                kind: "EXECUTION_ERROR",
                message,
                table: None,
                column: None,
                value: None,
                constraint_kind: None,
                position: None,
            },
            Error::Transaction(_) => ErrorPayload {
                kind: "TRANSACTION_ERROR",
                message,
                table: None,
                column: None,
                value: None,
                constraint_kind: None,
                position: None,
            },
        }
    }
}
