//! Table and column schema (§3).

use crate::ast::ColumnDef;
use crate::value::{SqlType, Value};

/// A column's schema-level metadata, derived from a [`ColumnDef`] at CREATE
/// TABLE / ALTER TABLE time.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data_type: SqlType,
    pub primary_key: bool,
    pub auto_increment: bool,
    pub unique: bool,
    pub not_null: bool,
    pub default: Option<Value>,
}

impl From<ColumnDef> for Column {
    /// A primary key is automatically unique and not-null (§3).
    fn from(def: ColumnDef) -> Self {
        let is_pk = def.primary_key;
        Column {
            name: def.name,
            data_type: def.data_type,
            primary_key: is_pk,
            auto_increment: def.auto_increment,
            unique: def.unique || is_pk,
            not_null: def.not_null || is_pk,
            default: def.default,
        }
    }
}

/// A table's schema: name, ordered columns, and the set of indexed
/// (primary-key or unique) column names (§3).
#[derive(Debug, Clone, PartialEq)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<Column>,
}

impl TableSchema {
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            name: name.into(),
            columns,
        }
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name.eq_ignore_ascii_case(name))
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn primary_key_column(&self) -> Option<&Column> {
        self.columns.iter().find(|c| c.primary_key)
    }

    /// Names of every column that carries an index: primary key or unique
    /// (§3, §4.4).
    pub fn indexed_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.primary_key || c.unique)
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::ColumnDef;

    #[test]
    fn primary_key_implies_unique_and_not_null() {
        let mut def = ColumnDef::new("id", SqlType::Integer);
        def.primary_key = true;
        let col: Column = def.into();
        assert!(col.unique);
        assert!(col.not_null);
    }

    #[test]
    fn column_lookup_is_case_insensitive() {
        let schema = TableSchema::new(
            "t",
            vec![Column::from(ColumnDef::new("Name", SqlType::Text))],
        );
        assert!(schema.column("NAME").is_some());
    }
}
