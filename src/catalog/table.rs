//! Per-table row store: schema + row vector + owned indexes + auto-increment
//! counter (§3, §4.4).

use std::collections::HashMap;

use crate::catalog::index::Index;
use crate::catalog::schema::{Column, TableSchema};
use crate::error::{ConstraintKind, Error, Result};
use crate::value::Value;

/// A row is stored as a vector of values in the table's current schema
/// order (§3).
pub type Row = Vec<Value>;

/// The result of a single-row or multi-row INSERT (§4.4, §6).
#[derive(Debug, Clone, Default)]
pub struct InsertOutcome {
    pub rows_affected: u64,
    pub last_insert_id: Option<i64>,
}

/// A table: schema, rows, and every index keyed by indexed column name
/// (§3).
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub schema: TableSchema,
    rows: Vec<Row>,
    indexes: HashMap<String, Index>,
    auto_increment_next: i64,
}

impl Table {
    pub fn new(schema: TableSchema) -> Self {
        let mut indexes = HashMap::new();
        for col in schema.indexed_columns() {
            indexes.insert(col.name.clone(), Index::new(col.name.clone(), true));
        }
        Self {
            schema,
            rows: Vec::new(),
            indexes,
            auto_increment_next: 1,
        }
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Row iterator paired with its current position, for callers that need
    /// the row as a name→value mapping (§3).
    pub fn rows_as_maps(&self) -> Vec<HashMap<String, Value>> {
        self.rows.iter().map(|row| self.row_to_map(row)).collect()
    }

    fn row_to_map(&self, row: &Row) -> HashMap<String, Value> {
        self.schema
            .columns
            .iter()
            .zip(row.iter())
            .map(|(col, val)| (col.name.clone(), val.clone()))
            .collect()
    }

    fn column_index(&self, name: &str) -> Option<usize> {
        self.schema
            .columns
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Insert one row from a sparse name→value map, applying defaults,
    /// auto-increment, coercion, and index maintenance (§4.4).
    pub fn insert(&mut self, data: &HashMap<String, Value>) -> Result<InsertOutcome> {
        let position = self.rows.len();
        let mut row = Vec::with_capacity(self.schema.columns.len());
        let mut last_insert_id = None;

        for col in &self.schema.columns {
            let value = if col.auto_increment && col.primary_key {
                let id = self.auto_increment_next;
                self.auto_increment_next += 1;
                last_insert_id = Some(id);
                Value::Integer(id)
            } else {
                match data.get(&col.name) {
                    Some(v) => v.clone(),
                    None => match &col.default {
                        Some(default) if !default.is_null() => default.clone(),
                        _ => Value::Null,
                    },
                }
            };
            let coerced = col.data_type.coerce(&value, &col.name)?;
            if col.not_null && coerced.is_null() {
                return Err(Error::constraint(
                    ConstraintKind::NotNull,
                    col.name.clone(),
                    coerced,
                    format!("column {} must not be NULL", col.name),
                ));
            }
            row.push(coerced);
        }

        // Stage index insertions; on any duplicate, undo every partial
        // insertion for this row before returning (§4.4).
        let mut inserted: Vec<&str> = Vec::new();
        for col in &self.schema.columns {
            if !(col.primary_key || col.unique) {
                continue;
            }
            let col_idx = self.column_index(&col.name).unwrap();
            let value = row[col_idx].clone();
            let kind = if col.primary_key {
                ConstraintKind::PrimaryKey
            } else {
                ConstraintKind::Unique
            };
            let idx = self.indexes.get_mut(&col.name).expect("index must exist");
            match idx.insert_as(&value, position, kind) {
                Ok(()) => inserted.push(&col.name),
                Err(err) => {
                    for name in inserted {
                        let v = &row[self.column_index(name).unwrap()];
                        self.indexes.get_mut(name).unwrap().remove(v, position);
                    }
                    return Err(err);
                }
            }
        }

        self.rows.push(row);
        Ok(InsertOutcome {
            rows_affected: 1,
            last_insert_id,
        })
    }

    /// Update matching rows' `assignments`, validating target columns and
    /// coercing new values first (§4.4). Rows already mutated before a
    /// failing row stay mutated (§9 open question, resolved: preserve
    /// observed behaviour).
    pub fn update(
        &mut self,
        assignments: &[(String, Value)],
        predicate: &dyn Fn(&Row, &TableSchema) -> bool,
    ) -> Result<u64> {
        let mut coerced_assignments = Vec::with_capacity(assignments.len());
        for (name, value) in assignments {
            let col = self
                .schema
                .column(name)
                .ok_or_else(|| Error::column_not_found(name.clone()))?
                .clone();
            let coerced = col.data_type.coerce(value, &col.name)?;
            if col.not_null && coerced.is_null() {
                return Err(Error::constraint(
                    ConstraintKind::NotNull,
                    col.name.clone(),
                    coerced,
                    format!("column {} must not be NULL", col.name),
                ));
            }
            coerced_assignments.push((col, coerced));
        }

        let mut affected = 0u64;
        let matching: Vec<usize> = (0..self.rows.len())
            .filter(|&i| predicate(&self.rows[i], &self.schema))
            .collect();

        for position in matching {
            // Stage every indexed column's swap before committing any of
            // them; a later column's failure must not leave an earlier
            // column's index pointing at a value the row vector doesn't
            // hold yet (§3 index-consistency invariant).
            let mut applied: Vec<(&Column, Value, Value)> = Vec::new();
            let mut failure = None;
            for (col, new_value) in &coerced_assignments {
                if !(col.primary_key || col.unique) {
                    continue;
                }
                let col_idx = self.column_index(&col.name).unwrap();
                let old_value = self.rows[position][col_idx].clone();
                let kind = if col.primary_key {
                    ConstraintKind::PrimaryKey
                } else {
                    ConstraintKind::Unique
                };
                let idx = self.indexes.get_mut(&col.name).expect("index must exist");
                idx.remove(&old_value, position);
                match idx.insert_as(new_value, position, kind) {
                    Ok(()) => applied.push((col, old_value, new_value.clone())),
                    Err(err) => {
                        failure = Some(err);
                        break;
                    }
                }
            }
            if let Some(err) = failure {
                for (col, old_value, new_value) in applied {
                    let kind = if col.primary_key {
                        ConstraintKind::PrimaryKey
                    } else {
                        ConstraintKind::Unique
                    };
                    let idx = self.indexes.get_mut(&col.name).unwrap();
                    idx.remove(&new_value, position);
                    idx.insert_as(&old_value, position, kind).ok();
                }
                return Err(err);
            }
            for (col, new_value) in &coerced_assignments {
                let col_idx = self.column_index(&col.name).unwrap();
                self.rows[position][col_idx] = new_value.clone();
            }
            affected += 1;
        }

        Ok(affected)
    }

    /// Delete every row matching `predicate`, then rebuild every index from
    /// the surviving rows (§4.4).
    pub fn delete(&mut self, predicate: &dyn Fn(&Row, &TableSchema) -> bool) -> u64 {
        let matching: Vec<usize> = (0..self.rows.len())
            .filter(|&i| predicate(&self.rows[i], &self.schema))
            .collect();
        if matching.is_empty() {
            return 0;
        }
        for &position in matching.iter().rev() {
            self.rows.remove(position);
        }
        self.rebuild_indexes();
        matching.len() as u64
    }

    fn rebuild_indexes(&mut self) {
        for col in &self.schema.columns {
            if let Some(idx) = self.indexes.get_mut(&col.name) {
                *idx = Index::new(col.name.clone(), true);
            }
        }
        for (position, row) in self.rows.iter().enumerate() {
            for col in &self.schema.columns {
                if !(col.primary_key || col.unique) {
                    continue;
                }
                let col_idx = self.column_index(&col.name).unwrap();
                let kind = if col.primary_key {
                    ConstraintKind::PrimaryKey
                } else {
                    ConstraintKind::Unique
                };
                // MODIFY COLUMN can turn a column unique without
                // re-validating existing rows (§9); ignore collisions here
                // rather than panicking, keeping the first occurrence indexed.
                let _ = self
                    .indexes
                    .get_mut(&col.name)
                    .unwrap()
                    .insert_as(&row[col_idx], position, kind);
            }
        }
    }

    /// Find rows by an indexed column's value, in position order. Returns
    /// empty if the column has no index (§4.4).
    pub fn find_by_index(&self, column: &str, value: &Value) -> Vec<Row> {
        match self.indexes.get(column) {
            Some(idx) => {
                let mut positions = idx.lookup(value);
                positions.sort_unstable();
                positions
                    .into_iter()
                    .map(|p| self.rows[p].clone())
                    .collect()
            }
            None => Vec::new(),
        }
    }

    /// A deep, independent copy: schema, rows, and indexes are all cloned
    /// (§4.4 Clone, used by transaction shadowing).
    pub fn deep_clone(&self) -> Table {
        self.clone()
    }

    /// Atomically replace schema and rows; indexes are rebuilt for the new
    /// schema's primary/unique columns, and the auto-increment counter is
    /// preserved (§4.4 AlterSchema).
    pub fn alter_schema(&mut self, new_schema: TableSchema, new_rows: Vec<Row>) {
        self.schema = new_schema;
        self.rows = new_rows;
        self.indexes = self
            .schema
            .indexed_columns()
            .map(|c| (c.name.clone(), Index::new(c.name.clone(), true)))
            .collect();
        self.rebuild_indexes();
    }

    pub fn auto_increment_next(&self) -> i64 {
        self.auto_increment_next
    }

    pub fn columns(&self) -> &[Column] {
        &self.schema.columns
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::ColumnDef;
    use crate::value::SqlType;

    fn users_table() -> Table {
        let id = Column::from({
            let mut d = ColumnDef::new("id", SqlType::Integer);
            d.primary_key = true;
            d.auto_increment = true;
            d
        });
        let email = Column::from({
            let mut d = ColumnDef::new("e", SqlType::Text);
            d.unique = true;
            d.not_null = true;
            d
        });
        Table::new(TableSchema::new("u", vec![id, email]))
    }

    #[test]
    fn insert_assigns_auto_increment_and_last_insert_id() {
        let mut t = users_table();
        let mut data = HashMap::new();
        data.insert("e".to_string(), Value::Text("a@x".into()));
        let outcome = t.insert(&data).unwrap();
        assert_eq!(outcome.last_insert_id, Some(1));
        assert_eq!(t.row_count(), 1);
    }

    #[test]
    fn insert_rejects_case_insensitive_unique_collision() {
        let mut t = users_table();
        let mut data = HashMap::new();
        data.insert("e".to_string(), Value::Text("a@x".into()));
        t.insert(&data).unwrap();
        let mut data2 = HashMap::new();
        data2.insert("e".to_string(), Value::Text("A@X".into()));
        let err = t.insert(&data2);
        assert!(err.is_err());
        assert_eq!(t.row_count(), 1);
    }

    #[test]
    fn delete_then_insert_reuses_position_consistently() {
        let mut t = users_table();
        let mut data = HashMap::new();
        data.insert("e".to_string(), Value::Text("a@x".into()));
        t.insert(&data).unwrap();
        t.delete(&|row, schema| {
            let idx = schema.column("id").unwrap();
            let pos = schema.columns.iter().position(|c| c.name == idx.name).unwrap();
            row[pos] == Value::Integer(1)
        });
        assert_eq!(t.row_count(), 0);
        let mut data2 = HashMap::new();
        data2.insert("e".to_string(), Value::Text("c@z".into()));
        t.insert(&data2).unwrap();
        assert_eq!(t.row_count(), 1);
        assert_eq!(t.find_by_index("e", &Value::Text("c@z".into())).len(), 1);
    }

    #[test]
    fn update_rolls_back_every_indexed_column_on_later_failure() {
        let a = Column::from({
            let mut d = ColumnDef::new("a", SqlType::Integer);
            d.unique = true;
            d
        });
        let b = Column::from({
            let mut d = ColumnDef::new("b", SqlType::Integer);
            d.unique = true;
            d
        });
        let mut t = Table::new(TableSchema::new("t", vec![a, b]));
        let mut row0 = HashMap::new();
        row0.insert("a".to_string(), Value::Integer(1));
        row0.insert("b".to_string(), Value::Integer(1));
        t.insert(&row0).unwrap();
        let mut row1 = HashMap::new();
        row1.insert("a".to_string(), Value::Integer(2));
        row1.insert("b".to_string(), Value::Integer(2));
        t.insert(&row1).unwrap();

        // Row 1 (a=2,b=2) -> a=3 succeeds first, then b=1 collides with row
        // 0's b. The whole update must fail and leave both indexes pointing
        // at row 1's original values.
        let assignments = vec![
            ("a".to_string(), Value::Integer(3)),
            ("b".to_string(), Value::Integer(1)),
        ];
        let err = t.update(&assignments, &|row, schema| {
            let idx = schema.columns.iter().position(|c| c.name == "a").unwrap();
            row[idx] == Value::Integer(2)
        });
        assert!(err.is_err());

        assert_eq!(t.find_by_index("a", &Value::Integer(3)).len(), 0);
        let via_a = t.find_by_index("a", &Value::Integer(2));
        assert_eq!(via_a.len(), 1);
        assert_eq!(via_a[0][1], Value::Integer(2));
    }
}
