//! Statement execution: turns a parsed [`Statement`] into a [`QueryResult`]
//! against a [`Catalog`] (§4.5).

pub mod predicate;

use std::collections::HashMap;
use std::time::Instant;

use log::{debug, trace, warn};

use crate::ast::{
    AlterAction, AlterTableStmt, CreateTableStmt, DeleteStmt, DropTableStmt, InsertStmt,
    JoinClause, JoinType, SelectColumns, SelectStmt, Statement, UpdateStmt,
};
use crate::catalog::{Catalog, Column, InsertOutcome, Row, Table, TableSchema};
use crate::error::{Error, Result};
use crate::result::{ColumnDescription, QueryResult, QueryResultKind, TableDescription};
use crate::value::Value;

use predicate::{compare_for_order, eval_condition, eval_condition_on_map, resolve_column};

/// Execute one statement, timing the whole operation (§4.5, §6).
///
/// `BEGIN`/`COMMIT`/`ROLLBACK` are intercepted by the session before
/// reaching here; seeing one at this layer is a caller bug.
pub fn execute(catalog: &mut Catalog, stmt: &Statement) -> QueryResult {
    let start = Instant::now();
    trace!("executing statement: {stmt:?}");
    let outcome = execute_inner(catalog, stmt);
    let elapsed = start.elapsed();
    match outcome {
        Ok(kind) => QueryResult::new(kind, elapsed),
        Err(err) => {
            match err {
                Error::Constraint { .. } | Error::Syntax { .. } => warn!("statement failed: {err}"),
                _ => debug!("statement failed: {err}"),
            }
            QueryResult::error(err, elapsed)
        }
    }
}

fn execute_inner(catalog: &mut Catalog, stmt: &Statement) -> Result<QueryResultKind> {
    match stmt {
        Statement::CreateTable(s) => execute_create_table(catalog, s),
        Statement::AlterTable(s) => execute_alter_table(catalog, s),
        Statement::DropTable(s) => execute_drop_table(catalog, s),
        Statement::Insert(s) => execute_insert(catalog, s),
        Statement::Select(s) => execute_select(catalog, s),
        Statement::Update(s) => execute_update(catalog, s),
        Statement::Delete(s) => execute_delete(catalog, s),
        Statement::ShowTables => Ok(QueryResultKind::ShowTables {
            tables: catalog.table_names(),
        }),
        Statement::Describe(table) => execute_describe(catalog, table),
        Statement::Begin | Statement::Commit | Statement::Rollback => Err(Error::transaction(
            "transaction control statements must be handled by the session",
        )),
    }
}

fn execute_create_table(catalog: &mut Catalog, stmt: &CreateTableStmt) -> Result<QueryResultKind> {
    if catalog.has_table(&stmt.table) {
        if stmt.if_not_exists {
            return Ok(QueryResultKind::CreateTable {
                table: stmt.table.clone(),
            });
        }
        return Err(Error::table_already_exists(stmt.table.clone()));
    }

    let pk_count = stmt.columns.iter().filter(|c| c.primary_key).count();
    if pk_count > 1 {
        return Err(Error::execution(format!(
            "table {} declares more than one primary key column",
            stmt.table
        )));
    }
    if let Some(bad) = stmt
        .columns
        .iter()
        .find(|c| c.auto_increment && !c.primary_key)
    {
        return Err(Error::execution(format!(
            "column {} is AUTO_INCREMENT but not the primary key",
            bad.name
        )));
    }

    let columns: Vec<Column> = stmt.columns.iter().cloned().map(Column::from).collect();
    catalog.insert_table(Table::new(TableSchema::new(stmt.table.clone(), columns)));
    debug!("created table {}", stmt.table);
    Ok(QueryResultKind::CreateTable {
        table: stmt.table.clone(),
    })
}

fn execute_alter_table(catalog: &mut Catalog, stmt: &AlterTableStmt) -> Result<QueryResultKind> {
    let table = catalog
        .table_mut(&stmt.table)
        .ok_or_else(|| Error::table_not_found(stmt.table.clone()))?;

    match &stmt.action {
        AlterAction::AddColumn(def) => {
            if table.schema.has_column(&def.name) {
                return Err(Error::execution(format!(
                    "column {} already exists on table {}",
                    def.name, stmt.table
                )));
            }
            let column = Column::from(def.clone());
            let fill = column.default.clone().unwrap_or(Value::Null);
            let mut new_schema = table.schema.clone();
            new_schema.columns.push(column);
            let new_rows: Vec<Row> = table
                .rows()
                .iter()
                .map(|row| {
                    let mut row = row.clone();
                    row.push(fill.clone());
                    row
                })
                .collect();
            table.alter_schema(new_schema, new_rows);
        }
        AlterAction::DropColumn(name) => {
            let idx = table
                .schema
                .columns
                .iter()
                .position(|c| c.name.eq_ignore_ascii_case(name))
                .ok_or_else(|| Error::column_not_found(name.clone()))?;
            let mut new_schema = table.schema.clone();
            new_schema.columns.remove(idx);
            let new_rows: Vec<Row> = table
                .rows()
                .iter()
                .map(|row| {
                    let mut row = row.clone();
                    row.remove(idx);
                    row
                })
                .collect();
            table.alter_schema(new_schema, new_rows);
        }
        AlterAction::RenameColumn { old, new } => {
            let idx = table
                .schema
                .columns
                .iter()
                .position(|c| c.name.eq_ignore_ascii_case(old))
                .ok_or_else(|| Error::column_not_found(old.clone()))?;
            if table.schema.has_column(new) {
                return Err(Error::execution(format!(
                    "column {new} already exists on table {}",
                    stmt.table
                )));
            }
            let mut new_schema = table.schema.clone();
            new_schema.columns[idx].name = new.clone();
            let rows = table.rows().to_vec();
            table.alter_schema(new_schema, rows);
        }
        AlterAction::ModifyColumn(def) => {
            // Existing values are not re-validated against the new type or
            // constraints (§9 open question, resolved against re-validation).
            let idx = table
                .schema
                .columns
                .iter()
                .position(|c| c.name.eq_ignore_ascii_case(&def.name))
                .ok_or_else(|| Error::column_not_found(def.name.clone()))?;
            let mut new_schema = table.schema.clone();
            new_schema.columns[idx] = Column::from(def.clone());
            let rows = table.rows().to_vec();
            table.alter_schema(new_schema, rows);
        }
    }
    debug!("altered table {}", stmt.table);
    Ok(QueryResultKind::Ok)
}

fn execute_drop_table(catalog: &mut Catalog, stmt: &DropTableStmt) -> Result<QueryResultKind> {
    match catalog.remove_table(&stmt.table) {
        Some(_) => Ok(QueryResultKind::DropTable {
            table: stmt.table.clone(),
        }),
        None if stmt.if_exists => Ok(QueryResultKind::DropTable {
            table: stmt.table.clone(),
        }),
        None => Err(Error::table_not_found(stmt.table.clone())),
    }
}

fn execute_insert(catalog: &mut Catalog, stmt: &InsertStmt) -> Result<QueryResultKind> {
    let table = catalog
        .table_mut(&stmt.table)
        .ok_or_else(|| Error::table_not_found(stmt.table.clone()))?;

    let column_names: Vec<String> = match &stmt.columns {
        Some(names) => {
            for name in names {
                if !table.schema.has_column(name) {
                    return Err(Error::column_not_found(name.clone()));
                }
            }
            names.clone()
        }
        None => table.schema.column_names(),
    };

    let mut rows_affected = 0u64;
    let mut last_insert_id = None;

    for values in &stmt.rows {
        if values.len() != column_names.len() {
            return Err(Error::execution(format!(
                "expected {} values, found {}",
                column_names.len(),
                values.len()
            )));
        }
        let data: HashMap<String, Value> = column_names
            .iter()
            .cloned()
            .zip(values.iter().cloned())
            .collect();
        let InsertOutcome {
            rows_affected: n,
            last_insert_id: id,
        } = table.insert(&data)?;
        rows_affected += n;
        if id.is_some() {
            last_insert_id = id;
        }
    }

    Ok(QueryResultKind::Insert {
        rows_affected,
        last_insert_id,
    })
}

fn execute_update(catalog: &mut Catalog, stmt: &UpdateStmt) -> Result<QueryResultKind> {
    let table = catalog
        .table_mut(&stmt.table)
        .ok_or_else(|| Error::table_not_found(stmt.table.clone()))?;
    let condition = stmt.where_clause.clone();
    let predicate = move |row: &Row, schema: &TableSchema| match &condition {
        Some(c) => eval_condition(c, row, schema),
        None => true,
    };
    let rows_affected = table.update(&stmt.assignments, &predicate)?;
    Ok(QueryResultKind::Update { rows_affected })
}

fn execute_delete(catalog: &mut Catalog, stmt: &DeleteStmt) -> Result<QueryResultKind> {
    let table = catalog
        .table_mut(&stmt.table)
        .ok_or_else(|| Error::table_not_found(stmt.table.clone()))?;
    let condition = stmt.where_clause.clone();
    let predicate = move |row: &Row, schema: &TableSchema| match &condition {
        Some(c) => eval_condition(c, row, schema),
        None => true,
    };
    let rows_affected = table.delete(&predicate);
    Ok(QueryResultKind::Delete { rows_affected })
}

fn execute_describe(catalog: &Catalog, table_name: &str) -> Result<QueryResultKind> {
    let table = catalog
        .table(table_name)
        .ok_or_else(|| Error::table_not_found(table_name.to_string()))?;
    Ok(QueryResultKind::Describe {
        schema: TableDescription {
            table: table.schema.name.clone(),
            columns: table
                .schema
                .columns
                .iter()
                .map(ColumnDescription::from)
                .collect(),
        },
    })
}

fn execute_select(catalog: &Catalog, stmt: &SelectStmt) -> Result<QueryResultKind> {
    let left = catalog
        .table(&stmt.table)
        .ok_or_else(|| Error::table_not_found(stmt.table.clone()))?;

    // Rows carry bare column names when there's no join, and only
    // `<table>.<column>`-qualified names once one is joined in (§4.5). The
    // qualified-only shape is what callers see in the output; `prefixes`
    // lets WHERE/ORDER BY/projection still resolve an unqualified reference
    // against it (left table wins a tie) without that bare name ever
    // reaching the result.
    let mut prefixes: Vec<&str> = Vec::new();
    let mut rows: Vec<HashMap<String, Value>> = match &stmt.join {
        Some(join) => {
            let right = catalog
                .table(&join.table)
                .ok_or_else(|| Error::table_not_found(join.table.clone()))?;
            prefixes.push(&stmt.table);
            prefixes.push(&join.table);
            build_joined_rows(&stmt.table, left, &join.table, right, join)?
        }
        None => left.rows_as_maps(),
    };

    if let Some(condition) = &stmt.where_clause {
        rows.retain(|row| eval_condition_on_map(condition, row, &prefixes));
    }

    if let Some(order_by) = &stmt.order_by {
        rows.sort_by(|a, b| {
            let av = resolve_column(a, &order_by.column, &prefixes).unwrap_or(&Value::Null);
            let bv = resolve_column(b, &order_by.column, &prefixes).unwrap_or(&Value::Null);
            compare_for_order(av, bv, order_by.direction)
        });
    }

    if let Some(limit) = stmt.limit {
        rows.truncate(limit);
    }

    let rows: Vec<HashMap<String, Value>> = rows
        .into_iter()
        .map(|row| project(&stmt.columns, row, &prefixes))
        .collect();
    let row_count = rows.len();
    Ok(QueryResultKind::Select { rows, row_count })
}

fn project(
    columns: &SelectColumns,
    row: HashMap<String, Value>,
    prefixes: &[&str],
) -> HashMap<String, Value> {
    match columns {
        SelectColumns::All => row,
        SelectColumns::List(names) => names
            .iter()
            .map(|name| {
                let value = resolve_column(&row, name, prefixes)
                    .cloned()
                    .unwrap_or(Value::Null);
                (name.clone(), value)
            })
            .collect(),
    }
}

/// Build the joined row set (§4.5). Every output row carries only
/// `<table>.<column>`-qualified keys; unqualified WHERE/ORDER BY/projection
/// references are resolved against that qualified shape separately by
/// `resolve_column`, so a bare reference keeps working without the bare
/// name itself ever reaching the result.
fn build_joined_rows(
    left_table: &str,
    left: &Table,
    right_table: &str,
    right: &Table,
    join: &JoinClause,
) -> Result<Vec<HashMap<String, Value>>> {
    if !left.schema.has_column(&join.left_key) {
        return Err(Error::column_not_found(join.left_key.clone()));
    }
    if !right.schema.has_column(&join.right_key) {
        return Err(Error::column_not_found(join.right_key.clone()));
    }

    let mut out = Vec::new();
    match join.join_type {
        JoinType::Inner | JoinType::Left => {
            for left_row in left.rows_as_maps() {
                let left_key_value = left_row.get(&join.left_key).cloned().unwrap_or(Value::Null);
                let mut matched = false;
                for right_row in right.rows_as_maps() {
                    let right_key_value = right_row
                        .get(&join.right_key)
                        .cloned()
                        .unwrap_or(Value::Null);
                    if left_key_value.sql_eq(&right_key_value) {
                        matched = true;
                        out.push(combine_rows(
                            left_table,
                            &left_row,
                            right_table,
                            &right_row,
                        ));
                    }
                }
                if !matched && join.join_type == JoinType::Left {
                    out.push(if right.row_count() == 0 {
                        qualify(left_table, &left_row)
                    } else {
                        combine_rows(left_table, &left_row, right_table, &null_row(right))
                    });
                }
            }
        }
        JoinType::Right => {
            for right_row in right.rows_as_maps() {
                let right_key_value = right_row
                    .get(&join.right_key)
                    .cloned()
                    .unwrap_or(Value::Null);
                let mut matched = false;
                for left_row in left.rows_as_maps() {
                    let left_key_value =
                        left_row.get(&join.left_key).cloned().unwrap_or(Value::Null);
                    if left_key_value.sql_eq(&right_key_value) {
                        matched = true;
                        out.push(combine_rows(
                            left_table,
                            &left_row,
                            right_table,
                            &right_row,
                        ));
                    }
                }
                if !matched {
                    out.push(if left.row_count() == 0 {
                        qualify(right_table, &right_row)
                    } else {
                        combine_rows(left_table, &null_row(left), right_table, &right_row)
                    });
                }
            }
        }
    }
    Ok(out)
}

fn null_row(table: &Table) -> HashMap<String, Value> {
    table
        .columns()
        .iter()
        .map(|c| (c.name.clone(), Value::Null))
        .collect()
}

/// Qualify a single side's row in isolation, with no keys at all from the
/// other side — used when the other side has zero rows total, so its
/// columns are absent from the output rather than present-and-NULL (§4.5).
fn qualify(table: &str, row: &HashMap<String, Value>) -> HashMap<String, Value> {
    row.iter()
        .map(|(name, value)| (format!("{table}.{name}"), value.clone()))
        .collect()
}

fn combine_rows(
    left_table: &str,
    left_row: &HashMap<String, Value>,
    right_table: &str,
    right_row: &HashMap<String, Value>,
) -> HashMap<String, Value> {
    let mut combined = HashMap::with_capacity(left_row.len() + right_row.len());
    for (name, value) in left_row {
        combined.insert(format!("{left_table}.{name}"), value.clone());
    }
    for (name, value) in right_row {
        combined.insert(format!("{right_table}.{name}"), value.clone());
    }
    combined
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_statements;

    fn run(catalog: &mut Catalog, sql: &str) -> QueryResult {
        let stmt = parse_statements(sql).unwrap().remove(0);
        execute(catalog, &stmt)
    }

    #[test]
    fn create_insert_select_round_trip() {
        let mut catalog = Catalog::new();
        run(
            &mut catalog,
            "CREATE TABLE u (id INTEGER PRIMARY KEY AUTO_INCREMENT, name TEXT NOT NULL)",
        );
        run(&mut catalog, "INSERT INTO u (name) VALUES ('alice'), ('bob')");
        let result = run(&mut catalog, "SELECT * FROM u WHERE name = 'alice'");
        match result.kind {
            QueryResultKind::Select { row_count, .. } => assert_eq!(row_count, 1),
            other => panic!("unexpected kind: {other:?}"),
        }
    }

    #[test]
    fn create_table_rejects_second_primary_key() {
        let mut catalog = Catalog::new();
        let result = run(
            &mut catalog,
            "CREATE TABLE t (a INTEGER PRIMARY KEY, b INTEGER PRIMARY KEY)",
        );
        assert!(!result.success);
    }

    #[test]
    fn inner_join_prefixes_columns_and_drops_bare_names() {
        let mut catalog = Catalog::new();
        run(
            &mut catalog,
            "CREATE TABLE orders (id INTEGER PRIMARY KEY, customer_id INTEGER)",
        );
        run(
            &mut catalog,
            "CREATE TABLE customers (id INTEGER PRIMARY KEY, name TEXT)",
        );
        run(
            &mut catalog,
            "INSERT INTO customers (id, name) VALUES (1, 'alice')",
        );
        run(
            &mut catalog,
            "INSERT INTO orders (id, customer_id) VALUES (1, 1)",
        );
        let result = run(
            &mut catalog,
            "SELECT * FROM orders JOIN customers ON customer_id = id",
        );
        match result.kind {
            QueryResultKind::Select { rows, row_count } => {
                assert_eq!(row_count, 1);
                assert_eq!(rows[0].len(), 4);
                assert_eq!(
                    rows[0].get("customers.name"),
                    Some(&Value::Text("alice".into()))
                );
                assert!(!rows[0].contains_key("name"));
                assert!(!rows[0].contains_key("id"));
            }
            other => panic!("unexpected kind: {other:?}"),
        }
    }

    #[test]
    fn where_after_join_resolves_unqualified_column_against_prefixed_row() {
        let mut catalog = Catalog::new();
        run(
            &mut catalog,
            "CREATE TABLE orders (id INTEGER PRIMARY KEY, customer_id INTEGER)",
        );
        run(
            &mut catalog,
            "CREATE TABLE customers (id INTEGER PRIMARY KEY, name TEXT)",
        );
        run(
            &mut catalog,
            "INSERT INTO customers (id, name) VALUES (1, 'alice')",
        );
        run(
            &mut catalog,
            "INSERT INTO orders (id, customer_id) VALUES (1, 1)",
        );
        let result = run(
            &mut catalog,
            "SELECT * FROM orders JOIN customers ON customer_id = id WHERE name = 'alice'",
        );
        match result.kind {
            QueryResultKind::Select { row_count, .. } => assert_eq!(row_count, 1),
            other => panic!("unexpected kind: {other:?}"),
        }
    }

    #[test]
    fn left_join_pads_unmatched_rows_with_null_when_right_has_other_rows() {
        let mut catalog = Catalog::new();
        run(&mut catalog, "CREATE TABLE a (id INTEGER PRIMARY KEY)");
        run(&mut catalog, "CREATE TABLE b (a_id INTEGER)");
        run(&mut catalog, "INSERT INTO a (id) VALUES (1)");
        run(&mut catalog, "INSERT INTO b (a_id) VALUES (99)");
        let result = run(&mut catalog, "SELECT * FROM a LEFT JOIN b ON id = a_id");
        match result.kind {
            QueryResultKind::Select { rows, row_count } => {
                assert_eq!(row_count, 1);
                assert_eq!(rows[0].get("b.a_id"), Some(&Value::Null));
            }
            other => panic!("unexpected kind: {other:?}"),
        }
    }

    #[test]
    fn left_join_omits_right_columns_entirely_when_right_table_is_empty() {
        let mut catalog = Catalog::new();
        run(&mut catalog, "CREATE TABLE a (id INTEGER PRIMARY KEY)");
        run(&mut catalog, "CREATE TABLE b (a_id INTEGER)");
        run(&mut catalog, "INSERT INTO a (id) VALUES (1)");
        let result = run(&mut catalog, "SELECT * FROM a LEFT JOIN b ON id = a_id");
        match result.kind {
            QueryResultKind::Select { rows, row_count } => {
                assert_eq!(row_count, 1);
                assert!(!rows[0].contains_key("b.a_id"));
                assert_eq!(rows[0].len(), 1);
            }
            other => panic!("unexpected kind: {other:?}"),
        }
    }

    #[test]
    fn order_by_and_limit_apply_before_projection() {
        let mut catalog = Catalog::new();
        run(&mut catalog, "CREATE TABLE t (n INTEGER)");
        run(&mut catalog, "INSERT INTO t (n) VALUES (3), (1), (2)");
        let result = run(&mut catalog, "SELECT n FROM t ORDER BY n ASC LIMIT 2");
        match result.kind {
            QueryResultKind::Select { rows, .. } => {
                assert_eq!(rows[0].get("n"), Some(&Value::Integer(1)));
                assert_eq!(rows[1].get("n"), Some(&Value::Integer(2)));
            }
            other => panic!("unexpected kind: {other:?}"),
        }
    }

    #[test]
    fn delete_rebuilds_indexes_so_reinsert_succeeds() {
        let mut catalog = Catalog::new();
        run(
            &mut catalog,
            "CREATE TABLE t (id INTEGER PRIMARY KEY, e TEXT UNIQUE)",
        );
        run(&mut catalog, "INSERT INTO t (id, e) VALUES (1, 'a@x')");
        run(&mut catalog, "DELETE FROM t WHERE id = 1");
        let result = run(&mut catalog, "INSERT INTO t (id, e) VALUES (2, 'a@x')");
        assert!(result.success);
    }
}
