//! The catalog: name → table mapping (§3).
//!
//! The session owns exactly one committed [`Catalog`] and, during a
//! transaction, one shadow copy produced by [`Catalog::deep_clone`].

pub mod index;
pub mod schema;
pub mod table;

pub use schema::{Column, TableSchema};
pub use table::{InsertOutcome, Row, Table};

use std::collections::BTreeMap;

/// Name → table mapping, ordered so `SHOW TABLES` and iteration are
/// deterministic without an extra sort.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    tables: BTreeMap<String, Table>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.get(&name.to_ascii_lowercase())
    }

    pub fn table_mut(&mut self, name: &str) -> Option<&mut Table> {
        self.tables.get_mut(&name.to_ascii_lowercase())
    }

    pub fn has_table(&self, name: &str) -> bool {
        self.tables.contains_key(&name.to_ascii_lowercase())
    }

    pub fn insert_table(&mut self, table: Table) {
        self.tables
            .insert(table.schema.name.to_ascii_lowercase(), table);
    }

    pub fn remove_table(&mut self, name: &str) -> Option<Table> {
        self.tables.remove(&name.to_ascii_lowercase())
    }

    /// Sorted table names, matching the original declared (not lowercased)
    /// spelling, for SHOW TABLES (§4.5).
    pub fn table_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.values().map(|t| t.schema.name.clone()).collect();
        names.sort();
        names
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    /// Deep, independent copy used by transaction shadowing (§4.6): row
    /// mutations to the clone must never become visible through `self`.
    pub fn deep_clone(&self) -> Catalog {
        self.clone()
    }
}
