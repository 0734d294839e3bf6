//! Secondary index: value → row-position multimap (§3, §4.4).

use std::collections::BTreeMap;

use crate::error::{ConstraintKind, Error, Result};
use crate::value::{IndexKey, Value};

/// A single-column index. NULL keys are never stored (§3). String keys are
/// normalised to lowercase on both insert and lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct Index {
    pub column: String,
    pub unique: bool,
    entries: BTreeMap<IndexKey, Vec<usize>>,
}

impl Index {
    pub fn new(column: impl Into<String>, unique: bool) -> Self {
        Self {
            column: column.into(),
            unique,
            entries: BTreeMap::new(),
        }
    }

    /// Insert `position` under `value`'s normalised key. NULL values are
    /// silently accepted without being stored. Rejects a duplicate key for a
    /// unique index with a UNIQUE violation.
    pub fn insert(&mut self, value: &Value, position: usize) -> Result<()> {
        self.insert_as(value, position, ConstraintKind::Unique)
    }

    /// Insert tagging a duplicate as `kind` rather than always UNIQUE, so
    /// the table can report PRIMARY_KEY violations on its primary-key index
    /// (§4.4).
    pub fn insert_as(&mut self, value: &Value, position: usize, kind: ConstraintKind) -> Result<()> {
        let Some(key) = value.index_key() else {
            return Ok(());
        };
        let positions = self.entries.entry(key).or_default();
        if self.unique && !positions.is_empty() {
            return Err(Error::constraint(
                kind,
                self.column.clone(),
                value.clone(),
                format!("duplicate value for column {}", self.column),
            ));
        }
        positions.push(position);
        Ok(())
    }

    /// Remove `position` from `value`'s key bucket, if present.
    pub fn remove(&mut self, value: &Value, position: usize) {
        let Some(key) = value.index_key() else {
            return;
        };
        if let Some(positions) = self.entries.get_mut(&key) {
            positions.retain(|&p| p != position);
            if positions.is_empty() {
                self.entries.remove(&key);
            }
        }
    }

    /// Look up row positions for `value`'s normalised key, in insertion
    /// order (§4.4 Find-by-index).
    pub fn lookup(&self, value: &Value) -> Vec<usize> {
        match value.index_key() {
            Some(key) => self.entries.get(&key).cloned().unwrap_or_default(),
            None => Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(|v| v.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_index_rejects_duplicate_normalised_key() {
        let mut idx = Index::new("email", true);
        idx.insert(&Value::Text("a@x".into()), 0).unwrap();
        let err = idx.insert(&Value::Text("A@X".into()), 1);
        assert!(err.is_err());
    }

    #[test]
    fn null_is_never_stored() {
        let mut idx = Index::new("e", true);
        idx.insert(&Value::Null, 0).unwrap();
        idx.insert(&Value::Null, 1).unwrap();
        assert!(idx.is_empty());
    }

    #[test]
    fn lookup_normalises_text_case() {
        let mut idx = Index::new("e", false);
        idx.insert(&Value::Text("Hello".into()), 3).unwrap();
        assert_eq!(idx.lookup(&Value::Text("HELLO".into())), vec![3]);
    }

    #[test]
    fn remove_drops_empty_buckets() {
        let mut idx = Index::new("e", false);
        idx.insert(&Value::Integer(1), 0).unwrap();
        idx.remove(&Value::Integer(1), 0);
        assert!(idx.is_empty());
    }
}
