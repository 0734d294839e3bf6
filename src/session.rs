//! Session: the catalog a caller interacts with, plus transaction control
//! (§4.6).

use std::time::Instant;

use log::{info, warn};

use crate::ast::Statement;
use crate::catalog::{Catalog, TableSchema};
use crate::error::{Error, Result};
use crate::executor;
use crate::parser::parse_statements;
use crate::result::QueryResult;

/// Session-level configuration (no analogue in the core design; an ambient
/// concern every embedding host needs). Build with [`SessionConfig::new`]
/// and the `with_*` setters.
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    log_statements: bool,
    statement_length_limit: Option<usize>,
}

impl SessionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log every statement at `info` level before executing it.
    pub fn with_statement_logging(mut self, enabled: bool) -> Self {
        self.log_statements = enabled;
        self
    }

    /// Reject input text longer than `limit` bytes before parsing.
    pub fn with_statement_length_limit(mut self, limit: usize) -> Self {
        self.statement_length_limit = Some(limit);
        self
    }
}

/// A count of stored objects, for lightweight introspection (§4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionStats {
    pub table_count: usize,
    pub row_count: usize,
}

/// Owns the committed [`Catalog`] and, during a transaction, a shadow copy
/// (§4.6). Every statement runs against whichever catalog is currently in
/// effect.
pub struct Session {
    committed: Catalog,
    shadow: Option<Catalog>,
    config: SessionConfig,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self::with_config(SessionConfig::default())
    }

    pub fn with_config(config: SessionConfig) -> Self {
        Self {
            committed: Catalog::new(),
            shadow: None,
            config,
        }
    }

    pub fn in_transaction(&self) -> bool {
        self.shadow.is_some()
    }

    /// The catalog a statement executes against right now: the shadow copy
    /// during a transaction, the committed catalog otherwise (§4.6).
    fn active_catalog_mut(&mut self) -> &mut Catalog {
        self.shadow.as_mut().unwrap_or(&mut self.committed)
    }

    fn active_catalog(&self) -> &Catalog {
        self.shadow.as_ref().unwrap_or(&self.committed)
    }

    /// Parse and execute every statement in `text` in order, returning one
    /// result per statement (§4.5, §6). A parse failure yields a single
    /// error result for the whole batch.
    pub fn execute(&mut self, text: &str) -> Vec<QueryResult> {
        if let Some(limit) = self.config.statement_length_limit {
            if text.len() > limit {
                return vec![QueryResult::error(
                    Error::execution(format!(
                        "statement text of {} bytes exceeds the configured limit of {limit}",
                        text.len()
                    )),
                    std::time::Duration::ZERO,
                )];
            }
        }

        let statements = match parse_statements(text) {
            Ok(statements) => statements,
            Err(err) => {
                warn!("statement failed: {err}");
                return vec![QueryResult::error(err, std::time::Duration::ZERO)];
            }
        };

        statements
            .into_iter()
            .map(|stmt| self.execute_one(stmt))
            .collect()
    }

    fn execute_one(&mut self, stmt: Statement) -> QueryResult {
        if self.config.log_statements {
            info!("executing: {stmt:?}");
        }
        let start = Instant::now();
        match stmt {
            Statement::Begin => QueryResult::new_ok_or_error(self.begin(), start.elapsed()),
            Statement::Commit => QueryResult::new_ok_or_error(self.commit(), start.elapsed()),
            Statement::Rollback => QueryResult::new_ok_or_error(self.rollback(), start.elapsed()),
            other => executor::execute(self.active_catalog_mut(), &other),
        }
    }

    /// Start a transaction by snapshotting the committed catalog (§4.6).
    /// Errors if one is already in progress.
    fn begin(&mut self) -> Result<()> {
        if self.shadow.is_some() {
            return Err(Error::transaction("a transaction is already in progress"));
        }
        self.shadow = Some(self.committed.deep_clone());
        Ok(())
    }

    /// Replace the committed catalog with the shadow copy (§4.6).
    fn commit(&mut self) -> Result<()> {
        match self.shadow.take() {
            Some(shadow) => {
                self.committed = shadow;
                Ok(())
            }
            None => Err(Error::transaction("no transaction is in progress")),
        }
    }

    /// Discard the shadow copy, leaving the committed catalog untouched
    /// (§4.6).
    fn rollback(&mut self) -> Result<()> {
        match self.shadow.take() {
            Some(_) => Ok(()),
            None => Err(Error::transaction("no transaction is in progress")),
        }
    }

    /// Drop the active transaction (if any) and every committed table.
    pub fn reset(&mut self) {
        self.shadow = None;
        self.committed = Catalog::new();
    }

    pub fn table_names(&self) -> Vec<String> {
        self.active_catalog().table_names()
    }

    pub fn table_schema(&self, name: &str) -> Option<&TableSchema> {
        self.active_catalog().table(name).map(|t| &t.schema)
    }

    pub fn stats(&self) -> SessionStats {
        let catalog = self.active_catalog();
        SessionStats {
            table_count: catalog.table_count(),
            row_count: catalog
                .table_names()
                .iter()
                .filter_map(|name| catalog.table(name))
                .map(|t| t.row_count())
                .sum(),
        }
    }
}

impl QueryResult {
    fn new_ok_or_error(result: Result<()>, elapsed: std::time::Duration) -> QueryResult {
        match result {
            Ok(()) => QueryResult::new(crate::result::QueryResultKind::Ok, elapsed),
            Err(err) => QueryResult::error(err, elapsed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::QueryResultKind;

    #[test]
    fn begin_commit_makes_writes_durable() {
        let mut session = Session::new();
        session.execute("CREATE TABLE t (id INTEGER PRIMARY KEY)");
        session.execute("BEGIN");
        session.execute("INSERT INTO t (id) VALUES (1)");
        session.execute("COMMIT");
        assert_eq!(session.stats().row_count, 1);
    }

    #[test]
    fn rollback_discards_transaction_writes() {
        let mut session = Session::new();
        session.execute("CREATE TABLE t (id INTEGER PRIMARY KEY)");
        session.execute("BEGIN");
        session.execute("INSERT INTO t (id) VALUES (1)");
        session.execute("ROLLBACK");
        assert_eq!(session.stats().row_count, 0);
    }

    #[test]
    fn double_begin_is_a_transaction_error() {
        let mut session = Session::new();
        session.execute("BEGIN");
        let results = session.execute("BEGIN");
        assert!(!results[0].success);
        match &results[0].kind {
            QueryResultKind::Error { error } => assert_eq!(error.kind, "TRANSACTION_ERROR"),
            other => panic!("unexpected kind: {other:?}"),
        }
    }

    #[test]
    fn statement_length_limit_rejects_long_input() {
        let mut session = Session::with_config(SessionConfig::new().with_statement_length_limit(5));
        let results = session.execute("SELECT * FROM t");
        assert!(!results[0].success);
    }
}
