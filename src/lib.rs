//! # tinysql
//!
//! An embeddable, in-process relational database engine with a small
//! SQL-like query language: a lexer and recursive-descent parser, typed
//! table storage with primary-key/unique indexing, a statement executor,
//! and a session that layers transactions over a catalog of tables.
//!
//! ## Quick Start
//!
//! ```rust
//! use tinysql::Session;
//!
//! let mut session = Session::new();
//! session.execute("CREATE TABLE users (id INTEGER PRIMARY KEY AUTO_INCREMENT, name TEXT NOT NULL)");
//! session.execute("INSERT INTO users (name) VALUES ('alice'), ('bob')");
//! let results = session.execute("SELECT * FROM users WHERE name = 'alice'");
//! assert!(results[0].success);
//! ```
//!
//! ## Transactions
//!
//! `BEGIN` snapshots the catalog; `COMMIT` replaces the committed catalog
//! with the snapshot's mutations, and `ROLLBACK` discards them:
//!
//! ```rust
//! use tinysql::Session;
//!
//! let mut session = Session::new();
//! session.execute("CREATE TABLE t (id INTEGER PRIMARY KEY)");
//! session.execute("BEGIN");
//! session.execute("INSERT INTO t (id) VALUES (1)");
//! session.execute("ROLLBACK");
//! assert_eq!(session.stats().row_count, 0);
//! ```

pub mod ast;
pub mod catalog;
pub mod error;
pub mod executor;
pub mod lexer;
pub mod parser;
pub mod result;
pub mod session;
pub mod value;

pub use catalog::{Catalog, Column, Table, TableSchema};
pub use error::{ConstraintKind, Error, Result};
pub use executor::execute;
pub use lexer::{Lexer, Token, TokenKind};
pub use parser::{parse_statements, Parser};
pub use result::{QueryResult, QueryResultKind};
pub use session::{Session, SessionConfig, SessionStats};
pub use value::{SqlType, Value};
