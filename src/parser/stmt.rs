//! Per-statement-kind parsing (§4.2).

use super::Parser;
use crate::ast::*;
use crate::error::{Error, Result};
use crate::lexer::{Keyword, TokenKind};
use crate::value::SqlType;

impl<'a> Parser<'a> {
    pub(super) fn parse_create_table(&mut self) -> Result<CreateTableStmt> {
        self.expect_keyword(Keyword::Create)?;
        self.expect_keyword(Keyword::Table)?;
        let if_not_exists = if self.consume_keyword(Keyword::If) {
            self.expect_keyword(Keyword::Not)?;
            self.expect_keyword(Keyword::Exists)?;
            true
        } else {
            false
        };
        let table = self.expect_identifier()?;
        self.expect(&TokenKind::LeftParen)?;
        let mut columns = Vec::new();
        loop {
            columns.push(self.parse_column_def()?);
            if !self.consume(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RightParen)?;
        Ok(CreateTableStmt {
            table,
            columns,
            if_not_exists,
        })
    }

    fn parse_column_def(&mut self) -> Result<ColumnDef> {
        let name = self.expect_identifier()?;
        let data_type = self.parse_sql_type()?;
        let mut def = ColumnDef::new(name, data_type);
        loop {
            if self.consume_keyword(Keyword::Primary) {
                self.expect_keyword(Keyword::Key)?;
                def.primary_key = true;
            } else if self.consume_keyword(Keyword::Unique) {
                def.unique = true;
            } else if self.consume_keyword(Keyword::Not) {
                self.expect_keyword(Keyword::Null)?;
                def.not_null = true;
            } else if self.consume_keyword(Keyword::AutoIncrement) {
                def.auto_increment = true;
            } else {
                break;
            }
        }
        Ok(def)
    }

    fn parse_sql_type(&mut self) -> Result<SqlType> {
        let token = self.advance();
        match token.kind {
            TokenKind::Keyword(Keyword::Integer) => Ok(SqlType::Integer),
            TokenKind::Keyword(Keyword::Text) => Ok(SqlType::Text),
            TokenKind::Keyword(Keyword::Boolean) => Ok(SqlType::Boolean),
            TokenKind::Keyword(Keyword::Real) => Ok(SqlType::Real),
            TokenKind::Keyword(Keyword::Date) => Ok(SqlType::Date),
            other => Err(Error::syntax(
                format!("expected a column type, found {other}"),
                token.position,
            )),
        }
    }

    pub(super) fn parse_alter_table(&mut self) -> Result<AlterTableStmt> {
        self.expect_keyword(Keyword::Alter)?;
        self.expect_keyword(Keyword::Table)?;
        let table = self.expect_identifier()?;
        let action = if self.consume_keyword(Keyword::Add) {
            self.consume_keyword(Keyword::Column);
            AlterAction::AddColumn(self.parse_column_def()?)
        } else if self.consume_keyword(Keyword::Drop) {
            self.consume_keyword(Keyword::Column);
            AlterAction::DropColumn(self.expect_identifier()?)
        } else if self.consume_keyword(Keyword::Rename) {
            self.consume_keyword(Keyword::Column);
            let old = self.expect_identifier()?;
            self.expect_keyword(Keyword::To)?;
            let new = self.expect_identifier()?;
            AlterAction::RenameColumn { old, new }
        } else if self.consume_keyword(Keyword::Modify) {
            self.consume_keyword(Keyword::Column);
            AlterAction::ModifyColumn(self.parse_column_def()?)
        } else {
            let token = self.peek().clone();
            return Err(Error::syntax(
                format!("expected ADD, DROP, RENAME, or MODIFY, found {}", token.kind),
                token.position,
            ));
        };
        Ok(AlterTableStmt { table, action })
    }

    pub(super) fn parse_drop_table(&mut self) -> Result<DropTableStmt> {
        self.expect_keyword(Keyword::Drop)?;
        self.expect_keyword(Keyword::Table)?;
        let if_exists = if self.consume_keyword(Keyword::If) {
            self.expect_keyword(Keyword::Exists)?;
            true
        } else {
            false
        };
        let table = self.expect_identifier()?;
        Ok(DropTableStmt { table, if_exists })
    }

    pub(super) fn parse_insert(&mut self) -> Result<InsertStmt> {
        self.expect_keyword(Keyword::Insert)?;
        self.expect_keyword(Keyword::Into)?;
        let table = self.expect_identifier()?;
        let columns = if self.consume(&TokenKind::LeftParen) {
            let mut names = Vec::new();
            loop {
                names.push(self.expect_identifier()?);
                if !self.consume(&TokenKind::Comma) {
                    break;
                }
            }
            self.expect(&TokenKind::RightParen)?;
            Some(names)
        } else {
            None
        };
        self.expect_keyword(Keyword::Values)?;
        let mut rows = Vec::new();
        loop {
            self.expect(&TokenKind::LeftParen)?;
            let mut row = Vec::new();
            loop {
                row.push(self.parse_value_literal()?);
                if !self.consume(&TokenKind::Comma) {
                    break;
                }
            }
            self.expect(&TokenKind::RightParen)?;
            rows.push(row);
            if !self.consume(&TokenKind::Comma) {
                break;
            }
        }
        Ok(InsertStmt {
            table,
            columns,
            rows,
        })
    }

    pub(super) fn parse_update(&mut self) -> Result<UpdateStmt> {
        self.expect_keyword(Keyword::Update)?;
        let table = self.expect_identifier()?;
        self.expect_keyword(Keyword::Set)?;
        let mut assignments = Vec::new();
        loop {
            let name = self.expect_identifier()?;
            self.expect(&TokenKind::Eq)?;
            let value = self.parse_value_literal()?;
            assignments.push((name, value));
            if !self.consume(&TokenKind::Comma) {
                break;
            }
        }
        let where_clause = if self.consume_keyword(Keyword::Where) {
            Some(self.parse_where_condition()?)
        } else {
            None
        };
        Ok(UpdateStmt {
            table,
            assignments,
            where_clause,
        })
    }

    pub(super) fn parse_delete(&mut self) -> Result<DeleteStmt> {
        self.expect_keyword(Keyword::Delete)?;
        self.expect_keyword(Keyword::From)?;
        let table = self.expect_identifier()?;
        let where_clause = if self.consume_keyword(Keyword::Where) {
            Some(self.parse_where_condition()?)
        } else {
            None
        };
        Ok(DeleteStmt {
            table,
            where_clause,
        })
    }

    pub(super) fn parse_select(&mut self) -> Result<SelectStmt> {
        self.expect_keyword(Keyword::Select)?;
        let columns = if self.consume(&TokenKind::Star) {
            SelectColumns::All
        } else {
            let mut names = Vec::new();
            loop {
                names.push(self.parse_select_column()?);
                if !self.consume(&TokenKind::Comma) {
                    break;
                }
            }
            SelectColumns::List(names)
        };
        self.expect_keyword(Keyword::From)?;
        let table = self.expect_identifier()?;

        let join = self.parse_join_clause()?;

        let where_clause = if self.consume_keyword(Keyword::Where) {
            Some(self.parse_where_condition()?)
        } else {
            None
        };

        let order_by = if self.consume_keyword(Keyword::Order) {
            self.expect_keyword(Keyword::By)?;
            let column = self.expect_identifier()?;
            let direction = if self.consume_keyword(Keyword::Desc) {
                SortDirection::Desc
            } else {
                self.consume_keyword(Keyword::Asc);
                SortDirection::Asc
            };
            Some(OrderBy { column, direction })
        } else {
            None
        };

        let limit = if self.consume_keyword(Keyword::Limit) {
            Some(self.parse_limit_value()?)
        } else {
            None
        };

        Ok(SelectStmt {
            table,
            columns,
            join,
            where_clause,
            order_by,
            limit,
        })
    }

    /// `[table.]column` — only the column part is retained (§4.2).
    fn parse_select_column(&mut self) -> Result<String> {
        let first = self.expect_identifier()?;
        if self.consume(&TokenKind::Dot) {
            self.expect_identifier()
        } else {
            Ok(first)
        }
    }

    fn parse_join_clause(&mut self) -> Result<Option<JoinClause>> {
        let join_type = if self.consume_keyword(Keyword::Inner) {
            self.expect_keyword(Keyword::Join)?;
            Some(JoinType::Inner)
        } else if self.consume_keyword(Keyword::Left) {
            self.expect_keyword(Keyword::Join)?;
            Some(JoinType::Left)
        } else if self.consume_keyword(Keyword::Right) {
            self.expect_keyword(Keyword::Join)?;
            Some(JoinType::Right)
        } else if self.consume_keyword(Keyword::Join) {
            Some(JoinType::Inner)
        } else {
            None
        };
        let Some(join_type) = join_type else {
            return Ok(None);
        };
        let table = self.expect_identifier()?;
        self.expect_keyword(Keyword::On)?;
        let left_key = self.expect_identifier()?;
        self.expect(&TokenKind::Eq)?;
        let right_key = self.expect_identifier()?;
        Ok(Some(JoinClause {
            join_type,
            table,
            left_key,
            right_key,
        }))
    }

    fn parse_limit_value(&mut self) -> Result<usize> {
        let token = self.advance();
        match token.kind {
            TokenKind::Integer(n) if n >= 0 => Ok(n as usize),
            other => Err(Error::syntax(
                format!("expected a non-negative integer for LIMIT, found {other}"),
                token.position,
            )),
        }
    }

    pub(super) fn parse_show(&mut self) -> Result<Statement> {
        self.expect_keyword(Keyword::Show)?;
        self.expect_keyword(Keyword::Tables)?;
        Ok(Statement::ShowTables)
    }

    pub(super) fn parse_describe(&mut self) -> Result<String> {
        self.expect_keyword(Keyword::Describe)?;
        self.expect_identifier()
    }
}

#[cfg(test)]
mod tests {
    use super::super::parse_statements;
    use crate::ast::*;

    #[test]
    fn create_table_parses_flags_in_any_order() {
        let stmts = parse_statements(
            "CREATE TABLE u (id INTEGER PRIMARY KEY AUTO_INCREMENT, e TEXT UNIQUE NOT NULL)",
        )
        .unwrap();
        match &stmts[0] {
            Statement::CreateTable(stmt) => {
                assert_eq!(stmt.table, "u");
                assert_eq!(stmt.columns.len(), 2);
                assert!(stmt.columns[0].primary_key);
                assert!(stmt.columns[0].auto_increment);
                assert!(stmt.columns[1].unique);
                assert!(stmt.columns[1].not_null);
            }
            _ => panic!("expected CreateTable"),
        }
    }

    #[test]
    fn select_star_with_inner_join_default_type() {
        let stmts =
            parse_statements("SELECT * FROM orders JOIN customers ON customer_id = id").unwrap();
        match &stmts[0] {
            Statement::Select(stmt) => {
                let join = stmt.join.as_ref().unwrap();
                assert_eq!(join.join_type, JoinType::Inner);
                assert_eq!(join.left_key, "customer_id");
                assert_eq!(join.right_key, "id");
            }
            _ => panic!("expected Select"),
        }
    }

    #[test]
    fn select_qualified_columns_keep_only_column_part() {
        let stmts = parse_statements("SELECT orders.id, amount FROM orders").unwrap();
        match &stmts[0] {
            Statement::Select(stmt) => {
                assert_eq!(
                    stmt.columns,
                    SelectColumns::List(vec!["id".to_string(), "amount".to_string()])
                );
            }
            _ => panic!("expected Select"),
        }
    }

    #[test]
    fn insert_without_explicit_columns() {
        let stmts = parse_statements("INSERT INTO t VALUES (1, 'a'), (2, 'b')").unwrap();
        match &stmts[0] {
            Statement::Insert(stmt) => {
                assert!(stmt.columns.is_none());
                assert_eq!(stmt.rows.len(), 2);
            }
            _ => panic!("expected Insert"),
        }
    }

    #[test]
    fn alter_table_rename_column() {
        let stmts = parse_statements("ALTER TABLE t RENAME COLUMN a TO b").unwrap();
        match &stmts[0] {
            Statement::AlterTable(stmt) => {
                assert_eq!(
                    stmt.action,
                    AlterAction::RenameColumn {
                        old: "a".to_string(),
                        new: "b".to_string()
                    }
                );
            }
            _ => panic!("expected AlterTable"),
        }
    }

    #[test]
    fn order_by_limit_parses() {
        let stmts = parse_statements("SELECT * FROM t ORDER BY a DESC LIMIT 5").unwrap();
        match &stmts[0] {
            Statement::Select(stmt) => {
                assert_eq!(stmt.order_by.as_ref().unwrap().direction, SortDirection::Desc);
                assert_eq!(stmt.limit, Some(5));
            }
            _ => panic!("expected Select"),
        }
    }
}
