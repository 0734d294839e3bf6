//! Recursive-descent SQL parser (§4.2).
//!
//! One token of lookahead; the first mismatch aborts the statement with a
//! [`Error::Syntax`] carrying the offending token's byte position. The
//! parser never recovers from an error mid-statement.

mod expr;
mod stmt;

use crate::ast::Statement;
use crate::error::{Error, Result};
use crate::lexer::{Keyword, Lexer, Token, TokenKind};

pub struct Parser<'a> {
    lexer: Lexer<'a>,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            lexer: Lexer::new(input),
        }
    }

    /// Parse a single statement, terminated by an optional `;`.
    pub fn parse_statement(&mut self) -> Result<Statement> {
        let token = self.peek().clone();
        let stmt = match &token.kind {
            TokenKind::Keyword(Keyword::Select) => Statement::Select(self.parse_select()?),
            TokenKind::Keyword(Keyword::Insert) => Statement::Insert(self.parse_insert()?),
            TokenKind::Keyword(Keyword::Update) => Statement::Update(self.parse_update()?),
            TokenKind::Keyword(Keyword::Delete) => Statement::Delete(self.parse_delete()?),
            TokenKind::Keyword(Keyword::Create) => {
                Statement::CreateTable(self.parse_create_table()?)
            }
            TokenKind::Keyword(Keyword::Alter) => Statement::AlterTable(self.parse_alter_table()?),
            TokenKind::Keyword(Keyword::Drop) => Statement::DropTable(self.parse_drop_table()?),
            TokenKind::Keyword(Keyword::Show) => self.parse_show()?,
            TokenKind::Keyword(Keyword::Describe) => Statement::Describe(self.parse_describe()?),
            TokenKind::Keyword(Keyword::Begin) => {
                self.advance();
                Statement::Begin
            }
            TokenKind::Keyword(Keyword::Commit) => {
                self.advance();
                Statement::Commit
            }
            TokenKind::Keyword(Keyword::Rollback) => {
                self.advance();
                Statement::Rollback
            }
            _ => {
                return Err(Error::syntax(
                    format!("expected a statement, found {}", token.kind),
                    token.position,
                ))
            }
        };
        self.consume(&TokenKind::Semicolon);
        Ok(stmt)
    }

    // --- token-stream helpers -------------------------------------------------

    fn peek(&mut self) -> &Token {
        self.lexer.peek()
    }

    fn advance(&mut self) -> Token {
        self.lexer.next_token()
    }

    /// Consume the next token if it matches `expected`, returning whether it did.
    fn consume(&mut self, expected: &TokenKind) -> bool {
        if &self.peek().kind == expected {
            self.advance();
            true
        } else {
            false
        }
    }

    fn consume_keyword(&mut self, kw: Keyword) -> bool {
        if self.peek().is_keyword(kw) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: &TokenKind) -> Result<Token> {
        let token = self.advance();
        if &token.kind == expected {
            Ok(token)
        } else {
            Err(Error::syntax(
                format!("expected {expected}, found {}", token.kind),
                token.position,
            ))
        }
    }

    fn expect_keyword(&mut self, kw: Keyword) -> Result<Token> {
        let token = self.advance();
        if token.is_keyword(kw) {
            Ok(token)
        } else {
            Err(Error::syntax(
                format!("expected keyword {kw}, found {}", token.kind),
                token.position,
            ))
        }
    }

    fn expect_identifier(&mut self) -> Result<String> {
        let token = self.advance();
        match token.kind {
            TokenKind::Identifier(s) => Ok(s),
            other => Err(Error::syntax(
                format!("expected identifier, found {other}"),
                token.position,
            )),
        }
    }
}

/// Parse every statement in `input`, returning them in order. Each statement
/// ends at an optional `;` and statements may be separated by any number of
/// standalone semicolons.
pub fn parse_statements(input: &str) -> Result<Vec<Statement>> {
    let mut parser = Parser::new(input);
    let mut statements = Vec::new();
    loop {
        while parser.consume(&TokenKind::Semicolon) {}
        if parser.peek().is_eof() {
            break;
        }
        statements.push(parser.parse_statement()?);
    }
    Ok(statements)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_statement() {
        let stmts = parse_statements("SELECT * FROM t").unwrap();
        assert_eq!(stmts.len(), 1);
    }

    #[test]
    fn parses_multiple_semicolon_separated_statements() {
        let stmts = parse_statements("BEGIN; SELECT * FROM t; COMMIT;").unwrap();
        assert_eq!(stmts.len(), 3);
    }

    #[test]
    fn syntax_error_carries_byte_position() {
        let err = parse_statements("SELECT FROM").unwrap_err();
        match err {
            Error::Syntax { position, .. } => assert!(position > 0),
            _ => panic!("expected syntax error"),
        }
    }
}
