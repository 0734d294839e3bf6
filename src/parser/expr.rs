//! Value literals and WHERE-condition parsing (§4.2).

use super::Parser;
use crate::ast::{ComparisonOp, Condition};
use crate::error::{Error, Result};
use crate::lexer::{Keyword, TokenKind};
use crate::value::Value;

impl<'a> Parser<'a> {
    /// Parse a single literal value: string, number, boolean, or NULL.
    pub(super) fn parse_value_literal(&mut self) -> Result<Value> {
        let token = self.advance();
        match token.kind {
            TokenKind::String(s) => Ok(Value::Text(s)),
            TokenKind::Integer(n) => Ok(Value::Integer(n)),
            TokenKind::Float(f) => Ok(Value::Real(f)),
            TokenKind::Keyword(Keyword::True) => Ok(Value::Boolean(true)),
            TokenKind::Keyword(Keyword::False) => Ok(Value::Boolean(false)),
            TokenKind::Keyword(Keyword::Null) => Ok(Value::Null),
            other => Err(Error::syntax(
                format!("expected a literal value, found {other}"),
                token.position,
            )),
        }
    }

    /// Parse a WHERE clause: a sequence of `column OP value` leaves joined
    /// left-associatively by AND/OR with equal precedence (§4.2, §9).
    pub(super) fn parse_where_condition(&mut self) -> Result<Condition> {
        let mut condition = self.parse_condition_leaf()?;
        loop {
            if self.consume_keyword(Keyword::And) {
                let rhs = self.parse_condition_leaf()?;
                condition = Condition::And(Box::new(condition), Box::new(rhs));
            } else if self.consume_keyword(Keyword::Or) {
                let rhs = self.parse_condition_leaf()?;
                condition = Condition::Or(Box::new(condition), Box::new(rhs));
            } else {
                break;
            }
        }
        Ok(condition)
    }

    fn parse_condition_leaf(&mut self) -> Result<Condition> {
        let column = self.expect_identifier()?;
        let op = self.parse_comparison_op()?;
        let value = self.parse_value_literal()?;
        Ok(Condition::Compare { column, op, value })
    }

    fn parse_comparison_op(&mut self) -> Result<ComparisonOp> {
        let token = self.advance();
        match token.kind {
            TokenKind::Eq => Ok(ComparisonOp::Eq),
            TokenKind::NotEq => Ok(ComparisonOp::NotEq),
            TokenKind::Gt => Ok(ComparisonOp::Gt),
            TokenKind::Lt => Ok(ComparisonOp::Lt),
            TokenKind::GtEq => Ok(ComparisonOp::GtEq),
            TokenKind::LtEq => Ok(ComparisonOp::LtEq),
            TokenKind::Keyword(Keyword::Like) => Ok(ComparisonOp::Like),
            other => Err(Error::syntax(
                format!("expected a comparison operator, found {other}"),
                token.position,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::Parser;
    use crate::ast::{ComparisonOp, Condition};

    #[test]
    fn where_clause_is_left_associative_without_precedence() {
        let mut p = Parser::new("a = 1 OR b = 1 AND c = 0");
        let cond = p.parse_where_condition().unwrap();
        // ((a=1) OR (b=1)) AND (c=0)
        match cond {
            Condition::And(lhs, rhs) => {
                assert!(matches!(*lhs, Condition::Or(_, _)));
                assert!(matches!(*rhs, Condition::Compare { .. }));
            }
            _ => panic!("expected top-level And"),
        }
    }

    #[test]
    fn like_operator_parses() {
        let mut p = Parser::new("name LIKE 'a%'");
        let cond = p.parse_where_condition().unwrap();
        assert!(matches!(
            cond,
            Condition::Compare {
                op: ComparisonOp::Like,
                ..
            }
        ));
    }
}
