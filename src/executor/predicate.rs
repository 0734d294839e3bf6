//! WHERE-clause evaluation, LIKE matching, and ORDER BY comparison (§4.3).

use std::cmp::Ordering;
use std::collections::HashMap;

use regex::Regex;

use crate::ast::{ComparisonOp, Condition, SortDirection};
use crate::catalog::{Row, TableSchema};
use crate::value::Value;

/// Evaluate a single row against a condition tree built by the parser.
/// AND/OR are already flattened left-associatively by the parser (§4.2); this
/// function just walks the resulting tree.
pub fn eval_condition(condition: &Condition, row: &Row, schema: &TableSchema) -> bool {
    match condition {
        Condition::Compare { column, op, value } => {
            let Some(actual) = column_value(row, schema, column) else {
                return false;
            };
            eval_comparison(actual, *op, value)
        }
        Condition::And(lhs, rhs) => {
            eval_condition(lhs, row, schema) && eval_condition(rhs, row, schema)
        }
        Condition::Or(lhs, rhs) => {
            eval_condition(lhs, row, schema) || eval_condition(rhs, row, schema)
        }
    }
}

/// Same evaluation but against a ready-made name→value row map, used by the
/// join path where rows only carry `<table>.<column>`-prefixed keys (§4.5).
/// `prefixes` lists the join's table names, tried in order, so an
/// unqualified reference still resolves (left table wins a tie).
pub fn eval_condition_on_map(
    condition: &Condition,
    row: &HashMap<String, Value>,
    prefixes: &[&str],
) -> bool {
    match condition {
        Condition::Compare { column, op, value } => match resolve_column(row, column, prefixes) {
            Some(actual) => eval_comparison(actual, *op, value),
            None => false,
        },
        Condition::And(lhs, rhs) => {
            eval_condition_on_map(lhs, row, prefixes) && eval_condition_on_map(rhs, row, prefixes)
        }
        Condition::Or(lhs, rhs) => {
            eval_condition_on_map(lhs, row, prefixes) || eval_condition_on_map(rhs, row, prefixes)
        }
    }
}

/// Resolve `column` against a row map: an exact key wins outright, otherwise
/// each `<prefix>.<column>` candidate is tried in order (used after a join,
/// where rows carry only qualified keys — see `eval_condition_on_map`).
pub fn resolve_column<'a>(
    row: &'a HashMap<String, Value>,
    column: &str,
    prefixes: &[&str],
) -> Option<&'a Value> {
    if let Some(v) = row.get(column) {
        return Some(v);
    }
    for prefix in prefixes {
        if let Some(v) = row.get(&format!("{prefix}.{column}")) {
            return Some(v);
        }
    }
    None
}

fn column_value<'a>(row: &'a Row, schema: &TableSchema, name: &str) -> Option<&'a Value> {
    let idx = schema
        .columns
        .iter()
        .position(|c| c.name.eq_ignore_ascii_case(name))?;
    row.get(idx)
}

fn eval_comparison(actual: &Value, op: ComparisonOp, expected: &Value) -> bool {
    match op {
        ComparisonOp::Eq => actual.sql_eq(expected),
        // §4.3: `!=` against NULL is false in every case, including when
        // both sides are NULL (only `=` becomes true there).
        ComparisonOp::NotEq => {
            if actual.is_null() || expected.is_null() {
                false
            } else {
                !actual.sql_eq(expected)
            }
        }
        ComparisonOp::Gt => actual.sql_partial_cmp(expected) == Some(Ordering::Greater),
        ComparisonOp::Lt => actual.sql_partial_cmp(expected) == Some(Ordering::Less),
        ComparisonOp::GtEq => matches!(
            actual.sql_partial_cmp(expected),
            Some(Ordering::Greater) | Some(Ordering::Equal)
        ),
        ComparisonOp::LtEq => matches!(
            actual.sql_partial_cmp(expected),
            Some(Ordering::Less) | Some(Ordering::Equal)
        ),
        ComparisonOp::Like => match (actual, expected) {
            (Value::Text(a), Value::Text(pattern)) => like_matches(a, pattern),
            _ => false,
        },
    }
}

/// `%` matches any sequence, `_` matches any single character, everything
/// else is literal; matching is case-insensitive and anchored at both ends
/// (§4.3).
pub fn like_matches(text: &str, pattern: &str) -> bool {
    let mut regex_src = String::with_capacity(pattern.len() + 2);
    regex_src.push('^');
    for c in pattern.chars() {
        match c {
            '%' => regex_src.push_str(".*"),
            '_' => regex_src.push('.'),
            _ => regex_src.push_str(&regex::escape(&c.to_string())),
        }
    }
    regex_src.push('$');
    Regex::new(&format!("(?i){regex_src}"))
        .map(|re| re.is_match(text))
        .unwrap_or(false)
}

/// ORDER BY comparison (§4.5): NULLs sort last regardless of direction;
/// numeric/date pairs compare numerically; otherwise a string comparison of
/// the display form. `direction` negates the comparison for DESC.
pub fn compare_for_order(a: &Value, b: &Value, direction: SortDirection) -> Ordering {
    let ordering = match (a.is_null(), b.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => return Ordering::Greater,
        (false, true) => return Ordering::Less,
        (false, false) => match (a.as_ordering_number(), b.as_ordering_number()) {
            (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
            _ => a.display_string().cmp(&b.display_string()),
        },
    };
    match direction {
        SortDirection::Asc => ordering,
        SortDirection::Desc => ordering.reverse(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_percent_matches_any_sequence() {
        assert!(like_matches("hello world", "hello%"));
        assert!(!like_matches("hello world", "world%"));
    }

    #[test]
    fn like_underscore_matches_single_char() {
        assert!(like_matches("cat", "c_t"));
        assert!(!like_matches("ct", "c_t"));
    }

    #[test]
    fn like_is_case_insensitive() {
        assert!(like_matches("HELLO", "hello"));
    }

    #[test]
    fn nulls_sort_last_regardless_of_direction() {
        use SortDirection::*;
        assert_eq!(
            compare_for_order(&Value::Null, &Value::Integer(1), Asc),
            Ordering::Greater
        );
        assert_eq!(
            compare_for_order(&Value::Null, &Value::Integer(1), Desc),
            Ordering::Greater
        );
    }

    #[test]
    fn not_eq_is_always_false_when_null_is_involved() {
        assert!(!eval_comparison(&Value::Null, ComparisonOp::NotEq, &Value::Integer(1)));
        assert!(!eval_comparison(&Value::Null, ComparisonOp::NotEq, &Value::Null));
    }
}
