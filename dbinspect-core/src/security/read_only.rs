//! Read-only statement guard.
//!
//! The guard is an allow-list on the leading keyword of every statement in
//! the submitted text. It runs before any connection check, so a rejected
//! statement never reaches a backend.

use crate::{Result, error::DbInspectError};

/// Leading keywords accepted by `execute`.
pub const READ_ONLY_KEYWORDS: &[&str] = &[
    "SELECT", "WITH", "SHOW", "DESCRIBE", "DESC", "EXPLAIN", "PRAGMA", "VALUES",
];

/// Rejects `sql` unless every statement in it starts with an allowed keyword.
///
/// Leading whitespace, `--` and `/* */` comments and opening parentheses are
/// skipped. Text made of comments and separators only is rejected with the
/// keyword `<empty>`.
///
/// # Errors
/// Returns `ReadOnlyViolation` naming the first offending keyword.
///
/// # Example
/// ```rust
/// use dbinspect_core::security::assert_read_only;
///
/// assert!(assert_read_only("  (SELECT 1)").is_ok());
/// assert!(assert_read_only("SELECT 1; DROP TABLE users").is_err());
/// ```
pub fn assert_read_only(sql: &str) -> Result<()> {
    let mut statements = 0_usize;
    for statement in split_statements(sql) {
        let Some(keyword) = leading_keyword(statement) else {
            continue;
        };
        if !READ_ONLY_KEYWORDS.contains(&keyword.as_str()) {
            tracing::warn!("Rejected non-read-only statement starting with '{}'", keyword);
            return Err(DbInspectError::read_only_violation(keyword));
        }
        statements = statements.saturating_add(1);
    }

    if statements == 0 {
        return Err(DbInspectError::read_only_violation("<empty>"));
    }
    Ok(())
}

/// Returns the upper-cased leading keyword of a single statement, or `None`
/// when the statement holds nothing but whitespace, comments and parentheses.
pub fn leading_keyword(statement: &str) -> Option<String> {
    let mut rest = statement;
    loop {
        rest = rest.trim_start_matches(|c: char| c.is_whitespace() || c == '(');
        if let Some(after) = rest.strip_prefix("--") {
            rest = after.find('\n').map_or("", |pos| &after[pos..]);
        } else if let Some(after) = rest.strip_prefix("/*") {
            rest = after.split_once("*/").map_or("", |(_, tail)| tail);
        } else {
            break;
        }
    }

    if rest.is_empty() {
        return None;
    }

    let word: String = rest
        .chars()
        .take_while(|c| c.is_alphanumeric() || *c == '_')
        .collect();
    let token = if word.is_empty() {
        rest.split_whitespace().next().unwrap_or(rest).to_string()
    } else {
        word
    };
    Some(token.to_uppercase())
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Code,
    SingleQuoted,
    DoubleQuoted,
    LineComment,
    BlockComment,
}

/// Splits on `;` outside string literals, quoted identifiers and comments.
fn split_statements(sql: &str) -> Vec<&str> {
    let bytes = sql.as_bytes();
    let mut statements = Vec::new();
    let mut state = ScanState::Code;
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        let current = bytes[i];
        let next = bytes.get(i.saturating_add(1)).copied();
        match state {
            ScanState::Code => match current {
                b'\'' => state = ScanState::SingleQuoted,
                b'"' => state = ScanState::DoubleQuoted,
                b'-' if next == Some(b'-') => {
                    state = ScanState::LineComment;
                    i = i.saturating_add(1);
                }
                b'/' if next == Some(b'*') => {
                    state = ScanState::BlockComment;
                    i = i.saturating_add(1);
                }
                b';' => {
                    statements.push(&sql[start..i]);
                    start = i.saturating_add(1);
                }
                _ => {}
            },
            ScanState::SingleQuoted if current == b'\'' => state = ScanState::Code,
            ScanState::DoubleQuoted if current == b'"' => state = ScanState::Code,
            ScanState::LineComment if current == b'\n' => state = ScanState::Code,
            ScanState::BlockComment if current == b'*' && next == Some(b'/') => {
                state = ScanState::Code;
                i = i.saturating_add(1);
            }
            _ => {}
        }
        i = i.saturating_add(1);
    }

    statements.push(&sql[start..]);
    statements
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rejected_keyword(sql: &str) -> String {
        match assert_read_only(sql) {
            Err(DbInspectError::ReadOnlyViolation { keyword }) => keyword,
            other => panic!("expected read-only violation for {sql:?}, got {other:?}"),
        }
    }

    #[test]
    fn test_read_only_allows_every_listed_keyword() {
        for sql in [
            "SELECT 1",
            "with t as (select 1) select * from t",
            "SHOW TABLES",
            "DESCRIBE users",
            "desc users",
            "EXPLAIN SELECT 1",
            "PRAGMA table_info(\"users\")",
            "VALUES (1), (2)",
        ] {
            assert!(assert_read_only(sql).is_ok(), "{sql} should be allowed");
        }
    }

    #[test]
    fn test_read_only_rejects_writes_and_ddl() {
        assert_eq!(rejected_keyword("UPDATE users SET name = 'x'"), "UPDATE");
        assert_eq!(rejected_keyword("insert into t values (1)"), "INSERT");
        assert_eq!(rejected_keyword("DROP TABLE users"), "DROP");
        assert_eq!(rejected_keyword("MERGE INTO t USING s ON 1=1"), "MERGE");
        assert_eq!(rejected_keyword("ATTACH DATABASE 'x' AS y"), "ATTACH");
    }

    #[test]
    fn test_read_only_skips_comments_and_parentheses() {
        assert!(assert_read_only("-- leading comment\n  /* block */ ((SELECT 1))").is_ok());
        assert_eq!(rejected_keyword("/* SELECT */ DELETE FROM t"), "DELETE");
        assert_eq!(rejected_keyword("-- SELECT\nTRUNCATE t"), "TRUNCATE");
    }

    #[test]
    fn test_read_only_checks_every_statement() {
        assert!(assert_read_only("SELECT 1; SELECT 2;").is_ok());
        assert_eq!(rejected_keyword("SELECT 1; DROP TABLE users"), "DROP");
    }

    #[test]
    fn test_read_only_ignores_separators_inside_literals() {
        assert!(assert_read_only("SELECT 'a; DROP TABLE x' AS v").is_ok());
        assert!(assert_read_only("SELECT \"odd;name\" FROM t").is_ok());
        assert!(assert_read_only("SELECT 1 -- trailing; DELETE\n").is_ok());
    }

    #[test]
    fn test_read_only_handles_separators_and_comments_at_end_of_text() {
        assert!(assert_read_only("SELECT 1;").is_ok());
        assert!(assert_read_only("SELECT 1 /* open comment ; DROP").is_ok());
        assert!(assert_read_only("SELECT 1 --").is_ok());
        assert_eq!(rejected_keyword("SELECT 1;/**/DELETE FROM t;"), "DELETE");
    }

    #[test]
    fn test_read_only_rejects_empty_text() {
        assert_eq!(rejected_keyword(""), "<empty>");
        assert_eq!(rejected_keyword("  ;  -- nothing\n"), "<empty>");
    }

    #[test]
    fn test_read_only_names_symbolic_tokens() {
        assert_eq!(rejected_keyword("@proc"), "@PROC");
    }

    #[test]
    fn test_leading_keyword() {
        assert_eq!(leading_keyword("  select 1").as_deref(), Some("SELECT"));
        assert_eq!(leading_keyword("(\n values (1))").as_deref(), Some("VALUES"));
        assert_eq!(leading_keyword("/* only a comment */"), None);
        assert_eq!(leading_keyword("/* unterminated"), None);
    }
}
