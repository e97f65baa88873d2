/// SQLSTATE Module
///
/// SQLite reports numeric result codes; the classifier works on
/// SQLSTATE-tagged text. This module renders a `rusqlite::Error` as
/// `SQLSTATE[<state>]: <label>: <detail>` so both sides speak the same
/// vocabulary.

use rusqlite::{ffi, ErrorCode};

pub const INTEGRITY_CONSTRAINT: &str = "23000";
pub const INVALID_AUTHORIZATION: &str = "28000";
pub const SYNTAX_ERROR: &str = "42000";
pub const TABLE_NOT_FOUND: &str = "42S02";
pub const COLUMN_NOT_FOUND: &str = "42S22";
pub const CARDINALITY_VIOLATION: &str = "21000";
pub const UNABLE_TO_CONNECT: &str = "08001";
pub const GENERAL_ERROR: &str = "HY000";

fn failure(err: &rusqlite::Error) -> Option<&ffi::Error> {
    match err {
        rusqlite::Error::SqliteFailure(failure, _) => Some(failure),
        _ => None,
    }
}

/// Maps a driver error onto a five-character SQLSTATE.
pub fn sqlstate(err: &rusqlite::Error) -> &'static str {
    match failure(err).map(|f| f.code) {
        Some(ErrorCode::ConstraintViolation) => return INTEGRITY_CONSTRAINT,
        Some(
            ErrorCode::PermissionDenied
            | ErrorCode::AuthorizationForStatementDenied
            | ErrorCode::ReadOnly,
        ) => return INVALID_AUTHORIZATION,
        Some(ErrorCode::CannotOpen | ErrorCode::NotADatabase) => return UNABLE_TO_CONNECT,
        _ => {}
    }

    // Prepare-time failures may arrive without a result code attached
    let detail = err.to_string();
    if detail.contains("syntax error") || detail.contains("incomplete input") {
        SYNTAX_ERROR
    } else if detail.contains("no such table") {
        TABLE_NOT_FOUND
    } else if detail.contains("no such column") {
        COLUMN_NOT_FOUND
    } else if detail.contains("row value misused") {
        CARDINALITY_VIOLATION
    } else {
        GENERAL_ERROR
    }
}

fn label(state: &str) -> &'static str {
    match state {
        INTEGRITY_CONSTRAINT => "Integrity constraint violation",
        INVALID_AUTHORIZATION => "Invalid authorization specification",
        SYNTAX_ERROR => "Syntax error or access violation",
        TABLE_NOT_FOUND => "Base table or view not found",
        COLUMN_NOT_FOUND => "Column not found",
        CARDINALITY_VIOLATION => "Cardinality violation",
        UNABLE_TO_CONNECT => "Unable to connect",
        _ => "General error",
    }
}

pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    failure(err).is_some_and(|f| {
        f.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
            || f.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY
    })
}

/// First column named by a `UNIQUE constraint failed: t.a, t.b` message.
pub fn unique_violation_column(detail: &str) -> Option<&str> {
    let (_, columns) = detail.split_once("constraint failed: ")?;
    let first = columns.split(',').next()?.trim();
    let column = first.rsplit('.').next()?;
    (!column.is_empty()).then_some(column)
}

/// Renders a driver error as SQLSTATE-tagged text.
///
/// Unique violations name the offending column as `for key '<column>'`.
pub fn describe(err: &rusqlite::Error) -> String {
    let state = sqlstate(err);
    let detail = err.to_string();

    if is_unique_violation(err) {
        if let Some(column) = unique_violation_column(&detail) {
            return format!(
                "SQLSTATE[{}]: {}: Duplicate entry for key '{}' ({})",
                state,
                label(state),
                column,
                detail
            );
        }
    }

    format!("SQLSTATE[{}]: {}: {}", state, label(state), detail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    fn subjects() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE subjects (id INTEGER PRIMARY KEY, subject TEXT NOT NULL UNIQUE);
             INSERT INTO subjects (id, subject) VALUES (1, 'alice');",
        )
        .unwrap();
        conn
    }

    #[test]
    fn test_unique_violation_names_column() {
        let conn = subjects();
        let err = conn
            .execute("INSERT INTO subjects (id, subject) VALUES (2, 'alice')", [])
            .unwrap_err();

        assert_eq!(sqlstate(&err), INTEGRITY_CONSTRAINT);
        let message = describe(&err);
        assert!(message.starts_with("SQLSTATE[23000]"), "{}", message);
        assert!(message.contains("for key 'subject'"), "{}", message);
    }

    #[test]
    fn test_primary_key_violation_names_id() {
        let conn = subjects();
        let err = conn
            .execute("INSERT INTO subjects (id, subject) VALUES (1, 'bob')", [])
            .unwrap_err();
        assert!(describe(&err).contains("for key 'id'"));
    }

    #[test]
    fn test_syntax_error_state() {
        let conn = subjects();
        let err = conn.prepare("SELEC id FROM subjects").unwrap_err();
        assert_eq!(sqlstate(&err), SYNTAX_ERROR);
        assert!(describe(&err).starts_with("SQLSTATE[42000]"));
    }

    #[test]
    fn test_missing_table_and_column_states() {
        let conn = subjects();
        let err = conn.prepare("SELECT id FROM missing").unwrap_err();
        assert_eq!(sqlstate(&err), TABLE_NOT_FOUND);

        let err = conn.prepare("SELECT nope FROM subjects").unwrap_err();
        assert_eq!(sqlstate(&err), COLUMN_NOT_FOUND);
    }

    #[test]
    fn test_non_sqlite_error_is_general() {
        let err = rusqlite::Error::InvalidParameterName(":ghost".to_string());
        assert_eq!(sqlstate(&err), GENERAL_ERROR);
        assert!(describe(&err).starts_with("SQLSTATE[HY000]: General error"));
    }

    #[test]
    fn test_unique_violation_column_parsing() {
        assert_eq!(
            unique_violation_column("UNIQUE constraint failed: subjects.subject"),
            Some("subject")
        );
        assert_eq!(
            unique_violation_column("UNIQUE constraint failed: t.a, t.b"),
            Some("a")
        );
        assert_eq!(unique_violation_column("something else"), None);
    }
}
