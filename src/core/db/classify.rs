/// Error Classification Module
///
/// Pattern-matches SQLSTATE-tagged driver messages against the handful of
/// codes the helpers care about, writes human-readable diagnostics to a
/// sink, and maps the result onto `SqlHelperError`. Classification never
/// changes control flow: the error is always returned to the caller.

use crate::core::db::sqlstate;
use crate::core::SqlHelperError;
use std::sync::{Arc, Mutex};
use tracing::{error, info, warn};

pub const DUPLICATE_ENTRY: &str = "duplicate entry";
pub const USERNAME_EXISTS: &str = "Error: that username already exists.";
pub const AUTO_INCREMENT_FAILED: &str =
    "critical: the database did not assign a unique auto-increment id";
pub const CREDENTIALS_REJECTED: &str =
    "critical: the database rejected the session's credentials or permissions";
pub const SQL_SYNTAX: &str = "critical: the generated SQL has a syntax error";
pub const UNCLASSIFIED: &str = "unclassified database error";

/// Which key a duplicate-entry error was raised for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateKey {
    /// The `subject` (username) column
    Subject,
    /// The auto-increment `id` column
    Id,
    Other,
}

/// Result of classifying a driver message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    DuplicateEntry(DuplicateKey),
    AccessDenied,
    SyntaxError,
    Unknown,
}

/// Severity of a diagnostic line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warn,
    Error,
}

/// Destination for classified error text
pub trait DiagnosticSink: Send + Sync {
    fn emit(&self, severity: Severity, text: &str);
}

/// Sink that forwards diagnostics as `tracing` events
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn emit(&self, severity: Severity, text: &str) {
        match severity {
            Severity::Info => info!(target: "sqlhelper::diagnostics", "{}", text),
            Severity::Warn => warn!(target: "sqlhelper::diagnostics", "{}", text),
            Severity::Error => error!(target: "sqlhelper::diagnostics", "{}", text),
        }
    }
}

/// Sink that keeps every diagnostic line in memory.
///
/// Clones share the same buffer.
#[derive(Debug, Default, Clone)]
pub struct BufferSink {
    lines: Arc<Mutex<Vec<(Severity, String)>>>,
}

impl BufferSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Diagnostic text in emission order
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .map(|lines| lines.iter().map(|(_, text)| text.clone()).collect())
            .unwrap_or_default()
    }

    pub fn entries(&self) -> Vec<(Severity, String)> {
        self.lines.lock().map(|lines| lines.clone()).unwrap_or_default()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines().iter().any(|line| line.contains(needle))
    }

    pub fn clear(&self) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.clear();
        }
    }
}

impl DiagnosticSink for BufferSink {
    fn emit(&self, severity: Severity, text: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push((severity, text.to_string()));
        }
    }
}

fn tagged(state: &str) -> String {
    format!("SQLSTATE[{}]", state)
}

/// Classifies a driver message by substring matching.
///
/// Checked in order: 23000 (with `'subject'` / `'id'` sub-cases), 28000, 42000.
pub fn classify(message: &str) -> ErrorClass {
    if message.contains(&tagged(sqlstate::INTEGRITY_CONSTRAINT)) {
        let key = if message.contains("'subject'") {
            DuplicateKey::Subject
        } else if message.contains("'id'") {
            DuplicateKey::Id
        } else {
            DuplicateKey::Other
        };
        ErrorClass::DuplicateEntry(key)
    } else if message.contains(&tagged(sqlstate::INVALID_AUTHORIZATION)) {
        ErrorClass::AccessDenied
    } else if message.contains(&tagged(sqlstate::SYNTAX_ERROR)) {
        ErrorClass::SyntaxError
    } else {
        ErrorClass::Unknown
    }
}

/// Classifies `message`, writes its diagnostics to `sink`, and hands the
/// message back untouched.
pub fn handle_error_message<'a>(message: &'a str, sink: &dyn DiagnosticSink) -> &'a str {
    sink.emit(Severity::Info, message);

    match classify(message) {
        ErrorClass::DuplicateEntry(key) => {
            sink.emit(Severity::Warn, DUPLICATE_ENTRY);
            match key {
                // TODO: append an account recovery link once the web layer exposes one
                DuplicateKey::Subject => sink.emit(Severity::Warn, USERNAME_EXISTS),
                DuplicateKey::Id => sink.emit(Severity::Error, AUTO_INCREMENT_FAILED),
                DuplicateKey::Other => {}
            }
        }
        ErrorClass::AccessDenied => sink.emit(Severity::Error, CREDENTIALS_REJECTED),
        ErrorClass::SyntaxError => sink.emit(Severity::Error, SQL_SYNTAX),
        ErrorClass::Unknown => sink.emit(Severity::Warn, UNCLASSIFIED),
    }

    message
}

/// Extracts `<key>` from `... for key '<key>' ...`.
fn duplicate_key_name(message: &str) -> Option<String> {
    let (_, rest) = message.split_once("for key '")?;
    let (key, _) = rest.split_once('\'')?;
    Some(key.to_string())
}

/// Builds the typed error for an already classified message.
pub fn error_for(class: ErrorClass, message: String) -> SqlHelperError {
    match class {
        ErrorClass::DuplicateEntry(key) => {
            let column = match key {
                DuplicateKey::Subject => Some("subject".to_string()),
                DuplicateKey::Id => Some("id".to_string()),
                DuplicateKey::Other => duplicate_key_name(&message),
            };
            SqlHelperError::DuplicateKey { column, message }
        }
        ErrorClass::AccessDenied => SqlHelperError::AccessDenied { message },
        ErrorClass::SyntaxError => SqlHelperError::Syntax { message },
        ErrorClass::Unknown => SqlHelperError::UnknownDatabase { message },
    }
}

/// Renders, classifies and logs a driver error, then returns it typed.
///
/// Integrity failures other than unique or primary key violations (NOT NULL,
/// CHECK, FOREIGN KEY) share SQLSTATE 23000 but come back as `UnknownDatabase`.
pub fn translate(err: &rusqlite::Error, sink: &dyn DiagnosticSink) -> SqlHelperError {
    let message = sqlstate::describe(err);
    match classify(handle_error_message(&message, sink)) {
        ErrorClass::DuplicateEntry(_) if !sqlstate::is_unique_violation(err) => {
            SqlHelperError::UnknownDatabase { message }
        }
        class => error_for(class, message),
    }
}

/// Like `translate`, but any failure becomes `SqlHelperError::Connection`.
pub fn translate_connect(err: &rusqlite::Error, sink: &dyn DiagnosticSink) -> SqlHelperError {
    let message = sqlstate::describe(err);
    handle_error_message(&message, sink);
    SqlHelperError::Connection { message }
}
