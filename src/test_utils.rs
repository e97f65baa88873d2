/// # Test Utilities Module
///
/// Fixtures for the unit tests: every fixture gets its own temporary server
/// directory so tests can run in parallel without sharing a database file.

use crate::core::db::{connect_with_sink, BufferSink, ConnectOptions, Database, TracingSink};
use crate::core::{Result, SqlHelperError};
use std::sync::Arc;
use tempfile::TempDir;

pub const SUBJECTS_SCHEMA: &str = "
    CREATE TABLE subjects (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        subject TEXT NOT NULL UNIQUE,
        salt TEXT,
        score REAL
    );
";

/// Isolated database test fixture
pub struct DatabaseFixture {
    pub name: String,
    pub db: Database,
    // Removed when the fixture drops
    pub server: TempDir,
}

impl DatabaseFixture {
    /// Create an empty database file named `name`
    pub fn new(name: &str) -> Result<Self> {
        Self::with_sink(name, Arc::new(TracingSink))
    }

    fn with_sink(name: &str, sink: Arc<dyn crate::core::db::DiagnosticSink>) -> Result<Self> {
        let server = TempDir::new()?;
        let server_path = server.path().to_string_lossy().into_owned();
        let options = ConnectOptions::new(name, &server_path, "tester", "secret")
            .create_if_missing(true);
        let db = connect_with_sink(&options, sink)?;

        Ok(DatabaseFixture {
            name: name.to_string(),
            db,
            server,
        })
    }

    /// Create fixture with an empty `subjects` table
    pub fn with_subjects(name: &str) -> Result<Self> {
        let fixture = Self::new(name)?;
        fixture.setup_subjects()?;
        Ok(fixture)
    }

    /// Same as `with_subjects`, reporting diagnostics into `sink`
    pub fn with_subjects_and_sink(name: &str, sink: BufferSink) -> Result<Self> {
        let fixture = Self::with_sink(name, Arc::new(sink))?;
        fixture.setup_subjects()?;
        Ok(fixture)
    }

    fn setup_subjects(&self) -> Result<()> {
        self.db
            .connection()
            .execute_batch(SUBJECTS_SCHEMA)
            .map_err(|e| self.db.translate(e))
    }

    pub fn options(&self) -> ConnectOptions {
        ConnectOptions::new(
            &self.name,
            &self.server.path().to_string_lossy(),
            "tester",
            "secret",
        )
    }
}

/// Error testing utilities
pub mod error_testing {
    use std::fmt::Display;

    /// Verify that an error message carries enough context to act on
    pub fn verify_error_message_quality<T, E>(result: &std::result::Result<T, E>, context: &str)
    where
        E: Display,
    {
        if let Err(e) = result {
            let message = e.to_string();
            assert!(
                message.len() > 10,
                "Error message too short in {}: '{}'",
                context,
                message
            );
            assert!(
                !message.contains("unwrap") && !message.contains("panic"),
                "Error message leaks internals in {}: '{}'",
                context,
                message
            );
        } else {
            panic!("Expected error in {}", context);
        }
    }
}

#[macro_export]
macro_rules! assert_sqlhelper_error {
    ($result:expr, $expected_type:ident, $context:expr) => {
        match $result {
            Err($crate::core::SqlHelperError::$expected_type { .. }) => {}
            Ok(_) => panic!(
                "Expected {} error but got Ok in {}",
                stringify!($expected_type),
                $context
            ),
            Err(other) => panic!(
                "Expected {} but got {:?} in {}",
                stringify!($expected_type),
                other,
                $context
            ),
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_fixture_creation() {
        let fixture = DatabaseFixture::new("test_create").unwrap();
        assert_eq!(fixture.name, "test_create");
        assert!(fixture.server.path().join("test_create.db").exists());
    }

    #[test]
    fn test_subjects_fixture() {
        let fixture = DatabaseFixture::with_subjects("test_subjects").unwrap();
        let count: i64 = fixture
            .db
            .connection()
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='subjects'",
                [],
                |row| row.get(0),
            )
            .expect("Failed to count tables");
        assert_eq!(count, 1);
    }

    #[test]
    fn test_error_assertion_macro() {
        let result: Result<()> = Err(SqlHelperError::Syntax {
            message: "SQLSTATE[42000]".to_string(),
        });
        assert_sqlhelper_error!(result, Syntax, "macro test");
    }

    #[test]
    fn test_error_message_quality() {
        let result: Result<()> = Err(SqlHelperError::InvalidRequest(
            "INSERT needs at least one field".to_string(),
        ));
        error_testing::verify_error_message_quality(&result, "invalid request");
    }
}
