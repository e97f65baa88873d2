/// Connection Management Module
///
/// Opens a database handle from (database name, server, username, password)
/// and owns the diagnostic sink every later error is classified through.
/// For SQLite the server is the directory holding the database files, or
/// `:memory:` for a private in-memory database.

use crate::core::db::classify::{self, DiagnosticSink, TracingSink};
use crate::core::db::sqlstate;
use crate::core::{Result, SqlHelperError};
use rusqlite::{Connection, OpenFlags};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Server identifier selecting a private in-memory database
pub const IN_MEMORY: &str = ":memory:";

/// Extension appended to database names that carry none
pub const DEFAULT_EXTENSION: &str = "db";

/// Parameters for opening a database
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectOptions {
    pub database: String,
    pub server: String,
    pub username: String,
    pub password: String,
    /// Create the database file when it does not exist yet
    pub create_if_missing: bool,
    /// Open without write access; writes then fail as access denied
    pub read_only: bool,
}

impl ConnectOptions {
    pub fn new(database: &str, server: &str, username: &str, password: &str) -> Self {
        ConnectOptions {
            database: database.to_string(),
            server: server.to_string(),
            username: username.to_string(),
            password: password.to_string(),
            create_if_missing: false,
            read_only: false,
        }
    }

    pub fn create_if_missing(mut self, create: bool) -> Self {
        self.create_if_missing = create;
        self
    }

    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    /// Whether these options select an in-memory database
    pub fn is_in_memory(&self) -> bool {
        self.server == IN_MEMORY
    }

    /// Path of the database file, `None` for in-memory databases
    pub fn database_path(&self) -> Option<PathBuf> {
        if self.is_in_memory() {
            return None;
        }
        let file = if Path::new(&self.database).extension().is_some() {
            self.database.clone()
        } else {
            format!("{}.{}", self.database, DEFAULT_EXTENSION)
        };
        Some(Path::new(&self.server).join(file))
    }

    fn open_flags(&self) -> OpenFlags {
        let access = if self.read_only {
            OpenFlags::SQLITE_OPEN_READ_ONLY
        } else if self.create_if_missing {
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE
        } else {
            OpenFlags::SQLITE_OPEN_READ_WRITE
        };
        access | OpenFlags::SQLITE_OPEN_URI | OpenFlags::SQLITE_OPEN_NO_MUTEX
    }
}

impl fmt::Debug for ConnectOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectOptions")
            .field("database", &self.database)
            .field("server", &self.server)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("create_if_missing", &self.create_if_missing)
            .field("read_only", &self.read_only)
            .finish()
    }
}

/// An open session on one database.
///
/// Owned by the caller; dropping it releases the session. Use `close` to
/// observe a failed release.
pub struct Database {
    conn: Connection,
    database: String,
    server: String,
    username: String,
    sink: Arc<dyn DiagnosticSink>,
}

impl Database {
    /// The underlying SQLite connection
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn database_name(&self) -> &str {
        &self.database
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn sink(&self) -> &dyn DiagnosticSink {
        self.sink.as_ref()
    }

    /// Replaces the sink that classified errors are reported to
    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Rowid of the most recent successful insert on this connection.
    ///
    /// Returns 0 if nothing was inserted yet.
    pub fn last_insert_id(&self) -> i64 {
        self.conn.last_insert_rowid()
    }

    /// Classifies and logs a driver error, returning the typed error
    pub fn translate(&self, err: rusqlite::Error) -> SqlHelperError {
        classify::translate(&err, self.sink())
    }

    /// Closes the session, reporting a failed release
    pub fn close(self) -> Result<()> {
        let Database { conn, database, sink, .. } = self;
        debug!("Closing database {}", database);
        conn.close()
            .map_err(|(_, e)| classify::translate(&e, sink.as_ref()))
    }
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("database", &self.database)
            .field("server", &self.server)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// Opens a database, reporting failures through `tracing`.
///
/// SQLite has no accounts: `username` and `password` are recorded for
/// diagnostics but never verified, so any credentials connect.
///
/// # Errors
///
/// Returns `SqlHelperError::Connection` if the server or database cannot
/// be opened, the file is not a database, or a read-only in-memory
/// database is requested.
///
/// # Examples
///
/// ```no_run
/// use sqlhelper::core::db::{connect, ConnectOptions};
///
/// let options = ConnectOptions::new("app", "/var/lib/app", "app", "secret");
/// let db = connect(&options)?;
/// db.close()?;
/// # Ok::<(), sqlhelper::core::SqlHelperError>(())
/// ```
pub fn connect(options: &ConnectOptions) -> Result<Database> {
    connect_with_sink(options, Arc::new(TracingSink))
}

/// Opens a database, reporting failures to `sink`.
pub fn connect_with_sink(
    options: &ConnectOptions,
    sink: Arc<dyn DiagnosticSink>,
) -> Result<Database> {
    info!(
        "Connecting to database {} on {} as {}",
        options.database, options.server, options.username
    );

    if options.is_in_memory() && options.read_only {
        let message = format!(
            "SQLSTATE[{}]: Unable to connect: an in-memory database cannot be opened read-only",
            sqlstate::UNABLE_TO_CONNECT
        );
        classify::handle_error_message(&message, sink.as_ref());
        return Err(SqlHelperError::Connection { message });
    }

    let conn = open(options).map_err(|e| classify::translate_connect(&e, sink.as_ref()))?;

    Ok(Database {
        conn,
        database: options.database.clone(),
        server: options.server.clone(),
        username: options.username.clone(),
        sink,
    })
}

fn open(options: &ConnectOptions) -> rusqlite::Result<Connection> {
    let conn = match options.database_path() {
        None => Connection::open_in_memory()?,
        Some(path) => {
            debug!("Opening {:?} with {:?}", path, options.open_flags());
            Connection::open_with_flags(path, options.open_flags())?
        }
    };

    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    // Opening is lazy; reading the schema proves the file is a database
    conn.query_row("SELECT COUNT(*) FROM sqlite_master", [], |row| row.get::<_, i64>(0))?;

    Ok(conn)
}
