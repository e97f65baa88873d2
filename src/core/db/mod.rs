/// Database Module
///
/// The database layer is split into focused submodules:
/// - **Fields** (`fields.rs`): values, ordered field maps and the request types
/// - **Connection** (`connection.rs`): opening and releasing a database handle
/// - **SQLSTATE** (`sqlstate.rs`): rendering driver errors as SQLSTATE-tagged text
/// - **Classification** (`classify.rs`): error classifier and diagnostic sinks
/// - **Queries** (`query.rs`): statement builders and the insert/delete/select helpers
///
/// ## Error Handling
///
/// Every driver error goes through `classify::translate` before it reaches
/// the caller as a `SqlHelperError`.
pub mod classify;
pub mod connection;
pub mod fields;
pub mod query;
pub mod sqlstate;

pub use classify::*;
pub use connection::*;
pub use fields::*;
pub use query::*;
