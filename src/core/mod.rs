/// Core Module for sqlhelper
///
/// Connection handling, statement building and error classification live
/// here; the configuration layer and the command-line front end sit on top.

pub mod db;
pub mod error;

// Re-export commonly used types for convenience
pub use error::{Result, SqlHelperError};
