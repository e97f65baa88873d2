// Core infrastructure modules
pub mod core;

pub mod cli;
pub mod config;

#[cfg(test)]
mod test_utils;

pub use crate::core::db::{
    connect, delete_from, insert_into, last_insert_id, select_from, ConnectOptions, Database,
    DeleteFilter, FieldMap, FieldValue, InsertRequest, Projection, Row, Selection,
};
pub use crate::core::{Result, SqlHelperError};
