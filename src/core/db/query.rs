/// Query Execution Module
///
/// Builds parameterized INSERT / DELETE / SELECT statements from the
/// request types in `fields.rs` and runs them on a `Database`. Every
/// driver error is classified through the handle's diagnostic sink before
/// it is returned.

use crate::core::db::connection::Database;
use crate::core::db::fields::{
    column_list, placeholder_list, validate_identifier, DeleteFilter, FieldMap, FieldValue,
    InsertRequest, Projection, Row,
};
use crate::core::{Result, SqlHelperError};
use rusqlite::types::ToSql;
use rusqlite::Statement;
use tracing::debug;

/// Rows returned by a select
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    /// At least one row, in the order the database returned them
    Rows(Vec<Row>),
    /// The query ran and matched nothing
    NoRows,
}

impl Selection {
    /// Wraps fetched rows, turning an empty fetch into `NoRows`
    pub fn from_rows(rows: Vec<Row>) -> Self {
        if rows.is_empty() {
            Selection::NoRows
        } else {
            Selection::Rows(rows)
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Selection::NoRows)
    }

    pub fn len(&self) -> usize {
        self.rows().len()
    }

    pub fn rows(&self) -> &[Row] {
        match self {
            Selection::Rows(rows) => rows,
            Selection::NoRows => &[],
        }
    }

    pub fn into_rows(self) -> Vec<Row> {
        match self {
            Selection::Rows(rows) => rows,
            Selection::NoRows => Vec::new(),
        }
    }
}

fn validate_columns<'c>(columns: impl IntoIterator<Item = &'c str>) -> Result<()> {
    columns
        .into_iter()
        .try_for_each(|column| validate_identifier("column", column))
}

fn require_fields(fields: &FieldMap, statement: &str) -> Result<()> {
    if fields.is_empty() {
        return Err(SqlHelperError::InvalidRequest(format!(
            "{} needs at least one field",
            statement
        )));
    }
    validate_columns(fields.keys())
}

/// `INSERT INTO <table> (<columns>) VALUES (<placeholders>)`
pub fn insert_sql(table: &str, request: &InsertRequest) -> Result<String> {
    validate_identifier("table", table)?;
    let fields = request.fields();
    require_fields(fields, "INSERT")?;

    Ok(format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table,
        column_list(fields.keys()),
        placeholder_list(fields.keys())
    ))
}

/// `DELETE FROM <table> WHERE (<columns> = <placeholders>)`
///
/// All filter columns share one equality expression, so only single-field
/// filters form a valid predicate. Multi-field filters are passed through
/// unchanged and fail when the statement is prepared.
pub fn delete_sql(table: &str, filter: &DeleteFilter) -> Result<String> {
    validate_identifier("table", table)?;
    let fields = filter.fields();
    require_fields(fields, "DELETE")?;

    Ok(format!(
        "DELETE FROM {} WHERE ({} = {})",
        table,
        column_list(fields.keys()),
        placeholder_list(fields.keys())
    ))
}

/// `SELECT <columns> FROM <table>`, with no WHERE clause
pub fn select_sql(table: &str, projection: &Projection) -> Result<String> {
    validate_identifier("table", table)?;
    if projection.is_empty() {
        return Err(SqlHelperError::InvalidRequest(
            "SELECT needs at least one column".to_string(),
        ));
    }
    validate_columns(projection.columns().iter().map(String::as_str))?;
    // Rows are keyed by column name, so a repeated column would collapse
    if let Some((i, column)) = projection
        .columns()
        .iter()
        .enumerate()
        .find(|(i, column)| projection.columns()[..*i].contains(*column))
    {
        return Err(SqlHelperError::InvalidRequest(format!(
            "column '{}' appears more than once in the projection (position {})",
            column,
            i + 1
        )));
    }

    Ok(format!(
        "SELECT {} FROM {}",
        column_list(projection.columns()),
        table
    ))
}

/// Query execution service that operates on a database handle
pub struct QueryExecutor<'a> {
    db: &'a Database,
}

impl<'a> QueryExecutor<'a> {
    pub fn new(db: &'a Database) -> Self {
        QueryExecutor { db }
    }

    fn prepare(&self, sql: &str) -> Result<Statement<'a>> {
        debug!("Preparing: {}", sql);
        self.db
            .connection()
            .prepare(sql)
            .map_err(|e| self.db.translate(e))
    }

    /// Binds every field to its `:column` placeholder and executes
    fn execute_bound(&self, sql: &str, fields: &FieldMap) -> Result<usize> {
        let mut stmt = self.prepare(sql)?;
        let named = fields.named_params();
        let params: Vec<(&str, &dyn ToSql)> = named
            .iter()
            .map(|(name, value)| (name.as_str(), *value as &dyn ToSql))
            .collect();

        let affected = stmt
            .execute(params.as_slice())
            .map_err(|e| self.db.translate(e))?;
        debug!("{} row(s) affected", affected);
        Ok(affected)
    }

    /// Inserts one row.
    ///
    /// # Errors
    ///
    /// `InvalidRequest` for an empty request or non-identifier names; any
    /// driver failure comes back classified (`DuplicateKey`, `AccessDenied`, ...).
    pub fn insert(&self, table: &str, request: &InsertRequest) -> Result<()> {
        let sql = insert_sql(table, request)?;
        self.execute_bound(&sql, request.fields())?;
        Ok(())
    }

    /// Deletes the rows matched by `filter`.
    ///
    /// Only single-field filters form a valid predicate; see `delete_sql`.
    pub fn delete(&self, table: &str, filter: &DeleteFilter) -> Result<()> {
        let sql = delete_sql(table, filter)?;
        self.execute_bound(&sql, filter.fields())?;
        Ok(())
    }

    /// Returns every row of `table`, projected onto `projection`.
    pub fn select(&self, table: &str, projection: &Projection) -> Result<Selection> {
        let sql = select_sql(table, projection)?;
        let mut stmt = self.prepare(&sql)?;
        let mut rows = stmt.query([]).map_err(|e| self.db.translate(e))?;

        let mut output = Vec::new();
        while let Some(row) = rows.next().map_err(|e| self.db.translate(e))? {
            let mut projected = Row::new();
            for (index, column) in projection.columns().iter().enumerate() {
                let value = row.get_ref(index).map_err(|e| self.db.translate(e))?;
                projected.insert(column, FieldValue::from(value));
            }
            output.push(projected);
        }

        debug!("Fetched {} row(s) from {}", output.len(), table);
        Ok(Selection::from_rows(output))
    }

    pub fn last_insert_id(&self) -> i64 {
        self.db.last_insert_id()
    }
}

/// Convenience function to insert a row on a database handle
pub fn insert_into(db: &Database, table: &str, request: &InsertRequest) -> Result<()> {
    QueryExecutor::new(db).insert(table, request)
}

/// Convenience function to delete rows on a database handle
pub fn delete_from(db: &Database, table: &str, filter: &DeleteFilter) -> Result<()> {
    QueryExecutor::new(db).delete(table, filter)
}

/// Convenience function to select rows on a database handle
pub fn select_from(db: &Database, table: &str, projection: &Projection) -> Result<Selection> {
    QueryExecutor::new(db).select(table, projection)
}

/// Rowid of the last successful insert on `db`
pub fn last_insert_id(db: &Database) -> i64 {
    db.last_insert_id()
}
