use crate::core::db::{
    DeleteFilter, FieldMap, FieldValue, InsertRequest, Projection, QueryExecutor, Selection,
    Database,
};
use crate::core::{Result, SqlHelperError};

pub const USAGE: &str = "usage: sqlhelper [config.toml] <insert|delete|select> <table> [column=value ... | column ...]";

const VERBS: [&str; 3] = ["insert", "delete", "select"];

pub fn is_verb(arg: &str) -> bool {
    VERBS.contains(&arg)
}

/// A parsed command-line request.
#[derive(Debug, PartialEq)]
pub enum Command {
    Insert { table: String, fields: FieldMap },
    Delete { table: String, fields: FieldMap },
    Select { table: String, projection: Projection },
}

/// Parses a literal into the narrowest value: integer, finite real, `NULL`, then text.
pub fn parse_value(raw: &str) -> FieldValue {
    if let Ok(i) = raw.parse::<i64>() {
        FieldValue::Integer(i)
    } else if let Some(f) = raw.parse::<f64>().ok().filter(|f| f.is_finite()) {
        FieldValue::Real(f)
    } else if raw.eq_ignore_ascii_case("null") {
        FieldValue::Null
    } else {
        FieldValue::Text(raw.to_string())
    }
}

fn parse_fields(args: &[String]) -> Result<FieldMap> {
    args.iter()
        .map(|arg| {
            arg.split_once('=')
                .map(|(column, value)| (column.to_string(), parse_value(value)))
                .ok_or_else(|| {
                    SqlHelperError::InvalidRequest(format!("expected column=value, got '{}'", arg))
                })
        })
        .collect()
}

/// Parses `<insert|delete|select> <table> [args...]`.
pub fn parse_command(args: &[String]) -> Result<Command> {
    let (verb, table, rest) = match args {
        [verb, table, rest @ ..] => (verb.as_str(), table.clone(), rest),
        _ => return Err(SqlHelperError::InvalidRequest(USAGE.to_string())),
    };

    match verb {
        "insert" => Ok(Command::Insert {
            table,
            fields: parse_fields(rest)?,
        }),
        "delete" => Ok(Command::Delete {
            table,
            fields: parse_fields(rest)?,
        }),
        "select" => Ok(Command::Select {
            table,
            projection: Projection::new(rest.iter().cloned()),
        }),
        other => Err(SqlHelperError::InvalidRequest(format!(
            "unknown command '{}'\n{}",
            other, USAGE
        ))),
    }
}

/// Runs a command and renders its output.
///
/// Inserts print the new row id, selects print rows as a JSON array.
pub fn run(db: &Database, command: Command) -> Result<String> {
    let executor = QueryExecutor::new(db);
    match command {
        Command::Insert { table, fields } => {
            executor.insert(&table, &InsertRequest::from(fields))?;
            Ok(executor.last_insert_id().to_string())
        }
        Command::Delete { table, fields } => {
            executor.delete(&table, &DeleteFilter::from(fields))?;
            Ok(format!("deleted from {}", table))
        }
        Command::Select { table, projection } => match executor.select(&table, &projection)? {
            Selection::NoRows => Ok("no rows".to_string()),
            Selection::Rows(rows) => Ok(serde_json::to_string_pretty(&rows)?),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::DatabaseFixture;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_value() {
        assert_eq!(parse_value("42"), FieldValue::Integer(42));
        assert_eq!(parse_value("-1.5"), FieldValue::Real(-1.5));
        assert_eq!(parse_value("NULL"), FieldValue::Null);
        assert_eq!(parse_value("alice"), FieldValue::Text("alice".into()));
        assert_eq!(parse_value(""), FieldValue::Text(String::new()));
        assert_eq!(parse_value("nan"), FieldValue::Text("nan".into()));
        assert_eq!(parse_value("inf"), FieldValue::Text("inf".into()));
        assert_eq!(parse_value("Infinity"), FieldValue::Text("Infinity".into()));
    }

    #[test]
    fn test_parse_insert_command() {
        let command = parse_command(&args(&["insert", "subjects", "subject=alice", "score=3"])).unwrap();
        assert_eq!(
            command,
            Command::Insert {
                table: "subjects".into(),
                fields: FieldMap::new().with("subject", "alice").with("score", 3),
            }
        );
    }

    #[test]
    fn test_parse_select_command() {
        let command = parse_command(&args(&["select", "subjects", "id", "subject"])).unwrap();
        assert_eq!(
            command,
            Command::Select {
                table: "subjects".into(),
                projection: Projection::new(["id", "subject"]),
            }
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            parse_command(&args(&["insert"])),
            Err(SqlHelperError::InvalidRequest(_))
        ));
        assert!(matches!(
            parse_command(&args(&["upsert", "t"])),
            Err(SqlHelperError::InvalidRequest(_))
        ));
        assert!(matches!(
            parse_command(&args(&["delete", "t", "no-equals"])),
            Err(SqlHelperError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_run_commands() {
        let fixture = DatabaseFixture::with_subjects("cli_run").unwrap();
        let db = &fixture.db;

        let none = run(db, parse_command(&args(&["select", "subjects", "subject"])).unwrap()).unwrap();
        assert_eq!(none, "no rows");

        let id = run(db, parse_command(&args(&["insert", "subjects", "subject=alice"])).unwrap()).unwrap();
        assert_eq!(id, "1");

        let rows = run(db, parse_command(&args(&["select", "subjects", "id", "subject"])).unwrap()).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&rows).unwrap();
        assert_eq!(parsed, serde_json::json!([{"id": 1, "subject": "alice"}]));

        let deleted = run(db, parse_command(&args(&["delete", "subjects", "id=1"])).unwrap()).unwrap();
        assert_eq!(deleted, "deleted from subjects");
    }
}
