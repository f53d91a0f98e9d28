// Embedded SQLite driver (compound statements supported)
use crate::domain::error::QwarmError;
use crate::domain::model::{DriverId, DriverResponse, Row};
use crate::domain::traits::Driver;
use async_trait::async_trait;
use rusqlite::types::ValueRef;
use std::path::Path;
use tokio_rusqlite::Connection;

/// Driver for the embedded SQLite pool.
///
/// The rendered query text may contain several `;`-separated statements;
/// each statement producing a result shape becomes one recordset, in
/// statement order.
pub struct SqliteDriver {
    conn: Connection,
}

impl SqliteDriver {
    pub async fn open(path: &Path) -> Result<Self, QwarmError> {
        let conn = Connection::open(path.to_path_buf()).await?;
        Ok(Self { conn })
    }

    pub async fn open_in_memory() -> Result<Self, QwarmError> {
        let conn = Connection::open_in_memory().await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl Driver for SqliteDriver {
    fn id(&self) -> DriverId {
        DriverId::Sqlite
    }

    fn connected(&self) -> bool {
        // The connection is held open for the driver's lifetime.
        true
    }

    async fn run_query(&self, query: &str) -> Result<DriverResponse, QwarmError> {
        let query = query.to_string();
        let mut groups = self
            .conn
            .call(move |conn| {
                let mut groups: Vec<Vec<Row>> = Vec::new();
                for statement_text in split_statements(&query) {
                    let mut stmt = conn.prepare(&statement_text)?;
                    if stmt.column_count() == 0 {
                        // DDL/DML, no result shape
                        stmt.execute([])?;
                        continue;
                    }

                    let columns: Vec<String> = stmt
                        .column_names()
                        .iter()
                        .map(|name| name.to_string())
                        .collect();
                    let mut rows = stmt.query([])?;
                    let mut group = Vec::new();
                    while let Some(row) = rows.next()? {
                        let mut record = Row::new();
                        for (idx, column) in columns.iter().enumerate() {
                            record.insert(column.clone(), value_to_json(row.get_ref(idx)?));
                        }
                        group.push(record);
                    }
                    groups.push(group);
                }
                Ok(groups)
            })
            .await?;

        Ok(match groups.len() {
            0 => DriverResponse::Empty,
            1 => DriverResponse::SingleSet(groups.remove(0)),
            _ => DriverResponse::MultiSet(groups),
        })
    }
}

#[derive(PartialEq)]
enum SplitMode {
    Plain,
    SingleQuoted,
    DoubleQuoted,
    LineComment,
    BlockComment,
}

/// Split the rendered text into statements on `;`, skipping separators
/// inside quoted literals, quoted identifiers, and comments.
fn split_statements(text: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut mode = SplitMode::Plain;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match mode {
            SplitMode::Plain => match c {
                ';' => {
                    statements.push(std::mem::take(&mut current));
                    continue;
                }
                '\'' => {
                    mode = SplitMode::SingleQuoted;
                }
                '"' => {
                    mode = SplitMode::DoubleQuoted;
                }
                '-' if chars.peek() == Some(&'-') => {
                    mode = SplitMode::LineComment;
                }
                '/' if chars.peek() == Some(&'*') => {
                    mode = SplitMode::BlockComment;
                }
                _ => {}
            },
            SplitMode::SingleQuoted if c == '\'' => {
                // A doubled quote is an escaped quote, not the end of
                // the literal.
                if chars.peek() == Some(&'\'') {
                    current.push(c);
                    current.push(chars.next().unwrap_or_default());
                    continue;
                }
                mode = SplitMode::Plain;
            }
            SplitMode::DoubleQuoted if c == '"' => {
                if chars.peek() == Some(&'"') {
                    current.push(c);
                    current.push(chars.next().unwrap_or_default());
                    continue;
                }
                mode = SplitMode::Plain;
            }
            SplitMode::LineComment if c == '\n' => {
                mode = SplitMode::Plain;
            }
            SplitMode::BlockComment if c == '*' && chars.peek() == Some(&'/') => {
                current.push(c);
                current.push(chars.next().unwrap_or_default());
                mode = SplitMode::Plain;
                continue;
            }
            _ => {}
        }
        current.push(c);
    }
    statements.push(current);

    statements
        .iter()
        .map(|statement| statement.trim())
        .filter(|fragment| !is_blank_fragment(fragment))
        .map(str::to_string)
        .collect()
}

/// A fragment with nothing but whitespace and `--` comments has no
/// statement to prepare.
fn is_blank_fragment(fragment: &str) -> bool {
    fragment
        .lines()
        .map(str::trim)
        .all(|line| line.is_empty() || line.starts_with("--"))
}

fn value_to_json(value: ValueRef<'_>) -> serde_json::Value {
    match value {
        ValueRef::Null => serde_json::Value::Null,
        ValueRef::Integer(i) => serde_json::Value::from(i),
        ValueRef::Real(f) => serde_json::Number::from_f64(f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        ValueRef::Text(t) => serde_json::Value::String(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => serde_json::Value::String(hex::encode(b)),
    }
}
