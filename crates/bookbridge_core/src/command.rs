//! Command and record value objects shared by the store and bridge layers.
//!
//! # Responsibility
//! - Define the immutable command descriptors the workflow issues.
//! - Define the owned value/record shapes query results are mapped into.
//!
//! # Invariants
//! - Commands are constructed once per run and never mutated.
//! - `Record` keys are the column names reported by the store.

use rusqlite::types::{ToSqlOutput, ValueRef};
use rusqlite::ToSql;
use serde::Serialize;
use std::collections::BTreeMap;

/// A positional bind parameter for a command.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Param {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl ToSql for Param {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Self::Null => ToSqlOutput::Borrowed(ValueRef::Null),
            Self::Integer(value) => ToSqlOutput::Borrowed(ValueRef::Integer(*value)),
            Self::Real(value) => ToSqlOutput::Borrowed(ValueRef::Real(*value)),
            Self::Text(value) => ToSqlOutput::Borrowed(ValueRef::Text(value.as_bytes())),
            Self::Blob(value) => ToSqlOutput::Borrowed(ValueRef::Blob(value)),
        })
    }
}

/// One result cell read back from the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl Value {
    pub(crate) fn from_sqlite(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => Self::Null,
            ValueRef::Integer(v) => Self::Integer(v),
            ValueRef::Real(v) => Self::Real(v),
            ValueRef::Text(bytes) => Self::Text(String::from_utf8_lossy(bytes).into_owned()),
            ValueRef::Blob(bytes) => Self::Blob(bytes.to_vec()),
        }
    }
}

/// One record read back from the store, keyed by column name.
pub type Record = BTreeMap<String, Value>;

/// An immutable command: statement text plus ordered positional parameters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Command {
    pub sql: &'static str,
    pub params: Vec<Param>,
}

impl Command {
    pub fn new(sql: &'static str) -> Self {
        Self {
            sql,
            params: Vec::new(),
        }
    }

    pub fn with_params(sql: &'static str, params: Vec<Param>) -> Self {
        Self { sql, params }
    }
}

const DEFINE_BOOKS: &str =
    "CREATE TABLE books (id INTEGER PRIMARY KEY AUTOINCREMENT, title TEXT NOT NULL UNIQUE);";
const INSERT_BOOK: &str = "INSERT INTO books (title) VALUES (?1);";
const READ_BOOKS: &str = "SELECT id, title FROM books;";
const DROP_BOOKS: &str = "DROP TABLE books;";
const INSERT_UNDECLARED_COLUMN: &str = "INSERT INTO books (title, author) VALUES (?1, ?2);";
const READ_UNDECLARED_COLUMN: &str = "SELECT id, title, author FROM books;";

/// Title inserted by the well-formed command set.
pub const BOOK_TITLE: &str = "吾輩は猫である";
const BOOK_AUTHOR: &str = "夏目漱石";

/// The four workflow commands for one demonstration run.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandSet {
    pub define: Command,
    pub insert: Command,
    pub read: Command,
    pub drop: Command,
}

impl CommandSet {
    /// Commands that complete the whole workflow without a store error.
    pub fn well_formed() -> Self {
        Self {
            define: Command::new(DEFINE_BOOKS),
            insert: Command::with_params(INSERT_BOOK, vec![Param::Text(BOOK_TITLE.to_string())]),
            read: Command::new(READ_BOOKS),
            drop: Command::new(DROP_BOOKS),
        }
    }

    /// Commands whose insert and read reference an undeclared `author`
    /// column. Define and drop stay valid so cleanup is still exercised.
    pub fn malformed() -> Self {
        Self {
            define: Command::new(DEFINE_BOOKS),
            insert: Command::with_params(
                INSERT_UNDECLARED_COLUMN,
                vec![
                    Param::Text(BOOK_TITLE.to_string()),
                    Param::Text(BOOK_AUTHOR.to_string()),
                ],
            ),
            read: Command::new(READ_UNDECLARED_COLUMN),
            drop: Command::new(DROP_BOOKS),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CommandSet, Param, BOOK_TITLE};

    #[test]
    fn well_formed_insert_binds_the_title_positionally() {
        let commands = CommandSet::well_formed();
        assert_eq!(
            commands.insert.params,
            vec![Param::Text(BOOK_TITLE.to_string())]
        );
        assert!(commands.define.params.is_empty());
        assert!(commands.drop.params.is_empty());
    }

    #[test]
    fn malformed_set_shares_define_and_drop_with_the_well_formed_set() {
        let well_formed = CommandSet::well_formed();
        let malformed = CommandSet::malformed();
        assert_eq!(well_formed.define, malformed.define);
        assert_eq!(well_formed.drop, malformed.drop);
        assert_ne!(well_formed.insert, malformed.insert);
        assert_ne!(well_formed.read, malformed.read);
    }
}
