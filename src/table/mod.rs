pub mod directory;
pub mod financial;
pub mod lenient;

use rocket::request::FromParam;
use rusqlite::types::Value as SqlValue;
use rusqlite::{Connection, Row};
use sea_query::Iden;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

pub use directory::{Directory, DirectoryFields, DirectoryRecord};
pub use financial::{Financial, FinancialFields, FinancialRecord};

/// The four independently addressed record tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Executive,
    Members,
    FounderMembers,
    FinancialHistory,
}

/// Which typed schema backs a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaKind {
    Directory,
    Financial,
}

impl Collection {
    pub const ALL: [Collection; 4] = [
        Collection::Executive,
        Collection::Members,
        Collection::FounderMembers,
        Collection::FinancialHistory,
    ];

    pub const fn table(self) -> &'static str {
        match self {
            Collection::Executive => "executive",
            Collection::Members => "members",
            Collection::FounderMembers => "founder_members",
            Collection::FinancialHistory => "financial_history",
        }
    }

    pub const fn kind(self) -> SchemaKind {
        match self {
            Collection::FinancialHistory => SchemaKind::Financial,
            _ => SchemaKind::Directory,
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table())
    }
}

impl FromStr for Collection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Collection::ALL
            .into_iter()
            .find(|collection| collection.table() == s)
            .ok_or_else(|| format!("Unknown collection: {}", s))
    }
}

impl<'a> FromParam<'a> for Collection {
    type Error = String;

    fn from_param(param: &'a str) -> Result<Self, Self::Error> {
        param.parse()
    }
}

/// A typed table layout shared by one or more collections.
///
/// The column enum is the allow-list: only its variants ever appear as
/// identifiers in generated SQL. Payload values are always bound parameters.
pub trait Schema: 'static {
    type Column: Iden + Copy + Send + Sync + 'static;
    type Record: Into<Record>;
    type Fields: Into<RecordFields>;

    const ID: Self::Column;
    /// Every non-key column, in table order.
    const COLUMNS: &'static [Self::Column];

    fn create_table(conn: &Connection, table: &str) -> rusqlite::Result<()>;

    fn from_row(row: &Row) -> rusqlite::Result<Self::Record>;

    /// Value for every column in [`Schema::COLUMNS`]; absent fields bind as NULL.
    fn insert_values(fields: &Self::Fields) -> Vec<sea_query::Value>;

    /// Only the columns present in `fields`, for a partial overwrite.
    fn assignments(fields: &Self::Fields) -> Vec<(Self::Column, sea_query::Value)>;
}

/// A stored row of any collection, as returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Record {
    Directory(DirectoryRecord),
    Financial(FinancialRecord),
}

impl From<DirectoryRecord> for Record {
    fn from(record: DirectoryRecord) -> Self {
        Record::Directory(record)
    }
}

impl From<FinancialRecord> for Record {
    fn from(record: FinancialRecord) -> Self {
        Record::Financial(record)
    }
}

/// Client-submitted fields of any collection, already checked against its schema.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RecordFields {
    Directory(DirectoryFields),
    Financial(FinancialFields),
}

impl RecordFields {
    pub fn is_empty(&self) -> bool {
        match self {
            RecordFields::Directory(fields) => Directory::assignments(fields).is_empty(),
            RecordFields::Financial(fields) => Financial::assignments(fields).is_empty(),
        }
    }

    /// Points the record at a stored attachment. Only directory records carry a photo.
    pub fn set_photo(&mut self, filename: String) -> bool {
        match self {
            RecordFields::Directory(fields) => {
                fields.photo = Some(Some(filename));
                true
            }
            RecordFields::Financial(_) => false,
        }
    }
}

impl From<DirectoryFields> for RecordFields {
    fn from(fields: DirectoryFields) -> Self {
        RecordFields::Directory(fields)
    }
}

impl From<FinancialFields> for RecordFields {
    fn from(fields: FinancialFields) -> Self {
        RecordFields::Financial(fields)
    }
}

/// Reads a text column, tolerating numbers stored by older clients.
pub(crate) fn text_column(row: &Row, column: impl Iden) -> rusqlite::Result<Option<String>> {
    Ok(match row.get::<_, SqlValue>(column.to_string().as_str())? {
        SqlValue::Null => None,
        SqlValue::Text(s) => Some(s),
        SqlValue::Integer(i) => Some(i.to_string()),
        SqlValue::Real(f) => Some(f.to_string()),
        SqlValue::Blob(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
    })
}

/// Reads a REAL column; SQLite keeps unparseable text as-is, which reads back as NULL here.
pub(crate) fn real_column(row: &Row, column: impl Iden) -> rusqlite::Result<Option<f64>> {
    Ok(match row.get::<_, SqlValue>(column.to_string().as_str())? {
        SqlValue::Integer(i) => Some(i as f64),
        SqlValue::Real(f) => Some(f),
        SqlValue::Text(s) => s.trim().parse().ok(),
        SqlValue::Null | SqlValue::Blob(_) => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collection_names_round_trip() {
        for collection in Collection::ALL {
            assert_eq!(collection.table().parse::<Collection>(), Ok(collection));
        }
        assert!("users".parse::<Collection>().is_err());
        assert!("send-email".parse::<Collection>().is_err());
    }

    #[test]
    fn only_financial_history_uses_the_financial_schema() {
        let financial: Vec<_> = Collection::ALL
            .into_iter()
            .filter(|c| c.kind() == SchemaKind::Financial)
            .collect();
        assert_eq!(financial, vec![Collection::FinancialHistory]);
    }

    #[test]
    fn photo_is_ignored_for_financial_fields() {
        let mut fields = RecordFields::from(FinancialFields::default());
        assert!(!fields.set_photo("1.jpg".to_string()));

        let mut fields = RecordFields::from(DirectoryFields::default());
        assert!(fields.set_photo("1.jpg".to_string()));
        assert!(!fields.is_empty());
    }
}
