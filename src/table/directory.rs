use rusqlite::{Connection, Row};
use sea_query::{Alias, ColumnDef, Iden, SqliteQueryBuilder, Table, Value};
use serde::{Deserialize, Serialize};

use super::{Schema, lenient, text_column};

/// Column identifiers shared by `executive`, `members` and `founder_members`.
#[derive(Iden, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryColumn {
    Id,
    Name,
    Businessname,
    Phoneno,
    Emailid,
    Shopno,
    Photo,
    Remarks,
}

/// A person or business entry in one of the directory collections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryRecord {
    pub id: i64,
    pub name: Option<String>,
    pub businessname: Option<String>,
    pub phoneno: Option<String>,
    pub emailid: Option<String>,
    pub shopno: Option<String>,
    /// Filename under the uploads directory.
    pub photo: Option<String>,
    pub remarks: Option<String>,
}

/// Writable directory columns. `None` means "not submitted" and `Some(None)`
/// clears the column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryFields {
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub name: Option<Option<String>>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub businessname: Option<Option<String>>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub phoneno: Option<Option<String>>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub emailid: Option<Option<String>>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub shopno: Option<Option<String>>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub photo: Option<Option<String>>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub remarks: Option<Option<String>>,
}

impl DirectoryFields {
    fn columns(&self) -> [(DirectoryColumn, &Option<Option<String>>); 7] {
        [
            (DirectoryColumn::Name, &self.name),
            (DirectoryColumn::Businessname, &self.businessname),
            (DirectoryColumn::Phoneno, &self.phoneno),
            (DirectoryColumn::Emailid, &self.emailid),
            (DirectoryColumn::Shopno, &self.shopno),
            (DirectoryColumn::Photo, &self.photo),
            (DirectoryColumn::Remarks, &self.remarks),
        ]
    }
}

pub struct Directory;

impl Schema for Directory {
    type Column = DirectoryColumn;
    type Record = DirectoryRecord;
    type Fields = DirectoryFields;

    const ID: DirectoryColumn = DirectoryColumn::Id;
    const COLUMNS: &'static [DirectoryColumn] = &[
        DirectoryColumn::Name,
        DirectoryColumn::Businessname,
        DirectoryColumn::Phoneno,
        DirectoryColumn::Emailid,
        DirectoryColumn::Shopno,
        DirectoryColumn::Photo,
        DirectoryColumn::Remarks,
    ];

    fn create_table(conn: &Connection, table: &str) -> rusqlite::Result<()> {
        let mut statement = Table::create();
        statement.table(Alias::new(table)).if_not_exists().col(
            ColumnDef::new(DirectoryColumn::Id)
                .integer()
                .not_null()
                .auto_increment()
                .primary_key(),
        );
        for column in Self::COLUMNS {
            statement.col(ColumnDef::new(*column).text());
        }

        conn.execute(&statement.build(SqliteQueryBuilder), [])?;
        Ok(())
    }

    fn from_row(row: &Row) -> rusqlite::Result<DirectoryRecord> {
        Ok(DirectoryRecord {
            id: row.get(DirectoryColumn::Id.to_string().as_str())?,
            name: text_column(row, DirectoryColumn::Name)?,
            businessname: text_column(row, DirectoryColumn::Businessname)?,
            phoneno: text_column(row, DirectoryColumn::Phoneno)?,
            emailid: text_column(row, DirectoryColumn::Emailid)?,
            shopno: text_column(row, DirectoryColumn::Shopno)?,
            photo: text_column(row, DirectoryColumn::Photo)?,
            remarks: text_column(row, DirectoryColumn::Remarks)?,
        })
    }

    fn insert_values(fields: &DirectoryFields) -> Vec<Value> {
        fields
            .columns()
            .into_iter()
            .map(|(_, value)| Value::from(value.clone().flatten()))
            .collect()
    }

    fn assignments(fields: &DirectoryFields) -> Vec<(DirectoryColumn, Value)> {
        fields
            .columns()
            .into_iter()
            .filter_map(|(column, value)| value.clone().map(|v| (column, Value::from(v))))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn column_names_match_legacy_tables() {
        let names: Vec<String> = Directory::COLUMNS.iter().map(|c| c.to_string()).collect();
        assert_eq!(
            names,
            ["name", "businessname", "phoneno", "emailid", "shopno", "photo", "remarks"]
        );
    }

    #[test]
    fn unknown_keys_are_dropped_and_numbers_become_text() {
        let fields: DirectoryFields = serde_json::from_value(json!({
            "name": "A Shop",
            "phoneno": 9876543210u64,
            "is_admin": true,
        }))
        .unwrap();

        assert_eq!(fields.name, Some(Some("A Shop".to_string())));
        assert_eq!(fields.phoneno, Some(Some("9876543210".to_string())));
        assert_eq!(
            serde_json::to_value(&fields).unwrap(),
            json!({"name": "A Shop", "phoneno": "9876543210"})
        );
    }

    #[test]
    fn assignments_only_cover_submitted_columns() {
        let fields = DirectoryFields {
            shopno: Some(Some("12".to_string())),
            ..Default::default()
        };
        let assignments = Directory::assignments(&fields);
        assert_eq!(assignments.len(), 1);
        assert_eq!(assignments[0].0, DirectoryColumn::Shopno);
        assert_eq!(Directory::insert_values(&fields).len(), Directory::COLUMNS.len());
    }

    #[test]
    fn null_assigns_null() {
        let fields: DirectoryFields =
            serde_json::from_value(json!({"photo": null, "name": "B"})).unwrap();
        assert_eq!(fields.photo, Some(None));

        let assignments = Directory::assignments(&fields);
        assert_eq!(
            assignments,
            vec![
                (DirectoryColumn::Name, Value::from("B".to_string())),
                (DirectoryColumn::Photo, Value::String(None)),
            ]
        );
        assert_eq!(
            serde_json::to_value(&fields).unwrap(),
            json!({"name": "B", "photo": null})
        );
    }
}
