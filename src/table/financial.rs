use rusqlite::{Connection, Row};
use sea_query::{Alias, ColumnDef, Iden, SqliteQueryBuilder, Table, Value};
use serde::{Deserialize, Serialize};

use super::{Schema, lenient, real_column, text_column};

#[derive(Iden, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinancialColumn {
    Id,
    Name,
    #[iden = "receiptNo"]
    ReceiptNo,
    Date,
    Amount,
    #[iden = "fortheMonth"]
    FortheMonth,
    Remarks,
}

/// One payment entry in `financial_history`.
///
/// `name` is free text; it is matched against directory names by the admin UI
/// only. `receipt_no` is caller supplied and may repeat.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialRecord {
    pub id: i64,
    pub name: Option<String>,
    pub receipt_no: Option<String>,
    /// ISO date, `YYYY-MM-DD`.
    pub date: Option<String>,
    pub amount: Option<f64>,
    pub forthe_month: Option<String>,
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialFields {
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub name: Option<Option<String>>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub receipt_no: Option<Option<String>>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub date: Option<Option<String>>,
    #[serde(default, deserialize_with = "lenient::number", skip_serializing_if = "Option::is_none")]
    pub amount: Option<Option<f64>>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub forthe_month: Option<Option<String>>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub remarks: Option<Option<String>>,
}

impl FinancialFields {
    /// Submitted columns only; `Some(None)` binds NULL.
    fn columns(&self) -> [(FinancialColumn, Option<Value>); 6] {
        [
            (FinancialColumn::Name, self.name.clone().map(Value::from)),
            (FinancialColumn::ReceiptNo, self.receipt_no.clone().map(Value::from)),
            (FinancialColumn::Date, self.date.clone().map(Value::from)),
            (FinancialColumn::Amount, self.amount.map(Value::from)),
            (FinancialColumn::FortheMonth, self.forthe_month.clone().map(Value::from)),
            (FinancialColumn::Remarks, self.remarks.clone().map(Value::from)),
        ]
    }
}

pub struct Financial;

impl Schema for Financial {
    type Column = FinancialColumn;
    type Record = FinancialRecord;
    type Fields = FinancialFields;

    const ID: FinancialColumn = FinancialColumn::Id;
    const COLUMNS: &'static [FinancialColumn] = &[
        FinancialColumn::Name,
        FinancialColumn::ReceiptNo,
        FinancialColumn::Date,
        FinancialColumn::Amount,
        FinancialColumn::FortheMonth,
        FinancialColumn::Remarks,
    ];

    fn create_table(conn: &Connection, table: &str) -> rusqlite::Result<()> {
        let sql = Table::create()
            .table(Alias::new(table))
            .if_not_exists()
            .col(
                ColumnDef::new(FinancialColumn::Id)
                    .integer()
                    .not_null()
                    .auto_increment()
                    .primary_key(),
            )
            .col(ColumnDef::new(FinancialColumn::Name).text())
            .col(ColumnDef::new(FinancialColumn::ReceiptNo).text())
            .col(ColumnDef::new(FinancialColumn::Date).text())
            .col(ColumnDef::new(FinancialColumn::Amount).double())
            .col(ColumnDef::new(FinancialColumn::FortheMonth).text())
            .col(ColumnDef::new(FinancialColumn::Remarks).text())
            .build(SqliteQueryBuilder);

        conn.execute(&sql, [])?;
        Ok(())
    }

    fn from_row(row: &Row) -> rusqlite::Result<FinancialRecord> {
        Ok(FinancialRecord {
            id: row.get(FinancialColumn::Id.to_string().as_str())?,
            name: text_column(row, FinancialColumn::Name)?,
            receipt_no: text_column(row, FinancialColumn::ReceiptNo)?,
            date: text_column(row, FinancialColumn::Date)?,
            amount: real_column(row, FinancialColumn::Amount)?,
            forthe_month: text_column(row, FinancialColumn::FortheMonth)?,
            remarks: text_column(row, FinancialColumn::Remarks)?,
        })
    }

    fn insert_values(fields: &FinancialFields) -> Vec<Value> {
        vec![
            Value::from(fields.name.clone().flatten()),
            Value::from(fields.receipt_no.clone().flatten()),
            Value::from(fields.date.clone().flatten()),
            Value::from(fields.amount.flatten()),
            Value::from(fields.forthe_month.clone().flatten()),
            Value::from(fields.remarks.clone().flatten()),
        ]
    }

    fn assignments(fields: &FinancialFields) -> Vec<(FinancialColumn, Value)> {
        fields
            .columns()
            .into_iter()
            .filter_map(|(column, value)| value.map(|v| (column, v)))
            .collect()
    }
}
