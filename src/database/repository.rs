use rusqlite::{Connection, OptionalExtension};
use sea_query::{Alias, Asterisk, Expr, Func, Query, SqliteQueryBuilder};
use sea_query_rusqlite::RusqliteBinder;
use std::marker::PhantomData;

use crate::table::Schema;

/// CRUD over one table laid out by schema `S`.
pub struct Repository<S: Schema> {
    table: &'static str,
    _schema: PhantomData<S>,
}

impl<S: Schema> Repository<S> {
    pub fn new(table: &'static str) -> Self {
        Self {
            table,
            _schema: PhantomData,
        }
    }

    pub fn create_table(&self, conn: &Connection) -> rusqlite::Result<()> {
        S::create_table(conn, self.table)
    }

    /// Every row, in whatever order SQLite yields them.
    pub fn list(&self, conn: &Connection) -> rusqlite::Result<Vec<S::Record>> {
        let (sql, values) = Query::select()
            .column(S::ID)
            .columns(S::COLUMNS.iter().copied())
            .from(Alias::new(self.table))
            .build_rusqlite(SqliteQueryBuilder);

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(&*values.as_params(), S::from_row)?;
        rows.collect()
    }

    pub fn get(&self, conn: &Connection, id: i64) -> rusqlite::Result<Option<S::Record>> {
        let (sql, values) = Query::select()
            .column(S::ID)
            .columns(S::COLUMNS.iter().copied())
            .from(Alias::new(self.table))
            .and_where(Expr::col(S::ID).eq(id))
            .build_rusqlite(SqliteQueryBuilder);

        conn.query_row(&sql, &*values.as_params(), S::from_row)
            .optional()
    }

    /// Inserts a row and returns the id SQLite assigned to it.
    pub fn insert(&self, conn: &Connection, fields: &S::Fields) -> rusqlite::Result<i64> {
        let (sql, values) = Query::insert()
            .into_table(Alias::new(self.table))
            .columns(S::COLUMNS.iter().copied())
            .values_panic(S::insert_values(fields).into_iter().map(Into::into))
            .build_rusqlite(SqliteQueryBuilder);

        conn.execute(&sql, &*values.as_params())?;
        Ok(conn.last_insert_rowid())
    }

    /// Overwrites the submitted columns only. Returns the affected row count,
    /// which is 0 when `id` does not exist.
    pub fn update(&self, conn: &Connection, id: i64, fields: &S::Fields) -> rusqlite::Result<usize> {
        let assignments = S::assignments(fields);
        if assignments.is_empty() {
            return Ok(0);
        }

        let (sql, values) = Query::update()
            .table(Alias::new(self.table))
            .values(
                assignments
                    .into_iter()
                    .map(|(column, value)| (column, value.into())),
            )
            .and_where(Expr::col(S::ID).eq(id))
            .build_rusqlite(SqliteQueryBuilder);

        conn.execute(&sql, &*values.as_params())
    }

    pub fn delete(&self, conn: &Connection, id: i64) -> rusqlite::Result<usize> {
        let (sql, values) = Query::delete()
            .from_table(Alias::new(self.table))
            .and_where(Expr::col(S::ID).eq(id))
            .build_rusqlite(SqliteQueryBuilder);

        conn.execute(&sql, &*values.as_params())
    }

    pub fn count(&self, conn: &Connection) -> rusqlite::Result<i64> {
        let (sql, values) = Query::select()
            .expr(Func::count(Expr::col(Asterisk)))
            .from(Alias::new(self.table))
            .build_rusqlite(SqliteQueryBuilder);

        conn.query_row(&sql, &*values.as_params(), |row| row.get(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{Directory, DirectoryFields, Financial, FinancialFields};

    fn directory(conn: &Connection) -> Repository<Directory> {
        let repository = Repository::<Directory>::new("members");
        repository.create_table(conn).unwrap();
        repository
    }

    #[test]
    fn insert_then_get() {
        let conn = Connection::open_in_memory().unwrap();
        let repository = directory(&conn);

        let fields = DirectoryFields {
            name: Some(Some("A Shop".to_string())),
            shopno: Some(Some("12".to_string())),
            ..Default::default()
        };
        let id = repository.insert(&conn, &fields).unwrap();

        let record = repository.get(&conn, id).unwrap().unwrap();
        assert_eq!(record.id, id);
        assert_eq!(record.name.as_deref(), Some("A Shop"));
        assert_eq!(record.shopno.as_deref(), Some("12"));
        assert_eq!(record.photo, None);
    }

    #[test]
    fn partial_update_keeps_other_columns() {
        let conn = Connection::open_in_memory().unwrap();
        let repository = directory(&conn);
        let id = repository
            .insert(
                &conn,
                &DirectoryFields {
                    name: Some(Some("Before".to_string())),
                    remarks: Some(Some("keep me".to_string())),
                    ..Default::default()
                },
            )
            .unwrap();

        let patch = DirectoryFields {
            name: Some(Some("After".to_string())),
            ..Default::default()
        };
        assert_eq!(repository.update(&conn, id, &patch).unwrap(), 1);

        let record = repository.get(&conn, id).unwrap().unwrap();
        assert_eq!(record.name.as_deref(), Some("After"));
        assert_eq!(record.remarks.as_deref(), Some("keep me"));
    }

    #[test]
    fn null_clears_a_column() {
        let conn = Connection::open_in_memory().unwrap();
        let repository = directory(&conn);
        let id = repository
            .insert(
                &conn,
                &DirectoryFields {
                    name: Some(Some("A".to_string())),
                    photo: Some(Some("old.png".to_string())),
                    remarks: Some(Some("r".to_string())),
                    ..Default::default()
                },
            )
            .unwrap();

        let patch = DirectoryFields {
            photo: Some(None),
            remarks: Some(None),
            ..Default::default()
        };
        assert_eq!(repository.update(&conn, id, &patch).unwrap(), 1);

        let record = repository.get(&conn, id).unwrap().unwrap();
        assert_eq!(record.name.as_deref(), Some("A"));
        assert_eq!(record.photo, None);
        assert_eq!(record.remarks, None);
    }

    #[test]
    fn missing_ids_affect_nothing() {
        let conn = Connection::open_in_memory().unwrap();
        let repository = directory(&conn);
        let patch = DirectoryFields {
            name: Some(Some("ghost".to_string())),
            ..Default::default()
        };

        assert_eq!(repository.update(&conn, 9999, &patch).unwrap(), 0);
        assert_eq!(repository.delete(&conn, 9999).unwrap(), 0);
        assert!(repository.get(&conn, 9999).unwrap().is_none());
        assert!(repository.list(&conn).unwrap().is_empty());
    }

    #[test]
    fn delete_removes_row() {
        let conn = Connection::open_in_memory().unwrap();
        let repository = directory(&conn);
        let id = repository.insert(&conn, &DirectoryFields::default()).unwrap();

        assert_eq!(repository.count(&conn).unwrap(), 1);
        assert_eq!(repository.delete(&conn, id).unwrap(), 1);
        assert!(repository.get(&conn, id).unwrap().is_none());
        assert_eq!(repository.count(&conn).unwrap(), 0);
    }

    #[test]
    fn receipt_numbers_may_repeat() {
        let conn = Connection::open_in_memory().unwrap();
        let repository = Repository::<Financial>::new("financial_history");
        repository.create_table(&conn).unwrap();

        let fields = FinancialFields {
            name: Some(Some("A Shop".to_string())),
            receipt_no: Some(Some("1001".to_string())),
            date: Some(Some("2024-01-01".to_string())),
            amount: Some(Some(500.0)),
            forthe_month: Some(Some("Jan".to_string())),
            ..Default::default()
        };
        let first = repository.insert(&conn, &fields).unwrap();
        let second = repository.insert(&conn, &fields).unwrap();

        assert_ne!(first, second);
        let records = repository.list(&conn).unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.amount == Some(500.0)));
    }

    #[test]
    fn ids_are_not_reused_after_delete() {
        let conn = Connection::open_in_memory().unwrap();
        let repository = directory(&conn);
        let first = repository.insert(&conn, &DirectoryFields::default()).unwrap();
        repository.delete(&conn, first).unwrap();
        let second = repository.insert(&conn, &DirectoryFields::default()).unwrap();
        assert!(second > first);
    }
}
