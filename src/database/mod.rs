pub mod repository;
pub mod seed;

use anyhow::{Context, Result, bail};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use std::path::Path;

use crate::table::{Collection, Directory, Financial, Record, RecordFields, SchemaKind};
use repository::Repository;

/// Pooled handle on the SQLite record store. Cloning shares the pool.
#[derive(Clone)]
pub struct Store {
    pool: Pool<SqliteConnectionManager>,
}

impl Store {
    /// Opens (or creates) the database file and makes sure every collection table exists.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let manager = SqliteConnectionManager::file(path.as_ref()).with_init(|c| {
            c.execute_batch(
                "PRAGMA temp_store = MEMORY;
             PRAGMA busy_timeout = 5000;",
            )
        });

        let pool = Pool::builder()
            .build(manager)
            .with_context(|| format!("Failed to open database {}", path.as_ref().display()))?;

        let store = Self { pool };
        store.create_tables()?;
        Ok(store)
    }

    pub fn get_connection(&self) -> Result<PooledConnection<SqliteConnectionManager>> {
        let conn = self.pool.get().context("Failed to get DB connection")?;
        Ok(conn)
    }

    fn create_tables(&self) -> Result<()> {
        let conn = self.get_connection()?;
        for collection in Collection::ALL {
            match collection.kind() {
                SchemaKind::Directory => directory(collection).create_table(&conn)?,
                SchemaKind::Financial => financial(collection).create_table(&conn)?,
            }
        }
        Ok(())
    }

    pub fn list(&self, collection: Collection) -> Result<Vec<Record>> {
        let conn = self.get_connection()?;
        let records = match collection.kind() {
            SchemaKind::Directory => directory(collection)
                .list(&conn)?
                .into_iter()
                .map(Record::from)
                .collect(),
            SchemaKind::Financial => financial(collection)
                .list(&conn)?
                .into_iter()
                .map(Record::from)
                .collect(),
        };
        Ok(records)
    }

    pub fn get(&self, collection: Collection, id: i64) -> Result<Option<Record>> {
        let conn = self.get_connection()?;
        let record = match collection.kind() {
            SchemaKind::Directory => directory(collection).get(&conn, id)?.map(Record::from),
            SchemaKind::Financial => financial(collection).get(&conn, id)?.map(Record::from),
        };
        Ok(record)
    }

    pub fn insert(&self, collection: Collection, fields: &RecordFields) -> Result<i64> {
        let conn = self.get_connection()?;
        insert_with(&conn, collection, fields)
    }

    pub fn update(&self, collection: Collection, id: i64, fields: &RecordFields) -> Result<usize> {
        let conn = self.get_connection()?;
        let changes = match (collection.kind(), fields) {
            (SchemaKind::Directory, RecordFields::Directory(fields)) => {
                directory(collection).update(&conn, id, fields)?
            }
            (SchemaKind::Financial, RecordFields::Financial(fields)) => {
                financial(collection).update(&conn, id, fields)?
            }
            _ => bail!("Payload does not match the schema of '{}'", collection),
        };
        Ok(changes)
    }

    pub fn delete(&self, collection: Collection, id: i64) -> Result<usize> {
        let conn = self.get_connection()?;
        let changes = match collection.kind() {
            SchemaKind::Directory => directory(collection).delete(&conn, id)?,
            SchemaKind::Financial => financial(collection).delete(&conn, id)?,
        };
        Ok(changes)
    }

    pub fn count(&self, collection: Collection) -> Result<i64> {
        let conn = self.get_connection()?;
        let count = match collection.kind() {
            SchemaKind::Directory => directory(collection).count(&conn)?,
            SchemaKind::Financial => financial(collection).count(&conn)?,
        };
        Ok(count)
    }
}

fn directory(collection: Collection) -> Repository<Directory> {
    Repository::new(collection.table())
}

fn financial(collection: Collection) -> Repository<Financial> {
    Repository::new(collection.table())
}

pub(crate) fn insert_with(
    conn: &Connection,
    collection: Collection,
    fields: &RecordFields,
) -> Result<i64> {
    let id = match (collection.kind(), fields) {
        (SchemaKind::Directory, RecordFields::Directory(fields)) => {
            directory(collection).insert(conn, fields)?
        }
        (SchemaKind::Financial, RecordFields::Financial(fields)) => {
            financial(collection).insert(conn, fields)?
        }
        _ => bail!("Payload does not match the schema of '{}'", collection),
    };
    Ok(id)
}
