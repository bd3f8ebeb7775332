use anyhow::{Context, Result};
use log::{info, warn};
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Instant;

use super::{Store, insert_with};
use crate::table::{Collection, DirectoryFields, FinancialFields, RecordFields, SchemaKind};

/// Fills every empty collection from `<dir>/<collection>.json`.
///
/// Each file holds a JSON array of field objects. Collections that already
/// have rows are left alone so restarting with the same directory is harmless.
/// Returns the number of inserted rows.
pub fn seed_from_dir(store: &Store, dir: impl AsRef<Path>) -> Result<usize> {
    let dir = dir.as_ref();
    let mut inserted = 0;

    for collection in Collection::ALL {
        let path = dir.join(format!("{}.json", collection.table()));
        if !path.is_file() {
            continue;
        }
        if store.count(collection)? > 0 {
            warn!("Skip seeding '{}': table is not empty", collection);
            continue;
        }

        let start_time = Instant::now();
        let rows = read_rows(collection, &path)?;
        let mut conn = store.get_connection()?;
        let txn = conn.transaction()?;
        for fields in &rows {
            insert_with(&txn, collection, fields)
                .with_context(|| format!("Failed to seed '{}'", collection))?;
        }
        txn.commit()?;

        info!(duration = &*format!("{:?}", start_time.elapsed());
            "Seeded {} rows into '{}'",
            rows.len(),
            collection
        );
        inserted += rows.len();
    }

    Ok(inserted)
}

fn read_rows(collection: Collection, path: &Path) -> Result<Vec<RecordFields>> {
    let rows = match collection.kind() {
        SchemaKind::Directory => read_array::<DirectoryFields>(path)?
            .into_iter()
            .map(RecordFields::from)
            .collect(),
        SchemaKind::Financial => read_array::<FinancialFields>(path)?
            .into_iter()
            .map(RecordFields::from)
            .collect(),
    };
    Ok(rows)
}

fn read_array<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse {}", path.display()))
}
