use anyhow::anyhow;
use log::info;
use rocket::State;
use rocket::fs::TempFile;
use rocket::serde::json::Json;
use rocket::{delete, get, post, put};
use serde::Serialize;
use std::time::Instant;
use tokio::task::spawn_blocking;

use crate::api::guards::RecordPayload;
use crate::api::{AppError, AppResult};
use crate::database::Store;
use crate::table::{Collection, Record, RecordFields};
use crate::upload::UploadDir;

#[derive(Debug, Serialize)]
pub struct Created {
    pub id: i64,
    #[serde(flatten)]
    pub fields: RecordFields,
}

#[derive(Debug, Serialize)]
pub struct Changed {
    pub message: &'static str,
    pub changes: usize,
}

fn collection_or_404(collection: Result<Collection, String>) -> AppResult<Collection> {
    collection.map_err(|_| AppError::not_found())
}

/// Ids that are not integers cannot name a row.
fn id_or_404(id: Result<i64, &str>) -> AppResult<i64> {
    id.map_err(|_| AppError::not_found())
}

/// Stores the attachment, if any, and points `photo` at it.
async fn attach(
    fields: &mut RecordFields,
    attachment: Option<TempFile<'_>>,
    uploads: &UploadDir,
) -> AppResult<Option<String>> {
    let Some(mut file) = attachment else {
        return Ok(None);
    };
    let filename = uploads.persist(&mut file).await.map_err(AppError::upload)?;
    if fields.set_photo(filename.clone()) {
        Ok(Some(filename))
    } else {
        uploads.discard(&filename);
        Ok(None)
    }
}

#[get("/<collection>")]
pub async fn list_records(
    collection: Result<Collection, String>,
    store: &State<Store>,
) -> AppResult<Json<Vec<Record>>> {
    let collection = collection_or_404(collection)?;
    let store = store.inner().clone();
    spawn_blocking(move || -> AppResult<Json<Vec<Record>>> {
        Ok(Json(store.list(collection)?))
    })
    .await?
}

#[get("/<collection>/<id>")]
pub async fn get_record(
    collection: Result<Collection, String>,
    id: Result<i64, &str>,
    store: &State<Store>,
) -> AppResult<Json<Record>> {
    let collection = collection_or_404(collection)?;
    let id = id_or_404(id)?;
    let store = store.inner().clone();
    spawn_blocking(move || -> AppResult<Json<Record>> {
        match store.get(collection, id)? {
            Some(record) => Ok(Json(record)),
            None => Err(AppError::not_found()),
        }
    })
    .await?
}

#[post("/<collection>", data = "<payload>")]
pub async fn create_record(
    collection: Result<Collection, String>,
    payload: Result<RecordPayload<'_>, AppError>,
    store: &State<Store>,
    uploads: &State<UploadDir>,
) -> AppResult<Json<Created>> {
    let collection = collection_or_404(collection)?;
    let RecordPayload {
        mut fields,
        attachment,
    } = payload?;

    let stored = attach(&mut fields, attachment, uploads).await?;

    let start_time = Instant::now();
    let store = store.inner().clone();
    let insert = fields.clone();
    let result = spawn_blocking(move || store.insert(collection, &insert))
        .await
        .map_err(|e| anyhow!(e))
        .and_then(|result| result);

    let id = match result {
        Ok(id) => id,
        Err(err) => {
            if let Some(filename) = stored {
                uploads.discard(&filename);
            }
            return Err(err.into());
        }
    };

    info!(duration = &*format!("{:?}", start_time.elapsed());
        "Created {} #{}",
        collection,
        id
    );
    Ok(Json(Created { id, fields }))
}

#[put("/<collection>/<id>", data = "<payload>")]
pub async fn update_record(
    collection: Result<Collection, String>,
    id: Result<i64, &str>,
    payload: Result<RecordPayload<'_>, AppError>,
    store: &State<Store>,
    uploads: &State<UploadDir>,
) -> AppResult<Json<Changed>> {
    let collection = collection_or_404(collection)?;
    let id = id_or_404(id)?;
    let RecordPayload {
        mut fields,
        attachment,
    } = payload?;

    if attachment.is_none() && fields.is_empty() {
        return Err(AppError::bad_request("No fields to update"));
    }

    let stored = attach(&mut fields, attachment, uploads).await?;

    let start_time = Instant::now();
    let store = store.inner().clone();
    let result = spawn_blocking(move || store.update(collection, id, &fields))
        .await
        .map_err(|e| anyhow!(e))
        .and_then(|result| result);

    let changes = match result {
        Ok(changes) => changes,
        Err(err) => {
            if let Some(filename) = stored {
                uploads.discard(&filename);
            }
            return Err(err.into());
        }
    };
    // Nothing references the file when no row matched.
    if changes == 0 {
        if let Some(filename) = stored {
            uploads.discard(&filename);
        }
    }

    info!(duration = &*format!("{:?}", start_time.elapsed());
        "Updated {} #{} ({} changes)",
        collection,
        id,
        changes
    );
    Ok(Json(Changed {
        message: "Updated successfully",
        changes,
    }))
}

#[delete("/<collection>/<id>")]
pub async fn delete_record(
    collection: Result<Collection, String>,
    id: Result<i64, &str>,
    store: &State<Store>,
) -> AppResult<Json<Changed>> {
    let collection = collection_or_404(collection)?;
    let id = id_or_404(id)?;

    let start_time = Instant::now();
    let store = store.inner().clone();
    let changes = spawn_blocking(move || store.delete(collection, id)).await??;

    info!(duration = &*format!("{:?}", start_time.elapsed());
        "Deleted {} #{} ({} changes)",
        collection,
        id,
        changes
    );
    Ok(Json(Changed {
        message: "Deleted successfully",
        changes,
    }))
}
