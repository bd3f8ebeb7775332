use anyhow::Context;
use chrono::Local;
use log::info;
use rocket::State;
use rocket::serde::json::{Json, Value};
use rocket::{get, post};
use serde::Serialize;
use std::time::Instant;
use tokio::task::spawn_blocking;

use super::email::Sent;
use crate::api::{AppError, AppResult};
use crate::config::AppConfig;
use crate::database::Store;
use crate::mail::Mailer;
use crate::receipt::{next_receipt_number, receipt_subject, render_receipt};
use crate::table::{Collection, Record};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptNumber {
    pub receipt_no: String,
}

#[derive(Debug, Serialize)]
pub struct JsonSnapshot {
    pub message: &'static str,
    pub data: Value,
}

#[get("/receipts/next-number")]
pub async fn next_number() -> Json<ReceiptNumber> {
    Json(ReceiptNumber {
        receipt_no: next_receipt_number(),
    })
}

/// Renders the receipt of a stored payment and mails it.
#[post("/receipts/<id>/email?<to>")]
pub async fn email_receipt(
    id: Result<i64, &str>,
    to: Option<String>,
    store: &State<Store>,
    mailer: &State<Mailer>,
) -> AppResult<Json<Sent>> {
    let id = id.map_err(|_| AppError::not_found())?;
    let store = store.inner().clone();
    let record = spawn_blocking(move || store.get(Collection::FinancialHistory, id)).await??;

    let record = match record {
        Some(Record::Financial(record)) => record,
        _ => return Err(AppError::not_found()),
    };

    let generated_on = Local::now().format("%d/%m/%Y, %H:%M:%S").to_string();
    let info = mailer
        .send(
            to.as_deref(),
            &receipt_subject(&record),
            &render_receipt(&record, &generated_on),
        )
        .await
        .map_err(AppError::delivery)?;
    Ok(Json(Sent::new(info)))
}

/// Returns the parsed content of the legacy data file.
#[post("/sync-from-json")]
pub async fn sync_from_json(config: &State<AppConfig>) -> AppResult<Json<JsonSnapshot>> {
    let start_time = Instant::now();
    let path = config.data_file.clone();
    let raw = tokio::fs::read_to_string(&path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let data: Value = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    info!(duration = &*format!("{:?}", start_time.elapsed());
        "Read {}",
        path.display()
    );
    Ok(Json(JsonSnapshot {
        message: "JSON read successfully",
        data,
    }))
}
