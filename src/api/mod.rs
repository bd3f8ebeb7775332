pub mod guards;
pub mod handlers;

use log::error;
use rocket::Catcher;
use rocket::http::{ContentType, Status};
use rocket::request::Request;
use rocket::response::{self, Responder, Response};
use rocket::serde::json::{Json, Value};
use serde_json::json;
use std::io::Cursor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    BadRequest,
    Store,
    Upload,
    Delivery,
}

impl ErrorKind {
    pub fn status(self) -> Status {
        match self {
            ErrorKind::NotFound => Status::NotFound,
            ErrorKind::BadRequest => Status::BadRequest,
            ErrorKind::Store | ErrorKind::Upload | ErrorKind::Delivery => {
                Status::InternalServerError
            }
        }
    }
}

#[derive(Debug)]
pub struct AppError {
    pub kind: ErrorKind,
    pub error: anyhow::Error,
}

impl AppError {
    pub fn new(kind: ErrorKind, error: impl Into<anyhow::Error>) -> Self {
        AppError {
            kind,
            error: error.into(),
        }
    }

    pub fn not_found() -> Self {
        AppError::new(ErrorKind::NotFound, anyhow::anyhow!("Not found"))
    }

    pub fn bad_request(message: impl std::fmt::Display) -> Self {
        AppError::new(ErrorKind::BadRequest, anyhow::anyhow!("{}", message))
    }

    pub fn upload(error: impl Into<anyhow::Error>) -> Self {
        AppError::new(ErrorKind::Upload, error)
    }

    pub fn delivery(error: impl Into<anyhow::Error>) -> Self {
        AppError::new(ErrorKind::Delivery, error)
    }

    pub fn status(&self) -> Status {
        self.kind.status()
    }
}

#[rocket::async_trait]
impl<'r, 'o: 'r> Responder<'r, 'o> for AppError {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'o> {
        let status = self.status();
        if status.code >= 500 {
            error!("{} {}: {:#}", req.method(), req.uri(), self.error);
        }

        let chain: Vec<String> = self.error.chain().map(|e| e.to_string()).collect();

        let body = match self.kind {
            ErrorKind::NotFound => json!({ "error": "Not found" }),
            ErrorKind::Delivery => json!({
                "error": "Failed to send email",
                "details": format!("{:#}", self.error),
            }),
            _ => json!({
                "error": self.error.to_string(),
                "chain": chain,
            }),
        }
        .to_string();

        Response::build()
            .status(status)
            .header(ContentType::JSON)
            .sized_body(body.len(), Cursor::new(body))
            .ok()
    }
}

impl<E> From<E> for AppError
where
    anyhow::Error: From<E>,
{
    fn from(err: E) -> Self {
        AppError {
            kind: ErrorKind::Store,
            error: anyhow::Error::from(err),
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;

/// Anything Rocket rejects before a handler runs still answers with `{error}`.
#[catch(default)]
fn default_catcher(status: Status, _req: &Request<'_>) -> Json<Value> {
    let message = match status.code {
        404 => "Not found",
        _ => status.reason_lossy(),
    };
    Json(json!({ "error": message }))
}

pub fn generate_catchers() -> Vec<Catcher> {
    catchers![default_catcher]
}
