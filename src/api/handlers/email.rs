use rocket::State;
use rocket::serde::json::Json;
use rocket::{get, post};
use serde::{Deserialize, Serialize};

use crate::api::{AppError, AppResult};
use crate::mail::Mailer;

#[derive(Debug, Deserialize)]
pub struct SendEmailRequest {
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Sent {
    pub message: &'static str,
    pub info: String,
}

impl Sent {
    pub fn new(info: String) -> Self {
        Self {
            message: "Email sent successfully",
            info,
        }
    }
}

#[post("/send-email", data = "<request>")]
pub async fn send_email(
    request: Json<SendEmailRequest>,
    mailer: &State<Mailer>,
) -> AppResult<Json<Sent>> {
    let request = request.into_inner();
    let info = mailer
        .send(
            request.to.as_deref(),
            request.subject.as_deref().unwrap_or_default(),
            request.body.as_deref().unwrap_or_default(),
        )
        .await
        .map_err(AppError::delivery)?;
    Ok(Json(Sent::new(info)))
}

/// Sends a fixed message to the operator mailbox.
#[get("/test-email")]
pub async fn test_email(mailer: &State<Mailer>) -> AppResult<Json<Sent>> {
    let info = mailer
        .send(
            None,
            "Test Email from Production Server",
            "<p>This is a test email from live production server using Gmail API.</p>",
        )
        .await
        .map_err(AppError::delivery)?;
    Ok(Json(Sent::new(info)))
}
