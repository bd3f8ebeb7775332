pub mod gmail;

use anyhow::{Result, bail};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use log::{info, warn};
use std::sync::Arc;
use std::time::Instant;

use crate::config::AppConfig;
pub use gmail::GmailTransport;

/// One outgoing HTML message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub html: String,
}

impl Email {
    /// Renders the message as RFC 5322 text with a base64 HTML body.
    pub fn to_mime(&self, from: &str) -> String {
        let mut message = String::new();
        message.push_str(&format!("From: {}\r\n", header_value(from)));
        message.push_str(&format!("To: {}\r\n", header_value(&self.to)));
        message.push_str(&format!("Subject: {}\r\n", encode_subject(&self.subject)));
        message.push_str("MIME-Version: 1.0\r\n");
        message.push_str("Content-Type: text/html; charset=\"UTF-8\"\r\n");
        message.push_str("Content-Transfer-Encoding: base64\r\n");
        message.push_str("\r\n");

        let body = STANDARD.encode(self.html.as_bytes());
        // 76 columns per line; base64 output is pure ASCII
        for chunk in body.as_bytes().chunks(76) {
            message.push_str(&String::from_utf8_lossy(chunk));
            message.push_str("\r\n");
        }
        message
    }
}

/// Header values must stay on one line.
fn header_value(value: &str) -> String {
    value.replace(['\r', '\n'], "").trim().to_string()
}

fn encode_subject(subject: &str) -> String {
    let subject = header_value(subject);
    if subject.is_ascii() {
        subject
    } else {
        format!("=?UTF-8?B?{}?=", STANDARD.encode(subject.as_bytes()))
    }
}

/// Delivers a composed message and returns the provider's delivery info.
#[rocket::async_trait]
pub trait Transport: Send + Sync {
    async fn deliver(&self, email: &Email) -> Result<String>;
}

/// Stand-in used when OAuth2 settings are incomplete; every send fails.
pub struct UnconfiguredTransport {
    missing: Vec<&'static str>,
}

impl UnconfiguredTransport {
    pub fn new(missing: Vec<&'static str>) -> Self {
        Self { missing }
    }
}

#[rocket::async_trait]
impl Transport for UnconfiguredTransport {
    async fn deliver(&self, _email: &Email) -> Result<String> {
        bail!(
            "Email transport is not configured; missing {}",
            self.missing.join(", ")
        )
    }
}

/// Managed-state handle on the configured transport.
#[derive(Clone)]
pub struct Mailer {
    transport: Arc<dyn Transport>,
    operator: Option<String>,
}

impl Mailer {
    pub fn new(transport: Arc<dyn Transport>, operator: Option<String>) -> Self {
        Self {
            transport,
            operator,
        }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let missing = config.missing_mail_settings();
        let transport: Arc<dyn Transport> = if missing.is_empty() {
            Arc::new(GmailTransport::from_config(config)?)
        } else {
            warn!("Email disabled, missing {}", missing.join(", "));
            Arc::new(UnconfiguredTransport::new(missing))
        };
        Ok(Self::new(transport, config.email_address.clone()))
    }

    /// The operator address, used whenever a caller names no recipient.
    pub fn operator(&self) -> Option<&str> {
        self.operator.as_deref()
    }

    pub async fn send(&self, to: Option<&str>, subject: &str, html: &str) -> Result<String> {
        if subject.trim().is_empty() || html.trim().is_empty() {
            bail!("Subject and body are required");
        }
        let to = match to.map(str::trim).filter(|to| !to.is_empty()) {
            Some(to) => to.to_string(),
            None => match self.operator() {
                Some(operator) => operator.to_string(),
                None => bail!("No recipient given and EMAIL_ADDRESS is not set"),
            },
        };

        let start_time = Instant::now();
        let email = Email {
            to,
            subject: subject.to_string(),
            html: html.to_string(),
        };
        let delivery = self.transport.deliver(&email).await?;
        info!(duration = &*format!("{:?}", start_time.elapsed());
            "Sent '{}' to {}",
            email.subject,
            email.to
        );
        Ok(delivery)
    }
}
