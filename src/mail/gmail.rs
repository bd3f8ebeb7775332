use anyhow::{Context, Result, anyhow, bail};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE;
use oauth2::basic::{
    BasicClient, BasicErrorResponse, BasicRevocationErrorResponse,
    BasicTokenIntrospectionResponse, BasicTokenResponse,
};
use oauth2::{
    ClientId, ClientSecret, EndpointNotSet, EndpointSet, RefreshToken, StandardRevocableToken,
    TokenResponse, TokenUrl,
};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use super::{Email, Transport};
use crate::common::{GMAIL_SEND_URL, GOOGLE_TOKEN_URL};
use crate::config::AppConfig;

/// OAuth client with only the token endpoint set.
type TokenClient = oauth2::Client<
    BasicErrorResponse,
    BasicTokenResponse,
    BasicTokenIntrospectionResponse,
    StandardRevocableToken,
    BasicRevocationErrorResponse,
    EndpointNotSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointSet,
>;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SentMessage {
    id: String,
    #[serde(default)]
    thread_id: Option<String>,
}

/// Sends through the Gmail API as the operator mailbox.
///
/// Every delivery trades the long-lived refresh token for a fresh access token.
pub struct GmailTransport {
    oauth: TokenClient,
    refresh_token: RefreshToken,
    http: Client,
    from: String,
}

impl GmailTransport {
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let required = |value: &Option<String>, name: &str| {
            value
                .clone()
                .ok_or_else(|| anyhow!("{} is not set", name))
        };

        let oauth = BasicClient::new(ClientId::new(required(&config.client_id, "CLIENT_ID")?))
            .set_client_secret(ClientSecret::new(required(
                &config.client_secret,
                "CLIENT_SECRET",
            )?))
            .set_token_uri(TokenUrl::new(GOOGLE_TOKEN_URL.to_string())?);

        let http = reqwest::ClientBuilder::new()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .context("Failed to build HTTP client")?;

        let address = required(&config.email_address, "EMAIL_ADDRESS")?;
        Ok(Self {
            oauth,
            refresh_token: RefreshToken::new(required(&config.refresh_token, "REFRESH_TOKEN")?),
            http,
            from: format!("{} <{}>", config.sender_name, address),
        })
    }

    async fn access_token(&self) -> Result<String> {
        let token = self
            .oauth
            .exchange_refresh_token(&self.refresh_token)
            .request_async(&self.http)
            .await
            .map_err(|e| anyhow!("Token exchange failed: {}", e))?;
        Ok(token.access_token().secret().clone())
    }
}

#[rocket::async_trait]
impl Transport for GmailTransport {
    async fn deliver(&self, email: &Email) -> Result<String> {
        let access_token = self.access_token().await?;
        let raw = URL_SAFE.encode(email.to_mime(&self.from).as_bytes());

        let response = self
            .http
            .post(GMAIL_SEND_URL)
            .bearer_auth(access_token)
            .json(&json!({ "raw": raw }))
            .send()
            .await
            .context("Failed to reach the Gmail API")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("Gmail API returned {}: {}", status, body);
        }

        let sent: SentMessage = response
            .json()
            .await
            .context("Unexpected Gmail API response")?;
        Ok(match sent.thread_id {
            Some(thread_id) => format!("{} (thread {})", sent.id, thread_id),
            None => sent.id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_header_uses_sender_name() {
        let config = AppConfig {
            client_id: Some("id".to_string()),
            client_secret: Some("secret".to_string()),
            refresh_token: Some("refresh".to_string()),
            email_address: Some("office@example.com".to_string()),
            ..Default::default()
        };
        let transport = GmailTransport::from_config(&config).unwrap();
        assert_eq!(transport.from, "NMTA <office@example.com>");
    }

    #[test]
    fn missing_credentials_are_an_error() {
        let config = AppConfig::default();
        let err = GmailTransport::from_config(&config).err().unwrap();
        assert_eq!(err.to_string(), "CLIENT_ID is not set");
    }
}
