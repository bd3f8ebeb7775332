use anyhow::{Context, Result};
use dotenv::dotenv;
use serde::Deserialize;
use std::path::PathBuf;

/// Process configuration, read from the environment (and `.env`) at startup.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    /// 監聽埠
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_address")]
    pub address: String,
    /// SQLite 檔案位置
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
    /// 上傳檔案目錄，對外掛在 /uploads
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,
    /// 管理介面的靜態檔案，不存在時不掛載
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
    #[serde(default = "default_data_file")]
    pub data_file: PathBuf,
    #[serde(default)]
    pub seed_dir: Option<PathBuf>,
    /// 上傳檔案大小限制 (MB)
    #[serde(default = "default_upload_limit_mb")]
    pub upload_limit_mb: u64,

    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Sender mailbox, and the recipient when a request names none.
    #[serde(default)]
    pub email_address: Option<String>,
    #[serde(default = "default_sender_name")]
    pub sender_name: String,
}

fn default_port() -> u16 {
    3000
}

fn default_address() -> String {
    "0.0.0.0".to_string()
}

fn default_database_path() -> PathBuf {
    PathBuf::from("nmta.db")
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("uploads")
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("public")
}

fn default_data_file() -> PathBuf {
    PathBuf::from("data.json")
}

fn default_upload_limit_mb() -> u64 {
    16
}

fn default_sender_name() -> String {
    "NMTA".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            address: default_address(),
            database_path: default_database_path(),
            upload_dir: default_upload_dir(),
            static_dir: default_static_dir(),
            data_file: default_data_file(),
            seed_dir: None,
            upload_limit_mb: default_upload_limit_mb(),
            client_id: None,
            client_secret: None,
            refresh_token: None,
            email_address: None,
            sender_name: default_sender_name(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        dotenv().ok();
        envy::from_env::<AppConfig>().context("Failed to read configuration from environment")
    }

    /// Names of the OAuth2 variables the mail transport needs but did not get.
    pub fn missing_mail_settings(&self) -> Vec<&'static str> {
        [
            ("CLIENT_ID", &self.client_id),
            ("CLIENT_SECRET", &self.client_secret),
            ("REFRESH_TOKEN", &self.refresh_token),
            ("EMAIL_ADDRESS", &self.email_address),
        ]
        .into_iter()
        .filter(|(_, value)| value.as_deref().is_none_or(|v| v.trim().is_empty()))
        .map(|(name, _)| name)
        .collect()
    }

    pub fn upload_limit_bytes(&self) -> u64 {
        self.upload_limit_mb.saturating_mul(1024 * 1024)
    }
}
