//! 環境変数から読み込むプロバイダー設定

use crate::error::{ConfigError, Result};

pub const ACCESS_TOKEN_ENV: &str = "MONGODB_ATLAS_ACCESS_TOKEN";
pub const BASE_URL_ENV: &str = "MONGODB_ATLAS_BASE_URL";
pub const FAST_POLL_ENV: &str = "ATLASFLOW_FAST_POLL";

pub const DEFAULT_BASE_URL: &str = "https://cloud.mongodb.com/";

#[derive(Clone, PartialEq, Eq)]
pub struct ProviderSettings {
    pub access_token: String,
    pub base_url: String,
    /// ポーリングの初期待機を省き、1秒間隔でポーリングする
    pub fast_poll: bool,
}

impl std::fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderSettings")
            .field("access_token", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("fast_poll", &self.fast_poll)
            .finish()
    }
}

impl ProviderSettings {
    pub fn from_env() -> Result<Self> {
        let access_token = std::env::var(ACCESS_TOKEN_ENV)
            .ok()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnv(ACCESS_TOKEN_ENV.to_string()))?;

        let base_url = std::env::var(BASE_URL_ENV)
            .ok()
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let fast_poll = std::env::var(FAST_POLL_ENV)
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Ok(Self {
            access_token,
            base_url,
            fast_poll,
        })
    }
}
