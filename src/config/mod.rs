use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const SUPABASE_URL_ENV: &str = "BINGEABLE_SUPABASE_URL";
pub const SUPABASE_ANON_KEY_ENV: &str = "BINGEABLE_SUPABASE_ANON_KEY";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Configuration {
    pub supabase: Option<SupabaseConfig>,
    pub http: Option<HttpConfig>,
    pub session: Option<SessionConfig>,
    pub catalog: Option<CatalogConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SupabaseConfig {
    pub url: String,
    #[serde(rename = "anonKey")]
    pub anon_key: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpConfig {
    #[serde(rename = "timeoutSeconds")]
    pub timeout_seconds: Option<u64>,
    #[serde(rename = "userAgent")]
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionConfig {
    pub file: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogConfig {
    #[serde(rename = "mockCount")]
    pub mock_count: Option<usize>,
}

impl Configuration {
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> anyhow::Result<Self> {
        let mut config: Configuration = serde_yaml::from_str(content)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Environment values win over the file so secrets can stay out of it.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = lookup(SUPABASE_URL_ENV);
        let key = lookup(SUPABASE_ANON_KEY_ENV);

        match (&mut self.supabase, url, key) {
            (Some(existing), url, key) => {
                if let Some(url) = url {
                    existing.url = url;
                }
                if let Some(key) = key {
                    existing.anon_key = key;
                }
            }
            (None, Some(url), Some(anon_key)) => {
                self.supabase = Some(SupabaseConfig { url, anon_key });
            }
            _ => {}
        }
    }

    pub fn supabase(&self) -> anyhow::Result<&SupabaseConfig> {
        self.supabase.as_ref().ok_or_else(|| {
            anyhow::anyhow!(
                "no supabase section in configuration (or set {} and {})",
                SUPABASE_URL_ENV,
                SUPABASE_ANON_KEY_ENV
            )
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(
            self.http
                .as_ref()
                .and_then(|h| h.timeout_seconds)
                .unwrap_or(30),
        )
    }

    pub fn user_agent(&self) -> String {
        self.http
            .as_ref()
            .and_then(|h| h.user_agent.clone())
            .unwrap_or_else(|| format!("bingeable/{}", env!("CARGO_PKG_VERSION")))
    }

    pub fn session_file(&self) -> PathBuf {
        self.session
            .as_ref()
            .and_then(|s| s.file.clone())
            .unwrap_or_else(|| PathBuf::from(".bingeable-session.json"))
    }

    pub fn mock_count(&self) -> usize {
        self.catalog
            .as_ref()
            .and_then(|c| c.mock_count)
            .unwrap_or(100)
    }
}
