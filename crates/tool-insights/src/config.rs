use mcp_common::supabase::SupabaseClientConfig;

use crate::error::AppError;

/// Application configuration loaded explicitly from environment variables.
///
/// Redis URL is optional; if absent, the server runs without caching.
#[derive(Debug, Clone)]
pub struct Config {
    /// Redis connection URL (e.g. "redis://127.0.0.1:6379"). `None` disables caching.
    pub redis_url: Option<String>,
    /// Supabase project URL, e.g. "https://abc.supabase.co".
    pub supabase_url: String,
    pub supabase_anon_key: String,
    /// `host:port` to serve MCP over TCP instead of stdio.
    pub tcp_listen_addr: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Required:
    /// - `SUPABASE_URL`: project URL
    /// - `SUPABASE_ANON_KEY`: anon (read-only) API key
    ///
    /// Optional:
    /// - `REDIS_URL`: Redis connection string (omit to disable caching)
    /// - `MCP_TCP_LISTEN_ADDR`: serve on TCP instead of stdio
    ///
    /// Supabase client tuning (`SUPABASE_TIMEOUT_SECS`, ...) is read by
    /// [`Config::supabase_client_config`].
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let required = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| AppError::Config(format!("{name} environment variable is required")))
        };
        let optional = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        Ok(Self {
            supabase_url: required("SUPABASE_URL")?,
            supabase_anon_key: required("SUPABASE_ANON_KEY")?,
            redis_url: optional("REDIS_URL"),
            tcp_listen_addr: optional("MCP_TCP_LISTEN_ADDR"),
        })
    }

    pub fn supabase_client_config(&self) -> SupabaseClientConfig {
        SupabaseClientConfig::from_env(&self.supabase_url, &self.supabase_anon_key)
    }
}
