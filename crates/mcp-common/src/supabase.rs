/// Minimal PostgREST client for a hosted Supabase project.
///
/// Only row selection is supported: callers pass PostgREST filter pairs
/// (`("status", "eq.approved")`, `("id", "neq.42")`, ...) and get back
/// deserialized rows. Transient failures (timeouts, connect errors, 429, 5xx)
/// are retried with capped exponential backoff.
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

#[derive(Clone, Debug)]
pub struct SupabaseClientConfig {
    pub base_url: String,
    pub api_key: String,
    pub default_timeout: Duration,
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub max_error_body_bytes: usize,
}

impl SupabaseClientConfig {
    /// Builds a config for the given project URL and key, reading tuning knobs
    /// from the environment:
    /// - `SUPABASE_TIMEOUT_SECS` (default 30)
    /// - `SUPABASE_MAX_RETRIES` (default 3)
    /// - `SUPABASE_RETRY_INITIAL_MS` (default 200)
    /// - `SUPABASE_RETRY_MAX_MS` (default 5000)
    /// - `SUPABASE_MAX_ERROR_BODY_BYTES` (default 8 KiB)
    pub fn from_env(base_url: &str, api_key: &str) -> Self {
        let default_timeout = env_parse::<u64>("SUPABASE_TIMEOUT_SECS")
            .map(Duration::from_secs)
            .unwrap_or_else(|| Duration::from_secs(30));
        let max_retries = env_parse::<u32>("SUPABASE_MAX_RETRIES").unwrap_or(3);
        let initial_backoff = env_parse::<u64>("SUPABASE_RETRY_INITIAL_MS")
            .map(Duration::from_millis)
            .unwrap_or_else(|| Duration::from_millis(200));
        let max_backoff = env_parse::<u64>("SUPABASE_RETRY_MAX_MS")
            .map(Duration::from_millis)
            .unwrap_or_else(|| Duration::from_millis(5_000));
        let max_error_body_bytes =
            env_parse::<usize>("SUPABASE_MAX_ERROR_BODY_BYTES").unwrap_or(8 * 1024);

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            default_timeout,
            max_retries,
            initial_backoff,
            max_backoff,
            max_error_body_bytes,
        }
    }

    pub fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.base_url)
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.parse::<T>().ok())
}

#[derive(Debug, thiserror::Error)]
pub enum SupabaseError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("invalid response JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("upstream returned error: status={status} message={message}")]
    Upstream { status: StatusCode, message: String },

    #[error("upstream returned non-JSON error: status={status} body={body}")]
    UpstreamBody { status: StatusCode, body: String },
}

#[derive(Clone)]
pub struct SupabaseClient {
    config: SupabaseClientConfig,
    http: reqwest::Client,
}

impl SupabaseClient {
    pub fn new(config: SupabaseClientConfig) -> Result<Self, SupabaseError> {
        let http = reqwest::Client::builder()
            .user_agent("mcp-servers/tool-insights")
            .build()?;
        Ok(Self { config, http })
    }

    /// `GET /rest/v1/{table}` with the given query pairs.
    pub async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, SupabaseError> {
        let url = self.config.table_url(table);
        debug!(table, filters = query.len(), "supabase select");
        self.request_with_retry(|| {
            let url = url.clone();
            async move {
                let resp = self
                    .http
                    .get(&url)
                    .timeout(self.config.default_timeout)
                    .header("apikey", &self.config.api_key)
                    .bearer_auth(&self.config.api_key)
                    .header("Accept", "application/json")
                    .query(query)
                    .send()
                    .await?;
                Self::parse_rows(resp, self.config.max_error_body_bytes).await
            }
        })
        .await
    }

    async fn parse_rows<T: DeserializeOwned>(
        resp: reqwest::Response,
        max_error_body_bytes: usize,
    ) -> Result<Vec<T>, SupabaseError> {
        if resp.status().is_success() {
            let bytes = resp.bytes().await?;
            return Ok(serde_json::from_slice(&bytes)?);
        }
        Err(Self::to_upstream_error(resp, max_error_body_bytes).await)
    }

    async fn to_upstream_error(
        resp: reqwest::Response,
        max_error_body_bytes: usize,
    ) -> SupabaseError {
        let status = resp.status();
        let body = read_limited_text(resp, max_error_body_bytes).await;
        match serde_json::from_str::<PostgrestError>(&body) {
            Ok(parsed) => {
                let mut message = parsed
                    .message
                    .unwrap_or_else(|| "unknown upstream error".to_string());
                if let Some(code) = parsed.code {
                    message = format!("{message} (code {code})");
                }
                SupabaseError::Upstream { status, message }
            }
            Err(_) => SupabaseError::UpstreamBody { status, body },
        }
    }

    async fn request_with_retry<T, Fut, F>(&self, mut f: F) -> Result<T, SupabaseError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, SupabaseError>>,
    {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match f().await {
                Ok(v) => return Ok(v),
                Err(e) => {
                    if attempt > self.config.max_retries || !should_retry(&e) {
                        return Err(e);
                    }
                    let delay = backoff_delay(
                        self.config.initial_backoff,
                        self.config.max_backoff,
                        attempt - 1,
                    );
                    warn!(
                        attempt,
                        delay_ms = delay.as_millis(),
                        error = %e,
                        "supabase request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

fn should_retry(err: &SupabaseError) -> bool {
    match err {
        SupabaseError::Request(e) => e.is_timeout() || e.is_connect() || e.is_body(),
        SupabaseError::Upstream { status, .. } | SupabaseError::UpstreamBody { status, .. } => {
            *status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
        }
        SupabaseError::InvalidJson(_) => false,
    }
}

fn backoff_delay(initial: Duration, max: Duration, exponent: u32) -> Duration {
    let mult = 1u128.checked_shl(exponent).unwrap_or(u128::MAX);
    let base_ms = initial.as_millis().saturating_mul(mult);
    let capped_ms = std::cmp::min(base_ms, max.as_millis()) as u64;
    let jitter_cap = std::cmp::max(1, capped_ms / 4);
    Duration::from_millis(capped_ms.saturating_add(pseudo_jitter_ms(jitter_cap)))
}

fn pseudo_jitter_ms(max_inclusive: u64) -> u64 {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos() as u64)
        .unwrap_or(0);
    nanos % (max_inclusive + 1)
}

async fn read_limited_text(resp: reqwest::Response, max_bytes: usize) -> String {
    match resp.bytes().await {
        Ok(mut b) => {
            if b.len() > max_bytes {
                b.truncate(max_bytes);
            }
            String::from_utf8_lossy(&b).to_string()
        }
        Err(e) => {
            warn!(error = %e, "failed to read upstream error body");
            "<failed to read error body>".to_string()
        }
    }
}

/// PostgREST error envelope: `{"code": "...", "message": "...", "details": ..., "hint": ...}`.
#[derive(Debug, Deserialize)]
struct PostgrestError {
    code: Option<String>,
    message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SupabaseClientConfig {
        SupabaseClientConfig {
            base_url: "https://example.supabase.co".to_string(),
            api_key: "anon".to_string(),
            default_timeout: Duration::from_secs(1),
            max_retries: 3,
            initial_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_millis(5_000),
            max_error_body_bytes: 1024,
        }
    }

    #[test]
    fn table_url_joins_rest_path() {
        assert_eq!(
            config().table_url("mcp_tools"),
            "https://example.supabase.co/rest/v1/mcp_tools"
        );
    }

    #[test]
    fn from_env_strips_trailing_slash() {
        let cfg = SupabaseClientConfig::from_env("https://example.supabase.co/", "anon");
        assert_eq!(cfg.base_url, "https://example.supabase.co");
        assert_eq!(cfg.api_key, "anon");
    }

    #[test]
    fn backoff_is_capped_with_bounded_jitter() {
        let initial = Duration::from_millis(200);
        let max = Duration::from_millis(5_000);

        let first = backoff_delay(initial, max, 0);
        assert!(first >= initial && first <= Duration::from_millis(250));

        let huge = backoff_delay(initial, max, 40);
        assert!(huge >= max && huge <= Duration::from_millis(6_250));
    }

    #[test]
    fn retries_only_transient_statuses() {
        let throttled = SupabaseError::UpstreamBody {
            status: StatusCode::TOO_MANY_REQUESTS,
            body: String::new(),
        };
        let unavailable = SupabaseError::Upstream {
            status: StatusCode::SERVICE_UNAVAILABLE,
            message: "down".to_string(),
        };
        let bad_filter = SupabaseError::Upstream {
            status: StatusCode::BAD_REQUEST,
            message: "failed to parse filter".to_string(),
        };
        assert!(should_retry(&throttled));
        assert!(should_retry(&unavailable));
        assert!(!should_retry(&bad_filter));
    }

    #[test]
    fn postgrest_error_envelope_parses() {
        let body = r#"{"code":"PGRST116","details":null,"hint":null,"message":"no rows"}"#;
        let parsed: PostgrestError = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.code.as_deref(), Some("PGRST116"));
        assert_eq!(parsed.message.as_deref(), Some("no rows"));
    }
}
