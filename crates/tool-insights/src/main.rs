mod cache;
mod config;
mod error;
mod faq;
mod insights;
mod markup;
mod meta;
mod model;
mod related;
mod server;
mod store;
mod toc;

use std::sync::Arc;

use rmcp::{ServiceExt, transport::stdio};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cache::InsightsCache;
use config::Config;
use insights::InsightsService;
use mcp_common::redis::RedisCache;
use mcp_common::supabase::SupabaseClient;
use server::ToolInsightsServer;
use store::SupabaseToolStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout is reserved for MCP JSON-RPC
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    info!("starting tool-insights MCP server");

    let config = Config::from_env()?;
    let supabase_config = config.supabase_client_config();
    info!(
        supabase_url = %supabase_config.base_url,
        timeout_ms = supabase_config.default_timeout.as_millis(),
        max_retries = supabase_config.max_retries,
        redis = config.redis_url.is_some(),
        "configuration loaded"
    );

    let redis_cache = RedisCache::new(config.redis_url.as_deref());
    if redis_cache.is_available().await {
        info!("redis connected");
    } else {
        info!("redis unavailable, running without cache");
    }
    let cache = InsightsCache::new(redis_cache);

    let store = SupabaseToolStore::new(SupabaseClient::new(supabase_config)?);
    let service = Arc::new(InsightsService::new(store, cache));
    let server = ToolInsightsServer::new(service);

    if let Some(addr) = config.tcp_listen_addr.as_deref() {
        let listener = TcpListener::bind(addr).await?;
        info!(listen_addr = %addr, "MCP server ready, serving on TCP");
        loop {
            let (stream, peer) = listener.accept().await?;
            let server = server.clone();
            tokio::spawn(async move {
                info!(peer = %peer, "MCP client connected");
                let service = server.serve(stream).await.inspect_err(|e| {
                    tracing::error!(error = %e, "MCP server error");
                })?;
                service.waiting().await?;
                info!(peer = %peer, "MCP client disconnected");
                Ok::<(), anyhow::Error>(())
            });
        }
    } else {
        info!("MCP server ready, serving on stdio");
        let service = server.serve(stdio()).await.inspect_err(|e| {
            tracing::error!(error = %e, "MCP server error");
        })?;
        service.waiting().await?;
        info!("MCP server shut down");
    }
    Ok(())
}
