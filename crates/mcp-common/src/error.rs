/// Error types shared across MCP server crates.
///
/// These cover infrastructure that more than one server talks to (the hosted
/// Postgres REST endpoint, Redis). Server-specific errors live in each server
/// crate and wrap `CommonError` via `#[from]`.
use crate::supabase::SupabaseError;

#[derive(Debug, thiserror::Error)]
pub enum CommonError {
    #[error("data store error: {0}")]
    Supabase(#[from] SupabaseError),

    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("redis not configured")]
    RedisUnavailable,
}
