use mcp_common::error::CommonError;
use mcp_common::supabase::SupabaseError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Common(#[from] CommonError),

    #[error("config error: {0}")]
    Config(String),

    #[error("tool not found: {0}")]
    NotFound(String),

    #[error("not a tool name: {0}")]
    InvalidToolName(String),
}

impl From<SupabaseError> for AppError {
    fn from(err: SupabaseError) -> Self {
        Self::Common(CommonError::Supabase(err))
    }
}
