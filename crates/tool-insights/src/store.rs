/// Read access to the tool catalog.
///
/// `ToolStore` is the seam between the detail-page assembly and the hosted
/// database; tests substitute an in-memory implementation.
use std::future::Future;

use mcp_common::supabase::SupabaseClient;
use tracing::debug;

use crate::error::AppError;
use crate::model::ToolRecord;

const TOOLS_TABLE: &str = "mcp_tools";
const APPROVED_STATUS: &str = "approved";

/// Repository files that get requested as if they were tools.
const NON_TOOL_NAMES: &[&str] = &["license", "contributing", "readme"];
const NON_TOOL_EXTENSIONS: &[&str] = &[".md", ".txt"];

pub trait ToolStore: Send + Sync {
    /// Case-insensitive lookup by `repo_name`. `Ok(None)` when no row matches.
    fn tool_by_name(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Option<ToolRecord>, AppError>> + Send;

    /// Up to `limit` approved tools, excluding `exclude_id`. Order is the
    /// store's and is preserved by the ranking.
    fn candidate_pool(
        &self,
        exclude_id: &str,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<ToolRecord>, AppError>> + Send;
}

/// Rejects names that are clearly repository files rather than tools.
pub fn validate_tool_name(name: &str) -> Result<&str, AppError> {
    let name = name.trim();
    let lower = name.to_lowercase();
    let is_file = NON_TOOL_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
        || NON_TOOL_NAMES.contains(&lower.as_str());
    if name.is_empty() || is_file {
        return Err(AppError::InvalidToolName(name.to_string()));
    }
    Ok(name)
}

pub struct SupabaseToolStore {
    client: SupabaseClient,
}

impl SupabaseToolStore {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }
}

impl ToolStore for SupabaseToolStore {
    async fn tool_by_name(&self, name: &str) -> Result<Option<ToolRecord>, AppError> {
        let name = validate_tool_name(name)?;
        let query = [
            ("select", "*".to_string()),
            ("repo_name", format!("ilike.{}", escape_ilike(name))),
            ("limit", "1".to_string()),
        ];
        let rows: Vec<ToolRecord> = self.client.select(TOOLS_TABLE, &query).await?;
        debug!(name, found = !rows.is_empty(), "tool lookup");
        Ok(rows.into_iter().next())
    }

    async fn candidate_pool(
        &self,
        exclude_id: &str,
        limit: usize,
    ) -> Result<Vec<ToolRecord>, AppError> {
        let query = [
            ("select", "*".to_string()),
            ("status", format!("eq.{APPROVED_STATUS}")),
            ("id", format!("neq.{exclude_id}")),
            ("limit", limit.to_string()),
        ];
        let rows: Vec<ToolRecord> = self.client.select(TOOLS_TABLE, &query).await?;
        debug!(exclude_id, count = rows.len(), "candidate pool fetched");
        Ok(rows)
    }
}

/// `ilike` treats `%` and `_` as wildcards; match them literally.
fn escape_ilike(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for ch in name.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_repository_files() {
        for name in ["README.md", "notes.TXT", "LICENSE", "Contributing", "readme", "  ", ""] {
            assert!(
                matches!(validate_tool_name(name), Err(AppError::InvalidToolName(_))),
                "{name} should be rejected"
            );
        }
    }

    #[test]
    fn accepts_tool_names() {
        assert_eq!(validate_tool_name(" github-mcp-server ").unwrap(), "github-mcp-server");
        assert_eq!(validate_tool_name("readme-generator").unwrap(), "readme-generator");
        assert_eq!(validate_tool_name("mdx-tool").unwrap(), "mdx-tool");
    }

    #[test]
    fn escapes_ilike_wildcards() {
        assert_eq!(escape_ilike("my_tool"), r"my\_tool");
        assert_eq!(escape_ilike("100%"), r"100\%");
        assert_eq!(escape_ilike("plain-name"), "plain-name");
    }
}
