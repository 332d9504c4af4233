use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A row of the `mcp_tools` table.
///
/// Only `id` and `repo_name` are guaranteed; every other column may be null
/// or absent and consumers must treat a missing value as "no signal".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ToolRecord {
    /// Stable row identifier, never reused.
    pub id: String,
    /// Canonical display name, e.g. "github-mcp-server".
    pub repo_name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Primary programming language as reported by GitHub.
    #[serde(default)]
    pub language: Option<String>,
    /// GitHub topic tags. Order is not meaningful.
    #[serde(default)]
    pub topics: Option<Vec<String>>,
    #[serde(default)]
    pub stars: Option<u64>,
    /// ISO 8601 timestamp of when the tool was added to the catalog.
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub github_url: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    /// Raw README markdown, when the row carries a copy of it.
    #[serde(default)]
    pub readme: Option<String>,
}

impl ToolRecord {
    #[cfg(test)]
    pub fn new(id: impl Into<String>, repo_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            repo_name: repo_name.into(),
            description: None,
            language: None,
            topics: None,
            stars: None,
            created_at: None,
            status: None,
            github_url: None,
            category: None,
            readme: None,
        }
    }

    pub fn topics(&self) -> &[String] {
        self.topics.as_deref().unwrap_or_default()
    }
}

/// One entry of a table of contents. Children are ordered as in the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TocNode {
    /// Anchor slug matching the rendered heading's `id` attribute.
    pub id: String,
    pub text: String,
    /// 2, 3 or 4.
    pub level: u8,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TocNode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FaqItem {
    pub question: String,
    pub answer: String,
}
