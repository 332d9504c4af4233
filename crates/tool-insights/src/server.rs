/// MCP server exposing the tool detail page derivations.
///
/// Pure tools (`extract_toc`, `extract_faqs`, `rank_related_tools`,
/// `section_metadata`, `meta_description`) work on caller-supplied input.
/// `related_tools` and `tool_insights` read the catalog through
/// [`InsightsService`].
use std::sync::Arc;

use rmcp::{
    Json, ServerHandler,
    handler::server::router::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::*,
    tool, tool_handler, tool_router,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::faq::{extract_faqs, faq_schema, has_faq};
use crate::insights::{section_views, InsightsService, RelatedSectionView, ToolInsights};
use crate::meta::{meta_description, validate_meta_description};
use crate::model::{FaqItem, TocNode, ToolRecord};
use crate::related::{related_tools, RelatedSection, SectionMetadata, DEFAULT_RELATED_LIMIT};
use crate::store::SupabaseToolStore;
use crate::toc::{extract_headings, should_show_toc, toc_schema};

const MAX_LIMIT: u32 = 50;

#[derive(Clone)]
pub struct ToolInsightsServer {
    service: Arc<InsightsService<SupabaseToolStore>>,
    tool_router: ToolRouter<ToolInsightsServer>,
}

impl ToolInsightsServer {
    pub fn new(service: Arc<InsightsService<SupabaseToolStore>>) -> Self {
        Self {
            service,
            tool_router: Self::tool_router(),
        }
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
struct ExtractTocParams {
    /// README markdown.
    markdown: String,
    /// Canonical page URL; when given, a schema.org ItemList is included.
    page_url: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct ExtractFaqsParams {
    /// README markdown.
    markdown: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct RankRelatedToolsParams {
    /// The tool whose detail page is being rendered.
    reference: ToolRecord,
    /// Candidate pool, in store order.
    candidates: Vec<ToolRecord>,
    /// Max tools per section (default 8, max 50).
    limit: Option<u32>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct RelatedToolsParams {
    /// Tool repo name, matched case-insensitively.
    tool_name: String,
    /// Max tools per section (default 8, max 50).
    limit: Option<u32>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct SectionMetadataParams {
    kind: RelatedSection,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct ToolInsightsParams {
    /// Tool repo name, matched case-insensitively.
    tool_name: String,
    /// README markdown; defaults to the stored `readme` column.
    markdown: Option<String>,
    /// Max tools per related section (default 8, max 50).
    limit: Option<u32>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct MetaDescriptionParams {
    tool: ToolRecord,
}

#[derive(Debug, Serialize, JsonSchema)]
struct ExtractTocResponse {
    show_toc: bool,
    headings: Vec<TocNode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    schema: Option<Value>,
}

#[derive(Debug, Serialize, JsonSchema)]
struct ExtractFaqsResponse {
    has_faq: bool,
    faqs: Vec<FaqItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    schema: Option<Value>,
}

#[derive(Debug, Serialize, JsonSchema)]
struct RelatedToolsResponse {
    tool_id: String,
    sections: Vec<RelatedSectionView>,
}

#[derive(Debug, Serialize, JsonSchema)]
struct MetaDescriptionResponse {
    description: String,
    valid: bool,
}

#[tool_router]
impl ToolInsightsServer {
    #[tool(description = "Extract a nested table of contents (H2-H4) from README markdown. show_toc is true when there are at least 3 entries.")]
    async fn extract_toc(
        &self,
        Parameters(params): Parameters<ExtractTocParams>,
    ) -> Result<Json<ExtractTocResponse>, String> {
        let headings = extract_headings(&params.markdown);
        let schema = params
            .page_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty() && !headings.is_empty())
            .map(|url| toc_schema(&headings, url));

        Ok(Json(ExtractTocResponse {
            show_toc: should_show_toc(&headings),
            headings,
            schema,
        }))
    }

    #[tool(description = "Extract up to 10 question/answer pairs from the FAQ section of README markdown, with a schema.org FAQPage when any are found.")]
    async fn extract_faqs(
        &self,
        Parameters(params): Parameters<ExtractFaqsParams>,
    ) -> Result<Json<ExtractFaqsResponse>, String> {
        let faqs = extract_faqs(&params.markdown);
        Ok(Json(ExtractFaqsResponse {
            has_faq: has_faq(&params.markdown),
            schema: faq_schema(&faqs),
            faqs,
        }))
    }

    #[tool(description = "Rank a caller-supplied candidate pool into similar, trending and new sections relative to a reference tool.")]
    async fn rank_related_tools(
        &self,
        Parameters(params): Parameters<RankRelatedToolsParams>,
    ) -> Result<Json<RelatedToolsResponse>, String> {
        let limit = clamp_limit(params.limit);
        let related = related_tools(&params.reference, &params.candidates, limit);
        Ok(Json(RelatedToolsResponse {
            tool_id: params.reference.id,
            sections: section_views(related),
        }))
    }

    #[tool(description = "Look up a tool by name and return its similar, trending and new related tools from the catalog.")]
    async fn related_tools(
        &self,
        Parameters(params): Parameters<RelatedToolsParams>,
    ) -> Result<Json<RelatedToolsResponse>, String> {
        let tool_name = required(&params.tool_name, "tool_name")?;
        let limit = clamp_limit(params.limit);

        let (tool, related) = self
            .service
            .related(tool_name, limit)
            .await
            .map_err(|e| format!("related tools failed: {e}"))?;

        Ok(Json(RelatedToolsResponse {
            tool_id: tool.id,
            sections: section_views(related),
        }))
    }

    #[tool(description = "Display title, description and icon for a related-tools section: similar, trending or new.")]
    async fn section_metadata(
        &self,
        Parameters(params): Parameters<SectionMetadataParams>,
    ) -> Result<Json<SectionMetadata>, String> {
        Ok(Json(params.kind.metadata()))
    }

    #[tool(description = "Build the full detail view for a tool: meta description, table of contents, FAQs and related sections.")]
    async fn tool_insights(
        &self,
        Parameters(params): Parameters<ToolInsightsParams>,
    ) -> Result<Json<ToolInsights>, String> {
        let tool_name = required(&params.tool_name, "tool_name")?;
        let limit = clamp_limit(params.limit);
        info!(tool_name, "tool_insights invoked");

        let insights = self
            .service
            .insights(tool_name, params.markdown.as_deref(), limit)
            .await
            .map_err(|e| format!("tool insights failed: {e}"))?;
        Ok(Json(insights))
    }

    #[tool(description = "Generate an SEO meta description (at most 160 characters) for a tool record.")]
    async fn meta_description(
        &self,
        Parameters(params): Parameters<MetaDescriptionParams>,
    ) -> Result<Json<MetaDescriptionResponse>, String> {
        required(&params.tool.repo_name, "tool.repo_name")?;
        let description = meta_description(&params.tool);
        Ok(Json(MetaDescriptionResponse {
            valid: validate_meta_description(&description),
            description,
        }))
    }
}

fn required<'a>(value: &'a str, field: &str) -> Result<&'a str, String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(format!("{field} must not be empty"));
    }
    Ok(value)
}

fn clamp_limit(limit: Option<u32>) -> usize {
    limit
        .map(|l| l.clamp(1, MAX_LIMIT) as usize)
        .unwrap_or(DEFAULT_RELATED_LIMIT)
}

#[tool_handler]
impl ServerHandler for ToolInsightsServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_06_18,
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .build(),
            server_info: Implementation {
                name: "tool-insights".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                title: None,
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "MCP tool directory insights. Use extract_toc and extract_faqs on README \
                 markdown, rank_related_tools to rank a supplied candidate pool, \
                 related_tools and tool_insights to work from the catalog by tool name, \
                 section_metadata for section display text, and meta_description for \
                 SEO descriptions."
                    .to_string(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tools_publish_output_schemas() {
        let tools = ToolInsightsServer::tool_router().list_all();
        for name in [
            "extract_toc",
            "extract_faqs",
            "rank_related_tools",
            "related_tools",
            "section_metadata",
            "tool_insights",
            "meta_description",
        ] {
            let tool = tools
                .iter()
                .find(|t| t.name == name)
                .unwrap_or_else(|| panic!("missing tool: {name}"));
            assert!(
                tool.output_schema.is_some(),
                "tool {name} should publish output_schema"
            );
        }
    }

    #[test]
    fn limit_is_clamped() {
        assert_eq!(clamp_limit(None), 8);
        assert_eq!(clamp_limit(Some(0)), 1);
        assert_eq!(clamp_limit(Some(20)), 20);
        assert_eq!(clamp_limit(Some(500)), 50);
    }

    #[test]
    fn required_rejects_blank() {
        assert_eq!(required("  fetch-mcp ", "tool_name"), Ok("fetch-mcp"));
        assert_eq!(
            required("   ", "tool_name"),
            Err("tool_name must not be empty".to_string())
        );
    }
}
