/// Tool detail page assembly.
///
/// [`ToolInsights::build`] is pure: given a tool, its README and a candidate
/// pool it derives every detail-page section. [`InsightsService`] adds the
/// I/O around it (cache, then store) and degrades a failed pool fetch to
/// empty related sections.
use schemars::JsonSchema;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::cache::InsightsCache;
use crate::error::AppError;
use crate::faq::{extract_faqs, faq_schema};
use crate::meta::meta_description;
use crate::model::{FaqItem, TocNode, ToolRecord};
use crate::related::{
    related_tools, RelatedSection, RelatedTools, SectionMetadata, CANDIDATE_POOL_LIMIT,
};
use crate::store::{validate_tool_name, ToolStore};
use crate::toc::{extract_headings, should_show_toc};

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct RelatedSectionView {
    pub kind: RelatedSection,
    #[serde(flatten)]
    pub metadata: SectionMetadata,
    pub tools: Vec<ToolRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct ToolInsights {
    pub tool: ToolRecord,
    pub meta_description: String,
    pub show_toc: bool,
    pub toc: Vec<TocNode>,
    pub faqs: Vec<FaqItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub faq_schema: Option<Value>,
    /// Always similar, trending, new, in that order.
    pub related: Vec<RelatedSectionView>,
}

impl ToolInsights {
    pub fn build(
        tool: ToolRecord,
        markdown: &str,
        candidates: &[ToolRecord],
        limit: usize,
    ) -> Self {
        let toc = extract_headings(markdown);
        let faqs = extract_faqs(markdown);
        let related = section_views(related_tools(&tool, candidates, limit));

        Self {
            meta_description: meta_description(&tool),
            show_toc: should_show_toc(&toc),
            faq_schema: faq_schema(&faqs),
            toc,
            faqs,
            related,
            tool,
        }
    }
}

pub fn section_views(related: RelatedTools) -> Vec<RelatedSectionView> {
    RelatedSection::ALL
        .into_iter()
        .map(|kind| RelatedSectionView {
            kind,
            metadata: kind.metadata(),
            tools: related.section(kind).to_vec(),
        })
        .collect()
}

pub struct InsightsService<S> {
    store: S,
    cache: InsightsCache,
}

impl<S: ToolStore> InsightsService<S> {
    pub fn new(store: S, cache: InsightsCache) -> Self {
        Self { store, cache }
    }

    /// Cache first, then the store. Found records are written back.
    pub async fn find_tool(&self, name: &str) -> Result<ToolRecord, AppError> {
        let name = validate_tool_name(name)?;
        if let Some(cached) = self.cache.get_tool(name).await {
            debug!(name, "tool cache hit");
            return Ok(cached);
        }

        let tool = self
            .store
            .tool_by_name(name)
            .await?
            .ok_or_else(|| AppError::NotFound(name.to_string()))?;
        self.cache.set_tool(name, &tool).await;
        Ok(tool)
    }

    /// Never fails: a store error is logged and yields an empty pool.
    pub async fn candidate_pool(&self, tool: &ToolRecord) -> Vec<ToolRecord> {
        if let Some(cached) = self
            .cache
            .get_candidate_pool(&tool.id, CANDIDATE_POOL_LIMIT)
            .await
        {
            return cached;
        }

        match self.store.candidate_pool(&tool.id, CANDIDATE_POOL_LIMIT).await {
            Ok(pool) => {
                self.cache
                    .set_candidate_pool(&tool.id, CANDIDATE_POOL_LIMIT, &pool)
                    .await;
                pool
            }
            Err(e) => {
                warn!(
                    error = %e,
                    tool_id = %tool.id,
                    "candidate pool fetch failed, related sections empty"
                );
                Vec::new()
            }
        }
    }

    pub async fn related(
        &self,
        name: &str,
        limit: usize,
    ) -> Result<(ToolRecord, RelatedTools), AppError> {
        let tool = self.find_tool(name).await?;
        let pool = self.candidate_pool(&tool).await;
        let related = related_tools(&tool, &pool, limit);
        Ok((tool, related))
    }

    /// Full detail view. Without explicit markdown the record's `readme`
    /// column is used; with neither, TOC and FAQ come back empty.
    pub async fn insights(
        &self,
        name: &str,
        markdown: Option<&str>,
        limit: usize,
    ) -> Result<ToolInsights, AppError> {
        let tool = self.find_tool(name).await?;
        let pool = self.candidate_pool(&tool).await;
        let markdown = match markdown {
            Some(md) => md.to_string(),
            None => tool.readme.clone().unwrap_or_default(),
        };
        Ok(ToolInsights::build(tool, &markdown, &pool, limit))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::related::DEFAULT_RELATED_LIMIT;
    use mcp_common::error::CommonError;
    use mcp_common::redis::RedisCache;
    use mcp_common::supabase::SupabaseError;

    #[derive(Default)]
    struct MemoryStore {
        tools: Vec<ToolRecord>,
        fail_pool: bool,
        pool_calls: AtomicUsize,
    }

    impl ToolStore for MemoryStore {
        async fn tool_by_name(&self, name: &str) -> Result<Option<ToolRecord>, AppError> {
            Ok(self
                .tools
                .iter()
                .find(|t| t.repo_name.eq_ignore_ascii_case(name))
                .cloned())
        }

        async fn candidate_pool(
            &self,
            exclude_id: &str,
            limit: usize,
        ) -> Result<Vec<ToolRecord>, AppError> {
            self.pool_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_pool {
                let truncated = serde_json::from_str::<Vec<ToolRecord>>("[{\"id\":").unwrap_err();
                return Err(SupabaseError::InvalidJson(truncated).into());
            }
            Ok(self
                .tools
                .iter()
                .filter(|t| t.id != exclude_id && t.status.as_deref() == Some("approved"))
                .take(limit)
                .cloned()
                .collect())
        }
    }

    fn approved(id: &str, name: &str, language: &str, stars: u64) -> ToolRecord {
        let mut t = ToolRecord::new(id, name);
        t.status = Some("approved".to_string());
        t.language = Some(language.to_string());
        t.stars = Some(stars);
        t
    }

    fn service(store: MemoryStore) -> InsightsService<MemoryStore> {
        InsightsService::new(store, InsightsCache::new(RedisCache::new(None)))
    }

    fn catalog() -> Vec<ToolRecord> {
        let mut reference = approved("1", "fetch-mcp", "Python", 100);
        reference.readme = Some(
            "# Fetch\n## Install\n### From pip\n## Usage\n## FAQ\nQ: Is it free?\nA: Yes.\n"
                .to_string(),
        );
        let mut pending = approved("4", "draft-mcp", "Python", 120);
        pending.status = Some("pending".to_string());
        vec![
            reference,
            approved("2", "browser-mcp", "Python", 150),
            approved("3", "rust-mcp", "Rust", 9_000),
            pending,
        ]
    }

    #[tokio::test]
    async fn builds_full_detail_view_from_readme() {
        let svc = service(MemoryStore {
            tools: catalog(),
            ..Default::default()
        });
        let insights = svc.insights("Fetch-MCP", None, DEFAULT_RELATED_LIMIT).await.unwrap();

        assert_eq!(insights.tool.id, "1");
        assert!(insights.show_toc);
        assert_eq!(insights.toc.len(), 3);
        assert_eq!(insights.faqs.len(), 1);
        assert!(insights.faq_schema.is_some());
        assert!(!insights.meta_description.is_empty());

        let kinds: Vec<RelatedSection> = insights.related.iter().map(|s| s.kind).collect();
        assert_eq!(kinds, RelatedSection::ALL);
        let similar: Vec<&str> = insights.related[0].tools.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(similar, ["2", "3"]);
        let trending: Vec<&str> = insights.related[1].tools.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(trending, ["3", "2"]);
        assert_eq!(insights.related[2].metadata.title, "New MCP Servers");
    }

    #[tokio::test]
    async fn explicit_markdown_overrides_readme() {
        let svc = service(MemoryStore {
            tools: catalog(),
            ..Default::default()
        });
        let insights = svc.insights("fetch-mcp", Some("## Only"), 8).await.unwrap();
        assert!(!insights.show_toc);
        assert_eq!(insights.toc.len(), 1);
        assert!(insights.faqs.is_empty());
        assert!(insights.faq_schema.is_none());
    }

    #[tokio::test]
    async fn failed_pool_yields_empty_sections() {
        let store = MemoryStore {
            tools: catalog(),
            fail_pool: true,
            ..Default::default()
        };
        let svc = service(store);
        let insights = svc.insights("fetch-mcp", None, 8).await.unwrap();
        assert_eq!(insights.related.len(), 3);
        assert!(insights.related.iter().all(|s| s.tools.is_empty()));
        assert_eq!(svc.store.pool_calls.load(Ordering::SeqCst), 1);

        let outage = svc.store.candidate_pool("1", 10).await;
        assert!(matches!(
            outage,
            Err(AppError::Common(CommonError::Supabase(SupabaseError::InvalidJson(_))))
        ));
    }

    #[tokio::test]
    async fn unknown_and_file_names_are_errors() {
        let svc = service(MemoryStore {
            tools: catalog(),
            ..Default::default()
        });
        assert!(matches!(svc.find_tool("nope").await, Err(AppError::NotFound(_))));
        assert!(matches!(
            svc.find_tool("README.md").await,
            Err(AppError::InvalidToolName(_))
        ));
    }

    #[tokio::test]
    async fn related_respects_limit() {
        let svc = service(MemoryStore {
            tools: catalog(),
            ..Default::default()
        });
        let (tool, related) = svc.related("fetch-mcp", 1).await.unwrap();
        assert_eq!(tool.id, "1");
        assert_eq!(related.similar.len(), 1);
        assert_eq!(related.similar[0].id, "2");
    }

    #[test]
    fn section_views_serialize_flat_metadata() {
        let views = section_views(RelatedTools::default());
        let json = serde_json::to_value(&views[1]).unwrap();
        assert_eq!(json["kind"], "trending");
        assert_eq!(json["title"], "Trending MCPs");
        assert_eq!(json["icon"], "🔥");
        assert!(json["tools"].as_array().unwrap().is_empty());
    }
}
