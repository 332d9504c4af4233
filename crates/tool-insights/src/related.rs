/// Related-tool ranking for a tool detail page.
///
/// Three independent views over the same candidate pool:
/// - `similar`: by similarity score (language, shared topics, star band)
/// - `trending`: by stars, missing stars count as 0
/// - `new`: by `created_at`, missing or unparseable timestamps sort last
///
/// All sorts are stable, so ties keep the pool's order. The reference tool is
/// skipped if it shows up in the pool. Missing fields never fail scoring; they
/// just contribute nothing.
use std::cmp::Reverse;
use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::model::ToolRecord;

pub const DEFAULT_RELATED_LIMIT: usize = 8;
/// Upper bound on how many candidates are fetched for one detail page.
pub const CANDIDATE_POOL_LIMIT: usize = 100;

const LANGUAGE_MATCH_POINTS: u32 = 3;
const SHARED_TOPIC_POINTS: u32 = 2;
const STAR_BAND_POINTS: u32 = 1;
const STAR_BAND: (f64, f64) = (0.5, 2.0);

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RelatedTools {
    pub similar: Vec<ToolRecord>,
    pub trending: Vec<ToolRecord>,
    pub new: Vec<ToolRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum RelatedSection {
    Similar,
    Trending,
    New,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct SectionMetadata {
    pub title: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
}

impl RelatedSection {
    pub const ALL: [RelatedSection; 3] = [Self::Similar, Self::Trending, Self::New];

    pub fn metadata(self) -> SectionMetadata {
        match self {
            Self::Similar => SectionMetadata {
                title: "Similar MCP Tools",
                description: "Based on tags & features",
                icon: "🔗",
            },
            Self::Trending => SectionMetadata {
                title: "Trending MCPs",
                description: "Most active this week",
                icon: "🔥",
            },
            Self::New => SectionMetadata {
                title: "New MCP Servers",
                description: "Just arrived",
                icon: "✨",
            },
        }
    }
}

impl RelatedTools {
    pub fn section(&self, section: RelatedSection) -> &[ToolRecord] {
        match section {
            RelatedSection::Similar => &self.similar,
            RelatedSection::Trending => &self.trending,
            RelatedSection::New => &self.new,
        }
    }
}

/// +3 same language, +2 per distinct shared topic, +1 if the candidate's star
/// count is within (0.5x, 2x) of the reference's.
pub fn similarity_score(reference: &ToolRecord, candidate: &ToolRecord) -> u32 {
    let mut score = 0;

    if let (Some(a), Some(b)) = (&reference.language, &candidate.language) {
        if a == b {
            score += LANGUAGE_MATCH_POINTS;
        }
    }

    let reference_topics: HashSet<&str> = reference.topics().iter().map(String::as_str).collect();
    let shared = candidate
        .topics()
        .iter()
        .map(String::as_str)
        .filter(|t| reference_topics.contains(t))
        .collect::<HashSet<_>>()
        .len() as u32;
    score += shared * SHARED_TOPIC_POINTS;

    if let (Some(ref_stars), Some(stars)) = (reference.stars, candidate.stars) {
        if ref_stars > 0 {
            let ratio = stars as f64 / ref_stars as f64;
            if ratio > STAR_BAND.0 && ratio < STAR_BAND.1 {
                score += STAR_BAND_POINTS;
            }
        }
    }

    score
}

pub fn related_tools(
    reference: &ToolRecord,
    candidates: &[ToolRecord],
    limit: usize,
) -> RelatedTools {
    let pool: Vec<&ToolRecord> = candidates.iter().filter(|c| c.id != reference.id).collect();

    let mut scored: Vec<(u32, &ToolRecord)> = pool
        .iter()
        .map(|&tool| (similarity_score(reference, tool), tool))
        .collect();
    scored.sort_by_key(|&(score, _)| Reverse(score));
    let similar = scored.into_iter().take(limit).map(|(_, t)| t.clone()).collect();

    let mut by_stars = pool.clone();
    by_stars.sort_by_key(|t| Reverse(t.stars.unwrap_or(0)));
    let trending = by_stars.into_iter().take(limit).cloned().collect();

    let mut by_created = pool;
    by_created.sort_by_key(|t| Reverse(created_at_millis(t)));
    let new = by_created.into_iter().take(limit).cloned().collect();

    RelatedTools {
        similar,
        trending,
        new,
    }
}

/// Milliseconds since the epoch; 0 when absent or unparseable.
fn created_at_millis(tool: &ToolRecord) -> i64 {
    tool.created_at
        .as_deref()
        .and_then(parse_timestamp)
        .unwrap_or(0)
}

fn parse_timestamp(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.timestamp_millis());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc().timestamp_millis());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp_millis())
}
