/// SEO meta descriptions for tool pages, composed from catalog fields only.
///
/// A description that is already 60-160 characters is used as is. Otherwise
/// the text is assembled from the formatted tool name, the description, two
/// non-generic topics, the language and, if still short, the first sentence
/// of the README. Everything is capped at 160 characters on a word boundary.
use std::sync::LazyLock;

use regex::Regex;

use crate::model::ToolRecord;

pub const MAX_META_LEN: usize = 160;
const MIN_META_LEN: usize = 20;
const GOOD_DESCRIPTION_MIN: usize = 60;

const GENERIC_TOPICS: &[&str] = &[
    "mcp",
    "mcp-server",
    "model-context-protocol",
    "tool",
    "server",
    "client",
    "protocol",
    "framework",
    "library",
    "package",
    "module",
    "plugin",
    "extension",
];

static GLUED_MCP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)([a-z])mcp").expect("valid regex"));
static MCP_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)mcp").expect("valid regex"));
static SENTENCE_SPLIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]+").expect("valid regex"));

pub fn meta_description(tool: &ToolRecord) -> String {
    let name = tool.repo_name.trim();
    let description = tool.description.as_deref().unwrap_or("").trim();
    let language = tool.language.as_deref().unwrap_or("").trim();
    let readme = tool.readme.as_deref().unwrap_or("");

    let desc_len = char_len(description);
    if (GOOD_DESCRIPTION_MIN..=MAX_META_LEN).contains(&desc_len) {
        return description.to_string();
    }

    let mut meta = format_tool_name(name);

    if !description.is_empty() {
        if meta.is_empty() {
            meta = truncate_to_length(description, MAX_META_LEN);
        } else if char_len(&meta) + desc_len + 3 <= MAX_META_LEN {
            meta = format!("{meta} - {description}");
        } else {
            let remaining = MAX_META_LEN.saturating_sub(char_len(&meta) + 3);
            if remaining > 20 {
                meta = format!("{meta} - {}", truncate_to_length(description, remaining));
            }
        }
    }

    if char_len(&meta) < 140 {
        let topics = key_topics(tool.topics(), 2);
        if !topics.is_empty() {
            let suffix = format!(". {}", topics.join(", "));
            if char_len(&meta) + char_len(&suffix) <= MAX_META_LEN {
                meta.push_str(&suffix);
            }
        }
    }

    if char_len(&meta) < 150 && !language.is_empty() {
        let suffix = format!(" ({language})");
        if char_len(&meta) + char_len(&suffix) <= MAX_META_LEN {
            meta.push_str(&suffix);
        }
    }

    if char_len(&meta) < 80 {
        meta = enhance_with_readme(meta, readme);
    }

    if char_len(&meta) < MIN_META_LEN {
        meta = fallback_description(name, tool.topics(), language);
    }

    truncate_to_length(&meta, MAX_META_LEN).trim().to_string()
}

/// 20-160 characters and at least three words.
pub fn validate_meta_description(text: &str) -> bool {
    let len = char_len(text);
    (MIN_META_LEN..=MAX_META_LEN).contains(&len) && text.split(' ').count() >= 3
}

/// "github-mcp_server" -> "Github MCP Server", "supermcp" -> "Super MCP".
fn format_tool_name(name: &str) -> String {
    let title_case = name
        .split(['-', '_'])
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ");

    let spaced = GLUED_MCP_RE.replace_all(&title_case, "$1 MCP");
    MCP_RE.replace_all(&spaced, "MCP").into_owned()
}

fn key_topics(topics: &[String], limit: usize) -> Vec<&str> {
    topics
        .iter()
        .map(String::as_str)
        .filter(|t| !GENERIC_TOPICS.contains(&t.to_lowercase().as_str()))
        .take(limit)
        .collect()
}

fn enhance_with_readme(current: String, readme: &str) -> String {
    if char_len(readme) < 50 {
        return current;
    }
    let Some(sentence) = SENTENCE_SPLIT_RE
        .split(readme)
        .map(str::trim)
        .find(|s| (21..200).contains(&char_len(s)))
    else {
        return current;
    };

    if current.is_empty() {
        return sentence.to_string();
    }
    if char_len(&current) + char_len(sentence) + 2 <= MAX_META_LEN {
        return format!("{current}. {sentence}");
    }
    if char_len(sentence) <= MAX_META_LEN {
        return sentence.to_string();
    }
    current
}

fn fallback_description(name: &str, topics: &[String], language: &str) -> String {
    let mut desc = if name.is_empty() {
        "Model Context Protocol (MCP) server".to_string()
    } else {
        format!("{} MCP server", format_tool_name(name))
    };
    if !language.is_empty() {
        desc.push_str(&format!(" for {language}"));
    }
    if let Some(topic) = key_topics(topics, 1).first() {
        desc.push_str(&format!(". {topic} support"));
    }
    if char_len(&desc) < 140 {
        desc.push_str(". Discover tools, servers, and connectors for AI development");
    }
    desc
}

/// Cuts to `max` characters, backing up to the last space when it is within
/// 20 characters of the cut, and closes with a period.
fn truncate_to_length(text: &str, max: usize) -> String {
    if char_len(text) <= max {
        return text.to_string();
    }

    let mut truncated: String = text.chars().take(max).collect();
    if let Some(space) = truncated.rfind(' ') {
        if char_len(&truncated[..space]) + 20 > max {
            truncated.truncate(space);
        }
    }

    let trimmed_len = truncated.trim_end().trim_end_matches(['-', ',']).len();
    truncated.truncate(trimmed_len);

    if !truncated.ends_with('.') {
        truncated.push('.');
    }
    truncated.trim().to_string()
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tool(name: &str) -> ToolRecord {
        ToolRecord::new("1", name)
    }

    #[test]
    fn good_description_is_used_verbatim() {
        let mut t = tool("fetch-mcp");
        let description =
            "Fetch web pages and convert them to clean markdown for language model agents.";
        t.description = Some(description.to_string());
        assert_eq!(meta_description(&t), description);
    }

    #[test]
    fn formats_tool_names() {
        assert_eq!(format_tool_name("github-mcp-server"), "Github MCP Server");
        assert_eq!(format_tool_name("supermcp"), "Super MCP");
        assert_eq!(format_tool_name("my_db_tool"), "My Db Tool");
    }

    #[test]
    fn composes_name_description_topics_language() {
        let mut t = tool("postgres-mcp");
        t.description = Some("Query Postgres safely".to_string());
        t.topics = Some(
            ["mcp", "postgres", "sql", "ai"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        );
        t.language = Some("Python".to_string());
        assert_eq!(
            meta_description(&t),
            "Postgres MCP - Query Postgres safely. postgres, sql (Python)"
        );
    }

    #[test]
    fn short_result_falls_back() {
        let t = tool("x");
        let meta = meta_description(&t);
        assert_eq!(
            meta,
            "X MCP server. Discover tools, servers, and connectors for AI development"
        );
        assert!(validate_meta_description(&meta));
    }

    #[test]
    fn short_result_uses_readme_sentence() {
        let mut t = tool("notes-mcp");
        t.readme = Some(
            "# Notes\nA server that lets agents read and write your local notes folder. \
             More text follows here."
                .to_string(),
        );
        let meta = meta_description(&t);
        assert!(meta.starts_with("Notes MCP. "));
        assert!(meta.contains("lets agents read and write your local notes folder"));
    }

    #[test]
    fn long_description_is_truncated_on_word_boundary() {
        let mut t = tool("big");
        t.description = Some("word ".repeat(60));
        let meta = meta_description(&t);
        assert!(char_len(&meta) <= MAX_META_LEN);
        assert!(meta.ends_with('.'));
        assert!(!meta.contains("  "));
    }

    #[test]
    fn truncate_backs_up_to_space() {
        let text = "alpha beta gamma delta epsilon";
        assert_eq!(truncate_to_length(text, 14), "alpha beta.");
        assert_eq!(truncate_to_length("short", 14), "short");
    }

    #[test]
    fn validation_rules() {
        assert!(validate_meta_description("A perfectly fine description here"));
        assert!(!validate_meta_description("too short"));
        assert!(!validate_meta_description("Twowordsonly butlongenoughtext"));
        assert!(!validate_meta_description(&"word ".repeat(40)));
    }
}
