/// Line-oriented markdown classification shared by the TOC and FAQ extractors.
///
/// This is not a markdown parser. Each line is tagged independently by
/// [`classify_line`] and the extractors run a second pass over the tags:
/// - `Heading`: the raw line starts with 1-6 `#` followed by a space
/// - `Question` / `Answer`: Q&A markers (`Q:`, `- Q.`, `**Q**`, `1. **Question**:`, ...)
/// - `Blank`: whitespace only
/// - `Plain`: anything else, trimmed
use std::sync::LazyLock;

use regex::Regex;

static QUESTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?:Q[:.]|#{3,}|[-*]\s*Q[:.]|\*\*Q[:.]?\*\*[:.]?|\d+\.\s*\*{0,2}question\*{0,2}:\*{0,2})\s*(.*)$",
    )
    .expect("valid regex")
});

static ANSWER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?:A[:.]|[-*]\s*A[:.]|\*\*A[:.]?\*\*[:.]?|\d+\.\s*\*{0,2}answer\*{0,2}:\*{0,2})\s*(.*)$",
    )
    .expect("valid regex")
});

static BOLD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*([^*]+)\*\*").expect("valid regex"));
static ITALIC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*([^*]+)\*").expect("valid regex"));
static CODE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`([^`]+)`").expect("valid regex"));
static LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\([^)]+\)").expect("valid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind<'a> {
    Heading { level: u8, text: &'a str },
    Question(&'a str),
    Answer(&'a str),
    Blank,
    Plain(&'a str),
}

pub fn classify_line(line: &str) -> LineKind<'_> {
    if let Some((level, text)) = heading(line) {
        return LineKind::Heading { level, text };
    }

    let trimmed = line.trim();
    if trimmed.is_empty() {
        return LineKind::Blank;
    }
    if let Some(caps) = QUESTION_RE.captures(trimmed) {
        let rest = caps.get(1).map_or("", |m| m.as_str());
        return LineKind::Question(rest.trim());
    }
    if let Some(caps) = ANSWER_RE.captures(trimmed) {
        let rest = caps.get(1).map_or("", |m| m.as_str());
        return LineKind::Answer(rest.trim());
    }
    LineKind::Plain(trimmed)
}

/// `## Title` -> `(2, "Title")`. The hashes must start the raw line and be
/// followed by a space (or end the line); `#hashtag` and indented hashes are
/// not headings.
fn heading(line: &str) -> Option<(u8, &str)> {
    let hashes = line.bytes().take_while(|&b| b == b'#').count();
    if hashes == 0 || hashes > 6 {
        return None;
    }
    let rest = &line[hashes..];
    if !rest.is_empty() && !rest.starts_with(' ') {
        return None;
    }
    Some((hashes as u8, rest.trim()))
}

/// Removes bold, italic, inline code and link syntax, keeping the inner text.
pub fn strip_inline_markup(text: &str) -> String {
    let text = BOLD_RE.replace_all(text, "$1");
    let text = ITALIC_RE.replace_all(&text, "$1");
    let text = CODE_RE.replace_all(&text, "$1");
    LINK_RE.replace_all(&text, "$1").into_owned()
}

/// URL-safe anchor slug: "Installation Guide" -> "installation-guide".
///
/// Keeps ASCII word characters, whitespace and hyphens; whitespace runs become
/// a single hyphen, hyphen runs collapse, and edge hyphens are trimmed.
/// Distinct headings may share a slug.
pub fn slugify(text: &str) -> String {
    let kept: String = text
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-' || c.is_whitespace())
        .collect();

    let mut out = String::with_capacity(kept.len());
    let mut last_dash = false;
    for ch in kept.chars() {
        if ch == '-' || ch.is_whitespace() {
            if !last_dash {
                out.push('-');
                last_dash = true;
            }
        } else {
            out.push(ch);
            last_dash = false;
        }
    }
    out.trim_matches('-').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_examples() {
        assert_eq!(slugify("Getting Started!"), "getting-started");
        assert_eq!(slugify("  Multi   Space  "), "multi-space");
        assert_eq!(slugify("Installation Guide"), "installation-guide");
        assert_eq!(slugify("--Edge - Case--"), "edge-case");
        assert_eq!(slugify("snake_case config"), "snake_case-config");
        assert_eq!(slugify("Café & Co."), "caf-co");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn strip_markup_keeps_inner_text() {
        assert_eq!(strip_inline_markup("**Bold** and *italic*"), "Bold and italic");
        assert_eq!(strip_inline_markup("Run `npx foo`"), "Run npx foo");
        assert_eq!(
            strip_inline_markup("See [the docs](https://example.com/docs)"),
            "See the docs"
        );
        assert_eq!(strip_inline_markup("a * b"), "a * b");
    }

    #[test]
    fn classify_headings() {
        assert_eq!(
            classify_line("## Install"),
            LineKind::Heading { level: 2, text: "Install" }
        );
        assert_eq!(
            classify_line("#### Deep  "),
            LineKind::Heading { level: 4, text: "Deep" }
        );
        assert_eq!(classify_line("##"), LineKind::Heading { level: 2, text: "" });
        assert_eq!(classify_line("#hashtag"), LineKind::Plain("#hashtag"));
        assert_eq!(classify_line("  ## indented"), LineKind::Plain("## indented"));
    }

    #[test]
    fn classify_question_markers() {
        assert_eq!(classify_line("Q: What is it?"), LineKind::Question("What is it?"));
        assert_eq!(classify_line("q. lower?"), LineKind::Question("lower?"));
        assert_eq!(classify_line("- Q: Bullet?"), LineKind::Question("Bullet?"));
        assert_eq!(classify_line("* Q. Star?"), LineKind::Question("Star?"));
        assert_eq!(classify_line("**Q** Bold?"), LineKind::Question("Bold?"));
        assert_eq!(classify_line("**Q:** Bold colon?"), LineKind::Question("Bold colon?"));
        assert_eq!(
            classify_line("1. **Question**: Numbered?"),
            LineKind::Question("Numbered?")
        );
        assert_eq!(classify_line("2. Question: Plain?"), LineKind::Question("Plain?"));
        assert_eq!(classify_line("  ### Indented?"), LineKind::Question("Indented?"));
    }

    #[test]
    fn classify_answer_markers() {
        assert_eq!(classify_line("A: It is."), LineKind::Answer("It is."));
        assert_eq!(classify_line("- A. Bullet."), LineKind::Answer("Bullet."));
        assert_eq!(classify_line("**A** Bold."), LineKind::Answer("Bold."));
        assert_eq!(classify_line("1. **Answer**: Numbered."), LineKind::Answer("Numbered."));
        assert_eq!(classify_line("A:"), LineKind::Answer(""));
    }

    #[test]
    fn classify_plain_and_blank() {
        assert_eq!(classify_line("   "), LineKind::Blank);
        assert_eq!(classify_line(""), LineKind::Blank);
        assert_eq!(classify_line("  just text "), LineKind::Plain("just text"));
        assert_eq!(classify_line("Quite a line"), LineKind::Plain("Quite a line"));
    }
}
