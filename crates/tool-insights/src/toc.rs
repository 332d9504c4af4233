/// Table-of-contents extraction from README markdown.
///
/// Only H2-H4 are collected; H1 is the page title. Headings are nested with a
/// level stack: a new heading pops every open entry at the same or deeper
/// level and becomes a child of whatever remains on top (or a new root). This
/// nests correctly when levels are skipped, e.g. H2 followed directly by H4.
use serde_json::{json, Value};

use crate::markup::{classify_line, slugify, strip_inline_markup, LineKind};
use crate::model::TocNode;

/// A TOC with fewer entries than this is not worth rendering.
const MIN_TOC_ENTRIES: usize = 3;

pub fn extract_headings(content: &str) -> Vec<TocNode> {
    let flat = content.lines().filter_map(|line| match classify_line(line) {
        LineKind::Heading { level, text } if (2..=4).contains(&level) && !text.is_empty() => {
            let text = strip_inline_markup(text).trim().to_string();
            if text.is_empty() {
                return None;
            }
            Some(TocNode {
                id: slugify(&text),
                text,
                level,
                children: Vec::new(),
            })
        }
        _ => None,
    });
    build_hierarchy(flat)
}

fn build_hierarchy(headings: impl IntoIterator<Item = TocNode>) -> Vec<TocNode> {
    let mut roots: Vec<TocNode> = Vec::new();
    // (index among the parent's children, level) for each open ancestor
    let mut stack: Vec<(usize, u8)> = Vec::new();

    for node in headings {
        while stack.last().is_some_and(|&(_, level)| level >= node.level) {
            stack.pop();
        }
        let level = node.level;
        let siblings = children_at(&mut roots, &stack);
        siblings.push(node);
        stack.push((siblings.len() - 1, level));
    }

    roots
}

fn children_at<'a>(roots: &'a mut Vec<TocNode>, stack: &[(usize, u8)]) -> &'a mut Vec<TocNode> {
    let mut current = roots;
    for &(idx, _) in stack {
        current = &mut current[idx].children;
    }
    current
}

/// Pre-order walk of the tree.
pub fn flatten_toc(toc: &[TocNode]) -> Vec<&TocNode> {
    let mut out = Vec::new();
    fn walk<'a>(nodes: &'a [TocNode], out: &mut Vec<&'a TocNode>) {
        for node in nodes {
            out.push(node);
            walk(&node.children, out);
        }
    }
    walk(toc, &mut out);
    out
}

pub fn should_show_toc(toc: &[TocNode]) -> bool {
    flatten_toc(toc).len() >= MIN_TOC_ENTRIES
}

/// schema.org `ItemList` describing the page outline.
pub fn toc_schema(toc: &[TocNode], page_url: &str) -> Value {
    let items: Vec<Value> = flatten_toc(toc)
        .into_iter()
        .enumerate()
        .map(|(i, node)| {
            json!({
                "@type": "ListItem",
                "position": i + 1,
                "name": node.text,
                "url": format!("{page_url}#{}", node.id),
            })
        })
        .collect();

    json!({
        "@context": "https://schema.org",
        "@type": "ItemList",
        "name": "Table of Contents",
        "itemListElement": items,
    })
}
