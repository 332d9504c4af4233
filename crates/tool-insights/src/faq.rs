/// FAQ extraction from README markdown.
///
/// The FAQ section starts after the first line beginning with one of
/// [`FAQ_SECTION_MARKERS`] (case-insensitive) and runs until the next H2 whose
/// text does not mention "faq", or the end of the document. Inside it, Q/A
/// markers and `###` headings open questions; everything else continues the
/// open answer.
use serde_json::{json, Value};

use crate::markup::{classify_line, strip_inline_markup, LineKind};
use crate::model::FaqItem;

pub const FAQ_SECTION_MARKERS: [&str; 4] = [
    "## faq",
    "## frequently asked questions",
    "## q&a",
    "## questions and answers",
];

pub const MAX_FAQS: usize = 10;

pub fn extract_faqs(content: &str) -> Vec<FaqItem> {
    let lines: Vec<&str> = content.lines().collect();
    let Some(start) = lines.iter().position(|line| is_section_start(line)) else {
        return Vec::new();
    };

    let body = &lines[start + 1..];
    let end = body
        .iter()
        .position(|line| is_section_end(line))
        .unwrap_or(body.len());

    let mut faqs = Vec::new();
    let mut pending = PendingFaq::default();

    for &line in &body[..end] {
        match classify_line(line) {
            LineKind::Question(text) => pending.open(text, &mut faqs),
            LineKind::Heading { level, text } if level >= 3 => pending.open(text, &mut faqs),
            LineKind::Answer(text) => {
                if pending.has_question() {
                    pending.answer.push(text);
                }
            }
            LineKind::Blank => {
                if !pending.answer.is_empty() {
                    pending.answer.push("");
                }
            }
            LineKind::Plain(text) => pending.continue_answer(text),
            // An H1, or an H2 that still mentions "faq", is body text here.
            LineKind::Heading { .. } => pending.continue_answer(line.trim()),
        }
    }
    pending.flush(&mut faqs);

    faqs.truncate(MAX_FAQS);
    faqs
}

/// Cheap presence check: any section marker anywhere in the document.
pub fn has_faq(content: &str) -> bool {
    let lower = content.to_lowercase();
    FAQ_SECTION_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// schema.org `FAQPage`; `None` when there is nothing to describe.
pub fn faq_schema(faqs: &[FaqItem]) -> Option<Value> {
    if faqs.is_empty() {
        return None;
    }
    let entities: Vec<Value> = faqs
        .iter()
        .map(|faq| {
            json!({
                "@type": "Question",
                "name": faq.question,
                "acceptedAnswer": {
                    "@type": "Answer",
                    "text": faq.answer,
                },
            })
        })
        .collect();

    Some(json!({
        "@context": "https://schema.org",
        "@type": "FAQPage",
        "mainEntity": entities,
    }))
}

fn is_section_start(line: &str) -> bool {
    let lower = line.trim().to_lowercase();
    FAQ_SECTION_MARKERS
        .iter()
        .any(|marker| lower.starts_with(marker))
}

/// Any trimmed line opening with exactly two `#` ends the section, with or
/// without a following space, unless it mentions "faq".
fn is_section_end(line: &str) -> bool {
    let trimmed = line.trim();
    let is_h2 = trimmed
        .strip_prefix("##")
        .is_some_and(|rest| !rest.starts_with('#'));
    is_h2 && !trimmed.to_lowercase().contains("faq")
}

#[derive(Default)]
struct PendingFaq<'a> {
    question: &'a str,
    answer: Vec<&'a str>,
}

impl<'a> PendingFaq<'a> {
    fn has_question(&self) -> bool {
        !self.question.is_empty()
    }

    fn open(&mut self, question: &'a str, faqs: &mut Vec<FaqItem>) {
        self.flush(faqs);
        self.question = question;
        self.answer.clear();
    }

    fn continue_answer(&mut self, text: &'a str) {
        if self.has_question() {
            self.answer.push(text);
        }
    }

    /// Emits the pair if it has both a question and at least one answer line.
    fn flush(&mut self, faqs: &mut Vec<FaqItem>) {
        if self.has_question() && !self.answer.is_empty() {
            faqs.push(FaqItem {
                question: clean_question(self.question),
                answer: clean_answer(&self.answer.join("\n")),
            });
        }
        self.question = "";
        self.answer.clear();
    }
}

fn clean_question(question: &str) -> String {
    strip_inline_markup(question)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn clean_answer(answer: &str) -> String {
    let stripped = strip_inline_markup(answer);
    let mut out = String::with_capacity(stripped.len());
    for ch in stripped.chars() {
        if ch == '\n' && out.ends_with('\n') {
            continue;
        }
        out.push(ch);
    }
    out.trim().to_string()
}
