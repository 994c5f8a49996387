use regex::Regex;
use scraper::{ElementRef, Html};
use std::sync::LazyLock;

use crate::error::ExtractionError;
use crate::models::{NormalizedItem, RawItem};

/// Shorter excerpts carry no meaning worth classifying
pub const MIN_EXCERPT_CHARS: usize = 8;

const PARAGRAPH_BREAK: &str = "\n\n";

/// Elements that open and close a paragraph-equivalent block
const BLOCK_ELEMENTS: &[&str] = &[
    "p", "div", "li", "ul", "ol", "dl", "dt", "dd", "h1", "h2", "h3", "h4", "h5", "h6",
    "blockquote", "section", "article", "aside", "header", "footer", "figure", "figcaption",
    "table", "tr", "hr", "pre",
];

/// Elements whose text is never part of the story
const SKIPPED_ELEMENTS: &[&str] = &["script", "style", "noscript", "template", "iframe", "svg"];

static PARAGRAPH_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n[ \t\r\u{a0}]*\n").unwrap());

/// Turn a raw feed entry into its first-paragraph plain-text excerpt.
pub fn normalize(item: &RawItem) -> Result<NormalizedItem, ExtractionError> {
    let text = html_to_text(&item.summary_html);
    let excerpt = first_paragraph(&text).unwrap_or_default();

    if excerpt.chars().count() < MIN_EXCERPT_CHARS {
        return Err(ExtractionError::EmptyContent);
    }

    Ok(NormalizedItem {
        source_name: item.source_name.trim().to_string(),
        title: collapse_whitespace(&item.title),
        link: item.link.clone(),
        excerpt_text: excerpt,
    })
}

/// Strip markup, keeping block boundaries as blank lines
fn html_to_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let mut out = String::new();
    collect_text(fragment.root_element(), &mut out);
    out
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
            continue;
        }

        let Some(child_element) = ElementRef::wrap(child) else {
            continue;
        };
        let name = child_element.value().name();

        if SKIPPED_ELEMENTS.contains(&name) {
            continue;
        }
        // A lone <br> is a line break; two in a row end the paragraph
        if name == "br" {
            out.push('\n');
            continue;
        }

        let is_block = BLOCK_ELEMENTS.contains(&name);
        if is_block {
            out.push_str(PARAGRAPH_BREAK);
        }
        collect_text(child_element, out);
        if is_block {
            out.push_str(PARAGRAPH_BREAK);
        }
    }
}

fn first_paragraph(text: &str) -> Option<String> {
    PARAGRAPH_BOUNDARY
        .split(text)
        .map(collapse_whitespace)
        .find(|block| !block.is_empty())
}

pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
