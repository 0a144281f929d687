//! Main-content extraction from article HTML
//!
//! Picks the most likely article container and collects its visible text,
//! skipping navigation, chrome and script subtrees.

use scraper::{ElementRef, Html, Node, Selector};

/// Containers tried in order before falling back to `<body>`
const MAIN_SELECTORS: &[&str] = &[
    "article",
    "main",
    "[role='main']",
    "#content",
    ".post-content",
    ".entry-content",
    ".content",
];

/// Elements whose text never counts as article content
const SKIPPED_ELEMENTS: &[&str] = &[
    "script", "style", "noscript", "nav", "header", "footer", "aside", "iframe", "form", "svg",
    "template",
];

/// Elements that start a new run of text; inline markup joins its neighbours
const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "blockquote", "br", "dd", "div", "dl", "dt", "figcaption", "figure",
    "h1", "h2", "h3", "h4", "h5", "h6", "hr", "li", "main", "ol", "p", "pre", "section", "table",
    "td", "th", "tr", "ul",
];

/// Extract readable body text from an HTML document.
///
/// For each container selector, every match is considered and the one with
/// the most text wins. Selectors whose matches are all empty are skipped.
pub fn extract_main_text(html: &str) -> String {
    let document = Html::parse_document(html);

    let best = MAIN_SELECTORS
        .iter()
        .chain(std::iter::once(&"body"))
        .filter_map(|s| Selector::parse(s).ok())
        .find_map(|selector| {
            document
                .select(&selector)
                .map(element_text)
                .filter(|text| !text.is_empty())
                .max_by_key(|text| text.len())
        });

    best.unwrap_or_else(|| element_text(document.root_element()))
}

fn element_text(element: ElementRef<'_>) -> String {
    let mut text = String::new();
    collect_text(element, &mut text);
    collapse_whitespace(&text)
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) => {
                let name = el.name();
                if SKIPPED_ELEMENTS.contains(&name) {
                    continue;
                }
                let block = BLOCK_ELEMENTS.contains(&name);
                if block {
                    out.push(' ');
                }
                if let Some(child_element) = ElementRef::wrap(child) {
                    collect_text(child_element, out);
                }
                if block {
                    out.push(' ');
                }
            }
            _ => {}
        }
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
