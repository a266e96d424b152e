//! Provider content normalisation.
//!
//! Search providers return either plain-text snippets or raw page content
//! that may still contain markup. [`normalize_content`] turns both into
//! clean readable text suitable for token budgeting. Markup is parsed once;
//! text under boilerplate elements is skipped while walking `<body>`.

use scraper::{ElementRef, Html, Selector};

/// Default maximum characters kept from a single document.
pub const DEFAULT_MAX_CHARS: usize = 100_000;

/// Elements whose content is never part of readable text.
const BOILERPLATE_TAGS: &[&str] = &[
    "script", "style", "nav", "footer", "header", "aside", "noscript", "svg", "iframe",
];

/// Tag prefixes that mark a string as HTML rather than prose.
const MARKUP_HINTS: &[&str] = &[
    "<html", "<body", "<div", "<p>", "<p ", "<br", "<span", "<article", "<main", "<a ", "<li",
    "<h1", "<h2", "<h3", "<table", "<script", "<style", "</",
];

/// Normalise provider content into readable text of at most `max_chars` bytes.
///
/// Markup is detected heuristically; plain text only has its whitespace
/// collapsed. Returns an empty string when nothing readable remains.
pub fn normalize_content(raw: &str, max_chars: usize) -> String {
    let text = if looks_like_html(raw) {
        readable_text(&Html::parse_document(raw))
    } else {
        raw.to_owned()
    };

    truncate_to_limit(&collapse_whitespace(&text), max_chars)
}

/// Extract the `<title>` of an HTML document, empty when absent or not HTML.
pub fn extract_title(raw: &str) -> String {
    if !looks_like_html(raw) {
        return String::new();
    }
    let document = Html::parse_document(raw);
    let title = first_match(&document, "title")
        .map(|el| el.text().collect::<String>())
        .unwrap_or_default();
    collapse_whitespace(&title)
}

fn looks_like_html(raw: &str) -> bool {
    if !raw.contains('<') || !raw.contains('>') {
        return false;
    }
    let lower = raw.to_lowercase();
    MARKUP_HINTS.iter().any(|hint| lower.contains(hint))
}

fn first_match<'a>(document: &'a Html, css: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(css).ok()?;
    document.select(&selector).next()
}

/// Text nodes under `<body>` that sit outside every boilerplate element.
fn readable_text(document: &Html) -> String {
    let root = first_match(document, "body").unwrap_or_else(|| document.root_element());

    let pieces: Vec<&str> = root
        .descendants()
        .filter_map(|node| {
            let text = node.value().as_text()?;
            let in_boilerplate = node.ancestors().any(|ancestor| {
                ancestor
                    .value()
                    .as_element()
                    .is_some_and(|el| BOILERPLATE_TAGS.contains(&el.name()))
            });
            (!in_boilerplate).then_some(&**text)
        })
        .collect();
    pieces.join(" ")
}

/// One space between words; blank-line runs shrink to a single blank line.
fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_blank = false;

    for line in text.lines() {
        let mut words = line.split_whitespace().peekable();
        if words.peek().is_none() {
            pending_blank = !out.is_empty();
            continue;
        }
        if !out.is_empty() {
            out.push_str(if pending_blank { "\n\n" } else { "\n" });
        }
        pending_blank = false;
        for (i, word) in words.enumerate() {
            if i > 0 {
                out.push(' ');
            }
            out.push_str(word);
        }
    }
    out
}

/// Truncate at a char boundary, backing off to the last whitespace so no
/// word is cut in half.
fn truncate_to_limit(text: &str, max_chars: usize) -> String {
    if text.len() <= max_chars {
        return text.to_owned();
    }

    let mut end = max_chars;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }

    let head = &text[..end];
    match head.rfind(char::is_whitespace) {
        Some(ws) if ws > 0 => head[..ws].trim_end().to_owned(),
        _ => head.to_owned(),
    }
}
