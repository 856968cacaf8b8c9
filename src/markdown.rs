use tracing::debug;

use crate::ast::Document;
use crate::{html, inline, lexer, parser};

/// Convert a markdown document into an HTML fragment.
///
/// Every input is valid markdown, so this never fails.
///
/// ```
/// assert_eq!(mdhtml::to_html("# Medup"), "<h1>Medup</h1>\n");
/// ```
pub fn to_html(input: &str) -> String {
    render(&parse(input))
}

/// Parse markdown into a block tree with the inline content of every
/// paragraph and heading resolved.
pub fn parse(input: &str) -> Document {
    let lines = lexer::split_lines(input);
    let mut doc = parser::parse_blocks(&lines);

    // inline parsing runs once all reference definitions are known
    for id in doc.walk() {
        if !doc.node(id).kind.has_inlines() {
            continue;
        }
        let inlines = inline::parse_inlines(&doc.node(id).content, doc.references());
        doc.node_mut(id).inlines = inlines;
    }

    debug!(
        lines = lines.len(),
        nodes = doc.arena_len(),
        references = doc.references().len(),
        "parsed markdown"
    );
    doc
}

/// Render a parsed document as HTML.
pub fn render(doc: &Document) -> String {
    let out = html::render_document(doc);
    debug!(bytes = out.len(), "rendered html");
    out
}
