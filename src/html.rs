use crate::ast::{Block, Document, Inline, NodeId};
use crate::utils::{escape_html, filter_html, normalize_url};

// Render a parsed document as an HTML fragment. Block tags go on their own
// lines, and the output ends with a newline unless it is empty.
pub(crate) fn render_document(doc: &Document) -> String {
    let mut w = HtmlWriter {
        doc,
        out: String::new(),
    };
    w.children(Document::ROOT);
    w.out
}

struct HtmlWriter<'writer> {
    doc: &'writer Document,
    out: String,
}

impl<'writer> HtmlWriter<'writer> {
    // Start a new line unless the output is empty or already on one.
    fn cr(&mut self) {
        if !self.out.is_empty() && !self.out.ends_with('\n') {
            self.out.push('\n');
        }
    }

    fn children(&mut self, id: NodeId) {
        let doc = self.doc;
        for child in &doc.node(id).children {
            self.block(*child);
        }
    }

    // Paragraphs directly inside the items of a tight list lose their <p>.
    fn in_tight_list(&self, id: NodeId) -> bool {
        let parent = self.doc.node(id).parent;
        let grandparent = parent.and_then(|p| self.doc.node(p).parent);
        grandparent.map_or(false, |g| {
            let list = self.doc.node(g);
            matches!(list.kind, Block::List(_)) && list.tight
        })
    }

    fn block(&mut self, id: NodeId) {
        let doc = self.doc;
        let node = doc.node(id);
        match &node.kind {
            Block::Document => self.children(id),
            Block::Paragraph => {
                if self.in_tight_list(id) {
                    self.inlines(&node.inlines);
                } else {
                    self.cr();
                    self.out.push_str("<p>");
                    self.inlines(&node.inlines);
                    self.out.push_str("</p>");
                    self.cr();
                }
            }
            Block::Heading { level } => {
                self.cr();
                self.out.push_str(&format!("<h{}>", level));
                self.inlines(&node.inlines);
                self.out.push_str(&format!("</h{}>", level));
                self.cr();
            }
            Block::BlockQuote => {
                self.cr();
                self.out.push_str("<blockquote>");
                self.cr();
                self.children(id);
                self.cr();
                self.out.push_str("</blockquote>");
                self.cr();
            }
            Block::List(info) => {
                let tag = if info.ordered { "ol" } else { "ul" };
                self.cr();
                if info.ordered && info.start != 1 {
                    self.out.push_str(&format!("<ol start=\"{}\">", info.start));
                } else {
                    self.out.push_str(&format!("<{}>", tag));
                }
                self.cr();
                self.children(id);
                self.cr();
                self.out.push_str(&format!("</{}>", tag));
                self.cr();
            }
            Block::Item(_) => {
                self.out.push_str("<li>");
                self.children(id);
                self.out.push_str("</li>");
                self.cr();
            }
            Block::CodeBlock { language } => {
                self.cr();
                match language {
                    Some(lang) => self
                        .out
                        .push_str(&format!("<pre><code class=\"language-{}\">", escape_html(lang))),
                    None => self.out.push_str("<pre><code>"),
                }
                self.out.push_str(&escape_html(&node.content));
                self.out.push_str("</code></pre>");
                self.cr();
            }
            Block::ThematicBreak => {
                self.cr();
                self.out.push_str("<hr />");
                self.cr();
            }
            Block::HtmlBlock => {
                self.cr();
                self.out.push_str(&filter_html(&node.content));
                self.cr();
            }
        }
    }

    fn inlines(&mut self, inlines: &[Inline]) {
        for i in inlines {
            self.inline(i);
        }
    }

    fn inline(&mut self, i: &Inline) {
        match i {
            Inline::Text(s) => self.out.push_str(&escape_html(s)),
            Inline::Emphasis { strength, children } => {
                let tag = if *strength >= 2 { "strong" } else { "em" };
                self.out.push_str(&format!("<{}>", tag));
                self.inlines(children);
                self.out.push_str(&format!("</{}>", tag));
            }
            Inline::CodeSpan(code) => {
                self.out.push_str("<code>");
                self.out.push_str(&escape_html(code));
                self.out.push_str("</code>");
            }
            Inline::Link {
                destination,
                title,
                children,
            } => {
                self.out.push_str("<a href=\"");
                self.out.push_str(&escape_html(&normalize_url(destination)));
                self.out.push('"');
                self.title(title);
                self.out.push('>');
                self.inlines(children);
                self.out.push_str("</a>");
            }
            Inline::Image {
                destination,
                alt,
                title,
            } => {
                self.out.push_str("<img src=\"");
                self.out.push_str(&escape_html(&normalize_url(destination)));
                self.out.push_str("\" alt=\"");
                self.out.push_str(&escape_html(alt));
                self.out.push('"');
                self.title(title);
                self.out.push_str(" />");
            }
            Inline::RawHtml(html) => self.out.push_str(&filter_html(html)),
            Inline::LineBreak { hard: true } => self.out.push_str("<br />\n"),
            Inline::LineBreak { hard: false } => self.out.push('\n'),
        }
    }

    fn title(&mut self, title: &Option<String>) {
        if let Some(t) = title {
            self.out.push_str(" title=\"");
            self.out.push_str(&escape_html(t));
            self.out.push('"');
        }
    }
}
