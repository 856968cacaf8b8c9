use tracing::trace;

use crate::ast::{Block, Document, NodeId};
use crate::inline;
use crate::lexer::{self, HtmlKind, SourceLine};
use crate::utils::cursor::{Cursor, TAB_STOP};

// Deepest container nesting. Markers past it are read as paragraph text, which
// keeps the tree shallow enough to render without exhausting the stack.
pub(crate) const MAX_DEPTH: usize = 100;

// Parse the lines of a document into a block tree. Leaf blocks keep their raw
// text; inline parsing is a separate pass.
pub(crate) fn parse_blocks(lines: &[SourceLine]) -> Document {
    let mut p = BlockParser::new();
    for l in lines {
        p.incorporate_line(&l.text);
    }
    p.finish()
}

// Per-node parse state, indexed like the document arena.
#[derive(Debug, Default, Clone)]
struct Meta {
    open: bool,
    start_line: usize,
    end_line: usize,
    // last line that added non-blank text to the block
    last_text_line: usize,
    // (fence character, fence length, indentation of the opening fence)
    fence: Option<(u8, usize, usize)>,
    // (indentation of the marker, width of marker plus following spaces)
    item: Option<(usize, usize)>,
    html: Option<HtmlKind>,
}

// Result of applying a container's continuation rule to a line.
enum Continuation {
    Matched,
    Unmatched,
    // The line closed the block and nothing is left to process.
    Finished,
}

// Result of trying to open new blocks at the cursor.
enum Start {
    None,
    Container,
    Leaf,
}

struct BlockParser {
    doc: Document,
    meta: Vec<Meta>,
    tip: NodeId,
    old_tip: NodeId,
    last_matched: NodeId,
    all_closed: bool,
    line_number: usize,
}

impl BlockParser {
    fn new() -> Self {
        BlockParser {
            doc: Document::new(),
            meta: vec![Meta {
                open: true,
                ..Meta::default()
            }],
            tip: Document::ROOT,
            old_tip: Document::ROOT,
            last_matched: Document::ROOT,
            all_closed: true,
            line_number: 0,
        }
    }

    fn kind(&self, id: NodeId) -> &Block {
        &self.doc.node(id).kind
    }

    fn is_paragraph(&self, id: NodeId) -> bool {
        matches!(self.kind(id), Block::Paragraph)
    }

    fn depth(&self, mut id: NodeId) -> usize {
        let mut depth = 0;
        while let Some(parent) = self.doc.node(id).parent {
            depth += 1;
            id = parent;
        }
        depth
    }

    fn accepts_lines(&self, id: NodeId) -> bool {
        matches!(
            self.kind(id),
            Block::Paragraph | Block::CodeBlock { .. } | Block::HtmlBlock
        )
    }

    fn parent(&self, id: NodeId) -> NodeId {
        self.doc.node(id).parent.unwrap_or(Document::ROOT)
    }

    fn incorporate_line(&mut self, line: &str) {
        let mut c = Cursor::new(line);
        let mut container = Document::ROOT;
        self.old_tip = self.tip;
        self.line_number += 1;

        // Walk the open blocks and check whether each one continues.
        while let Some(last) = self
            .doc
            .last_child(container)
            .filter(|id| self.meta[*id].open)
        {
            container = last;
            c.find_next_nonspace();
            match self.continuation(container, &mut c) {
                Continuation::Matched => {}
                Continuation::Unmatched => {
                    container = self.parent(container);
                    break;
                }
                Continuation::Finished => return,
            }
        }

        self.all_closed = container == self.old_tip;
        self.last_matched = container;

        let mut matched_leaf = !self.is_paragraph(container) && self.accepts_lines(container);
        while !matched_leaf {
            c.find_next_nonspace();
            if !c.is_indented() && !maybe_special(c.peek_nonspace()) {
                c.advance_next_nonspace();
                break;
            }
            match self.open_blocks(&mut container, &mut c) {
                Start::None => {
                    c.advance_next_nonspace();
                    break;
                }
                Start::Container => {}
                Start::Leaf => matched_leaf = true,
            }
        }

        // Lazy continuation of a paragraph whose containers did not match.
        if !self.all_closed && !c.is_blank() && self.is_paragraph(self.tip) {
            self.add_line(&c);
            return;
        }

        self.close_unmatched();
        if self.accepts_lines(container) {
            let fence_line = self.meta[container].fence.is_some()
                && self.meta[container].start_line == self.line_number;
            if !fence_line {
                self.add_line(&c);
            }
            let closes = self.meta[container]
                .html
                .map_or(false, |k| lexer::html_block_end(k, c.rest()));
            if closes {
                self.finalize(container, self.line_number);
            }
        } else if c.offset() < line.len() && !c.is_blank() {
            self.add_child(Block::Paragraph);
            c.advance_next_nonspace();
            self.add_line(&c);
        }
    }

    fn continuation(&mut self, id: NodeId, c: &mut Cursor) -> Continuation {
        match self.kind(id) {
            Block::Document | Block::List(_) => Continuation::Matched,
            Block::BlockQuote => {
                if !c.is_indented() && c.peek_nonspace() == Some(b'>') {
                    c.advance_next_nonspace();
                    c.advance(1, false);
                    if matches!(c.peek(), Some(b' ' | b'\t')) {
                        c.advance(1, true);
                    }
                    Continuation::Matched
                } else {
                    Continuation::Unmatched
                }
            }
            Block::Item(_) => {
                let (marker_offset, padding) = self.meta[id].item.unwrap_or((0, 0));
                if c.is_blank() {
                    if self.doc.node(id).children.is_empty() {
                        // an item can begin with at most one blank line
                        return Continuation::Unmatched;
                    }
                    c.advance_next_nonspace();
                    Continuation::Matched
                } else if c.indent() >= marker_offset + padding {
                    c.advance(marker_offset + padding, true);
                    Continuation::Matched
                } else {
                    Continuation::Unmatched
                }
            }
            Block::Heading { .. } | Block::ThematicBreak => Continuation::Unmatched,
            Block::CodeBlock { .. } => match self.meta[id].fence {
                Some((ch, len, offset)) => {
                    if !c.is_indented()
                        && c.peek_nonspace() == Some(ch)
                        && lexer::fence_close(c.rest_nonspace(), ch, len)
                    {
                        self.meta[id].last_text_line = self.line_number;
                        self.finalize(id, self.line_number);
                        return Continuation::Finished;
                    }
                    // skip the indentation the opening fence had
                    let mut i = offset;
                    while i > 0 && matches!(c.peek(), Some(b' ' | b'\t')) {
                        c.advance(1, true);
                        i -= 1;
                    }
                    Continuation::Matched
                }
                None => {
                    if c.is_indented() {
                        c.advance(TAB_STOP, true);
                        Continuation::Matched
                    } else if c.is_blank() {
                        c.advance_next_nonspace();
                        Continuation::Matched
                    } else {
                        Continuation::Unmatched
                    }
                }
            },
            Block::HtmlBlock => {
                let at_blank = self.meta[id].html.map_or(false, |k| k.ends_at_blank());
                if c.is_blank() && at_blank {
                    Continuation::Unmatched
                } else {
                    Continuation::Matched
                }
            }
            Block::Paragraph => {
                if c.is_blank() {
                    Continuation::Unmatched
                } else {
                    Continuation::Matched
                }
            }
        }
    }

    // Try each block start in precedence order at the cursor position.
    fn open_blocks(&mut self, container: &mut NodeId, c: &mut Cursor) -> Start {
        let rest = c.rest_nonspace();

        if !c.is_indented() {
            if self.is_paragraph(*container) {
                if let Some(level) = lexer::setext_underline(rest) {
                    self.close_unmatched();
                    if self.extract_references(*container) {
                        self.doc.node_mut(*container).kind = Block::Heading { level };
                        trace!(level, line = self.line_number, "setext heading");
                        c.advance_to_end();
                        return Start::Leaf;
                    }
                }
            }

            if lexer::thematic_break(rest) {
                self.close_unmatched();
                *container = self.add_child(Block::ThematicBreak);
                c.advance_to_end();
                return Start::Leaf;
            }

            if let Some((level, content)) = lexer::atx_heading(rest) {
                let content = content.to_string();
                self.close_unmatched();
                *container = self.add_child(Block::Heading { level });
                self.doc.node_mut(*container).content = content;
                c.advance_to_end();
                return Start::Leaf;
            }

            if let Some(fence) = lexer::fence_open(rest) {
                let indent = c.indent();
                self.close_unmatched();
                *container = self.add_child(Block::CodeBlock {
                    language: fence.language(),
                });
                self.meta[*container].fence = Some((fence.ch, fence.len, indent));
                c.advance_to_end();
                return Start::Leaf;
            }

            let in_paragraph = self.is_paragraph(*container)
                || (!self.all_closed && !c.is_blank() && self.is_paragraph(self.tip));
            if let Some(kind) = lexer::html_block_start(rest, in_paragraph) {
                self.close_unmatched();
                *container = self.add_child(Block::HtmlBlock);
                self.meta[*container].html = Some(kind);
                return Start::Leaf;
            }

            let room = self.depth(*container) < MAX_DEPTH;
            if room && c.peek_nonspace() == Some(b'>') {
                c.advance_next_nonspace();
                c.advance(1, false);
                if matches!(c.peek(), Some(b' ' | b'\t')) {
                    c.advance(1, true);
                }
                self.close_unmatched();
                *container = self.add_child(Block::BlockQuote);
                return Start::Container;
            }

            if room && self.open_list_item(container, c) {
                return Start::Container;
            }
        }

        if c.is_indented() && !self.is_paragraph(self.tip) && !c.is_blank() {
            c.advance(TAB_STOP, true);
            self.close_unmatched();
            *container = self.add_child(Block::CodeBlock { language: None });
            return Start::Leaf;
        }

        Start::None
    }

    fn open_list_item(&mut self, container: &mut NodeId, c: &mut Cursor) -> bool {
        let rest = c.rest_nonspace();
        let marker = match lexer::list_marker(rest) {
            Some(m) => m,
            None => return false,
        };
        if self.is_paragraph(*container) {
            // an ordered list interrupting a paragraph must start at 1,
            // and an empty item cannot interrupt one at all
            if marker.info.ordered && marker.info.start != 1 {
                return false;
            }
            if rest[marker.width..]
                .trim_matches(lexer::is_space_or_tab)
                .is_empty()
            {
                return false;
            }
        }

        let marker_offset = c.indent();
        c.advance_next_nonspace();
        c.advance(marker.width, true);
        let spaces_start_col = c.column();
        let spaces_start = c.mark();
        loop {
            c.advance(1, true);
            if c.column() - spaces_start_col >= 5 || !matches!(c.peek(), Some(b' ' | b'\t')) {
                break;
            }
        }
        let blank_item = c.peek().is_none();
        let spaces_after_marker = c.column() - spaces_start_col;
        let padding = if !(1..5).contains(&spaces_after_marker) || blank_item {
            // content starts one space after the marker, the rest is indentation
            c.reset(spaces_start);
            if matches!(c.peek(), Some(b' ' | b'\t')) {
                c.advance(1, true);
            }
            marker.width + 1
        } else {
            marker.width + spaces_after_marker
        };

        self.close_unmatched();
        let same_list =
            matches!(self.kind(*container), Block::List(info) if info.continues(&marker.info));
        if !same_list {
            *container = self.add_child(Block::List(marker.info));
        }
        *container = self.add_child(Block::Item(marker.info));
        self.meta[*container].item = Some((marker_offset, padding));
        true
    }

    // Append a block to the tip, closing blocks that cannot contain it.
    fn add_child(&mut self, kind: Block) -> NodeId {
        while !self.kind(self.tip).can_contain(&kind) {
            self.finalize(self.tip, self.line_number - 1);
        }
        trace!(?kind, line = self.line_number, "open block");
        let id = self.doc.append(self.tip, kind);
        self.meta.push(Meta {
            open: true,
            start_line: self.line_number,
            end_line: self.line_number,
            last_text_line: self.line_number,
            ..Meta::default()
        });
        self.tip = id;
        id
    }

    fn add_line(&mut self, c: &Cursor) {
        if !c.rest().trim_matches(lexer::is_space_or_tab).is_empty() {
            self.meta[self.tip].last_text_line = self.line_number;
        }
        let node = self.doc.node_mut(self.tip);
        if c.partial_tab() {
            let to_tab = TAB_STOP - c.column() % TAB_STOP;
            node.content.push_str(&" ".repeat(to_tab));
            node.content.push_str(&c.rest()[1..]);
        } else {
            node.content.push_str(c.rest());
        }
        node.content.push('\n');
    }

    fn close_unmatched(&mut self) {
        if self.all_closed {
            return;
        }
        while self.old_tip != self.last_matched {
            let parent = self.parent(self.old_tip);
            self.finalize(self.old_tip, self.line_number - 1);
            self.old_tip = parent;
        }
        self.all_closed = true;
    }

    fn finalize(&mut self, id: NodeId, line: usize) {
        let parent = self.doc.node(id).parent;
        self.meta[id].open = false;
        self.meta[id].end_line = line;

        match self.kind(id).clone() {
            Block::Paragraph => {
                if !self.extract_references(id) {
                    self.doc.detach(id);
                }
            }
            // trailing blank lines taken in by the block do not extend it
            Block::CodeBlock { .. } => {
                self.meta[id].end_line = self.meta[id].last_text_line;
                if self.meta[id].fence.is_none() {
                    let node = self.doc.node_mut(id);
                    node.content = strip_blank_tail(&node.content) + "\n";
                }
            }
            Block::HtmlBlock => {
                self.meta[id].end_line = self.meta[id].last_text_line;
                let node = self.doc.node_mut(id);
                node.content = strip_blank_tail(&node.content);
            }
            Block::Item(_) => {
                if let Some(last) = self.doc.last_child(id) {
                    self.meta[id].end_line = self.meta[last].end_line;
                } else {
                    self.meta[id].end_line = self.meta[id].start_line;
                }
            }
            Block::List(_) => {
                let tight = self.is_tight(id);
                self.doc.node_mut(id).tight = tight;
                if let Some(last) = self.doc.last_child(id) {
                    self.meta[id].end_line = self.meta[last].end_line;
                }
            }
            _ => {}
        }
        trace!(id, line, "close block");
        self.tip = parent.unwrap_or(Document::ROOT);
    }

    // A list is loose when any item, or any block directly inside an item, is
    // followed by a sibling after a blank line.
    fn is_tight(&self, list: NodeId) -> bool {
        let items = &self.doc.node(list).children;
        for (ix, item) in items.iter().enumerate() {
            if self.gap_before(*item, items.get(ix + 1)) {
                return false;
            }
            let blocks = &self.doc.node(*item).children;
            for (jx, b) in blocks.iter().enumerate() {
                if self.gap_before(*b, blocks.get(jx + 1)) {
                    return false;
                }
            }
        }
        true
    }

    fn gap_before(&self, id: NodeId, next: Option<&NodeId>) -> bool {
        next.map_or(false, |n| self.meta[id].end_line + 1 != self.meta[*n].start_line)
    }

    // Consume link reference definitions at the start of a paragraph. Returns
    // whether any content is left.
    fn extract_references(&mut self, id: NodeId) -> bool {
        let content = std::mem::take(&mut self.doc.node_mut(id).content);
        let mut pos = 0;
        while content[pos..].starts_with('[') {
            match inline::parse_reference(&content[pos..], &mut self.doc.references) {
                0 => break,
                n => pos += n,
            }
        }
        let rest = &content[pos..];
        let has_content = !rest.trim().is_empty();
        self.doc.node_mut(id).content = rest.to_string();
        has_content
    }

    fn finish(mut self) -> Document {
        while self.tip != Document::ROOT {
            self.finalize(self.tip, self.line_number);
        }
        self.doc
    }
}

// Characters that may begin a block other than a paragraph.
fn maybe_special(b: Option<u8>) -> bool {
    matches!(
        b,
        Some(b'#' | b'`' | b'~' | b'*' | b'+' | b'_' | b'=' | b'<' | b'>' | b'-' | b'0'..=b'9')
    )
}

// Drop trailing lines that hold only whitespace, and the final line break.
fn strip_blank_tail(s: &str) -> String {
    let mut lines: Vec<&str> = s.split('\n').collect();
    while lines
        .last()
        .map_or(false, |l| l.trim_matches(lexer::is_space_or_tab).is_empty())
    {
        lines.pop();
    }
    lines.join("\n")
}
