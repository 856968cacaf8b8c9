use std::collections::HashMap;

use crate::ast::{Inline, Reference, ReferenceMap};
use crate::utils::{self, stack::Stack};

// Parse the text of a paragraph or heading into inline nodes.
pub(crate) fn parse_inlines(text: &str, refs: &ReferenceMap) -> Vec<Inline> {
    let text = text.trim_matches(|c: char| c == ' ' || c == '\t' || c == '\n');
    InlineParser::new(text, refs).parse()
}

// The parser first produces a flat list of pieces. Delimiter runs record how
// they were matched, and the tree is built from that record at the end.
enum Piece {
    Text(String),
    Node(Inline),
    Delim {
        ch: u8,
        remaining: usize,
        // strengths of the emphasis this run opens, in match order
        opens: Vec<u8>,
        // number of emphasis nodes this run closes
        closes: usize,
    },
}

#[derive(Debug, Clone, Copy)]
struct Delimiter {
    piece: usize,
    ch: u8,
    // length of the run before any matching
    orig: usize,
    can_open: bool,
    can_close: bool,
    removed: bool,
}

#[derive(Debug, Clone, Copy)]
struct Bracket {
    piece: usize,
    // byte offset right after the '[' of this bracket
    label_start: usize,
    image: bool,
    active: bool,
    // delimiter stack height when the bracket was opened
    delim_bottom: usize,
}

struct InlineParser<'a> {
    text: &'a str,
    refs: &'a ReferenceMap,
    pos: usize,
    buf: String,
    pieces: Vec<Piece>,
    delims: Stack<Delimiter>,
    brackets: Stack<Bracket>,
}

impl<'a> InlineParser<'a> {
    fn new(text: &'a str, refs: &'a ReferenceMap) -> Self {
        InlineParser {
            text,
            refs,
            pos: 0,
            buf: String::new(),
            pieces: vec![],
            delims: Stack::new(),
            brackets: Stack::new(),
        }
    }

    fn parse(mut self) -> Vec<Inline> {
        let text = self.text;
        let bytes = text.as_bytes();
        while self.pos < bytes.len() {
            match bytes[self.pos] {
                b'\n' => self.newline(),
                b'\\' => self.backslash(),
                b'`' => self.code_span(),
                b'*' | b'_' => self.delim_run(),
                b'[' => self.open_bracket(false),
                b'!' if bytes.get(self.pos + 1) == Some(&b'[') => self.open_bracket(true),
                b']' => self.close_bracket(),
                b'<' => self.angle(),
                b'&' => self.entity(),
                _ => self.plain(),
            }
        }
        self.flush();
        self.process_emphasis(0);
        build(self.pieces)
    }

    fn flush(&mut self) {
        if !self.buf.is_empty() {
            self.pieces.push(Piece::Text(std::mem::take(&mut self.buf)));
        }
    }

    fn push_node(&mut self, node: Inline) {
        self.flush();
        self.pieces.push(Piece::Node(node));
    }

    fn skip_spaces(&mut self) {
        while self.text.as_bytes().get(self.pos) == Some(&b' ') {
            self.pos += 1;
        }
    }

    fn plain(&mut self) {
        let text = self.text;
        let rest = &text[self.pos..];
        let len = rest
            .bytes()
            .skip(1)
            .position(is_special)
            .map_or(rest.len(), |i| i + 1);
        self.buf.push_str(&rest[..len]);
        self.pos += len;
    }

    // Two or more trailing spaces make a hard break. Spaces around the line
    // ending are dropped either way.
    fn newline(&mut self) {
        self.pos += 1;
        let hard = self.buf.ends_with("  ");
        let trimmed = self.buf.trim_end_matches(' ').len();
        self.buf.truncate(trimmed);
        self.push_node(Inline::LineBreak { hard });
        self.skip_spaces();
    }

    fn backslash(&mut self) {
        match self.text[self.pos + 1..].chars().next() {
            Some('\n') => {
                self.pos += 2;
                self.push_node(Inline::LineBreak { hard: true });
                self.skip_spaces();
            }
            Some(c) if c.is_ascii_punctuation() => {
                self.buf.push(c);
                self.pos += 2;
            }
            _ => {
                self.buf.push('\\');
                self.pos += 1;
            }
        }
    }

    // A code span closes at the next backtick run of the same length. An
    // opening run with no match is literal text.
    fn code_span(&mut self) {
        let text = self.text;
        let rest = &text[self.pos..];
        let n = rest.bytes().take_while(|b| *b == b'`').count();
        let mut i = n;
        while let Some(off) = rest[i..].find('`') {
            let start = i + off;
            let len = rest[start..].bytes().take_while(|b| *b == b'`').count();
            if len == n {
                self.pos += start + len;
                self.push_node(Inline::CodeSpan(normalize_code(&rest[n..start])));
                return;
            }
            i = start + len;
        }
        self.buf.push_str(&rest[..n]);
        self.pos += n;
    }

    fn delim_run(&mut self) {
        let text = self.text;
        let ch = text.as_bytes()[self.pos];
        let count = text[self.pos..].bytes().take_while(|b| *b == ch).count();
        let before = text[..self.pos].chars().next_back().unwrap_or('\n');
        let after = text[self.pos + count..].chars().next().unwrap_or('\n');

        let (before_ws, after_ws) = (before.is_whitespace(), after.is_whitespace());
        let (before_punct, after_punct) =
            (utils::is_punctuation(before), utils::is_punctuation(after));
        let left = !after_ws && (!after_punct || before_ws || before_punct);
        let right = !before_ws && (!before_punct || after_ws || after_punct);
        let (can_open, can_close) = if ch == b'_' {
            (
                left && (!right || before_punct),
                right && (!left || after_punct),
            )
        } else {
            (left, right)
        };

        let run = &text[self.pos..self.pos + count];
        self.pos += count;
        if !can_open && !can_close {
            self.buf.push_str(run);
            return;
        }
        self.flush();
        self.delims.push(Delimiter {
            piece: self.pieces.len(),
            ch,
            orig: count,
            can_open,
            can_close,
            removed: false,
        });
        self.pieces.push(Piece::Delim {
            ch,
            remaining: count,
            opens: vec![],
            closes: 0,
        });
    }

    fn open_bracket(&mut self, image: bool) {
        self.flush();
        let marker = if image { "![" } else { "[" };
        self.brackets.push(Bracket {
            piece: self.pieces.len(),
            label_start: self.pos + marker.len(),
            image,
            active: true,
            delim_bottom: self.delims.len(),
        });
        self.pieces.push(Piece::Text(marker.to_string()));
        self.pos += marker.len();
    }

    fn close_bracket(&mut self) {
        let close = self.pos;
        self.pos += 1;
        let opener = match self.brackets.last() {
            Some(b) => *b,
            None => {
                self.buf.push(']');
                return;
            }
        };
        if !opener.active {
            self.brackets.pop();
            self.buf.push(']');
            return;
        }
        match self.link_target(opener.label_start, close) {
            Some((destination, title, end)) => {
                self.pos = end;
                self.make_link(opener, destination, title);
            }
            None => {
                self.brackets.pop();
                self.buf.push(']');
            }
        }
    }

    // Destination, title and end offset of the link whose text ends at `close`.
    fn link_target(
        &self,
        label_start: usize,
        close: usize,
    ) -> Option<(String, Option<String>, usize)> {
        let after = close + 1;
        let rest = &self.text[after..];
        if let Some((destination, title, len)) = inline_link(rest) {
            return Some((destination, title, after + len));
        }

        // full, collapsed and shortcut references
        let (label, end) = match link_label(rest) {
            Some((label, n)) if n > 2 => (label, after + n),
            Some((_, n)) => (&self.text[label_start..close], after + n),
            None => (&self.text[label_start..close], after),
        };
        if label.chars().count() > 999 {
            return None;
        }
        self.refs
            .get(&utils::normalize_label(label))
            .map(|r| (r.destination.clone(), r.title.clone(), end))
    }

    fn make_link(&mut self, opener: Bracket, destination: String, title: Option<String>) {
        self.brackets.pop();
        self.flush();
        self.process_emphasis(opener.delim_bottom);
        let inner = self.pieces.split_off(opener.piece + 1);
        self.pieces.pop();
        let children = build(inner);

        if opener.image {
            let mut alt = String::new();
            children.iter().for_each(|c| c.plain_text(&mut alt));
            self.pieces.push(Piece::Node(Inline::Image {
                destination,
                alt,
                title,
            }));
        } else {
            self.pieces.push(Piece::Node(Inline::Link {
                destination,
                title,
                children,
            }));
            // links may not contain other links
            self.brackets.update_where(|b| !b.image, |b| b.active = false);
        }
    }

    // Autolink, raw HTML, or a literal '<'.
    fn angle(&mut self) {
        let text = self.text;
        let rest = &text[self.pos..];
        if let Some(caps) = utils::AUTOLINK_URI_RE.captures(rest) {
            let uri = caps[1].to_string();
            self.pos += caps[0].len();
            self.push_node(Inline::Link {
                destination: uri.clone(),
                title: None,
                children: vec![Inline::Text(uri)],
            });
            return;
        }
        if let Some(caps) = utils::AUTOLINK_EMAIL_RE.captures(rest) {
            if utils::is_email(&caps[1]) {
                let email = caps[1].to_string();
                self.pos += caps[0].len();
                self.push_node(Inline::Link {
                    destination: format!("mailto:{}", email),
                    title: None,
                    children: vec![Inline::Text(email)],
                });
                return;
            }
        }
        if let Some(m) = utils::HTML_TAG_RE.find(rest) {
            self.pos += m.end();
            self.push_node(Inline::RawHtml(m.as_str().to_string()));
            return;
        }
        self.buf.push('<');
        self.pos += 1;
    }

    // A character reference becomes the character it names. Unknown names
    // stay literal text.
    fn entity(&mut self) {
        let text = self.text;
        match utils::ENTITY_RE.find(&text[self.pos..]) {
            Some(m) => {
                self.pos += m.end();
                match utils::decode_entity(m.as_str()) {
                    Some(decoded) => self.buf.push_str(&decoded),
                    None => self.buf.push_str(m.as_str()),
                }
            }
            None => {
                self.buf.push('&');
                self.pos += 1;
            }
        }
    }

    fn remaining(&self, ix: usize) -> usize {
        let piece = self.delims.get(ix).map(|d| d.piece);
        match piece.and_then(|p| self.pieces.get(p)) {
            Some(Piece::Delim { remaining, .. }) => *remaining,
            _ => 0,
        }
    }

    fn consume(&mut self, ix: usize, n: usize, as_opener: bool) {
        let piece = self.delims.get(ix).map(|d| d.piece);
        if let Some(Piece::Delim {
            remaining,
            opens,
            closes,
            ..
        }) = piece.and_then(|p| self.pieces.get_mut(p))
        {
            *remaining -= n;
            if as_opener {
                opens.push(n as u8);
            } else {
                *closes += 1;
            }
        }
    }

    fn remove_delim(&mut self, ix: usize) {
        if let Some(d) = self.delims.get_mut(ix) {
            d.removed = true;
        }
    }

    // Match closers against openers for every delimiter above `bottom`, then
    // drop those delimiters from the stack.
    fn process_emphasis(&mut self, bottom: usize) {
        let mut openers_bottom: HashMap<(u8, bool, usize), usize> = HashMap::new();
        let mut closer = bottom;
        while closer < self.delims.len() {
            let c = match self.delims.get(closer) {
                Some(d) => *d,
                None => break,
            };
            if c.removed || !c.can_close {
                closer += 1;
                continue;
            }

            let key = (c.ch, c.can_open, c.orig % 3);
            let floor = openers_bottom.get(&key).copied().unwrap_or(bottom).max(bottom);
            let opener = (floor..closer).rev().find(|ix| {
                self.delims.get(*ix).map_or(false, |o| {
                    // a run that can both open and close may not pair up to a
                    // multiple of 3 unless both lengths are
                    let odd_match = (c.can_open || o.can_close)
                        && c.orig % 3 != 0
                        && (o.orig + c.orig) % 3 == 0;
                    !o.removed && o.ch == c.ch && o.can_open && !odd_match
                })
            });

            match opener {
                Some(o) => {
                    let used = if self.remaining(o) >= 2 && self.remaining(closer) >= 2 {
                        2
                    } else {
                        1
                    };
                    self.consume(o, used, true);
                    self.consume(closer, used, false);
                    for ix in o + 1..closer {
                        self.remove_delim(ix);
                    }
                    if self.remaining(o) == 0 {
                        self.remove_delim(o);
                    }
                    if self.remaining(closer) == 0 {
                        self.remove_delim(closer);
                        closer += 1;
                    }
                }
                None => {
                    openers_bottom.insert(key, closer);
                    if !c.can_open {
                        self.remove_delim(closer);
                    }
                    closer += 1;
                }
            }
        }
        self.delims.truncate(bottom);
    }
}

fn is_special(b: u8) -> bool {
    matches!(
        b,
        b'\n' | b'\\' | b'`' | b'*' | b'_' | b'[' | b'!' | b']' | b'<' | b'&'
    )
}

// Line endings become spaces, and one space is stripped from both ends when
// both are present and the content is not all spaces.
fn normalize_code(s: &str) -> String {
    let s = s.replace('\n', " ");
    if s.len() >= 2 && s.starts_with(' ') && s.ends_with(' ') && s.bytes().any(|b| b != b' ') {
        s[1..s.len() - 1].to_string()
    } else {
        s
    }
}

fn push_text(out: &mut Vec<Inline>, s: &str) {
    if let Some(Inline::Text(last)) = out.last_mut() {
        last.push_str(s);
    } else {
        out.push(Inline::Text(s.to_string()));
    }
}

// Deepest emphasis nesting. Matched runs below it are kept as literal text.
pub(crate) const MAX_EMPHASIS_DEPTH: usize = 50;

// An emphasis being built: its delimiter, strength and children so far.
struct Frame {
    ch: u8,
    strength: u8,
    children: Vec<Inline>,
}

// Turn the flat pieces into a tree, opening and closing emphasis where the
// delimiter runs were matched. Unused delimiter characters stay as text.
fn build(pieces: Vec<Piece>) -> Vec<Inline> {
    let mut out: Vec<Inline> = vec![];
    let mut frames: Vec<Frame> = vec![];

    fn current<'f>(out: &'f mut Vec<Inline>, frames: &'f mut [Frame]) -> &'f mut Vec<Inline> {
        match frames.last_mut() {
            Some(f) => &mut f.children,
            None => out,
        }
    }

    fn close(out: &mut Vec<Inline>, frames: &mut Vec<Frame>) {
        let frame = match frames.pop() {
            Some(f) => f,
            None => return,
        };
        let too_deep = frames.len() >= MAX_EMPHASIS_DEPTH;
        let parent = current(out, frames);
        if too_deep {
            let marker = (frame.ch as char).to_string().repeat(frame.strength as usize);
            push_text(parent, &marker);
            for child in frame.children {
                match child {
                    Inline::Text(s) => push_text(parent, &s),
                    other => parent.push(other),
                }
            }
            push_text(parent, &marker);
        } else {
            parent.push(Inline::Emphasis {
                strength: frame.strength,
                children: frame.children,
            });
        }
    }

    for p in pieces {
        match p {
            Piece::Text(s) => push_text(current(&mut out, &mut frames), &s),
            Piece::Node(n) => current(&mut out, &mut frames).push(n),
            Piece::Delim {
                ch,
                remaining,
                opens,
                closes,
            } => {
                for _ in 0..closes {
                    close(&mut out, &mut frames);
                }
                if remaining > 0 {
                    let run = (ch as char).to_string().repeat(remaining);
                    push_text(current(&mut out, &mut frames), &run);
                }
                for strength in opens.iter().rev() {
                    frames.push(Frame {
                        ch,
                        strength: *strength,
                        children: vec![],
                    });
                }
            }
        }
    }
    while !frames.is_empty() {
        close(&mut out, &mut frames);
    }
    out
}

// Leading spaces, tabs and line endings.
fn skip_whitespace(s: &str) -> usize {
    s.bytes()
        .take_while(|b| matches!(b, b' ' | b'\t' | b'\n'))
        .count()
}

// `[label]`: returns the label and the length including both brackets.
fn link_label(s: &str) -> Option<(&str, usize)> {
    if !s.starts_with('[') {
        return None;
    }
    let bytes = s.as_bytes();
    let mut i = 1;
    while i < bytes.len() && i <= 1000 {
        match bytes[i] {
            b'\\' => i += 2,
            b'[' => return None,
            b']' => return Some((&s[1..i], i + 1)),
            _ => i += 1,
        }
    }
    None
}

fn link_destination(s: &str) -> Option<(String, usize)> {
    let bytes = s.as_bytes();
    if bytes.first() == Some(&b'<') {
        let mut i = 1;
        while i < bytes.len() {
            match bytes[i] {
                b'\\' => i += 2,
                b'>' => return Some((utils::unescape(&s[1..i]), i + 1)),
                b'\n' | b'<' => return None,
                _ => i += 1,
            }
        }
        return None;
    }

    // parentheses must balance in a bare destination
    let mut depth = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' if bytes.get(i + 1).map_or(false, |b| b.is_ascii_punctuation()) => i += 2,
            b'(' => {
                depth += 1;
                i += 1;
            }
            b')' if depth == 0 => break,
            b')' => {
                depth -= 1;
                i += 1;
            }
            b if b <= b' ' || b == 0x7f => break,
            _ => i += 1,
        }
    }
    if depth != 0 {
        return None;
    }
    Some((utils::unescape(&s[..i]), i))
}

fn link_title(s: &str) -> Option<(String, usize)> {
    let bytes = s.as_bytes();
    let close = match bytes.first()? {
        b'"' => b'"',
        b'\'' => b'\'',
        b'(' => b')',
        _ => return None,
    };
    let mut i = 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b if b == close => return Some((utils::unescape(&s[1..i]), i + 1)),
            b'(' if close == b')' => return None,
            _ => i += 1,
        }
    }
    None
}

// `(destination "title")` right after the closing bracket of a link text.
fn inline_link(s: &str) -> Option<(String, Option<String>, usize)> {
    if !s.starts_with('(') {
        return None;
    }
    let mut pos = 1 + skip_whitespace(&s[1..]);
    let (destination, len) = link_destination(&s[pos..])?;
    pos += len;

    let ws = skip_whitespace(&s[pos..]);
    pos += ws;
    let title = if ws > 0 {
        link_title(&s[pos..]).map(|(t, n)| {
            pos += n;
            t
        })
    } else {
        None
    };
    pos += skip_whitespace(&s[pos..]);
    if s[pos..].starts_with(')') {
        Some((destination, title, pos + 1))
    } else {
        None
    }
}

// Spaces and tabs up to the end of the line, with the line ending itself.
fn line_end(s: &str) -> Option<usize> {
    let n = s.bytes().take_while(|b| *b == b' ' || *b == b'\t').count();
    match s.as_bytes().get(n) {
        None => Some(n),
        Some(b'\n') => Some(n + 1),
        _ => None,
    }
}

// Parse one link reference definition at the start of `s`. Returns the number
// of bytes consumed, or 0 if `s` does not start with a definition. The first
// definition of a label wins.
pub(crate) fn parse_reference(s: &str, refs: &mut ReferenceMap) -> usize {
    let (label, mut pos) = match link_label(s) {
        Some(l) => l,
        None => return 0,
    };
    if label.trim().is_empty() || !s[pos..].starts_with(':') {
        return 0;
    }
    pos += 1;
    pos += skip_whitespace(&s[pos..]);
    let (destination, len) = match link_destination(&s[pos..]) {
        Some((d, n)) if n > 0 => (d, n),
        _ => return 0,
    };
    pos += len;

    let dest_end = pos;
    let ws = skip_whitespace(&s[pos..]);
    let mut title = None;
    if ws > 0 {
        if let Some((t, n)) = link_title(&s[pos + ws..]) {
            let end = pos + ws + n;
            if let Some(eol) = line_end(&s[end..]) {
                title = Some(t);
                pos = end + eol;
            }
        }
    }
    if title.is_none() {
        // the title did not parse, or left junk on its line
        match line_end(&s[dest_end..]) {
            Some(eol) => pos = dest_end + eol,
            None => return 0,
        }
    }

    refs.entry(utils::normalize_label(label))
        .or_insert(Reference { destination, title });
    pos
}
