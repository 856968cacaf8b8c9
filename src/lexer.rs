use lazy_static::lazy_static;
use regex::Regex;

use crate::ast::ListInfo;
use crate::utils::{self, cursor::TAB_STOP};

// SourceLine is one logical line of the input, without its line terminator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine {
    pub text: String,
    /// Width of the leading whitespace, tabs expanded to the next multiple of 4.
    pub indent: usize,
    pub blank: bool,
}

impl SourceLine {
    pub fn new(text: String) -> Self {
        let mut indent = 0;
        let mut blank = true;
        for ch in text.chars() {
            match ch {
                ' ' => indent += 1,
                '\t' => indent += TAB_STOP - indent % TAB_STOP,
                _ => {
                    blank = false;
                    break;
                }
            }
        }
        SourceLine {
            text,
            indent,
            blank,
        }
    }
}

/// Split the input into lines on `\n` and `\r\n`.
///
/// A terminator at the very end does not start another line, so empty input
/// gives no lines at all.
pub fn split_lines(input: &str) -> Vec<SourceLine> {
    if input.is_empty() {
        return vec![];
    }
    let text = if input.contains('\0') {
        input.replace('\0', "\u{FFFD}")
    } else {
        input.to_string()
    };
    let body = text.strip_suffix('\n').unwrap_or(&text);
    body.split('\n')
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
        .map(|l| SourceLine::new(l.to_string()))
        .collect()
}

pub(crate) fn is_space_or_tab(ch: char) -> bool {
    ch == ' ' || ch == '\t'
}

// The scanners below look at the rest of a line starting at its first
// non-space character. The caller has already ruled out indented code.

// Three or more '*', '-' or '_' of one kind, optionally separated by spaces.
pub(crate) fn thematic_break(s: &str) -> bool {
    let mut mark: Option<char> = None;
    let mut count = 0;
    for ch in s.chars() {
        match ch {
            ' ' | '\t' => continue,
            '*' | '-' | '_' if mark.map_or(true, |m| m == ch) => {
                mark = Some(ch);
                count += 1;
            }
            _ => return false,
        }
    }
    count >= 3
}

// '#' x 1..6 followed by a space, a tab or the end of the line. Returns the
// level and the content without the optional closing sequence.
pub(crate) fn atx_heading(s: &str) -> Option<(u8, &str)> {
    let level = s.bytes().take_while(|b| *b == b'#').count();
    if level == 0 || level > 6 {
        return None;
    }
    let rest = &s[level..];
    if !rest.is_empty() && !rest.starts_with(is_space_or_tab) {
        return None;
    }
    let content = rest.trim_matches(is_space_or_tab);
    let unclosed = content.trim_end_matches('#');
    let content = if unclosed.is_empty() {
        unclosed
    } else if unclosed.ends_with(is_space_or_tab) {
        unclosed.trim_end_matches(is_space_or_tab)
    } else {
        content
    };
    Some((level as u8, content))
}

// Fence is the opening line of a fenced code block.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct Fence {
    pub ch: u8,
    pub len: usize,
    pub info: String,
}

impl Fence {
    // The first word of the info string.
    pub(crate) fn language(&self) -> Option<String> {
        self.info.split_whitespace().next().map(|s| s.to_string())
    }
}

pub(crate) fn fence_open(s: &str) -> Option<Fence> {
    let ch = *s.as_bytes().first()?;
    if ch != b'`' && ch != b'~' {
        return None;
    }
    let len = s.bytes().take_while(|b| *b == ch).count();
    if len < 3 {
        return None;
    }
    let info = s[len..].trim_matches(is_space_or_tab);
    if ch == b'`' && info.contains('`') {
        return None;
    }
    Some(Fence {
        ch,
        len,
        info: utils::unescape(info),
    })
}

// A closing fence uses the opening character, is at least as long, and
// carries nothing but trailing whitespace.
pub(crate) fn fence_close(s: &str, ch: u8, min_len: usize) -> bool {
    let len = s.bytes().take_while(|b| *b == ch).count();
    len >= min_len && s[len..].trim_matches(is_space_or_tab).is_empty()
}

// ListMarker is a bullet or ordered list marker at the start of a line.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct ListMarker {
    pub info: ListInfo,
    /// Byte width of the marker itself.
    pub width: usize,
}

pub(crate) fn list_marker(s: &str) -> Option<ListMarker> {
    let bytes = s.as_bytes();
    let (info, width) = match *bytes.first()? {
        b @ (b'-' | b'*' | b'+') => (
            ListInfo {
                ordered: false,
                start: 1,
                marker: b as char,
            },
            1,
        ),
        b'0'..=b'9' => {
            let digits = bytes.iter().take_while(|b| b.is_ascii_digit()).count();
            if digits > 9 {
                return None;
            }
            let delim = match bytes.get(digits) {
                Some(d @ (b'.' | b')')) => *d as char,
                _ => return None,
            };
            let start: u32 = s[..digits].parse().ok()?;
            (
                ListInfo {
                    ordered: true,
                    start,
                    marker: delim,
                },
                digits + 1,
            )
        }
        _ => return None,
    };
    match bytes.get(width) {
        None | Some(b' ') | Some(b'\t') => Some(ListMarker { info, width }),
        _ => None,
    }
}

// '=' underlines make level 1 headings, '-' underlines level 2.
pub(crate) fn setext_underline(s: &str) -> Option<u8> {
    let ch = *s.as_bytes().first()?;
    let level = match ch {
        b'=' => 1,
        b'-' => 2,
        _ => return None,
    };
    let n = s.bytes().take_while(|b| *b == ch).count();
    if s[n..].trim_matches(is_space_or_tab).is_empty() {
        Some(level)
    } else {
        None
    }
}

// The seven kinds of HTML block, by the condition that started them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum HtmlKind {
    Raw,
    Comment,
    Processing,
    Declaration,
    Cdata,
    Block,
    Tag,
}

impl HtmlKind {
    // Kinds 6 and 7 run until a blank line, the others until an end marker.
    pub(crate) fn ends_at_blank(&self) -> bool {
        matches!(self, HtmlKind::Block | HtmlKind::Tag)
    }
}

lazy_static! {
    static ref HTML_RAW_OPEN_RE: Regex =
        Regex::new(r"(?i)^<(?:script|pre|textarea|style)(?:\s|>|$)").unwrap();
    static ref HTML_BLOCK_OPEN_RE: Regex = Regex::new(
        r"(?i)^</?(?:address|article|aside|base|basefont|blockquote|body|caption|center|col|colgroup|dd|details|dialog|dir|div|dl|dt|fieldset|figcaption|figure|footer|form|frame|frameset|h[1-6]|head|header|hr|html|iframe|legend|li|link|main|menu|menuitem|nav|noframes|ol|optgroup|option|p|param|search|section|summary|table|tbody|td|tfoot|th|thead|title|tr|track|ul)(?:\s|/?>|$)"
    )
    .unwrap();
    static ref HTML_TAG_LINE_RE: Regex =
        Regex::new(&format!(r"^(?:{}|{})\s*$", utils::OPEN_TAG, utils::CLOSE_TAG)).unwrap();
    static ref HTML_RAW_CLOSE_RE: Regex =
        Regex::new(r"(?i)</(?:script|pre|textarea|style)>").unwrap();
}

// `s` starts at the '<'. Kind 7 cannot interrupt a paragraph.
pub(crate) fn html_block_start(s: &str, in_paragraph: bool) -> Option<HtmlKind> {
    if !s.starts_with('<') {
        return None;
    }
    if HTML_RAW_OPEN_RE.is_match(s) {
        Some(HtmlKind::Raw)
    } else if s.starts_with("<!--") {
        Some(HtmlKind::Comment)
    } else if s.starts_with("<?") {
        Some(HtmlKind::Processing)
    } else if s.starts_with("<![CDATA[") {
        Some(HtmlKind::Cdata)
    } else if s.len() > 2 && s.starts_with("<!") && s.as_bytes()[2].is_ascii_alphabetic() {
        Some(HtmlKind::Declaration)
    } else if HTML_BLOCK_OPEN_RE.is_match(s) {
        Some(HtmlKind::Block)
    } else if !in_paragraph && HTML_TAG_LINE_RE.is_match(s) {
        Some(HtmlKind::Tag)
    } else {
        None
    }
}

// Whether `line` contains the end marker of an HTML block of `kind`.
pub(crate) fn html_block_end(kind: HtmlKind, line: &str) -> bool {
    match kind {
        HtmlKind::Raw => HTML_RAW_CLOSE_RE.is_match(line),
        HtmlKind::Comment => line.contains("-->"),
        HtmlKind::Processing => line.contains("?>"),
        HtmlKind::Declaration => line.contains('>'),
        HtmlKind::Cdata => line.contains("]]>"),
        HtmlKind::Block | HtmlKind::Tag => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_lines() {
        let lines = split_lines("a\r\n  b\n\n\tc\n");
        assert_eq!(
            lines,
            vec![
                SourceLine::new("a".to_string()),
                SourceLine::new("  b".to_string()),
                SourceLine::new("".to_string()),
                SourceLine::new("\tc".to_string()),
            ]
        );
        assert_eq!(lines[1].indent, 2);
        assert!(lines[2].blank);
        assert_eq!(lines[3].indent, 4);

        assert!(split_lines("").is_empty());
        assert_eq!(split_lines("x").len(), 1);
        assert_eq!(split_lines("\n").len(), 1);
        assert_eq!(split_lines("a\0b")[0].text, "a\u{FFFD}b");
    }

    #[test]
    fn test_indent_width() {
        let contents = vec![("", 0), ("    ", 4), (" \t", 4), ("  \t  x", 6), ("x", 0)];
        for (s, w) in contents {
            assert_eq!(SourceLine::new(s.to_string()).indent, w, "{:?}", s);
        }
        assert!(SourceLine::new(" \t ".to_string()).blank);
        assert!(!SourceLine::new(" x".to_string()).blank);
    }

    #[test]
    fn test_thematic_break() {
        let marks = vec!["---", "***", "___", "- - -", "*  *  *  *", "_____________", "-\t-\t-"];
        for mark in marks {
            assert!(thematic_break(mark), "{}", mark);
        }
        let contents = vec!["--", "-*-", "--- x", "---a", "+++", "==="];
        for cnt in contents {
            assert!(!thematic_break(cnt), "{}", cnt);
        }
    }

    #[test]
    fn test_atx_heading() {
        assert_eq!(atx_heading("# Title"), Some((1, "Title")));
        assert_eq!(atx_heading("###### six"), Some((6, "six")));
        assert_eq!(atx_heading("####### seven"), None);
        assert_eq!(atx_heading("#hashtag"), None);
        assert_eq!(atx_heading("#"), Some((1, "")));
        assert_eq!(atx_heading("## foo ##"), Some((2, "foo")));
        assert_eq!(atx_heading("# foo#"), Some((1, "foo#")));
        assert_eq!(atx_heading("### ###"), Some((3, "")));
        assert_eq!(atx_heading(r"# foo \#"), Some((1, r"foo \#")));
        assert_eq!(atx_heading("#\tTabbed  "), Some((1, "Tabbed")));
    }

    #[test]
    fn test_fence() {
        assert_eq!(
            fence_open("```rust  "),
            Some(Fence {
                ch: b'`',
                len: 3,
                info: "rust".to_string()
            })
        );
        let f = fence_open("~~~~ python extra").unwrap();
        assert_eq!(f.len, 4);
        assert_eq!(f.language(), Some("python".to_string()));
        assert_eq!(fence_open("``` a`b"), None);
        assert!(fence_open("~~~ a`b").is_some());
        assert_eq!(fence_open("``"), None);
        assert_eq!(fence_open("``` c&#43;&#43; \\*").unwrap().info, "c++ *");

        assert!(fence_close("```", b'`', 3));
        assert!(fence_close("`````  ", b'`', 3));
        assert!(!fence_close("``", b'`', 3));
        assert!(!fence_close("~~~", b'`', 3));
        assert!(!fence_close("``` x", b'`', 3));
    }

    #[test]
    fn test_list_marker() {
        let m = list_marker("- item").unwrap();
        assert_eq!((m.info.ordered, m.info.marker, m.width), (false, '-', 1));

        let m = list_marker("12) item").unwrap();
        assert_eq!((m.info.ordered, m.info.start, m.info.marker, m.width), (true, 12, ')', 3));

        assert_eq!(list_marker("3.").map(|m| m.info.start), Some(3));
        assert!(list_marker("*").is_some());
        assert!(list_marker("-item").is_none());
        assert!(list_marker("1.item").is_none());
        assert!(list_marker("1234567890. x").is_none());
        assert!(list_marker("a. x").is_none());
    }

    #[test]
    fn test_setext_underline() {
        assert_eq!(setext_underline("==="), Some(1));
        assert_eq!(setext_underline("-  "), Some(2));
        assert_eq!(setext_underline("= ="), None);
        assert_eq!(setext_underline("--x"), None);
    }

    #[test]
    fn test_html_block() {
        assert_eq!(html_block_start("<script>", false), Some(HtmlKind::Raw));
        assert_eq!(html_block_start("<PRE class=\"x\">", false), Some(HtmlKind::Raw));
        assert_eq!(html_block_start("<!-- c", false), Some(HtmlKind::Comment));
        assert_eq!(html_block_start("<?php", false), Some(HtmlKind::Processing));
        assert_eq!(html_block_start("<!DOCTYPE html>", false), Some(HtmlKind::Declaration));
        assert_eq!(html_block_start("<![CDATA[", false), Some(HtmlKind::Cdata));
        assert_eq!(html_block_start("<div>", true), Some(HtmlKind::Block));
        assert_eq!(html_block_start("</table>", false), Some(HtmlKind::Block));
        assert_eq!(html_block_start("<custom-tag a=\"1\">", false), Some(HtmlKind::Tag));
        assert_eq!(html_block_start("<custom-tag a=\"1\">", true), None);
        assert_eq!(html_block_start("<span>text", false), None);
        assert_eq!(html_block_start("<divx>", false), Some(HtmlKind::Tag));

        assert!(html_block_end(HtmlKind::Raw, "x</script> y"));
        assert!(html_block_end(HtmlKind::Comment, "-->"));
        assert!(!html_block_end(HtmlKind::Block, "</div>"));
        assert!(HtmlKind::Tag.ends_at_blank());
    }
}
