use std::borrow::Cow;

use email_address::EmailAddress;
use itertools::Itertools;
use lazy_static::lazy_static;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use regex::{Captures, Regex};

pub(crate) mod cursor;
pub(crate) mod stack;

// Characters left alone when a link destination is percent-encoded.
const URL_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b';')
    .remove(b'/')
    .remove(b'?')
    .remove(b':')
    .remove(b'@')
    .remove(b'&')
    .remove(b'=')
    .remove(b'+')
    .remove(b'$')
    .remove(b',')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')')
    .remove(b'#');

lazy_static! {
    // <scheme:rest>, the scheme is 2 to 32 characters
    pub(crate) static ref AUTOLINK_URI_RE: Regex =
        Regex::new(r"^<([A-Za-z][A-Za-z0-9.+\-]{1,31}:[^<>\x00-\x20]*)>").unwrap();
    // <local@domain>, the address is validated again by `is_email`
    pub(crate) static ref AUTOLINK_EMAIL_RE: Regex =
        Regex::new(r"^<([A-Za-z0-9.!#$%&'*+/=?^_`{|}~\-]+@[A-Za-z0-9](?:[A-Za-z0-9\-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9\-]{0,61}[A-Za-z0-9])?)*)>").unwrap();
    // named, decimal and hexadecimal character references
    pub(crate) static ref ENTITY_RE: Regex =
        Regex::new(r"^&(?:#[xX][0-9a-fA-F]{1,6}|#[0-9]{1,7}|[A-Za-z][A-Za-z0-9]{1,31});").unwrap();
    // an inline html tag, comment, processing instruction, declaration or cdata section
    pub(crate) static ref HTML_TAG_RE: Regex =
        Regex::new(&format!(r"^(?:{}|{}|{}|{}|{}|{})", OPEN_TAG, CLOSE_TAG, HTML_COMMENT, PROCESSING, DECLARATION, CDATA)).unwrap();
    // tags that never pass through as raw html
    static ref DISALLOWED_TAG_RE: Regex =
        Regex::new(r"(?i)</?(?:script|style|iframe|textarea|title|xmp|noembed|noframes|plaintext)\b[^>]*>?").unwrap();
}

pub(crate) const OPEN_TAG: &str = r#"<[A-Za-z][A-Za-z0-9\-]*(?:\s+[a-zA-Z_:][a-zA-Z0-9_.:\-]*(?:\s*=\s*(?:[^"'=<>`\x00-\x20]+|'[^']*'|"[^"]*"))?)*\s*/?>"#;
pub(crate) const CLOSE_TAG: &str = r"</[A-Za-z][A-Za-z0-9\-]*\s*>";
const HTML_COMMENT: &str = r"<!-->|<!--->|(?s:<!--.*?-->)";
const PROCESSING: &str = r"(?s:<\?.*?\?>)";
const DECLARATION: &str = r"<![A-Za-z]+[^>]*>";
const CDATA: &str = r"(?s:<!\[CDATA\[.*?\]\]>)";

/// Escape text for use in HTML content and attribute values.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Escape the tags in raw html that may not be passed through as is, such as
/// `<script>`. Everything else is left untouched.
pub fn filter_html(s: &str) -> Cow<'_, str> {
    DISALLOWED_TAG_RE.replace_all(s, |caps: &Captures| escape_html(&caps[0]))
}

/// Percent-encode the unsafe characters of a link destination.
/// Valid `%XX` sequences already present are kept as they are.
pub fn normalize_url(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = String::with_capacity(s.len());
    let mut last = 0;
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'%' {
            i += 1;
            continue;
        }
        out.extend(utf8_percent_encode(&s[last..i], URL_ENCODE_SET));
        let escaped = bytes.len() > i + 2
            && bytes[i + 1].is_ascii_hexdigit()
            && bytes[i + 2].is_ascii_hexdigit();
        if escaped {
            out.push_str(&s[i..i + 3]);
            i += 3;
        } else {
            out.push_str("%25");
            i += 1;
        }
        last = i;
    }
    out.extend(utf8_percent_encode(&s[last..], URL_ENCODE_SET));
    out
}

// Link labels match case-insensitively, with runs of whitespace collapsed.
pub(crate) fn normalize_label(label: &str) -> String {
    label.split_whitespace().join(" ").to_lowercase()
}

/// Decode one character reference such as `&amp;`, `&#35;` or `&#x22;`.
/// Returns `None` for names that are not HTML entities.
pub fn decode_entity(s: &str) -> Option<String> {
    let body = s.strip_prefix('&')?.strip_suffix(';')?;
    if let Some(num) = body.strip_prefix('#') {
        let code = match num.strip_prefix(|c: char| c == 'x' || c == 'X') {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse::<u32>().ok()?,
        };
        let ch = char::from_u32(code)
            .filter(|c| *c != '\0')
            .unwrap_or(char::REPLACEMENT_CHARACTER);
        return Some(ch.to_string());
    }
    // a known name decodes to one or two characters, anything else was
    // at best a partial match
    let decoded = html_escape::decode_html_entities(s);
    if decoded != s && decoded.chars().count() <= 2 {
        Some(decoded.into_owned())
    } else {
        None
    }
}

// Remove the backslash in front of escaped ASCII punctuation and decode
// character references.
pub(crate) fn unescape(s: &str) -> String {
    if !s.contains('\\') && !s.contains('&') {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len());
    let mut pos = 0;
    while let Some(ch) = s[pos..].chars().next() {
        if ch == '\\' {
            if let Some(next) = s[pos + 1..].chars().next().filter(char::is_ascii_punctuation) {
                out.push(next);
                pos += 2;
                continue;
            }
        }
        if ch == '&' {
            let decoded = ENTITY_RE
                .find(&s[pos..])
                .and_then(|m| decode_entity(m.as_str()).map(|d| (d, m.end())));
            if let Some((d, len)) = decoded {
                out.push_str(&d);
                pos += len;
                continue;
            }
        }
        out.push(ch);
        pos += ch.len_utf8();
    }
    out
}

// ASCII punctuation plus any non-alphanumeric, non-space unicode character.
pub(crate) fn is_punctuation(ch: char) -> bool {
    ch.is_ascii_punctuation() || (!ch.is_ascii() && !ch.is_alphanumeric() && !ch.is_whitespace())
}

pub fn is_email(s: &str) -> bool {
    EmailAddress::is_valid(s)
}
