use mdhtml::{parse, to_html, Block};
use pretty_assertions::assert_eq;

fn check(cases: &[(&str, &str)]) {
    for (md, html) in cases {
        assert_eq!(to_html(md), *html, "input: {:?}", md);
    }
}

#[test]
fn conversion_is_total() {
    let long_brackets = "[".repeat(1000);
    let long_runs = "a*".repeat(500);
    let deep_quote = format!("{}x", "> ".repeat(100));
    let inputs = vec![
        "",
        "\0",
        "[",
        "]",
        "*",
        "`",
        "<",
        "&",
        "\\",
        "![",
        "[a]: <",
        "1.",
        "-",
        "&#;",
        "\t\t\t",
        "> > > >",
        "```",
        "~~~\n",
        "<!--",
        "***\n---\n___",
        "- \n- \n-",
        "[x]: /a \"b\n\n[x]",
        long_brackets.as_str(),
        long_runs.as_str(),
        deep_quote.as_str(),
    ];
    for input in inputs {
        let html = to_html(input);
        assert!(html.is_empty() || html.ends_with('\n'), "input: {:?}", input);
    }
}

#[test]
fn conversion_is_deterministic() {
    let md = "# T\n\n* a\n\n  > b *c* [d](e)\n\n```x\ny\n```\n";
    assert_eq!(to_html(md), to_html(md));
}

#[test]
fn plain_text_is_one_paragraph() {
    check(&[
        ("hello world 123", "<p>hello world 123</p>\n"),
        ("hello\n", "<p>hello</p>\n"),
        ("one\ntwo", "<p>one\ntwo</p>\n"),
    ]);
}

#[test]
fn script_is_never_raw() {
    check(&[
        ("<script>", "&lt;script&gt;\n"),
        ("a <script> b", "<p>a &lt;script&gt; b</p>\n"),
        ("\\<script>", "<p>&lt;script&gt;</p>\n"),
        ("`<script>`", "<p><code>&lt;script&gt;</code></p>\n"),
    ]);
}

#[test]
fn emphasis() {
    check(&[
        ("*a*b*c*", "<p><em>a</em>b<em>c</em></p>\n"),
        ("**bold** _it_", "<p><strong>bold</strong> <em>it</em></p>\n"),
        ("***both***", "<p><em><strong>both</strong></em></p>\n"),
        ("*foo**bar**baz*", "<p><em>foo<strong>bar</strong>baz</em></p>\n"),
        ("snake_case_word", "<p>snake_case_word</p>\n"),
        ("*unclosed", "<p>*unclosed</p>\n"),
    ]);
}

#[test]
fn code_spans_bind_before_emphasis() {
    check(&[
        ("*a `*` b*", "<p><em>a <code>*</code> b</em></p>\n"),
        ("`*a*`", "<p><code>*a*</code></p>\n"),
        ("`` a ` b ``", "<p><code>a ` b</code></p>\n"),
    ]);
}

#[test]
fn fenced_code() {
    check(&[
        ("```\ncode\n```", "<pre><code>code\n</code></pre>\n"),
        ("```\n*x*\n```", "<pre><code>*x*\n</code></pre>\n"),
        (
            "```rust\nfn main() {}\n```",
            "<pre><code class=\"language-rust\">fn main() {}\n</code></pre>\n",
        ),
        ("```\nunterminated", "<pre><code>unterminated\n</code></pre>\n"),
    ]);
}

#[test]
fn indented_code_and_tabs() {
    check(&[
        ("    a < b", "<pre><code>a &lt; b\n</code></pre>\n"),
        ("\tcode", "<pre><code>code\n</code></pre>\n"),
        ("-\tfoo", "<ul>\n<li>foo</li>\n</ul>\n"),
    ]);
}

#[test]
fn list_tightness() {
    check(&[
        ("- a\n- b", "<ul>\n<li>a</li>\n<li>b</li>\n</ul>\n"),
        (
            "- a\n\n- b",
            "<ul>\n<li>\n<p>a</p>\n</li>\n<li>\n<p>b</p>\n</li>\n</ul>\n",
        ),
        (
            "3. x\n4. y",
            "<ol start=\"3\">\n<li>x</li>\n<li>y</li>\n</ol>\n",
        ),
        ("1. x", "<ol>\n<li>x</li>\n</ol>\n"),
        (
            "-     x\n\n\n- b",
            "<ul>\n<li>\n<pre><code>x\n</code></pre>\n</li>\n<li>\n<p>b</p>\n</li>\n</ul>\n",
        ),
        (
            "1.     c\n\n2. d",
            "<ol>\n<li>\n<pre><code>c\n</code></pre>\n</li>\n<li>\n<p>d</p>\n</li>\n</ol>\n",
        ),
    ]);
}

#[test]
fn headings() {
    check(&[
        ("# Title", "<h1>Title</h1>\n"),
        ("###### Six ###", "<h6>Six</h6>\n"),
        ("####### Title", "<p>####### Title</p>\n"),
        ("#Title", "<p>#Title</p>\n"),
        ("Title\n=====", "<h1>Title</h1>\n"),
        ("Title\n---", "<h2>Title</h2>\n"),
    ]);
}

#[test]
fn thematic_breaks() {
    check(&[
        ("a\n\n***\n\nb", "<p>a</p>\n<hr />\n<p>b</p>\n"),
        ("- - -", "<hr />\n"),
    ]);
}

#[test]
fn reference_links() {
    let md = "[home][] and [docs]\n\n[home]: https://example.com \"Home\"\n[docs]: /docs";
    check(&[(
        md,
        "<p><a href=\"https://example.com\" title=\"Home\">home</a> and <a href=\"/docs\">docs</a></p>\n",
    )]);
    check(&[("[missing]", "<p>[missing]</p>\n")]);
}

#[test]
fn links_and_images() {
    check(&[
        ("[x](/url)", "<p><a href=\"/url\">x</a></p>\n"),
        (
            "![logo](/l.png \"L\")",
            "<p><img src=\"/l.png\" alt=\"logo\" title=\"L\" /></p>\n",
        ),
        (
            "[a [b](/c) d](/e)",
            "<p>[a <a href=\"/c\">b</a> d](/e)</p>\n",
        ),
        ("[x](<a b>)", "<p><a href=\"a%20b\">x</a></p>\n"),
        (
            "[x](/caf%C3%A9?q=ä)",
            "<p><a href=\"/caf%C3%A9?q=%C3%A4\">x</a></p>\n",
        ),
    ]);
}

#[test]
fn autolinks_and_raw_html() {
    check(&[
        (
            "<https://a.com/x>",
            "<p><a href=\"https://a.com/x\">https://a.com/x</a></p>\n",
        ),
        (
            "<me@example.com>",
            "<p><a href=\"mailto:me@example.com\">me@example.com</a></p>\n",
        ),
        (
            "a <span class=\"x\">b</span>",
            "<p>a <span class=\"x\">b</span></p>\n",
        ),
        ("<div>\n*raw*\n</div>", "<div>\n*raw*\n</div>\n"),
        ("&copy; 2024 & co", "<p>\u{a9} 2024 &amp; co</p>\n"),
    ]);
}

#[test]
fn character_references_are_decoded_once() {
    check(&[
        ("&amp; &lt;b&gt;", "<p>&amp; &lt;b&gt;</p>\n"),
        ("&foo; &#0;", "<p>&amp;foo; \u{fffd}</p>\n"),
        ("![a &amp; b](x)", "<p><img src=\"x\" alt=\"a &amp; b\" /></p>\n"),
        (
            "[x](/a?b=1&amp;c=2)",
            "<p><a href=\"/a?b=1&amp;c=2\">x</a></p>\n",
        ),
        (
            "[x](/a \"t &amp; u\")",
            "<p><a href=\"/a\" title=\"t &amp; u\">x</a></p>\n",
        ),
        (
            "```&lt;x&gt;\ny\n```",
            "<pre><code class=\"language-&lt;x&gt;\">y\n</code></pre>\n",
        ),
    ]);
}

#[test]
fn deep_nesting_does_not_overflow() {
    let emphasis = format!("{}a{}", "*a ".repeat(5_000), " a*".repeat(5_000));
    let html = to_html(&emphasis);
    assert!(html.starts_with("<p><em>a <em>a "));
    assert!(html.contains("*a *a "));

    let quotes = format!("{}x", "> ".repeat(50_000));
    let html = to_html(&quotes);
    assert_eq!(html.matches("<blockquote>").count(), 100);
    assert!(html.contains("<p>&gt; &gt; "));

    let items = format!("{}x", "- ".repeat(50_000));
    assert!(to_html(&items).ends_with("</ul>\n"));

    let brackets = format!("{}x{}", "[".repeat(20_000), "](/u)".repeat(20_000));
    assert!(to_html(&brackets).ends_with("</p>\n"));
}

#[test]
fn line_breaks() {
    check(&[
        ("a  \nb", "<p>a<br />\nb</p>\n"),
        ("a\\\nb", "<p>a<br />\nb</p>\n"),
        ("a\r\nb\r\n", "<p>a\nb</p>\n"),
    ]);
}

#[test]
fn nested_containers() {
    check(&[
        (
            "> - a\n>   - b",
            "<blockquote>\n<ul>\n<li>a\n<ul>\n<li>b</li>\n</ul>\n</li>\n</ul>\n</blockquote>\n",
        ),
        ("> a\nb", "<blockquote>\n<p>a\nb</p>\n</blockquote>\n"),
        (
            "> a\n\nb",
            "<blockquote>\n<p>a</p>\n</blockquote>\n<p>b</p>\n",
        ),
    ]);
}

#[test]
fn parse_exposes_the_tree() {
    let doc = parse("# A\n\n- b\n");
    let kinds: Vec<&Block> = doc
        .root()
        .children
        .iter()
        .map(|id| &doc.node(*id).kind)
        .collect();
    assert_eq!(kinds.len(), 2);
    assert_eq!(kinds[0], &Block::Heading { level: 1 });
    assert!(matches!(kinds[1], Block::List(info) if !info.ordered));
    assert_eq!(mdhtml::render(&doc), "<h1>A</h1>\n<ul>\n<li>b</li>\n</ul>\n");
}
