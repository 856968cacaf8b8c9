use serde::Serialize;
use tinytemplate::TinyTemplate;

use crate::config::Config;
use crate::error::Error;

// html template
const TP_HTML_NAME: &str = "page";
const TP_HTML: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset='UTF-8'><meta name='viewport' content='width=device-width initial-scale=1'>
{{ if css_href }}<link rel="stylesheet" type="text/css" href="{ css_href }">
{{ endif }}<style>
        body\{
                box-sizing: border-box;
                min-width: 200px;
                max-width: 900px;
                margin: 0 auto;
                padding: 45px;
        }

        @media (max-width: 767px) \{
                body\{
                        padding: 15px;
                }
        }
</style>
<title>{ title }</title>
{ custom_html_head }
</head>
<body>
<article{{ if article_class }} class="{ article_class }"{{ endif }}>
{ content }</article>
</body>
</html>
"#;

#[derive(Serialize)]
struct HtmlContext<'html_context> {
    css_href: &'html_context str,
    title: &'html_context str,
    article_class: &'html_context str,
    custom_html_head: &'html_context str,
    content: &'html_context str,
}

pub(crate) struct RenderHtml<'render_html> {
    tt: TinyTemplate<'render_html>,
}

impl<'render_html> RenderHtml<'render_html> {
    pub(crate) fn new() -> Result<Self, Error> {
        let mut tt = TinyTemplate::new();
        tt.add_template(TP_HTML_NAME, TP_HTML)?;
        tt.set_default_formatter(&tinytemplate::format_unescaped);
        Ok(RenderHtml { tt })
    }

    // Wrap an html fragment in a complete page. Values from the config are
    // escaped, the fragment and the custom head are not.
    pub(crate) fn exec(&self, cfg: &Config, title: &str, content: &str) -> Result<String, Error> {
        let css_href = mdhtml::utils::escape_html(&cfg.css_href);
        let title = mdhtml::utils::escape_html(title);
        let article_class = mdhtml::utils::escape_html(&cfg.article_class);
        let ctx = HtmlContext {
            css_href: &css_href,
            title: &title,
            article_class: &article_class,
            custom_html_head: &cfg.custom_html_head,
            content,
        };
        let s = self.tt.render(TP_HTML_NAME, &ctx)?;
        Ok(s)
    }
}
