use crate::upload::UploadedDocument;
use pulldown_cmark::{html, Event, Options, Parser};
use std::fmt::Write;

pub const ABOUT_LINKS: [(&str, &str); 4] = [
    ("Lyzr", "https://www.lyzr.ai/"),
    ("Book a Demo", "https://www.lyzr.ai/book-demo/"),
    ("Discord", "https://discord.gg/nm7zSyEFA2"),
    (
        "Slack",
        "https://join.slack.com/t/genaiforenterprise/shared_invite/zt-2a7fr38f7-_QDOY1W1WSlSiYNAEncLGw",
    ),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Warning,
    Error,
}

impl NoticeLevel {
    fn css_class(self) -> &'static str {
        match self {
            NoticeLevel::Success => "notice success",
            NoticeLevel::Warning => "notice warning",
            NoticeLevel::Error => "notice error",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Success, message: message.into() }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Warning, message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Error, message: message.into() }
    }
}

/// Everything one render of the page depends on.
#[derive(Debug, Default)]
pub struct PageView<'a> {
    pub document: Option<&'a UploadedDocument>,
    pub keyword: &'a str,
    pub notices: Vec<Notice>,
    pub output: Option<&'a str>,
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Renders model output as markdown with tables. Raw HTML in the output is
/// shown as text, never passed through.
pub fn render_markdown(text: &str) -> String {
    let parser = Parser::new_ext(text, Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        other => other,
    });

    let mut rendered = String::with_capacity(text.len() * 3 / 2);
    html::push_html(&mut rendered, parser);
    rendered
}

pub fn render(view: &PageView<'_>) -> String {
    let mut body = String::new();

    body.push_str(r#"<img src="/logo/logo.svg" alt="Lyzr" width="150">"#);
    body.push_str("\n<h1>Domain Name Generator</h1>\n<h3>Built using Lyzr SDK</h3>\n");

    for notice in &view.notices {
        let _ = writeln!(
            body,
            r#"<div class="{}">{}</div>"#,
            notice.level.css_class(),
            escape_html(&notice.message)
        );
    }

    body.push_str(
        r#"<form action="/upload" method="post" enctype="multipart/form-data">
<label for="file">Upload your company documentation here</label>
<input id="file" type="file" name="file" accept=".pdf,.docx" required>
<button type="submit">Upload</button>
</form>
"#,
    );

    if let Some(doc) = view.document {
        let _ = write!(
            body,
            r#"<p class="document">Current document: {}</p>
<form action="/generate" method="post">
<label for="keyword">Enter your preferred keyword</label>
<input id="keyword" type="text" name="keyword" value="{}">
<button type="submit">Generate</button>
</form>
"#,
            escape_html(&doc.filename),
            escape_html(view.keyword)
        );
    }

    if let Some(output) = view.output {
        let _ = writeln!(body, r#"<div class="output">{}</div>"#, render_markdown(output));
    }

    body.push_str("<details>\n<summary>About this App</summary>\n");
    body.push_str(
        "<p>Experience the seamless integration of Lyzr's ChatBot as you refine your documents with ease. \
         For any inquiries or issues, please contact Lyzr.</p>\n",
    );
    for (label, url) in ABOUT_LINKS {
        let _ = writeln!(body, r#"<a class="link-button" href="{url}" target="_blank">{label}</a>"#);
    }
    body.push_str("</details>\n");

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Lyzr</title>
<link rel="icon" href="/logo/logo-cut.svg">
<style>
body {{ max-width: 46rem; margin: 2rem auto; font-family: sans-serif; }}
form {{ margin: 1rem 0; }}
.notice {{ padding: .5rem 1rem; border-radius: .25rem; margin: .5rem 0; }}
.success {{ background: #e6f4ea; }}
.warning {{ background: #fff4e5; }}
.error {{ background: #fdecea; }}
.output {{ border-top: 1px solid #ddd; padding-top: 1rem; }}
.output table {{ border-collapse: collapse; width: 100%; }}
.output th, .output td {{ border: 1px solid #ccc; padding: .3rem .5rem; text-align: left; }}
.link-button {{ display: block; text-align: center; margin: .25rem 0; padding: .4rem; border: 1px solid #ccc; }}
</style>
</head>
<body>
{body}</body>
</html>
"#
    )
}
