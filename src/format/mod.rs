pub mod sanitize;

use once_cell::sync::Lazy;
use regex::{ Captures, Regex };
use std::sync::Arc;
use self::sanitize::{ AllowListSanitizer, Sanitizer };

const LINK_ATTRS: &str = r#"target="_blank" rel="noopener noreferrer""#;

static MARKDOWN_LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\[([^\]]+)\]\((https?://[^)\s"'<>]+)\)"#)
        .expect("MARKDOWN_LINK regex pattern is valid")
});
static BARE_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"https?://[^\s<)"'*]+"#).expect("BARE_URL regex pattern is valid")
});
static ANCHOR_ELEMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<a\b[^>]*>.*?</a\s*>").expect("ANCHOR_ELEMENT regex pattern is valid")
});
static BOLD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\*\*([^*]+)\*\*").expect("BOLD regex pattern is valid")
});

/// Turns bot replies into bubble-safe HTML.
#[derive(Clone)]
pub struct Formatter {
    sanitizer: Arc<dyn Sanitizer>,
}

impl Default for Formatter {
    fn default() -> Self {
        Self::new(Arc::new(AllowListSanitizer))
    }
}

impl Formatter {
    pub fn new(sanitizer: Arc<dyn Sanitizer>) -> Self {
        Self { sanitizer }
    }

    pub fn sanitizer_name(&self) -> &'static str {
        self.sanitizer.name()
    }

    pub fn render(&self, text: &str) -> String {
        self.sanitizer.sanitize(&markup(text))
    }

    pub fn sanitize(&self, html: &str) -> String {
        self.sanitizer.sanitize(html)
    }
}

/// Markdown-ish conversion without sanitizing: links, bare URLs, bold,
/// line breaks. Unbalanced tokens are left as they are.
pub fn markup(text: &str) -> String {
    let linked = MARKDOWN_LINK.replace_all(text, |caps: &Captures| {
        anchor(&caps[2], &caps[1])
    });
    let linked = link_bare_urls(&linked);
    let bold = BOLD.replace_all(&linked, "<strong>$1</strong>");
    bold.replace("\r\n", "<br>").replace('\n', "<br>")
}

fn anchor(href: &str, label: &str) -> String {
    format!(r#"<a href="{}" {}>{}</a>"#, href, LINK_ATTRS, label)
}

fn link_bare_urls(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for existing in ANCHOR_ELEMENT.find_iter(text) {
        out.push_str(&link_segment(&text[last..existing.start()]));
        out.push_str(existing.as_str());
        last = existing.end();
    }
    out.push_str(&link_segment(&text[last..]));
    out
}

fn link_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    let mut last = 0;
    for url in BARE_URL.find_iter(segment) {
        let quoted = segment[..url.start()]
            .chars()
            .next_back()
            .map_or(false, |c| matches!(c, '(' | '"' | '\''));
        if quoted {
            continue;
        }
        out.push_str(&segment[last..url.start()]);
        out.push_str(&anchor(url.as_str(), url.as_str()));
        last = url.end();
    }
    out.push_str(&segment[last..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::sanitize::{ visible_text, FallbackSanitizer };

    #[test]
    fn renders_markdown_link() {
        let html = Formatter::default().render("Visit [docs](https://example.com/docs) now");
        assert_eq!(
            html,
            r#"Visit <a href="https://example.com/docs" target="_blank" rel="noopener noreferrer">docs</a> now"#
        );
        assert_eq!(visible_text(&html), "Visit docs now");
    }

    #[test]
    fn links_bare_urls_once() {
        let html = Formatter::default().render("see https://example.com/a?b=1&c=2 ok");
        assert_eq!(
            html,
            r#"see <a href="https://example.com/a?b=1&amp;c=2" target="_blank" rel="noopener noreferrer">https://example.com/a?b=1&amp;c=2</a> ok"#
        );
    }

    #[test]
    fn url_as_link_label_is_not_nested() {
        let html = markup("[https://a.io](https://a.io)");
        assert_eq!(html.matches("<a ").count(), 1);
    }

    #[test]
    fn bold_around_bare_url_keeps_link_whole() {
        assert_eq!(
            Formatter::default().render("**see https://a.io**"),
            r#"<strong>see <a href="https://a.io" target="_blank" rel="noopener noreferrer">https://a.io</a></strong>"#
        );
    }

    #[test]
    fn quoted_url_left_alone() {
        assert_eq!(markup("(https://a.io"), "(https://a.io");
        assert_eq!(markup("'https://a.io'"), "'https://a.io'");
    }

    #[test]
    fn bold_and_breaks() {
        assert_eq!(
            Formatter::default().render("Hello **world**\nbye\r\nnow"),
            "Hello <strong>world</strong><br>bye<br>now"
        );
    }

    #[test]
    fn malformed_markdown_is_literal() {
        let f = Formatter::default();
        assert_eq!(f.render("**open and [label](nope"), "**open and [label](nope");
        assert_eq!(f.render("a ** b"), "a ** b");
        assert_eq!(f.render("[x](javascript:alert(1))"), "[x](javascript:alert(1))");
    }

    #[test]
    fn rejects_script_and_event_handlers() {
        let html = Formatter::default()
            .render(r#"hi <script>alert(1)</script><img src=x onerror="alert(2)"> bye"#);
        assert!(!html.contains("<script"));
        assert!(!html.contains("onerror"));
        assert_eq!(html, "hi  bye");
    }

    #[test]
    fn entity_encoded_script_link_is_neutralised() {
        let out = Formatter::default()
            .render(r#"click <a href="javascript&colon;alert(document.cookie)">here</a>"#);
        assert_eq!(out, "click <a>here</a>");
        assert!(!out.contains("javascript"));
    }

    #[test]
    fn render_is_stable_on_its_own_output() {
        let f = Formatter::default();
        let inputs = [
            "Visit [docs](https://example.com/docs) & **bold**\nline <script>x()</script>",
            "raw https://example.com?a=1&b=2 and 3 < 4",
            "**unbalanced [x](y",
        ];
        for input in inputs {
            let once = f.render(input);
            let twice = f.render(&once);
            assert_eq!(visible_text(&twice), visible_text(&once), "input: {}", input);
        }
    }

    #[test]
    fn fallback_mode_strips_scripts() {
        let f = Formatter::new(Arc::new(FallbackSanitizer));
        let html = f.render(r#"**x** <script>evil()</script><b onmouseover="y()">z</b>"#);
        assert_eq!(html, "<strong>x</strong> <b >z</b>");
        assert_eq!(f.sanitizer_name(), "fallback");
    }
}
