use ammonia::Builder;
use log::debug;
use once_cell::sync::Lazy;
use regex::{ Captures, Regex };
use std::collections::{ HashMap, HashSet };

const ALLOWED_TAGS: [&str; 4] = ["a", "br", "strong", "em"];
const LINK_ATTRS: [&str; 3] = ["href", "target", "rel"];
const ALLOWED_SCHEMES: [&str; 3] = ["http", "https", "mailto"];
const DROP_WITH_CONTENT: [&str; 2] = ["script", "style"];

static DECODE_ENTITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&(amp|lt|gt|quot|apos|nbsp|#[0-9]{1,7}|#[xX][0-9A-Fa-f]{1,6});")
        .expect("DECODE_ENTITY regex pattern is valid")
});
static ANY_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<[^>]*>").expect("ANY_TAG regex pattern is valid")
});
static BR_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<br\s*/?>").expect("BR_TAG regex pattern is valid")
});
static SCRIPT_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<script[^>]*>.*?</script\s*>").expect("SCRIPT_BLOCK regex pattern is valid")
});
static EVENT_HANDLER_ATTR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\bon\w+\s*=\s*(?:"[^"]*"|'[^']*')"#)
        .expect("EVENT_HANDLER_ATTR regex pattern is valid")
});

/// Cleans HTML before it is placed inside a chat bubble.
pub trait Sanitizer: Send + Sync {
    fn sanitize(&self, html: &str) -> String;

    fn name(&self) -> &'static str;
}

/// Keeps `a`, `br`, `strong` and `em`, with `href`, `target` and `rel` on
/// links only. Hrefs must be http, https, mailto or relative. Parsing goes
/// through html5ever, so entities are decoded before schemes are checked.
#[derive(Debug, Default, Clone, Copy)]
pub struct AllowListSanitizer;

impl AllowListSanitizer {
    fn builder() -> Builder<'static> {
        let mut builder = Builder::default();
        builder
            .tags(HashSet::from(ALLOWED_TAGS))
            .clean_content_tags(HashSet::from(DROP_WITH_CONTENT))
            .tag_attributes(HashMap::from([("a", HashSet::from(LINK_ATTRS))]))
            .generic_attributes(HashSet::new())
            .url_schemes(HashSet::from(ALLOWED_SCHEMES))
            .link_rel(None)
            .strip_comments(true);
        builder
    }
}

impl Sanitizer for AllowListSanitizer {
    fn sanitize(&self, html: &str) -> String {
        let clean = Self::builder().clean(html).to_string();
        if clean.len() != html.len() {
            debug!("Sanitizer rewrote markup ({} -> {} bytes)", html.len(), clean.len());
        }
        clean
    }

    fn name(&self) -> &'static str {
        "allow-list"
    }
}

/// Degraded mode for hosts without a real sanitizer: removes script blocks
/// and quoted `on*=` handler attributes and nothing else. Best-effort only,
/// it does not make arbitrary HTML safe.
#[derive(Debug, Default, Clone, Copy)]
pub struct FallbackSanitizer;

impl Sanitizer for FallbackSanitizer {
    fn sanitize(&self, html: &str) -> String {
        let without_scripts = SCRIPT_BLOCK.replace_all(html, "");
        EVENT_HANDLER_ATTR.replace_all(&without_scripts, "").into_owned()
    }

    fn name(&self) -> &'static str {
        "fallback"
    }
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn unescape_html(html: &str) -> String {
    DECODE_ENTITY.replace_all(html, |caps: &Captures| {
        let entity = &caps[1];
        let decoded = match entity {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            "nbsp" => Some('\u{a0}'),
            _ => {
                let code = if let Some(hex) = entity.strip_prefix("#x").or_else(|| entity.strip_prefix("#X")) {
                    u32::from_str_radix(hex, 16).ok()
                } else {
                    entity[1..].parse::<u32>().ok()
                };
                code.and_then(char::from_u32)
            }
        };
        match decoded {
            Some(c) => c.to_string(),
            None => caps[0].to_string(),
        }
    }).into_owned()
}

/// Text a reader would see: `<br>` as newlines, other tags removed,
/// entities decoded.
pub fn visible_text(html: &str) -> String {
    let with_breaks = BR_TAG.replace_all(html, "\n");
    let stripped = ANY_TAG.replace_all(&with_breaks, "");
    unescape_html(&stripped)
}
