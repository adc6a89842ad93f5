//! Allow-list sanitizer.
//!
//! Sanitization never fails; it strips. Elements outside the allow-list are
//! unwrapped (their children kept), elements that carry no document content
//! are dropped with everything inside, and attributes are reduced to the few
//! the converter reads. URLs with schemes outside [`SAFE_SCHEMES`] (plus the
//! configured deep-link schemes) are removed.

use super::tree::{Element, HtmlNode};

const ALLOWED: &[&str] = &[
    "a", "b", "blockquote", "br", "code", "del", "div", "em", "h1", "h2", "h3", "h4", "h5", "h6",
    "i", "img", "li", "ol", "p", "pre", "s", "source", "span", "strike", "strong", "sub", "sup",
    "u", "ul", "video",
];

const DROPPED: &[&str] = &[
    "button", "canvas", "embed", "form", "head", "iframe", "input", "link", "math", "meta",
    "noscript", "object", "script", "select", "style", "svg", "template", "textarea", "title",
];

pub const SAFE_SCHEMES: &[&str] = &["http", "https", "mailto", "ipfs"];

fn allowed_attrs(element: &str) -> &'static [&'static str] {
    match element {
        "a" => &["href"],
        "img" => &["src", "alt"],
        "video" => &["src"],
        "source" => &["src", "type"],
        "ol" => &["start"],
        "span" => &["style"],
        "code" => &["class"],
        _ => &[],
    }
}

/// Sanitizes a forest. `extra_schemes` are deep-link schemes such as
/// `hm://`, accepted in links alongside [`SAFE_SCHEMES`].
pub fn sanitize(nodes: Vec<HtmlNode>, extra_schemes: &[String]) -> Vec<HtmlNode> {
    let mut out = vec![];
    for node in nodes {
        match node {
            HtmlNode::Text(t) => out.push(HtmlNode::Text(t)),
            HtmlNode::Element(e) if DROPPED.contains(&e.name.as_str()) => {
                log::debug!("Dropping <{}> with its content", e.name);
            }
            HtmlNode::Element(e) if ALLOWED.contains(&e.name.as_str()) => {
                let attrs = filter_attrs(&e, extra_schemes);
                out.push(HtmlNode::Element(Element {
                    name: e.name,
                    attrs,
                    children: sanitize(e.children, extra_schemes),
                }));
            }
            HtmlNode::Element(e) => out.extend(sanitize(e.children, extra_schemes)),
        }
    }
    out
}

fn filter_attrs(element: &Element, extra_schemes: &[String]) -> Vec<(String, String)> {
    let allowed = allowed_attrs(&element.name);
    element
        .attrs
        .iter()
        .filter(|(name, _)| allowed.contains(&name.as_str()))
        .filter_map(|(name, value)| {
            let value = match name.as_str() {
                "href" => safe_url(value, extra_schemes, false)?,
                "src" => safe_url(value, extra_schemes, element.name == "img")?,
                "style" => color_only(value)?,
                "class" => language_class(value)?,
                "start" => value.trim().parse::<u32>().ok()?.to_string(),
                _ => value.clone(),
            };
            Some((name.clone(), value))
        })
        .collect()
}

/// Returns the trimmed URL if its scheme is allowed. Relative URLs pass.
pub fn safe_url(url: &str, extra_schemes: &[String], allow_data_image: bool) -> Option<String> {
    let trimmed = url.trim();
    // Browsers ignore embedded whitespace and control characters when
    // reading a scheme, so check against a compacted copy.
    let compact: String = trimmed
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect::<String>()
        .to_ascii_lowercase();

    let Some(colon) = compact.find(':') else {
        return Some(trimmed.to_string());
    };
    let scheme = &compact[..colon];
    let is_scheme = scheme
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic())
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    if !is_scheme || compact[..colon].contains(['/', '?', '#']) {
        return Some(trimmed.to_string());
    }

    let allowed = SAFE_SCHEMES.contains(&scheme)
        || extra_schemes
            .iter()
            .any(|s| s.trim_end_matches("://").trim_end_matches(':') == scheme)
        || (allow_data_image && compact.starts_with("data:image/"));
    if allowed {
        Some(trimmed.to_string())
    } else {
        log::debug!("Removing URL with unsafe scheme '{scheme}'");
        None
    }
}

fn color_only(style: &str) -> Option<String> {
    style.split(';').find_map(|decl| {
        let (prop, value) = decl.split_once(':')?;
        if !prop.trim().eq_ignore_ascii_case("color") {
            return None;
        }
        let value = value.trim();
        let plain = !value.is_empty()
            && value
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '#' | '(' | ')' | ',' | '.' | '%' | ' '));
        plain.then(|| format!("color: {value}"))
    })
}

fn language_class(class: &str) -> Option<String> {
    class
        .split_whitespace()
        .find(|c| c.starts_with("language-"))
        .map(str::to_string)
}
