//! Sanitized HTML to tree nodes.
//!
//! ## Block level
//!
//! Runs of inline content between block elements become statements. Lists
//! become groups whose items are statements (nested lists become the item's
//! child group), headings become heading blocks, `pre` becomes a code block,
//! and a lone image or video becomes a media block. Whitespace-only text
//! between blocks is dropped.
//!
//! ## Inline level
//!
//! Formatting elements turn into marks on the text leaves below them, `a`
//! into links (never nested), `img`/`video` into inline media. Block elements
//! met inside inline content contribute their children followed by a line
//! break.
//!
//! Blocks are created with empty ids; the importer assigns fresh ones once
//! the final shape is known.

use std::collections::BTreeSet;

use super::html::{Element, HtmlNode};
use crate::mttast::{
    BlockKind, FlowContent, GroupKind, Link, Mark, Node, Text, block, group_of, image,
    paragraph, static_paragraph, statement, text, video,
};

/// A top-level block plus the heading level it came from, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct TopLevel {
    pub node: Node,
    pub heading_level: Option<u8>,
}

const BLOCKISH: &[&str] = &[
    "blockquote", "div", "h1", "h2", "h3", "h4", "h5", "h6", "li", "ol", "p", "pre", "ul",
];

#[derive(Debug, Clone, Default)]
struct Style {
    marks: BTreeSet<Mark>,
    color: Option<String>,
    in_link: bool,
}

impl Style {
    fn with(&self, mark: Mark) -> Self {
        let mut next = self.clone();
        next.marks.insert(mark);
        next
    }
}

/// Converts sanitized HTML into top-level tree nodes.
pub fn html_to_nodes(nodes: &[HtmlNode]) -> Vec<TopLevel> {
    let mut collector = BlockCollector::default();
    collector.blocks(nodes);
    collector.flush();
    collector.out
}

#[derive(Default)]
struct BlockCollector {
    out: Vec<TopLevel>,
    pending: Vec<Node>,
}

impl BlockCollector {
    fn push(&mut self, node: Node, heading_level: Option<u8>) {
        self.out.push(TopLevel {
            node,
            heading_level,
        });
    }

    fn flush(&mut self) {
        let inline = finish_inline(std::mem::take(&mut self.pending));
        if has_content(&inline) {
            self.push(Node::FlowContent(inline_block(inline)), None);
        }
    }

    fn blocks(&mut self, nodes: &[HtmlNode]) {
        for node in nodes {
            let e = match node {
                HtmlNode::Text(t) => {
                    if !(self.pending.is_empty() && t.trim().is_empty()) {
                        self.pending.extend(inline(node, &Style::default()));
                    }
                    continue;
                }
                HtmlNode::Element(e) => e,
            };

            match e.name.as_str() {
                "p" | "div" | "li" => {
                    self.flush();
                    self.blocks(&e.children);
                    self.flush();
                }
                "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                    self.flush();
                    let level = e.name[1..].parse::<u8>().ok();
                    let inline = finish_inline(inline_children(&e.children, &Style::default()));
                    if has_content(&inline) {
                        let block = block(BlockKind::Heading, "", vec![static_paragraph(inline)]);
                        self.push(Node::FlowContent(block), level);
                    }
                }
                "ul" | "ol" => {
                    self.flush();
                    self.push(list_group(e), None);
                }
                "blockquote" => {
                    self.flush();
                    let inline = finish_inline(inline_children(&e.children, &Style::default()));
                    if has_content(&inline) {
                        let block = block(BlockKind::Blockquote, "", vec![paragraph(inline)]);
                        self.push(Node::FlowContent(block), None);
                    }
                }
                "pre" => {
                    self.flush();
                    self.push(Node::FlowContent(code_block(e)), None);
                }
                "br" => self.flush(),
                "img" | "video" => {
                    self.flush();
                    if let Some(media) = media_node(e) {
                        self.push(Node::FlowContent(statement("", vec![media])), None);
                    }
                }
                _ if contains_block(e) => {
                    // Wrappers such as a document-wide <b> around paragraphs.
                    self.flush();
                    self.blocks(&e.children);
                    self.flush();
                }
                _ => self.pending.extend(inline(node, &Style::default())),
            }
        }
    }
}

/// True when the fragment holds an element that makes a block of its own.
pub fn has_block_elements(nodes: &[HtmlNode]) -> bool {
    nodes.iter().any(|n| match n {
        HtmlNode::Element(e) => BLOCKISH.contains(&e.name.as_str()) || contains_block(e),
        HtmlNode::Text(_) => false,
    })
}

fn contains_block(e: &Element) -> bool {
    e.children.iter().any(|c| match c {
        HtmlNode::Element(child) => {
            BLOCKISH.contains(&child.name.as_str()) || contains_block(child)
        }
        HtmlNode::Text(_) => false,
    })
}

/// A statement for inline content, or a media block when the content is
/// nothing but media.
fn inline_block(inline: Vec<Node>) -> FlowContent {
    let only_media = inline
        .iter()
        .all(|n| matches!(n, Node::Image(_) | Node::Video(_) | Node::File(_)));
    if only_media {
        statement("", inline)
    } else {
        statement("", vec![paragraph(inline)])
    }
}

fn list_group(list: &Element) -> Node {
    let kind = list_kind(list);
    let mut items: Vec<Node> = vec![];
    for child in &list.children {
        match child {
            HtmlNode::Element(e) if e.name == "li" => items.push(Node::FlowContent(list_item(e))),
            HtmlNode::Element(e) if e.name == "ul" || e.name == "ol" => {
                let Node::Group(nested) = list_group(e) else {
                    continue;
                };
                match items.last_mut() {
                    Some(Node::FlowContent(prev)) => prev
                        .ensure_group(nested.kind)
                        .children
                        .extend(nested.children),
                    _ => items.extend(nested.children),
                }
            }
            HtmlNode::Text(t) if t.trim().is_empty() => {}
            other => {
                let inline = finish_inline(inline(other, &Style::default()));
                if has_content(&inline) {
                    items.push(Node::FlowContent(inline_block(inline)));
                }
            }
        }
    }
    group_of(kind, items)
}

fn list_kind(list: &Element) -> GroupKind {
    if list.name == "ol" {
        GroupKind::OrderedList {
            start: list.attr("start").and_then(|s| s.parse().ok()),
        }
    } else {
        GroupKind::UnorderedList
    }
}

fn list_item(li: &Element) -> FlowContent {
    let mut inline_nodes = vec![];
    let mut nested: Option<(GroupKind, Vec<Node>)> = None;
    for child in &li.children {
        match child {
            HtmlNode::Element(e) if e.name == "ul" || e.name == "ol" => {
                if let Node::Group(g) = list_group(e) {
                    match &mut nested {
                        Some((_, children)) => children.extend(g.children),
                        None => nested = Some((g.kind, g.children)),
                    }
                }
            }
            other => inline_nodes.extend(inline(other, &Style::default())),
        }
    }

    let inline_nodes = finish_inline(inline_nodes);
    let mut item = statement("", vec![paragraph(inline_nodes)]);
    if let Some((kind, children)) = nested {
        item.ensure_group(kind).children.extend(children);
    }
    item
}

fn code_block(pre: &Element) -> FlowContent {
    let code = HtmlNode::Element(pre.clone()).text_content();
    let code = code.strip_suffix('\n').unwrap_or(&code).to_string();
    let mut block = block(BlockKind::Code, "", vec![paragraph(vec![text(code)])]);

    let language = pre.children.iter().find_map(|c| match c {
        HtmlNode::Element(e) if e.name == "code" => e
            .attr("class")
            .and_then(|class| class.strip_prefix("language-"))
            .map(str::to_string),
        _ => None,
    });
    if let Some(language) = language {
        block.attributes.insert("language".to_string(), language);
    }
    block
}

fn media_node(e: &Element) -> Option<Node> {
    match e.name.as_str() {
        "img" => Some(image(e.attr("src")?, e.attr("alt").unwrap_or_default())),
        "video" => {
            let src = e.attr("src").map(str::to_string).or_else(|| {
                e.children.iter().find_map(|c| match c {
                    HtmlNode::Element(s) if s.name == "source" => s.attr("src").map(str::to_string),
                    _ => None,
                })
            })?;
            Some(video(src, ""))
        }
        _ => None,
    }
}

fn inline_children(children: &[HtmlNode], style: &Style) -> Vec<Node> {
    children.iter().flat_map(|c| inline(c, style)).collect()
}

fn inline(node: &HtmlNode, style: &Style) -> Vec<Node> {
    let e = match node {
        HtmlNode::Text(t) => {
            return vec![Node::Text(Text {
                value: collapse_whitespace(t),
                marks: style.marks.clone(),
                color: style.color.clone(),
            })];
        }
        HtmlNode::Element(e) => e,
    };

    match e.name.as_str() {
        "strong" | "b" => inline_children(&e.children, &style.with(Mark::Strong)),
        "em" | "i" => inline_children(&e.children, &style.with(Mark::Emphasis)),
        "u" => inline_children(&e.children, &style.with(Mark::Underline)),
        "s" | "strike" | "del" => inline_children(&e.children, &style.with(Mark::Strikethrough)),
        "sup" => inline_children(&e.children, &style.with(Mark::Superscript)),
        "sub" => inline_children(&e.children, &style.with(Mark::Subscript)),
        "code" => inline_children(&e.children, &style.with(Mark::Code)),
        "span" => {
            let color = e
                .attr("style")
                .and_then(|s| s.split_once(':'))
                .map(|(_, v)| v.trim().to_string());
            match color {
                Some(color) => {
                    let mut next = style.clone();
                    next.color = Some(color);
                    inline_children(&e.children, &next)
                }
                None => inline_children(&e.children, style),
            }
        }
        "a" => match e.attr("href") {
            Some(href) if !style.in_link => {
                let mut next = style.clone();
                next.in_link = true;
                vec![Node::Link(Link {
                    url: href.to_string(),
                    children: inline_children(&e.children, &next),
                })]
            }
            _ => inline_children(&e.children, style),
        },
        "img" | "video" => media_node(e).into_iter().collect(),
        "br" => vec![Node::Text(Text {
            value: "\n".to_string(),
            marks: style.marks.clone(),
            color: style.color.clone(),
        })],
        name if BLOCKISH.contains(&name) => {
            let mut nodes = inline_children(&e.children, style);
            nodes.push(text("\n"));
            nodes
        }
        _ => inline_children(&e.children, style),
    }
}

fn collapse_whitespace(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_space = false;
    for ch in s.chars() {
        if ch.is_ascii_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(ch);
            in_space = false;
        }
    }
    out
}

/// Trims whitespace at the edges of an inline run and joins neighbouring
/// leaves with identical formatting.
fn finish_inline(nodes: Vec<Node>) -> Vec<Node> {
    let mut out: Vec<Node> = Vec::with_capacity(nodes.len());
    for node in nodes {
        if let (Some(Node::Text(prev)), Node::Text(next)) = (out.last_mut(), &node)
            && prev.marks == next.marks
            && prev.color == next.color
        {
            prev.value.push_str(&next.value);
            continue;
        }
        out.push(node);
    }

    if let Some(Node::Text(first)) = out.first_mut() {
        first.value = first.value.trim_start().to_string();
    }
    if let Some(Node::Text(last)) = out.last_mut() {
        last.value = last.value.trim_end().to_string();
    }
    out
}

fn has_content(inline: &[Node]) -> bool {
    inline.iter().any(|n| match n {
        Node::Text(t) => !t.value.trim().is_empty(),
        Node::Link(l) => has_content(&l.children),
        other => other.is_void(),
    })
}
