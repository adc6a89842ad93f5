//! Markdown side of the paste importer: detection, rendering to HTML, and
//! nesting of blocks under headings.

use std::sync::OnceLock;

use pulldown_cmark::{Options, Parser, html};
use regex::Regex;

use super::to_mttast::TopLevel;
use crate::mttast::{FlowContent, GroupKind, Node};

/// True if `text` contains Markdown syntax: ATX headings, bold/italic, links,
/// images, inline code, list items or fenced code.
pub fn looks_like_markdown(text: &str) -> bool {
    static MARKDOWN_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = MARKDOWN_REGEX.get_or_init(|| {
        Regex::new(concat!(
            r"(?m)^#{1,6} .+",
            r"|\*\*(.*?)\*\*|__(.*?)__|\*(.*?)\*|_(.*?)_",
            r"|!?\[.*?\]\(.*?\)",
            r"|`[^`\n]+`",
            r"|^[-+*] .+",
            r"|^\d+\. .+",
            r"|^```",
        ))
        .expect("Invalid markdown detection regex")
    });
    regex.is_match(text)
}

pub fn markdown_to_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    let parser = Parser::new_ext(markdown, options);
    let mut out = String::new();
    html::push_html(&mut out, parser);
    out
}

/// Nests each block under the closest preceding heading of a lower level.
///
/// A heading closes every open heading of the same or deeper level, so
/// `# A`, `## B`, text, `## C` gives `A { B { text }, C }`. A list under a
/// heading contributes its items to the heading's child group.
pub fn organize_by_headings(items: Vec<TopLevel>) -> Vec<Node> {
    let mut out: Vec<Node> = vec![];
    // Open headings: level plus index path (root index, then group indices).
    let mut open: Vec<(u8, Vec<usize>)> = vec![];

    for item in items {
        if let Some(level) = item.heading_level {
            while open.last().is_some_and(|(l, _)| *l >= level) {
                open.pop();
            }
        }

        let parent_path = open.last().map(|(_, p)| p.clone());
        let parent = match parent_path.as_deref() {
            Some(p) => block_at(&mut out, p),
            None => None,
        };

        let new_path = match parent {
            Some(parent) => match item.node {
                Node::Group(list) => {
                    parent
                        .ensure_group(list.kind)
                        .children
                        .extend(list.children);
                    None
                }
                node => {
                    let group = parent.ensure_group(GroupKind::Group);
                    group.children.push(node);
                    let mut path = parent_path.clone().unwrap_or_default();
                    path.push(group.children.len() - 1);
                    Some(path)
                }
            },
            None => {
                out.push(item.node);
                Some(vec![out.len() - 1])
            }
        };

        if let (Some(level), Some(path)) = (item.heading_level, new_path) {
            open.push((level, path));
        }
    }

    out
}

fn block_at<'a>(nodes: &'a mut [Node], path: &[usize]) -> Option<&'a mut FlowContent> {
    let (first, rest) = path.split_first()?;
    let Node::FlowContent(block) = nodes.get_mut(*first)? else {
        return None;
    };
    if rest.is_empty() {
        return Some(block);
    }
    block_at(&mut block.group_mut()?.children, rest)
}
