//! Terse constructors for tree nodes.
//!
//! Void nodes (embed, image, video, file) get the single empty text child the
//! editor keeps inside them.

use std::collections::BTreeMap;

use super::{
    BlockKind, Embed, FileNode, FlowContent, Group, GroupKind, Link, Media, Node, Paragraph,
    ParagraphKind, Text,
};

pub fn block(kind: BlockKind, id: impl Into<String>, children: Vec<Node>) -> FlowContent {
    FlowContent {
        id: id.into(),
        kind,
        attributes: BTreeMap::new(),
        children,
    }
}

pub fn statement(id: impl Into<String>, children: Vec<Node>) -> FlowContent {
    block(BlockKind::Statement, id, children)
}

pub fn heading(id: impl Into<String>, children: Vec<Node>) -> FlowContent {
    block(BlockKind::Heading, id, children)
}

pub fn paragraph(children: Vec<Node>) -> Node {
    Node::Paragraph(Paragraph {
        kind: ParagraphKind::Paragraph,
        children,
    })
}

pub fn static_paragraph(children: Vec<Node>) -> Node {
    Node::Paragraph(Paragraph {
        kind: ParagraphKind::Static,
        children,
    })
}

pub fn text(value: impl Into<String>) -> Node {
    Node::Text(Text::new(value))
}

pub fn link(url: impl Into<String>, children: Vec<Node>) -> Node {
    Node::Link(Link {
        url: url.into(),
        children,
    })
}

pub fn embed(url: impl Into<String>) -> Node {
    Node::Embed(Embed {
        url: url.into(),
        children: vec![text("")],
    })
}

pub fn image(url: impl Into<String>, alt: impl Into<String>) -> Node {
    Node::Image(Media {
        url: url.into(),
        alt: alt.into(),
        children: vec![text("")],
    })
}

pub fn video(url: impl Into<String>, alt: impl Into<String>) -> Node {
    Node::Video(Media {
        url: url.into(),
        alt: alt.into(),
        children: vec![text("")],
    })
}

pub fn file(url: impl Into<String>, name: impl Into<String>) -> Node {
    Node::File(FileNode {
        url: url.into(),
        name: name.into(),
        children: vec![text("")],
    })
}

pub fn group_of(kind: GroupKind, children: Vec<Node>) -> Node {
    Node::Group(Group { kind, children })
}

pub fn group(children: Vec<Node>) -> Node {
    group_of(GroupKind::Group, children)
}

pub fn ul(children: Vec<Node>) -> Node {
    group_of(GroupKind::UnorderedList, children)
}

pub fn ol(start: Option<u32>, children: Vec<Node>) -> Node {
    group_of(GroupKind::OrderedList { start }, children)
}

impl From<Text> for Node {
    fn from(t: Text) -> Self {
        Node::Text(t)
    }
}

impl From<FlowContent> for Node {
    fn from(b: FlowContent) -> Self {
        Node::FlowContent(b)
    }
}
