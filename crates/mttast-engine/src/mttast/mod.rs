//! # mttast: the editor-side document tree
//!
//! The editor works on a nested tree of typed nodes. Hierarchy (nesting of
//! blocks) and inline structure (marks, links, embeds) live in the same tree
//! but at different levels:
//!
//! ```text
//! Document
//! └── Group                      (root, path [0])
//!     ├── FlowContent "b1"       (path [0, 0])
//!     │   ├── Paragraph          (path [0, 0, 0])
//!     │   │   ├── Text
//!     │   │   └── Link ── Text
//!     │   └── Group              (path [0, 0, 1])
//!     │       └── FlowContent "b2"   (path [0, 0, 1, 0])
//!     └── FlowContent "b3"       (path [0, 1])
//! ```
//!
//! ## Modules
//!
//! - **`path`**: `Path` addressing and lookups over node slices
//! - **`document`**: the editor-side `Document` (title, subtitle, root group)
//! - **`builders`**: terse constructors used by importers and tests
//!
//! Every node kind is a variant of [`Node`], so walkers match exhaustively
//! instead of probing for fields at runtime. [`Node::Unknown`] carries content
//! from a schema this version does not understand; converters skip it with a
//! warning.

pub mod builders;
pub mod document;
pub mod path;

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

pub use builders::*;
pub use document::Document;
pub use path::Path;

/// Object replacement character: the single character an embed, image, video
/// or file occupies in flattened block text.
pub const PLACEHOLDER: char = '\u{FFFC}';

/// Block type shared by tree blocks and wire blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BlockKind {
    Statement,
    Heading,
    Blockquote,
    Code,
    Callout,
}

impl BlockKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockKind::Statement => "statement",
            BlockKind::Heading => "heading",
            BlockKind::Blockquote => "blockquote",
            BlockKind::Code => "code",
            BlockKind::Callout => "callout",
        }
    }
}

/// List style of a [`Group`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupKind {
    Group,
    OrderedList { start: Option<u32> },
    UnorderedList,
}

impl GroupKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupKind::Group => "group",
            GroupKind::OrderedList { .. } => "orderedList",
            GroupKind::UnorderedList => "unorderedList",
        }
    }

    /// Parses the wire name of a list style, as stored in `childrenType`.
    pub fn from_wire(name: &str, start: Option<u32>) -> Option<Self> {
        match name {
            "group" => Some(GroupKind::Group),
            "orderedList" => Some(GroupKind::OrderedList { start }),
            "unorderedList" => Some(GroupKind::UnorderedList),
            _ => None,
        }
    }
}

/// Paragraphs in headings are "static": they cannot hold nested groups in
/// the editor and are rendered without list markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParagraphKind {
    Paragraph,
    Static,
}

/// Boolean formatting a text leaf can carry.
///
/// Declaration order is the order annotations of different types are emitted
/// in when they start at the same offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Mark {
    Strong,
    Emphasis,
    Underline,
    Strikethrough,
    Superscript,
    Subscript,
    Code,
}

impl Mark {
    pub const ALL: [Mark; 7] = [
        Mark::Strong,
        Mark::Emphasis,
        Mark::Underline,
        Mark::Strikethrough,
        Mark::Superscript,
        Mark::Subscript,
        Mark::Code,
    ];
}

/// A node of the editor tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Group(Group),
    FlowContent(FlowContent),
    Paragraph(Paragraph),
    Text(Text),
    Link(Link),
    Embed(Embed),
    Image(Media),
    Video(Media),
    File(FileNode),
    Unknown(UnknownNode),
}

/// Ordered list of blocks tagged with a list style.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub kind: GroupKind,
    pub children: Vec<Node>,
}

/// A block: the unit that gets a stable id and is saved as one wire `Block`.
///
/// `children[0]` is the block content (a paragraph, or media nodes for media
/// blocks, which may be several); the last child, when it is a [`Group`], is
/// the nested group.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowContent {
    pub id: String,
    pub kind: BlockKind,
    pub attributes: BTreeMap<String, String>,
    pub children: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Paragraph {
    pub kind: ParagraphKind,
    pub children: Vec<Node>,
}

/// A text leaf with its formatting.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Text {
    pub value: String,
    pub marks: BTreeSet<Mark>,
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub url: String,
    pub children: Vec<Node>,
}

/// Transclusion of another block. Void: its children are editor filler.
#[derive(Debug, Clone, PartialEq)]
pub struct Embed {
    pub url: String,
    pub children: Vec<Node>,
}

/// Image or video. Void like [`Embed`].
#[derive(Debug, Clone, PartialEq)]
pub struct Media {
    pub url: String,
    pub alt: String,
    pub children: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FileNode {
    pub url: String,
    pub name: String,
    pub children: Vec<Node>,
}

/// A node type this version does not know about.
#[derive(Debug, Clone, PartialEq)]
pub struct UnknownNode {
    pub kind: String,
    pub children: Vec<Node>,
}

impl Text {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            ..Default::default()
        }
    }

    pub fn with(mut self, mark: Mark) -> Self {
        self.marks.insert(mark);
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn has(&self, mark: Mark) -> bool {
        self.marks.contains(&mark)
    }
}

impl FlowContent {
    /// The block's content node (paragraph or first media node).
    pub fn content(&self) -> Option<&Node> {
        self.children.first()
    }

    pub fn group(&self) -> Option<&Group> {
        match self.children.last() {
            Some(Node::Group(g)) => Some(g),
            _ => None,
        }
    }

    pub fn group_mut(&mut self) -> Option<&mut Group> {
        match self.children.last_mut() {
            Some(Node::Group(g)) => Some(g),
            _ => None,
        }
    }

    /// Child index of the nested group, or where one would be appended.
    pub fn group_index(&self) -> usize {
        match self.group() {
            Some(_) => self.children.len() - 1,
            None => self.children.len(),
        }
    }

    /// Returns the nested group, appending an empty one of `kind` after the
    /// content if the block has none yet.
    pub fn ensure_group(&mut self, kind: GroupKind) -> &mut Group {
        if self.group().is_none() {
            self.children.push(Node::Group(Group {
                kind,
                children: vec![],
            }));
        }
        match self.children.last_mut() {
            Some(Node::Group(g)) => g,
            _ => unreachable!("a group was just appended"),
        }
    }

    /// Media blocks hold their media nodes directly instead of a paragraph.
    pub fn is_media_block(&self) -> bool {
        matches!(
            self.content(),
            Some(Node::Image(_) | Node::Video(_) | Node::File(_))
        )
    }

    /// Inline children that make up the block text.
    pub fn inline_children(&self) -> &[Node] {
        if self.is_media_block() {
            let end = if self.group().is_some() {
                self.children.len() - 1
            } else {
                self.children.len()
            };
            return &self.children[..end];
        }
        match self.content() {
            Some(Node::Paragraph(p)) => &p.children,
            _ => &[],
        }
    }
}

impl Node {
    pub fn is_flow_content(&self) -> bool {
        matches!(self, Node::FlowContent(_))
    }

    pub fn is_group_content(&self) -> bool {
        matches!(self, Node::Group(_))
    }

    pub fn is_phrasing_content(&self) -> bool {
        matches!(
            self,
            Node::Text(_)
                | Node::Link(_)
                | Node::Embed(_)
                | Node::Image(_)
                | Node::Video(_)
                | Node::File(_)
        )
    }

    /// Void inline nodes occupy one placeholder character and keep a single
    /// empty text child in the editor.
    pub fn is_void(&self) -> bool {
        matches!(
            self,
            Node::Embed(_) | Node::Image(_) | Node::Video(_) | Node::File(_)
        )
    }

    /// Schema name of the node, as it appears in diagnostics.
    pub fn type_name(&self) -> &str {
        match self {
            Node::Group(g) => g.kind.as_str(),
            Node::FlowContent(b) => b.kind.as_str(),
            Node::Paragraph(p) => match p.kind {
                ParagraphKind::Paragraph => "paragraph",
                ParagraphKind::Static => "staticParagraph",
            },
            Node::Text(_) => "text",
            Node::Link(_) => "link",
            Node::Embed(_) => "embed",
            Node::Image(_) => "image",
            Node::Video(_) => "video",
            Node::File(_) => "file",
            Node::Unknown(u) => &u.kind,
        }
    }

    pub fn block_id(&self) -> Option<&str> {
        match self {
            Node::FlowContent(b) => Some(&b.id),
            _ => None,
        }
    }

    pub fn as_flow_content(&self) -> Option<&FlowContent> {
        match self {
            Node::FlowContent(b) => Some(b),
            _ => None,
        }
    }

    pub fn children(&self) -> Option<&[Node]> {
        match self {
            Node::Group(n) => Some(&n.children),
            Node::FlowContent(n) => Some(&n.children),
            Node::Paragraph(n) => Some(&n.children),
            Node::Link(n) => Some(&n.children),
            Node::Embed(n) => Some(&n.children),
            Node::Image(n) | Node::Video(n) => Some(&n.children),
            Node::File(n) => Some(&n.children),
            Node::Unknown(n) => Some(&n.children),
            Node::Text(_) => None,
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<Node>> {
        match self {
            Node::Group(n) => Some(&mut n.children),
            Node::FlowContent(n) => Some(&mut n.children),
            Node::Paragraph(n) => Some(&mut n.children),
            Node::Link(n) => Some(&mut n.children),
            Node::Embed(n) => Some(&mut n.children),
            Node::Image(n) | Node::Video(n) => Some(&mut n.children),
            Node::File(n) => Some(&mut n.children),
            Node::Unknown(n) => Some(&mut n.children),
            Node::Text(_) => None,
        }
    }

    /// Concatenated text of all leaves below this node.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(self, &mut out);
        out
    }

    /// Ids of this node and every block nested below it, in document order.
    pub fn block_ids(&self) -> Vec<String> {
        let mut ids = vec![];
        collect_block_ids(self, &mut ids);
        ids
    }
}

fn collect_text(node: &Node, out: &mut String) {
    match node {
        Node::Text(t) => out.push_str(&t.value),
        other => {
            for child in other.children().unwrap_or(&[]) {
                collect_text(child, out);
            }
        }
    }
}

fn collect_block_ids(node: &Node, ids: &mut Vec<String>) {
    if let Node::FlowContent(b) = node {
        ids.push(b.id.clone());
    }
    for child in node.children().unwrap_or(&[]) {
        collect_block_ids(child, ids);
    }
}
