use super::path::{node_at, node_at_mut};
use super::{FlowContent, Group, GroupKind, Node, Path, paragraph, statement, text};

/// Editor-side document: metadata plus the node tree.
///
/// `children[0]` is the root [`Group`]; root-level blocks live at `[0, i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub title: String,
    pub subtitle: String,
    pub children: Vec<Node>,
}

impl Document {
    /// Creates a document whose root group holds `blocks`.
    pub fn new(id: impl Into<String>, blocks: Vec<FlowContent>) -> Self {
        Self {
            id: id.into(),
            title: String::new(),
            subtitle: String::new(),
            children: vec![Node::Group(Group {
                kind: GroupKind::Group,
                children: blocks.into_iter().map(Node::FlowContent).collect(),
            })],
        }
    }

    /// A fresh draft with a single empty statement, the way the editor starts.
    pub fn draft(id: impl Into<String>, first_block_id: impl Into<String>) -> Self {
        Self::new(
            id,
            vec![statement(first_block_id, vec![paragraph(vec![text("")])])],
        )
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = subtitle.into();
        self
    }

    pub fn node(&self, path: &Path) -> Option<&Node> {
        node_at(&self.children, path.as_slice())
    }

    pub fn node_mut(&mut self, path: &Path) -> Option<&mut Node> {
        node_at_mut(&mut self.children, path.as_slice())
    }

    pub fn root_group(&self) -> Option<&Group> {
        match self.children.first() {
            Some(Node::Group(g)) => Some(g),
            _ => None,
        }
    }

    /// All blocks with their paths, in document order.
    pub fn blocks(&self) -> Vec<(Path, &FlowContent)> {
        let mut out = vec![];
        for (i, node) in self.children.iter().enumerate() {
            walk_blocks(node, Path::new(vec![i]), &mut out);
        }
        out
    }

    pub fn find_block(&self, id: &str) -> Option<(Path, &FlowContent)> {
        self.blocks().into_iter().find(|(_, b)| b.id == id)
    }

    pub fn contains_block(&self, id: &str) -> bool {
        self.find_block(id).is_some()
    }
}

fn walk_blocks<'a>(node: &'a Node, path: Path, out: &mut Vec<(Path, &'a FlowContent)>) {
    if let Node::FlowContent(b) = node {
        out.push((path.clone(), b));
    }
    // Blocks only nest through groups; paragraphs and inline nodes never hold
    // blocks.
    match node {
        Node::Group(_) | Node::FlowContent(_) => {
            for (i, child) in node.children().unwrap_or(&[]).iter().enumerate() {
                walk_blocks(child, path.child(i), out);
            }
        }
        _ => {}
    }
}
