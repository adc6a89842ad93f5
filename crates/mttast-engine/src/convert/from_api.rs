use std::collections::BTreeSet;

use super::{CHILDREN_TYPE_ATTR, START_ATTR};
use crate::api::{Annotation, AnnotationType, Block};
use crate::mttast::{
    BlockKind, FlowContent, Group, GroupKind, Link, Node, Text, embed, file, image, paragraph,
    static_paragraph, text, video,
};
use crate::spans::Utf16Index;

/// Rebuilds a tree block from its wire form.
///
/// Text is split at every annotation boundary; each segment takes the marks
/// of the annotations covering it. Consecutive segments under a link with
/// the same url share one `Link` node. Placeholders covered by an atomic
/// annotation turn back into embed/media nodes. A `childrenType` attribute
/// becomes an empty child group of that style, ready to receive children.
pub fn block_from_api(block: &Block) -> FlowContent {
    let index = Utf16Index::new(&block.text);
    let annotations: Vec<&Annotation> = block
        .annotations
        .iter()
        .filter(|a| a.start < a.end && a.end <= index.len())
        .collect();

    let mut cuts = BTreeSet::from([0, index.len()]);
    for a in &annotations {
        cuts.insert(a.start);
        cuts.insert(a.end);
    }
    // Offsets inside a surrogate pair cannot be sliced; drop them.
    let cuts: Vec<(usize, usize)> = cuts
        .into_iter()
        .filter_map(|u| index.byte_offset(u).map(|b| (u, b)))
        .collect();

    let mut builder = InlineBuilder::default();
    for pair in cuts.windows(2) {
        let ((u_start, b_start), (u_end, b_end)) = (pair[0], pair[1]);
        let covering: Vec<&Annotation> = annotations
            .iter()
            .copied()
            .filter(|a| a.start <= u_start && a.end >= u_end)
            .collect();
        builder.push_segment(&block.text[b_start..b_end], u_end - u_start, &covering);
    }
    let inline = builder.finish();

    let mut attributes = block.attributes.clone();
    let children_type = attributes.remove(CHILDREN_TYPE_ATTR);
    let start = attributes
        .remove(START_ATTR)
        .and_then(|s| s.parse::<u32>().ok());

    let is_media = !inline.is_empty()
        && inline
            .iter()
            .all(|n| matches!(n, Node::Image(_) | Node::Video(_) | Node::File(_)));
    let mut children = if is_media {
        inline
    } else if block.kind == BlockKind::Heading {
        vec![static_paragraph(non_empty(inline))]
    } else {
        vec![paragraph(non_empty(inline))]
    };

    if let Some(kind) = children_type
        .as_deref()
        .and_then(|name| GroupKind::from_wire(name, start))
    {
        children.push(Node::Group(Group {
            kind,
            children: vec![],
        }));
    }

    FlowContent {
        id: block.id.clone(),
        kind: block.kind,
        attributes,
        children,
    }
}

fn non_empty(inline: Vec<Node>) -> Vec<Node> {
    if inline.is_empty() {
        vec![text("")]
    } else {
        inline
    }
}

#[derive(Default)]
struct InlineBuilder {
    nodes: Vec<Node>,
}

impl InlineBuilder {
    fn push_segment(&mut self, segment: &str, units: usize, covering: &[&Annotation]) {
        let link_url = covering
            .iter()
            .find(|a| a.kind == AnnotationType::Link)
            .map(|a| a.attr("url").unwrap_or_default().to_string());

        let node = covering
            .iter()
            .find(|a| a.kind.is_atomic())
            .filter(|_| units == 1)
            .map(|a| atomic_node(a))
            .unwrap_or_else(|| Node::Text(styled_text(segment, covering)));

        match link_url {
            Some(url) => {
                if let Some(Node::Link(link)) = self.nodes.last_mut()
                    && link.url == url
                {
                    push_coalesced(&mut link.children, node);
                    return;
                }
                self.nodes.push(Node::Link(Link {
                    url,
                    children: vec![node],
                }));
            }
            None => push_coalesced(&mut self.nodes, node),
        }
    }

    fn finish(self) -> Vec<Node> {
        self.nodes
    }
}

/// Appends `node`, joining it onto a preceding text leaf with identical
/// formatting.
fn push_coalesced(nodes: &mut Vec<Node>, node: Node) {
    if let (Some(Node::Text(prev)), Node::Text(next)) = (nodes.last_mut(), &node)
        && prev.marks == next.marks
        && prev.color == next.color
    {
        prev.value.push_str(&next.value);
        return;
    }
    nodes.push(node);
}

fn styled_text(segment: &str, covering: &[&Annotation]) -> Text {
    Text {
        value: segment.to_string(),
        marks: covering.iter().filter_map(|a| a.kind.as_mark()).collect(),
        color: covering
            .iter()
            .find(|a| a.kind == AnnotationType::Color)
            .and_then(|a| a.attr("color"))
            .map(str::to_string),
    }
}

fn atomic_node(a: &Annotation) -> Node {
    let url = a.attr("url").unwrap_or_default();
    match a.kind {
        AnnotationType::Image => image(url, a.attr("alt").unwrap_or_default()),
        AnnotationType::Video => video(url, a.attr("alt").unwrap_or_default()),
        AnnotationType::File => file(url, a.attr("name").unwrap_or_default()),
        _ => embed(url),
    }
}
