//! # Tree-to-block conversion
//!
//! [`block_to_api`] serializes one tree block into a wire [`Block`]: its
//! inline children are flattened into [`TextRun`]s and merged into text plus
//! annotations by [`merge_runs`]. Nested groups are not part of the block;
//! only their list style survives, as the `childrenType` and `start`
//! attributes.
//!
//! Inline content the converter does not understand is skipped. Each skip is
//! logged and reported as a [`ConversionWarning`] so callers that care (the
//! CLI, tests) can surface it.
//!
//! [`block_from_api`] goes the other way, for loading saved blocks.

mod from_api;

use std::fmt;

use thiserror::Error;

use crate::api::{AnnotationType, Block};
use crate::mttast::{FlowContent, GroupKind, Node};
use crate::spans::{MarkSpec, TextRun, merge_runs};

pub use from_api::block_from_api;

pub const CHILDREN_TYPE_ATTR: &str = "childrenType";
pub const START_ATTR: &str = "start";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConvertError {
    #[error("Node of type '{node_type}' is not a block")]
    NotABlock { node_type: String },
}

/// Inline content skipped during conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionWarning {
    pub block_id: String,
    pub node_type: String,
}

impl fmt::Display for ConversionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "skipped unsupported inline node '{}' in block {}",
            self.node_type, self.block_id
        )
    }
}

/// A converted block plus whatever was skipped along the way.
#[derive(Debug, Clone, PartialEq)]
pub struct Conversion {
    pub block: Block,
    pub warnings: Vec<ConversionWarning>,
}

/// Converts a tree node, which must be a block.
pub fn convert_block(node: &Node) -> Result<Conversion, ConvertError> {
    match node {
        Node::FlowContent(block) => Ok(convert_flow_content(block)),
        other => Err(ConvertError::NotABlock {
            node_type: other.type_name().to_string(),
        }),
    }
}

/// Converts a tree block into its wire form.
pub fn block_to_api(node: &Node) -> Result<Block, ConvertError> {
    convert_block(node).map(|c| c.block)
}

pub fn convert_flow_content(block: &FlowContent) -> Conversion {
    let mut flattener = Flattener {
        block_id: &block.id,
        runs: vec![],
        warnings: vec![],
    };
    flattener.flatten(block.inline_children(), &[]);

    let flat = merge_runs(&flattener.runs);

    let mut attributes = block.attributes.clone();
    attributes.remove(CHILDREN_TYPE_ATTR);
    attributes.remove(START_ATTR);
    if let Some(group) = block.group() {
        attributes.insert(CHILDREN_TYPE_ATTR.to_string(), group.kind.as_str().to_string());
        if let GroupKind::OrderedList { start: Some(start) } = group.kind {
            attributes.insert(START_ATTR.to_string(), start.to_string());
        }
    }

    Conversion {
        block: Block {
            id: block.id.clone(),
            kind: block.kind,
            text: flat.text,
            annotations: flat.annotations,
            attributes,
        },
        warnings: flattener.warnings,
    }
}

struct Flattener<'a> {
    block_id: &'a str,
    runs: Vec<TextRun>,
    warnings: Vec<ConversionWarning>,
}

impl Flattener<'_> {
    fn flatten(&mut self, nodes: &[Node], inherited: &[MarkSpec]) {
        for node in nodes {
            match node {
                Node::Text(t) => {
                    let mut marks = inherited.to_vec();
                    marks.extend(t.marks.iter().map(|m| MarkSpec::plain((*m).into())));
                    if let Some(color) = &t.color {
                        marks.push(MarkSpec::plain(AnnotationType::Color).with_attr("color", color));
                    }
                    self.runs.push(TextRun::new(t.value.clone(), marks));
                }
                Node::Link(l) => {
                    let mut marks = inherited.to_vec();
                    marks.push(MarkSpec::plain(AnnotationType::Link).with_attr("url", &l.url));
                    self.flatten(&l.children, &marks);
                }
                Node::Embed(e) => {
                    self.placeholder(
                        inherited,
                        MarkSpec::plain(AnnotationType::Embed).with_attr("url", &e.url),
                    );
                }
                Node::Image(m) => {
                    self.placeholder(
                        inherited,
                        MarkSpec::plain(AnnotationType::Image)
                            .with_attr("url", &m.url)
                            .with_attr("alt", &m.alt),
                    );
                }
                Node::Video(m) => {
                    self.placeholder(
                        inherited,
                        MarkSpec::plain(AnnotationType::Video)
                            .with_attr("url", &m.url)
                            .with_attr("alt", &m.alt),
                    );
                }
                Node::File(f) => {
                    self.placeholder(
                        inherited,
                        MarkSpec::plain(AnnotationType::File)
                            .with_attr("url", &f.url)
                            .with_attr("name", &f.name),
                    );
                }
                other => {
                    let warning = ConversionWarning {
                        block_id: self.block_id.to_string(),
                        node_type: other.type_name().to_string(),
                    };
                    log::warn!("{warning}");
                    self.warnings.push(warning);
                }
            }
        }
    }

    fn placeholder(&mut self, inherited: &[MarkSpec], atomic: MarkSpec) {
        let mut run = TextRun::placeholder(atomic);
        run.marks.splice(0..0, inherited.iter().cloned());
        self.runs.push(run);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Annotation;
    use crate::mttast::{
        Mark, Text, UnknownNode, embed, heading, link, ol, paragraph, statement, text,
    };
    use pretty_assertions::assert_eq;

    fn convert(block: FlowContent) -> Block {
        block_to_api(&Node::FlowContent(block)).unwrap()
    }

    #[test]
    fn simple_marks() {
        let block = convert(statement(
            "b1",
            vec![paragraph(vec![
                Text::new("A ").with(Mark::Strong).into(),
                Text::new("B ").with(Mark::Emphasis).into(),
                Text::new("C ").with(Mark::Underline).into(),
            ])],
        ));

        assert_eq!(block.text, "A B C ");
        assert_eq!(
            block.annotations,
            vec![
                Annotation::new(AnnotationType::Strong, 0, 2),
                Annotation::new(AnnotationType::Emphasis, 2, 4),
                Annotation::new(AnnotationType::Underline, 4, 6),
            ]
        );
    }

    #[test]
    fn links_with_marks() {
        let block = convert(statement(
            "b1",
            vec![paragraph(vec![
                text("Hello "),
                link(
                    "https://example.com",
                    vec![text("this is "), Text::new("bold").with(Mark::Strong).into()],
                ),
                text("!"),
            ])],
        ));

        assert_eq!(block.text, "Hello this is bold!");
        assert_eq!(
            block.annotations,
            vec![
                Annotation::new(AnnotationType::Link, 6, 18).with_attr("url", "https://example.com"),
                Annotation::new(AnnotationType::Strong, 14, 18),
            ]
        );
    }

    #[test]
    fn adjacent_links_stay_separate() {
        let block = convert(statement(
            "b1",
            vec![paragraph(vec![
                link("https://a.com", vec![text("Mintter")]),
                link("https://b.com", vec![text(" app")]),
            ])],
        ));

        assert_eq!(
            block.annotations,
            vec![
                Annotation::new(AnnotationType::Link, 0, 7).with_attr("url", "https://a.com"),
                Annotation::new(AnnotationType::Link, 7, 11).with_attr("url", "https://b.com"),
            ]
        );
    }

    #[test]
    fn embeds_separated_by_text() {
        let block = convert(statement(
            "b1",
            vec![paragraph(vec![
                text("Hello embeds "),
                embed("hm://doc/a"),
                text(" separated by text "),
                embed("hm://doc/b"),
            ])],
        ));

        let positions: Vec<_> = block
            .annotations
            .iter()
            .map(|a| (a.kind, a.start, a.end))
            .collect();
        assert_eq!(
            positions,
            vec![
                (AnnotationType::Embed, 13, 14),
                (AnnotationType::Embed, 33, 34)
            ]
        );
        assert_eq!(block.annotations[1].attr("url"), Some("hm://doc/b"));
    }

    #[test]
    fn no_marks_gives_empty_annotations() {
        let block = convert(heading("h1", vec![paragraph(vec![text("Title")])]));
        assert!(block.annotations.is_empty());
        assert!(block.attributes.is_empty());
    }

    #[test]
    fn unknown_inline_nodes_are_skipped_with_warning() {
        let conversion = convert_flow_content(&statement(
            "b1",
            vec![paragraph(vec![
                text("a"),
                Node::Unknown(UnknownNode {
                    kind: "mention".into(),
                    children: vec![text("ignored")],
                }),
                text("b"),
            ])],
        ));

        assert_eq!(conversion.block.text, "ab");
        assert_eq!(
            conversion.warnings,
            vec![ConversionWarning {
                block_id: "b1".into(),
                node_type: "mention".into()
            }]
        );
    }

    #[test]
    fn group_style_becomes_attributes() {
        let mut block = statement("b1", vec![paragraph(vec![text("list")])]);
        block.children.push(ol(Some(3), vec![]));
        let api = convert(block);

        assert_eq!(api.attributes.get("childrenType").map(String::as_str), Some("orderedList"));
        assert_eq!(api.attributes.get("start").map(String::as_str), Some("3"));
    }

    #[test]
    fn non_block_is_rejected() {
        let err = block_to_api(&text("loose")).unwrap_err();
        assert_eq!(
            err,
            ConvertError::NotABlock {
                node_type: "text".into()
            }
        );
    }
}
