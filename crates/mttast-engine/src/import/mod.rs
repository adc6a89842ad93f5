//! # Paste import
//!
//! Turns a clipboard payload into tree nodes and splices them in at the
//! caret.
//!
//! ## Source selection
//!
//! 1. Plain text that is a deep link (`hm://...`) is inserted literally.
//! 2. Plain text that looks like Markdown goes through the Markdown pipeline,
//!    unless HTML is also present and its text does not look like Markdown.
//! 3. Otherwise HTML goes through the HTML pipeline.
//! 4. Otherwise plain text is inserted literally, with line endings
//!    normalized to `\n`.
//!
//! ## Pipelines
//!
//! ```text
//! markdown ──pulldown-cmark──► html ──parse──► sanitize ──► tree nodes
//!                                                            │
//!                         (markdown only) nest under headings ◄┘
//!                                                            │
//!                               strip empty leaves, fresh ids ◄┘
//! ```
//!
//! ## Splicing
//!
//! If every parsed node is inline content it goes into the caret's text
//! leaf. Otherwise the blocks go into the child group of the block holding
//! the caret, ahead of any existing children.

pub mod html;
pub mod markdown;
pub mod to_mttast;

use thiserror::Error;

use crate::editor::{EditError, EditorCore};
use crate::ids::new_block_id;
use crate::mttast::{BlockKind, FlowContent, Group, GroupKind, Node, paragraph, statement, text};
use markdown::{looks_like_markdown, markdown_to_html, organize_by_headings};
use to_mttast::{has_block_elements, html_to_nodes};

/// Clipboard contents offered by the platform.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransferPayload {
    pub html: Option<String>,
    pub plain: Option<String>,
}

impl TransferPayload {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            html: None,
            plain: Some(text.into()),
        }
    }

    pub fn html(html: impl Into<String>, plain: impl Into<String>) -> Self {
        Self {
            html: Some(html.into()),
            plain: Some(plain.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportOptions {
    /// Schemes of internal links that are pasted as literal text.
    pub deep_link_schemes: Vec<String>,
    /// Route Markdown-looking text through the Markdown pipeline.
    pub detect_markdown: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            deep_link_schemes: vec!["hm://".to_string(), "mintter://".to_string()],
            detect_markdown: true,
        }
    }
}

/// Which pipeline handled a paste.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasteSource {
    DeepLink,
    Markdown,
    Html,
    PlainText,
}

/// Where the pasted content went.
#[derive(Debug, Clone, PartialEq)]
pub enum Placement {
    /// Nothing usable was found.
    Empty,
    Inline,
    /// Blocks inserted into the child group of `parent`.
    Blocks { parent: String, block_ids: Vec<String> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct PasteOutcome {
    pub source: PasteSource,
    pub placement: Placement,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PasteError {
    #[error("Paste needs a caret")]
    NoSelection,
    #[error("Caret is not inside a block, cannot paste blocks")]
    NoEnclosingBlock,
    #[error(transparent)]
    Edit(#[from] EditError),
}

/// Imports a clipboard payload at the editor's caret.
pub fn import_paste(
    editor: &mut impl EditorCore,
    payload: &TransferPayload,
    options: &ImportOptions,
) -> Result<PasteOutcome, PasteError> {
    if editor.selection().is_none() {
        return Err(PasteError::NoSelection);
    }

    let plain = payload.plain.as_deref().unwrap_or_default();
    let html = payload.html.as_deref().filter(|h| !h.trim().is_empty());

    if is_deep_link(plain, &options.deep_link_schemes) {
        editor.insert_text_at_selection(plain.trim())?;
        return Ok(PasteOutcome {
            source: PasteSource::DeepLink,
            placement: Placement::Inline,
        });
    }

    let (source, nodes) = if options.detect_markdown
        && looks_like_markdown(plain)
        && html.is_none_or(|h| looks_like_markdown(&html::strip_tags(h)))
    {
        (PasteSource::Markdown, parse_markdown(plain, options))
    } else if let Some(html) = html {
        (PasteSource::Html, parse_html(html, options))
    } else {
        let normalized = plain.replace("\r\n", "\n").replace('\r', "\n");
        if normalized.is_empty() {
            return Ok(PasteOutcome {
                source: PasteSource::PlainText,
                placement: Placement::Empty,
            });
        }
        editor.insert_text_at_selection(&normalized)?;
        return Ok(PasteOutcome {
            source: PasteSource::PlainText,
            placement: Placement::Inline,
        });
    };

    log::debug!("Pasting {} nodes from {source:?}", nodes.len());
    let placement = splice(editor, nodes)?;
    Ok(PasteOutcome { source, placement })
}

fn is_deep_link(plain: &str, schemes: &[String]) -> bool {
    let trimmed = plain.trim();
    !trimmed.contains(char::is_whitespace) && schemes.iter().any(|s| trimmed.starts_with(s.as_str()))
}

/// HTML pipeline: parse, sanitize, convert, clean up.
pub fn parse_html(html: &str, options: &ImportOptions) -> Vec<Node> {
    let clean = html::sanitize(html::parse(html), &options.deep_link_schemes);
    let nodes = html_to_nodes(&clean).into_iter().map(|t| t.node).collect();
    finalize(nodes, !has_block_elements(&clean))
}

/// Markdown pipeline: render to HTML, then the HTML pipeline with blocks
/// nested under their headings. Every rendered paragraph is a `<p>`, so a
/// lone paragraph such as `**bold**` still goes inline.
pub fn parse_markdown(markdown: &str, options: &ImportOptions) -> Vec<Node> {
    let html = markdown_to_html(markdown);
    let clean = html::sanitize(html::parse(&html), &options.deep_link_schemes);
    finalize(organize_by_headings(html_to_nodes(&clean)), true)
}

fn finalize(mut nodes: Vec<Node>, unwrap_inline: bool) -> Vec<Node> {
    for node in &mut nodes {
        strip_empty_text(node);
        assign_fresh_ids(node);
    }
    if unwrap_inline {
        unwrap_single_statement(nodes)
    } else {
        nodes
    }
}

/// A paste that amounts to one plain statement built from inline content is
/// inline content.
fn unwrap_single_statement(mut nodes: Vec<Node>) -> Vec<Node> {
    let is_plain_statement = matches!(
        nodes.as_slice(),
        [Node::FlowContent(b)]
            if b.kind == BlockKind::Statement
                && b.attributes.is_empty()
                && b.children.len() == 1
                && matches!(b.children[0], Node::Paragraph(_))
    );
    if !is_plain_statement {
        return nodes;
    }
    match nodes.pop() {
        Some(Node::FlowContent(mut block)) => match block.children.pop() {
            Some(Node::Paragraph(p)) => p
                .children
                .into_iter()
                .filter(|n| !matches!(n, Node::Text(t) if t.value.is_empty()))
                .collect(),
            _ => vec![],
        },
        _ => vec![],
    }
}

/// Removes empty text leaves, keeping the child of void nodes and one empty
/// leaf in an otherwise empty paragraph. Links left empty are removed too.
fn strip_empty_text(node: &mut Node) {
    if node.is_void() {
        return;
    }
    let is_paragraph = matches!(node, Node::Paragraph(_));
    let Some(children) = node.children_mut() else {
        return;
    };
    for child in children.iter_mut() {
        strip_empty_text(child);
    }
    children.retain(|c| match c {
        Node::Text(t) => !t.value.is_empty(),
        Node::Link(l) => !l.children.is_empty(),
        _ => true,
    });
    if is_paragraph && children.is_empty() {
        children.push(text(""));
    }
}

fn assign_fresh_ids(node: &mut Node) {
    if let Node::FlowContent(block) = node {
        block.id = new_block_id();
    }
    if let Some(children) = node.children_mut() {
        for child in children {
            assign_fresh_ids(child);
        }
    }
}

fn splice(editor: &mut impl EditorCore, nodes: Vec<Node>) -> Result<Placement, PasteError> {
    if nodes.is_empty() {
        return Ok(Placement::Empty);
    }
    if nodes.iter().all(Node::is_phrasing_content) {
        editor.insert_nodes_at_selection(nodes)?;
        return Ok(Placement::Inline);
    }

    let caret = editor
        .selection()
        .map(|s| s.path.clone())
        .ok_or(PasteError::NoSelection)?;
    let (block_path, parent) = editor
        .parent_block(&caret)
        .ok_or(PasteError::NoEnclosingBlock)?;
    let parent_id = parent.id.clone();
    let has_group = parent.group().is_some();
    let group_path = block_path.child(parent.group_index());

    let (list_kind, blocks) = into_blocks(nodes);
    let block_ids: Vec<String> = blocks.iter().filter_map(|b| b.block_id().map(str::to_string)).collect();

    if has_group {
        editor.insert_nodes(&group_path.child(0), blocks)?;
    } else {
        let group = Node::Group(Group {
            kind: list_kind.unwrap_or(GroupKind::Group),
            children: blocks,
        });
        editor.insert_nodes(&group_path, vec![group])?;
    }

    Ok(Placement::Blocks {
        parent: parent_id,
        block_ids,
    })
}

/// Flattens top-level nodes into blocks. The style of the first pasted list
/// is returned so a new group can adopt it.
fn into_blocks(nodes: Vec<Node>) -> (Option<GroupKind>, Vec<Node>) {
    let mut list_kind = None;
    let mut blocks = vec![];
    let mut inline = vec![];

    let flush = |inline: &mut Vec<Node>, blocks: &mut Vec<Node>| {
        if !inline.is_empty() {
            let block: FlowContent = statement(new_block_id(), vec![paragraph(std::mem::take(inline))]);
            blocks.push(Node::FlowContent(block));
        }
    };

    for node in nodes {
        match node {
            Node::Group(g) => {
                flush(&mut inline, &mut blocks);
                if list_kind.is_none() {
                    list_kind = Some(g.kind);
                }
                blocks.extend(g.children);
            }
            node if node.is_phrasing_content() => inline.push(node),
            node => {
                flush(&mut inline, &mut blocks);
                blocks.push(node);
            }
        }
    }
    flush(&mut inline, &mut blocks);
    (list_kind, blocks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::changes::create_update;
    use crate::editor::{Editor, Point};
    use crate::mttast::{Document, Mark, Path, Text};
    use pretty_assertions::assert_eq;

    fn editor_with_caret() -> Editor {
        let mut ed = Editor::new(Document::new(
            "d1",
            vec![statement("b1", vec![paragraph(vec![text("Hello world")])])],
        ));
        ed.set_selection(Some(Point::new([0, 0, 0, 0], 6)));
        ed
    }

    #[test]
    fn inline_html_goes_into_the_text_leaf() {
        let mut ed = editor_with_caret();
        let outcome = import_paste(
            &mut ed,
            &TransferPayload::html("<b>big</b> ", "big "),
            &ImportOptions::default(),
        )
        .unwrap();

        assert_eq!(outcome.source, PasteSource::Html);
        assert_eq!(outcome.placement, Placement::Inline);
        let Some(Node::Paragraph(p)) = ed.node(&Path::from([0, 0, 0])) else {
            panic!("expected paragraph");
        };
        assert_eq!(p.children[1], Text::new("big").with(Mark::Strong).into());
        assert_eq!(ed.document().blocks().len(), 1);
    }

    #[test]
    fn single_html_paragraph_stays_a_block() {
        let mut ed = editor_with_caret();
        let outcome = import_paste(
            &mut ed,
            &TransferPayload::html("<p>one</p>", "one"),
            &ImportOptions::default(),
        )
        .unwrap();

        assert_eq!(outcome.source, PasteSource::Html);
        let Placement::Blocks { parent, block_ids } = outcome.placement else {
            panic!("expected block placement");
        };
        assert_eq!(parent, "b1");
        assert_eq!(block_ids.len(), 1);
        assert_eq!(
            ed.node(&Path::from([0, 0, 0, 0])),
            Some(&text("Hello world"))
        );
        assert_eq!(
            ed.node(&Path::from([0, 0, 1, 0, 0, 0])),
            Some(&text("one"))
        );
    }

    #[test]
    fn single_markdown_paragraph_goes_inline() {
        let mut ed = editor_with_caret();
        let outcome = import_paste(
            &mut ed,
            &TransferPayload::plain("**bold**"),
            &ImportOptions::default(),
        )
        .unwrap();

        assert_eq!(outcome.source, PasteSource::Markdown);
        assert_eq!(outcome.placement, Placement::Inline);
    }

    #[test]
    fn block_html_goes_into_child_group() {
        let mut ed = editor_with_caret();
        let outcome = import_paste(
            &mut ed,
            &TransferPayload::html("<p>one</p><p>two</p>", "one\ntwo"),
            &ImportOptions::default(),
        )
        .unwrap();

        let Placement::Blocks { parent, block_ids } = outcome.placement else {
            panic!("expected blocks");
        };
        assert_eq!(parent, "b1");
        assert_eq!(block_ids.len(), 2);

        let blocks = ed.document().blocks();
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[1].0, Path::from([0, 0, 1, 0]));
        for id in &block_ids {
            assert!(ed.dirty().upsert_blocks.contains_key(id));
        }

        let update = create_update(ed.document(), ed.dirty());
        let cases: Vec<_> = update.changes.iter().map(|c| c.case()).collect();
        assert_eq!(
            cases,
            vec!["setTitle", "setSubtitle", "upsertBlock", "upsertBlock", "upsertBlock"]
        );
    }

    #[test]
    fn deep_links_are_literal_text() {
        let mut ed = editor_with_caret();
        let outcome = import_paste(
            &mut ed,
            &TransferPayload::html("<a href=\"hm://abc\">hm://abc</a>", "hm://abc"),
            &ImportOptions::default(),
        )
        .unwrap();

        assert_eq!(outcome.source, PasteSource::DeepLink);
        assert_eq!(
            ed.node(&Path::from([0, 0, 0, 0])),
            Some(&text("Hello hm://abcworld"))
        );
    }

    #[test]
    fn plain_text_line_endings_are_normalized() {
        let mut ed = editor_with_caret();
        import_paste(
            &mut ed,
            &TransferPayload::plain("a\r\nb\rc"),
            &ImportOptions::default(),
        )
        .unwrap();

        assert_eq!(
            ed.node(&Path::from([0, 0, 0, 0])),
            Some(&text("Hello a\nb\ncworld"))
        );
    }

    #[test]
    fn markdown_in_plain_text_is_parsed() {
        let mut ed = editor_with_caret();
        let outcome = import_paste(
            &mut ed,
            &TransferPayload::plain("# Notes\n\n- one\n- two"),
            &ImportOptions::default(),
        )
        .unwrap();

        assert_eq!(outcome.source, PasteSource::Markdown);
        let (_, b1) = ed.document().find_block("b1").unwrap();
        let heading = b1.group().unwrap().children[0].as_flow_content().unwrap();
        assert_eq!(heading.group().unwrap().kind, GroupKind::UnorderedList);
        assert_eq!(heading.group().unwrap().children.len(), 2);
    }

    #[test]
    fn rich_html_wins_over_markdown_looking_text() {
        let mut ed = editor_with_caret();
        let outcome = import_paste(
            &mut ed,
            &TransferPayload::html("<h1>Title</h1><p>body</p>", "# Title\n\nbody"),
            &ImportOptions::default(),
        )
        .unwrap();
        assert_eq!(outcome.source, PasteSource::Html);
    }

    #[test]
    fn markdown_disguised_as_html_is_parsed_as_markdown() {
        let mut ed = editor_with_caret();
        let outcome = import_paste(
            &mut ed,
            &TransferPayload::html(
                "<div><span># Title</span><br><span>- item</span></div>",
                "# Title\n- item",
            ),
            &ImportOptions::default(),
        )
        .unwrap();
        assert_eq!(outcome.source, PasteSource::Markdown);
        assert!(matches!(outcome.placement, Placement::Blocks { .. }));
    }

    #[test]
    fn markdown_detection_can_be_disabled() {
        let mut ed = editor_with_caret();
        let options = ImportOptions {
            detect_markdown: false,
            ..Default::default()
        };
        let outcome = import_paste(&mut ed, &TransferPayload::plain("**x**"), &options).unwrap();
        assert_eq!(outcome.source, PasteSource::PlainText);
    }

    #[test]
    fn block_paste_outside_a_block_fails_without_mutation() {
        let mut ed = Editor::new(Document::new("d1", vec![]));
        ed.set_selection(Some(Point::new([0], 0)));
        let before = ed.document().clone();

        let err = import_paste(
            &mut ed,
            &TransferPayload::html("<p>one</p><p>two</p>", "one\ntwo"),
            &ImportOptions::default(),
        )
        .unwrap_err();

        assert_eq!(err, PasteError::NoEnclosingBlock);
        assert_eq!(ed.document(), &before);
    }

    #[test]
    fn paste_without_caret_fails() {
        let mut ed = Editor::new(Document::draft("d1", "b1"));
        assert_eq!(
            import_paste(&mut ed, &TransferPayload::plain("x"), &ImportOptions::default()),
            Err(PasteError::NoSelection)
        );
    }

    #[test]
    fn scripts_never_reach_the_tree() {
        let nodes = parse_html(
            "<p>safe<script>alert(1)</script><a href=\"javascript:alert(1)\">click</a></p>",
            &ImportOptions::default(),
        );
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].text_content(), "safeclick");
        assert!(!format!("{nodes:?}").contains("javascript"));
    }

    #[test]
    fn imported_blocks_get_fresh_distinct_ids() {
        let nodes = parse_html("<ul><li>a</li><li>b</li></ul>", &ImportOptions::default());
        let ids = nodes[0].block_ids();
        assert_eq!(ids.len(), 2);
        assert!(ids.iter().all(|id| id.len() == 8));
        assert_ne!(ids[0], ids[1]);
    }
}
