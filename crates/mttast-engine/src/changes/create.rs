use crate::api::{DocumentChange, DocumentUpdate};
use crate::changes::DirtyBlocks;
use crate::convert::convert_flow_content;
use crate::mttast::{Document, FlowContent, Node, Path};

/// A dirty entry found at its recorded path.
struct Resolved<'a> {
    path: Path,
    block: &'a FlowContent,
    parent: String,
    left_sibling: String,
    upsert: bool,
}

/// Packages the dirty record into an update request for `document`.
///
/// Order: title, subtitle, then block upserts/moves in document order, then
/// deletes. Entries whose path no longer points at their block are skipped.
pub fn create_update(document: &Document, dirty: &DirtyBlocks) -> DocumentUpdate {
    let mut changes = vec![
        DocumentChange::set_title(document.title.clone()),
        DocumentChange::set_subtitle(document.subtitle.clone()),
    ];

    let mut resolved = vec![];
    for (id, path) in &dirty.upsert_blocks {
        let moved_to = dirty.move_blocks.get(id).and_then(Option::as_ref);
        let found = resolve(document, id, path.as_ref(), true)
            .or_else(|| resolve(document, id, moved_to, true));
        if let Some(r) = found {
            resolved.push(r);
        }
    }
    for (id, path) in &dirty.move_blocks {
        if dirty.upsert_blocks.contains_key(id) {
            continue;
        }
        if let Some(r) = resolve(document, id, path.as_ref(), false) {
            resolved.push(r);
        }
    }
    resolved.sort_by(|a, b| a.path.cmp(&b.path));

    for r in resolved {
        let change = if r.upsert {
            let conversion = convert_flow_content(r.block);
            DocumentChange::upsert_block(conversion.block, r.parent, r.left_sibling)
        } else {
            DocumentChange::move_block(r.block.id.clone(), r.parent, r.left_sibling)
        };
        changes.push(change);
    }

    let mut deleted: Vec<&str> = vec![];
    for id in &dirty.delete_blocks {
        if document.contains_block(id) {
            log::debug!("Block {id} is still in the document, not deleting it");
            continue;
        }
        if !deleted.contains(&id.as_str()) {
            deleted.push(id);
            changes.push(DocumentChange::delete_block(id.clone()));
        }
    }

    log::debug!(
        "Computed {} changes for document {}",
        changes.len(),
        document.id
    );

    DocumentUpdate {
        document_id: document.id.clone(),
        changes,
    }
}

fn resolve<'a>(
    document: &'a Document,
    id: &str,
    path: Option<&Path>,
    upsert: bool,
) -> Option<Resolved<'a>> {
    let Some(path) = path else {
        log::debug!("Dirty block {id} has no recorded path, skipping");
        return None;
    };

    let block = match document.node(path) {
        Some(Node::FlowContent(b)) if b.id == id => b,
        _ => {
            log::warn!("Dirty block {id} is no longer at {path}, skipping");
            return None;
        }
    };

    let group_path = path.parent()?;
    if !matches!(document.node(&group_path), Some(Node::Group(_))) {
        log::warn!("Dirty block {id} at {path} is not inside a group, skipping");
        return None;
    }

    let parent = nearest_block_ancestor(document, &group_path)
        .map(|b| b.id.clone())
        .unwrap_or_default();
    let left_sibling = path
        .previous()
        .and_then(|p| document.node(&p))
        .and_then(Node::block_id)
        .unwrap_or_default()
        .to_string();

    Some(Resolved {
        path: path.clone(),
        block,
        parent,
        left_sibling,
        upsert,
    })
}

fn nearest_block_ancestor<'a>(document: &'a Document, from: &Path) -> Option<&'a FlowContent> {
    let mut current = from.parent();
    while let Some(path) = current {
        if let Some(Node::FlowContent(b)) = document.node(&path) {
            return Some(b);
        }
        current = path.parent();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ChangeOp;
    use crate::mttast::{GroupKind, paragraph, statement, text};
    use pretty_assertions::assert_eq;

    fn block(id: &str, value: &str) -> FlowContent {
        statement(id, vec![paragraph(vec![text(value)])])
    }

    fn cases(update: &DocumentUpdate) -> Vec<(&'static str, Option<&str>)> {
        update
            .changes
            .iter()
            .map(|c| (c.case(), c.block_id()))
            .collect()
    }

    #[test]
    fn title_and_subtitle_come_first() {
        let doc = Document::draft("d1", "b1")
            .with_title("Hello")
            .with_subtitle("World");
        let update = create_update(&doc, &DirtyBlocks::new());

        assert_eq!(update.document_id, "d1");
        assert_eq!(
            update.changes,
            vec![
                DocumentChange::set_title("Hello"),
                DocumentChange::set_subtitle("World")
            ]
        );
    }

    #[test]
    fn moved_block_gets_relative_position() {
        let doc = Document::new("d1", vec![block("b1", "one"), block("b2", "two")]);
        let mut dirty = DirtyBlocks::new();
        dirty.mark_moved("b2", Some(Path::from([0, 1])));

        let update = create_update(&doc, &dirty);
        assert_eq!(update.changes[2], DocumentChange::move_block("b2", "", "b1"));
    }

    #[test]
    fn nested_upsert_names_parent_block() {
        let mut parent = block("b1", "parent");
        let g = parent.ensure_group(GroupKind::UnorderedList);
        g.children.push(block("c1", "first").into());
        g.children.push(block("c2", "second").into());
        let doc = Document::new("d1", vec![parent]);

        let mut dirty = DirtyBlocks::new();
        dirty.mark_upsert("c2", Some(Path::from([0, 0, 1, 1])));
        dirty.mark_upsert("c1", Some(Path::from([0, 0, 1, 0])));

        let update = create_update(&doc, &dirty);
        let ChangeOp::UpsertBlock(first) = &update.changes[2].op else {
            panic!("expected upsert");
        };
        assert_eq!(first.block.id, "c1");
        assert_eq!((first.parent.as_str(), first.left_sibling.as_str()), ("b1", ""));
        let ChangeOp::UpsertBlock(second) = &update.changes[3].op else {
            panic!("expected upsert");
        };
        assert_eq!((second.parent.as_str(), second.left_sibling.as_str()), ("b1", "c1"));
    }

    #[test]
    fn stale_paths_are_skipped() {
        let doc = Document::new("d1", vec![block("b1", "one")]);
        let mut dirty = DirtyBlocks::new();
        dirty.mark_upsert("b1", Some(Path::from([0, 4])));
        dirty.mark_upsert("other", Some(Path::from([0, 0])));
        dirty.mark_moved("b1", Some(Path::from([0, 0, 0])));
        dirty.mark_upsert("none", None);

        let update = create_update(&doc, &dirty);
        assert_eq!(update.changes.len(), 2);
    }

    #[test]
    fn upsert_falls_back_to_the_move_path() {
        let doc = Document::new("d1", vec![block("b2", "two"), block("b1", "one")]);
        let mut dirty = DirtyBlocks::new();
        dirty.mark_upsert("b1", Some(Path::from([0, 0])));
        dirty.mark_moved("b1", Some(Path::from([0, 1])));

        let update = create_update(&doc, &dirty);
        assert_eq!(
            cases(&update),
            vec![
                ("setTitle", None),
                ("setSubtitle", None),
                ("upsertBlock", Some("b1")),
            ]
        );
    }

    #[test]
    fn deletes_come_after_positional_changes() {
        let doc = Document::new("d1", vec![block("b1", "one"), block("b3", "three")]);
        let mut dirty = DirtyBlocks::new();
        dirty.mark_deleted("b2");
        dirty.mark_upsert("b3", Some(Path::from([0, 1])));
        dirty.mark_moved("b1", Some(Path::from([0, 0])));

        let update = create_update(&doc, &dirty);
        assert_eq!(
            cases(&update),
            vec![
                ("setTitle", None),
                ("setSubtitle", None),
                ("moveBlock", Some("b1")),
                ("upsertBlock", Some("b3")),
                ("deleteBlock", Some("b2")),
            ]
        );
    }

    #[test]
    fn upsert_and_move_of_same_block_emit_one_upsert() {
        let doc = Document::new("d1", vec![block("b1", "one"), block("b2", "two")]);
        let mut dirty = DirtyBlocks::new();
        dirty.mark_upsert("b2", Some(Path::from([0, 1])));
        dirty.mark_moved("b2", Some(Path::from([0, 1])));

        let update = create_update(&doc, &dirty);
        assert_eq!(
            cases(&update)[2..],
            [("upsertBlock", Some("b2"))]
        );
    }

    #[test]
    fn blocks_still_present_are_not_deleted() {
        let doc = Document::new("d1", vec![block("b1", "one")]);
        let dirty = DirtyBlocks {
            delete_blocks: vec!["b1".into(), "gone".into()],
            ..Default::default()
        };

        let update = create_update(&doc, &dirty);
        assert_eq!(update.changes[2..], [DocumentChange::delete_block("gone")]);
    }
}
