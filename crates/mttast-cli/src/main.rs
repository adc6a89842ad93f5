use anyhow::{Context, Result, bail};
use mttast_config::{Config, PasteConfig};
use mttast_engine::editor::{Cmd, Editor, EditorCore, Point};
use mttast_engine::ids::{new_block_id, new_document_id};
use mttast_engine::import::{ImportOptions, Placement, TransferPayload, html, import_paste};
use mttast_engine::{DirtyBlocks, Document, DocumentUpdate, Node, create_update};
use std::{env, fs, path::PathBuf, process};

#[derive(Debug, PartialEq)]
struct ImportArgs {
    file: PathBuf,
    title: Option<String>,
    out: bool,
}

fn usage(program: &str) -> String {
    format!("Usage: {program} import <file> [--title <title>] [--out]")
}

fn parse_args(args: &[String]) -> Result<ImportArgs> {
    let mut rest = args.iter().skip(1);
    match rest.next().map(String::as_str) {
        Some("import") => {}
        Some(other) => bail!("Unknown command '{other}'"),
        None => bail!("Missing command"),
    }

    let mut file = None;
    let mut title = None;
    let mut out = false;
    while let Some(arg) = rest.next() {
        match arg.as_str() {
            "--title" => {
                title = Some(rest.next().context("--title needs a value")?.clone());
            }
            "--out" => out = true,
            flag if flag.starts_with("--") => bail!("Unknown option '{flag}'"),
            path if file.is_none() => file = Some(PathBuf::from(path)),
            extra => bail!("Unexpected argument '{extra}'"),
        }
    }

    Ok(ImportArgs {
        file: file.context("Missing file to import")?,
        title,
        out,
    })
}

fn import_options(paste: &PasteConfig) -> ImportOptions {
    ImportOptions {
        deep_link_schemes: paste.deep_link_schemes.clone(),
        detect_markdown: paste.detect_markdown,
    }
}

fn payload_for(file: &std::path::Path, content: String) -> TransferPayload {
    let is_html = file
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("html") || e.eq_ignore_ascii_case("htm"));
    if is_html {
        let plain = html::strip_tags(&content);
        TransferPayload::html(content, plain)
    } else {
        TransferPayload::plain(content)
    }
}

/// Imports `payload` into a fresh draft and returns the update that creates it.
///
/// Pasted blocks end up at the root of the draft rather than under its empty
/// first block.
fn import_into_draft(
    payload: &TransferPayload,
    title: Option<String>,
    options: &ImportOptions,
) -> Result<DocumentUpdate> {
    let mut editor = Editor::new(Document::draft(new_document_id(), new_block_id()));
    editor.set_selection(Some(Point::new([0, 0, 0, 0], 0)));

    let outcome = import_paste(&mut editor, payload, options)?;
    log::info!(
        "Imported {:?} content as {:?}",
        outcome.source,
        outcome.placement
    );

    if let Some(title) = title {
        editor.apply(Cmd::SetTitle(title))?;
    }

    if !matches!(outcome.placement, Placement::Blocks { .. }) {
        return Ok(create_update(editor.document(), editor.dirty()));
    }

    let mut document = editor.into_document();
    lift_into_root(&mut document);
    let mut dirty = DirtyBlocks::new();
    for (path, block) in document.blocks() {
        dirty.mark_upsert(block.id.clone(), Some(path));
    }
    Ok(create_update(&document, &dirty))
}

/// Replaces the draft's only block with the blocks nested under it.
fn lift_into_root(document: &mut Document) {
    let Some(Node::Group(root)) = document.children.first_mut() else {
        return;
    };
    if let [Node::FlowContent(placeholder)] = root.children.as_mut_slice()
        && let Some(group) = placeholder.group_mut()
    {
        let kind = group.kind;
        let blocks = std::mem::take(&mut group.children);
        root.kind = kind;
        root.children = blocks;
    }
}

fn run(args: ImportArgs, config: Config) -> Result<()> {
    let options = import_options(&config.paste);

    let content = fs::read_to_string(&args.file)
        .with_context(|| format!("Failed to read '{}'", args.file.display()))?;
    let payload = payload_for(&args.file, content);

    let update = import_into_draft(&payload, args.title, &options)?;
    let json = serde_json::to_string_pretty(&update)?;

    if !args.out {
        println!("{json}");
        return Ok(());
    }

    fs::create_dir_all(&config.drafts_path).with_context(|| {
        format!(
            "Failed to create drafts directory '{}'",
            config.drafts_path.display()
        )
    })?;
    let target = config.draft_file(&update.document_id);
    fs::write(&target, json)?;
    log::info!("Wrote draft update to {}", target.display());
    println!("{}", target.display());
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args: Vec<String> = env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("mttast-cli");

    let import_args = match parse_args(&args) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!("{}", usage(program));
            process::exit(1);
        }
    };

    let config = match Config::load() {
        Ok(config) => config.unwrap_or_default(),
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };

    run(import_args, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mttast_engine::api::ChangeOp;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_import_with_options() {
        let parsed = parse_args(&args(&[
            "mttast-cli",
            "import",
            "page.html",
            "--title",
            "Page",
            "--out",
        ]))
        .unwrap();

        assert_eq!(
            parsed,
            ImportArgs {
                file: PathBuf::from("page.html"),
                title: Some("Page".to_string()),
                out: true,
            }
        );
    }

    #[test]
    fn rejects_bad_invocations() {
        assert!(parse_args(&args(&["mttast-cli"])).is_err());
        assert!(parse_args(&args(&["mttast-cli", "export", "x"])).is_err());
        assert!(parse_args(&args(&["mttast-cli", "import"])).is_err());
        assert!(parse_args(&args(&["mttast-cli", "import", "a", "b"])).is_err());
        assert!(parse_args(&args(&["mttast-cli", "import", "a", "--title"])).is_err());
    }

    #[test]
    fn html_files_carry_plain_text_too() {
        let payload = payload_for(std::path::Path::new("x.HTML"), "<p>a</p>".to_string());
        assert_eq!(payload.plain.as_deref(), Some("a"));

        let payload = payload_for(std::path::Path::new("x.md"), "# a".to_string());
        assert_eq!(payload.html, None);
    }

    #[test]
    fn imported_draft_starts_with_title_then_blocks() {
        let update = import_into_draft(
            &TransferPayload::plain("# Notes\n\n- one\n- two"),
            Some("Notes".to_string()),
            &ImportOptions::default(),
        )
        .unwrap();

        assert_eq!(update.changes[0].op, ChangeOp::SetTitle("Notes".to_string()));
        let blocks: Vec<(String, String)> = update
            .changes
            .iter()
            .filter_map(|c| match &c.op {
                ChangeOp::UpsertBlock(u) => Some((u.block.text.clone(), u.parent.clone())),
                _ => None,
            })
            .collect();
        // The heading sits at the root with its two items under it.
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0], ("Notes".to_string(), String::new()));
        assert_eq!(blocks[1].0, "one");
        assert_eq!(blocks[2].0, "two");
        assert!(
            update
                .changes
                .iter()
                .all(|c| c.case() != "deleteBlock")
        );
    }

    #[test]
    fn inline_import_fills_the_draft_block() {
        let update = import_into_draft(
            &TransferPayload::plain("just words"),
            None,
            &ImportOptions::default(),
        )
        .unwrap();

        let texts: Vec<&str> = update
            .changes
            .iter()
            .filter_map(|c| match &c.op {
                ChangeOp::UpsertBlock(u) => Some(u.block.text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(texts, vec!["just words"]);
    }
}
