// Benchmark helper functions - Rust's dead code analysis doesn't understand
// that these are used by benchmark files in the same directory
// See: https://users.rust-lang.org/t/cargo-rustc-benches-awarnings/110111/2
use mttast_engine::mttast::{
    Document, FlowContent, GroupKind, Mark, Text, link, paragraph, statement, text,
};

#[allow(dead_code)]
pub fn formatted_block(id: &str, words: usize) -> FlowContent {
    let mut children = vec![];
    for i in 0..words {
        let word = format!("word{i} ");
        let node = match i % 5 {
            0 => Text::new(word).with(Mark::Strong).into(),
            1 => Text::new(word).with(Mark::Strong).with(Mark::Emphasis).into(),
            2 => link(format!("https://example.com/{i}"), vec![text(word)]),
            3 => Text::new(word).with_color("#336699").into(),
            _ => text(word),
        };
        children.push(node);
    }
    statement(id, vec![paragraph(children)])
}

/// `blocks` root blocks, each with `children` nested statements.
#[allow(dead_code)]
pub fn generate_document(blocks: usize, children: usize) -> Document {
    let mut roots = vec![];
    for b in 0..blocks {
        let mut block = formatted_block(&format!("b{b}"), 20);
        if children > 0 {
            let group = block.ensure_group(GroupKind::UnorderedList);
            for c in 0..children {
                group
                    .children
                    .push(formatted_block(&format!("b{b}c{c}"), 10).into());
            }
        }
        roots.push(block);
    }
    Document::new("bench", roots).with_title("Benchmark")
}

#[allow(dead_code)]
pub fn generate_clipboard_html(paragraphs: usize) -> String {
    let mut html = String::from("<meta charset=\"utf-8\"><b style=\"font-weight:normal;\">");
    for i in 0..paragraphs {
        html.push_str(&format!(
            "<p dir=\"ltr\"><span style=\"color:#000000;\">Paragraph {i} with </span>\
             <a href=\"https://example.com/{i}\"><span>a link</span></a> and <em>emphasis</em>.</p>"
        ));
        if i % 4 == 0 {
            html.push_str("<ul><li>first</li><li>second<ul><li>nested</li></ul></li></ul>");
        }
    }
    html.push_str("</b>");
    html
}

#[allow(dead_code)]
pub fn generate_markdown(sections: usize) -> String {
    let mut md = String::new();
    for s in 0..sections {
        md.push_str(&format!("# Section {s}\n\nIntro with **bold** and `code`.\n\n"));
        md.push_str("## Details\n\n- one\n- two\n  - nested\n\n1. first\n2. second\n\n");
    }
    md
}
