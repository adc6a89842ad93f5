//! HTML front end of the paste importer: tokenizer, tree builder and
//! sanitizer.

mod cursor;
pub mod sanitize;
mod tokenizer;
mod tree;

pub use sanitize::sanitize;
pub use tree::{Element, HtmlNode, parse};

/// Text of an HTML fragment with all markup removed.
pub fn strip_tags(html: &str) -> String {
    parse(html).iter().map(HtmlNode::text_content).collect()
}
