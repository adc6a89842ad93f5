use super::tokenizer::{Token, tokenize};

/// Node of the parsed HTML tree.
#[derive(Debug, Clone, PartialEq)]
pub enum HtmlNode {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<HtmlNode>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: vec![],
            children: vec![],
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

impl HtmlNode {
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            HtmlNode::Text(t) => out.push_str(t),
            HtmlNode::Element(e) => {
                if e.name == "br" {
                    out.push('\n');
                }
                for child in &e.children {
                    child.collect_text(out);
                }
            }
        }
    }
}

/// Elements that never have children.
pub const VOID: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

/// Elements whose start tag closes an open `<p>`.
const CLOSES_P: &[&str] = &[
    "address", "article", "aside", "blockquote", "div", "dl", "fieldset", "figure", "footer",
    "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "main", "nav", "ol", "p", "pre",
    "section", "table", "ul",
];

/// Parses HTML into a forest of nodes, repairing unbalanced markup the way
/// browsers roughly do: implied `</p>` and `</li>`, stray end tags ignored,
/// unclosed elements closed at the end.
pub fn parse(html: &str) -> Vec<HtmlNode> {
    let mut stack: Vec<Element> = vec![Element::new("#root")];

    for token in tokenize(html) {
        match token {
            Token::Text(text) => append(&mut stack, HtmlNode::Text(text)),
            Token::Start {
                name,
                attrs,
                self_closing,
            } => {
                if CLOSES_P.contains(&name.as_str()) {
                    close_implied(&mut stack, "p", &[]);
                }
                if name == "li" {
                    close_implied(&mut stack, "li", &["ul", "ol"]);
                }
                let element = Element {
                    name,
                    attrs,
                    children: vec![],
                };
                if self_closing || VOID.contains(&element.name.as_str()) {
                    append(&mut stack, HtmlNode::Element(element));
                } else {
                    stack.push(element);
                }
            }
            Token::End { name } => {
                if let Some(depth) = stack.iter().skip(1).rposition(|e| e.name == name) {
                    // `depth` counts from after the root.
                    while stack.len() > depth + 1 {
                        pop(&mut stack);
                    }
                }
            }
        }
    }

    while stack.len() > 1 {
        pop(&mut stack);
    }
    stack.pop().map(|root| root.children).unwrap_or_default()
}

fn append(stack: &mut [Element], node: HtmlNode) {
    let Some(top) = stack.last_mut() else {
        return;
    };
    if let HtmlNode::Text(text) = &node
        && let Some(HtmlNode::Text(prev)) = top.children.last_mut()
    {
        prev.push_str(text);
        return;
    }
    top.children.push(node);
}

fn pop(stack: &mut Vec<Element>) {
    if stack.len() <= 1 {
        return;
    }
    if let Some(element) = stack.pop() {
        append(stack, HtmlNode::Element(element));
    }
}

/// Closes the nearest open `name` unless one of `scope` is open above it.
fn close_implied(stack: &mut Vec<Element>, name: &str, scope: &[&str]) {
    for idx in (1..stack.len()).rev() {
        let open = stack[idx].name.as_str();
        if open == name {
            while stack.len() > idx {
                pop(stack);
            }
            return;
        }
        if scope.contains(&open) {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn el(name: &str, children: Vec<HtmlNode>) -> HtmlNode {
        HtmlNode::Element(Element {
            name: name.into(),
            attrs: vec![],
            children,
        })
    }

    fn t(s: &str) -> HtmlNode {
        HtmlNode::Text(s.into())
    }

    #[test]
    fn nests_elements() {
        assert_eq!(
            parse("<p>a <b>b</b></p>"),
            vec![el("p", vec![t("a "), el("b", vec![t("b")])])]
        );
    }

    #[test]
    fn implied_paragraph_and_list_item_ends() {
        assert_eq!(
            parse("<p>one<p>two<ul><li>a<li>b</ul>"),
            vec![
                el("p", vec![t("one")]),
                el("p", vec![t("two")]),
                el("ul", vec![el("li", vec![t("a")]), el("li", vec![t("b")])]),
            ]
        );
    }

    #[test]
    fn nested_list_item_does_not_close_outer() {
        assert_eq!(
            parse("<ul><li>a<ul><li>b</li></ul></li></ul>"),
            vec![el(
                "ul",
                vec![el(
                    "li",
                    vec![t("a"), el("ul", vec![el("li", vec![t("b")])])]
                )]
            )]
        );
    }

    #[test]
    fn stray_end_tags_are_ignored_and_open_tags_closed() {
        assert_eq!(
            parse("</div>a<em>b"),
            vec![t("a"), el("em", vec![t("b")])]
        );
    }

    #[test]
    fn void_elements_have_no_children() {
        assert_eq!(
            parse("a<br>b<img src=x>"),
            vec![
                t("a"),
                el("br", vec![]),
                t("b"),
                HtmlNode::Element(Element {
                    name: "img".into(),
                    attrs: vec![("src".into(), "x".into())],
                    children: vec![]
                })
            ]
        );
    }

    #[test]
    fn text_content_includes_line_breaks() {
        let nodes = parse("<p># Title<br>- item</p>");
        assert_eq!(nodes[0].text_content(), "# Title\n- item");
    }
}
