//! Tolerant HTML tokenizer.
//!
//! Never fails: anything that does not look like markup is text. Comments,
//! doctypes and processing instructions are skipped. Tag and attribute names
//! are lowercased; text and attribute values have entities decoded.

use super::cursor::Cursor;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Start {
        name: String,
        attrs: Vec<(String, String)>,
        self_closing: bool,
    },
    End {
        name: String,
    },
    Text(String),
}

/// Elements whose content is raw text up to the matching end tag.
const RAW_TEXT: &[&str] = &["script", "style", "textarea", "title"];

pub fn tokenize(html: &str) -> Vec<Token> {
    let mut cur = Cursor::new(html);
    let mut tokens = vec![];

    while !cur.eof() {
        if cur.starts_with(b"<!--") {
            cur.bump_n(4);
            cur.bump_until(b"-->");
            cur.bump_n(3);
        } else if cur.starts_with(b"<!") || cur.starts_with(b"<?") {
            cur.bump_until(b">");
            cur.bump();
        } else if cur.starts_with(b"</") {
            if let Some(name) = try_parse_end_tag(&mut cur) {
                tokens.push(Token::End { name });
            }
        } else if cur.starts_with(b"<") && is_name_start(cur.s.as_bytes().get(cur.i + 1)) {
            let start = try_parse_start_tag(&mut cur);
            if let Token::Start {
                name,
                self_closing: false,
                ..
            } = &start
                && RAW_TEXT.contains(&name.as_str())
            {
                let name = name.clone();
                tokens.push(start);
                let raw = raw_text_until_end(&mut cur, &name);
                if !raw.is_empty() {
                    tokens.push(Token::Text(raw.to_string()));
                }
                tokens.push(Token::End { name });
                continue;
            }
            tokens.push(start);
        } else {
            let mut text = String::new();
            if cur.peek() == Some(b'<') {
                cur.bump();
                text.push('<');
            }
            text.push_str(cur.bump_while(|b| b != b'<'));
            push_text(&mut tokens, &html_escape::decode_html_entities(&text));
        }
    }

    tokens
}

fn is_name_start(b: Option<&u8>) -> bool {
    b.is_some_and(|b| b.is_ascii_alphabetic())
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b':'
}

fn push_text(tokens: &mut Vec<Token>, text: &str) {
    if let Some(Token::Text(prev)) = tokens.last_mut() {
        prev.push_str(text);
    } else {
        tokens.push(Token::Text(text.to_string()));
    }
}

fn try_parse_end_tag(cur: &mut Cursor) -> Option<String> {
    cur.bump_n(2);
    let name = cur.bump_while(is_name_byte).to_ascii_lowercase();
    cur.bump_until(b">");
    cur.bump();
    (!name.is_empty()).then_some(name)
}

fn try_parse_start_tag(cur: &mut Cursor) -> Token {
    cur.bump();
    let name = cur.bump_while(is_name_byte).to_ascii_lowercase();
    let mut attrs = vec![];
    let mut self_closing = false;

    loop {
        cur.skip_whitespace();
        match cur.peek() {
            None => break,
            Some(b'>') => {
                cur.bump();
                break;
            }
            Some(b'/') if cur.starts_with(b"/>") => {
                cur.bump_n(2);
                self_closing = true;
                break;
            }
            Some(_) => {}
        }

        let attr_name = cur
            .bump_while(|b| !b.is_ascii_whitespace() && b != b'=' && b != b'>' && b != b'/')
            .to_ascii_lowercase();
        if attr_name.is_empty() {
            // Stray byte such as a lone '/' or '='.
            cur.bump();
            continue;
        }

        cur.skip_whitespace();
        let value = if cur.peek() == Some(b'=') {
            cur.bump();
            cur.skip_whitespace();
            parse_attr_value(cur)
        } else {
            String::new()
        };
        if !attrs.iter().any(|(n, _): &(String, String)| *n == attr_name) {
            attrs.push((attr_name, value));
        }
    }

    Token::Start {
        name,
        attrs,
        self_closing,
    }
}

fn parse_attr_value(cur: &mut Cursor) -> String {
    let raw = match cur.peek() {
        Some(q @ (b'"' | b'\'')) => {
            cur.bump();
            let v = cur.bump_until(&[q]);
            cur.bump();
            v
        }
        _ => cur.bump_while(|b| !b.is_ascii_whitespace() && b != b'>'),
    };
    html_escape::decode_html_entities(raw).into_owned()
}

fn raw_text_until_end<'a>(cur: &mut Cursor<'a>, name: &str) -> &'a str {
    let start = cur.i;
    let close = format!("</{name}");
    while !cur.eof() && !cur.starts_with_ignore_case(close.as_bytes()) {
        cur.bump();
    }
    let end = cur.i.min(cur.s.len());
    if !cur.eof() {
        cur.bump_until(b">");
        cur.bump();
    }
    cur.s.get(start..end).unwrap_or_default()
}
