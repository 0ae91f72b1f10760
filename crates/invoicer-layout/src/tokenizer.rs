//! # Tokenizer
//!
//! Splits HTML-ish template output into flat [`Block`]s. No validation: tags
//! that never close simply stay open until the end of input.

use crate::blocks::Block;

/// Turns rendered template text into ordered `{tag, text}` blocks.
pub trait Tokenizer: Send + Sync {
    fn tokenize(&self, html: &str) -> Vec<Block>;
}

const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "wbr",
];

/// Tag-stack splitter: each text run is attributed to the innermost open tag.
///
/// Whitespace inside a run is collapsed; runs that are blank after trimming
/// are dropped. Comments and `<!...>` declarations are skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct TagSplitter;

impl Tokenizer for TagSplitter {
    fn tokenize(&self, html: &str) -> Vec<Block> {
        let mut blocks = Vec::new();
        let mut stack: Vec<String> = Vec::new();
        let mut text = String::new();
        let mut rest = html;

        while let Some(open) = rest.find('<') {
            text.push_str(&rest[..open]);
            let tail = &rest[open..];

            if let Some(comment) = tail.strip_prefix("<!--") {
                rest = comment.find("-->").map_or("", |end| &comment[end + 3..]);
                continue;
            }

            let Some(close) = tail.find('>') else {
                text.push_str(tail);
                rest = "";
                break;
            };
            let inner = &tail[1..close];
            rest = &tail[close + 1..];

            if inner.starts_with('!') || inner.starts_with('?') {
                continue;
            }

            flush(&mut blocks, &stack, &mut text);

            if let Some(name) = inner.strip_prefix('/') {
                let name = tag_name(name);
                if let Some(pos) = stack.iter().rposition(|t| *t == name) {
                    stack.truncate(pos);
                }
                continue;
            }

            let name = tag_name(inner);
            if name.is_empty() || inner.ends_with('/') || VOID_TAGS.contains(&name.as_str()) {
                continue;
            }
            stack.push(name);
        }

        text.push_str(rest);
        flush(&mut blocks, &stack, &mut text);
        blocks
    }
}

fn tag_name(inner: &str) -> String {
    inner
        .trim()
        .split(|c: char| c.is_whitespace() || c == '/')
        .next()
        .unwrap_or("")
        .to_ascii_lowercase()
}

fn flush(blocks: &mut Vec<Block>, stack: &[String], text: &mut String) {
    let collapsed = decode_entities(&text.split_whitespace().collect::<Vec<_>>().join(" "));
    text.clear();
    if collapsed.is_empty() {
        return;
    }
    let tag = stack.last().map_or("", String::as_str);
    blocks.push(Block::new(tag, collapsed));
}

fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&#x60;", "`")
        .replace("&#x3D;", "=")
        .replace("&amp;", "&")
}

// =============================================================================
// Unit Tests
// =============================================================================
