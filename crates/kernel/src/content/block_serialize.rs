//! Serialization of block trees back into comment-delimited markup.
//!
//! `parse_blocks(serialize_blocks(blocks))` reproduces `blocks` for any tree
//! the parser produced.

use serde_json::{Map, Value};

use super::block::{Block, strip_core_namespace};

/// Serialize a sequence of blocks, in order.
pub fn serialize_blocks(blocks: &[Block]) -> String {
    blocks.iter().map(serialize_block).collect()
}

/// Serialize one block, including its delimiters and nested blocks.
///
/// Placeholders beyond the number of inner blocks serialize as nothing.
pub fn serialize_block(block: &Block) -> String {
    let mut children = block.inner_blocks.iter();
    let mut content = String::new();
    for chunk in &block.inner_content {
        match chunk {
            Some(html) => content.push_str(html),
            None => {
                if let Some(child) = children.next() {
                    content.push_str(&serialize_block(child));
                }
            }
        }
    }

    let Some(name) = block.block_name.as_deref() else {
        return content;
    };

    let name = strip_core_namespace(name);
    let attrs = if block.attrs.is_empty() {
        String::new()
    } else {
        format!("{} ", serialize_block_attributes(&block.attrs))
    };

    if block.inner_content.is_empty() {
        format!("<!-- wp:{name} {attrs}/-->")
    } else {
        format!("<!-- wp:{name} {attrs}-->{content}<!-- /wp:{name} -->")
    }
}

/// Encode attributes as JSON that is safe inside an HTML comment.
///
/// Sequences that could end the comment or confuse an HTML parser are
/// replaced with their unicode escapes.
pub fn serialize_block_attributes(attrs: &Map<String, Value>) -> String {
    // Map<String, Value> serialization cannot fail.
    let encoded = serde_json::to_string(attrs).unwrap_or_else(|_| "{}".to_string());
    escape_for_comment(&encoded)
}

fn escape_for_comment(encoded: &str) -> String {
    let mut out = String::with_capacity(encoded.len());
    let mut chars = encoded.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some('"') => out.push_str("\\u0022"),
                Some(next) => {
                    out.push('\\');
                    out.push(next);
                }
                None => out.push('\\'),
            },
            '-' if chars.peek() == Some(&'-') => {
                chars.next();
                out.push_str("\\u002d\\u002d");
            }
            '<' => out.push_str("\\u003c"),
            '>' => out.push_str("\\u003e"),
            '&' => out.push_str("\\u0026"),
            _ => out.push(c),
        }
    }
    out
}
