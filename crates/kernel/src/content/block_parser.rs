//! Parser for comment-delimited block markup.
//!
//! Stored post content interleaves plain HTML with block delimiters:
//! ```text
//! <!-- wp:acme/hero {"align":"wide"} -->
//! <div class="hero"><!-- wp:paragraph --><p>Hi</p><!-- /wp:paragraph --></div>
//! <!-- /wp:acme/hero -->
//! <!-- wp:separator /-->
//! ```
//!
//! The parser is strict: unbalanced delimiters and undecodable attributes are
//! reported as [`ParseError`] instead of being repaired.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};
use thiserror::Error;

use super::block::{Block, normalize_block_name, strip_core_namespace};

/// Errors raised for structurally invalid block markup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("closing delimiter for {name} at byte {offset} has no open block")]
    UnexpectedCloser { name: String, offset: usize },

    #[error("closing delimiter for {found} at byte {offset} does not match open block {expected}")]
    MismatchedCloser {
        expected: String,
        found: String,
        offset: usize,
    },

    #[error("closing delimiter for {name} at byte {offset} carries attributes or a void marker")]
    MalformedCloser { name: String, offset: usize },

    #[error("block {name} opened at byte {offset} is never closed")]
    Unclosed { name: String, offset: usize },

    #[error("invalid attributes for {name} at byte {offset}: {message}")]
    InvalidAttributes {
        name: String,
        offset: usize,
        message: String,
    },
}

/// Delimiter prefix up to and including the whitespace after the block name.
// Pattern is a compile-time constant.
#[allow(clippy::expect_used)]
static DELIMITER_HEAD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\A<!--\s+(/)?wp:([a-z][a-z0-9_-]*/)?([a-z][a-z0-9_-]*)\s+")
        .expect("delimiter regex must compile")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenKind {
    Opener,
    Closer,
    Void,
}

#[derive(Debug)]
struct Token {
    kind: TokenKind,
    name: String,
    attrs: Map<String, Value>,
    start: usize,
    end: usize,
}

/// An open block on the parse stack.
struct Frame {
    block: Block,
    token_start: usize,
    prev_offset: usize,
}

/// Parse a document into its top-level blocks.
///
/// HTML outside of any block becomes freeform blocks. An empty document
/// yields an empty list.
pub fn parse_blocks(document: &str) -> Result<Vec<Block>, ParseError> {
    let mut output = Vec::new();
    let mut stack: Vec<Frame> = Vec::new();
    let mut offset = 0;

    while let Some(token) = next_token(document, offset)? {
        match token.kind {
            TokenKind::Void => {
                let block = Block::new(token.name, token.attrs);
                match stack.last_mut() {
                    Some(parent) => add_inner_block(document, parent, block, token.start, token.end),
                    None => {
                        push_freeform(&mut output, &document[offset..token.start]);
                        output.push(block);
                    }
                }
            }
            TokenKind::Opener => {
                if stack.is_empty() {
                    push_freeform(&mut output, &document[offset..token.start]);
                }
                stack.push(Frame {
                    block: Block::new(token.name, token.attrs),
                    token_start: token.start,
                    prev_offset: token.end,
                });
            }
            TokenKind::Closer => {
                let Some(mut frame) = stack.pop() else {
                    return Err(ParseError::UnexpectedCloser {
                        name: token.name,
                        offset: token.start,
                    });
                };
                let open_name = frame.block.block_name.clone().unwrap_or_default();
                if open_name != token.name {
                    return Err(ParseError::MismatchedCloser {
                        expected: open_name,
                        found: token.name,
                        offset: token.start,
                    });
                }

                let html = &document[frame.prev_offset..token.start];
                frame.block.inner_html.push_str(html);
                frame.block.inner_content.push(Some(html.to_string()));

                match stack.last_mut() {
                    Some(parent) => add_inner_block(
                        document,
                        parent,
                        frame.block,
                        frame.token_start,
                        token.end,
                    ),
                    None => output.push(frame.block),
                }
            }
        }
        offset = token.end;
    }

    if let Some(frame) = stack.pop() {
        return Err(ParseError::Unclosed {
            name: frame.block.block_name.unwrap_or_default(),
            offset: frame.token_start,
        });
    }

    push_freeform(&mut output, &document[offset..]);
    Ok(output)
}

/// Cheap check for at least one delimiter of `block_name` anywhere in the
/// document, nested instances included. Does not parse.
pub fn content_has_block(document: &str, block_name: &str) -> bool {
    let qualified = normalize_block_name(block_name);
    let short = strip_core_namespace(&qualified);

    document.contains(&format!("<!-- wp:{short} "))
        || (short != qualified && document.contains(&format!("<!-- wp:{qualified} ")))
}

fn push_freeform(output: &mut Vec<Block>, html: &str) {
    if !html.is_empty() {
        output.push(Block::freeform(html));
    }
}

fn add_inner_block(document: &str, parent: &mut Frame, block: Block, token_start: usize, last_offset: usize) {
    let html = &document[parent.prev_offset..token_start];
    if !html.is_empty() {
        parent.block.inner_html.push_str(html);
        parent.block.inner_content.push(Some(html.to_string()));
    }
    parent.block.inner_content.push(None);
    parent.block.inner_blocks.push(block);
    parent.prev_offset = last_offset;
}

/// Find the next block delimiter at or after `from`.
///
/// HTML comments that are not delimiters are skipped and stay part of the
/// surrounding HTML.
fn next_token(document: &str, from: usize) -> Result<Option<Token>, ParseError> {
    let mut search = from;

    while let Some(found) = document[search..].find("<!--") {
        let start = search + found;
        search = start + 4;

        let Some(caps) = DELIMITER_HEAD.captures(&document[start..]) else {
            continue;
        };
        let is_closer = caps.get(1).is_some();
        let namespace = caps.get(2).map_or("core/", |m| m.as_str());
        let name = format!("{namespace}{}", &caps[3]);
        let rest = start + caps.get(0).map_or(0, |m| m.end());

        let (attrs_json, is_void, end) = if document[rest..].starts_with('{') {
            let Some((json_end, is_void, end)) = find_attrs_end(document, rest) else {
                continue;
            };
            (Some(&document[rest..json_end]), is_void, end)
        } else {
            let Some((is_void, len)) = closing_tail(&document[rest..]) else {
                continue;
            };
            (None, is_void, rest + len)
        };

        if is_closer {
            if is_void || attrs_json.is_some() {
                return Err(ParseError::MalformedCloser { name, offset: start });
            }
            return Ok(Some(Token {
                kind: TokenKind::Closer,
                name,
                attrs: Map::new(),
                start,
                end,
            }));
        }

        let attrs = match attrs_json {
            Some(json) => decode_attrs(json).map_err(|message| ParseError::InvalidAttributes {
                name: name.clone(),
                offset: start,
                message,
            })?,
            None => Map::new(),
        };

        return Ok(Some(Token {
            kind: if is_void {
                TokenKind::Void
            } else {
                TokenKind::Opener
            },
            name,
            attrs,
            start,
            end,
        }));
    }

    Ok(None)
}

/// Locate the end of an attribute object starting at `open`.
///
/// The object ends at the first `}` followed by whitespace, an optional `/`
/// and `-->`. Returns (end of JSON, void flag, end of delimiter).
fn find_attrs_end(document: &str, open: usize) -> Option<(usize, bool, usize)> {
    let body = &document[open..];
    body.match_indices('}').find_map(|(idx, _)| {
        let after = idx + 1;
        let tail = &body[after..];
        let ws = tail.len() - tail.trim_start().len();
        if ws == 0 {
            return None;
        }
        closing_tail(&tail[ws..]).map(|(is_void, len)| (open + after, is_void, open + after + ws + len))
    })
}

/// Match `/?-->` at the start of `s`, returning (void flag, matched length).
fn closing_tail(s: &str) -> Option<(bool, usize)> {
    if s.starts_with("/-->") {
        Some((true, 4))
    } else if s.starts_with("-->") {
        Some((false, 3))
    } else {
        None
    }
}

fn decode_attrs(json: &str) -> Result<Map<String, Value>, String> {
    match serde_json::from_str::<Value>(json) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(format!("expected a JSON object, got {other}")),
        Err(e) => Err(e.to_string()),
    }
}
