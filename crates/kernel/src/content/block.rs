//! Block node: one element of a post's structured content.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Namespace assumed for block names written without one.
pub const CORE_NAMESPACE: &str = "core/";

/// A parsed block.
///
/// `inner_content` interleaves raw HTML fragments with `None` placeholders;
/// each placeholder stands for the next entry of `inner_blocks`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// Fully qualified name (`namespace/type`), or `None` for freeform HTML.
    #[serde(rename = "blockName")]
    pub block_name: Option<String>,

    /// Block attributes decoded from the delimiter JSON.
    #[serde(default)]
    pub attrs: Map<String, Value>,

    /// Nested child blocks, in document order.
    #[serde(rename = "innerBlocks", default)]
    pub inner_blocks: Vec<Block>,

    /// The block's own HTML with child markup removed.
    #[serde(rename = "innerHTML", default)]
    pub inner_html: String,

    /// HTML fragments and child placeholders, in document order.
    #[serde(rename = "innerContent", default)]
    pub inner_content: Vec<Option<String>>,
}

impl Block {
    /// Create a named block with no content.
    pub fn new(name: impl Into<String>, attrs: Map<String, Value>) -> Self {
        Self {
            block_name: Some(normalize_block_name(&name.into())),
            attrs,
            inner_blocks: Vec::new(),
            inner_html: String::new(),
            inner_content: Vec::new(),
        }
    }

    /// Create a nameless block wrapping raw HTML.
    pub fn freeform(html: impl Into<String>) -> Self {
        let html = html.into();
        Self {
            block_name: None,
            attrs: Map::new(),
            inner_blocks: Vec::new(),
            inner_content: vec![Some(html.clone())],
            inner_html: html,
        }
    }

    /// Whether this block carries the given name (namespace optional for core blocks).
    pub fn is_named(&self, name: &str) -> bool {
        self.block_name
            .as_deref()
            .is_some_and(|own| own == normalize_block_name(name))
    }

    /// Check that every child placeholder maps to an actual inner block,
    /// recursively.
    ///
    /// Children without a placeholder are allowed: a rewritten block may carry
    /// their markup inline in `inner_content`.
    pub fn is_consistent(&self) -> bool {
        let placeholders = self.inner_content.iter().filter(|c| c.is_none()).count();
        placeholders <= self.inner_blocks.len()
            && self.inner_blocks.iter().all(Block::is_consistent)
    }
}

/// Qualify a block name with the core namespace when it has none.
pub fn normalize_block_name(name: &str) -> String {
    if name.contains('/') {
        name.to_string()
    } else {
        format!("{CORE_NAMESPACE}{name}")
    }
}

/// Strip the core namespace for serialization (`core/paragraph` -> `paragraph`).
pub fn strip_core_namespace(name: &str) -> &str {
    name.strip_prefix(CORE_NAMESPACE).unwrap_or(name)
}
