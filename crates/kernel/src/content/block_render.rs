//! Server-side block rendering.
//!
//! Static blocks render to their stored HTML with children rendered in
//! place. Blocks with a registered render callback are dynamic: the callback
//! receives the block's attributes and its already-rendered inner content and
//! returns the final HTML.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use super::block::{Block, normalize_block_name};

/// Render callback for a dynamic block type.
///
/// Arguments: attributes, rendered inner content, the block itself.
pub type RenderCallback = Arc<dyn Fn(&Map<String, Value>, &str, &Block) -> String + Send + Sync>;

/// Renderer holding the dynamic block callbacks.
///
/// Built once at startup; read-only while serving requests.
#[derive(Clone, Default)]
pub struct BlockRenderer {
    callbacks: HashMap<String, RenderCallback>,
}

impl BlockRenderer {
    /// Create a renderer with no dynamic blocks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a render callback, replacing any previous one for the name.
    pub fn register<F>(&mut self, block_name: &str, callback: F)
    where
        F: Fn(&Map<String, Value>, &str, &Block) -> String + Send + Sync + 'static,
    {
        self.callbacks
            .insert(normalize_block_name(block_name), Arc::new(callback));
    }

    /// Render a sequence of blocks into one HTML string.
    pub fn render_blocks(&self, blocks: &[Block]) -> String {
        blocks.iter().map(|b| self.render_block(b)).collect()
    }

    /// Render a single block, recursing into its children.
    pub fn render_block(&self, block: &Block) -> String {
        let mut children = block.inner_blocks.iter();
        let mut content = String::new();
        for chunk in &block.inner_content {
            match chunk {
                Some(html) => content.push_str(html),
                None => {
                    if let Some(child) = children.next() {
                        content.push_str(&self.render_block(child));
                    }
                }
            }
        }

        match block
            .block_name
            .as_deref()
            .and_then(|name| self.callbacks.get(name))
        {
            Some(callback) => callback(&block.attrs, &content, block),
            None => content,
        }
    }
}

impl fmt::Debug for BlockRenderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.callbacks.keys().collect();
        names.sort();
        f.debug_struct("BlockRenderer")
            .field("dynamic_blocks", &names)
            .finish()
    }
}
