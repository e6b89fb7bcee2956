//! Allow-list of block types the updater may rewrite.
//!
//! Each allowed block type maps to the transform applied to its instances:
//! either the built-in default transform or a custom function registered in
//! code.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::block::Block;

/// A custom block transform.
pub type TransformFn = Arc<dyn Fn(Block) -> Block + Send + Sync>;

/// How instances of an allowed block type are rewritten.
#[derive(Clone)]
pub enum BlockTransform {
    /// Use [`DefaultTransform`](super::rewrite::DefaultTransform).
    UseDefault,
    /// Use a caller-supplied function.
    Custom(TransformFn),
}

impl fmt::Debug for BlockTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockTransform::UseDefault => f.write_str("UseDefault"),
            BlockTransform::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Registry of updatable block types, keyed by the name requests must use.
///
/// Configured once at startup and read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct UpdatableBlocks {
    /// Registration order, for stable listings.
    names: Vec<String>,
    transforms: HashMap<String, BlockTransform>,
}

impl UpdatableBlocks {
    /// Create an empty allow-list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow every name in `names` with the default transform.
    ///
    /// Blank entries are ignored.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut blocks = Self::new();
        for name in names {
            let name = name.as_ref().trim();
            if !name.is_empty() {
                blocks.allow_default(name);
            }
        }
        blocks
    }

    /// Allow a block type, rewriting it with the default transform.
    pub fn allow_default(&mut self, block_name: impl Into<String>) -> &mut Self {
        self.insert(block_name.into(), BlockTransform::UseDefault)
    }

    /// Allow a block type, rewriting it with `transform`.
    pub fn allow_custom<F>(&mut self, block_name: impl Into<String>, transform: F) -> &mut Self
    where
        F: Fn(Block) -> Block + Send + Sync + 'static,
    {
        self.insert(block_name.into(), BlockTransform::Custom(Arc::new(transform)))
    }

    fn insert(&mut self, block_name: String, transform: BlockTransform) -> &mut Self {
        if self.transforms.insert(block_name.clone(), transform).is_none() {
            self.names.push(block_name);
        }
        self
    }

    /// Look up the transform for an allowed block type.
    pub fn get(&self, block_name: &str) -> Option<&BlockTransform> {
        self.transforms.get(block_name)
    }

    /// Check whether a block type may be updated.
    pub fn contains(&self, block_name: &str) -> bool {
        self.transforms.contains_key(block_name)
    }

    /// Allowed block type names, in registration order.
    pub fn type_names(&self) -> Vec<String> {
        self.names.clone()
    }

    /// Number of allowed block types.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether nothing is allowed.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::Map;

    #[test]
    fn from_names_skips_blanks_and_keeps_order() {
        let blocks = UpdatableBlocks::from_names(["acme/hero", " ", "acme/card ", ""]);
        assert_eq!(blocks.type_names(), vec!["acme/hero", "acme/card"]);
        assert_eq!(blocks.len(), 2);
    }

    #[test]
    fn lookup_is_exact() {
        let blocks = UpdatableBlocks::from_names(["acme/hero"]);
        assert!(blocks.contains("acme/hero"));
        assert!(!blocks.contains("acme/Hero"));
        assert!(!blocks.contains("hero"));
        assert!(matches!(blocks.get("acme/hero"), Some(BlockTransform::UseDefault)));
    }

    #[test]
    fn custom_transform_is_callable() {
        let mut blocks = UpdatableBlocks::new();
        blocks.allow_custom("acme/legacy", |mut block: Block| {
            block.attrs.insert("migrated".into(), true.into());
            block
        });

        let Some(BlockTransform::Custom(transform)) = blocks.get("acme/legacy") else {
            panic!("expected custom transform");
        };
        let out = transform(Block::new("acme/legacy", Map::new()));
        assert_eq!(out.attrs.get("migrated"), Some(&true.into()));
    }

    #[test]
    fn re_registering_replaces_without_duplicating() {
        let mut blocks = UpdatableBlocks::new();
        blocks.allow_default("acme/hero");
        blocks.allow_custom("acme/hero", |b| b);
        assert_eq!(blocks.type_names(), vec!["acme/hero"]);
        assert!(matches!(blocks.get("acme/hero"), Some(BlockTransform::Custom(_))));
    }

    #[test]
    fn empty_registry() {
        let blocks = UpdatableBlocks::new();
        assert!(blocks.is_empty());
        assert!(blocks.type_names().is_empty());
    }
}
