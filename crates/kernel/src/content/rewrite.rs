//! Block tree rewriting.
//!
//! Parses stored content, replaces every top-level instance of a target
//! block type with the result of a transform, and serializes the tree back.
//! Untouched blocks serialize back to equivalent markup.

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use super::block::Block;
use super::block_parser::{ParseError, parse_blocks};
use super::block_render::BlockRenderer;
use super::block_serialize::{serialize_block, serialize_blocks};
use super::block_types::BlockTransform;

/// Attribute marking a block as migrated to the dynamic shape.
pub const BLOCK_VERSION_ATTR: &str = "blockVersion";

/// Version written by [`DefaultTransform`].
pub const DYNAMIC_BLOCK_VERSION: u64 = 2;

/// Errors from rewriting a document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RewriteError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// A transform returned a block whose placeholders outnumber its children.
    #[error("transform left {block} at position {index} with unmatched child placeholders")]
    InconsistentBlock { block: String, index: usize },
}

/// Parse `content`, transform every top-level `target` block, and serialize.
///
/// Nested instances of `target` are left alone.
pub fn rewrite_content<F>(content: &str, target: &str, transform: F) -> Result<String, RewriteError>
where
    F: FnMut(Block) -> Block,
{
    let mut blocks = parse_blocks(content)?;
    let replaced = rewrite_blocks(&mut blocks, target, transform)?;
    debug!(block = %target, replaced, top_level = blocks.len(), "rewrote block tree");
    Ok(serialize_blocks(&blocks))
}

/// Replace matching top-level blocks in place. Returns how many were replaced.
///
/// Every transformed block must still be consistent; the first one that is
/// not aborts the rewrite. `blocks` may then be partially rewritten.
pub fn rewrite_blocks<F>(blocks: &mut [Block], target: &str, mut transform: F) -> Result<usize, RewriteError>
where
    F: FnMut(Block) -> Block,
{
    let mut replaced = 0;
    for (index, slot) in blocks.iter_mut().enumerate() {
        if !slot.is_named(target) {
            continue;
        }
        let original = std::mem::take(slot);
        *slot = transform(original);
        if !slot.is_consistent() {
            warn!(block = %target, index, "transform produced an inconsistent block");
            return Err(RewriteError::InconsistentBlock {
                block: target.to_string(),
                index,
            });
        }
        replaced += 1;
    }
    Ok(replaced)
}

/// Converts a statically saved block into the dynamic shape.
///
/// The block keeps its children, but its own markup is replaced by the
/// serialized children (so client-side inner blocks stay intact) and its
/// HTML by the children's rendered output. `blockVersion` is set to 2.
#[derive(Debug, Clone, Copy)]
pub struct DefaultTransform<'a> {
    renderer: &'a BlockRenderer,
}

impl<'a> DefaultTransform<'a> {
    pub fn new(renderer: &'a BlockRenderer) -> Self {
        Self { renderer }
    }

    pub fn apply(&self, mut block: Block) -> Block {
        let mut rendered = String::new();
        let mut serialized = String::new();
        for inner in &block.inner_blocks {
            rendered.push_str(&self.renderer.render_block(inner));
            serialized.push_str(&serialize_block(inner));
        }

        block
            .attrs
            .insert(BLOCK_VERSION_ATTR.to_string(), Value::from(DYNAMIC_BLOCK_VERSION));
        block.inner_content = vec![Some(serialized)];
        block.inner_html = rendered;
        block
    }
}

impl BlockTransform {
    /// Resolve to the concrete function that rewrites one block.
    pub fn resolve<'a>(
        &'a self,
        renderer: &'a BlockRenderer,
    ) -> Box<dyn Fn(Block) -> Block + Send + Sync + 'a> {
        match self {
            BlockTransform::UseDefault => {
                let default = DefaultTransform::new(renderer);
                Box::new(move |block: Block| default.apply(block))
            }
            BlockTransform::Custom(transform) => Box::new(move |block: Block| transform(block)),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::{Map, json};
    use std::sync::Arc;

    const TARGET: &str = "acme/hero";

    fn hero_with_children() -> &'static str {
        concat!(
            "<!-- wp:acme/hero {\"align\":\"wide\"} --><div class=\"hero\">",
            "<!-- wp:heading --><h2>X</h2><!-- /wp:heading -->",
            "<!-- wp:paragraph --><p>Y</p><!-- /wp:paragraph -->",
            "</div><!-- /wp:acme/hero -->"
        )
    }

    #[test]
    fn content_without_target_round_trips() {
        let doc = concat!(
            "<!-- wp:paragraph --><p>A</p><!-- /wp:paragraph -->\n",
            "<!-- wp:group {\"tag\":\"section\"} --><section>",
            "<!-- wp:image {\"id\":7} /-->",
            "</section><!-- /wp:group -->\n",
            "<p>loose html</p>"
        );
        let out = rewrite_content(doc, TARGET, |_| panic!("no block should match")).unwrap();
        assert_eq!(parse_blocks(&out).unwrap(), parse_blocks(doc).unwrap());
    }

    #[test]
    fn default_transform_collapses_inner_content() {
        let renderer = BlockRenderer::new();
        let blocks = parse_blocks(hero_with_children()).unwrap();
        let hero = DefaultTransform::new(&renderer).apply(blocks[0].clone());

        assert_eq!(hero.attrs.get("align"), Some(&json!("wide")));
        assert_eq!(hero.attrs.get(BLOCK_VERSION_ATTR), Some(&json!(2)));
        assert_eq!(
            hero.inner_content,
            vec![Some(
                "<!-- wp:heading --><h2>X</h2><!-- /wp:heading -->\
                 <!-- wp:paragraph --><p>Y</p><!-- /wp:paragraph -->"
                    .to_string()
            )]
        );
        assert_eq!(hero.inner_html, "<h2>X</h2><p>Y</p>");
        assert_eq!(hero.inner_blocks.len(), 2);
        assert!(hero.is_consistent());
    }

    #[test]
    fn default_transform_with_no_children() {
        let renderer = BlockRenderer::new();
        let blocks = parse_blocks("<!-- wp:acme/hero --><div></div><!-- /wp:acme/hero -->").unwrap();
        let hero = DefaultTransform::new(&renderer).apply(blocks[0].clone());

        assert_eq!(hero.inner_content, vec![Some(String::new())]);
        assert_eq!(hero.inner_html, "");
        assert_eq!(hero.attrs.get(BLOCK_VERSION_ATTR), Some(&json!(2)));
    }

    #[test]
    fn default_transform_is_idempotent() {
        let renderer = BlockRenderer::new();
        let transform = DefaultTransform::new(&renderer);
        let block = parse_blocks(hero_with_children()).unwrap().remove(0);

        let once = transform.apply(block);
        let twice = transform.apply(once.clone());
        assert_eq!(once.inner_content, twice.inner_content);
        assert_eq!(once.inner_html, twice.inner_html);
        assert_eq!(once.attrs, twice.attrs);
    }

    #[test]
    fn rewritten_content_reparses_as_dynamic_shape() {
        let doc = format!(
            "<!-- wp:paragraph --><p>A</p><!-- /wp:paragraph -->{}<!-- wp:separator /-->",
            hero_with_children()
        );
        let renderer = BlockRenderer::new();
        let out = rewrite_content(&doc, TARGET, |b| DefaultTransform::new(&renderer).apply(b)).unwrap();

        assert_eq!(
            out,
            concat!(
                "<!-- wp:paragraph --><p>A</p><!-- /wp:paragraph -->",
                "<!-- wp:acme/hero {\"align\":\"wide\",\"blockVersion\":2} -->",
                "<!-- wp:heading --><h2>X</h2><!-- /wp:heading -->",
                "<!-- wp:paragraph --><p>Y</p><!-- /wp:paragraph -->",
                "<!-- /wp:acme/hero -->",
                "<!-- wp:separator /-->"
            )
        );

        let reparsed = parse_blocks(&out).unwrap();
        let names: Vec<_> = reparsed.iter().map(|b| b.block_name.clone().unwrap()).collect();
        assert_eq!(names, vec!["core/paragraph", TARGET, "core/separator"]);
        assert_eq!(reparsed[1].inner_blocks.len(), 2);
        assert_eq!(reparsed[1].inner_html, "");
    }

    #[test]
    fn only_matching_positions_change() {
        let blocks = vec![
            Block::freeform("<p>0</p>"),
            Block::new(TARGET, Map::new()),
            Block::new("paragraph", Map::new()),
            Block::new(TARGET, Map::new()),
            Block::freeform("<p>4</p>"),
        ];
        let mut rewritten = blocks.clone();
        let replaced = rewrite_blocks(&mut rewritten, TARGET, |mut b| {
            b.attrs.insert("touched".into(), json!(true));
            b
        })
        .unwrap();

        assert_eq!(replaced, 2);
        assert_eq!(rewritten.len(), blocks.len());
        for (i, (before, after)) in blocks.iter().zip(&rewritten).enumerate() {
            if i == 1 || i == 3 {
                assert_eq!(after.attrs.get("touched"), Some(&json!(true)));
                assert_eq!(after.block_name, before.block_name);
            } else {
                assert_eq!(before, after);
            }
        }
    }

    #[test]
    fn nested_instances_are_not_rewritten() {
        let doc = "<!-- wp:group --><!-- wp:acme/hero /--><!-- /wp:group -->";
        let mut calls = 0;
        let out = rewrite_content(doc, TARGET, |b| {
            calls += 1;
            b
        })
        .unwrap();
        assert_eq!(calls, 0);
        assert_eq!(out, doc);
    }

    #[test]
    fn parse_errors_propagate() {
        let err = rewrite_content("<!-- wp:acme/hero -->", TARGET, |b| b).unwrap_err();
        assert!(matches!(err, RewriteError::Parse(ParseError::Unclosed { .. })));
    }

    #[test]
    fn transform_dropping_children_is_rejected() {
        let doc = format!("<!-- wp:separator /-->{}", hero_with_children());
        let err = rewrite_content(&doc, TARGET, |mut b| {
            b.inner_blocks.clear();
            b
        })
        .unwrap_err();
        assert_eq!(
            err,
            RewriteError::InconsistentBlock {
                block: TARGET.to_string(),
                index: 1,
            }
        );
    }

    #[test]
    fn transform_inlining_children_is_accepted() {
        let out = rewrite_content(hero_with_children(), TARGET, |mut b| {
            b.inner_content.retain(Option::is_some);
            b
        })
        .unwrap();
        assert!(out.starts_with("<!-- wp:acme/hero {\"align\":\"wide\"} --><div class=\"hero\">"));
    }

    #[test]
    fn resolve_picks_custom_function() {
        let renderer = BlockRenderer::new();
        let custom = BlockTransform::Custom(Arc::new(|mut b: Block| {
            b.inner_content = vec![Some("<custom/>".into())];
            b
        }));
        let f = custom.resolve(&renderer);
        let out = f(Block::new(TARGET, Map::new()));
        assert_eq!(out.inner_content, vec![Some("<custom/>".to_string())]);

        let default = BlockTransform::UseDefault.resolve(&renderer);
        let out = default(Block::new(TARGET, Map::new()));
        assert_eq!(out.attrs.get(BLOCK_VERSION_ATTR), Some(&json!(2)));
    }
}
