//! Block content handling.
//!
//! This module provides:
//! - Block: the parsed block node
//! - Parser and serializer for comment-delimited block markup
//! - BlockRenderer: server-side rendering with dynamic block callbacks
//! - UpdatableBlocks: allow-list of block types and their transforms
//! - Rewriting of block trees, including the default dynamic-block transform

pub mod block;
pub mod block_parser;
pub mod block_render;
pub mod block_serialize;
pub mod block_types;
pub mod rewrite;

pub use block::Block;
pub use block_parser::{ParseError, content_has_block, parse_blocks};
pub use block_render::{BlockRenderer, RenderCallback};
pub use block_serialize::{serialize_block, serialize_blocks};
pub use block_types::{BlockTransform, TransformFn, UpdatableBlocks};
pub use rewrite::{DefaultTransform, RewriteError, rewrite_blocks, rewrite_content};
