//! Database models.

pub mod post;

pub use post::{Post, PostId, PostType, STATUS_PUBLISH, WriteContext};
