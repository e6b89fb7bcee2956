//! Kernel services.

pub mod block_updater;

pub use block_updater::{
    BlockUpdater, BulkUpdateReport, FailedUpdate, UPDATABLE_POST_TYPES, UpdateError, UpdateOutcome,
};
