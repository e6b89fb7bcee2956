//! Reblock kernel library.
//!
//! Rewrites allow-listed blocks in stored post content and serves the
//! block updater HTTP API. The `reblock` binary runs the server.

pub mod config;
pub mod content;
pub mod db;
pub mod error;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod permissions;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use routes::build_router;
pub use state::{AppState, AppStateBuilder};
