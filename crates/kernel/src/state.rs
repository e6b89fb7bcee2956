//! Application state shared across all handlers.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::config::Config;
use crate::content::{BlockRenderer, UpdatableBlocks};
use crate::db;
use crate::metrics::Metrics;
use crate::permissions::{AccessGate, CapabilityGate, EditorTokens};
use crate::services::BlockUpdater;
use crate::store::{PgPostStore, PostStore};

/// Shared application state.
///
/// Wrapped in Arc internally so Clone is cheap.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Post storage backend.
    store: Arc<dyn PostStore>,

    /// Block updater service.
    ///
    /// Frozen at startup: the allow-list and render callbacks are fixed.
    updater: BlockUpdater,

    /// Authorization predicate for block updater routes.
    gate: Arc<dyn AccessGate>,

    /// Accepted editor API tokens.
    editor_tokens: EditorTokens,

    /// Prometheus metrics.
    metrics: Arc<Metrics>,
}

impl AppState {
    /// Create application state backed by PostgreSQL.
    pub async fn new(config: &Config) -> Result<Self> {
        let db = db::create_pool(config)
            .await
            .context("failed to create database pool")?;

        db::run_migrations(&db)
            .await
            .context("failed to run migrations")?;

        let editor_tokens = EditorTokens::from_hex_digests(config.editor_token_hashes.as_slice())
            .context("invalid EDITOR_TOKEN_HASHES")?;
        if editor_tokens.is_empty() {
            warn!("no editor tokens configured; every block updater request will be refused");
        }

        let blocks = UpdatableBlocks::from_names(&config.updatable_blocks);
        info!(
            blocks = blocks.len(),
            editor_tokens = editor_tokens.len(),
            "block updater configured"
        );

        Ok(AppStateBuilder::new(Arc::new(PgPostStore::new(db)))
            .blocks(blocks)
            .editor_tokens(editor_tokens)
            .build())
    }

    /// Start building state over an arbitrary store.
    pub fn builder(store: Arc<dyn PostStore>) -> AppStateBuilder {
        AppStateBuilder::new(store)
    }

    /// Get the post store.
    pub fn store(&self) -> &Arc<dyn PostStore> {
        &self.inner.store
    }

    /// Get the block updater service.
    pub fn updater(&self) -> &BlockUpdater {
        &self.inner.updater
    }

    /// Get the access gate.
    pub fn gate(&self) -> &dyn AccessGate {
        self.inner.gate.as_ref()
    }

    /// Get the accepted editor tokens.
    pub fn editor_tokens(&self) -> &EditorTokens {
        &self.inner.editor_tokens
    }

    /// Get the metrics registry.
    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.inner.metrics
    }
}

/// Assembles [`AppState`] from parts. Used by tests and embedders.
pub struct AppStateBuilder {
    store: Arc<dyn PostStore>,
    blocks: UpdatableBlocks,
    renderer: BlockRenderer,
    gate: Arc<dyn AccessGate>,
    editor_tokens: EditorTokens,
}

impl AppStateBuilder {
    fn new(store: Arc<dyn PostStore>) -> Self {
        Self {
            store,
            blocks: UpdatableBlocks::new(),
            renderer: BlockRenderer::new(),
            gate: Arc::new(CapabilityGate::editors()),
            editor_tokens: EditorTokens::default(),
        }
    }

    /// Set the block allow-list.
    pub fn blocks(mut self, blocks: UpdatableBlocks) -> Self {
        self.blocks = blocks;
        self
    }

    /// Set the renderer used by the default transform.
    pub fn renderer(mut self, renderer: BlockRenderer) -> Self {
        self.renderer = renderer;
        self
    }

    /// Replace the access gate.
    pub fn gate(mut self, gate: Arc<dyn AccessGate>) -> Self {
        self.gate = gate;
        self
    }

    /// Set the accepted editor tokens.
    pub fn editor_tokens(mut self, tokens: EditorTokens) -> Self {
        self.editor_tokens = tokens;
        self
    }

    pub fn build(self) -> AppState {
        let updater = BlockUpdater::new(self.store.clone(), self.blocks, self.renderer);
        AppState {
            inner: Arc::new(AppStateInner {
                store: self.store,
                updater,
                gate: self.gate,
                editor_tokens: self.editor_tokens,
                metrics: Arc::new(Metrics::new()),
            }),
        }
    }
}
