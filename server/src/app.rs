//! Application state and initialization
//!
//! This module manages the central application state and lifecycle.
//! All services are initialized here and made available through AppState.

use crate::clients::{CommandPdfRenderer, GeminiSummarizer, PdfRenderer, Summarizer};
use crate::config::ServerConfig;
use crate::database::{create_pool, Repository};
use crate::error::Result;
use crate::services::{AuthService, DraftsService, ExportService, NotesService, SummariesService};
use crate::web;
use axum::Router;
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Central application state holding all services
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub auth: AuthService,
    pub notes: NotesService,
    pub drafts: DraftsService,
    pub summaries: SummariesService,
    pub export: ExportService,
}

impl AppState {
    /// Wire services over an open pool and the given external clients
    pub fn new(
        pool: SqlitePool,
        config: ServerConfig,
        summarizer: Arc<dyn Summarizer>,
        pdf: Arc<dyn PdfRenderer>,
    ) -> Self {
        let repo = Repository::new(pool);

        Self {
            config: Arc::new(config),
            auth: AuthService::new(repo.clone()),
            notes: NotesService::new(repo.clone()),
            drafts: DraftsService::new(repo.clone()),
            summaries: SummariesService::new(repo.clone(), summarizer),
            export: ExportService::new(repo, pdf),
        }
    }
}

/// Application setup - called once on startup
pub async fn setup(config: ServerConfig) -> Result<AppState> {
    tracing::info!("Initializing application");

    let pool = create_pool(&config.database_path).await?;

    if config.summarizer_api_key.is_none() {
        tracing::warn!("No summarizer API key configured; summaries will report an error");
    }

    let summarizer: Arc<dyn Summarizer> = Arc::new(GeminiSummarizer::new(&config)?);
    let pdf: Arc<dyn PdfRenderer> = Arc::new(CommandPdfRenderer::from_config(&config));

    tracing::info!("Application initialized successfully");

    Ok(AppState::new(pool, config, summarizer, pdf))
}

/// Router with request tracing and the overall request timeout
pub fn build_router(state: AppState) -> Router {
    let timeout = Duration::from_secs(state.config.request_timeout_secs);

    web::routes()
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(timeout))
        .with_state(state)
}
