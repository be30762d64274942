//! Application state management

use std::sync::Arc;
use std::time::Duration;

use sqlx::SqlitePool;

use crate::annotator::{ContentAnnotator, FetchError, HttpTitleFetcher, TitleFetcher, TitleResolver};
use crate::cache::{CacheBackend, MemoryTitleCache, SqliteTitleCache, TitleCache};
use crate::config::Config;
use crate::editor::{control_for, EditorControl};

/// Error type for state initialization
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("Failed to initialize title fetcher: {0}")]
    FetcherInit(#[from] FetchError),
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    pub config: Config,
    pub db: SqlitePool,
    pub title_cache: Arc<dyn TitleCache>,
    pub annotator: ContentAnnotator,
    pub editor_control: Arc<dyn EditorControl>,
}

impl AppState {
    /// Create application state with the HTTP title fetcher and the
    /// configured cache backend
    pub fn new(config: Config, db: SqlitePool) -> Result<Self, StateError> {
        let fetcher = HttpTitleFetcher::new(&config.fetch)?;

        let title_cache: Arc<dyn TitleCache> = match config.cache.backend {
            CacheBackend::Memory => Arc::new(MemoryTitleCache::new()),
            CacheBackend::Sqlite => Arc::new(SqliteTitleCache::new(db.clone())),
        };

        Ok(Self::from_parts(config, db, title_cache, Arc::new(fetcher)))
    }

    /// Assemble state from explicit collaborators
    pub fn from_parts(
        config: Config,
        db: SqlitePool,
        title_cache: Arc<dyn TitleCache>,
        fetcher: Arc<dyn TitleFetcher>,
    ) -> Self {
        let resolver = TitleResolver::new(title_cache.clone(), fetcher);
        let annotator = ContentAnnotator::new(
            config.site.base_url.clone(),
            resolver,
            config.site.references_heading.clone(),
        )
        .with_render_budget(config.fetch.render_budget_secs.map(Duration::from_secs));

        // Placement is fixed for the lifetime of the process
        let editor_control = control_for(config.site.display_location);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                db,
                title_cache,
                annotator,
                editor_control,
            }),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get the database pool
    pub fn db(&self) -> &SqlitePool {
        &self.inner.db
    }

    /// Get the title cache
    pub fn title_cache(&self) -> &Arc<dyn TitleCache> {
        &self.inner.title_cache
    }

    /// Get the content annotator
    pub fn annotator(&self) -> &ContentAnnotator {
        &self.inner.annotator
    }

    /// Get the editor control for the configured placement
    pub fn editor_control(&self) -> &Arc<dyn EditorControl> {
        &self.inner.editor_control
    }
}
