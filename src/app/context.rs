use std::path::PathBuf;
use std::sync::Arc;

use crate::api::http::HttpRemoteApi;
use crate::api::RemoteApi;
use crate::app::error::{NewsflowError, Result};
use crate::config::AppConfig;
use crate::prefs::Preferences;
use crate::reducer::{SourcesReducer, SplashReducer, StoriesReducer, StoryReducer};
use crate::store::sqlite::SqliteStore;
use crate::sync::{SourceSyncEngine, StorySyncEngine};

/// One wired instance of the whole pipeline: store, remote api, engines and
/// a reducer per surface. Reducers share engines, engines share the store,
/// so every surface sees the same data.
pub struct AppContext {
    pub store: Arc<SqliteStore>,
    pub api: Arc<dyn RemoteApi>,
    pub prefs: Arc<Preferences>,
    pub splash: SplashReducer,
    pub sources: SourcesReducer,
    pub stories: StoriesReducer,
    story_engine: Arc<StorySyncEngine>,
}

impl AppContext {
    pub fn new(config: AppConfig) -> Result<Self> {
        let db_path = match config.db_path {
            Some(p) => p,
            None => Self::default_data_path("newsflow.db")?,
        };
        let prefs_path = match config.prefs_path {
            Some(p) => p,
            None => Self::default_data_path("prefs.toml")?,
        };

        let store = Arc::new(SqliteStore::new(&db_path)?);
        let api: Arc<dyn RemoteApi> = Arc::new(HttpRemoteApi::new(config.api)?);
        let prefs = Arc::new(Preferences::load(prefs_path)?);
        Ok(Self::wire(store, api, prefs))
    }

    /// Ephemeral instance over an injected api, for tests and embedders.
    pub fn in_memory(api: Arc<dyn RemoteApi>) -> Result<Self> {
        let store = Arc::new(SqliteStore::in_memory()?);
        let prefs = Arc::new(Preferences::in_memory());
        Ok(Self::wire(store, api, prefs))
    }

    fn wire(store: Arc<SqliteStore>, api: Arc<dyn RemoteApi>, prefs: Arc<Preferences>) -> Self {
        let source_engine = Arc::new(SourceSyncEngine::new(store.clone(), api.clone()));
        let story_engine = Arc::new(StorySyncEngine::new(store.clone(), api.clone()));

        Self {
            splash: SplashReducer::new(source_engine.clone(), prefs.clone()),
            sources: SourcesReducer::new(source_engine),
            stories: StoriesReducer::new(story_engine.clone()),
            story_engine,
            store,
            api,
            prefs,
        }
    }

    /// One reducer per detail surface: its retained state belongs to a single
    /// story, so it is not shared the way the list reducers are.
    pub fn story_reducer(&self) -> StoryReducer {
        StoryReducer::new(self.story_engine.clone())
    }

    fn default_data_path(file: &str) -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| NewsflowError::Config("Could not find data directory".into()))?;
        let newsflow_dir = data_dir.join("newsflow");
        std::fs::create_dir_all(&newsflow_dir)?;
        Ok(newsflow_dir.join(file))
    }
}
