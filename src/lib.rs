//! # Newsflow
//!
//! An embeddable, offline-first news synchronization engine.
//!
//! ## Architecture
//!
//! Newsflow follows a unidirectional pipeline architecture:
//!
//! ```text
//! Events → Actions → Engine (RemoteApi + Store) → Results → Reducer → State
//! ```
//!
//! Presentation surfaces send event streams in and fold state streams out;
//! all network and database work happens on worker tasks owned by the sync
//! engines. The store is the single source of truth: remote fetches are
//! written back first and surfaces observe the store, so every surface sees
//! the same data and everything read once works offline.
//!
//! ## Modules
//!
//! - [`app`]: Application context and error types
//! - [`config`]: Endpoint and path configuration
//! - [`domain`]: Core domain models (Source, Story, SyncRecord)
//! - [`api`]: Remote news and content-extraction protocols
//! - [`store`]: SQLite persistence with change feeds
//! - [`sync`]: Source and story synchronization engines
//! - [`reducer`]: Per-surface state reducers
//! - [`prefs`]: Small persisted preferences

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together all components:
/// store, remote api, engines and reducers.
pub mod app;

/// Remote protocol clients and response types.
///
/// - [`RemoteApi`](api::RemoteApi): Async trait over both remote services
/// - [`HttpRemoteApi`](api::http::HttpRemoteApi): reqwest-based implementation
pub mod api;

/// Configuration loaded from `~/.config/newsflow/config.toml`.
pub mod config;

/// Core domain models.
///
/// - [`Source`](domain::Source): A news outlet with its selection flag
/// - [`Story`](domain::Story): A story joined with its user-local state
/// - [`SyncRecord`](domain::SyncRecord): Per-resource sync bookkeeping
pub mod domain;

/// Persisted preferences, separate from the story database.
pub mod prefs;

/// Per-surface state reducers.
///
/// - [`SplashReducer`](reducer::SplashReducer): First-run bootstrap gate
/// - [`SourcesReducer`](reducer::SourcesReducer): Source catalog and selection
/// - [`StoriesReducer`](reducer::StoriesReducer): Headline list
/// - [`StoryReducer`](reducer::StoryReducer): Single-story detail
pub mod reducer;

/// SQLite persistence layer.
///
/// - [`Store`](store::Store): Trait defining storage operations
/// - [`SqliteStore`](store::SqliteStore): SQLite implementation
pub mod store;

/// Source and story synchronization engines.
///
/// - [`SourceSyncEngine`](sync::SourceSyncEngine): Throttled source-list sync
/// - [`StorySyncEngine`](sync::StorySyncEngine): Headline fan-out and content extraction
/// - [`SyncThrottle`](sync::SyncThrottle): Interval gate over sync records
pub mod sync;
