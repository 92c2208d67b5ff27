pub mod sqlite;

use tokio::sync::watch;

use crate::app::Result;
use crate::domain::{Source, SourceBase, SourceSelection, Story, StoryBase, StoryExtra, SyncRecord};

pub use sqlite::SqliteStore;

/// The local persistence boundary.
///
/// Reads are plain snapshot queries; "read as stream" is realized by pairing
/// a snapshot query with the matching revision watch: writers bump a revision
/// counter, observers re-query on every bump.
pub trait Store: Send + Sync {
    // Source operations
    fn all_sources(&self) -> Result<Vec<Source>>;
    fn selected_sources(&self) -> Result<Vec<Source>>;
    /// Insert-or-replace; sync owns these fields.
    fn save_source_bases(&self, sources: &[SourceBase]) -> Result<()>;
    /// Insert-or-ignore, so an existing user selection survives re-sync.
    fn save_source_selections(&self, selections: &[SourceSelection]) -> Result<()>;
    fn update_source_selection(&self, selection: &SourceSelection) -> Result<()>;

    // Story operations
    fn all_stories(&self) -> Result<Vec<Story>>;
    fn story(&self, url: &str) -> Result<Vec<Story>>;
    /// Insert-or-replace; sync owns these fields.
    fn save_story_bases(&self, stories: &[StoryBase]) -> Result<()>;
    /// Insert-or-ignore, so extracted content and read state survive re-sync.
    fn save_story_extras(&self, extras: &[StoryExtra]) -> Result<()>;
    fn story_extra(&self, url: &str) -> Result<Option<StoryExtra>>;
    fn update_story_extra(&self, extra: &StoryExtra) -> Result<()>;

    // Sync bookkeeping
    fn sync_record(&self, resource: &str) -> Result<Option<SyncRecord>>;
    fn save_sync_record(&self, record: &SyncRecord) -> Result<()>;

    // Change feeds
    fn source_changes(&self) -> watch::Receiver<u64>;
    fn story_changes(&self) -> watch::Receiver<u64>;
}
