//! The synchronization core: intent streams in, outcome streams out.
//!
//! Each engine exposes `observe(actions) -> results`. A spawned worker task
//! owns every store and network touch, so callers never block; dropping the
//! result receiver cancels the worker. Store-driven `Update` results
//! interleave freely with action-triggered ones.

pub mod sources;
pub mod stories;
pub mod throttle;

pub use sources::{SourceAction, SourceResult, SourceSyncEngine};
pub use stories::{StoryAction, StoryResult, StorySyncEngine};
pub use throttle::SyncThrottle;

use thiserror::Error;

use crate::app::NewsflowError;

/// Resource key for the source list in the sync bookkeeping table.
pub const SOURCE_RESOURCE: &str = "source";

/// Sources are refreshed at most once per day.
pub const SOURCE_SYNC_INTERVAL: std::time::Duration = std::time::Duration::from_secs(86_400);

/// Failure classification carried in results and state snapshots.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// Connectivity or IO-class failure reaching the remote.
    #[error("network failure: {0}")]
    Transport(String),

    /// The remote answered but reported an error status with no payload.
    #[error("remote api reported an error status")]
    Api,

    #[error("sync failed: {0}")]
    Unknown(String),
}

impl SyncError {
    pub fn is_transport(&self) -> bool {
        matches!(self, SyncError::Transport(_))
    }
}

impl From<NewsflowError> for SyncError {
    fn from(error: NewsflowError) -> Self {
        match error {
            NewsflowError::Http(e) if e.is_decode() => SyncError::Unknown(e.to_string()),
            NewsflowError::Http(e) => SyncError::Transport(e.to_string()),
            NewsflowError::Io(e) => SyncError::Transport(e.to_string()),
            other => SyncError::Unknown(other.to_string()),
        }
    }
}
