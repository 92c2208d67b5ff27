use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::Source;

/// A story as read back from the store: base fields, the extra record and the
/// owning source joined into one row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Story {
    pub url: String,
    pub title: String,
    pub description: Option<String>,
    pub author: Option<String>,
    pub thumbnail: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub source: Source,
    pub read: bool,
    pub content: Option<String>,
    pub word_count: Option<i64>,
}

/// Sync-owned half of a story. Replaced wholesale on every headline sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoryBase {
    pub url: String,
    pub title: String,
    pub description: Option<String>,
    pub source: String,
    pub author: Option<String>,
    pub thumbnail: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

/// User-local half of a story: read flag and extracted content. Inserted
/// empty alongside its base and only ever updated in place, so extracted
/// content and read state survive re-sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoryExtra {
    pub url: String,
    pub read: bool,
    pub content: Option<String>,
    pub word_count: Option<i64>,
}

impl StoryExtra {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            read: false,
            content: None,
            word_count: None,
        }
    }
}
