use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use crate::domain::Story;
use crate::reducer::{logo_url, spawn_fold};
use crate::sync::{StoryAction, StoryResult, StorySyncEngine, SyncError};

/// Words per minute assumed when deriving reading time from word count.
const READING_SPEED: i64 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoryEvent {
    Refresh,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoryView {
    pub url: String,
    pub title: String,
    pub source: String,
    pub source_logo: String,
    pub author: Option<String>,
    pub thumbnail: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub content: Option<String>,
    /// Minutes, from word count. `None` until content is extracted.
    pub time_to_read: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct StoryState {
    pub progress: bool,
    pub error: Option<SyncError>,
    pub story: Option<StoryView>,
}

/// Single-story detail: observes one url and drives content extraction.
pub struct StoryReducer {
    engine: Arc<StorySyncEngine>,
    last_state: Arc<Mutex<StoryState>>,
}

impl StoryReducer {
    pub fn new(engine: Arc<StorySyncEngine>) -> Self {
        Self {
            engine,
            last_state: Arc::new(Mutex::new(StoryState::default())),
        }
    }

    pub fn update(
        &self,
        url: &str,
        events: mpsc::Receiver<StoryEvent>,
    ) -> mpsc::Receiver<StoryState> {
        let (action_tx, action_rx) = mpsc::channel(16);
        tokio::spawn(map_events(url.to_string(), events, action_tx));
        let results = self.engine.observe(action_rx);
        let url = url.to_string();
        spawn_fold(self.last_state.clone(), results, move |state, result| {
            reduce(&url, state, result)
        })
    }
}

async fn map_events(
    url: String,
    mut events: mpsc::Receiver<StoryEvent>,
    tx: mpsc::Sender<StoryAction>,
) {
    if tx.send(StoryAction::Get(Some(url.clone()))).await.is_err() {
        return;
    }
    while let Some(StoryEvent::Refresh) = events.recv().await {
        if tx.send(StoryAction::Sync(Some(url.clone()))).await.is_err() {
            break;
        }
    }
}

fn reduce(url: &str, state: StoryState, result: StoryResult) -> StoryState {
    let mut next = StoryState {
        error: None,
        ..state
    };
    match result {
        // The scope is a single url; anything else is a stale snapshot.
        StoryResult::Update(stories) => match stories.first() {
            Some(story) if stories.len() == 1 && story.url == url => {
                next.story = Some(story_view(story));
            }
            _ => {}
        },
        StoryResult::Syncing(_) => next.progress = true,
        StoryResult::Synced(_) => next.progress = false,
        StoryResult::Error { error, .. } => {
            next.progress = false;
            next.error = Some(error);
        }
    }
    next
}

fn story_view(story: &Story) -> StoryView {
    StoryView {
        url: story.url.clone(),
        title: story.title.clone(),
        source: story.source.name.clone(),
        source_logo: logo_url(&story.source.url),
        author: story.author.clone(),
        thumbnail: story.thumbnail.clone(),
        published_at: story.published_at,
        content: story.content.clone(),
        time_to_read: story.word_count.map(|words| words / READING_SPEED),
    }
}
