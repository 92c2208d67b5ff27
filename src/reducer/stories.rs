use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use crate::domain::Story;
use crate::reducer::{logo_url, spawn_fold};
use crate::sync::{StoryAction, StoryResult, StorySyncEngine, SyncError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoriesEvent {
    Refresh,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoryItem {
    pub url: String,
    pub title: String,
    pub source: String,
    pub source_logo: String,
    pub author: Option<String>,
    pub description: Option<String>,
    pub thumbnail: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct StoriesState {
    pub progress: bool,
    pub error: Option<SyncError>,
    pub stories: Vec<StoryItem>,
}

/// Headline list over every selected source.
pub struct StoriesReducer {
    engine: Arc<StorySyncEngine>,
    last_state: Arc<Mutex<StoriesState>>,
}

impl StoriesReducer {
    pub fn new(engine: Arc<StorySyncEngine>) -> Self {
        Self {
            engine,
            last_state: Arc::new(Mutex::new(StoriesState::default())),
        }
    }

    pub fn update(&self, events: mpsc::Receiver<StoriesEvent>) -> mpsc::Receiver<StoriesState> {
        let (action_tx, action_rx) = mpsc::channel(16);
        tokio::spawn(map_events(events, action_tx));
        let results = self.engine.observe(action_rx);
        spawn_fold(self.last_state.clone(), results, reduce)
    }
}

async fn map_events(mut events: mpsc::Receiver<StoriesEvent>, tx: mpsc::Sender<StoryAction>) {
    // Establish the live all-stories scope before any refresh.
    if tx.send(StoryAction::Get(None)).await.is_err() {
        return;
    }
    while let Some(StoriesEvent::Refresh) = events.recv().await {
        if tx.send(StoryAction::Sync(None)).await.is_err() {
            break;
        }
    }
}

fn reduce(state: StoriesState, result: StoryResult) -> StoriesState {
    let mut next = StoriesState {
        error: None,
        ..state
    };
    match result {
        StoryResult::Update(stories) => {
            next.stories = stories.iter().map(story_item).collect();
        }
        StoryResult::Syncing(_) => next.progress = true,
        StoryResult::Synced(_) => next.progress = false,
        StoryResult::Error { error, .. } => {
            next.progress = false;
            next.error = Some(error);
        }
    }
    next
}

fn story_item(story: &Story) -> StoryItem {
    StoryItem {
        url: story.url.clone(),
        title: story.title.clone(),
        source: story.source.name.clone(),
        source_logo: logo_url(&story.source.url),
        author: story.author.clone(),
        description: story.description.clone(),
        thumbnail: story.thumbnail.clone(),
    }
}
