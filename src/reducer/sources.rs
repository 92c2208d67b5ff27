use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use crate::domain::{Source, SourceSelection};
use crate::reducer::{logo_url, spawn_fold};
use crate::sync::{SourceAction, SourceResult, SourceSyncEngine, SyncError};

#[derive(Debug, Clone, PartialEq)]
pub enum SourcesEvent {
    Refresh,
    /// Toggle the tapped source; `item` carries the flag as rendered.
    Select(SourceItem),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SourceItem {
    pub id: String,
    pub name: String,
    pub logo: String,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SourcesState {
    pub progress: bool,
    pub error: Option<SyncError>,
    /// `None` until the first store read lands; distinguishes "loading"
    /// from "no sources".
    pub sources: Option<Vec<SourceItem>>,
}

pub struct SourcesReducer {
    engine: Arc<SourceSyncEngine>,
    last_state: Arc<Mutex<SourcesState>>,
}

impl SourcesReducer {
    pub fn new(engine: Arc<SourceSyncEngine>) -> Self {
        Self {
            engine,
            last_state: Arc::new(Mutex::new(SourcesState::default())),
        }
    }

    pub fn update(&self, events: mpsc::Receiver<SourcesEvent>) -> mpsc::Receiver<SourcesState> {
        let (action_tx, action_rx) = mpsc::channel(16);
        tokio::spawn(map_events(events, action_tx));
        let results = self.engine.observe(action_rx);
        spawn_fold(self.last_state.clone(), results, reduce)
    }
}

async fn map_events(mut events: mpsc::Receiver<SourcesEvent>, tx: mpsc::Sender<SourceAction>) {
    while let Some(event) = events.recv().await {
        let action = match event {
            SourcesEvent::Refresh => SourceAction::Sync,
            SourcesEvent::Select(item) => SourceAction::Select(SourceSelection {
                id: item.id,
                selected: !item.selected,
            }),
        };
        if tx.send(action).await.is_err() {
            break;
        }
    }
}

fn reduce(state: SourcesState, result: SourceResult) -> SourcesState {
    let mut next = SourcesState {
        error: None,
        ..state
    };
    match result {
        SourceResult::Update(sources) => {
            next.sources = Some(sources.iter().map(source_item).collect());
        }
        SourceResult::Syncing => next.progress = true,
        SourceResult::Synced => next.progress = false,
        SourceResult::Error(error) => {
            next.progress = false;
            next.error = Some(error);
        }
    }
    next
}

fn source_item(source: &Source) -> SourceItem {
    SourceItem {
        id: source.id.clone(),
        name: source.name.clone(),
        logo: logo_url(&source.url),
        selected: source.selected,
    }
}
