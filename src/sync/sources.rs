use std::sync::Arc;

use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::api::{ApiSource, RemoteApi};
use crate::domain::{Source, SourceBase, SourceSelection, SyncRecord};
use crate::store::Store;
use crate::sync::{SyncError, SyncThrottle, SOURCE_RESOURCE, SOURCE_SYNC_INTERVAL};

#[derive(Debug, Clone, PartialEq)]
pub enum SourceAction {
    /// Refresh the source list from the remote, subject to throttling.
    Sync,
    /// Toggle a source on or off. Fire-and-forget: no result is emitted,
    /// the store-driven `Update` channel reflects the change.
    Select(SourceSelection),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SourceResult {
    Syncing,
    Synced,
    Update(Vec<Source>),
    Error(SyncError),
}

/// Reconciles the source list and selection flags between store and remote.
pub struct SourceSyncEngine {
    store: Arc<dyn Store>,
    api: Arc<dyn RemoteApi>,
}

impl SourceSyncEngine {
    pub fn new(store: Arc<dyn Store>, api: Arc<dyn RemoteApi>) -> Self {
        Self { store, api }
    }

    /// Turn a stream of actions into a stream of results.
    ///
    /// All store and network work happens on a spawned worker task. The
    /// result stream always starts with an `Update` of the stored sources
    /// and re-emits one on every store change, whoever caused it. Dropping
    /// the returned receiver stops the worker.
    pub fn observe(&self, actions: mpsc::Receiver<SourceAction>) -> mpsc::Receiver<SourceResult> {
        let (tx, rx) = mpsc::channel(32);
        let worker = Worker {
            store: self.store.clone(),
            api: self.api.clone(),
            throttle: SyncThrottle::new(self.store.clone()),
        };
        tokio::spawn(worker.run(actions, tx));
        rx
    }
}

struct Worker {
    store: Arc<dyn Store>,
    api: Arc<dyn RemoteApi>,
    throttle: SyncThrottle,
}

impl Worker {
    async fn run(self, mut actions: mpsc::Receiver<SourceAction>, tx: mpsc::Sender<SourceResult>) {
        let mut changes = self.store.source_changes();

        if !self.emit_sources(&tx).await {
            return;
        }

        loop {
            tokio::select! {
                changed = changes.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    if !self.emit_sources(&tx).await {
                        return;
                    }
                }
                action = actions.recv() => match action {
                    None => break,
                    Some(SourceAction::Sync) => {
                        if !self.handle_sync(&tx).await {
                            return;
                        }
                    }
                    Some(SourceAction::Select(selection)) => {
                        if let Err(e) = self.store.update_source_selection(&selection) {
                            warn!("source selection update failed: {e}");
                        }
                    }
                }
            }
        }
    }

    async fn emit_sources(&self, tx: &mpsc::Sender<SourceResult>) -> bool {
        match self.store.all_sources() {
            Ok(sources) => tx.send(SourceResult::Update(sources)).await.is_ok(),
            Err(e) => {
                warn!("source list read failed: {e}");
                true
            }
        }
    }

    async fn handle_sync(&self, tx: &mpsc::Sender<SourceResult>) -> bool {
        // An unreadable sync record must never wedge refresh; treat it as due.
        let due = match self
            .throttle
            .is_due(SOURCE_RESOURCE, Utc::now(), SOURCE_SYNC_INTERVAL)
        {
            Ok(due) => due,
            Err(e) => {
                warn!("sync record read failed: {e}");
                true
            }
        };
        if !due {
            debug!("source sync throttled");
            return true;
        }

        if tx.send(SourceResult::Syncing).await.is_err() {
            return false;
        }

        // One request; its single response feeds both the store write-back
        // and the result mapping.
        let result = match self.api.list_sources().await {
            Ok(response) => match response.sources {
                Some(sources) => match self.persist(&sources) {
                    Ok(()) => {
                        debug!("synced {} sources", sources.len());
                        SourceResult::Synced
                    }
                    Err(e) => {
                        warn!("source write-back failed: {e}");
                        SourceResult::Error(SyncError::Unknown(e.to_string()))
                    }
                },
                None => SourceResult::Error(SyncError::Api),
            },
            Err(e) => SourceResult::Error(e.into()),
        };

        tx.send(result).await.is_ok()
    }

    fn persist(&self, sources: &[ApiSource]) -> crate::app::Result<()> {
        let bases: Vec<SourceBase> = sources
            .iter()
            .map(|s| SourceBase {
                id: s.id.clone(),
                name: s.name.clone(),
                url: s.url.clone(),
            })
            .collect();
        let selections: Vec<SourceSelection> = sources
            .iter()
            .map(|s| SourceSelection::unselected(s.id.clone()))
            .collect();

        self.store.save_source_bases(&bases)?;
        self.store.save_source_selections(&selections)?;
        self.store
            .save_sync_record(&SyncRecord::new(SOURCE_RESOURCE, Utc::now()))
    }
}
