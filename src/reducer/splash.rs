use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tracing::debug;

use crate::prefs::Preferences;
use crate::reducer::lock;
use crate::sync::{SourceAction, SourceResult, SourceSyncEngine, SyncError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplashEvent {
    Retry,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SplashState {
    pub progress: bool,
    pub error: Option<SyncError>,
    /// The database holds a synced source list; the app can move on.
    pub success: bool,
}

/// First-run gate: ensures the source list has been synced exactly once
/// before the app proceeds, then flips the persisted flag so later launches
/// skip the network entirely.
pub struct SplashReducer {
    engine: Arc<SourceSyncEngine>,
    prefs: Arc<Preferences>,
    last_state: Arc<Mutex<SplashState>>,
}

/// Inputs to the splash fold: engine results, plus the moment the
/// initialized flag turns on.
#[derive(Debug, Clone)]
enum Signal {
    Result(SourceResult),
    Initialized,
}

impl SplashReducer {
    pub fn new(engine: Arc<SourceSyncEngine>, prefs: Arc<Preferences>) -> Self {
        Self {
            engine,
            prefs,
            last_state: Arc::new(Mutex::new(SplashState::default())),
        }
    }

    pub fn update(&self, events: mpsc::Receiver<SplashEvent>) -> mpsc::Receiver<SplashState> {
        let (action_tx, action_rx) = mpsc::channel(16);
        let (signal_tx, signal_rx) = mpsc::channel(32);

        let results = self.engine.observe(action_rx);
        tokio::spawn(pump_results(results, self.prefs.clone(), signal_tx.clone()));
        tokio::spawn(bootstrap(self.prefs.clone(), action_tx.clone(), signal_tx));
        tokio::spawn(map_events(events, action_tx));

        self.fold(signal_rx)
    }

    /// Like the shared fold, but consecutive duplicates are dropped: most
    /// engine results leave the splash state untouched.
    fn fold(&self, mut signals: mpsc::Receiver<Signal>) -> mpsc::Receiver<SplashState> {
        let last_state = self.last_state.clone();
        let (tx, rx) = mpsc::channel(16);
        tokio::spawn(async move {
            let mut state = lock(&last_state).clone();
            if tx.send(state.clone()).await.is_err() {
                return;
            }
            while let Some(signal) = signals.recv().await {
                let next = reduce(state.clone(), signal);
                if next == state {
                    continue;
                }
                state = next;
                *lock(&last_state) = state.clone();
                if tx.send(state.clone()).await.is_err() {
                    return;
                }
            }
        });
        rx
    }
}

/// Kick off the one-time sync when the flag is off, and report the flag
/// turning on, whenever that happens.
async fn bootstrap(
    prefs: Arc<Preferences>,
    actions: mpsc::Sender<SourceAction>,
    signals: mpsc::Sender<Signal>,
) {
    let mut initialized = prefs.watch_db_initialized();
    if !*initialized.borrow_and_update() {
        debug!("database uninitialized, requesting first source sync");
        if actions.send(SourceAction::Sync).await.is_err() {
            return;
        }
        if initialized.changed().await.is_err() {
            return;
        }
    }
    let _ = signals.send(Signal::Initialized).await;
}

/// Forwards engine results into the fold and flips the persisted flag on
/// the first successful sync.
async fn pump_results(
    mut results: mpsc::Receiver<SourceResult>,
    prefs: Arc<Preferences>,
    signals: mpsc::Sender<Signal>,
) {
    while let Some(result) = results.recv().await {
        if result == SourceResult::Synced {
            prefs.set_db_initialized(true);
        }
        if signals.send(Signal::Result(result)).await.is_err() {
            break;
        }
    }
}

async fn map_events(mut events: mpsc::Receiver<SplashEvent>, tx: mpsc::Sender<SourceAction>) {
    while let Some(SplashEvent::Retry) = events.recv().await {
        if tx.send(SourceAction::Sync).await.is_err() {
            break;
        }
    }
}

fn reduce(state: SplashState, signal: Signal) -> SplashState {
    let mut next = state;
    match signal {
        Signal::Initialized => {
            next.progress = false;
            next.error = None;
            next.success = true;
        }
        Signal::Result(SourceResult::Syncing) => {
            next.progress = true;
            next.error = None;
        }
        Signal::Result(SourceResult::Synced) => next.progress = false,
        Signal::Result(SourceResult::Error(error)) => {
            next.progress = false;
            next.error = Some(error);
        }
        // Source list snapshots are the other surfaces' concern.
        Signal::Result(SourceResult::Update(_)) => {}
    }
    next
}
