//! Reducers fold engine result streams into immutable view state.
//!
//! One reducer per presentation surface. Each maps UI events to engine
//! actions, folds the result stream with a total, pure `reduce` function and
//! keeps the last emitted state as instance memory, so a re-subscribing
//! surface immediately receives where it left off instead of a default
//! (no flash of initial state).

pub mod sources;
pub mod splash;
pub mod stories;
pub mod story;

pub use sources::{SourceItem, SourcesEvent, SourcesReducer, SourcesState};
pub use splash::{SplashEvent, SplashReducer, SplashState};
pub use stories::{StoriesEvent, StoriesReducer, StoriesState, StoryItem};
pub use story::{StoryEvent, StoryReducer, StoryState, StoryView};

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::mpsc;
use url::Url;

/// Logo endpoint derived from a source's site host, as rendered by the
/// source and story lists.
pub fn logo_url(source_url: &str) -> String {
    Url::parse(source_url)
        .ok()
        .and_then(|url| {
            url.host_str()
                .map(|host| format!("https://logo.clearbit.com/{host}"))
        })
        .unwrap_or_default()
}

pub(crate) fn lock<T>(state: &Mutex<T>) -> MutexGuard<'_, T> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Shared fold loop: seed with the retained state, emit it first, then fold
/// every result and write each new state back into the retained slot.
pub(crate) fn spawn_fold<S, R, F>(
    last_state: Arc<Mutex<S>>,
    mut results: mpsc::Receiver<R>,
    mut reduce: F,
) -> mpsc::Receiver<S>
where
    S: Clone + Send + 'static,
    R: Send + 'static,
    F: FnMut(S, R) -> S + Send + 'static,
{
    let (tx, rx) = mpsc::channel(16);
    tokio::spawn(async move {
        let mut state = lock(&last_state).clone();
        if tx.send(state.clone()).await.is_err() {
            return;
        }
        while let Some(result) = results.recv().await {
            state = reduce(state, result);
            *lock(&last_state) = state.clone();
            if tx.send(state.clone()).await.is_err() {
                return;
            }
        }
    });
    rx
}
