use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::api::{ApiArticle, RemoteApi};
use crate::domain::{Story, StoryBase, StoryExtra};
use crate::store::Store;
use crate::sync::SyncError;

#[derive(Debug, Clone, PartialEq)]
pub enum StoryAction {
    /// Observe stored stories: all of them, or one by url.
    Get(Option<String>),
    /// `None`: refresh headlines for every selected source.
    /// `Some(url)`: extract full content for one story.
    Sync(Option<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum StoryResult {
    Syncing(Option<String>),
    Synced(Option<String>),
    Update(Vec<Story>),
    Error {
        url: Option<String>,
        error: SyncError,
    },
}

/// Fans article fetches out over the selected sources, aggregating partial
/// failures, and extracts single-story content on the side.
pub struct StorySyncEngine {
    store: Arc<dyn Store>,
    api: Arc<dyn RemoteApi>,
}

impl StorySyncEngine {
    pub fn new(store: Arc<dyn Store>, api: Arc<dyn RemoteApi>) -> Self {
        Self { store, api }
    }

    /// Turn a stream of actions into a stream of results.
    ///
    /// `Get` establishes a live scope: the current snapshot is emitted as an
    /// `Update` immediately and again on every store change. Headline sync
    /// runs on the worker loop itself (per-source fetches must stay
    /// sequential); content extraction runs on its own task so the two never
    /// block each other.
    pub fn observe(&self, actions: mpsc::Receiver<StoryAction>) -> mpsc::Receiver<StoryResult> {
        let (tx, rx) = mpsc::channel(32);
        let worker = Worker {
            store: self.store.clone(),
            api: self.api.clone(),
        };
        tokio::spawn(worker.run(actions, tx));
        rx
    }
}

/// Aggregation of one headline fan-out.
///
/// Error precedence is asymmetric on purpose: a transport-class error
/// latches and is never displaced, while any other recorded error is
/// replaceable by a later one.
#[derive(Debug, Default)]
struct FetchSummary {
    error: Option<SyncError>,
    stories: Vec<StoryBase>,
}

impl FetchSummary {
    fn record(&mut self, error: SyncError) {
        if !matches!(self.error, Some(SyncError::Transport(_))) {
            self.error = Some(error);
        }
    }
}

struct Worker {
    store: Arc<dyn Store>,
    api: Arc<dyn RemoteApi>,
}

impl Worker {
    async fn run(self, mut actions: mpsc::Receiver<StoryAction>, tx: mpsc::Sender<StoryResult>) {
        let mut changes = self.store.story_changes();
        let mut scope: Option<Option<String>> = None;

        loop {
            tokio::select! {
                changed = changes.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    if let Some(url) = &scope {
                        if !self.emit_stories(url.as_deref(), &tx).await {
                            return;
                        }
                    }
                }
                action = actions.recv() => match action {
                    None => break,
                    Some(StoryAction::Get(url)) => {
                        scope = Some(url.clone());
                        if !self.emit_stories(url.as_deref(), &tx).await {
                            return;
                        }
                    }
                    Some(StoryAction::Sync(None)) => {
                        if !self.handle_headline_sync(&tx).await {
                            return;
                        }
                    }
                    Some(StoryAction::Sync(Some(url))) => {
                        let store = self.store.clone();
                        let api = self.api.clone();
                        let tx = tx.clone();
                        tokio::spawn(extract_story(store, api, url, tx));
                    }
                }
            }
        }
    }

    async fn emit_stories(&self, url: Option<&str>, tx: &mpsc::Sender<StoryResult>) -> bool {
        let stories = match url {
            Some(url) => self.store.story(url),
            None => self.store.all_stories(),
        };
        match stories {
            Ok(stories) => tx.send(StoryResult::Update(stories)).await.is_ok(),
            Err(e) => {
                warn!("story read failed: {e}");
                true
            }
        }
    }

    async fn handle_headline_sync(&self, tx: &mpsc::Sender<StoryResult>) -> bool {
        if tx.send(StoryResult::Syncing(None)).await.is_err() {
            return false;
        }

        let sources = match self.store.selected_sources() {
            Ok(sources) => sources,
            Err(e) => {
                return tx
                    .send(StoryResult::Error {
                        url: None,
                        error: SyncError::Unknown(e.to_string()),
                    })
                    .await
                    .is_ok();
            }
        };

        // No selection is a successful no-op, not an error.
        if sources.is_empty() {
            return tx.send(StoryResult::Synced(None)).await.is_ok();
        }

        // Sequential fan-out in store order; every source is attempted even
        // after failures.
        let mut summary = FetchSummary::default();
        for source in &sources {
            match self.api.list_articles(&source.id).await {
                Ok(response) => match response.articles {
                    Some(articles) => summary.stories.extend(
                        articles
                            .into_iter()
                            .map(|article| story_base(article, &source.id)),
                    ),
                    None => summary.record(SyncError::Api),
                },
                Err(e) => summary.record(e.into()),
            }
        }

        debug!(
            "headline sync: {} stories across {} sources",
            summary.stories.len(),
            sources.len()
        );

        if let Err(e) = self.persist(&summary.stories) {
            warn!("story write-back failed: {e}");
            summary.record(SyncError::Unknown(e.to_string()));
        }

        let result = match summary.error {
            Some(error) => StoryResult::Error { url: None, error },
            None => StoryResult::Synced(None),
        };
        tx.send(result).await.is_ok()
    }

    fn persist(&self, stories: &[StoryBase]) -> crate::app::Result<()> {
        self.store.save_story_bases(stories)?;
        let extras: Vec<StoryExtra> = stories
            .iter()
            .map(|story| StoryExtra::new(story.url.clone()))
            .collect();
        self.store.save_story_extras(&extras)
    }
}

fn story_base(article: ApiArticle, source_id: &str) -> StoryBase {
    StoryBase {
        url: article.url,
        title: article.title,
        description: article.description,
        source: source_id.to_string(),
        author: article.author,
        thumbnail: article.url_to_image,
        published_at: article.published_at,
    }
}

async fn extract_story(
    store: Arc<dyn Store>,
    api: Arc<dyn RemoteApi>,
    url: String,
    tx: mpsc::Sender<StoryResult>,
) {
    if tx.send(StoryResult::Syncing(Some(url.clone()))).await.is_err() {
        return;
    }

    let extra = match store.story_extra(&url) {
        Ok(Some(extra)) => extra,
        Ok(None) => {
            let _ = tx
                .send(StoryResult::Error {
                    url: Some(url.clone()),
                    error: SyncError::Unknown(format!("no stored story for {url}")),
                })
                .await;
            return;
        }
        Err(e) => {
            let _ = tx
                .send(StoryResult::Error {
                    url: Some(url),
                    error: SyncError::Unknown(e.to_string()),
                })
                .await;
            return;
        }
    };

    let result = match api.extract_content(&url).await {
        Ok(response) => {
            // Content and word count are the only fields extraction owns;
            // the read flag stays as the user left it.
            let updated = StoryExtra {
                content: response.content,
                word_count: response.word_count,
                ..extra
            };
            match store.update_story_extra(&updated) {
                Ok(()) => StoryResult::Synced(Some(url)),
                Err(e) => StoryResult::Error {
                    url: Some(url),
                    error: SyncError::Unknown(e.to_string()),
                },
            }
        }
        Err(e) => StoryResult::Error {
            url: Some(url),
            error: e.into(),
        },
    };
    let _ = tx.send(result).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::MockApi;
    use crate::api::{ArticleListResponse, ExtractResponse};
    use crate::domain::{SourceBase, SourceSelection};
    use crate::store::SqliteStore;
    use std::time::Duration;

    fn engine() -> (Arc<SqliteStore>, Arc<MockApi>, StorySyncEngine) {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        let api = Arc::new(MockApi::new());
        let engine = StorySyncEngine::new(store.clone(), api.clone());
        (store, api, engine)
    }

    fn select_source(store: &SqliteStore, id: &str, name: &str) {
        store
            .save_source_bases(&[SourceBase {
                id: id.into(),
                name: name.into(),
                url: format!("http://{id}.com"),
            }])
            .unwrap();
        store
            .save_source_selections(&[SourceSelection {
                id: id.into(),
                selected: true,
            }])
            .unwrap();
    }

    fn seed_story(store: &SqliteStore, url: &str, title: &str, source: &str) {
        store
            .save_story_bases(&[StoryBase {
                url: url.into(),
                title: title.into(),
                description: None,
                source: source.into(),
                author: None,
                thumbnail: None,
                published_at: None,
            }])
            .unwrap();
        store.save_story_extras(&[StoryExtra::new(url)]).unwrap();
    }

    fn article(url: &str, title: &str) -> ApiArticle {
        ApiArticle {
            url: url.into(),
            title: title.into(),
            description: Some("Story One".into()),
            author: Some("Author 1".into()),
            url_to_image: Some("http://image1.com".into()),
            published_at: Some("2017-08-01T12:00:00Z".parse().unwrap()),
        }
    }

    fn articles_ok(source: &str, articles: Vec<ApiArticle>) -> ArticleListResponse {
        ArticleListResponse {
            status: "ok".into(),
            source: Some(source.into()),
            articles: Some(articles),
        }
    }

    async fn next(rx: &mut mpsc::Receiver<StoryResult>) -> StoryResult {
        tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("timed out waiting for result")
            .expect("result stream ended")
    }

    #[test]
    fn transport_errors_latch_in_summary() {
        let mut summary = FetchSummary::default();
        summary.record(SyncError::Transport("refused".into()));
        summary.record(SyncError::Api);
        assert_eq!(summary.error, Some(SyncError::Transport("refused".into())));
    }

    #[test]
    fn api_errors_are_replaceable_in_summary() {
        let mut summary = FetchSummary::default();
        summary.record(SyncError::Api);
        summary.record(SyncError::Transport("refused".into()));
        assert_eq!(summary.error, Some(SyncError::Transport("refused".into())));

        let mut summary = FetchSummary::default();
        summary.record(SyncError::Api);
        summary.record(SyncError::Unknown("later".into()));
        assert_eq!(summary.error, Some(SyncError::Unknown("later".into())));
    }

    #[tokio::test]
    async fn get_emits_stored_stories() {
        let (store, _api, engine) = engine();
        select_source(&store, "s1", "Source 1");
        seed_story(&store, "http://story1.com", "Story 1", "s1");

        let (action_tx, action_rx) = mpsc::channel(4);
        let mut results = engine.observe(action_rx);
        action_tx.send(StoryAction::Get(None)).await.unwrap();

        match next(&mut results).await {
            StoryResult::Update(stories) => {
                assert_eq!(stories.len(), 1);
                assert_eq!(stories[0].url, "http://story1.com");
            }
            other => panic!("expected Update, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn get_url_scopes_to_one_story() {
        let (store, _api, engine) = engine();
        select_source(&store, "s1", "Source 1");
        seed_story(&store, "http://story1.com", "Story 1", "s1");
        seed_story(&store, "http://story2.com", "Story 2", "s1");

        let (action_tx, action_rx) = mpsc::channel(4);
        let mut results = engine.observe(action_rx);
        action_tx
            .send(StoryAction::Get(Some("http://story2.com".into())))
            .await
            .unwrap();

        match next(&mut results).await {
            StoryResult::Update(stories) => {
                assert_eq!(stories.len(), 1);
                assert_eq!(stories[0].url, "http://story2.com");
            }
            other => panic!("expected Update, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn get_scope_follows_store_changes() {
        let (store, _api, engine) = engine();
        select_source(&store, "s1", "Source 1");
        seed_story(&store, "http://story1.com", "Story 1", "s1");

        let (action_tx, action_rx) = mpsc::channel(4);
        let mut results = engine.observe(action_rx);
        action_tx.send(StoryAction::Get(None)).await.unwrap();
        assert!(matches!(next(&mut results).await, StoryResult::Update(s) if s.len() == 1));

        seed_story(&store, "http://story2.com", "Story 2", "s1");
        // Drain updates until both stories are visible; the two writes in
        // seed_story may notify once or twice.
        loop {
            match next(&mut results).await {
                StoryResult::Update(stories) if stories.len() == 2 => break,
                StoryResult::Update(_) => continue,
                other => panic!("expected Update, got {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn sync_with_no_selected_sources_is_a_noop_success() {
        let (_store, api, engine) = engine();

        let (action_tx, action_rx) = mpsc::channel(4);
        let mut results = engine.observe(action_rx);
        action_tx.send(StoryAction::Sync(None)).await.unwrap();

        assert_eq!(next(&mut results).await, StoryResult::Syncing(None));
        assert_eq!(next(&mut results).await, StoryResult::Synced(None));
        assert!(api.article_calls().is_empty());
    }

    #[tokio::test]
    async fn sync_fetches_and_persists_headlines() {
        let (store, api, engine) = engine();
        select_source(&store, "s1", "Source 1");
        api.queue_articles(Ok(articles_ok(
            "s1",
            vec![article("http://story1.com", "Story 1")],
        )));

        let (action_tx, action_rx) = mpsc::channel(4);
        let mut results = engine.observe(action_rx);
        action_tx.send(StoryAction::Sync(None)).await.unwrap();

        assert_eq!(next(&mut results).await, StoryResult::Syncing(None));
        assert_eq!(next(&mut results).await, StoryResult::Synced(None));
        assert_eq!(api.article_calls(), vec!["s1"]);

        let stories = store.all_stories().unwrap();
        assert_eq!(stories.len(), 1);
        let story = &stories[0];
        assert_eq!(story.url, "http://story1.com");
        assert_eq!(story.title, "Story 1");
        assert_eq!(story.author.as_deref(), Some("Author 1"));
        assert_eq!(story.thumbnail.as_deref(), Some("http://image1.com"));
        assert_eq!(story.source.id, "s1");
        assert!(!story.read);
        assert!(story.content.is_none());
    }

    #[tokio::test]
    async fn sync_attempts_all_sources_in_store_order() {
        let (store, api, engine) = engine();
        select_source(&store, "s1", "Alpha");
        select_source(&store, "s2", "Beta");
        api.queue_articles(Ok(articles_ok(
            "s1",
            vec![article("http://story1.com", "Story 1")],
        )));
        api.queue_articles(Ok(articles_ok(
            "s2",
            vec![article("http://story2.com", "Story 2")],
        )));

        let (action_tx, action_rx) = mpsc::channel(4);
        let mut results = engine.observe(action_rx);
        action_tx.send(StoryAction::Sync(None)).await.unwrap();

        assert_eq!(next(&mut results).await, StoryResult::Syncing(None));
        assert_eq!(next(&mut results).await, StoryResult::Synced(None));
        assert_eq!(api.article_calls(), vec!["s1", "s2"]);
        assert_eq!(store.all_stories().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn partial_failure_keeps_successful_stories() {
        let (store, api, engine) = engine();
        select_source(&store, "s1", "Alpha");
        select_source(&store, "s2", "Beta");
        api.queue_articles(Err(MockApi::transport_error("connection refused")));
        api.queue_articles(Ok(articles_ok(
            "s2",
            vec![article("http://story2.com", "Story 2")],
        )));

        let (action_tx, action_rx) = mpsc::channel(4);
        let mut results = engine.observe(action_rx);
        action_tx.send(StoryAction::Sync(None)).await.unwrap();

        assert_eq!(next(&mut results).await, StoryResult::Syncing(None));
        match next(&mut results).await {
            StoryResult::Error { url: None, error } => assert!(error.is_transport()),
            other => panic!("expected transport error, got {other:?}"),
        }
        // Both sources were attempted, and the surviving stories persisted.
        assert_eq!(api.article_calls(), vec!["s1", "s2"]);
        let stories = store.all_stories().unwrap();
        assert_eq!(stories.len(), 1);
        assert_eq!(stories[0].url, "http://story2.com");
    }

    #[tokio::test]
    async fn transport_error_takes_precedence_over_later_api_error() {
        let (store, api, engine) = engine();
        select_source(&store, "s1", "Alpha");
        select_source(&store, "s2", "Beta");
        api.queue_articles(Err(MockApi::transport_error("connection refused")));
        api.queue_articles(Ok(ArticleListResponse {
            status: "error".into(),
            source: Some("s2".into()),
            articles: None,
        }));

        let (action_tx, action_rx) = mpsc::channel(4);
        let mut results = engine.observe(action_rx);
        action_tx.send(StoryAction::Sync(None)).await.unwrap();

        assert_eq!(next(&mut results).await, StoryResult::Syncing(None));
        match next(&mut results).await {
            StoryResult::Error { url: None, error } => assert!(error.is_transport()),
            other => panic!("expected transport error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn later_transport_error_replaces_earlier_api_error() {
        let (store, api, engine) = engine();
        select_source(&store, "s1", "Alpha");
        select_source(&store, "s2", "Beta");
        api.queue_articles(Ok(ArticleListResponse {
            status: "error".into(),
            source: Some("s1".into()),
            articles: None,
        }));
        api.queue_articles(Err(MockApi::transport_error("connection refused")));

        let (action_tx, action_rx) = mpsc::channel(4);
        let mut results = engine.observe(action_rx);
        action_tx.send(StoryAction::Sync(None)).await.unwrap();

        assert_eq!(next(&mut results).await, StoryResult::Syncing(None));
        match next(&mut results).await {
            StoryResult::Error { url: None, error } => assert!(error.is_transport()),
            other => panic!("expected transport error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn extract_updates_extra_and_resolves() {
        let (store, api, engine) = engine();
        select_source(&store, "s1", "Source 1");
        seed_story(&store, "http://story1.com", "Story 1", "s1");
        // User already read the story; extraction must not clobber that.
        store
            .update_story_extra(&StoryExtra {
                url: "http://story1.com".into(),
                read: true,
                content: None,
                word_count: None,
            })
            .unwrap();
        api.queue_extract(Ok(ExtractResponse {
            url: "http://story1.com".into(),
            content: Some("<div>Content 1</div>".into()),
            word_count: Some(200),
        }));

        let (action_tx, action_rx) = mpsc::channel(4);
        let mut results = engine.observe(action_rx);
        action_tx
            .send(StoryAction::Sync(Some("http://story1.com".into())))
            .await
            .unwrap();

        assert_eq!(
            next(&mut results).await,
            StoryResult::Syncing(Some("http://story1.com".into()))
        );
        assert_eq!(
            next(&mut results).await,
            StoryResult::Synced(Some("http://story1.com".into()))
        );
        assert_eq!(api.extract_calls(), vec!["http://story1.com"]);

        let extra = store.story_extra("http://story1.com").unwrap().unwrap();
        assert!(extra.read);
        assert_eq!(extra.content.as_deref(), Some("<div>Content 1</div>"));
        assert_eq!(extra.word_count, Some(200));
    }

    #[tokio::test]
    async fn extract_failure_carries_url() {
        let (store, api, engine) = engine();
        select_source(&store, "s1", "Source 1");
        seed_story(&store, "http://story1.com", "Story 1", "s1");
        api.queue_extract(Err(MockApi::transport_error("connection refused")));

        let (action_tx, action_rx) = mpsc::channel(4);
        let mut results = engine.observe(action_rx);
        action_tx
            .send(StoryAction::Sync(Some("http://story1.com".into())))
            .await
            .unwrap();

        assert_eq!(
            next(&mut results).await,
            StoryResult::Syncing(Some("http://story1.com".into()))
        );
        match next(&mut results).await {
            StoryResult::Error { url, error } => {
                assert_eq!(url.as_deref(), Some("http://story1.com"));
                assert!(error.is_transport());
            }
            other => panic!("expected Error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn extract_for_unknown_story_resolves_with_error() {
        let (_store, api, engine) = engine();

        let (action_tx, action_rx) = mpsc::channel(4);
        let mut results = engine.observe(action_rx);
        action_tx
            .send(StoryAction::Sync(Some("http://nowhere.com".into())))
            .await
            .unwrap();

        assert_eq!(
            next(&mut results).await,
            StoryResult::Syncing(Some("http://nowhere.com".into()))
        );
        match next(&mut results).await {
            StoryResult::Error { url, error } => {
                assert_eq!(url.as_deref(), Some("http://nowhere.com"));
                assert!(matches!(error, SyncError::Unknown(_)));
            }
            other => panic!("expected Error, got {other:?}"),
        }
        assert!(api.extract_calls().is_empty());
    }
}
