//! Queue-driven [`RemoteApi`] double for engine and reducer tests.
//!
//! Each endpoint pops the next queued response in FIFO order and records the
//! call, so tests can script per-call outcomes and assert how often the
//! network was hit.

use std::collections::VecDeque;
use std::io;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::api::{ArticleListResponse, ExtractResponse, RemoteApi, SourceListResponse};
use crate::app::{NewsflowError, Result};

#[derive(Default)]
pub struct MockApi {
    hang_when_empty: std::sync::atomic::AtomicBool,
    source_responses: Mutex<VecDeque<Result<SourceListResponse>>>,
    article_responses: Mutex<VecDeque<Result<ArticleListResponse>>>,
    extract_responses: Mutex<VecDeque<Result<ExtractResponse>>>,
    source_calls: Mutex<usize>,
    article_calls: Mutex<Vec<String>>,
    extract_calls: Mutex<Vec<String>>,
}

impl MockApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_sources(&self, response: Result<SourceListResponse>) {
        self.source_responses.lock().unwrap().push_back(response);
    }

    pub fn queue_articles(&self, response: Result<ArticleListResponse>) {
        self.article_responses.lock().unwrap().push_back(response);
    }

    pub fn queue_extract(&self, response: Result<ExtractResponse>) {
        self.extract_responses.lock().unwrap().push_back(response);
    }

    pub fn source_calls(&self) -> usize {
        *self.source_calls.lock().unwrap()
    }

    /// Source ids passed to `list_articles`, in call order.
    pub fn article_calls(&self) -> Vec<String> {
        self.article_calls.lock().unwrap().clone()
    }

    pub fn extract_calls(&self) -> Vec<String> {
        self.extract_calls.lock().unwrap().clone()
    }

    /// A connectivity-class failure, mapping to a transport sync error.
    pub fn transport_error(message: &str) -> NewsflowError {
        NewsflowError::Io(io::Error::new(io::ErrorKind::ConnectionRefused, message.to_string()))
    }

    /// With an empty queue, park calls forever instead of failing them.
    /// Lets tests freeze a pipeline mid-sync.
    pub fn hang_when_empty(&self) {
        self.hang_when_empty
            .store(true, std::sync::atomic::Ordering::SeqCst);
    }

    fn hangs(&self) -> bool {
        self.hang_when_empty
            .load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteApi for MockApi {
    async fn list_sources(&self) -> Result<SourceListResponse> {
        *self.source_calls.lock().unwrap() += 1;
        let queued = self.source_responses.lock().unwrap().pop_front();
        match queued {
            Some(response) => response,
            None if self.hangs() => std::future::pending().await,
            None => Err(NewsflowError::Other("no queued source response".into())),
        }
    }

    async fn list_articles(&self, source_id: &str) -> Result<ArticleListResponse> {
        self.article_calls.lock().unwrap().push(source_id.to_string());
        self.article_responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(NewsflowError::Other("no queued article response".into())))
    }

    async fn extract_content(&self, url: &str) -> Result<ExtractResponse> {
        self.extract_calls.lock().unwrap().push(url.to_string());
        self.extract_responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(NewsflowError::Other("no queued extract response".into())))
    }
}
