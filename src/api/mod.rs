//! The remote content API boundary.
//!
//! Two hosts hide behind one trait: a NewsAPI-style service for source and
//! article listings, and a Mercury-style parser for full-content extraction.
//! Both report application-level failures in-band (`status` plus a nullable
//! payload), so the trait only errors on transport-class problems.

pub mod http;
#[cfg(test)]
pub mod mock;

pub use http::HttpRemoteApi;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::app::Result;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SourceListResponse {
    pub status: String,
    pub sources: Option<Vec<ApiSource>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ApiSource {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub url: String,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ArticleListResponse {
    pub status: String,
    #[serde(default)]
    pub source: Option<String>,
    pub articles: Option<Vec<ApiArticle>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiArticle {
    pub url: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub url_to_image: Option<String>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractResponse {
    pub url: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub word_count: Option<i64>,
}

#[async_trait]
pub trait RemoteApi: Send + Sync {
    /// List all available sources.
    async fn list_sources(&self) -> Result<SourceListResponse>;

    /// List current articles for one source.
    async fn list_articles(&self, source_id: &str) -> Result<ArticleListResponse>;

    /// Extract readable content for a single story URL.
    async fn extract_content(&self, url: &str) -> Result<ExtractResponse>;
}
