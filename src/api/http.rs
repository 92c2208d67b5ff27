use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::api::{ArticleListResponse, ExtractResponse, RemoteApi, SourceListResponse};
use crate::app::Result;
use crate::config::ApiConfig;

pub struct HttpRemoteApi {
    client: Client,
    config: ApiConfig,
}

impl HttpRemoteApi {
    pub fn new(config: ApiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .gzip(true)
            .brotli(true)
            .user_agent("newsflow/0.1.0")
            .build()?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl RemoteApi for HttpRemoteApi {
    async fn list_sources(&self) -> Result<SourceListResponse> {
        let url = format!("{}/v1/sources", self.config.news_base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await?
            .json::<SourceListResponse>()
            .await?;
        Ok(response)
    }

    async fn list_articles(&self, source_id: &str) -> Result<ArticleListResponse> {
        let url = format!("{}/v1/articles", self.config.news_base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("source", source_id),
                ("apiKey", self.config.news_api_key.as_str()),
            ])
            .send()
            .await?
            .json::<ArticleListResponse>()
            .await?;
        Ok(response)
    }

    async fn extract_content(&self, url: &str) -> Result<ExtractResponse> {
        let endpoint = format!("{}/parser", self.config.parser_base_url);
        let response = self
            .client
            .get(&endpoint)
            .query(&[("url", url)])
            .header("api-key", &self.config.parser_api_key)
            .send()
            .await?
            .json::<ExtractResponse>()
            .await?;
        Ok(response)
    }
}
