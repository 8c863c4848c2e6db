use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use reqwest::Client;

use crate::error::Result;
use crate::models::Item;

const HN_API_URL: &str = "https://hacker-news.firebaseio.com/v0";

/// Read access to the remote forum.
#[async_trait]
pub trait ItemSource: Send + Sync {
    async fn top_story_ids(&self) -> Result<Vec<i64>>;

    /// `Ok(None)` when the remote has no such item.
    async fn item(&self, id: i64) -> Result<Option<Item>>;

    /// Fetch every id concurrently. Failed or missing items are dropped; the
    /// result keeps the order of `ids`.
    async fn items(&self, ids: &[i64]) -> Vec<Item> {
        let results = join_all(ids.iter().map(|&id| self.item_or_none(id))).await;
        results.into_iter().flatten().collect()
    }

    /// `item` with failures logged and folded into `None`.
    async fn item_or_none(&self, id: i64) -> Option<Item> {
        match self.item(id).await {
            Ok(item) => item,
            Err(e) => {
                tracing::debug!("Failed to fetch item {}: {}", id, e);
                None
            }
        }
    }
}

pub struct HnClient {
    client: Client,
    base_url: String,
}

impl HnClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        Self::with_base_url(HN_API_URL, timeout)
    }

    pub fn with_base_url(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .user_agent("hn-digest/1.0")
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_id_list(&self, path: &str) -> Result<Vec<i64>> {
        let response = self
            .client
            .get(format!("{}/{}", self.base_url, path))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow::anyhow!("Failed to fetch {}: HTTP {}", path, response.status()).into());
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl ItemSource for HnClient {
    async fn top_story_ids(&self) -> Result<Vec<i64>> {
        self.get_id_list("topstories.json").await
    }

    async fn item(&self, id: i64) -> Result<Option<Item>> {
        let response = self
            .client
            .get(format!("{}/item/{}.json", self.base_url, id))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow::anyhow!("Failed to fetch item {}: HTTP {}", id, response.status()).into());
        }

        // The API answers `null` for ids it does not know.
        let item: Option<Item> = response.json().await?;
        Ok(item)
    }
}
