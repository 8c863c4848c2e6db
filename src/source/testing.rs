use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::Item;

use super::ItemSource;

/// In-memory `ItemSource` that records what was asked of it.
#[derive(Default)]
pub struct MemorySource {
    items: HashMap<i64, Item>,
    top: Vec<i64>,
    failing: HashSet<i64>,
    top_unavailable: bool,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    requested: Mutex<Vec<i64>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_item(mut self, item: Item) -> Self {
        self.items.insert(item.id, item);
        self
    }

    pub fn with_top(mut self, ids: Vec<i64>) -> Self {
        self.top = ids;
        self
    }

    pub fn failing(mut self, id: i64) -> Self {
        self.failing.insert(id);
        self
    }

    pub fn unreachable(mut self) -> Self {
        self.top_unavailable = true;
        self
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn requested(&self) -> Vec<i64> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl ItemSource for MemorySource {
    async fn top_story_ids(&self) -> Result<Vec<i64>> {
        if self.top_unavailable {
            return Err(anyhow::anyhow!("source unreachable").into());
        }
        Ok(self.top.clone())
    }

    async fn item(&self, id: i64) -> Result<Option<Item>> {
        self.requested.lock().unwrap().push(id);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing.contains(&id) {
            return Err(anyhow::anyhow!("item {id} timed out").into());
        }
        Ok(self.items.get(&id).cloned())
    }
}

pub fn comment_item(id: i64, kids: Vec<i64>) -> Item {
    Item {
        id,
        kind: Some("comment".to_string()),
        by: Some(format!("user{id}")),
        text: Some(format!("comment {id}")),
        time: Some(1_700_000_000 + id),
        kids,
        ..Item::default()
    }
}

pub fn story_item(id: i64, score: i64, descendants: i64, time: i64) -> Item {
    Item {
        id,
        kind: Some("story".to_string()),
        title: Some(format!("Story {id}")),
        score: Some(score),
        descendants: Some(descendants),
        time: Some(time),
        by: Some("pg".to_string()),
        ..Item::default()
    }
}
