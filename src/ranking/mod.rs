use chrono::{DateTime, Utc};

use crate::ai::text::strip_html;
use crate::error::Result;
use crate::models::{Item, RankedStory, SortMode};
use crate::source::ItemSource;

/// Front-page stories considered before ranking.
pub const CANDIDATE_POOL: usize = 100;

const GRAVITY: f64 = 1.8;
const FRESH_WINDOW_HOURS: f64 = 24.0;
const FRESH_BOOST: f64 = 0.2;

/// Time-decayed popularity of a story.
pub fn heat(score: i64, descendants: i64, age_hours: f64) -> f64 {
    let decay = (age_hours + 2.0).powf(GRAVITY);
    (score - 1) as f64 / decay + 0.5 * descendants as f64 / decay
}

/// The value stories are ordered by: the chosen metric, raised by 20% for
/// stories younger than a day.
pub fn sort_key(mode: SortMode, score: i64, descendants: i64, age_hours: f64) -> f64 {
    let base = match mode {
        SortMode::ByPoints => score as f64,
        SortMode::ByComments => descendants as f64,
    };

    if age_hours < FRESH_WINDOW_HOURS {
        base + base * FRESH_BOOST
    } else {
        base
    }
}

/// Rank `candidates` under `mode` and keep the best `limit`.
///
/// Only stories with at least one comment and a timestamp are ranked. The
/// sort is stable, so equal keys keep their input order.
pub fn rank(candidates: &[Item], mode: SortMode, limit: usize, now_seconds: i64) -> Vec<RankedStory> {
    let mut keyed: Vec<(RankedStory, f64)> = candidates
        .iter()
        .filter(|item| item.is_story() && item.descendants.unwrap_or(0) > 0)
        .filter_map(|item| {
            let story = to_ranked(item, now_seconds)?;
            let key = sort_key(mode, story.score, story.comment_count, story.age_hours);
            Some((story, key))
        })
        .collect();

    keyed.sort_by(|a, b| b.1.total_cmp(&a.1));
    keyed.truncate(limit);
    keyed.into_iter().map(|(story, _)| story).collect()
}

/// The first `CANDIDATE_POOL` front-page stories. Fails only when the story
/// list itself cannot be loaded; individual items that fail are skipped.
pub async fn fetch_candidates<S>(source: &S) -> Result<Vec<Item>>
where
    S: ItemSource + ?Sized,
{
    let ids = source.top_story_ids().await?;
    if ids.is_empty() {
        tracing::warn!("Remote returned no story ids");
        return Ok(Vec::new());
    }

    let pool = &ids[..ids.len().min(CANDIDATE_POOL)];
    let items = source.items(pool).await;
    tracing::info!("Fetched {} of {} candidate stories", items.len(), pool.len());
    Ok(items)
}

fn to_ranked(item: &Item, now_seconds: i64) -> Option<RankedStory> {
    let time = item.time?;
    let created_at = DateTime::<Utc>::from_timestamp(time, 0)?;
    let age_hours = (now_seconds - time) as f64 / 3600.0;
    let score = item.score.unwrap_or(0);
    let comment_count = item.descendants.unwrap_or(0);

    Some(RankedStory {
        remote_id: item.id,
        title: item.title.clone().unwrap_or_else(|| "No title".to_string()),
        url: item
            .url
            .clone()
            .unwrap_or_else(|| Item::discussion_url(item.id)),
        body_text: item
            .text
            .as_deref()
            .map(strip_html)
            .filter(|text| !text.is_empty()),
        score,
        comment_count,
        author: item.by.clone().unwrap_or_else(|| "unknown".to_string()),
        created_at,
        age_hours,
        heat: heat(score, comment_count, age_hours),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::testing::{comment_item, story_item, MemorySource};

    const NOW: i64 = 1_750_000_000;
    const HOUR: i64 = 3600;

    fn aged(id: i64, score: i64, descendants: i64, hours: i64) -> Item {
        story_item(id, score, descendants, NOW - hours * HOUR)
    }

    fn ids(stories: &[RankedStory]) -> Vec<i64> {
        stories.iter().map(|s| s.remote_id).collect()
    }

    #[test]
    fn fresh_story_boost_changes_order() {
        let candidates = vec![aged(1, 115, 10, 30), aged(2, 100, 10, 23)];
        let ranked = rank(&candidates, SortMode::ByPoints, 10, NOW);
        assert_eq!(ids(&ranked), vec![2, 1]);

        let both_old = vec![aged(1, 115, 10, 30), aged(2, 100, 10, 25)];
        assert_eq!(ids(&rank(&both_old, SortMode::ByPoints, 10, NOW)), vec![1, 2]);
    }

    #[test]
    fn comment_mode_boosts_descendants() {
        let candidates = vec![aged(1, 900, 115, 48), aged(2, 5, 100, 2), aged(3, 50, 200, 72)];
        let ranked = rank(&candidates, SortMode::ByComments, 10, NOW);
        assert_eq!(ids(&ranked), vec![3, 2, 1]);
    }

    #[test]
    fn equal_keys_keep_input_order() {
        let a = aged(1, 80, 10, 30);
        let b = aged(2, 80, 10, 40);
        let ranked = rank(&[a.clone(), b.clone()], SortMode::ByPoints, 10, NOW);
        assert_eq!(ids(&ranked), vec![1, 2]);
        let ranked = rank(&[b, a], SortMode::ByPoints, 10, NOW);
        assert_eq!(ids(&ranked), vec![2, 1]);
    }

    #[test]
    fn ranking_is_repeatable() {
        let candidates: Vec<Item> = (1..=30)
            .map(|i| aged(i, (i * 37) % 11 * 10, (i * 13) % 7 + 1, i % 48))
            .collect();
        for mode in [SortMode::ByPoints, SortMode::ByComments] {
            assert_eq!(rank(&candidates, mode, 20, NOW), rank(&candidates, mode, 20, NOW));
        }
    }

    #[test]
    fn filters_non_stories_and_silent_threads() {
        let mut job = aged(3, 500, 9, 1);
        job.kind = Some("job".to_string());
        let mut untimed = aged(4, 500, 9, 1);
        untimed.time = None;
        let candidates = vec![aged(1, 10, 0, 1), aged(2, 10, 3, 1), job, untimed, comment_item(5, vec![])];

        let ranked = rank(&candidates, SortMode::ByPoints, 10, NOW);
        assert_eq!(ids(&ranked), vec![2]);
        assert!(rank(&[], SortMode::ByComments, 10, NOW).is_empty());
    }

    #[test]
    fn truncates_and_fills_defaults() {
        let mut bare = aged(9, 300, 40, 3);
        bare.title = None;
        bare.by = None;
        bare.text = Some("<p>Hello &amp; welcome</p>".to_string());
        let candidates = vec![bare, aged(1, 10, 1, 3), aged(2, 20, 1, 3)];

        let ranked = rank(&candidates, SortMode::ByPoints, 2, NOW);
        assert_eq!(ids(&ranked), vec![9, 2]);
        let top = &ranked[0];
        assert_eq!(top.title, "No title");
        assert_eq!(top.author, "unknown");
        assert_eq!(top.url, "https://news.ycombinator.com/item?id=9");
        assert_eq!(top.body_text.as_deref(), Some("Hello & welcome"));
        assert!((top.age_hours - 3.0).abs() < 1e-9);
    }

    #[test]
    fn heat_decays_with_age() {
        let expected = 99.0 / 4f64.powf(1.8) + 0.5 * 20.0 / 4f64.powf(1.8);
        assert!((heat(100, 20, 2.0) - expected).abs() < 1e-9);
        assert!(heat(100, 20, 2.0) > heat(100, 20, 20.0));
    }

    #[tokio::test]
    async fn candidates_come_from_the_front_page() {
        let source = MemorySource::new()
            .with_top(vec![1, 2, 3])
            .with_item(aged(1, 10, 1, 1))
            .with_item(aged(3, 10, 1, 1))
            .failing(2);
        let items = fetch_candidates(&source).await.unwrap();
        let ids: Vec<i64> = items.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![1, 3]);

        assert!(fetch_candidates(&MemorySource::new().unreachable()).await.is_err());
    }
}
