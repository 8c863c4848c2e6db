use chrono::{DateTime, Utc};
use futures::future::{join_all, BoxFuture, FutureExt};

use crate::ai::text::strip_html;
use crate::models::{FetchedComment, Item};

use super::ItemSource;

/// Deepest level fetched. The root's direct children are depth 0.
pub const MAX_DEPTH: usize = 2;
/// Top-level comments traversed per story.
pub const ROOT_FANOUT: usize = 20;
/// Replies traversed per comment below the top level.
pub const CHILD_FANOUT: usize = 5;

const UNKNOWN_AUTHOR: &str = "unknown";

/// Fetch the bounded comment forest under `root`.
///
/// Siblings are fetched concurrently and every branch returns its own list,
/// so the result order depends on nothing but the tree shape. The result is
/// breadth-first: all top-level comments come first in the root's order, then
/// their replies, then the replies to those. Deleted or dead comments, and
/// comments whose fetch fails, are dropped together with their replies.
pub async fn fetch_comment_tree<S>(source: &S, root: &Item) -> Vec<FetchedComment>
where
    S: ItemSource + ?Sized,
{
    let branches = root
        .kids
        .iter()
        .take(ROOT_FANOUT)
        .map(|&id| fetch_branch(source, id, 0, None));

    let mut found: Vec<(usize, FetchedComment)> =
        join_all(branches).await.into_iter().flatten().collect();
    // Stable, so siblings keep their order within each level
    found.sort_by_key(|(depth, _)| *depth);
    found.into_iter().map(|(_, comment)| comment).collect()
}

fn fetch_branch<'a, S>(
    source: &'a S,
    id: i64,
    depth: usize,
    parent_id: Option<i64>,
) -> BoxFuture<'a, Vec<(usize, FetchedComment)>>
where
    S: ItemSource + ?Sized,
{
    async move {
        let Some(item) = source.item_or_none(id).await else {
            return Vec::new();
        };
        if item.is_gone() {
            return Vec::new();
        }

        let mut found = vec![(depth, to_fetched(&item, parent_id))];

        if depth < MAX_DEPTH {
            let replies = item
                .kids
                .iter()
                .take(CHILD_FANOUT)
                .map(|&kid| fetch_branch(source, kid, depth + 1, Some(item.id)));
            for branch in join_all(replies).await {
                found.extend(branch);
            }
        }

        found
    }
    .boxed()
}

fn to_fetched(item: &Item, parent_id: Option<i64>) -> FetchedComment {
    FetchedComment {
        remote_comment_id: item.id,
        parent_id,
        author: item
            .by
            .clone()
            .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string()),
        content: item.text.as_deref().map(strip_html).unwrap_or_default(),
        created_at: item
            .time
            .and_then(|secs| secs.checked_mul(1000))
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .unwrap_or_default(),
    }
}
