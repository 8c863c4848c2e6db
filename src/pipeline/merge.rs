use std::collections::HashSet;

use crate::models::RankedStory;

/// Concatenate ranked lists and keep the first copy of each `remote_id`.
/// Pass the list whose metrics should win first.
pub fn merge_ranked<I>(lists: I) -> Vec<RankedStory>
where
    I: IntoIterator<Item = Vec<RankedStory>>,
{
    let mut seen = HashSet::new();
    lists
        .into_iter()
        .flatten()
        .filter(|story| seen.insert(story.remote_id))
        .collect()
}
