use std::collections::HashMap;

use serde::Serialize;

use crate::models::Comment;

/// A comment with its replies, built for display only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommentNode {
    #[serde(flatten)]
    pub comment: Comment,
    pub children: Vec<CommentNode>,
}

/// Rebuild the reply forest from a flat comment list.
///
/// Roots and children keep their input order. A comment whose parent is not
/// in `comments` becomes a root instead of being dropped, and so does any
/// comment whose parent link would close a cycle.
pub fn build_comment_forest(comments: &[Comment]) -> Vec<CommentNode> {
    let index: HashMap<i64, usize> = comments
        .iter()
        .enumerate()
        .map(|(i, c)| (c.remote_comment_id, i))
        .collect();

    let mut parent_of: Vec<Option<usize>> = vec![None; comments.len()];
    for (i, comment) in comments.iter().enumerate() {
        let parent = comment.parent_id.and_then(|id| index.get(&id).copied());
        if let Some(parent) = parent {
            if !reaches(&parent_of, parent, i) {
                parent_of[i] = Some(parent);
            }
        }
    }

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); comments.len()];
    let mut roots = Vec::new();
    for (i, parent) in parent_of.iter().enumerate() {
        match parent {
            Some(parent) => children[*parent].push(i),
            None => roots.push(i),
        }
    }

    roots
        .into_iter()
        .map(|i| assemble(i, comments, &children))
        .collect()
}

/// Depth-first walk of the forest in display order.
pub fn flatten_with_depth(forest: &[CommentNode]) -> Vec<(usize, &Comment)> {
    fn walk<'a>(nodes: &'a [CommentNode], depth: usize, out: &mut Vec<(usize, &'a Comment)>) {
        for node in nodes {
            out.push((depth, &node.comment));
            walk(&node.children, depth + 1, out);
        }
    }

    let mut out = Vec::new();
    walk(forest, 0, &mut out);
    out
}

/// Whether following accepted parent links upward from `from` hits `target`.
fn reaches(parent_of: &[Option<usize>], mut from: usize, target: usize) -> bool {
    loop {
        if from == target {
            return true;
        }
        match parent_of[from] {
            Some(next) => from = next,
            None => return false,
        }
    }
}

fn assemble(i: usize, comments: &[Comment], children: &[Vec<usize>]) -> CommentNode {
    CommentNode {
        comment: comments[i].clone(),
        children: children[i]
            .iter()
            .map(|&child| assemble(child, comments, children))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn comment(remote_comment_id: i64, parent_id: Option<i64>) -> Comment {
        Comment {
            id: remote_comment_id,
            story_ref: 1,
            remote_comment_id,
            parent_id,
            author: "a".to_string(),
            body_text: format!("c{remote_comment_id}"),
            translated_body: None,
            created_at: Utc::now(),
        }
    }

    fn shape(nodes: &[CommentNode]) -> Vec<(i64, Vec<i64>)> {
        nodes
            .iter()
            .map(|n| {
                (
                    n.comment.remote_comment_id,
                    n.children.iter().map(|c| c.comment.remote_comment_id).collect(),
                )
            })
            .collect()
    }

    #[test]
    fn nests_replies_in_input_order() {
        let comments = vec![
            comment(3, Some(1)),
            comment(1, None),
            comment(2, None),
            comment(4, Some(1)),
            comment(5, Some(3)),
        ];
        let forest = build_comment_forest(&comments);

        assert_eq!(shape(&forest), vec![(1, vec![3, 4]), (2, vec![])]);
        assert_eq!(shape(&forest[0].children), vec![(3, vec![5]), (4, vec![])]);
    }

    #[test]
    fn orphan_is_promoted_to_root() {
        let comments = vec![comment(1, None), comment(2, Some(999))];
        let forest = build_comment_forest(&comments);
        assert_eq!(shape(&forest), vec![(1, vec![]), (2, vec![])]);
    }

    #[test]
    fn self_references_and_cycles_never_lose_comments() {
        let comments = vec![comment(1, Some(1)), comment(2, Some(3)), comment(3, Some(2))];
        let forest = build_comment_forest(&comments);

        assert_eq!(flatten_with_depth(&forest).len(), 3);
        assert_eq!(shape(&forest), vec![(1, vec![]), (3, vec![2])]);
    }

    #[test]
    fn flatten_reports_depth() {
        let comments = vec![comment(1, None), comment(2, Some(1)), comment(3, Some(2)), comment(4, None)];
        let forest = build_comment_forest(&comments);
        let flat: Vec<(usize, i64)> = flatten_with_depth(&forest)
            .into_iter()
            .map(|(d, c)| (d, c.remote_comment_id))
            .collect();
        assert_eq!(flat, vec![(0, 1), (1, 2), (2, 3), (0, 4)]);
    }

    #[test]
    fn empty_input_gives_empty_forest() {
        assert!(build_comment_forest(&[]).is_empty());
    }
}
