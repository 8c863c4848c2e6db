use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};
use tokio_rusqlite::Connection;

use crate::error::Result;
use crate::models::{Comment, NewComment, NewStory, SortMode, Stats, Story};

use super::schema::SCHEMA;

const STORY_COLUMNS: &str = "id, remote_id, title, translated_title, url, body_text, translated_body, \
     abstract, score, comment_count, author, created_at, fetched_at, abstract_source";

const COMMENT_COLUMNS: &str =
    "id, story_id, remote_comment_id, parent_id, author, body_text, translated_body, created_at";

/// Rows removed by a retention sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PurgeCounts {
    pub stories: usize,
    pub comments: usize,
}

pub struct Repository {
    conn: Connection,
}

impl Repository {
    pub async fn new(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path).await?;

        conn.call(|conn| {
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await?;

        Ok(Self { conn })
    }

    // Story operations

    /// Insert a story or refresh the mutable fields of the row holding the
    /// same `remote_id`. Returns the local id either way.
    pub async fn upsert_story(&self, story: NewStory) -> Result<i64> {
        let id = self
            .conn
            .call(move |conn| {
                let id = conn.query_row(
                    r#"INSERT INTO stories (remote_id, title, translated_title, url, body_text, translated_body,
                                            abstract, score, comment_count, author, created_at, fetched_at)
                       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                       ON CONFLICT(remote_id) DO UPDATE SET
                           title = excluded.title,
                           translated_title = excluded.translated_title,
                           body_text = excluded.body_text,
                           translated_body = excluded.translated_body,
                           abstract = COALESCE(excluded.abstract, stories.abstract),
                           score = excluded.score,
                           comment_count = excluded.comment_count,
                           fetched_at = excluded.fetched_at
                       RETURNING id"#,
                    params![
                        story.remote_id,
                        story.title,
                        story.translated_title,
                        story.url,
                        story.body_text,
                        story.translated_body,
                        story.abstract_text,
                        story.score,
                        story.comment_count,
                        story.author,
                        story.created_at.timestamp_millis(),
                        story.fetched_at.timestamp_millis(),
                    ],
                    |row| row.get::<_, i64>(0),
                )?;
                Ok(id)
            })
            .await?;
        Ok(id)
    }

    /// Most recently refreshed stories first, then by the chosen metric.
    pub async fn get_stories_ranked(&self, limit: usize, mode: SortMode) -> Result<Vec<Story>> {
        let order = match mode {
            SortMode::ByComments => "fetched_at DESC, comment_count DESC",
            SortMode::ByPoints => "fetched_at DESC, score DESC",
        };
        let sql = format!("SELECT {STORY_COLUMNS} FROM stories ORDER BY {order} LIMIT ?1");
        let limit = limit as i64;

        let stories = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&sql)?;
                let stories = stmt
                    .query_map(params![limit], story_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(stories)
            })
            .await?;
        Ok(stories)
    }

    /// Stories refreshed within `[start, end]`, busiest threads first.
    pub async fn get_stories_by_date_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Story>> {
        let sql = format!(
            "SELECT {STORY_COLUMNS} FROM stories WHERE fetched_at >= ?1 AND fetched_at <= ?2 \
             ORDER BY comment_count DESC LIMIT ?3"
        );
        let (start, end, limit) = (start.timestamp_millis(), end.timestamp_millis(), limit as i64);

        let stories = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&sql)?;
                let stories = stmt
                    .query_map(params![start, end, limit], story_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(stories)
            })
            .await?;
        Ok(stories)
    }

    pub async fn search_stories_by_title(&self, needle: &str, limit: usize) -> Result<Vec<Story>> {
        let sql = format!(
            "SELECT {STORY_COLUMNS} FROM stories WHERE title LIKE ?1 ESCAPE '\\' \
             ORDER BY fetched_at DESC, comment_count DESC LIMIT ?2"
        );
        let pattern = format!("%{}%", escape_like(needle));
        let limit = limit as i64;

        let stories = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&sql)?;
                let stories = stmt
                    .query_map(params![pattern, limit], story_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(stories)
            })
            .await?;
        Ok(stories)
    }

    pub async fn get_story_by_id(&self, id: i64) -> Result<Option<Story>> {
        let sql = format!("SELECT {STORY_COLUMNS} FROM stories WHERE id = ?1");
        let story = self
            .conn
            .call(move |conn| {
                let story = conn
                    .query_row(&sql, params![id], story_from_row)
                    .optional()?;
                Ok(story)
            })
            .await?;
        Ok(story)
    }

    pub async fn get_story_by_remote_id(&self, remote_id: i64) -> Result<Option<Story>> {
        let sql = format!("SELECT {STORY_COLUMNS} FROM stories WHERE remote_id = ?1");
        let story = self
            .conn
            .call(move |conn| {
                let story = conn
                    .query_row(&sql, params![remote_id], story_from_row)
                    .optional()?;
                Ok(story)
            })
            .await?;
        Ok(story)
    }

    /// Replace the abstract, recording which step produced it.
    pub async fn update_story_abstract(&self, id: i64, text: String, source: &'static str) -> Result<()> {
        self.conn
            .call(move |conn| {
                conn.execute(
                    "UPDATE stories SET abstract = ?1, abstract_source = ?2 WHERE id = ?3",
                    params![text, source, id],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    // Comment operations

    /// Returns `false` when a comment with the same remote id is already stored.
    pub async fn insert_comment(&self, comment: NewComment) -> Result<bool> {
        let inserted = self
            .conn
            .call(move |conn| {
                let changed = conn.execute(
                    r#"INSERT INTO comments (story_id, remote_comment_id, parent_id, author, body_text,
                                             translated_body, created_at)
                       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                       ON CONFLICT(remote_comment_id) DO NOTHING"#,
                    params![
                        comment.story_ref,
                        comment.remote_comment_id,
                        comment.parent_id,
                        comment.author,
                        comment.body_text,
                        comment.translated_body,
                        comment.created_at.timestamp_millis(),
                    ],
                )?;
                Ok(changed > 0)
            })
            .await?;
        Ok(inserted)
    }

    pub async fn get_comments_by_story_id(&self, story_id: i64) -> Result<Vec<Comment>> {
        let sql = format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE story_id = ?1 ORDER BY created_at DESC"
        );
        let comments = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&sql)?;
                let comments = stmt
                    .query_map(params![story_id], comment_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(comments)
            })
            .await?;
        Ok(comments)
    }

    // Maintenance

    /// Purge stories last refreshed before `cutoff`. Their comments go first,
    /// inside the same transaction.
    pub async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<PurgeCounts> {
        let cutoff = cutoff.timestamp_millis();
        let counts = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                let comments = tx.execute(
                    "DELETE FROM comments WHERE story_id IN (SELECT id FROM stories WHERE fetched_at < ?1)",
                    params![cutoff],
                )?;
                let stories = tx.execute("DELETE FROM stories WHERE fetched_at < ?1", params![cutoff])?;
                tx.commit()?;
                Ok(PurgeCounts { stories, comments })
            })
            .await?;
        Ok(counts)
    }

    pub async fn get_stats(&self) -> Result<Stats> {
        let stats = self
            .conn
            .call(|conn| {
                let stats = conn.query_row(
                    "SELECT COUNT(*), COALESCE(SUM(comment_count), 0), COALESCE(SUM(score), 0) FROM stories",
                    [],
                    |row| {
                        Ok(Stats {
                            story_count: row.get(0)?,
                            total_comments: row.get(1)?,
                            total_points: row.get(2)?,
                        })
                    },
                )?;
                Ok(stats)
            })
            .await?;
        Ok(stats)
    }

    /// Timestamp of the most recent refresh, if anything is stored.
    pub async fn last_update(&self) -> Result<Option<DateTime<Utc>>> {
        let millis = self
            .conn
            .call(|conn| {
                let millis: Option<i64> =
                    conn.query_row("SELECT MAX(fetched_at) FROM stories", [], |row| row.get(0))?;
                Ok(millis)
            })
            .await?;
        Ok(millis.map(from_millis))
    }
}

/// Make `%`, `_` and `\` match literally in a `LIKE ... ESCAPE '\'` pattern.
fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn from_millis(millis: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(millis).unwrap_or_default()
}

fn story_from_row(row: &Row) -> rusqlite::Result<Story> {
    Ok(Story {
        id: row.get(0)?,
        remote_id: row.get(1)?,
        title: row.get(2)?,
        translated_title: row.get(3)?,
        url: row.get(4)?,
        body_text: row.get(5)?,
        translated_body: row.get(6)?,
        abstract_text: row.get(7)?,
        score: row.get(8)?,
        comment_count: row.get(9)?,
        author: row.get(10)?,
        created_at: from_millis(row.get(11)?),
        fetched_at: from_millis(row.get(12)?),
        abstract_source: row.get(13)?,
    })
}

fn comment_from_row(row: &Row) -> rusqlite::Result<Comment> {
    Ok(Comment {
        id: row.get(0)?,
        story_ref: row.get(1)?,
        remote_comment_id: row.get(2)?,
        parent_id: row.get(3)?,
        author: row.get(4)?,
        body_text: row.get(5)?,
        translated_body: row.get(6)?,
        created_at: from_millis(row.get(7)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use tempfile::TempDir;

    async fn open_repo() -> (TempDir, Repository) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stories.db");
        let repo = Repository::new(path.to_str().unwrap()).await.unwrap();
        (dir, repo)
    }

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, hour, 0, 0).unwrap()
    }

    fn story(remote_id: i64, score: i64, comments: i64, fetched_at: DateTime<Utc>) -> NewStory {
        NewStory {
            remote_id,
            title: format!("Story {remote_id}"),
            translated_title: None,
            url: format!("https://example.com/{remote_id}"),
            body_text: None,
            translated_body: None,
            abstract_text: None,
            score,
            comment_count: comments,
            author: "pg".to_string(),
            created_at: at(0),
            fetched_at,
        }
    }

    fn comment(story_ref: i64, remote_comment_id: i64, parent_id: Option<i64>) -> NewComment {
        NewComment {
            story_ref,
            remote_comment_id,
            parent_id,
            author: "tptacek".to_string(),
            body_text: format!("comment {remote_comment_id}"),
            translated_body: None,
            created_at: at(1),
        }
    }

    #[tokio::test]
    async fn upsert_updates_in_place() {
        let (_dir, repo) = open_repo().await;

        let first_id = repo.upsert_story(story(42, 10, 3, at(2))).await.unwrap();
        let mut refreshed = story(42, 99, 7, at(5));
        refreshed.created_at = at(4);
        let second_id = repo.upsert_story(refreshed).await.unwrap();

        assert_eq!(first_id, second_id);
        let stats = repo.get_stats().await.unwrap();
        assert_eq!(stats.story_count, 1);

        let stored = repo.get_story_by_remote_id(42).await.unwrap().unwrap();
        assert_eq!(stored.score, 99);
        assert_eq!(stored.comment_count, 7);
        assert_eq!(stored.fetched_at, at(5));
        assert_eq!(stored.created_at, at(0));
    }

    #[tokio::test]
    async fn upsert_keeps_existing_abstract_when_new_one_is_missing() {
        let (_dir, repo) = open_repo().await;

        let id = repo.upsert_story(story(7, 1, 1, at(1))).await.unwrap();
        repo.update_story_abstract(id, "summary".to_string(), "backend").await.unwrap();
        repo.upsert_story(story(7, 2, 1, at(2))).await.unwrap();

        let stored = repo.get_story_by_id(id).await.unwrap().unwrap();
        assert_eq!(stored.abstract_text.as_deref(), Some("summary"));
        assert_eq!(stored.abstract_source.as_deref(), Some("backend"));
        assert_eq!(stored.score, 2);
    }

    #[tokio::test]
    async fn duplicate_comment_is_ignored() {
        let (_dir, repo) = open_repo().await;
        let story_id = repo.upsert_story(story(1, 1, 1, at(1))).await.unwrap();

        assert!(repo.insert_comment(comment(story_id, 100, None)).await.unwrap());
        let mut again = comment(story_id, 100, None);
        again.body_text = "different".to_string();
        assert!(!repo.insert_comment(again).await.unwrap());

        let comments = repo.get_comments_by_story_id(story_id).await.unwrap();
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].body_text, "comment 100");
    }

    #[tokio::test]
    async fn ranked_read_orders_by_fetch_time_then_metric() {
        let (_dir, repo) = open_repo().await;
        repo.upsert_story(story(1, 50, 5, at(3))).await.unwrap();
        repo.upsert_story(story(2, 10, 90, at(3))).await.unwrap();
        repo.upsert_story(story(3, 500, 500, at(1))).await.unwrap();

        let by_comments = repo.get_stories_ranked(10, SortMode::ByComments).await.unwrap();
        let ids: Vec<i64> = by_comments.iter().map(|s| s.remote_id).collect();
        assert_eq!(ids, vec![2, 1, 3]);

        let by_points = repo.get_stories_ranked(2, SortMode::ByPoints).await.unwrap();
        let ids: Vec<i64> = by_points.iter().map(|s| s.remote_id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[tokio::test]
    async fn date_range_and_title_search() {
        let (_dir, repo) = open_repo().await;
        let mut rust = story(1, 5, 5, at(2));
        rust.title = "Show HN: A Rust database".to_string();
        repo.upsert_story(rust).await.unwrap();
        repo.upsert_story(story(2, 5, 50, at(10))).await.unwrap();

        let in_range = repo.get_stories_by_date_range(at(0), at(5), 10).await.unwrap();
        assert_eq!(in_range.len(), 1);
        assert_eq!(in_range[0].remote_id, 1);

        let found = repo.search_stories_by_title("rust", 10).await.unwrap();
        assert_eq!(found.len(), 1);
        assert!(repo.search_stories_by_title("golang", 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn title_search_treats_wildcards_literally() {
        let (_dir, repo) = open_repo().await;
        for (id, title) in [(1, "100% uptime"), (2, "1000 users"), (3, "snake_case"), (4, "snakeycase")] {
            let mut s = story(id, 1, 1, at(1));
            s.title = title.to_string();
            repo.upsert_story(s).await.unwrap();
        }

        let ids = |found: Vec<Story>| found.iter().map(|s| s.remote_id).collect::<Vec<_>>();
        assert_eq!(ids(repo.search_stories_by_title("100%", 10).await.unwrap()), vec![1]);
        assert_eq!(ids(repo.search_stories_by_title("e_c", 10).await.unwrap()), vec![3]);
        assert_eq!(ids(repo.search_stories_by_title("100", 10).await.unwrap()).len(), 2);
    }

    #[tokio::test]
    async fn purge_removes_comments_with_their_stories() {
        let (_dir, repo) = open_repo().await;
        let old = repo.upsert_story(story(1, 1, 2, at(1))).await.unwrap();
        let fresh = repo.upsert_story(story(2, 1, 1, at(20))).await.unwrap();
        repo.insert_comment(comment(old, 10, None)).await.unwrap();
        repo.insert_comment(comment(old, 11, Some(10))).await.unwrap();
        repo.insert_comment(comment(fresh, 20, None)).await.unwrap();

        let counts = repo.delete_older_than(at(1) + Duration::hours(1)).await.unwrap();
        assert_eq!(counts, PurgeCounts { stories: 1, comments: 2 });

        assert!(repo.get_story_by_id(old).await.unwrap().is_none());
        assert!(repo.get_comments_by_story_id(old).await.unwrap().is_empty());
        assert_eq!(repo.get_comments_by_story_id(fresh).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn stats_on_empty_store_are_zero() {
        let (_dir, repo) = open_repo().await;
        assert_eq!(repo.get_stats().await.unwrap(), Stats::default());
        assert!(repo.last_update().await.unwrap().is_none());
    }
}
