use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::ai::keywords;
use crate::ai::text::truncate_to_sentence;
use crate::ai::{TextKind, Translator};
use crate::models::{FetchedComment, NewComment, NewStory, RankedStory};

use super::fallback::FallbackChain;

const ABSTRACT_CHARS: usize = 300;
const DISCUSSION_COMMENTS: usize = 3;
const DISCUSSION_MARKER: &str = "讨论要点：";

/// Name of the abstract strategy backed by the remote translator. Abstracts
/// from any other strategy are local stand-ins.
pub const BACKEND_SOURCE: &str = "backend";

/// What an abstract is derived from.
pub struct AbstractInput<'a> {
    pub title: &'a str,
    pub body: Option<&'a str>,
    pub comments: &'a [String],
}

/// Attaches translations and abstracts. Every backend failure falls back to a
/// local transform, so enrichment itself never fails.
pub struct Enricher {
    translator: Option<Arc<dyn Translator>>,
    comment_cap: usize,
    delay: Duration,
}

impl Enricher {
    pub fn new(translator: Option<Arc<dyn Translator>>, comment_cap: usize, delay: Duration) -> Self {
        if translator.is_none() {
            tracing::warn!("No translator configured, using the local glossary only");
        }
        Self {
            translator,
            comment_cap,
            delay,
        }
    }

    pub async fn enrich_story(&self, story: RankedStory, fetched_at: DateTime<Utc>) -> NewStory {
        let translated_title = self.translate(&story.title, TextKind::Title).await;
        let translated_body = match story.body_text.as_deref() {
            Some(body) => Some(self.translate(body, TextKind::Body).await),
            None => None,
        };

        NewStory {
            translated_title: Some(translated_title),
            translated_body,
            ..NewStory::from_ranked(story, fetched_at)
        }
    }

    /// Translate the first `comment_cap` comments. The rest are kept with no
    /// translation.
    pub async fn enrich_comments(&self, comments: Vec<FetchedComment>, story_ref: i64) -> Vec<NewComment> {
        tracing::info!(
            "Translating {} of {} comments",
            comments.len().min(self.comment_cap),
            comments.len()
        );

        let mut enriched = Vec::with_capacity(comments.len());
        for (i, comment) in comments.into_iter().enumerate() {
            let mut new_comment = NewComment::from_fetched(comment, story_ref);
            if i < self.comment_cap && !new_comment.body_text.is_empty() {
                new_comment.translated_body =
                    Some(self.translate(&new_comment.body_text, TextKind::Comment).await);
            }
            enriched.push(new_comment);
        }
        enriched
    }

    /// Backend summary, else the body cut at a sentence, else the opening
    /// comments, else a line naming the title. Returns the name of the
    /// strategy that produced the text along with it.
    pub async fn abstract_for(&self, input: &AbstractInput<'_>) -> (&'static str, String) {
        let remote = match &self.translator {
            Some(translator) => {
                let summary = translator
                    .summarize(input.title, input.body, input.comments)
                    .await;
                self.throttle().await;
                summary
            }
            None => None,
        };

        let chain = FallbackChain::<AbstractInput, String>::new()
            .then(BACKEND_SOURCE, move |_| remote.clone())
            .then("body", |input| {
                input
                    .body
                    .filter(|body| !body.trim().is_empty())
                    .map(|body| truncate_to_sentence(body, ABSTRACT_CHARS))
            })
            .then("discussion", |input| {
                let opening: Vec<&str> = input
                    .comments
                    .iter()
                    .map(|c| c.trim())
                    .filter(|c| !c.is_empty())
                    .take(DISCUSSION_COMMENTS)
                    .collect();
                if opening.is_empty() {
                    return None;
                }
                Some(format!(
                    "{DISCUSSION_MARKER}{}",
                    truncate_to_sentence(&opening.join(" "), ABSTRACT_CHARS)
                ))
            })
            .then("title", |input| {
                Some(format!("关于\"{}\"的讨论", input.title))
            });

        let (source, text) = chain
            .run(input)
            .unwrap_or_else(|| ("title", format!("关于\"{}\"的讨论", input.title)));
        tracing::debug!("Abstract for {:?} from {}", input.title, source);
        (source, text)
    }

    async fn translate(&self, text: &str, kind: TextKind) -> String {
        let remote = match &self.translator {
            Some(translator) => {
                let translated = translator.translate(text, kind).await;
                self.throttle().await;
                translated
            }
            None => None,
        };

        let chain = FallbackChain::<str, String>::new()
            .then("backend", move |_| remote.clone())
            .then("glossary", |text| Some(keywords::substitute(text)));

        chain
            .run(text)
            .map(|(_, translated)| translated)
            .unwrap_or_else(|| text.to_string())
    }

    async fn throttle(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;

    /// Backend that either answers deterministically or is always down.
    pub(crate) struct ScriptedTranslator {
        pub available: bool,
        pub calls: AtomicUsize,
    }

    impl ScriptedTranslator {
        pub fn up() -> Self {
            Self {
                available: true,
                calls: AtomicUsize::new(0),
            }
        }

        pub fn down() -> Self {
            Self {
                available: false,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Translator for ScriptedTranslator {
        async fn translate(&self, text: &str, _kind: TextKind) -> Option<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.available.then(|| format!("[zh] {text}"))
        }

        async fn summarize(&self, title: &str, _body: Option<&str>, _comments: &[String]) -> Option<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.available.then(|| format!("[summary] {title}"))
        }
    }

    fn ranked(body: Option<&str>) -> RankedStory {
        RankedStory {
            remote_id: 1,
            title: "Show HN: AWS bill tracker".to_string(),
            url: "https://example.com".to_string(),
            body_text: body.map(str::to_string),
            score: 10,
            comment_count: 2,
            author: "pg".to_string(),
            created_at: Utc::now(),
            age_hours: 1.0,
            heat: 0.0,
        }
    }

    fn fetched(id: i64, content: &str) -> FetchedComment {
        FetchedComment {
            remote_comment_id: id,
            parent_id: None,
            author: "a".to_string(),
            content: content.to_string(),
            created_at: Utc::now(),
        }
    }

    fn enricher(translator: Option<ScriptedTranslator>, cap: usize) -> Enricher {
        Enricher::new(
            translator.map(|t| Arc::new(t) as Arc<dyn Translator>),
            cap,
            Duration::ZERO,
        )
    }

    #[tokio::test]
    async fn backend_translation_is_preferred() {
        let enricher = enricher(Some(ScriptedTranslator::up()), 10);
        let story = enricher.enrich_story(ranked(Some("Body text")), Utc::now()).await;
        assert_eq!(story.translated_title.as_deref(), Some("[zh] Show HN: AWS bill tracker"));
        assert_eq!(story.translated_body.as_deref(), Some("[zh] Body text"));
        assert_eq!(story.abstract_text, None);
    }

    #[tokio::test]
    async fn backend_failure_falls_back_to_glossary() {
        let enricher = enricher(Some(ScriptedTranslator::down()), 10);
        let story = enricher.enrich_story(ranked(None), Utc::now()).await;
        assert_eq!(story.translated_title.as_deref(), Some("展示 HN: 亚马逊云服务 bill tracker"));
        assert_eq!(story.translated_body, None);
    }

    #[test]
    fn comments_past_the_cap_stay_untranslated() {
        let enricher = enricher(None, 2);
        let comments = vec![fetched(1, "AI rocks"), fetched(2, ""), fetched(3, "third"), fetched(4, "fourth")];

        let enriched = tokio_test::block_on(enricher.enrich_comments(comments, 77));
        assert_eq!(enriched.len(), 4);
        assert!(enriched.iter().all(|c| c.story_ref == 77));
        assert_eq!(enriched[0].translated_body.as_deref(), Some("人工智能 rocks"));
        assert_eq!(enriched[1].translated_body, None);
        assert_eq!(enriched[2].translated_body, None);
        assert_eq!(enriched[3].translated_body, None);
    }

    #[tokio::test]
    async fn abstract_prefers_backend_then_body() {
        let body = "A long body. ".repeat(40);
        let input = AbstractInput {
            title: "Title",
            body: Some(&body),
            comments: &[],
        };

        let up = enricher(Some(ScriptedTranslator::up()), 10);
        assert_eq!(
            up.abstract_for(&input).await,
            (BACKEND_SOURCE, "[summary] Title".to_string())
        );

        let down = enricher(Some(ScriptedTranslator::down()), 10);
        let (source, text) = down.abstract_for(&input).await;
        assert_eq!(source, "body");
        assert!(text.ends_with("body."));
        assert!(text.chars().count() <= ABSTRACT_CHARS);
    }

    #[tokio::test]
    async fn abstract_falls_back_to_discussion_then_title() {
        let enricher = enricher(None, 10);
        let comments = vec![
            "First point.".to_string(),
            " ".to_string(),
            "Second point.".to_string(),
            "Third point.".to_string(),
            "Fourth point.".to_string(),
        ];
        let input = AbstractInput {
            title: "Title",
            body: None,
            comments: &comments,
        };
        assert_eq!(
            enricher.abstract_for(&input).await.1,
            "讨论要点：First point. Second point. Third point."
        );

        let bare = AbstractInput {
            title: "Title",
            body: Some("  "),
            comments: &[],
        };
        assert_eq!(
            enricher.abstract_for(&bare).await,
            ("title", "关于\"Title\"的讨论".to_string())
        );
    }
}
