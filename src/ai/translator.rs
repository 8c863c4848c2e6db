use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

use super::text::{strip_html, truncate_chars};

const BODY_INPUT_CHARS: usize = 1000;
const COMMENT_INPUT_CHARS: usize = 1500;
const SUMMARY_BODY_CHARS: usize = 500;
const SUMMARY_COMMENT_CHARS: usize = 300;
const SUMMARY_MAX_COMMENTS: usize = 10;

/// What kind of text is being translated. Selects the prompt and how much of
/// the input is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextKind {
    Title,
    Body,
    Comment,
}

/// Translation and summarization backend. `None` means the backend could
/// not produce a result and the caller should fall back.
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str, kind: TextKind) -> Option<String>;

    async fn summarize(&self, title: &str, body: Option<&str>, comments: &[String]) -> Option<String>;
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Client for an OpenAI-compatible chat completions endpoint.
pub struct LlmTranslator {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl LlmTranslator {
    pub fn new(api_key: String, base_url: String, model: String) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
        })
    }

    pub fn model_version(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: String, max_tokens: u32) -> Result<String> {
        let system_prompt = "You are a professional translator and summarizer of technology \
discussions. Write concise, accurate Simplified Chinese.";

        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system_prompt.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt,
                },
            ],
            max_tokens,
            temperature: 0.3,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(AppError::TranslatorApi(format!("API error: {}", error_text)));
        }

        let chat_response: ChatResponse = response.json().await?;

        chat_response
            .choices
            .into_iter()
            .filter_map(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .find(|content| !content.is_empty())
            .ok_or_else(|| AppError::TranslatorApi("empty completion".to_string()))
    }
}

fn translation_prompt(text: &str, kind: TextKind) -> (String, u32) {
    match kind {
        TextKind::Title => (
            format!(
                "Translate this English title into Chinese, keeping technical terms accurate:\n\n\"{text}\"\n\n\
                 Return only the translation, with no explanation."
            ),
            200,
        ),
        TextKind::Body => (
            format!(
                "Translate the following English text into Chinese:\n\n{}\n\n\
                 Return only the translation, with no explanation.",
                truncate_chars(text, BODY_INPUT_CHARS)
            ),
            1500,
        ),
        TextKind::Comment => (
            format!(
                "Translate the following English comment into Chinese:\n\n{}\n\n\
                 Output only the Chinese translation. Do not repeat the original or add notes.",
                truncate_chars(text, COMMENT_INPUT_CHARS)
            ),
            1200,
        ),
    }
}

fn summary_prompt(title: &str, body: Option<&str>, comments: &[String]) -> String {
    let mut context = format!("Title: {title}\n\n");

    if let Some(body) = body.map(strip_html).filter(|b| !b.is_empty()) {
        let preview: String = body.chars().take(SUMMARY_BODY_CHARS).collect();
        context.push_str(&format!("Content: {preview}\n\n"));
    }

    if !comments.is_empty() {
        context.push_str("Community discussion (different users):\n");
        for (i, comment) in comments.iter().take(SUMMARY_MAX_COMMENTS).enumerate() {
            let preview: String = comment.chars().take(SUMMARY_COMMENT_CHARS).collect();
            context.push_str(&format!("\nUser {}: {}\n", i + 1, preview));
        }
    }

    format!(
        "This is a Hacker News discussion thread. Write a concise Chinese summary \
(150-250 characters) that states the core topic, the main viewpoints and points of \
contention, and any consensus.\n\n{context}\n\
Return plain prose only, without Markdown or HTML."
    )
}

#[async_trait]
impl Translator for LlmTranslator {
    async fn translate(&self, text: &str, kind: TextKind) -> Option<String> {
        if text.trim().is_empty() {
            return None;
        }

        let (prompt, max_tokens) = translation_prompt(text, kind);
        match self.complete(prompt, max_tokens).await {
            Ok(translated) => Some(translated),
            Err(e) => {
                tracing::warn!("Translation failed ({:?}): {}", kind, e);
                None
            }
        }
    }

    async fn summarize(&self, title: &str, body: Option<&str>, comments: &[String]) -> Option<String> {
        match self.complete(summary_prompt(title, body, comments), 800).await {
            Ok(summary) => Some(summary),
            Err(e) => {
                tracing::warn!("Summary generation failed for {:?}: {}", title, e);
                None
            }
        }
    }
}
