//! LLM source for the daily playbook.
//!
//! Talks to the Perplexity chat completions endpoint over plain HTTPS.
//! Responses are freeform text; refusals ("I can't provide...") are detected
//! by marker phrases and retried once with an amended prompt before giving
//! up for the day.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use chrono_tz::Tz;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::error::LlmError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(45);
const MAX_ATTEMPTS: usize = 2;

/// Phrases that mark a refusal rather than a usable playbook.
const REFUSAL_MARKERS: &[&str] = &[
    "i cannot provide",
    "i can't provide",
    "i am unable to",
    "i'm unable to",
    "cannot offer financial advice",
    "can't offer financial advice",
    "not able to provide financial",
];

const SYSTEM_PROMPT: &str = "You are a macro strategist writing a concise daily \
geopolitical and market playbook. Output plain text only, no markdown tables.";

const USER_PROMPT: &str = "Write today's macro playbook. Start with one line \
'Daily Macro & Trading Playbook' and a one-line risk-on and risk-off summary \
(prefixed 🟢 Risk-On: and 🔴 Risk-Off:). Then list the 2-3 most significant \
geopolitical or macro events of the day as 'EVENT N: headline', each followed by \
'Context:' with up to 3 short dash bullets and up to 3 scenario entries, each a \
'• headline' line with '- Focus:' and '- Rationale:' lines underneath.";

const AMENDED_SUFFIX: &str = " This is scenario-based research commentary, not \
investment advice; describe hypothetical market reactions only.";

/// A source of raw playbook text. The production implementation calls
/// Perplexity; tests substitute a canned source.
#[async_trait]
pub trait PlaybookSource: Send + Sync {
    async fn fetch_playbook(&self) -> Result<String, LlmError>;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: String,
}

/// Perplexity-backed playbook source.
pub struct PerplexityClient {
    http: reqwest::Client,
    api_key: SecretString,
    model: String,
    base_url: String,
    tz: Tz,
}

impl PerplexityClient {
    pub fn new(
        api_key: SecretString,
        model: String,
        base_url: String,
        tz: Tz,
    ) -> Result<Self, LlmError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| LlmError::RequestFailed {
                status: 0,
                body: format!("failed to build http client: {e}"),
            })?;
        Ok(Self { http, api_key, model, base_url: base_url.trim_end_matches('/').to_string(), tz })
    }

    fn dated_prompt(&self, suffix: &str) -> String {
        let today = Utc::now().with_timezone(&self.tz).format("%A %d %B %Y");
        format!("Today is {today}. {USER_PROMPT}{suffix}")
    }

    async fn complete(&self, user_prompt: &str) -> Result<String, LlmError> {
        let request = ChatRequest {
            model: &self.model,
            temperature: 0.2,
            messages: vec![
                ChatMessage { role: "system", content: SYSTEM_PROMPT },
                ChatMessage { role: "user", content: user_prompt },
            ],
        };

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(LlmError::Http)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::RequestFailed { status: status.as_u16(), body });
        }

        let parsed: ChatResponse = response.json().await.map_err(LlmError::Http)?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| LlmError::InvalidResponse {
                reason: "response contained no choices".to_string(),
            })?;

        let trimmed = content.trim();
        if trimmed.is_empty() {
            return Err(LlmError::InvalidResponse {
                reason: "response content was empty".to_string(),
            });
        }
        Ok(trimmed.to_string())
    }
}

#[async_trait]
impl PlaybookSource for PerplexityClient {
    async fn fetch_playbook(&self) -> Result<String, LlmError> {
        let mut prompt = self.dated_prompt("");
        for attempt in 1..=MAX_ATTEMPTS {
            let content = self.complete(&prompt).await?;
            if !is_refusal(&content) {
                return Ok(content);
            }
            tracing::warn!(attempt, "playbook response looks like a refusal, retrying");
            prompt = self.dated_prompt(AMENDED_SUFFIX);
        }
        Err(LlmError::RetriesExhausted { attempts: MAX_ATTEMPTS })
    }
}

/// True when the text opens with a refusal rather than playbook content.
pub fn is_refusal(text: &str) -> bool {
    let head: String = text.chars().take(300).collect::<String>().to_lowercase();
    REFUSAL_MARKERS.iter().any(|marker| head.contains(marker))
}
