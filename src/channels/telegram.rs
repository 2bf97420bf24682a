//! Telegram transport, long-polling the Bot API for updates.
//!
//! Native Bot API client over reqwest. Conversation messages go out as
//! plain text with optional inline keyboards; the daily playbook goes out
//! as MarkdownV2 with a plain-text fallback. Media uploads use multipart.

use std::path::Path;

use reqwest::multipart::{Form, Part};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::channels::{ButtonAction, Keyboard};
use crate::error::ChannelError;

const POLL_TIMEOUT_SECS: u64 = 30;

// ── Typed updates ───────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct UpdatesResponse {
    pub ok: bool,
    #[serde(default)]
    pub result: Vec<Update>,
}

#[derive(Debug, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub from: Option<User>,
    pub chat: Chat,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    pub message: Option<Message>,
    pub data: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    description: Option<String>,
}

/// A normalized incoming event, everything the dispatcher needs and
/// nothing else.
#[derive(Debug, Clone)]
pub enum TelegramEvent {
    Message {
        user_id: i64,
        username: Option<String>,
        chat_id: i64,
        text: String,
    },
    Callback {
        user_id: i64,
        username: Option<String>,
        chat_id: i64,
        message_id: i64,
        callback_id: String,
        data: String,
    },
}

/// Flatten a raw update into an event. Updates without a usable payload
/// (no text, no callback data, service messages) are dropped.
fn normalize_update(update: Update) -> Option<TelegramEvent> {
    if let Some(message) = update.message {
        let from = message.from?;
        let text = message.text?;
        return Some(TelegramEvent::Message {
            user_id: from.id,
            username: from.username,
            chat_id: message.chat.id,
            text,
        });
    }
    if let Some(cb) = update.callback_query {
        let message = cb.message?;
        let data = cb.data?;
        return Some(TelegramEvent::Callback {
            user_id: cb.from.id,
            username: cb.from.username,
            chat_id: message.chat.id,
            message_id: message.message_id,
            callback_id: cb.id,
            data,
        });
    }
    None
}

// ── Client ──────────────────────────────────────────────────────────

pub struct TelegramClient {
    bot_token: SecretString,
    client: reqwest::Client,
}

impl TelegramClient {
    pub fn new(bot_token: SecretString) -> Self {
        Self { bot_token, client: reqwest::Client::new() }
    }

    fn api_url(&self, method: &str) -> String {
        format!("https://api.telegram.org/bot{}/{method}", self.bot_token.expose_secret())
    }

    /// One long-poll cycle. Returns updates with id >= `offset`.
    pub async fn get_updates(&self, offset: i64) -> Result<Vec<Update>, ChannelError> {
        let body = serde_json::json!({
            "offset": offset,
            "timeout": POLL_TIMEOUT_SECS,
            "allowed_updates": ["message", "callback_query"],
        });

        let resp = self
            .client
            .post(self.api_url("getUpdates"))
            .json(&body)
            .send()
            .await?;

        let parsed: UpdatesResponse = resp.json().await?;
        if !parsed.ok {
            return Err(ChannelError::Api {
                method: "getUpdates".into(),
                description: "response not ok".into(),
            });
        }
        Ok(parsed.result)
    }

    /// Spawn the long-poll loop and return a stream of normalized events.
    /// Poll errors back off for a few seconds and the loop continues.
    pub fn start(self: std::sync::Arc<Self>) -> tokio::sync::mpsc::UnboundedReceiver<TelegramEvent> {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let client = self;

        tokio::spawn(async move {
            let mut offset: i64 = 0;
            tracing::info!("Telegram listening for updates");

            loop {
                let updates = match client.get_updates(offset).await {
                    Ok(u) => u,
                    Err(e) => {
                        tracing::warn!("Telegram poll error: {e}");
                        tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                        continue;
                    }
                };

                for update in updates {
                    offset = offset.max(update.update_id + 1);
                    let Some(event) = normalize_update(update) else {
                        continue;
                    };
                    if tx.send(event).is_err() {
                        tracing::info!("Telegram listener channel closed");
                        return;
                    }
                }
            }
        });

        rx
    }

    /// Plain-text message with an optional inline keyboard.
    pub async fn send_text(
        &self,
        chat_id: &str,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<(), ChannelError> {
        let mut body = serde_json::json!({
            "chat_id": chat_id,
            "text": text,
        });
        if let Some(kb) = keyboard {
            body["reply_markup"] = keyboard_json(kb);
        }
        self.call_json("sendMessage", &body).await
    }

    /// MarkdownV2 message, retried as plain text if Telegram rejects the
    /// markup. Callers are expected to pre-chunk under the 4096 limit.
    pub async fn send_markdown(&self, chat_id: &str, text: &str) -> Result<(), ChannelError> {
        let body = serde_json::json!({
            "chat_id": chat_id,
            "text": text,
            "parse_mode": "MarkdownV2",
        });
        match self.call_json("sendMessage", &body).await {
            Ok(()) => Ok(()),
            Err(e) => {
                tracing::warn!("sendMessage with MarkdownV2 failed ({e}); retrying plain");
                let plain = serde_json::json!({ "chat_id": chat_id, "text": text });
                self.call_json("sendMessage", &plain).await
            }
        }
    }

    /// Edit a previously sent message, replacing text and keyboard.
    pub async fn edit_text(
        &self,
        chat_id: &str,
        message_id: i64,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<(), ChannelError> {
        let mut body = serde_json::json!({
            "chat_id": chat_id,
            "message_id": message_id,
            "text": text,
        });
        if let Some(kb) = keyboard {
            body["reply_markup"] = keyboard_json(kb);
        }
        self.call_json("editMessageText", &body).await
    }

    /// Acknowledge a callback query so the client stops its spinner.
    pub async fn answer_callback(&self, callback_id: &str) -> Result<(), ChannelError> {
        let body = serde_json::json!({ "callback_query_id": callback_id });
        self.call_json("answerCallbackQuery", &body).await
    }

    pub async fn send_photo(
        &self,
        chat_id: &str,
        file_path: &Path,
        caption: Option<&str>,
    ) -> Result<(), ChannelError> {
        self.send_media("sendPhoto", "photo", chat_id, file_path, caption, None).await
    }

    pub async fn send_document(
        &self,
        chat_id: &str,
        file_path: &Path,
        caption: Option<&str>,
    ) -> Result<(), ChannelError> {
        self.send_media("sendDocument", "document", chat_id, file_path, caption, None).await
    }

    pub async fn send_video(
        &self,
        chat_id: &str,
        file_path: &Path,
        caption: Option<&str>,
    ) -> Result<(), ChannelError> {
        let extra = &[("supports_streaming", "true")];
        self.send_media("sendVideo", "video", chat_id, file_path, caption, Some(extra)).await
    }

    /// Circular video note. No caption support in the Bot API.
    pub async fn send_video_note(
        &self,
        chat_id: &str,
        file_path: &Path,
    ) -> Result<(), ChannelError> {
        self.send_media("sendVideoNote", "video_note", chat_id, file_path, None, None).await
    }

    async fn call_json(
        &self,
        method: &str,
        body: &serde_json::Value,
    ) -> Result<(), ChannelError> {
        let resp = self.client.post(self.api_url(method)).json(body).send().await.map_err(
            |e| ChannelError::SendFailed { method: method.into(), reason: e.to_string() },
        )?;

        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }

        let description = resp
            .json::<ApiResponse>()
            .await
            .ok()
            .filter(|r| !r.ok)
            .and_then(|r| r.description)
            .unwrap_or_else(|| format!("status {status}"));
        Err(ChannelError::Api { method: method.into(), description })
    }

    async fn send_media(
        &self,
        method: &str,
        field: &str,
        chat_id: &str,
        file_path: &Path,
        caption: Option<&str>,
        extra: Option<&[(&str, &str)]>,
    ) -> Result<(), ChannelError> {
        let file_name = file_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("file")
            .to_string();

        let file_bytes = tokio::fs::read(file_path).await.map_err(|e| {
            ChannelError::SendFailed {
                method: method.into(),
                reason: format!("read {}: {e}", file_path.display()),
            }
        })?;
        let part = Part::bytes(file_bytes).file_name(file_name.clone());

        let mut form = Form::new()
            .text("chat_id", chat_id.to_string())
            .part(field.to_string(), part);
        if let Some(cap) = caption {
            form = form.text("caption", cap.to_string());
        }
        if let Some(pairs) = extra {
            for (k, v) in pairs {
                form = form.text(k.to_string(), v.to_string());
            }
        }

        let resp = self
            .client
            .post(self.api_url(method))
            .multipart(form)
            .send()
            .await
            .map_err(|e| ChannelError::SendFailed {
                method: method.into(),
                reason: e.to_string(),
            })?;

        if !resp.status().is_success() {
            let err = resp.text().await.unwrap_or_default();
            return Err(ChannelError::Api { method: method.into(), description: err });
        }

        tracing::info!("Telegram {method} sent to {chat_id}: {file_name}");
        Ok(())
    }
}

/// Serialize an inline keyboard into Bot API reply_markup JSON.
fn keyboard_json(keyboard: &Keyboard) -> serde_json::Value {
    let rows: Vec<Vec<serde_json::Value>> = keyboard
        .iter()
        .map(|row| {
            row.iter()
                .map(|b| match &b.action {
                    ButtonAction::Callback(data) => {
                        serde_json::json!({ "text": b.text, "callback_data": data })
                    }
                    ButtonAction::Url(url) => {
                        serde_json::json!({ "text": b.text, "url": url })
                    }
                })
                .collect()
        })
        .collect();
    serde_json::json!({ "inline_keyboard": rows })
}
