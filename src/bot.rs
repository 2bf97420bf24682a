//! Update dispatch loop.
//!
//! Pulls normalized events off the Telegram stream, feeds them to the
//! onboarding engine, and executes the resulting outbound instructions.
//! All I/O failures are contained here: a failed media send is logged and
//! the rest of the sequence continues, and an engine error turns into a
//! generic apology so the bot loop never dies on a single user.

use std::path::Path;
use std::sync::Arc;

use crate::channels::telegram::{TelegramClient, TelegramEvent};
use crate::channels::{Button, Keyboard};
use crate::error::ChannelError;
use crate::onboarding::prompts;
use crate::onboarding::{Callback, Event, OnboardingEngine, Outbound, UserIdentity};

pub struct Bot {
    telegram: Arc<TelegramClient>,
    engine: Arc<OnboardingEngine>,
}

impl Bot {
    pub fn new(telegram: Arc<TelegramClient>, engine: Arc<OnboardingEngine>) -> Self {
        Self { telegram, engine }
    }

    /// Consume the update stream until it closes.
    pub async fn run(&self) {
        let mut events = Arc::clone(&self.telegram).start();
        while let Some(event) = events.recv().await {
            self.dispatch(event).await;
        }
        tracing::info!("update stream closed, bot loop exiting");
    }

    async fn dispatch(&self, event: TelegramEvent) {
        let (user, engine_event) = match event {
            TelegramEvent::Message { user_id, username, chat_id, text } => {
                let user = UserIdentity { user_id, username, chat_id };
                (user, classify_text(&text))
            }
            TelegramEvent::Callback { user_id, username, chat_id, message_id, callback_id, data } => {
                let user = UserIdentity { user_id, username, chat_id };
                (user, Event::Callback(Callback { id: callback_id, message_id, data }))
            }
        };

        let chat_id = user.chat_id.to_string();
        match self.engine.handle(&user, engine_event).await {
            Ok(outbound) => self.execute(&chat_id, outbound).await,
            Err(e) => {
                tracing::error!(user_id = user.user_id, "engine error: {e}");
                if let Err(e) = self.telegram.send_text(&chat_id, prompts::GENERIC_ERROR, None).await
                {
                    tracing::warn!("failed to deliver error notice: {e}");
                }
            }
        }
    }

    /// Execute instructions in order. Failures are logged per instruction;
    /// the remainder of the sequence still runs.
    async fn execute(&self, chat_id: &str, outbound: Vec<Outbound>) {
        for instruction in outbound {
            if let Err(e) = self.perform(chat_id, instruction).await {
                tracing::warn!("outbound instruction failed: {e}");
            }
        }
    }

    async fn perform(&self, chat_id: &str, instruction: Outbound) -> Result<(), ChannelError> {
        match instruction {
            Outbound::SendText { text, keyboard } => {
                self.telegram.send_text(chat_id, &text, keyboard.as_ref()).await
            }
            Outbound::EditText { message_id, text, keyboard } => {
                self.telegram.edit_text(chat_id, message_id, &text, keyboard.as_ref()).await
            }
            Outbound::AnswerCallback { id } => self.telegram.answer_callback(&id).await,
            Outbound::Delay(duration) => {
                tokio::time::sleep(duration).await;
                Ok(())
            }
            Outbound::SendVideoNote { path } => {
                if !file_present("video note", &path) {
                    return Ok(());
                }
                match self.telegram.send_video_note(chat_id, &path).await {
                    Ok(()) => Ok(()),
                    Err(e) => {
                        tracing::warn!("sendVideoNote failed ({e}), falling back to sendVideo");
                        self.telegram
                            .send_video(chat_id, &path, Some(prompts::INTRO_VIDEO_CAPTION))
                            .await
                    }
                }
            }
            Outbound::SendPhoto { path, caption } => {
                if !file_present("photo", &path) {
                    return Ok(());
                }
                self.telegram.send_photo(chat_id, &path, caption.as_deref()).await
            }
            Outbound::SendDocument { path, caption } => {
                if !file_present("document", &path) {
                    return Ok(());
                }
                self.telegram.send_document(chat_id, &path, caption.as_deref()).await
            }
            Outbound::SendVideo { path, caption } => {
                if !file_present("video", &path) {
                    return Ok(());
                }
                self.telegram.send_video(chat_id, &path, caption.as_deref()).await
            }
            Outbound::SendLinkButton { text, label, url } => {
                let keyboard: Keyboard = vec![vec![Button::url(label, url)]];
                self.telegram.send_text(chat_id, &text, Some(&keyboard)).await
            }
        }
    }
}

/// Missing media files are a deployment problem, not a user-facing error.
fn file_present(what: &str, path: &Path) -> bool {
    if path.exists() {
        true
    } else {
        tracing::warn!("{what} file missing: {}", path.display());
        false
    }
}

/// Map free text to an engine event. `/start` begins the conversation, any
/// other command gets the help text, everything else is conversation input.
fn classify_text(text: &str) -> Event {
    let trimmed = text.trim();
    if trimmed == "/start" || trimmed.starts_with("/start ") {
        Event::Start
    } else if trimmed.starts_with('/') {
        Event::Help
    } else {
        Event::Text(trimmed.to_string())
    }
}
