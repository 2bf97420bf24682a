//! Lead capture conversation engine.
//!
//! The engine is pure with respect to Telegram: it consumes incoming events
//! and emits a sequence of [`Outbound`] instructions for the channel layer
//! to execute. All stage transitions, validation, and the at-most-once lead
//! write live here, which keeps the whole conversation testable without a
//! network.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::channels::Keyboard;
use crate::config::OnboardingConfig;
use crate::error::Result;
use crate::onboarding::prompts::{self, CB_PLATFORM_PREFIX, CB_REGION_PREFIX};
use crate::onboarding::session::{Session, SessionStore};
use crate::onboarding::state::Stage;
use crate::onboarding::validate;
use crate::store::LeadStore;

const DELAY_BEFORE_INTRO_VIDEO: Duration = Duration::from_secs(3);
const DELAY_AFTER_INTRO_VIDEO: Duration = Duration::from_secs(5);
const DELAY_AFTER_GUIDE: Duration = Duration::from_secs(3);
const DELAY_AFTER_SETUP_VIDEO: Duration = Duration::from_secs(5);
const DELAY_BEFORE_FINAL_MESSAGE: Duration = Duration::from_secs(5);

/// The user behind an incoming update.
#[derive(Debug, Clone)]
pub struct UserIdentity {
    pub user_id: i64,
    pub username: Option<String>,
    pub chat_id: i64,
}

/// A pressed inline button.
#[derive(Debug, Clone)]
pub struct Callback {
    /// Callback query id, must be acknowledged.
    pub id: String,
    /// Message carrying the keyboard, target for edits.
    pub message_id: i64,
    pub data: String,
}

/// An incoming conversation event.
#[derive(Debug, Clone)]
pub enum Event {
    /// The /start command.
    Start,
    /// The /help command (and any unrecognized command).
    Help,
    /// Free-form text.
    Text(String),
    /// Inline button press.
    Callback(Callback),
}

/// One instruction for the channel layer.
#[derive(Debug, Clone)]
pub enum Outbound {
    SendText { text: String, keyboard: Option<Keyboard> },
    EditText { message_id: i64, text: String, keyboard: Option<Keyboard> },
    /// Circular video note. The executor falls back to a plain video send
    /// if the Bot API rejects the note.
    SendVideoNote { path: PathBuf },
    SendPhoto { path: PathBuf, caption: Option<String> },
    SendDocument { path: PathBuf, caption: Option<String> },
    SendVideo { path: PathBuf, caption: Option<String> },
    /// Text message carrying a single URL button.
    SendLinkButton { text: String, label: String, url: String },
    AnswerCallback { id: String },
    Delay(Duration),
}

/// Drives the lead capture conversation.
pub struct OnboardingEngine {
    sessions: Arc<dyn SessionStore>,
    leads: Arc<dyn LeadStore>,
    cfg: OnboardingConfig,
}

impl OnboardingEngine {
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        leads: Arc<dyn LeadStore>,
        cfg: OnboardingConfig,
    ) -> Self {
        Self { sessions, leads, cfg }
    }

    pub async fn handle(&self, user: &UserIdentity, event: Event) -> Result<Vec<Outbound>> {
        match event {
            Event::Start => self.on_start(user).await,
            Event::Help => Ok(vec![send(&prompts::help_text(&self.cfg.help_email))]),
            Event::Text(text) => self.on_text(user, &text).await,
            Event::Callback(cb) => self.on_callback(user, &cb).await,
        }
    }

    /// /start: reset any existing session and run the intro sequence.
    async fn on_start(&self, user: &UserIdentity) -> Result<Vec<Outbound>> {
        tracing::info!(user_id = user.user_id, "onboarding started");
        self.sessions.put(user.user_id, Session::default()).await;
        Ok(self.intro_sequence())
    }

    /// Free-text message. Only the email and phone stages accept text.
    async fn on_text(&self, user: &UserIdentity, text: &str) -> Result<Vec<Outbound>> {
        let Some(mut session) = self.sessions.get(user.user_id).await else {
            return Ok(Vec::new());
        };

        let out = match session.stage {
            Stage::AwaitEmail => {
                let email = text.trim();
                if !validate::is_valid_email(email) {
                    vec![send(prompts::BAD_EMAIL)]
                } else {
                    session.fields.email = Some(email.to_string());
                    session.advance(Stage::AwaitPhone);
                    vec![send(prompts::ASK_PHONE)]
                }
            }
            Stage::AwaitPhone => {
                let phone = validate::normalize_phone(text);
                if !validate::is_valid_phone(&phone) {
                    vec![send(prompts::BAD_PHONE)]
                } else {
                    session.fields.phone = Some(phone);
                    session.advance(Stage::AwaitRegion);
                    vec![Outbound::SendText {
                        text: prompts::ASK_REGION.to_string(),
                        keyboard: Some(prompts::region_keyboard(&self.cfg.regions)),
                    }]
                }
            }
            Stage::Cancelled => Vec::new(),
            // Button stages: nudge back to the keyboard.
            _ => vec![send(prompts::IGNORED_TEXT)],
        };

        self.sessions.put(user.user_id, session).await;
        Ok(out)
    }

    /// Inline button press.
    async fn on_callback(&self, user: &UserIdentity, cb: &Callback) -> Result<Vec<Outbound>> {
        let mut out = vec![Outbound::AnswerCallback { id: cb.id.clone() }];

        // Restart works from anywhere, including a cancelled conversation.
        if cb.data == prompts::CB_RESTART {
            tracing::info!(user_id = user.user_id, "onboarding restarted");
            self.sessions.put(user.user_id, Session::default()).await;
            out.extend(self.intro_sequence());
            return Ok(out);
        }

        let Some(mut session) = self.sessions.get(user.user_id).await else {
            return Ok(out);
        };

        match session.stage {
            Stage::StartDecision => match cb.data.as_str() {
                prompts::CB_PROCEED => {
                    session.fields = Default::default();
                    let (stage, text, keyboard) = self.first_collection_step();
                    session.advance(stage);
                    out.push(edit(cb, text, keyboard));
                }
                prompts::CB_CANCEL => {
                    session.advance(Stage::Cancelled);
                    session.fields = Default::default();
                    out.push(edit(cb, prompts::CANCELLED, Some(prompts::restart_keyboard())));
                }
                _ => {}
            },
            Stage::AwaitPlatform => {
                match parse_choice(&cb.data, CB_PLATFORM_PREFIX, &self.cfg.platforms) {
                    Some(platform) => {
                        session.fields.platform = Some(platform.to_string());
                        session.advance(Stage::AwaitEmail);
                        let text = format!("Platform set to: {platform}\n\n{}", prompts::ASK_EMAIL);
                        out.push(edit(cb, &text, None));
                    }
                    None => out.push(edit(
                        cb,
                        prompts::BAD_PLATFORM,
                        Some(prompts::platform_keyboard(&self.cfg.platforms)),
                    )),
                }
            }
            Stage::AwaitRegion => {
                match parse_choice(&cb.data, CB_REGION_PREFIX, &self.cfg.regions) {
                    Some(region) => {
                        session.fields.region = Some(region.to_string());
                        session.advance(Stage::Review);
                        let text = prompts::review_text(
                            session.fields.platform.as_deref().unwrap_or(""),
                            session.fields.email.as_deref().unwrap_or(""),
                            session.fields.phone.as_deref().unwrap_or(""),
                            session.fields.region.as_deref().unwrap_or(""),
                            &self.cfg.support_handle,
                        );
                        out.push(edit(cb, &text, Some(prompts::review_keyboard())));
                    }
                    None => out.push(edit(
                        cb,
                        prompts::BAD_REGION,
                        Some(prompts::region_keyboard(&self.cfg.regions)),
                    )),
                }
            }
            Stage::Review => match cb.data.as_str() {
                prompts::CB_EDIT_DETAILS => {
                    session.fields = Default::default();
                    if self.cfg.platforms.is_empty() {
                        session.advance(Stage::AwaitEmail);
                        out.push(edit(cb, prompts::EDIT_RESTART_EMAIL, None));
                    } else {
                        session.advance(Stage::AwaitPlatform);
                        out.push(edit(
                            cb,
                            prompts::EDIT_RESTART_PLATFORM,
                            Some(prompts::platform_keyboard(&self.cfg.platforms)),
                        ));
                    }
                }
                prompts::CB_DETAILS_OK => {
                    return self.confirm(user, cb, session, out).await;
                }
                _ => {}
            },
            // Text-entry and terminal stages ignore stray button presses.
            Stage::AwaitEmail | Stage::AwaitPhone | Stage::Cancelled => {}
        }

        self.sessions.put(user.user_id, session).await;
        Ok(out)
    }

    /// Write the lead and emit the completion sequence. The session is
    /// cleared only after the row is on disk; a failed write keeps the
    /// session in Review and asks the user to tap confirm again, with the
    /// callback still acknowledged so the button spinner clears.
    async fn confirm(
        &self,
        user: &UserIdentity,
        cb: &Callback,
        session: Session,
        mut out: Vec<Outbound>,
    ) -> Result<Vec<Outbound>> {
        if !session.fields.is_complete() {
            tracing::warn!(user_id = user.user_id, "confirm with incomplete details ignored");
            return Ok(out);
        }
        let path = match self
            .leads
            .append(user.user_id, user.username.as_deref(), &session.fields)
            .await
        {
            Ok(path) => path,
            Err(e) => {
                tracing::error!(user_id = user.user_id, "lead write failed: {e}");
                out.push(send(prompts::SAVE_FAILED));
                return Ok(out);
            }
        };
        tracing::info!(user_id = user.user_id, path = %path.display(), "lead saved");
        self.sessions.remove(user.user_id).await;

        out.push(edit(cb, prompts::DETAILS_SAVED, None));
        out.extend(self.setup_video_sequence());
        out.push(Outbound::Delay(DELAY_AFTER_SETUP_VIDEO));
        out.push(Outbound::SendLinkButton {
            text: prompts::AFFILIATE_PROMPT.to_string(),
            label: "Open trading account".to_string(),
            url: self.cfg.affiliate_link.clone(),
        });
        out.push(Outbound::Delay(DELAY_BEFORE_FINAL_MESSAGE));
        out.push(send(&prompts::final_instructions(&self.cfg.support_handle)));
        Ok(out)
    }

    /// Welcome, intro video, guide pack, then the proceed prompt, with the
    /// pauses the original flow used between each piece.
    fn intro_sequence(&self) -> Vec<Outbound> {
        let mut out = vec![send(prompts::WELCOME)];
        if let Some(note) = &self.cfg.intro_video_note {
            out.push(Outbound::Delay(DELAY_BEFORE_INTRO_VIDEO));
            out.push(Outbound::SendVideoNote { path: note.clone() });
            out.push(Outbound::Delay(DELAY_AFTER_INTRO_VIDEO));
        }
        out.extend(self.guide_pack());
        out.push(Outbound::Delay(DELAY_AFTER_GUIDE));
        out.push(Outbound::SendText {
            text: prompts::PROCEED_PROMPT.to_string(),
            keyboard: Some(prompts::proceed_cancel_keyboard()),
        });
        out
    }

    /// Preview photo then the PDF itself. A missing PDF points at support
    /// instead of silently sending nothing.
    fn guide_pack(&self) -> Vec<Outbound> {
        let mut out = Vec::new();
        if let Some(preview) = &self.cfg.guide_preview {
            out.push(Outbound::SendPhoto { path: preview.clone(), caption: None });
        }
        match &self.cfg.guide_pdf {
            Some(pdf) => out.push(Outbound::SendDocument {
                path: pdf.clone(),
                caption: Some(prompts::GUIDE_PDF_CAPTION.to_string()),
            }),
            None => out.push(send(prompts::GUIDE_MISSING)),
        }
        out
    }

    /// Prefer the mp4; fall back to a preview photo plus link button.
    fn setup_video_sequence(&self) -> Vec<Outbound> {
        if let Some(video) = &self.cfg.setup_video {
            return vec![Outbound::SendVideo {
                path: video.clone(),
                caption: Some(prompts::SETUP_VIDEO_CAPTION.to_string()),
            }];
        }
        let Some(link) = &self.cfg.setup_video_link else {
            return vec![send(prompts::SETUP_MISSING)];
        };
        let mut out = Vec::new();
        if let Some(preview) = &self.cfg.setup_video_preview {
            out.push(Outbound::SendPhoto { path: preview.clone(), caption: None });
        }
        out.push(Outbound::SendLinkButton {
            text: prompts::SETUP_LINK_TEXT.to_string(),
            label: prompts::SETUP_LINK_LABEL.to_string(),
            url: link.clone(),
        });
        out
    }

    /// First step after PROCEED: platform keyboard when a platform set is
    /// configured, otherwise straight to email.
    fn first_collection_step(&self) -> (Stage, &'static str, Option<Keyboard>) {
        if self.cfg.platforms.is_empty() {
            (Stage::AwaitEmail, prompts::ASK_EMAIL_FIRST, None)
        } else {
            (
                Stage::AwaitPlatform,
                prompts::ASK_PLATFORM,
                Some(prompts::platform_keyboard(&self.cfg.platforms)),
            )
        }
    }
}

fn send(text: &str) -> Outbound {
    Outbound::SendText { text: text.to_string(), keyboard: None }
}

fn edit(cb: &Callback, text: &str, keyboard: Option<Keyboard>) -> Outbound {
    Outbound::EditText { message_id: cb.message_id, text: text.to_string(), keyboard }
}

/// Strip the callback prefix and check membership in the allowed set.
fn parse_choice<'a>(data: &'a str, prefix: &str, allowed: &[String]) -> Option<&'a str> {
    let value = data.strip_prefix(prefix)?.trim();
    allowed.iter().any(|a| a == value).then_some(value)
}
