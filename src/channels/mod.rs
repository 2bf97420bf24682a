//! Messaging channels.
//!
//! Telegram is the only transport today. The keyboard types here are kept
//! channel-neutral so the conversation engine can describe replies without
//! knowing the Bot API wire format.

pub mod telegram;

/// A single inline keyboard button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub text: String,
    pub action: ButtonAction,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ButtonAction {
    /// Posts the string back as a callback query.
    Callback(String),
    /// Opens a URL.
    Url(String),
}

impl Button {
    pub fn callback(text: impl Into<String>, data: impl Into<String>) -> Self {
        Self { text: text.into(), action: ButtonAction::Callback(data.into()) }
    }

    pub fn url(text: impl Into<String>, url: impl Into<String>) -> Self {
        Self { text: text.into(), action: ButtonAction::Url(url.into()) }
    }
}

/// Rows of inline buttons.
pub type Keyboard = Vec<Vec<Button>>;
