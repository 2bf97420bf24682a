//! Deskbot: a Telegram lead-capture bot with a daily macro playbook broadcast.

pub mod bot;
pub mod channels;
pub mod config;
pub mod error;
pub mod onboarding;
pub mod playbook;
pub mod scheduler;
pub mod store;

pub use error::{Error, Result};
