//! Error types for deskbot.

/// Top-level error type for the bot.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required configuration: {key}. {hint}")]
    MissingRequired { key: String, hint: String },

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Telegram transport errors.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Telegram {method} failed: {reason}")]
    SendFailed { method: String, reason: String },

    #[error("Telegram {method} rejected: {description}")]
    Api { method: String, description: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// LLM provider errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Completion request failed with status {status}: {body}")]
    RequestFailed { status: u16, body: String },

    #[error("Invalid completion response: {reason}")]
    InvalidResponse { reason: String },

    #[error("Completion unusable after {attempts} attempts")]
    RetriesExhausted { attempts: usize },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Lead store errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type alias for the bot.
pub type Result<T> = std::result::Result<T, Error>;
