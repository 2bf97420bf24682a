//! Configuration, loaded from environment variables.

use std::path::PathBuf;
use std::str::FromStr;

use chrono_tz::Tz;
use secrecy::SecretString;

use crate::error::ConfigError;

const DEFAULT_REGIONS: &[&str] = &["UK/EU", "Middle East", "Africa", "Asia", "Americas"];
const DEFAULT_MODEL: &str = "sonar";
const DEFAULT_BASE_URL: &str = "https://api.perplexity.ai";
const DEFAULT_TZ: &str = "Europe/London";
const DEFAULT_POST_TIME: &str = "07:30";
const DEFAULT_LEADS_DIR: &str = "./app_data";

/// Lead capture configuration.
#[derive(Clone)]
pub struct OnboardingConfig {
    pub bot_token: SecretString,
    pub support_handle: String,
    pub help_email: String,
    pub affiliate_link: String,
    pub leads_dir: PathBuf,
    /// Platform choices offered in step 1. Empty skips the platform step.
    pub platforms: Vec<String>,
    pub regions: Vec<String>,
    pub intro_video_note: Option<PathBuf>,
    pub guide_pdf: Option<PathBuf>,
    pub guide_preview: Option<PathBuf>,
    pub setup_video: Option<PathBuf>,
    pub setup_video_preview: Option<PathBuf>,
    pub setup_video_link: Option<String>,
}

impl OnboardingConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            bot_token: SecretString::from(require("BOT_TOKEN", "Telegram bot token from @BotFather")?),
            support_handle: var_or("TELEGRAM_SUPPORT", "@educate2trade"),
            help_email: var_or("HELP_EMAIL", "support@example.com"),
            affiliate_link: require("AFFILIATE_LINK", "broker referral URL for the final step")?,
            leads_dir: PathBuf::from(var_or("LEADS_DIR", DEFAULT_LEADS_DIR)),
            platforms: list_var("PLATFORMS"),
            regions: {
                let regions = list_var("REGIONS");
                if regions.is_empty() {
                    DEFAULT_REGIONS.iter().map(|s| s.to_string()).collect()
                } else {
                    regions
                }
            },
            intro_video_note: path_var("CEO_VIDEO_NOTE_FILE"),
            guide_pdf: path_var("STARTUP_PDF_FILE"),
            guide_preview: path_var("STARTUP_PDF_PREVIEW"),
            setup_video: path_var("SETUP_VIDEO_FILE"),
            setup_video_preview: path_var("SETUP_VIDEO_PREVIEW"),
            setup_video_link: opt_var("SETUP_VIDEO_LINK"),
        })
    }
}

/// Daily playbook configuration.
#[derive(Clone)]
pub struct PlaybookConfig {
    pub enabled: bool,
    pub chat_id: String,
    pub tz: Tz,
    /// Local post time, `HH:MM`.
    pub post_time: String,
    pub dry_run: bool,
    pub run_once: bool,
    pub api_key: SecretString,
    pub model: String,
    pub base_url: String,
}

impl PlaybookConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let enabled = bool_var("PLAYBOOK_ENABLED", true);
        let config = Self {
            enabled,
            chat_id: if enabled {
                require("BROADCAST_CHAT_ID", "chat or channel id for the daily playbook")?
            } else {
                opt_var("BROADCAST_CHAT_ID").unwrap_or_default()
            },
            tz: parse_tz(&var_or("PLAYBOOK_TZ", DEFAULT_TZ))?,
            post_time: validate_post_time(var_or("PLAYBOOK_TIME", DEFAULT_POST_TIME))?,
            dry_run: bool_var("PLAYBOOK_DRY_RUN", false),
            run_once: bool_var("PLAYBOOK_RUN_ONCE", false),
            api_key: SecretString::from(if enabled {
                require("PERPLEXITY_API_KEY", "API key for the playbook LLM")?
            } else {
                opt_var("PERPLEXITY_API_KEY").unwrap_or_default()
            }),
            model: var_or("PERPLEXITY_MODEL", DEFAULT_MODEL),
            base_url: var_or("PERPLEXITY_BASE_URL", DEFAULT_BASE_URL),
        };
        Ok(config)
    }
}

fn require(key: &str, hint: &str) -> Result<String, ConfigError> {
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(ConfigError::MissingRequired { key: key.to_string(), hint: hint.to_string() }),
    }
}

fn opt_var(key: &str) -> Option<String> {
    std::env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn var_or(key: &str, default: &str) -> String {
    opt_var(key).unwrap_or_else(|| default.to_string())
}

fn path_var(key: &str) -> Option<PathBuf> {
    opt_var(key).map(PathBuf::from)
}

fn list_var(key: &str) -> Vec<String> {
    std::env::var(key)
        .unwrap_or_default()
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn bool_var(key: &str, default: bool) -> bool {
    match opt_var(key) {
        Some(v) => matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "on"),
        None => default,
    }
}

fn parse_tz(name: &str) -> Result<Tz, ConfigError> {
    Tz::from_str(name).map_err(|_| ConfigError::InvalidValue {
        key: "PLAYBOOK_TZ".to_string(),
        message: format!("unknown IANA timezone {name:?}"),
    })
}

fn validate_post_time(value: String) -> Result<String, ConfigError> {
    let ok = value
        .split_once(':')
        .and_then(|(h, m)| Some((h.parse::<u32>().ok()?, m.parse::<u32>().ok()?)))
        .is_some_and(|(h, m)| h < 24 && m < 60);
    if ok {
        Ok(value)
    } else {
        Err(ConfigError::InvalidValue {
            key: "PLAYBOOK_TIME".to_string(),
            message: format!("expected HH:MM, got {value:?}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tz_parses_iana_names() {
        assert_eq!(parse_tz("Europe/London").unwrap(), chrono_tz::Europe::London);
        assert_eq!(parse_tz("Asia/Dubai").unwrap(), chrono_tz::Asia::Dubai);
        assert!(parse_tz("Mars/Olympus").is_err());
    }

    #[test]
    fn post_time_validation() {
        assert!(validate_post_time("07:30".into()).is_ok());
        assert!(validate_post_time("23:59".into()).is_ok());
        for bad in ["24:00", "07:60", "0730", "seven"] {
            assert!(validate_post_time(bad.into()).is_err(), "{bad}");
        }
    }

    #[test]
    fn bool_var_falls_back_to_default() {
        assert!(bool_var("DESKBOT_TEST_UNSET_FLAG", true));
        assert!(!bool_var("DESKBOT_TEST_UNSET_FLAG", false));
    }
}
