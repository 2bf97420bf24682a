//! Daily job scheduler.
//!
//! Sleeps until the next local-time occurrence of the configured `HH:MM`,
//! runs the job, and repeats. Job failures are logged and do not stop the
//! loop; the next day's run still happens.

use std::future::Future;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::error::{ConfigError, Error};

/// Pause after each run so a fast job cannot observe the same fire time twice.
const POST_RUN_BUFFER: Duration = Duration::from_secs(60);

/// Next occurrence of `HH:MM` in the given timezone, after now.
pub fn next_fire(tz: Tz, at: &str) -> Result<DateTime<Utc>, ConfigError> {
    let (hour, minute) = parse_hhmm(at)?;
    let expr = format!("0 {minute} {hour} * * *");
    let schedule = cron::Schedule::from_str(&expr).map_err(|e| ConfigError::InvalidValue {
        key: "PLAYBOOK_TIME".to_string(),
        message: format!("invalid schedule {at:?}: {e}"),
    })?;
    schedule
        .upcoming(tz)
        .next()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| ConfigError::InvalidValue {
            key: "PLAYBOOK_TIME".to_string(),
            message: format!("schedule {at:?} has no upcoming occurrence"),
        })
}

fn parse_hhmm(at: &str) -> Result<(u32, u32), ConfigError> {
    let invalid = || ConfigError::InvalidValue {
        key: "PLAYBOOK_TIME".to_string(),
        message: format!("expected HH:MM, got {at:?}"),
    };
    let (h, m) = at.split_once(':').ok_or_else(invalid)?;
    let hour: u32 = h.parse().map_err(|_| invalid())?;
    let minute: u32 = m.parse().map_err(|_| invalid())?;
    if hour > 23 || minute > 59 {
        return Err(invalid());
    }
    Ok((hour, minute))
}

/// Run `job` once a day at local time `at` in timezone `tz`, forever.
pub async fn run_daily<F, Fut>(tz: Tz, at: &str, job: F) -> Result<(), Error>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<(), Error>>,
{
    loop {
        let fire_at = next_fire(tz, at)?;
        let wait = (fire_at - Utc::now()).to_std().unwrap_or(Duration::ZERO);
        tracing::info!(
            fire_at = %fire_at.with_timezone(&tz),
            wait_secs = wait.as_secs(),
            "daily job scheduled"
        );
        tokio::time::sleep(wait).await;

        if let Err(e) = job().await {
            tracing::error!("daily job failed: {e}");
        }
        tokio::time::sleep(POST_RUN_BUFFER).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn next_fire_is_in_the_future() {
        let next = next_fire(chrono_tz::Europe::London, "07:30").unwrap();
        assert!(next > Utc::now());
    }

    #[test]
    fn next_fire_lands_on_requested_local_time() {
        let tz = chrono_tz::Europe::London;
        let next = next_fire(tz, "07:30").unwrap().with_timezone(&tz);
        assert_eq!(next.hour(), 7);
        assert_eq!(next.minute(), 30);
    }

    #[test]
    fn next_fire_respects_timezone_offset() {
        let london = next_fire(chrono_tz::Europe::London, "12:00").unwrap();
        let tokyo = next_fire(chrono_tz::Asia::Tokyo, "12:00").unwrap();
        assert_ne!(london, tokyo);
    }

    #[test]
    fn malformed_times_are_rejected() {
        for bad in ["0730", "7", "24:00", "12:60", "ab:cd", ""] {
            assert!(next_fire(chrono_tz::UTC, bad).is_err(), "{bad:?} should be rejected");
        }
    }
}
