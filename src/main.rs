use std::sync::Arc;

use deskbot::bot::Bot;
use deskbot::channels::telegram::TelegramClient;
use deskbot::config::{OnboardingConfig, PlaybookConfig};
use deskbot::onboarding::{InMemorySessionStore, OnboardingEngine};
use deskbot::playbook::{PerplexityClient, PlaybookJob};
use deskbot::scheduler;
use deskbot::store::CsvLeadStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let onboarding_cfg = OnboardingConfig::from_env()?;
    let playbook_cfg = PlaybookConfig::from_env()?;

    eprintln!("📊 Deskbot v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Leads dir: {}", onboarding_cfg.leads_dir.display());
    if playbook_cfg.enabled {
        eprintln!(
            "   Playbook: daily at {} {} -> chat {}{}",
            playbook_cfg.post_time,
            playbook_cfg.tz,
            playbook_cfg.chat_id,
            if playbook_cfg.dry_run { " (dry run)" } else { "" },
        );
    } else {
        eprintln!("   Playbook: disabled");
    }

    let telegram = Arc::new(TelegramClient::new(onboarding_cfg.bot_token.clone()));

    // ── Daily playbook ──────────────────────────────────────────────
    if playbook_cfg.enabled {
        let source = Arc::new(PerplexityClient::new(
            playbook_cfg.api_key.clone(),
            playbook_cfg.model.clone(),
            playbook_cfg.base_url.clone(),
            playbook_cfg.tz,
        )?);
        let job = Arc::new(PlaybookJob::new(
            source,
            playbook_cfg.tz,
            Arc::clone(&telegram),
            playbook_cfg.chat_id.clone(),
            playbook_cfg.dry_run,
        ));

        if playbook_cfg.run_once {
            job.run().await?;
            return Ok(());
        }

        let tz = playbook_cfg.tz;
        let post_time = playbook_cfg.post_time.clone();
        tokio::spawn(async move {
            let job = Arc::clone(&job);
            if let Err(e) = scheduler::run_daily(tz, &post_time, move || {
                let job = Arc::clone(&job);
                async move { job.run().await }
            })
            .await
            {
                tracing::error!("playbook scheduler stopped: {e}");
            }
        });
    }

    // ── Lead capture ────────────────────────────────────────────────
    let sessions = InMemorySessionStore::new();
    let leads = Arc::new(CsvLeadStore::new(onboarding_cfg.leads_dir.clone()));
    let engine = Arc::new(OnboardingEngine::new(sessions, leads, onboarding_cfg));

    Bot::new(telegram, engine).run().await;
    Ok(())
}
