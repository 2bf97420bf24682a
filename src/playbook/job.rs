//! Daily playbook job: fetch, normalize, render, chunk, broadcast.

use std::sync::Arc;

use chrono_tz::Tz;

use crate::channels::telegram::TelegramClient;
use crate::error::Result;
use crate::playbook::chunk::{split_chunks, CHUNK_LIMIT};
use crate::playbook::parse::PlaybookParser;
use crate::playbook::provider::PlaybookSource;
use crate::playbook::render::Renderer;

/// One scheduled playbook run, from LLM fetch to Telegram broadcast.
pub struct PlaybookJob {
    source: Arc<dyn PlaybookSource>,
    parser: PlaybookParser,
    renderer: Renderer,
    telegram: Arc<TelegramClient>,
    chat_id: String,
    dry_run: bool,
}

impl PlaybookJob {
    pub fn new(
        source: Arc<dyn PlaybookSource>,
        tz: Tz,
        telegram: Arc<TelegramClient>,
        chat_id: String,
        dry_run: bool,
    ) -> Self {
        Self {
            source,
            parser: PlaybookParser::new(),
            renderer: Renderer::new(tz),
            telegram,
            chat_id,
            dry_run,
        }
    }

    /// Fetch today's playbook and post it to the broadcast chat. In dry-run
    /// mode the chunks go to stdout instead of Telegram.
    pub async fn run(&self) -> Result<()> {
        let raw = self.source.fetch_playbook().await?;
        tracing::debug!(len = raw.len(), "fetched raw playbook text");

        let chunks = self.compose(&raw);
        tracing::info!(chunks = chunks.len(), dry_run = self.dry_run, "posting daily playbook");

        for chunk in &chunks {
            if self.dry_run {
                println!("{chunk}\n");
            } else {
                self.telegram.send_markdown(&self.chat_id, chunk).await?;
            }
        }
        Ok(())
    }

    /// Pure composition step: raw LLM text to send-ready message chunks.
    fn compose(&self, raw: &str) -> Vec<String> {
        let lines = self.parser.parse(raw);
        let document = self.renderer.render(&lines);
        split_chunks(&document, CHUNK_LIMIT)
    }
}
