//! Daily macro playbook pipeline.
//!
//! The pipeline is a chain of small, independently testable stages:
//! [`provider`] fetches freeform text from the LLM, [`parse`] normalizes it
//! into typed lines, [`render`] produces the MarkdownV2 document, [`chunk`]
//! splits it under the Telegram message limit, and [`job`] wires the stages
//! to the broadcast chat.

pub mod chunk;
pub mod job;
pub mod markup;
pub mod parse;
pub mod provider;
pub mod render;

pub use job::PlaybookJob;
pub use provider::{PerplexityClient, PlaybookSource};
