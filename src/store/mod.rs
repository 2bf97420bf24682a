//! Persistence layer.

pub mod leads;

pub use leads::{CsvLeadStore, LeadStore};
