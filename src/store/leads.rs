//! Lead persistence.
//!
//! Leads append to a single `leads.csv` under the configured data directory.
//! The header row is written when the file is first created. Writes are
//! serialized through a mutex so concurrent confirmations cannot interleave
//! rows.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use crate::error::StoreError;
use crate::onboarding::session::LeadFields;

const LEADS_FILE: &str = "leads.csv";
const HEADER: &[&str] = &[
    "timestamp",
    "telegram_id",
    "telegram_username",
    "platform",
    "email",
    "phone",
    "region",
];

/// Store for confirmed leads.
#[async_trait]
pub trait LeadStore: Send + Sync {
    /// Append one lead row. Returns the path written to.
    async fn append(
        &self,
        user_id: i64,
        username: Option<&str>,
        fields: &LeadFields,
    ) -> Result<PathBuf, StoreError>;
}

/// CSV-file-backed lead store.
pub struct CsvLeadStore {
    base_dir: PathBuf,
    write_lock: Mutex<()>,
}

impl CsvLeadStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self { base_dir: base_dir.into(), write_lock: Mutex::new(()) }
    }

    fn leads_path(&self) -> PathBuf {
        self.base_dir.join(LEADS_FILE)
    }

    fn write_row(
        path: &Path,
        user_id: i64,
        username: Option<&str>,
        fields: &LeadFields,
    ) -> Result<(), StoreError> {
        let is_new = !path.exists();
        let file = std::fs::OpenOptions::new().create(true).append(true).open(path)?;
        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);

        if is_new {
            writer.write_record(HEADER)?;
        }
        writer.write_record([
            Utc::now().format("%Y-%m-%dT%H:%M:%S").to_string().as_str(),
            &user_id.to_string(),
            username.unwrap_or(""),
            fields.platform.as_deref().unwrap_or(""),
            fields.email.as_deref().unwrap_or(""),
            fields.phone.as_deref().unwrap_or(""),
            fields.region.as_deref().unwrap_or(""),
        ])?;
        writer.flush()?;
        Ok(())
    }
}

#[async_trait]
impl LeadStore for CsvLeadStore {
    async fn append(
        &self,
        user_id: i64,
        username: Option<&str>,
        fields: &LeadFields,
    ) -> Result<PathBuf, StoreError> {
        let _guard = self.write_lock.lock().await;
        std::fs::create_dir_all(&self.base_dir)?;
        let path = self.leads_path();
        Self::write_row(&path, user_id, username, fields)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields() -> LeadFields {
        LeadFields {
            platform: Some("MT5".into()),
            email: Some("a@b.co".into()),
            phone: Some("+447700900000".into()),
            region: Some("UK/EU".into()),
        }
    }

    #[tokio::test]
    async fn first_append_writes_header_then_row() {
        let dir = tempfile::tempdir().unwrap();
        let store = CsvLeadStore::new(dir.path());
        let path = store.append(42, Some("alice"), &fields()).await.unwrap();

        let content = std::fs::read_to_string(path).unwrap();
        let mut lines = content.lines();
        assert_eq!(
            lines.next().unwrap(),
            "timestamp,telegram_id,telegram_username,platform,email,phone,region"
        );
        let row = lines.next().unwrap();
        assert!(row.contains(",42,alice,MT5,a@b.co,+447700900000,UK/EU"));
        assert!(lines.next().is_none());
    }

    #[tokio::test]
    async fn later_appends_skip_the_header() {
        let dir = tempfile::tempdir().unwrap();
        let store = CsvLeadStore::new(dir.path());
        store.append(1, Some("a"), &fields()).await.unwrap();
        store.append(2, None, &fields()).await.unwrap();

        let content = std::fs::read_to_string(dir.path().join("leads.csv")).unwrap();
        assert_eq!(content.lines().count(), 3);
        assert_eq!(content.matches("timestamp").count(), 1);
    }

    #[tokio::test]
    async fn missing_username_writes_empty_cell() {
        let dir = tempfile::tempdir().unwrap();
        let store = CsvLeadStore::new(dir.path());
        store.append(7, None, &fields()).await.unwrap();

        let content = std::fs::read_to_string(dir.path().join("leads.csv")).unwrap();
        assert!(content.lines().nth(1).unwrap().contains(",7,,MT5,"));
    }

    #[tokio::test]
    async fn data_dir_is_created_on_demand() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("data").join("leads");
        let store = CsvLeadStore::new(&nested);
        store.append(1, None, &fields()).await.unwrap();
        assert!(nested.join("leads.csv").exists());
    }
}
