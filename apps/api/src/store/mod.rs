//! Local persisted state: the active provider configuration and the capped result history.
//!
//! Two JSON files in the data directory. No schema versioning: a missing or malformed
//! file is logged and replaced by defaults, never surfaced as an error.

pub mod handlers;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::audit::models::{AnalysisResult, ComparisonResult};
use crate::llm_client::provider::ProviderConfig;

pub const MAX_HISTORY: usize = 10;
const SETTINGS_FILE: &str = "settings.json";
const HISTORY_FILE: &str = "history.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HistoryResult {
    Analysis(AnalysisResult),
    Comparison(ComparisonResult),
}

/// A saved result plus the inputs needed to re-display it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub result: HistoryResult,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resume_content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_description: Option<String>,
}

impl HistoryEntry {
    pub fn new(
        result: HistoryResult,
        resume_content: Option<String>,
        job_description: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            result,
            resume_content,
            job_description,
        }
    }
}

/// Newest first; anything past `MAX_HISTORY` is evicted from the old end.
pub fn insert_capped(mut history: Vec<HistoryEntry>, entry: HistoryEntry) -> Vec<HistoryEntry> {
    history.insert(0, entry);
    history.truncate(MAX_HISTORY);
    history
}

/// File-backed store passed explicitly to whoever needs settings or history.
#[derive(Debug)]
pub struct LocalStore {
    dir: PathBuf,
    /// Serializes read-modify-write cycles on the history file.
    write_lock: Mutex<()>,
}

impl LocalStore {
    pub async fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create data directory {}", dir.display()))?;
        info!("Local store at {}", dir.display());
        Ok(Self {
            dir,
            write_lock: Mutex::new(()),
        })
    }

    pub async fn load_settings(&self) -> ProviderConfig {
        self.read_json(SETTINGS_FILE).await.unwrap_or_default()
    }

    pub async fn save_settings(&self, config: &ProviderConfig) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.write_json(SETTINGS_FILE, config).await
    }

    pub async fn load_history(&self) -> Vec<HistoryEntry> {
        let mut history: Vec<HistoryEntry> = self.read_json(HISTORY_FILE).await.unwrap_or_default();
        history.truncate(MAX_HISTORY);
        history
    }

    /// Saves `entry` as the newest item and returns the updated list.
    pub async fn push_history(&self, entry: HistoryEntry) -> Result<Vec<HistoryEntry>> {
        let _guard = self.write_lock.lock().await;
        let history = insert_capped(self.load_history().await, entry);
        self.write_json(HISTORY_FILE, &history).await?;
        Ok(history)
    }

    /// Patches one entry in place. `None` if no entry has that id.
    pub async fn update_entry<F>(&self, id: Uuid, patch: F) -> Result<Option<HistoryEntry>>
    where
        F: FnOnce(&mut HistoryEntry),
    {
        let _guard = self.write_lock.lock().await;
        let mut history = self.load_history().await;
        let Some(entry) = history.iter_mut().find(|e| e.id == id) else {
            return Ok(None);
        };
        patch(entry);
        let updated = entry.clone();
        self.write_json(HISTORY_FILE, &history).await?;
        Ok(Some(updated))
    }

    pub async fn clear_history(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        match tokio::fs::remove_file(self.dir.join(HISTORY_FILE)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).context("Failed to clear history"),
        }
    }

    async fn read_json<T: DeserializeOwned>(&self, file: &str) -> Option<T> {
        let path = self.dir.join(file);
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("{} not found, using defaults", path.display());
                return None;
            }
            Err(e) => {
                warn!("Could not read {}: {e}", path.display());
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Ignoring malformed {}: {e}", path.display());
                None
            }
        }
    }

    /// Writes through a temp file so a crash never leaves half a document behind.
    async fn write_json<T: Serialize>(&self, file: &str, value: &T) -> Result<()> {
        let path = self.dir.join(file);
        let tmp = self.dir.join(format!("{file}.tmp"));
        let json = serde_json::to_vec_pretty(value)?;
        tokio::fs::write(&tmp, json)
            .await
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .with_context(|| format!("Failed to replace {}", path.display()))?;
        Ok(())
    }
}
