//! Activity log — one row per analysis, per produced resume, and per applied
//! change, appended behind the `ActivityStore` trait.
//!
//! Rows keep the historical three-sheet shape (JD analysis, resume inventory,
//! change log) with 3-digit sequential ids per kind. The bundled store writes
//! JSONL; the spreadsheet itself is the caller's business.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    JdAnalysis,
    ResumeInventory,
    ChangeLog,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JdAnalysisRow {
    pub id: String,
    pub jd_title: String,
    pub company: String,
    pub analysis_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumeInventoryRow {
    pub id: String,
    pub resume_file_name: String,
    pub jd_title: String,
    pub match_percent: Option<f64>,
    pub change_count: usize,
    pub created_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeLogRow {
    pub id: String,
    pub original_resume_file_name: String,
    pub resume_file_name: String,
    pub was: String,
    pub new: String,
    pub section: String,
    pub jd_title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActivityRecord {
    JdAnalysis(JdAnalysisRow),
    ResumeInventory(ResumeInventoryRow),
    ChangeLog(ChangeLogRow),
}

impl ActivityRecord {
    pub fn kind(&self) -> RecordKind {
        match self {
            ActivityRecord::JdAnalysis(_) => RecordKind::JdAnalysis,
            ActivityRecord::ResumeInventory(_) => RecordKind::ResumeInventory,
            ActivityRecord::ChangeLog(_) => RecordKind::ChangeLog,
        }
    }
}

/// 3-digit zero-padded sequential row id: 1 -> "001".
pub fn format_row_id(n: u64) -> String {
    format!("{n:03}")
}

/// Composes the JD title logged everywhere: first two company words plus the
/// job title, capped at 50 characters (title itself capped at 40).
pub fn jd_title(company: &str, job_title: Option<&str>) -> String {
    let company_part = crate::tailoring::naming::company_short(company);
    let title_part: String = job_title
        .unwrap_or("UnknownTitle")
        .chars()
        .take(40)
        .collect();
    format!("{company_part}_{title_part}").chars().take(50).collect()
}

/// Where activity rows go. Swap the implementation to change the log format
/// without touching the pipeline.
#[async_trait]
pub trait ActivityStore: Send + Sync {
    /// Hands out the next sequential id for a row kind.
    async fn next_id(&self, kind: RecordKind) -> Result<String>;
    async fn append(&self, record: ActivityRecord) -> Result<()>;
}

/// Append-only JSONL store. Counters are primed from the existing file at
/// startup so ids keep increasing across restarts.
pub struct JsonlStore {
    path: PathBuf,
    counters: Mutex<HashMap<RecordKind, u64>>,
}

impl JsonlStore {
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let mut counters: HashMap<RecordKind, u64> = HashMap::new();

        match tokio::fs::read_to_string(&path).await {
            Ok(existing) => {
                for line in existing.lines().filter(|l| !l.trim().is_empty()) {
                    match serde_json::from_str::<ActivityRecord>(line) {
                        Ok(record) => *counters.entry(record.kind()).or_insert(0) += 1,
                        Err(err) => {
                            tracing::warn!("skipping unreadable activity row: {err}");
                        }
                    }
                }
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("failed to read activity log {}", path.display()))
            }
        }

        Ok(Self {
            path,
            counters: Mutex::new(counters),
        })
    }
}

#[async_trait]
impl ActivityStore for JsonlStore {
    async fn next_id(&self, kind: RecordKind) -> Result<String> {
        let mut counters = self.counters.lock().await;
        let counter = counters.entry(kind).or_insert(0);
        *counter += 1;
        Ok(format_row_id(*counter))
    }

    async fn append(&self, record: ActivityRecord) -> Result<()> {
        let mut line = serde_json::to_string(&record)?;
        line.push('\n');

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.ok();
        }
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .with_context(|| format!("failed to open activity log {}", self.path.display()))?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_row(id: &str) -> ActivityRecord {
        ActivityRecord::JdAnalysis(JdAnalysisRow {
            id: id.to_string(),
            jd_title: "Acme_Corp_Data Engineer".to_string(),
            company: "Acme Corp".to_string(),
            analysis_date: NaiveDate::from_ymd_opt(2025, 3, 14).unwrap(),
        })
    }

    #[test]
    fn test_format_row_id_pads_to_three_digits() {
        assert_eq!(format_row_id(1), "001");
        assert_eq!(format_row_id(42), "042");
        assert_eq!(format_row_id(1234), "1234");
    }

    #[test]
    fn test_jd_title_composition_and_caps() {
        assert_eq!(
            jd_title("Acme Rocket Skates", Some("Data Engineer")),
            "Acme_Rocket_Data Engineer"
        );
        assert_eq!(jd_title("Initech", None), "Initech_UnknownTitle");
        // Title capped at 40: "Acme_" + 40 x's.
        let long_title = jd_title("Acme", Some(&"x".repeat(100)));
        assert_eq!(long_title.chars().count(), 45);
        // Long company plus long title hits the overall 50-char cap.
        let long_both = jd_title("Consolidated Amalgamated", Some(&"x".repeat(100)));
        assert_eq!(long_both.chars().count(), 50);
    }

    #[tokio::test]
    async fn test_ids_are_sequential_per_kind() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonlStore::open(dir.path().join("log.jsonl")).await.unwrap();

        assert_eq!(store.next_id(RecordKind::JdAnalysis).await.unwrap(), "001");
        assert_eq!(store.next_id(RecordKind::JdAnalysis).await.unwrap(), "002");
        // Independent counter per kind.
        assert_eq!(store.next_id(RecordKind::ChangeLog).await.unwrap(), "001");
    }

    #[tokio::test]
    async fn test_counters_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.jsonl");

        let store = JsonlStore::open(&path).await.unwrap();
        let id = store.next_id(RecordKind::JdAnalysis).await.unwrap();
        store.append(sample_row(&id)).await.unwrap();

        let reopened = JsonlStore::open(&path).await.unwrap();
        assert_eq!(reopened.next_id(RecordKind::JdAnalysis).await.unwrap(), "002");
    }

    #[tokio::test]
    async fn test_appended_rows_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.jsonl");

        let store = JsonlStore::open(&path).await.unwrap();
        store.append(sample_row("001")).await.unwrap();

        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        let record: ActivityRecord = serde_json::from_str(contents.trim()).unwrap();
        match record {
            ActivityRecord::JdAnalysis(row) => assert_eq!(row.company, "Acme Corp"),
            other => panic!("unexpected record: {other:?}"),
        }
    }
}
