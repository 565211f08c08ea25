//! File-backed job store

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::application::errors::StoreError;
use crate::domain::{JobSummary, ScanJob};

/// Durable keyed storage for scan jobs. The store is the single source of
/// truth consulted by the document builder and the statistics endpoint.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Persist a job, replacing any previous record for its id
    async fn put(&self, job: &ScanJob) -> Result<(), StoreError>;

    /// Load a job by id
    async fn get(&self, id: Uuid) -> Result<Option<ScanJob>, StoreError>;

    /// Summaries of every stored job, oldest first
    async fn list(&self) -> Result<Vec<JobSummary>, StoreError>;
}

/// Job store keeping one JSON document per job id.
///
/// Writes go through a temp-file + rename so readers never observe a torn
/// document, and a per-id lock map serializes writers for the same job.
pub struct FileJobStore {
    directory: PathBuf,
    locks: Arc<Mutex<HashMap<Uuid, Arc<Mutex<()>>>>>,
}

impl FileJobStore {
    pub fn new(directory: PathBuf) -> Self {
        Self {
            directory,
            locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn job_path(&self, id: Uuid) -> PathBuf {
        self.directory.join(format!("{}.json", id))
    }

    fn temp_path(&self, id: Uuid) -> PathBuf {
        self.directory.join(format!("{}.tmp", id))
    }

    async fn lock_for(&self, id: Uuid) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry(id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    async fn ensure_directory(&self) -> Result<(), StoreError> {
        if !self.directory.exists() {
            fs::create_dir_all(&self.directory).await?;
            debug!(directory = %self.directory.display(), "created job store directory");
        }
        Ok(())
    }
}

#[async_trait]
impl JobStore for FileJobStore {
    async fn put(&self, job: &ScanJob) -> Result<(), StoreError> {
        self.ensure_directory().await?;

        let content = serde_json::to_string_pretty(job)?;
        let lock = self.lock_for(job.id).await;
        let _guard = lock.lock().await;

        let temp_path = self.temp_path(job.id);
        fs::write(&temp_path, content).await?;
        fs::rename(&temp_path, self.job_path(job.id)).await?;

        debug!(job_id = %job.id, state = %job.state, "persisted job");
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<ScanJob>, StoreError> {
        let path = self.job_path(id);
        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::Io(e)),
        };

        let job = serde_json::from_str(&content).map_err(|e| {
            warn!(job_id = %id, error = %e, "corrupt job record");
            StoreError::Corrupt {
                path: path.display().to_string(),
            }
        })?;
        Ok(Some(job))
    }

    async fn list(&self) -> Result<Vec<JobSummary>, StoreError> {
        if !self.directory.exists() {
            return Ok(Vec::new());
        }

        let mut summaries = Vec::new();
        let mut entries = fs::read_dir(&self.directory).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            match fs::read_to_string(&path).await {
                Ok(content) => match serde_json::from_str::<ScanJob>(&content) {
                    Ok(job) => summaries.push(job.summary()),
                    Err(e) => {
                        // A record that fails to decode is skipped rather
                        // than failing the whole listing
                        warn!(path = %path.display(), error = %e, "skipping unreadable job record");
                    }
                },
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping unreadable job file");
                }
            }
        }

        summaries.sort_by_key(|summary| summary.created_at);
        Ok(summaries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{JobState, Locale, ProbeKind, ScanTarget};
    use tempfile::TempDir;

    fn job(url: &str) -> ScanJob {
        ScanJob::new(
            ScanTarget::parse(url).unwrap(),
            &[ProbeKind::Ssl, ProbeKind::Headers],
            Locale::Ru,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_put_then_get_round_trips() {
        let dir = TempDir::new().unwrap();
        let store = FileJobStore::new(dir.path().to_path_buf());

        let original = job("https://example.com");
        store.put(&original).await.unwrap();

        let loaded = store.get(original.id).await.unwrap().unwrap();
        assert_eq!(loaded.id, original.id);
        assert_eq!(loaded.target, original.target);
        assert_eq!(loaded.requested, original.requested);
        assert_eq!(loaded.state, JobState::Pending);
    }

    #[tokio::test]
    async fn test_get_unknown_id_returns_none() {
        let dir = TempDir::new().unwrap();
        let store = FileJobStore::new(dir.path().to_path_buf());
        assert!(store.get(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_replaces_previous_record() {
        let dir = TempDir::new().unwrap();
        let store = FileJobStore::new(dir.path().to_path_buf());

        let mut job = job("https://example.com");
        store.put(&job).await.unwrap();
        job.start();
        store.put(&job).await.unwrap();

        let loaded = store.get(job.id).await.unwrap().unwrap();
        assert_eq!(loaded.state, JobState::Running);
    }

    #[tokio::test]
    async fn test_list_returns_all_jobs_oldest_first() {
        let dir = TempDir::new().unwrap();
        let store = FileJobStore::new(dir.path().to_path_buf());

        let first = job("https://one.example.com");
        let second = job("https://two.example.com");
        store.put(&first).await.unwrap();
        store.put(&second).await.unwrap();

        let summaries = store.list().await.unwrap();
        assert_eq!(summaries.len(), 2);
        assert!(summaries[0].created_at <= summaries[1].created_at);
    }

    #[tokio::test]
    async fn test_list_skips_corrupt_records() {
        let dir = TempDir::new().unwrap();
        let store = FileJobStore::new(dir.path().to_path_buf());

        store.put(&job("https://example.com")).await.unwrap();
        tokio::fs::write(dir.path().join("broken.json"), "{not json")
            .await
            .unwrap();

        let summaries = store.list().await.unwrap();
        assert_eq!(summaries.len(), 1);
    }

    #[tokio::test]
    async fn test_list_on_missing_directory_is_empty() {
        let store = FileJobStore::new(PathBuf::from("/nonexistent/siteaudit-test-store"));
        assert!(store.list().await.unwrap().is_empty());
    }
}
