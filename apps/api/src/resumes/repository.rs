//! Resume persistence. Records live in the caller's (already namespaced)
//! key-value store; the PDF and PNG they reference live in the file store.

use std::collections::HashSet;

use tracing::{info, warn};
use uuid::Uuid;

use crate::platform::{FileStore, KvStore, PlatformError};
use crate::resumes::models::{resume_key, ResumeRecord, RESUME_KEY_PATTERN};

pub struct ResumeRepository<'a> {
    kv: &'a dyn KvStore,
    files: &'a dyn FileStore,
}

impl<'a> ResumeRepository<'a> {
    pub fn new(kv: &'a dyn KvStore, files: &'a dyn FileStore) -> Self {
        Self { kv, files }
    }

    pub async fn save(&self, record: &ResumeRecord) -> Result<(), PlatformError> {
        self.kv
            .set(&resume_key(record.id), &serde_json::to_string(record)?)
            .await
    }

    pub async fn load(&self, id: Uuid) -> Result<Option<ResumeRecord>, PlatformError> {
        match self.kv.get(&resume_key(id)).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Every readable record, newest first. Entries that fail to parse or do
    /// not reference both files are skipped.
    pub async fn list(&self) -> Result<Vec<ResumeRecord>, PlatformError> {
        let items = self.kv.list(RESUME_KEY_PATTERN).await?;
        let mut records: Vec<ResumeRecord> = items
            .into_iter()
            .filter_map(
                |item| match serde_json::from_str::<ResumeRecord>(&item.value) {
                    Ok(record) if record.has_files() => Some(record),
                    Ok(_) => {
                        warn!("Skipping resume entry {} with missing file paths", item.key);
                        None
                    }
                    Err(e) => {
                        warn!("Skipping unreadable resume entry {}: {e}", item.key);
                        None
                    }
                },
            )
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        info!("Loaded {} resumes", records.len());
        Ok(records)
    }

    /// Removes the resume file, the image file and the record.
    /// Returns `false` when no record exists.
    pub async fn delete(&self, id: Uuid) -> Result<bool, PlatformError> {
        let Some(record) = self.load(id).await? else {
            return Ok(false);
        };
        self.delete_files(&record).await?;
        self.kv.delete(&resume_key(id)).await?;
        info!("Deleted resume {id}");
        Ok(true)
    }

    /// Deletes every entry in the namespace, and the files of every resume
    /// record among them. Returns the number of entries removed.
    ///
    /// A record whose files cannot all be deleted keeps its entry so a later
    /// wipe can retry it. The rest of the wipe still runs; the first file
    /// error is returned once it has.
    pub async fn wipe(&self) -> Result<usize, PlatformError> {
        let mut retained = HashSet::new();
        let mut first_error = None;
        for item in self.kv.list(RESUME_KEY_PATTERN).await? {
            let Ok(record) = serde_json::from_str::<ResumeRecord>(&item.value) else {
                continue;
            };
            if let Err(e) = self.delete_files(&record).await {
                warn!("Keeping resume {} after file deletion failed: {e}", record.id);
                retained.insert(item.key);
                first_error.get_or_insert(e);
            }
        }

        let mut removed = 0;
        for key in self.kv.keys("*").await? {
            if retained.contains(&key) {
                continue;
            }
            if self.kv.delete(&key).await? {
                removed += 1;
            }
        }

        match first_error {
            Some(e) => {
                warn!(
                    "Wipe incomplete: removed {removed} entries, kept {} resumes",
                    retained.len()
                );
                Err(e)
            }
            None => {
                info!("Wiped {removed} entries");
                Ok(removed)
            }
        }
    }

    /// Attempts both files even if the first fails; returns the first error.
    async fn delete_files(&self, record: &ResumeRecord) -> Result<(), PlatformError> {
        let mut result = Ok(());
        for path in [&record.resume_path, &record.image_path] {
            if path.is_empty() {
                continue;
            }
            match self.files.delete(path).await {
                Ok(()) | Err(PlatformError::NotFound(_)) => {}
                Err(e) => {
                    if result.is_ok() {
                        result = Err(e);
                    }
                }
            }
        }
        result
    }
}
