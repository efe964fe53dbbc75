//! Persisted credential storage.
//!
//! The durable copy of the session lives in `<home>/credentials.json` with
//! restricted permissions (0600). Token values are never logged or displayed
//! in full. The session controller is the sole caller; nothing else reads or
//! writes the store, which keeps the in-memory session and the durable copy
//! from diverging.

use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::api::{ApiError, ApiResult};
use crate::config::paths;

/// Persisted key for the access token.
pub const KEY_ACCESS_TOKEN: &str = "access_token";
/// Persisted key for the refresh token.
pub const KEY_REFRESH_TOKEN: &str = "refresh_token";
/// Persisted key for the serialized last-known user record.
pub const KEY_USER: &str = "user";

/// Durable key-value storage for session credentials.
///
/// Every operation may fail (disk or permission errors). The controller
/// treats the three session keys as one logical unit and rolls a partial
/// write back to the previous complete set, or falls through to a full
/// logout; implementations only need per-key semantics.
#[allow(async_fn_in_trait)] // single-threaded callers, no Send bound needed
pub trait CredentialStore {
    /// Reads a value, `None` when absent.
    async fn get(&self, key: &str) -> ApiResult<Option<String>>;

    /// Writes a value.
    async fn set(&self, key: &str, value: &str) -> ApiResult<()>;

    /// Removes a value. Removing an absent key is not an error.
    async fn remove(&self, key: &str) -> ApiResult<()>;
}

/// File-backed store: one JSON document holding all keys.
///
/// Each operation loads, mutates, and rewrites the document, so a single
/// `set` is atomic with respect to the file's validity (the file never holds
/// half a value), while cross-key atomicity stays the controller's job.
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
        }
    }

    /// Store at the default location under the jobdeck home.
    pub fn at_default_path() -> Self {
        Self::new(paths::credentials_path())
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    fn load_doc(&self) -> ApiResult<HashMap<String, String>> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }
        let contents = fs::read_to_string(&self.path).map_err(|e| {
            ApiError::storage(format!(
                "failed to read credentials from {}: {e}",
                self.path.display()
            ))
        })?;
        serde_json::from_str(&contents).map_err(|e| {
            ApiError::storage(format!(
                "failed to parse credentials from {}: {e}",
                self.path.display()
            ))
        })
    }

    fn save_doc(&self, doc: &HashMap<String, String>) -> ApiResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                ApiError::storage(format!("failed to create directory {}: {e}", parent.display()))
            })?;
        }

        let contents = serde_json::to_string_pretty(doc)
            .map_err(|e| ApiError::storage(format!("failed to serialize credentials: {e}")))?;

        // Write with restricted permissions
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .mode(0o600)
                .open(&self.path)
                .map_err(|e| {
                    ApiError::storage(format!(
                        "failed to open {} for writing: {e}",
                        self.path.display()
                    ))
                })?;
            file.write_all(contents.as_bytes()).map_err(|e| {
                ApiError::storage(format!("failed to write to {}: {e}", self.path.display()))
            })?;
        }

        #[cfg(not(unix))]
        {
            fs::write(&self.path, contents).map_err(|e| {
                ApiError::storage(format!("failed to write to {}: {e}", self.path.display()))
            })?;
        }

        Ok(())
    }
}

impl CredentialStore for FileCredentialStore {
    async fn get(&self, key: &str) -> ApiResult<Option<String>> {
        Ok(self.load_doc()?.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> ApiResult<()> {
        let mut doc = self.load_doc()?;
        doc.insert(key.to_string(), value.to_string());
        self.save_doc(&doc)
    }

    async fn remove(&self, key: &str) -> ApiResult<()> {
        let mut doc = self.load_doc()?;
        if doc.remove(key).is_some() {
            self.save_doc(&doc)?;
        }
        Ok(())
    }
}

/// Write-failure plan for `MemoryCredentialStore`.
#[derive(Debug, Clone, Copy, Default)]
enum FailurePlan {
    #[default]
    Healthy,
    /// Every `set` from the given 0-based index on fails (broken disk).
    AllFrom(u32),
    /// Only the `set` at the given 0-based index fails (transient glitch).
    Only(u32),
}

/// In-memory store for tests and embedding, with injectable write failures.
#[derive(Default)]
pub struct MemoryCredentialStore {
    entries: Mutex<HashMap<String, String>>,
    plan: Mutex<FailurePlan>,
    sets_seen: Mutex<u32>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every `set` fail after the next `n` succeed.
    pub fn fail_sets_after(&self, n: u32) {
        *self.plan.lock().unwrap() = FailurePlan::AllFrom(n);
        *self.sets_seen.lock().unwrap() = 0;
    }

    /// Makes only the `(n+1)`-th upcoming `set` fail; later writes succeed.
    pub fn fail_single_set(&self, n: u32) {
        *self.plan.lock().unwrap() = FailurePlan::Only(n);
        *self.sets_seen.lock().unwrap() = 0;
    }

    /// Lifts any injected failure.
    pub fn heal(&self) {
        *self.plan.lock().unwrap() = FailurePlan::Healthy;
    }

    /// Snapshot of all stored entries.
    pub fn entries(&self) -> HashMap<String, String> {
        self.entries.lock().unwrap().clone()
    }
}

impl CredentialStore for MemoryCredentialStore {
    async fn get(&self, key: &str) -> ApiResult<Option<String>> {
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> ApiResult<()> {
        let index = {
            let mut seen = self.sets_seen.lock().unwrap();
            let index = *seen;
            *seen += 1;
            index
        };
        let fails = match *self.plan.lock().unwrap() {
            FailurePlan::Healthy => false,
            FailurePlan::AllFrom(n) => index >= n,
            FailurePlan::Only(n) => index == n,
        };
        if fails {
            return Err(ApiError::storage(format!("injected write failure for {key}")));
        }
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> ApiResult<()> {
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test: file store roundtrip through get/set/remove.
    #[tokio::test]
    async fn test_file_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("credentials.json"));

        assert_eq!(store.get(KEY_ACCESS_TOKEN).await.unwrap(), None);

        store.set(KEY_ACCESS_TOKEN, "tok-1").await.unwrap();
        store.set(KEY_REFRESH_TOKEN, "ref-1").await.unwrap();
        assert_eq!(
            store.get(KEY_ACCESS_TOKEN).await.unwrap().as_deref(),
            Some("tok-1")
        );

        store.remove(KEY_ACCESS_TOKEN).await.unwrap();
        assert_eq!(store.get(KEY_ACCESS_TOKEN).await.unwrap(), None);
        // Other keys are untouched.
        assert_eq!(
            store.get(KEY_REFRESH_TOKEN).await.unwrap().as_deref(),
            Some("ref-1")
        );
    }

    /// Test: removing an absent key is not an error and creates no file.
    #[tokio::test]
    async fn test_file_store_remove_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        let store = FileCredentialStore::new(path.clone());

        store.remove(KEY_USER).await.unwrap();
        assert!(!path.exists());
    }

    /// Test: a corrupt document surfaces a storage error, not a panic.
    #[tokio::test]
    async fn test_file_store_corrupt_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        std::fs::write(&path, "not json").unwrap();

        let store = FileCredentialStore::new(path);
        let err = store.get(KEY_ACCESS_TOKEN).await.unwrap_err();
        assert_eq!(err.kind, crate::api::ApiErrorKind::Storage);
    }

    /// Test: restricted permissions on the credentials file.
    #[cfg(unix)]
    #[tokio::test]
    async fn test_file_store_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        let store = FileCredentialStore::new(path.clone());
        store.set(KEY_ACCESS_TOKEN, "tok").await.unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    /// Test: injected failure trips after the allowed writes.
    #[tokio::test]
    async fn test_memory_store_injected_failure() {
        let store = MemoryCredentialStore::new();
        store.fail_sets_after(1);

        store.set(KEY_ACCESS_TOKEN, "tok").await.unwrap();
        let err = store.set(KEY_REFRESH_TOKEN, "ref").await.unwrap_err();
        assert_eq!(err.kind, crate::api::ApiErrorKind::Storage);
        // Still broken.
        assert!(store.set(KEY_REFRESH_TOKEN, "ref").await.is_err());

        store.heal();
        store.set(KEY_REFRESH_TOKEN, "ref").await.unwrap();
    }

    /// Test: single-shot failure hits exactly one write.
    #[tokio::test]
    async fn test_memory_store_single_failure() {
        let store = MemoryCredentialStore::new();
        store.fail_single_set(1);

        store.set("a", "1").await.unwrap();
        assert!(store.set("b", "2").await.is_err());
        store.set("c", "3").await.unwrap();
        assert_eq!(store.entries().len(), 2);
    }
}
