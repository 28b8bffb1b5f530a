//! Local filesystem state store.
//!
//! One pretty-printed JSON file per logical key. Writes go through a
//! temp file and rename so a concurrent reader never sees a truncated
//! file. The delivery log is plain text, append-only.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::{AckSnapshot, FirmwareMap};
use crate::store::StateStore;

const SUBSCRIBERS_FILE: &str = "users.json";
const ACK_FILE: &str = "latest_ack.json";
const FIRMWARE_FILE: &str = "latest_firmware.json";
const DELIVERY_LOG_FILE: &str = "telegram_log.txt";

/// Filesystem store rooted at a data directory.
#[derive(Clone)]
pub struct JsonStore {
    root_dir: PathBuf,
}

impl JsonStore {
    /// Create a new JsonStore rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    /// Get the full path for a relative key.
    fn path(&self, key: &str) -> PathBuf {
        self.root_dir.join(key)
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path(key);
        self.ensure_dir(&path).await?;

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    /// Write JSON data.
    pub async fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(value)?;
        self.write_bytes(key, &bytes).await
    }

    /// Read bytes, returning None if the file doesn't exist.
    async fn read_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// Read JSON data. A missing file is None; malformed content is an error.
    pub async fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.read_bytes(key).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl StateStore for JsonStore {
    async fn load_subscribers(&self) -> Result<Vec<i64>> {
        Ok(self.read_json(SUBSCRIBERS_FILE).await?.unwrap_or_default())
    }

    async fn add_subscriber(&self, chat_id: i64) -> Result<bool> {
        let mut subscribers = self.load_subscribers().await?;
        if subscribers.contains(&chat_id) {
            return Ok(false);
        }
        subscribers.push(chat_id);
        self.write_json(SUBSCRIBERS_FILE, &subscribers).await?;
        Ok(true)
    }

    async fn load_ack(&self) -> Result<Option<AckSnapshot>> {
        self.read_json(ACK_FILE).await
    }

    async fn save_ack(&self, snapshot: &AckSnapshot) -> Result<()> {
        self.write_json(ACK_FILE, snapshot).await
    }

    async fn load_firmware(&self) -> Result<FirmwareMap> {
        Ok(self.read_json(FIRMWARE_FILE).await?.unwrap_or_default())
    }

    async fn save_firmware(&self, versions: &FirmwareMap) -> Result<()> {
        self.write_json(FIRMWARE_FILE, versions).await
    }

    async fn append_delivery_log(&self, entry: &str) -> Result<()> {
        let path = self.path(DELIVERY_LOG_FILE);
        self.ensure_dir(&path).await?;

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        file.write_all(entry.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_load_subscribers_empty() {
        let tmp = TempDir::new().unwrap();
        let store = JsonStore::new(tmp.path());

        let subscribers = store.load_subscribers().await.unwrap();
        assert!(subscribers.is_empty());
    }

    #[tokio::test]
    async fn test_add_subscriber_dedup() {
        let tmp = TempDir::new().unwrap();
        let store = JsonStore::new(tmp.path());

        assert!(store.add_subscriber(42).await.unwrap());
        assert!(store.add_subscriber(7).await.unwrap());
        assert!(!store.add_subscriber(42).await.unwrap());

        let subscribers = store.load_subscribers().await.unwrap();
        assert_eq!(subscribers, vec![42, 7]);
    }

    #[tokio::test]
    async fn test_ack_snapshot_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let store = JsonStore::new(tmp.path());

        assert!(store.load_ack().await.unwrap().is_none());

        let snapshot = AckSnapshot {
            month: "June 2025".to_string(),
            names: vec!["Alice".to_string(), "Bob".to_string()],
        };
        store.save_ack(&snapshot).await.unwrap();

        let loaded = store.load_ack().await.unwrap().unwrap();
        assert_eq!(loaded, snapshot);
    }

    #[tokio::test]
    async fn test_firmware_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let store = JsonStore::new(tmp.path());

        assert!(store.load_firmware().await.unwrap().is_empty());

        let mut versions = FirmwareMap::new();
        versions.insert("macOS".to_string(), "14.6 (23G80)".to_string());
        store.save_firmware(&versions).await.unwrap();

        let loaded = store.load_firmware().await.unwrap();
        assert_eq!(loaded, versions);
    }

    #[tokio::test]
    async fn test_malformed_json_fails_loudly() {
        let tmp = TempDir::new().unwrap();
        let store = JsonStore::new(tmp.path());

        tokio::fs::write(tmp.path().join("users.json"), b"{not json")
            .await
            .unwrap();

        assert!(store.load_subscribers().await.is_err());
    }

    #[tokio::test]
    async fn test_saved_json_is_pretty_printed() {
        let tmp = TempDir::new().unwrap();
        let store = JsonStore::new(tmp.path());

        store.add_subscriber(42).await.unwrap();

        let content = tokio::fs::read_to_string(tmp.path().join("users.json"))
            .await
            .unwrap();
        assert!(content.contains('\n'));
    }

    #[tokio::test]
    async fn test_write_leaves_no_temp_file() {
        let tmp = TempDir::new().unwrap();
        let store = JsonStore::new(tmp.path());

        let snapshot = AckSnapshot {
            month: "May 2025".to_string(),
            names: vec![],
        };
        store.save_ack(&snapshot).await.unwrap();

        assert!(tmp.path().join("latest_ack.json").exists());
        assert!(!tmp.path().join("latest_ack.tmp").exists());
    }

    #[tokio::test]
    async fn test_delivery_log_appends() {
        let tmp = TempDir::new().unwrap();
        let store = JsonStore::new(tmp.path());

        store.append_delivery_log("first\n").await.unwrap();
        store.append_delivery_log("second\n").await.unwrap();

        let content = tokio::fs::read_to_string(tmp.path().join("telegram_log.txt"))
            .await
            .unwrap();
        assert_eq!(content, "first\nsecond\n");
    }
}
