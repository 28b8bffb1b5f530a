//! Persistence abstractions for watcher state.
//!
//! One JSON file per logical key, plus an append-only delivery log:
//!
//! ```text
//! {data_dir}/
//! ├── users.json            # Subscriber chat ids
//! ├── latest_ack.json       # Last notified acknowledgement block
//! ├── latest_firmware.json  # Last notified firmware versions per OS
//! └── telegram_log.txt      # Append-only delivery log
//! ```

pub mod local;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{AckSnapshot, FirmwareMap};

// Re-export for convenience
pub use local::JsonStore;

/// Trait for watcher state persistence.
///
/// Loads return the empty/default shape when nothing has been saved yet.
/// Malformed persisted content is an error, not a silent default.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Load the subscriber chat ids.
    async fn load_subscribers(&self) -> Result<Vec<i64>>;

    /// Register a subscriber. Returns false if it was already present.
    async fn add_subscriber(&self, chat_id: i64) -> Result<bool>;

    /// Load the last notified acknowledgement snapshot.
    async fn load_ack(&self) -> Result<Option<AckSnapshot>>;

    /// Overwrite the acknowledgement snapshot.
    async fn save_ack(&self, snapshot: &AckSnapshot) -> Result<()>;

    /// Load the last notified firmware versions.
    async fn load_firmware(&self) -> Result<FirmwareMap>;

    /// Overwrite the firmware versions.
    async fn save_firmware(&self, versions: &FirmwareMap) -> Result<()>;

    /// Append one entry to the delivery log.
    async fn append_delivery_log(&self, entry: &str) -> Result<()>;
}
