//! Outbound message delivery.
//!
//! The [`Notifier`] owns chunking, the inter-chunk pause, delivery
//! logging, and subscriber fan-out; the [`Transport`] trait hides the
//! actual messaging API so tests can swap in a recorder.

pub mod telegram;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::config::NotifyConfig;
use crate::error::Result;
use crate::store::StateStore;

pub use telegram::TelegramTransport;

/// What the messaging API answered for one chunk.
#[derive(Debug, Clone)]
pub struct DeliveryReceipt {
    /// Transport status code
    pub status: u16,
    /// Raw response body
    pub body: String,
}

/// One-shot delivery of a single message chunk to a recipient.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Deliver `text` to `chat_id`. A non-success status is still a
    /// receipt; `Err` means the transport itself failed.
    async fn deliver(&self, chat_id: i64, text: &str) -> Result<DeliveryReceipt>;
}

/// Split a message into transport-sized chunks.
///
/// Naive fixed-length split on character boundaries, no regard for
/// semantic boundaries. A message of length L yields `ceil(L / max_len)`
/// ordered chunks whose concatenation reconstructs the message.
pub fn split_chunks(message: &str, max_len: usize) -> Vec<String> {
    let chars: Vec<char> = message.chars().collect();
    chars
        .chunks(max_len.max(1))
        .map(|chunk| chunk.iter().collect())
        .collect()
}

/// Delivers messages to subscribers and logs every attempt.
pub struct Notifier<'a> {
    transport: &'a dyn Transport,
    store: &'a dyn StateStore,
    max_chunk_len: usize,
    chunk_delay: Duration,
}

impl<'a> Notifier<'a> {
    pub fn new(
        transport: &'a dyn Transport,
        store: &'a dyn StateStore,
        config: &NotifyConfig,
    ) -> Self {
        Self {
            transport,
            store,
            max_chunk_len: config.max_chunk_len,
            chunk_delay: Duration::from_millis(config.chunk_delay_ms),
        }
    }

    /// Send a message to one recipient, chunk by chunk.
    ///
    /// Chunks go out in order with a short pause between chunks of the
    /// same recipient. Every attempt lands in the delivery log; a failed
    /// chunk is logged and the remaining chunks are still attempted.
    pub async fn send_to(&self, chat_id: i64, message: &str) -> Result<()> {
        for (index, chunk) in split_chunks(message, self.max_chunk_len).iter().enumerate() {
            if index > 0 {
                tokio::time::sleep(self.chunk_delay).await;
            }

            let outcome = self.transport.deliver(chat_id, chunk).await;
            let entry = format_log_entry(Utc::now(), chat_id, &outcome);
            self.store.append_delivery_log(&entry).await?;

            if let Err(e) = outcome {
                log::warn!("Delivery failed for chat {}: {}", chat_id, e);
            }
        }
        Ok(())
    }

    /// Send a message to every subscriber.
    ///
    /// A failure for one recipient never prevents the rest.
    pub async fn broadcast(&self, message: &str) -> Result<()> {
        let subscribers = self.store.load_subscribers().await?;
        log::info!("Notifying {} subscribers", subscribers.len());

        for chat_id in subscribers {
            if let Err(e) = self.send_to(chat_id, message).await {
                log::warn!("Notification failed for chat {}: {}", chat_id, e);
            }
        }
        Ok(())
    }
}

/// Render one delivery-log entry.
fn format_log_entry(
    timestamp: DateTime<Utc>,
    chat_id: i64,
    outcome: &Result<DeliveryReceipt>,
) -> String {
    let mut entry = format!(
        "[{}] ChatID: {}\n",
        timestamp.format("%Y-%m-%d %H:%M:%S"),
        chat_id
    );
    match outcome {
        Ok(receipt) => {
            entry.push_str(&format!("HTTP {}\nResponse: {}\n", receipt.status, receipt.body));
        }
        Err(e) => {
            entry.push_str(&format!("Error: {e}\n"));
        }
    }
    entry.push_str("-----------------------------\n");
    entry
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_split_chunk_count() {
        let message = "a".repeat(10_500);
        let chunks = split_chunks(&message, 4000);
        assert_eq!(chunks.len(), 3); // ceil(10500 / 4000)
        assert_eq!(chunks[0].len(), 4000);
        assert_eq!(chunks[2].len(), 2500);
    }

    #[test]
    fn test_split_reconstructs_message() {
        let message = "Hello, world! ".repeat(700);
        let chunks = split_chunks(&message, 4000);
        assert_eq!(chunks.concat(), message);
    }

    #[test]
    fn test_split_short_message_is_single_chunk() {
        let chunks = split_chunks("short", 4000);
        assert_eq!(chunks, vec!["short"]);
    }

    #[test]
    fn test_split_empty_message_has_no_chunks() {
        assert!(split_chunks("", 4000).is_empty());
    }

    #[test]
    fn test_split_respects_char_boundaries() {
        let message = "ü".repeat(5);
        let chunks = split_chunks(&message, 2);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks.concat(), message);
    }

    #[test]
    fn test_log_entry_success() {
        let ts = Utc.with_ymd_and_hms(2025, 8, 7, 12, 0, 0).unwrap();
        let outcome = Ok(DeliveryReceipt {
            status: 200,
            body: r#"{"ok":true}"#.to_string(),
        });
        let entry = format_log_entry(ts, 42, &outcome);
        assert!(entry.starts_with("[2025-08-07 12:00:00] ChatID: 42\n"));
        assert!(entry.contains("HTTP 200\n"));
        assert!(entry.contains(r#"Response: {"ok":true}"#));
        assert!(entry.ends_with("-----------------------------\n"));
    }

    #[test]
    fn test_log_entry_failure() {
        let ts = Utc.with_ymd_and_hms(2025, 8, 7, 12, 0, 0).unwrap();
        let outcome = Err(crate::error::AppError::delivery(42, "connection refused"));
        let entry = format_log_entry(ts, 42, &outcome);
        assert!(entry.contains("Error: Delivery error for chat 42: connection refused"));
    }
}
