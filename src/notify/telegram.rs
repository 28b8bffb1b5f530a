// src/notify/telegram.rs

//! Telegram Bot API transport.

use async_trait::async_trait;

use crate::config::BotConfig;
use crate::error::Result;
use crate::notify::{DeliveryReceipt, Transport};

/// Transport posting to the Bot API `sendMessage` method.
pub struct TelegramTransport {
    client: reqwest::Client,
    api_base: String,
    token: String,
}

impl TelegramTransport {
    pub fn new(client: reqwest::Client, config: &BotConfig) -> Self {
        Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            token: config.token(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/bot{}/sendMessage", self.api_base, self.token)
    }
}

#[async_trait]
impl Transport for TelegramTransport {
    async fn deliver(&self, chat_id: i64, text: &str) -> Result<DeliveryReceipt> {
        let response = self
            .client
            .post(self.endpoint())
            .json(&serde_json::json!({
                "chat_id": chat_id,
                "text": text,
                "parse_mode": "HTML",
            }))
            .send()
            .await?;

        // Non-2xx answers carry the API's error payload; keep them as
        // receipts so the delivery log shows what the API said.
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(DeliveryReceipt { status, body })
    }
}
