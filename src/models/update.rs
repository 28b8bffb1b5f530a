//! Inbound webhook payload structures.
//!
//! Mirrors the slice of the Telegram update JSON the bot cares about.
//! Deserialization is lenient: unknown fields are ignored and missing
//! ones collapse to `None`, so unrecognized payloads can be skipped
//! without erroring.

use serde::Deserialize;

/// One inbound bot update.
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    #[serde(default)]
    pub message: Option<IncomingMessage>,
}

/// A message inside an update.
#[derive(Debug, Clone, Deserialize)]
pub struct IncomingMessage {
    #[serde(default)]
    pub chat: Option<Chat>,

    #[serde(default)]
    pub text: Option<String>,
}

/// The chat a message arrived from.
#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

impl Update {
    /// Extract the sender chat id and message text, when both exist.
    pub fn command(&self) -> Option<(i64, &str)> {
        let message = self.message.as_ref()?;
        let chat = message.chat.as_ref()?;
        let text = message.text.as_deref()?;
        Some((chat.id, text))
    }
}
