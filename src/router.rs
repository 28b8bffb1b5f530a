// src/router.rs

//! Inbound trigger dispatch.
//!
//! Two trigger shapes exist: an operator/cron check trigger (query
//! parameter `status=check` or the `check` CLI argument) and everything
//! else, which is treated as a webhook update. Unrecognized webhook
//! payloads are ignored without a reply.

use crate::error::Result;
use crate::models::Update;
use crate::notify::Notifier;
use crate::store::StateStore;

/// Confirmation sent once on subscription.
pub const CONFIRMATION: &str = "✅ Subscription active.\nYou will receive alerts for Apple security acknowledgements and new iOS, iPadOS, macOS and bridgeOS releases.";

/// The command that starts a subscription.
const SUBSCRIBE_COMMAND: &str = "/start";

/// How an invocation should be handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Run the change checker
    Check,
    /// Handle the body as a webhook update
    Webhook,
}

impl Trigger {
    /// Resolve the trigger from a query string and/or CLI argument.
    ///
    /// `status=check` in the query or a literal `check` argument selects
    /// the checker; any other invocation shape falls through to webhook
    /// handling.
    pub fn resolve(query: Option<&str>, arg: Option<&str>) -> Self {
        if arg == Some("check") {
            return Self::Check;
        }
        if let Some(query) = query {
            let is_check = query
                .split('&')
                .filter_map(|pair| pair.split_once('='))
                .any(|(key, value)| key == "status" && value == "check");
            if is_check {
                return Self::Check;
            }
        }
        Self::Webhook
    }
}

/// Handle one inbound webhook body.
///
/// Exactly the `/start` command from an identifiable chat registers the
/// sender and sends a one-time confirmation. Everything else — other
/// commands, missing chat, malformed JSON — is silently ignored.
pub async fn handle_webhook(
    body: &str,
    store: &dyn StateStore,
    notifier: &Notifier<'_>,
) -> Result<()> {
    let update: Update = match serde_json::from_str(body) {
        Ok(update) => update,
        Err(e) => {
            log::debug!("Ignoring unparseable webhook payload: {}", e);
            return Ok(());
        }
    };

    let Some((chat_id, text)) = update.command() else {
        log::debug!("Ignoring webhook update without chat/text");
        return Ok(());
    };

    if text != SUBSCRIBE_COMMAND {
        log::debug!("Ignoring unrecognized command {:?}", text);
        return Ok(());
    }

    if store.add_subscriber(chat_id).await? {
        log::info!("Registered subscriber {}", chat_id);
    } else {
        log::info!("Subscriber {} already registered", chat_id);
    }

    notifier.send_to(chat_id, CONFIRMATION).await
}
