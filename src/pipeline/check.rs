// src/pipeline/check.rs

//! One check cycle: acknowledgements, then firmwares.

use crate::config::Config;
use crate::error::Result;
use crate::models::{AckSnapshot, FirmwareMap, SecurityDetail};
use crate::notify::Notifier;
use crate::pipeline::diff;
use crate::services::{FirmwareService, SecurityService, acknowledgements};
use crate::store::StateStore;
use crate::utils::http::DocumentFetcher;

/// Runs the change checks against injected collaborators.
pub struct Checker<'a> {
    config: &'a Config,
    fetcher: &'a dyn DocumentFetcher,
    store: &'a dyn StateStore,
    notifier: &'a Notifier<'a>,
}

impl<'a> Checker<'a> {
    pub fn new(
        config: &'a Config,
        fetcher: &'a dyn DocumentFetcher,
        store: &'a dyn StateStore,
        notifier: &'a Notifier<'a>,
    ) -> Self {
        Self {
            config,
            fetcher,
            store,
            notifier,
        }
    }

    /// Run both checks in sequence.
    ///
    /// Each check absorbs its own failure; one failing never blocks the
    /// other, and the cycle always completes.
    pub async fn run(&self) {
        log::info!("Check cycle starting");

        if let Err(e) = self.check_acknowledgements().await {
            log::error!("Acknowledgement check failed: {}", e);
        }
        if let Err(e) = self.check_firmwares().await {
            log::error!("Firmware check failed: {}", e);
        }

        log::info!("Check cycle complete");
    }

    /// Check the acknowledgements page for a new month or name list.
    pub async fn check_acknowledgements(&self) -> Result<()> {
        let html = self
            .fetcher
            .fetch_text(&self.config.sources.acknowledgements_url)
            .await?;

        let Some(fresh) = acknowledgements::extract_latest(&html)? else {
            log::info!("No acknowledgement block found; nothing new");
            return Ok(());
        };

        let saved = self.store.load_ack().await?;
        if !diff::ack_changed(saved.as_ref(), &fresh) {
            log::info!("Acknowledgements unchanged ({})", fresh.month);
            return Ok(());
        }

        log::info!(
            "Acknowledgement change detected: {} ({} names)",
            fresh.month,
            fresh.names.len()
        );

        // Persist only after the fan-out: a crash in between re-notifies
        // on the next run instead of losing the change.
        self.notifier.broadcast(&format_ack_message(&fresh)).await?;
        self.store.save_ack(&fresh).await?;

        Ok(())
    }

    /// Check the firmware API for new OS versions.
    pub async fn check_firmwares(&self) -> Result<()> {
        let firmware = FirmwareService::new(self.fetcher, &self.config.sources.firmware_api_base);
        let fresh = firmware.latest_versions(&self.config.devices).await;

        if fresh.is_empty() {
            log::warn!("No firmware data fetched; skipping firmware check");
            return Ok(());
        }

        // Details are rebuilt every cycle; they enrich the notification
        // but are never diffed or persisted.
        let security = SecurityService::new(self.fetcher, &self.config.sources);
        let mut details = Vec::new();
        for fact in &fresh {
            details.push(security.details(&fact.os, &fact.version).await);
        }

        let saved = self.store.load_firmware().await?;
        let diff = diff::firmware_changes(&saved, &fresh);
        if !diff.has_changes() {
            log::info!("Firmware versions unchanged");
            return Ok(());
        }

        log::info!("Firmware changes detected: {} OS(es)", diff.changed.len());

        let message = format_firmware_message(
            &diff.changed,
            &details,
            &self.config.sources.fallback_release_url,
        );
        self.notifier.broadcast(&message).await?;

        let versions: FirmwareMap = fresh
            .iter()
            .map(|fact| (fact.os.clone(), fact.label()))
            .collect();
        self.store.save_firmware(&versions).await?;

        Ok(())
    }
}

/// Render the acknowledgement-change notification.
pub fn format_ack_message(snapshot: &AckSnapshot) -> String {
    format!(
        "🔔 <b>Apple web server security acknowledgements update!</b>\n\n{}\n\n{}",
        snapshot.month,
        snapshot.names.join("\n")
    )
}

/// Render the firmware-change notification.
///
/// One bullet per changed OS in fresh-extraction order, then a security
/// section per extracted OS. A missing release link falls back to the
/// configured generic URL.
pub fn format_firmware_message(
    changed: &[(String, String)],
    details: &[SecurityDetail],
    fallback_url: &str,
) -> String {
    let bullets: Vec<String> = changed
        .iter()
        .map(|(os, label)| format!("• {os} → {label}"))
        .collect();

    let mut message = format!("🚀 <b>New OS update detected:</b>\n\n{}", bullets.join("\n"));

    for detail in details {
        let link = detail.link.as_deref().unwrap_or(fallback_url);
        message.push_str(&format!(
            "\n\n🔐 <b>{} security fixes:</b>\n{}\n🔗 {}",
            detail.os,
            detail.fixes.join("\n"),
            link
        ));
    }

    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ack_message_contains_month_and_names() {
        let message = format_ack_message(&AckSnapshot {
            month: "June 2025".to_string(),
            names: vec!["Alice".to_string(), "Bob".to_string()],
        });
        assert!(message.contains("June 2025"));
        assert!(message.contains("Alice\nBob"));
        assert!(message.starts_with("🔔 <b>"));
    }

    #[test]
    fn test_firmware_message_lists_changes_in_order() {
        let changed = vec![
            ("iOS".to_string(), "17.6 (21G79)".to_string()),
            ("macOS".to_string(), "14.6 (23G80)".to_string()),
        ];
        let message = format_firmware_message(&changed, &[], "https://example.com/fallback");

        let ios_pos = message.find("• iOS → 17.6 (21G79)").unwrap();
        let macos_pos = message.find("• macOS → 14.6 (23G80)").unwrap();
        assert!(ios_pos < macos_pos);
    }

    #[test]
    fn test_firmware_message_uses_fallback_link() {
        let changed = vec![("iOS".to_string(), "17.6 (21G79)".to_string())];
        let details = vec![SecurityDetail::placeholder(
            "iOS",
            "Error: no security release note found for iOS 17.6",
        )];
        let message = format_firmware_message(&changed, &details, "https://example.com/fallback");

        assert!(message.contains("🔗 https://example.com/fallback"));
        assert!(message.contains("🔐 <b>iOS security fixes:</b>"));
    }

    #[test]
    fn test_firmware_message_with_real_link() {
        let changed = vec![("macOS".to_string(), "14.6 (23G80)".to_string())];
        let details = vec![SecurityDetail {
            os: "macOS".to_string(),
            fixes: vec!["• Kernel → Impact: x | Description: y | CVE-2025-1".to_string()],
            link: Some("https://support.apple.com/en-us/125328".to_string()),
        }];
        let message = format_firmware_message(&changed, &details, "https://example.com/fallback");

        assert!(message.contains("🔗 https://support.apple.com/en-us/125328"));
        assert!(!message.contains("fallback"));
    }
}
