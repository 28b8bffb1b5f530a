//! Diff calculation between saved and freshly extracted snapshots.
//!
//! A change here is what triggers a notification; snapshots are only
//! rewritten after that notification has been dispatched.

use crate::models::{AckSnapshot, FirmwareMap};
use crate::services::FirmwareFact;

/// Whether the acknowledgement block differs from the saved snapshot.
///
/// Changed iff there is no saved snapshot yet, the month label differs,
/// or the name sequence differs (order-sensitive, exact match).
pub fn ack_changed(saved: Option<&AckSnapshot>, fresh: &AckSnapshot) -> bool {
    match saved {
        Some(saved) => saved.month != fresh.month || saved.names != fresh.names,
        None => true,
    }
}

/// Firmware change-set for one check cycle.
#[derive(Debug, Clone, Default)]
pub struct FirmwareDiff {
    /// (OS, "version (build)") per changed OS, in fresh extraction order
    pub changed: Vec<(String, String)>,
}

impl FirmwareDiff {
    /// Check if there are any changes.
    pub fn has_changes(&self) -> bool {
        !self.changed.is_empty()
    }
}

/// Compare fresh firmware facts against the saved version map.
///
/// An OS is changed iff it is absent from the saved map or its version
/// label differs. OS entries present only in the saved map are not
/// flagged; the snapshot overwrite drops them silently.
pub fn firmware_changes(saved: &FirmwareMap, fresh: &[FirmwareFact]) -> FirmwareDiff {
    let changed = fresh
        .iter()
        .filter(|fact| saved.get(&fact.os) != Some(&fact.label()))
        .map(|fact| (fact.os.clone(), fact.label()))
        .collect();

    FirmwareDiff { changed }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_fact(os: &str, version: &str, build: &str) -> FirmwareFact {
        FirmwareFact {
            os: os.to_string(),
            version: version.to_string(),
            build: build.to_string(),
        }
    }

    fn make_ack(month: &str, names: &[&str]) -> AckSnapshot {
        AckSnapshot {
            month: month.to_string(),
            names: names.iter().map(|n| n.to_string()).collect(),
        }
    }

    #[test]
    fn test_ack_no_change() {
        let saved = make_ack("June 2025", &["Alice", "Bob"]);
        let fresh = saved.clone();
        assert!(!ack_changed(Some(&saved), &fresh));
    }

    #[test]
    fn test_ack_month_change() {
        let saved = make_ack("May 2025", &["Alice", "Bob"]);
        let fresh = make_ack("June 2025", &["Alice", "Bob"]);
        assert!(ack_changed(Some(&saved), &fresh));
    }

    #[test]
    fn test_ack_names_change() {
        let saved = make_ack("June 2025", &["Alice"]);
        let fresh = make_ack("June 2025", &["Alice", "Bob"]);
        assert!(ack_changed(Some(&saved), &fresh));
    }

    #[test]
    fn test_ack_name_order_is_significant() {
        let saved = make_ack("June 2025", &["Bob", "Alice"]);
        let fresh = make_ack("June 2025", &["Alice", "Bob"]);
        assert!(ack_changed(Some(&saved), &fresh));
    }

    #[test]
    fn test_ack_first_run_counts_as_change() {
        let fresh = make_ack("June 2025", &["Alice"]);
        assert!(ack_changed(None, &fresh));
    }

    #[test]
    fn test_firmware_no_changes() {
        let fresh = vec![make_fact("iOS", "17.6", "21G79")];
        let saved: FirmwareMap = fresh
            .iter()
            .map(|f| (f.os.clone(), f.label()))
            .collect();

        let diff = firmware_changes(&saved, &fresh);
        assert!(!diff.has_changes());
    }

    #[test]
    fn test_firmware_single_os_change() {
        let mut saved = FirmwareMap::new();
        saved.insert("iOS".to_string(), "17.6 (21G79)".to_string());
        saved.insert("macOS".to_string(), "14.5 (23F79)".to_string());

        let fresh = vec![
            make_fact("iOS", "17.6", "21G79"),
            make_fact("macOS", "14.6", "23G80"),
        ];

        let diff = firmware_changes(&saved, &fresh);
        assert_eq!(
            diff.changed,
            vec![("macOS".to_string(), "14.6 (23G80)".to_string())]
        );
    }

    #[test]
    fn test_firmware_change_order_follows_fresh() {
        let saved = FirmwareMap::new();
        let fresh = vec![
            make_fact("iOS", "17.6", "21G79"),
            make_fact("iPadOS", "17.6", "21G79"),
            make_fact("macOS", "14.6", "23G80"),
        ];

        let diff = firmware_changes(&saved, &fresh);
        let os_order: Vec<&str> = diff.changed.iter().map(|(os, _)| os.as_str()).collect();
        assert_eq!(os_order, vec!["iOS", "iPadOS", "macOS"]);
    }

    #[test]
    fn test_firmware_removed_os_not_flagged() {
        let mut saved = FirmwareMap::new();
        saved.insert("iOS".to_string(), "17.6 (21G79)".to_string());
        saved.insert("bridgeOS".to_string(), "8.6 (21P5077)".to_string());

        let fresh = vec![make_fact("iOS", "17.6", "21G79")];

        let diff = firmware_changes(&saved, &fresh);
        assert!(!diff.has_changes());
    }

    #[test]
    fn test_firmware_empty_fresh_is_no_change() {
        let mut saved = FirmwareMap::new();
        saved.insert("iOS".to_string(), "17.6 (21G79)".to_string());

        let diff = firmware_changes(&saved, &[]);
        assert!(!diff.has_changes());
    }
}
