//! Firmware version extraction.
//!
//! Queries the firmware API once per configured device and keeps the
//! first (latest) entry per OS family.

use serde::Deserialize;

use crate::config::DeviceTarget;
use crate::error::Result;
use crate::utils::http::DocumentFetcher;

/// Device payload returned by the firmware API.
#[derive(Debug, Deserialize)]
struct DeviceInfo {
    #[serde(default)]
    firmwares: Vec<FirmwareEntry>,
}

/// One firmware release of a device.
#[derive(Debug, Deserialize)]
struct FirmwareEntry {
    version: String,
    buildid: String,
}

/// Latest firmware of one OS family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirmwareFact {
    /// OS family label, e.g. "macOS"
    pub os: String,

    /// Version string, e.g. "14.6"
    pub version: String,

    /// Build identifier, e.g. "23G80"
    pub build: String,
}

impl FirmwareFact {
    /// The "version (build)" label used in snapshots and notifications.
    pub fn label(&self) -> String {
        format!("{} ({})", self.version, self.build)
    }
}

/// Parse a device payload into its latest (version, build) pair.
///
/// Returns `None` when the device has no firmware entries.
pub fn parse_latest(body: &str) -> Result<Option<(String, String)>> {
    let info: DeviceInfo = serde_json::from_str(body)?;
    Ok(info
        .firmwares
        .into_iter()
        .next()
        .map(|fw| (fw.version, fw.buildid)))
}

/// Service querying the firmware API per OS family.
pub struct FirmwareService<'a> {
    fetcher: &'a dyn DocumentFetcher,
    api_base: &'a str,
}

impl<'a> FirmwareService<'a> {
    pub fn new(fetcher: &'a dyn DocumentFetcher, api_base: &'a str) -> Self {
        Self { fetcher, api_base }
    }

    /// Fetch the latest firmware for every configured device.
    ///
    /// A failed fetch or parse skips that OS; the rest of the cycle goes
    /// on. The result preserves the device-list order.
    pub async fn latest_versions(&self, devices: &[DeviceTarget]) -> Vec<FirmwareFact> {
        let mut facts = Vec::new();

        for device in devices {
            let url = format!("{}{}", self.api_base, device.identifier);
            let body = match self.fetcher.fetch_text(&url).await {
                Ok(body) => body,
                Err(e) => {
                    log::warn!("Firmware lookup failed for {} ({}): {}", device.os, url, e);
                    continue;
                }
            };

            match parse_latest(&body) {
                Ok(Some((version, build))) => facts.push(FirmwareFact {
                    os: device.os.clone(),
                    version,
                    build,
                }),
                Ok(None) => {
                    log::warn!("No firmware entries for {} ({})", device.os, device.identifier);
                }
                Err(e) => {
                    log::warn!("Firmware payload unreadable for {}: {}", device.os, e);
                }
            }
        }

        facts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_latest_takes_first_entry() {
        let body = r#"{
            "name": "iPhone 15 Pro Max",
            "identifier": "iPhone16,2",
            "firmwares": [
                {"identifier": "iPhone16,2", "version": "17.6", "buildid": "21G79"},
                {"identifier": "iPhone16,2", "version": "17.5.1", "buildid": "21F90"}
            ]
        }"#;
        assert_eq!(
            parse_latest(body).unwrap(),
            Some(("17.6".to_string(), "21G79".to_string()))
        );
    }

    #[test]
    fn test_parse_no_firmwares() {
        assert_eq!(parse_latest(r#"{"firmwares": []}"#).unwrap(), None);
        assert_eq!(parse_latest(r#"{"name": "x"}"#).unwrap(), None);
    }

    #[test]
    fn test_parse_malformed_is_error() {
        assert!(parse_latest("not json").is_err());
    }

    #[test]
    fn test_label_format() {
        let fact = FirmwareFact {
            os: "macOS".to_string(),
            version: "14.6".to_string(),
            build: "23G80".to_string(),
        };
        assert_eq!(fact.label(), "14.6 (23G80)");
    }
}
