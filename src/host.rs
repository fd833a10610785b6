//! Host environment queries used to fill provisioning defaults.
//!
//! The resolver never reads the machine directly; it asks a
//! [`HostEnvironment`]. [`SystemHost`] answers from the running system and
//! [`FixedHost`] from preset values.

use std::path::Path;
use std::process::Command;
use tracing::debug;

/// First platform API level that accepts the admin component extra.
pub const ADMIN_COMPONENT_API_LEVEL: u32 = 23;

/// Feature flags for the platform being provisioned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// The admin component extra is understood and supersedes the admin
    /// package extra.
    pub admin_component: bool,
}

impl Capabilities {
    pub fn for_api_level(api_level: u32) -> Self {
        Self {
            admin_component: api_level >= ADMIN_COMPONENT_API_LEVEL,
        }
    }

    /// Capabilities of platforms that predate the admin component extra.
    pub fn legacy() -> Self {
        Self {
            admin_component: false,
        }
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            admin_component: true,
        }
    }
}

/// Active WiFi association as reported by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WifiConnection {
    /// SSID as reported, possibly wrapped in double quotes.
    pub ssid: String,
}

/// Source of host-derived default values.
pub trait HostEnvironment {
    /// Primary locale, e.g. `en_US`.
    fn primary_locale(&self) -> String;

    /// IANA time zone id, e.g. `Europe/Berlin`.
    fn time_zone(&self) -> String;

    /// Current WiFi association, `None` when not associated with a network.
    fn wifi_connection(&self) -> Option<WifiConnection>;
}

/// Host environment backed by the running system.
#[derive(Debug, Clone, Default)]
pub struct SystemHost;

impl SystemHost {
    pub fn new() -> Self {
        Self
    }
}

const FALLBACK_LOCALE: &str = "en_US";
const FALLBACK_TIME_ZONE: &str = "UTC";

impl HostEnvironment for SystemHost {
    fn primary_locale(&self) -> String {
        ["LC_ALL", "LC_MESSAGES", "LANG"]
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .find_map(|value| locale_from_posix(&value))
            .unwrap_or_else(|| FALLBACK_LOCALE.to_string())
    }

    fn time_zone(&self) -> String {
        if let Some(tz) = std::env::var("TZ").ok().and_then(|tz| zone_from_tz_var(&tz)) {
            return tz;
        }
        if let Ok(content) = std::fs::read_to_string("/etc/timezone") {
            let zone = content.trim();
            if !zone.is_empty() {
                return zone.to_string();
            }
        }
        if let Ok(target) = std::fs::read_link("/etc/localtime")
            && let Some(zone) = zone_from_zoneinfo_path(&target)
        {
            return zone;
        }
        FALLBACK_TIME_ZONE.to_string()
    }

    fn wifi_connection(&self) -> Option<WifiConnection> {
        let output = match Command::new("iwgetid").arg("-r").output() {
            Ok(output) => output,
            Err(e) => {
                debug!(error = %e, "Unable to query WiFi association");
                return None;
            }
        };
        if !output.status.success() {
            return None;
        }
        let ssid = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if ssid.is_empty() {
            None
        } else {
            Some(WifiConnection { ssid })
        }
    }
}

/// Convert a POSIX locale (`de_DE.UTF-8@euro`) to the `de_DE` form.
fn locale_from_posix(value: &str) -> Option<String> {
    let base = value
        .split(['.', '@'])
        .next()
        .unwrap_or_default()
        .trim();
    if base.is_empty() || base == "C" || base == "POSIX" {
        None
    } else {
        Some(base.to_string())
    }
}

fn zone_from_tz_var(tz: &str) -> Option<String> {
    let tz = tz.trim().trim_start_matches(':');
    if tz.is_empty() {
        return None;
    }
    if tz.starts_with('/') {
        return zone_from_zoneinfo_path(Path::new(tz));
    }
    Some(tz.to_string())
}

fn zone_from_zoneinfo_path(path: &Path) -> Option<String> {
    let text = path.to_string_lossy();
    text.split_once("zoneinfo/")
        .map(|(_, zone)| zone.trim_matches('/').to_string())
        .filter(|zone| !zone.is_empty())
}

/// Host environment with preset answers.
#[derive(Debug, Clone)]
pub struct FixedHost {
    pub locale: String,
    pub time_zone: String,
    pub wifi: Option<WifiConnection>,
}

impl FixedHost {
    pub fn new(locale: impl Into<String>, time_zone: impl Into<String>) -> Self {
        Self {
            locale: locale.into(),
            time_zone: time_zone.into(),
            wifi: None,
        }
    }

    pub fn with_wifi(mut self, ssid: impl Into<String>) -> Self {
        self.wifi = Some(WifiConnection { ssid: ssid.into() });
        self
    }
}

impl HostEnvironment for FixedHost {
    fn primary_locale(&self) -> String {
        self.locale.clone()
    }

    fn time_zone(&self) -> String {
        self.time_zone.clone()
    }

    fn wifi_connection(&self) -> Option<WifiConnection> {
        self.wifi.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capabilities_follow_api_level() {
        assert!(!Capabilities::for_api_level(21).admin_component);
        assert!(!Capabilities::for_api_level(22).admin_component);
        assert!(Capabilities::for_api_level(23).admin_component);
        assert!(Capabilities::for_api_level(34).admin_component);
    }

    #[test]
    fn test_locale_from_posix() {
        assert_eq!(locale_from_posix("de_DE.UTF-8").as_deref(), Some("de_DE"));
        assert_eq!(locale_from_posix("fr_FR@euro").as_deref(), Some("fr_FR"));
        assert_eq!(locale_from_posix("en_GB").as_deref(), Some("en_GB"));
        assert_eq!(locale_from_posix("C.UTF-8"), None);
        assert_eq!(locale_from_posix("POSIX"), None);
        assert_eq!(locale_from_posix(""), None);
    }

    #[test]
    fn test_zone_from_tz_var() {
        assert_eq!(zone_from_tz_var("Europe/Paris").as_deref(), Some("Europe/Paris"));
        assert_eq!(
            zone_from_tz_var(":/usr/share/zoneinfo/Asia/Tokyo").as_deref(),
            Some("Asia/Tokyo")
        );
        assert_eq!(zone_from_tz_var(""), None);
    }

    #[test]
    fn test_system_host_never_returns_empty_defaults() {
        let host = SystemHost::new();
        assert!(!host.primary_locale().is_empty());
        assert!(!host.time_zone().is_empty());
    }
}
