//! Managed-profile provisioning.
//!
//! Two steps bracket the platform's own setup flow:
//! - [`managed_profile_request`] describes the request that starts it
//! - [`PostProvisioning::complete`] names and enables the new profile once
//!   setup has finished, exactly one time

use crate::error::{ProvisioningError, ProvisioningResult};
use crate::host::Capabilities;
use crate::keys;
use crate::values::ComponentName;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// An intent-style request: an action plus string extras.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisioningRequest {
    pub action: String,
    pub extras: BTreeMap<String, String>,
}

/// Build the request that starts managed-profile provisioning for `admin`.
///
/// Platforms with the admin component extra get the component; older ones
/// get only the admin package name.
pub fn managed_profile_request(caps: Capabilities, admin: &ComponentName) -> ProvisioningRequest {
    let mut extras = BTreeMap::new();
    if caps.admin_component {
        extras.insert(
            keys::DEVICE_ADMIN_COMPONENT_NAME.to_string(),
            admin.flatten_to_string(),
        );
    } else {
        extras.insert(
            keys::DEVICE_ADMIN_PACKAGE_NAME.to_string(),
            admin.package_name.clone(),
        );
    }
    ProvisioningRequest {
        action: keys::ACTION_PROVISION_MANAGED_PROFILE.to_string(),
        extras,
    }
}

/// Profile-owner operations run after provisioning.
pub trait DevicePolicy {
    fn set_profile_name(&mut self, admin: &ComponentName, name: &str) -> ProvisioningResult<()>;
    fn set_profile_enabled(&mut self, admin: &ComponentName) -> ProvisioningResult<()>;
}

/// Profile state recorded by [`FileDevicePolicy`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub enabled: bool,
}

fn read_json<T: for<'de> Deserialize<'de> + Default>(path: &Path) -> ProvisioningResult<T> {
    if !path.exists() {
        return Ok(T::default());
    }
    let content = std::fs::read_to_string(path).map_err(|e| ProvisioningError::io(path, e))?;
    serde_json::from_str(&content).map_err(|source| ProvisioningError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> ProvisioningResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ProvisioningError::io(parent, e))?;
    }
    let content = serde_json::to_string_pretty(value).map_err(|source| ProvisioningError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    std::fs::write(path, content).map_err(|e| ProvisioningError::io(path, e))
}

/// Device policy that records profile state in a JSON file.
#[derive(Debug, Clone)]
pub struct FileDevicePolicy {
    path: PathBuf,
}

impl FileDevicePolicy {
    pub const FILE_NAME: &'static str = "profile.json";

    pub fn new(state_dir: &Path) -> Self {
        Self {
            path: state_dir.join(Self::FILE_NAME),
        }
    }

    pub fn state(&self) -> ProvisioningResult<ProfileState> {
        read_json(&self.path)
    }

    fn update(&self, f: impl FnOnce(&mut ProfileState)) -> ProvisioningResult<()> {
        let mut state = self.state()?;
        f(&mut state);
        write_json(&self.path, &state)
    }
}

impl DevicePolicy for FileDevicePolicy {
    fn set_profile_name(&mut self, admin: &ComponentName, name: &str) -> ProvisioningResult<()> {
        self.update(|state| {
            state.admin = Some(admin.flatten_to_short_string());
            state.name = Some(name.to_string());
        })
    }

    fn set_profile_enabled(&mut self, admin: &ComponentName) -> ProvisioningResult<()> {
        self.update(|state| {
            state.admin = Some(admin.flatten_to_short_string());
            state.enabled = true;
        })
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct PostProvisioningPrefs {
    #[serde(default)]
    done: bool,
}

/// Tracks whether post-provisioning has run, in a small preferences file.
#[derive(Debug, Clone)]
pub struct PostProvisioning {
    prefs_path: PathBuf,
}

impl PostProvisioning {
    pub const PREFS_FILE: &'static str = "post-provisioning.json";

    pub fn new(state_dir: &Path) -> Self {
        Self {
            prefs_path: state_dir.join(Self::PREFS_FILE),
        }
    }

    pub fn is_done(&self) -> ProvisioningResult<bool> {
        Ok(read_json::<PostProvisioningPrefs>(&self.prefs_path)?.done)
    }

    /// Name and enable the profile unless that already happened.
    ///
    /// Returns whether any work was done.
    pub fn complete(
        &self,
        policy: &mut dyn DevicePolicy,
        admin: &ComponentName,
        profile_name: &str,
    ) -> ProvisioningResult<bool> {
        if self.is_done()? {
            debug!("Post-provisioning already done");
            return Ok(false);
        }
        policy.set_profile_name(admin, profile_name)?;
        // The profile stays invisible in the launcher until enabled.
        policy.set_profile_enabled(admin)?;
        write_json(&self.prefs_path, &PostProvisioningPrefs { done: true })?;
        info!(admin = %admin, name = profile_name, "Managed profile enabled");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn admin() -> ComponentName {
        ComponentName::new(
            "com.example.android.basicmanagedprofile",
            "com.example.android.basicmanagedprofile.BasicDeviceAdminReceiver",
        )
    }

    #[test]
    fn test_request_uses_component_when_supported() {
        let request = managed_profile_request(Capabilities::default(), &admin());
        assert_eq!(request.action, keys::ACTION_PROVISION_MANAGED_PROFILE);
        assert_eq!(
            request.extras.get(keys::DEVICE_ADMIN_COMPONENT_NAME).map(String::as_str),
            Some(
                "com.example.android.basicmanagedprofile/com.example.android.basicmanagedprofile.BasicDeviceAdminReceiver"
            )
        );
        assert!(!request.extras.contains_key(keys::DEVICE_ADMIN_PACKAGE_NAME));
    }

    #[test]
    fn test_request_uses_package_on_legacy_platform() {
        let request = managed_profile_request(Capabilities::legacy(), &admin());
        assert_eq!(
            request.extras.get(keys::DEVICE_ADMIN_PACKAGE_NAME).map(String::as_str),
            Some("com.example.android.basicmanagedprofile")
        );
        assert_eq!(request.extras.len(), 1);
    }

    #[derive(Default)]
    struct RecordingPolicy {
        calls: Vec<String>,
    }

    impl DevicePolicy for RecordingPolicy {
        fn set_profile_name(&mut self, _admin: &ComponentName, name: &str) -> ProvisioningResult<()> {
            self.calls.push(format!("name:{}", name));
            Ok(())
        }

        fn set_profile_enabled(&mut self, _admin: &ComponentName) -> ProvisioningResult<()> {
            self.calls.push("enable".to_string());
            Ok(())
        }
    }

    #[test]
    fn test_complete_runs_once() {
        let dir = TempDir::new().unwrap();
        let post = PostProvisioning::new(dir.path());
        let mut policy = RecordingPolicy::default();

        assert!(!post.is_done().unwrap());
        assert!(post.complete(&mut policy, &admin(), "Work").unwrap());
        assert!(post.is_done().unwrap());
        assert!(!post.complete(&mut policy, &admin(), "Work").unwrap());
        assert_eq!(policy.calls, vec!["name:Work".to_string(), "enable".to_string()]);
    }

    #[test]
    fn test_file_policy_records_state() {
        let dir = TempDir::new().unwrap();
        let mut policy = FileDevicePolicy::new(dir.path());
        PostProvisioning::new(dir.path())
            .complete(&mut policy, &admin(), "Sample Managed Profile")
            .unwrap();

        let state = policy.state().unwrap();
        assert_eq!(state.name.as_deref(), Some("Sample Managed Profile"));
        assert!(state.enabled);
        assert_eq!(
            state.admin.as_deref(),
            Some("com.example.android.basicmanagedprofile/.BasicDeviceAdminReceiver")
        );
    }
}
