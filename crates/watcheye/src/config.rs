//! Watcher configuration.

use std::{fs, path::Path, time::Duration};

use serde::Deserialize;

use crate::{
    app::{ActivationPolicy, RunningApp},
    error::Result,
};

/// Configuration for a [`crate::WatchEye`].
///
/// Parsed from RON; missing fields take their defaults, e.g.
/// `(poll_interval_ms: 500)`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WatchEyeCfg {
    /// Period of the permission poll while access is not yet granted.
    pub poll_interval_ms: u64,
    /// Skip the host process during the initial sweep.
    pub skip_self: bool,
    /// Only sweep applications with a regular activation policy.
    pub regular_only: bool,
}

impl Default for WatchEyeCfg {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1000,
            skip_self: true,
            regular_only: true,
        }
    }
}

impl WatchEyeCfg {
    /// Parse a RON document.
    pub fn from_ron(s: &str) -> Result<Self> {
        Ok(ron::from_str(s)?)
    }

    /// Load and parse a RON file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_ron(&text)
    }

    /// Poll period, never shorter than one millisecond.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    /// Whether `app` takes part in the initial sweep.
    pub fn sweeps(&self, app: &RunningApp, own_bundle_id: Option<&str>) -> bool {
        let Some(id) = app.bundle_id() else {
            return false;
        };
        if self.skip_self && own_bundle_id == Some(id) {
            return false;
        }
        !self.regular_only || app.activation_policy == ActivationPolicy::Regular
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_ron_keeps_defaults() {
        let cfg = WatchEyeCfg::from_ron("(poll_interval_ms: 250)").unwrap();
        assert_eq!(cfg.poll_interval(), Duration::from_millis(250));
        assert!(cfg.skip_self);
        assert!(cfg.regular_only);
    }

    #[test]
    fn bad_ron_is_config_error() {
        let err = WatchEyeCfg::from_ron("(poll_interval_ms: \"soon\")").unwrap_err();
        assert!(matches!(err, crate::Error::Config(_)));
    }

    #[test]
    fn zero_interval_is_clamped() {
        let cfg = WatchEyeCfg {
            poll_interval_ms: 0,
            ..WatchEyeCfg::default()
        };
        assert_eq!(cfg.poll_interval(), Duration::from_millis(1));
    }

    #[test]
    fn sweep_filters() {
        let cfg = WatchEyeCfg::default();
        let own = Some("com.example.Host");
        assert!(cfg.sweeps(&RunningApp::new(1, "com.example.App"), own));
        assert!(!cfg.sweeps(&RunningApp::new(2, "com.example.Host"), own));
        assert!(!cfg.sweeps(&RunningApp::anonymous(3), own));
        let agent = RunningApp::new(4, "com.example.Agent").with_policy(ActivationPolicy::Accessory);
        assert!(!cfg.sweeps(&agent, own));

        let permissive = WatchEyeCfg {
            skip_self: false,
            regular_only: false,
            ..WatchEyeCfg::default()
        };
        assert!(permissive.sweeps(&agent, own));
        assert!(permissive.sweeps(&RunningApp::new(2, "com.example.Host"), own));
    }
}
