//! Running application descriptors.

use crate::browser::Browser;

/// How an application participates in the Dock and app switcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActivationPolicy {
    /// Ordinary app with a Dock icon.
    #[default]
    Regular,
    /// Menu-bar style app without a Dock icon.
    Accessory,
    /// Background-only process.
    Prohibited,
}

/// A running application as seen by the platform.
///
/// The bundle identifier is the stable key used by the observer registry;
/// applications without one cannot be watched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunningApp {
    /// Process identifier.
    pub pid: i32,
    /// Bundle identifier, e.g. `com.apple.Safari`.
    pub bundle_id: Option<String>,
    /// Localized display name.
    pub name: Option<String>,
    /// Activation policy.
    pub activation_policy: ActivationPolicy,
}

impl RunningApp {
    /// A regular application with the given pid and bundle identifier.
    pub fn new(pid: i32, bundle_id: impl Into<String>) -> Self {
        Self {
            pid,
            bundle_id: Some(bundle_id.into()),
            name: None,
            activation_policy: ActivationPolicy::Regular,
        }
    }

    /// An application whose bundle identifier is unknown.
    pub fn anonymous(pid: i32) -> Self {
        Self {
            pid,
            bundle_id: None,
            name: None,
            activation_policy: ActivationPolicy::Regular,
        }
    }

    /// Set the localized name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the activation policy.
    #[must_use]
    pub fn with_policy(mut self, policy: ActivationPolicy) -> Self {
        self.activation_policy = policy;
        self
    }

    /// Bundle identifier, if known.
    pub fn bundle_id(&self) -> Option<&str> {
        self.bundle_id.as_deref()
    }

    /// Best human-readable label: name, then bundle id, then pid.
    pub fn label(&self) -> String {
        self.name
            .clone()
            .or_else(|| self.bundle_id.clone())
            .unwrap_or_else(|| format!("pid {}", self.pid))
    }

    /// The known browser this application is, if any.
    pub fn browser(&self) -> Option<Browser> {
        Browser::resolve(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_falls_back() {
        let app = RunningApp::new(1, "com.example.App");
        assert_eq!(app.label(), "com.example.App");
        assert_eq!(app.clone().with_name("Example").label(), "Example");
        assert_eq!(RunningApp::anonymous(7).label(), "pid 7");
    }
}
