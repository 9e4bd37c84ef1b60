//! Running-application queries through `NSWorkspace`.

use objc2_app_kit::{NSApplicationActivationPolicy, NSRunningApplication, NSWorkspace};
use objc2_foundation::NSBundle;

use crate::app::{ActivationPolicy, RunningApp};

/// Describe an `NSRunningApplication`.
pub(crate) fn running_app(app: &NSRunningApplication) -> RunningApp {
    let policy = app.activationPolicy();
    let activation_policy = if policy == NSApplicationActivationPolicy::Regular {
        ActivationPolicy::Regular
    } else if policy == NSApplicationActivationPolicy::Accessory {
        ActivationPolicy::Accessory
    } else {
        ActivationPolicy::Prohibited
    };
    RunningApp {
        pid: app.processIdentifier(),
        bundle_id: app.bundleIdentifier().map(|s| s.to_string()),
        name: app.localizedName().map(|s| s.to_string()),
        activation_policy,
    }
}

/// Every running application known to the shared workspace.
pub(crate) fn running_applications() -> Vec<RunningApp> {
    let ws = NSWorkspace::sharedWorkspace();
    ws.runningApplications()
        .iter()
        .filter(|app| !app.isTerminated())
        .map(|app| running_app(&app))
        .collect()
}

/// Bundle identifier of the host process.
pub(crate) fn own_bundle_id() -> Option<String> {
    NSBundle::mainBundle()
        .bundleIdentifier()
        .map(|s| s.to_string())
}
