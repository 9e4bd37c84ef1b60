//! Trait abstraction over the platform services the watcher consumes.
//!
//! [`Platform`] bundles the trust query and prompt, the running-application
//! list, per-process observation handles and the workspace activation
//! notification. `MacPlatform` implements it on macOS;
//! [`crate::test_support::MockPlatform`] is a scriptable double.

use std::sync::Arc;

use crate::{app::RunningApp, error::AxError};

/// Accessibility notifications an observation handle subscribes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AxNotification {
    /// A window or element title changed.
    TitleChanged,
    /// The application became active.
    ApplicationActivated,
}

impl AxNotification {
    /// Notifications attached to every watched application, in attach order.
    pub const WATCHED: [Self; 2] = [Self::TitleChanged, Self::ApplicationActivated];

    /// The Accessibility notification name.
    pub fn name(self) -> &'static str {
        match self {
            Self::TitleChanged => "AXTitleChanged",
            Self::ApplicationActivated => "AXApplicationActivated",
        }
    }
}

/// An accessibility element delivered with an event.
///
/// Every read is a synchronous round-trip to the target process; absence of a
/// value is normal and reported as `None`.
pub trait UiElement {
    /// The element's `AXTitle`.
    fn title(&self) -> Option<String>;
    /// The element's `AXFocusedWindow`.
    fn focused_window(&self) -> Option<Box<dyn UiElement>>;
}

/// Callback invoked for every event on an observation handle.
pub type AxCallback = Arc<dyn Fn(&dyn UiElement, AxNotification) + Send + Sync>;

/// Callback invoked for every workspace activation; `None` when the
/// notification carried no application.
pub type ActivationHandler = Arc<dyn Fn(Option<RunningApp>) + Send + Sync>;

/// Token identifying an installed activation observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActivationToken(pub u64);

/// A live subscription to one process's accessibility events.
pub trait ObservationHandle: Send {
    /// Attach `notification` on the application element.
    fn add_notification(&mut self, notification: AxNotification) -> Result<(), AxError>;
    /// Detach everything and release the subscription. Idempotent.
    fn stop(&mut self);
}

/// Platform services required by the watcher.
pub trait Platform: Send + Sync {
    /// Current Accessibility trust; never prompts.
    fn is_trusted(&self) -> bool;
    /// Current Accessibility trust, asking the system to prompt if untrusted.
    fn prompt_for_trust(&self) -> bool;
    /// Applications currently running.
    fn running_applications(&self) -> Vec<RunningApp>;
    /// Bundle identifier of the host process, if any.
    fn own_bundle_id(&self) -> Option<String>;
    /// Create an observation handle for `app` delivering events to `callback`.
    ///
    /// Returns `None` when the process cannot be observed (exited, no pid).
    fn create_observer(
        &self,
        app: &RunningApp,
        callback: AxCallback,
    ) -> Option<Box<dyn ObservationHandle>>;
    /// Subscribe to "application activated" workspace notifications.
    fn add_activation_observer(&self, handler: ActivationHandler) -> Option<ActivationToken>;
    /// Remove an activation observer added with [`Self::add_activation_observer`].
    fn remove_activation_observer(&self, token: ActivationToken);
}
