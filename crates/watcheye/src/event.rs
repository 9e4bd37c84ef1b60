//! Subscriber interface and event types emitted by the watcher.

use tokio::sync::mpsc::UnboundedSender;

use crate::app::RunningApp;

/// Receives notifications from a [`crate::WatchEye`].
///
/// Callbacks may arrive on any thread: the permission poll thread, the thread
/// running the main run loop, or the constructing thread.
pub trait WatchEyeDelegate: Send + Sync {
    /// The process has been granted Accessibility permission.
    ///
    /// Fired at most once. If access was already granted when the watcher was
    /// built, this fires during construction.
    fn did_receive_accessibility_permissions(&self);

    /// The focused application changed.
    fn did_focus_application(&self, app: &RunningApp);

    /// A window title of `app` changed, or `app` was activated and its
    /// focused window has `title`.
    fn did_change_title(&self, app: &RunningApp, title: &str);
}

/// A watcher notification as a value.
///
/// Semantics:
/// - `PermissionsGranted`: emitted once when Accessibility access is available.
/// - `AppFocused(app)`: emitted for every activation notification carrying an
///   identifiable application, after the app has been registered.
/// - `TitleChanged { app, title }`: emitted for every title or activation
///   event whose title could be read. Identical consecutive titles are not
///   deduplicated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// Accessibility permission is available.
    PermissionsGranted,
    /// The foreground application changed.
    AppFocused(RunningApp),
    /// The focused window title of an application changed.
    TitleChanged {
        /// Owning application.
        app: RunningApp,
        /// New window title.
        title: String,
    },
}

/// Delegate that forwards every notification into an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelDelegate {
    /// Event sink.
    tx: UnboundedSender<WatchEvent>,
}

impl ChannelDelegate {
    /// Forward events to `tx`.
    pub fn new(tx: UnboundedSender<WatchEvent>) -> Self {
        Self { tx }
    }

    /// Send, ignoring a closed receiver.
    fn emit(&self, event: WatchEvent) {
        let _ = self.tx.send(event);
    }
}

impl WatchEyeDelegate for ChannelDelegate {
    fn did_receive_accessibility_permissions(&self) {
        self.emit(WatchEvent::PermissionsGranted);
    }

    fn did_focus_application(&self, app: &RunningApp) {
        self.emit(WatchEvent::AppFocused(app.clone()));
    }

    fn did_change_title(&self, app: &RunningApp, title: &str) {
        self.emit(WatchEvent::TitleChanged {
            app: app.clone(),
            title: title.to_string(),
        });
    }
}
