//! Focus-change listener: reacts to workspace "application activated"
//! notifications.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::{
    app::RunningApp,
    event::WatchEyeDelegate,
    platform::{ActivationToken, Platform},
    registry::Registry,
};

/// Installed activation observer; removed by [`FocusListener::stop`].
pub struct FocusListener {
    /// Owner of the activation observer.
    platform: Arc<dyn Platform>,
    /// Installed observer; `None` once stopped.
    token: Mutex<Option<ActivationToken>>,
}

impl FocusListener {
    /// Subscribe to activation notifications.
    pub fn start(
        platform: Arc<dyn Platform>,
        registry: Arc<Registry>,
        delegate: Arc<dyn WatchEyeDelegate>,
    ) -> Self {
        let handler = Arc::new(move |app: Option<RunningApp>| {
            on_activation(&registry, delegate.as_ref(), app);
        });
        let token = platform.add_activation_observer(handler);
        if token.is_none() {
            debug!("activation observer unavailable; focus changes will not be reported");
        }
        Self {
            platform,
            token: Mutex::new(token),
        }
    }

    /// Whether the observer is installed.
    pub fn is_active(&self) -> bool {
        self.token.lock().is_some()
    }

    /// Unsubscribe. Idempotent.
    pub fn stop(&self) {
        if let Some(token) = self.token.lock().take() {
            self.platform.remove_activation_observer(token);
        }
    }
}

/// Register the activated app if it is new, then report the focus change.
pub(crate) fn on_activation(
    registry: &Registry,
    delegate: &dyn WatchEyeDelegate,
    app: Option<RunningApp>,
) {
    let Some(app) = app else {
        trace!("activation without application");
        return;
    };
    let Some(id) = app.bundle_id() else {
        trace!(pid = app.pid, "activation of unidentifiable app");
        return;
    };
    if !registry.is_watching(id) {
        registry.register(&app);
    }
    delegate.did_focus_application(&app);
}
