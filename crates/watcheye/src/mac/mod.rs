//! Native macOS platform: Accessibility observers, NSWorkspace activation
//! notifications and running-application queries.

mod apps;
mod ax;
mod ns;

use std::{
    collections::HashMap,
    sync::atomic::{AtomicU64, Ordering},
};

use parking_lot::Mutex;

use crate::{
    app::RunningApp,
    platform::{
        ActivationHandler, ActivationToken, AxCallback, ObservationHandle, Platform,
    },
};

/// [`Platform`] implementation backed by AppKit and the Accessibility API.
#[derive(Default)]
pub struct MacPlatform {
    /// Installed activation observers by token id.
    tokens: Mutex<HashMap<u64, ns::NsObserverToken>>,
    /// Next activation token id.
    next_token: AtomicU64,
}

impl MacPlatform {
    /// Create the native platform.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Platform for MacPlatform {
    fn is_trusted(&self) -> bool {
        permissions::accessibility_ok()
    }

    fn prompt_for_trust(&self) -> bool {
        permissions::prompt_accessibility()
    }

    fn running_applications(&self) -> Vec<RunningApp> {
        apps::running_applications()
    }

    fn own_bundle_id(&self) -> Option<String> {
        apps::own_bundle_id()
    }

    fn create_observer(
        &self,
        app: &RunningApp,
        callback: AxCallback,
    ) -> Option<Box<dyn ObservationHandle>> {
        ax::MacObserver::create(app, callback).map(|o| Box::new(o) as Box<dyn ObservationHandle>)
    }

    fn add_activation_observer(&self, handler: ActivationHandler) -> Option<ActivationToken> {
        let token = ns::add_activation_observer(handler);
        let id = self.next_token.fetch_add(1, Ordering::SeqCst);
        self.tokens.lock().insert(id, token);
        Some(ActivationToken(id))
    }

    fn remove_activation_observer(&self, token: ActivationToken) {
        if let Some(token) = self.tokens.lock().remove(&token.0) {
            ns::remove_activation_observer(token);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::platform::{AxNotification, UiElement};

    // Helper: skip tests when Accessibility is not granted.
    fn ax_ok() -> bool {
        permissions::accessibility_ok()
    }

    #[test]
    fn observe_own_process_and_stop_twice() {
        // If no AX permission, this test is a no-op to avoid spurious failures on CI.
        if !ax_ok() {
            eprintln!("skipping: Accessibility permission not granted");
            return;
        }
        let platform = MacPlatform::new();
        let app = RunningApp::new(std::process::id() as i32, "watcheye.test");
        let callback: AxCallback = Arc::new(|_: &dyn UiElement, _: AxNotification| {});
        let mut handle = platform
            .create_observer(&app, callback)
            .expect("observer for own pid");
        for n in AxNotification::WATCHED {
            // Our test process has no windows; unsupported is acceptable.
            let _ = handle.add_notification(n);
        }
        handle.stop();
        handle.stop();
    }

    #[test]
    fn stop_off_main_thread_defers_release() {
        if !ax_ok() {
            eprintln!("skipping: Accessibility permission not granted");
            return;
        }
        let platform = MacPlatform::new();
        let app = RunningApp::new(std::process::id() as i32, "watcheye.test");
        let callback: AxCallback = Arc::new(|_: &dyn UiElement, _: AxNotification| {});
        let mut handle = platform
            .create_observer(&app, Arc::clone(&callback))
            .expect("observer for own pid");

        std::thread::spawn(move || handle.stop())
            .join()
            .expect("stop thread");
        // The context, and with it the callback, outlives the stop.
        assert_eq!(Arc::strong_count(&callback), 2);
        assert!(ax::retired_count() >= 1);

        // Nothing runs the main run loop under the test harness; drain here.
        unsafe { ax::drain_retired() };
        assert_eq!(Arc::strong_count(&callback), 1);
    }

    #[test]
    fn exited_process_is_not_observable() {
        let platform = MacPlatform::new();
        let app = RunningApp::new(i32::MAX, "watcheye.gone");
        let callback: AxCallback = Arc::new(|_: &dyn UiElement, _: AxNotification| {});
        assert!(platform.create_observer(&app, callback).is_none());
    }
}
