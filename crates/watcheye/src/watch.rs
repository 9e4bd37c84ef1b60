//! The [`WatchEye`] composition root.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use tokio::sync::watch;
use tracing::{debug, info};

use crate::{
    config::WatchEyeCfg,
    event::WatchEyeDelegate,
    focus::FocusListener,
    gate::PermissionGate,
    platform::Platform,
    registry::Registry,
};

/// Watches the focused application and its window titles.
///
/// Construction checks Accessibility access (prompting once if missing),
/// registers an observer for every eligible running application and
/// subscribes to activation notifications. Everything is torn down by
/// [`WatchEye::shutdown`] or on drop.
pub struct WatchEye {
    /// Per-application observers.
    registry: Arc<Registry>,
    /// Permission prompt and poll.
    gate: Arc<PermissionGate>,
    /// Activation subscription.
    focus: FocusListener,
    /// Set by the first `shutdown`.
    stopped: AtomicBool,
}

impl WatchEye {
    /// Watch with the native macOS platform and default configuration.
    #[cfg(target_os = "macos")]
    pub fn new(delegate: Arc<dyn WatchEyeDelegate>) -> Self {
        Self::with_config(delegate, WatchEyeCfg::default())
    }

    /// Watch with the native macOS platform.
    #[cfg(target_os = "macos")]
    pub fn with_config(delegate: Arc<dyn WatchEyeDelegate>, cfg: WatchEyeCfg) -> Self {
        Self::with_platform(Arc::new(crate::mac::MacPlatform::new()), delegate, cfg)
    }

    /// Watch using `platform`.
    pub fn with_platform(
        platform: Arc<dyn Platform>,
        delegate: Arc<dyn WatchEyeDelegate>,
        cfg: WatchEyeCfg,
    ) -> Self {
        let registry = Arc::new(Registry::new(Arc::clone(&platform), Arc::clone(&delegate)));
        let gate = PermissionGate::new(
            Arc::clone(&platform),
            Arc::clone(&registry),
            Arc::clone(&delegate),
        );
        gate.check_and_request(cfg.poll_interval());

        let own = platform.own_bundle_id();
        for app in platform.running_applications() {
            if cfg.sweeps(&app, own.as_deref()) {
                registry.register(&app);
            }
        }
        debug!(watched = registry.len(), "initial sweep complete");

        let focus = FocusListener::start(platform, Arc::clone(&registry), delegate);
        Self {
            registry,
            gate,
            focus,
            stopped: AtomicBool::new(false),
        }
    }

    /// Whether constructing a watcher would prompt for Accessibility access.
    pub fn will_prompt_for_access() -> bool {
        permissions::will_prompt_for_access()
    }

    /// Whether the process currently has Accessibility access.
    pub fn is_allowed(&self) -> bool {
        self.gate.is_allowed()
    }

    /// Receiver that changes when Accessibility access is granted while
    /// the watcher runs. Re-check [`Self::is_allowed`] when it fires.
    pub fn permission_changes(&self) -> watch::Receiver<bool> {
        self.gate.subscribe()
    }

    /// The observer registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// The permission gate.
    pub fn gate(&self) -> &PermissionGate {
        &self.gate
    }

    /// Stop polling, unsubscribe from activations and stop every observer.
    /// Idempotent.
    pub fn shutdown(&self) {
        if self.stopped.swap(true, Ordering::SeqCst) {
            return;
        }
        self.focus.stop();
        self.gate.cancel();
        self.registry.stop_all();
        info!("watcher stopped");
    }
}

impl Drop for WatchEye {
    fn drop(&mut self) {
        self.shutdown();
    }
}
