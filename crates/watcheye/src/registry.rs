//! Per-application observer registry.
//!
//! Owns one [`ObservationHandle`] per bundle identifier and the queue of
//! applications whose registration failed because Accessibility access was
//! missing. Both live behind a single mutex, held only for map and queue
//! updates; platform calls and the delegate run outside it.

use std::{collections::HashMap, mem, sync::Arc};

use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use crate::{
    app::RunningApp,
    error::AxError,
    event::WatchEyeDelegate,
    platform::{AxCallback, AxNotification, ObservationHandle, Platform, UiElement},
};

/// Outcome of [`Registry::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// A new observer is live.
    Live,
    /// An observer already existed; nothing was attached.
    AlreadyWatched,
    /// The application cannot be observed (no identifier, process gone).
    Skipped,
    /// Access is missing; the application was queued for retry.
    Deferred,
    /// Attaching failed for another reason; never retried.
    Failed(AxError),
}

/// Mutable registry state.
#[derive(Default)]
struct State {
    /// Live observers keyed by bundle identifier.
    observers: HashMap<String, Box<dyn ObservationHandle>>,
    /// Applications waiting for Accessibility access, in insertion order.
    deferred: Vec<RunningApp>,
}

/// Registry of per-application observers.
pub struct Registry {
    /// Creates observation handles.
    platform: Arc<dyn Platform>,
    /// Receives title events.
    delegate: Arc<dyn WatchEyeDelegate>,
    /// Watched set and deferred queue.
    state: Mutex<State>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new(platform: Arc<dyn Platform>, delegate: Arc<dyn WatchEyeDelegate>) -> Self {
        Self {
            platform,
            delegate,
            state: Mutex::new(State::default()),
        }
    }

    /// Start observing `app` unless it is already observed.
    ///
    /// Never fails: problems are logged and reported in the returned
    /// [`Registration`]. The registry lock is not held while the observer is
    /// created and attached, so the map is checked again before inserting.
    pub fn register(&self, app: &RunningApp) -> Registration {
        let Some(id) = app.bundle_id() else {
            debug!(pid = app.pid, "skipping app without bundle identifier");
            return Registration::Skipped;
        };
        if self.is_watching(id) {
            return Registration::AlreadyWatched;
        }

        let callback = self.callback_for(app.clone());
        let Some(mut handle) = self.platform.create_observer(app, callback) else {
            debug!(app = id, pid = app.pid, "app not observable; skipping");
            return Registration::Skipped;
        };

        if let Err(err) = attach(handle.as_mut()) {
            handle.stop();
            warn!("Failed to add notification for {}: {}", id, err);
            if !err.is_permission_missing() {
                return Registration::Failed(err);
            }
            let mut state = self.state.lock();
            if state.observers.contains_key(id) {
                return Registration::AlreadyWatched;
            }
            if !state.deferred.iter().any(|d| d.bundle_id() == Some(id)) {
                state.deferred.push(app.clone());
            }
            return Registration::Deferred;
        }

        let mut state = self.state.lock();
        if state.observers.contains_key(id) {
            drop(state);
            handle.stop();
            return Registration::AlreadyWatched;
        }
        state.deferred.retain(|d| d.bundle_id() != Some(id));
        state.observers.insert(id.to_string(), handle);
        debug!(app = id, pid = app.pid, "observer installed");
        Registration::Live
    }

    /// Register every deferred application in queue order.
    ///
    /// The queue is taken in one step; apps deferred while the replay runs
    /// stay queued.
    pub fn flush_deferred(&self) {
        let pending = mem::take(&mut self.state.lock().deferred);
        for app in &pending {
            self.register(app);
        }
    }

    /// Stop and remove the observer for `bundle_id`. Returns true if one existed.
    pub fn unregister(&self, bundle_id: &str) -> bool {
        let removed = self.state.lock().observers.remove(bundle_id);
        match removed {
            Some(mut handle) => {
                handle.stop();
                true
            }
            None => false,
        }
    }

    /// Stop every live observer and empty the registry.
    pub fn stop_all(&self) {
        let handles: Vec<_> = self.state.lock().observers.drain().collect();
        for (id, mut handle) in handles {
            trace!(app = %id, "stopping observer");
            handle.stop();
        }
    }

    /// Whether an observer is live for `bundle_id`.
    pub fn is_watching(&self, bundle_id: &str) -> bool {
        self.state.lock().observers.contains_key(bundle_id)
    }

    /// Bundle identifiers with live observers, sorted.
    pub fn watched_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.state.lock().observers.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Bundle identifiers waiting for access, in queue order.
    pub fn deferred_ids(&self) -> Vec<String> {
        self.state
            .lock()
            .deferred
            .iter()
            .filter_map(|app| app.bundle_id.clone())
            .collect()
    }

    /// Number of live observers.
    pub fn len(&self) -> usize {
        self.state.lock().observers.len()
    }

    /// True when no observer is live.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Event callback for `app`: resolve a title and forward it to the delegate.
    fn callback_for(&self, app: RunningApp) -> AxCallback {
        let delegate = Arc::clone(&self.delegate);
        Arc::new(move |element: &dyn UiElement, notification: AxNotification| {
            match title_for_event(element, notification) {
                Some(title) => delegate.did_change_title(&app, &title),
                None => trace!(app = %app.label(), ?notification, "dropping event without title"),
            }
        })
    }
}

/// Attach every watched notification, stopping at the first failure.
fn attach(handle: &mut dyn ObservationHandle) -> Result<(), AxError> {
    for notification in AxNotification::WATCHED {
        handle.add_notification(notification)?;
    }
    Ok(())
}

/// Title reported for an event.
///
/// Title changes read the changed element. Activations read the application's
/// focused window, then that window's title.
pub(crate) fn title_for_event(
    element: &dyn UiElement,
    notification: AxNotification,
) -> Option<String> {
    match notification {
        AxNotification::TitleChanged => element.title(),
        AxNotification::ApplicationActivated => element.focused_window()?.title(),
    }
}
