//! Test doubles for the platform and scripting seams.
//!
//! [`MockPlatform`] records every call and lets tests flip trust, script
//! attach failures, deliver accessibility events and fire activation
//! notifications. [`MockScripting`] serves canned browser windows.

use std::{
    collections::{HashMap, HashSet},
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
    },
};

use parking_lot::Mutex;

use crate::{
    app::RunningApp,
    browser::{BrowserTab, ChromiumWindow, SafariWindow, Scripting},
    error::AxError,
    event::{WatchEvent, WatchEyeDelegate},
    platform::{
        ActivationHandler, ActivationToken, AxCallback, AxNotification, ObservationHandle,
        Platform, UiElement,
    },
};

/// An accessibility element with fixed attributes.
#[derive(Debug, Clone, Default)]
pub struct MockElement {
    /// `AXTitle`.
    title: Option<String>,
    /// `AXFocusedWindow`.
    focused_window: Option<Box<MockElement>>,
}

impl MockElement {
    /// Element with a title.
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            focused_window: None,
        }
    }

    /// Element without a readable title.
    pub fn untitled() -> Self {
        Self::default()
    }

    /// Attach a focused window.
    #[must_use]
    pub fn with_focused_window(mut self, window: Self) -> Self {
        self.focused_window = Some(Box::new(window));
        self
    }
}

impl UiElement for MockElement {
    fn title(&self) -> Option<String> {
        self.title.clone()
    }

    fn focused_window(&self) -> Option<Box<dyn UiElement>> {
        self.focused_window
            .as_ref()
            .map(|w| Box::new((**w).clone()) as Box<dyn UiElement>)
    }
}

/// Hook run by [`MockPlatform`] whenever an observer is requested.
pub type CreateHook = Arc<dyn Fn(&RunningApp) + Send + Sync>;

/// Shared state behind every clone of a [`MockPlatform`].
#[derive(Default)]
struct MockState {
    /// Current trust.
    trusted: AtomicBool,
    /// Trust prompts requested.
    prompts: AtomicUsize,
    /// Running application list.
    apps: Mutex<Vec<RunningApp>>,
    /// Host bundle identifier.
    own_bundle_id: Mutex<Option<String>>,
    /// Bundle ids for which observer creation fails.
    unobservable: Mutex<HashSet<String>>,
    /// Scripted attach failures by bundle id.
    attach_errors: Mutex<HashMap<String, AxError>>,
    /// Called at the start of every `create_observer`.
    create_hook: Mutex<Option<CreateHook>>,
    /// Bundle ids with created handles, in order.
    created: Mutex<Vec<String>>,
    /// Successful attachments, in order.
    attached: Mutex<Vec<(String, AxNotification)>>,
    /// Bundle ids of stopped handles, in order.
    stopped: Mutex<Vec<String>>,
    /// Callbacks of attached, not yet stopped handles.
    live: Mutex<HashMap<String, AxCallback>>,
    /// Installed activation observers.
    activation: Mutex<HashMap<u64, ActivationHandler>>,
    /// Next activation token id.
    next_token: AtomicU64,
}

/// Scriptable [`Platform`] for tests.
///
/// Attaching notifications fails with [`AxError::ApiDisabled`] while the
/// mock is untrusted, like the real Accessibility API.
#[derive(Clone, Default)]
pub struct MockPlatform {
    /// Shared between clones.
    state: Arc<MockState>,
}

impl MockPlatform {
    /// Untrusted platform with no running applications.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the trust state.
    pub fn set_trusted(&self, v: bool) {
        self.state.trusted.store(v, Ordering::SeqCst);
    }

    /// Replace the running application list.
    pub fn set_apps(&self, apps: Vec<RunningApp>) {
        *self.state.apps.lock() = apps;
    }

    /// Set the host's own bundle identifier.
    pub fn set_own_bundle_id(&self, id: Option<&str>) {
        *self.state.own_bundle_id.lock() = id.map(str::to_string);
    }

    /// Make observer creation fail for `bundle_id`.
    pub fn set_unobservable(&self, bundle_id: &str) {
        self.state.unobservable.lock().insert(bundle_id.to_string());
    }

    /// Make attaching notifications fail for `bundle_id` (`None` clears).
    pub fn set_attach_error(&self, bundle_id: &str, err: Option<AxError>) {
        let mut errors = self.state.attach_errors.lock();
        match err {
            Some(err) => errors.insert(bundle_id.to_string(), err),
            None => errors.remove(bundle_id),
        };
    }

    /// Run `hook` at the start of every observer creation.
    pub fn on_create(&self, hook: CreateHook) {
        *self.state.create_hook.lock() = Some(hook);
    }

    /// Number of trust prompts requested.
    pub fn prompt_count(&self) -> usize {
        self.state.prompts.load(Ordering::SeqCst)
    }

    /// Bundle identifiers for which a handle was created, in order.
    pub fn created(&self) -> Vec<String> {
        self.state.created.lock().clone()
    }

    /// Successful attachments, in order.
    pub fn attached(&self) -> Vec<(String, AxNotification)> {
        self.state.attached.lock().clone()
    }

    /// Number of successful attachments for `bundle_id`.
    pub fn attach_count(&self, bundle_id: &str) -> usize {
        self.state
            .attached
            .lock()
            .iter()
            .filter(|(id, _)| id == bundle_id)
            .count()
    }

    /// Bundle identifiers whose handles were stopped, in order.
    pub fn stopped(&self) -> Vec<String> {
        self.state.stopped.lock().clone()
    }

    /// Number of installed activation observers.
    pub fn activation_observers(&self) -> usize {
        self.state.activation.lock().len()
    }

    /// Deliver an accessibility event to the live handle of `bundle_id`.
    /// Returns false when no live handle exists.
    pub fn emit(&self, bundle_id: &str, element: &MockElement, notification: AxNotification) -> bool {
        let callback = self.state.live.lock().get(bundle_id).cloned();
        match callback {
            Some(cb) => {
                cb(element, notification);
                true
            }
            None => false,
        }
    }

    /// Fire an activation notification to every installed observer.
    pub fn activate(&self, app: Option<RunningApp>) {
        let handlers: Vec<_> = self.state.activation.lock().values().cloned().collect();
        for handler in handlers {
            handler(app.clone());
        }
    }
}

impl Platform for MockPlatform {
    fn is_trusted(&self) -> bool {
        self.state.trusted.load(Ordering::SeqCst)
    }

    fn prompt_for_trust(&self) -> bool {
        self.state.prompts.fetch_add(1, Ordering::SeqCst);
        self.is_trusted()
    }

    fn running_applications(&self) -> Vec<RunningApp> {
        self.state.apps.lock().clone()
    }

    fn own_bundle_id(&self) -> Option<String> {
        self.state.own_bundle_id.lock().clone()
    }

    fn create_observer(
        &self,
        app: &RunningApp,
        callback: AxCallback,
    ) -> Option<Box<dyn ObservationHandle>> {
        let hook = self.state.create_hook.lock().clone();
        if let Some(hook) = hook {
            hook(app);
        }
        let id = app.bundle_id()?.to_string();
        if self.state.unobservable.lock().contains(&id) {
            return None;
        }
        self.state.created.lock().push(id.clone());
        Some(Box::new(MockHandle {
            id,
            state: Arc::clone(&self.state),
            callback: Some(callback),
            stopped: false,
        }))
    }

    fn add_activation_observer(&self, handler: ActivationHandler) -> Option<ActivationToken> {
        let token = self.state.next_token.fetch_add(1, Ordering::SeqCst);
        self.state.activation.lock().insert(token, handler);
        Some(ActivationToken(token))
    }

    fn remove_activation_observer(&self, token: ActivationToken) {
        self.state.activation.lock().remove(&token.0);
    }
}

/// Handle produced by [`MockPlatform`].
struct MockHandle {
    /// Bundle id of the observed app.
    id: String,
    /// Platform state to record into.
    state: Arc<MockState>,
    /// Event sink; dropped on stop.
    callback: Option<AxCallback>,
    /// Set once stopped.
    stopped: bool,
}

impl ObservationHandle for MockHandle {
    fn add_notification(&mut self, notification: AxNotification) -> Result<(), AxError> {
        if !self.state.trusted.load(Ordering::SeqCst) {
            return Err(AxError::ApiDisabled);
        }
        if let Some(err) = self.state.attach_errors.lock().get(&self.id) {
            return Err(*err);
        }
        self.state
            .attached
            .lock()
            .push((self.id.clone(), notification));
        if let Some(cb) = &self.callback {
            self.state.live.lock().insert(self.id.clone(), Arc::clone(cb));
        }
        Ok(())
    }

    fn stop(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;
        self.callback = None;
        self.state.live.lock().remove(&self.id);
        self.state.stopped.lock().push(self.id.clone());
    }
}

impl Drop for MockHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Delegate that records every notification.
#[derive(Default)]
pub struct RecordingDelegate {
    /// Delivered events, in order.
    events: Mutex<Vec<WatchEvent>>,
}

impl RecordingDelegate {
    /// All events so far, in delivery order.
    pub fn events(&self) -> Vec<WatchEvent> {
        self.events.lock().clone()
    }

    /// Number of `PermissionsGranted` notifications.
    pub fn granted_count(&self) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|e| matches!(e, WatchEvent::PermissionsGranted))
            .count()
    }

    /// Titles reported, in order.
    pub fn titles(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                WatchEvent::TitleChanged { title, .. } => Some(title.clone()),
                _ => None,
            })
            .collect()
    }

    /// Forget recorded events.
    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl WatchEyeDelegate for RecordingDelegate {
    fn did_receive_accessibility_permissions(&self) {
        self.events.lock().push(WatchEvent::PermissionsGranted);
    }

    fn did_focus_application(&self, app: &RunningApp) {
        self.events.lock().push(WatchEvent::AppFocused(app.clone()));
    }

    fn did_change_title(&self, app: &RunningApp, title: &str) {
        self.events.lock().push(WatchEvent::TitleChanged {
            app: app.clone(),
            title: title.to_string(),
        });
    }
}

/// A browser tab with fixed attributes.
#[derive(Debug, Clone, Default)]
pub struct MockTab {
    /// URL string.
    pub url: Option<String>,
    /// Tab title.
    pub title: Option<String>,
}

impl BrowserTab for MockTab {
    fn url(&self) -> Option<String> {
        self.url.clone()
    }

    fn title(&self) -> Option<String> {
        self.title.clone()
    }
}

/// A browser window with fixed attributes, usable for both dialects.
#[derive(Debug, Clone, Default)]
pub struct MockWindow {
    /// Chromium window mode.
    pub mode: Option<String>,
    /// Selected tab.
    pub tab: Option<MockTab>,
}

impl MockWindow {
    /// Window in `mode` whose selected tab shows `url`.
    pub fn with_url(mode: Option<&str>, url: &str) -> Self {
        Self {
            mode: mode.map(str::to_string),
            tab: Some(MockTab {
                url: Some(url.to_string()),
                title: None,
            }),
        }
    }

    /// The selected tab as a trait object.
    fn selected_tab(&self) -> Option<Box<dyn BrowserTab>> {
        self.tab
            .clone()
            .map(|t| Box::new(t) as Box<dyn BrowserTab>)
    }
}

impl ChromiumWindow for MockWindow {
    fn mode(&self) -> Option<String> {
        self.mode.clone()
    }

    fn active_tab(&self) -> Option<Box<dyn BrowserTab>> {
        self.selected_tab()
    }
}

impl SafariWindow for MockWindow {
    fn current_tab(&self) -> Option<Box<dyn BrowserTab>> {
        self.selected_tab()
    }
}

/// Scripting double keyed by bundle identifier.
#[derive(Clone, Default)]
pub struct MockScripting {
    /// Front windows by bundle id.
    windows: Arc<Mutex<HashMap<String, MockWindow>>>,
    /// Front-window lookups so far.
    queries: Arc<AtomicUsize>,
}

impl MockScripting {
    /// No browser has a window.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set (or with `None`, close) the front window of `bundle_id`.
    pub fn set_front_window(&self, bundle_id: &str, window: Option<MockWindow>) {
        let mut windows = self.windows.lock();
        match window {
            Some(w) => windows.insert(bundle_id.to_string(), w),
            None => windows.remove(bundle_id),
        };
    }

    /// Number of front-window lookups performed.
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    /// Count a lookup and return the front window.
    fn front(&self, bundle_id: &str) -> Option<MockWindow> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        self.windows.lock().get(bundle_id).cloned()
    }
}

impl Scripting for MockScripting {
    fn chromium_front_window(&self, bundle_id: &str) -> Option<Box<dyn ChromiumWindow>> {
        self.front(bundle_id)
            .map(|w| Box::new(w) as Box<dyn ChromiumWindow>)
    }

    fn safari_front_window(&self, bundle_id: &str) -> Option<Box<dyn SafariWindow>> {
        self.front(bundle_id)
            .map(|w| Box::new(w) as Box<dyn SafariWindow>)
    }
}
