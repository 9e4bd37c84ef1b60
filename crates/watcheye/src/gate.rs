//! Accessibility permission gate.
//!
//! On construction the gate asks the platform for trust with the prompt
//! option. When access is missing it polls on a dedicated thread until access
//! arrives, then replays deferred registrations and fires the one-time
//! "permissions granted" notification.

use std::{
    sync::{
        Arc, Weak,
        atomic::{AtomicBool, Ordering},
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use crossbeam_channel::{Sender, select, tick};
use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::{event::WatchEyeDelegate, platform::Platform, registry::Registry};

/// Repeating poll thread with an explicit stop channel.
struct PollTimer {
    /// Dropping this disconnects the stop channel.
    stop: Option<Sender<()>>,
    /// The poll thread; taken by `cancel`.
    thread: Option<JoinHandle<()>>,
}

impl PollTimer {
    /// Start polling `gate` every `interval`; `None` if the thread cannot start.
    fn spawn(gate: Weak<PermissionGate>, interval: Duration) -> Option<Self> {
        let (stop_tx, stop_rx) = crossbeam_channel::bounded::<()>(1);
        let spawned = thread::Builder::new()
            .name("watcheye-permission-poll".into())
            .spawn(move || {
                let ticker = tick(interval);
                loop {
                    select! {
                        recv(stop_rx) -> _ => break,
                        recv(ticker) -> _ => {
                            let Some(gate) = gate.upgrade() else { break };
                            if gate.poll() {
                                break;
                            }
                        }
                    }
                }
                debug!("permission poll stopped");
            });
        match spawned {
            Ok(thread) => Some(Self {
                stop: Some(stop_tx),
                thread: Some(thread),
            }),
            Err(e) => {
                warn!("failed to spawn permission poll thread: {}", e);
                None
            }
        }
    }

    /// Stop the thread and wait for it, unless called from the thread itself.
    fn cancel(&mut self) {
        self.stop.take();
        if let Some(thread) = self.thread.take()
            && thread.thread().id() != thread::current().id()
        {
            let _ = thread.join();
        }
    }
}

/// Gate around the platform Accessibility trust state.
pub struct PermissionGate {
    /// Source of the trust state.
    platform: Arc<dyn Platform>,
    /// Holds the deferred queue replayed on grant.
    registry: Arc<Registry>,
    /// Receives the granted notification.
    delegate: Arc<dyn WatchEyeDelegate>,
    /// Set once the granted notification has been delivered.
    granted: AtomicBool,
    /// Bumped when the asynchronous grant is detected.
    allowed: watch::Sender<bool>,
    /// Running poll timer, if any.
    timer: Mutex<Option<PollTimer>>,
}

impl PermissionGate {
    /// Create a gate; nothing happens until [`Self::check_and_request`].
    pub fn new(
        platform: Arc<dyn Platform>,
        registry: Arc<Registry>,
        delegate: Arc<dyn WatchEyeDelegate>,
    ) -> Arc<Self> {
        let (allowed, _) = watch::channel(platform.is_trusted());
        Arc::new(Self {
            platform,
            registry,
            delegate,
            granted: AtomicBool::new(false),
            allowed,
            timer: Mutex::new(None),
        })
    }

    /// Check trust, prompting once if needed.
    ///
    /// Signals the delegate synchronously when already trusted; otherwise
    /// starts polling every `interval`.
    pub fn check_and_request(self: &Arc<Self>, interval: Duration) {
        if self.platform.prompt_for_trust() {
            self.signal_granted();
            return;
        }
        info!(
            "accessibility access not granted; polling every {:?}",
            interval
        );
        let timer = PollTimer::spawn(Arc::downgrade(self), interval);
        *self.timer.lock() = timer;
    }

    /// One poll step. Returns true once the gate has finished.
    ///
    /// On the first trusted poll: invalidate the permission observable,
    /// replay deferred registrations in order, then notify the delegate.
    pub fn poll(&self) -> bool {
        if self.granted.load(Ordering::SeqCst) {
            return true;
        }
        if !self.platform.is_trusted() {
            return false;
        }
        info!("accessibility access granted");
        self.allowed.send_replace(true);
        self.registry.flush_deferred();
        self.signal_granted();
        true
    }

    /// Whether a future prompt would be shown (access currently missing).
    pub fn will_prompt_for_access(&self) -> bool {
        !self.platform.is_trusted()
    }

    /// Current trust state, queried live.
    pub fn is_allowed(&self) -> bool {
        self.platform.is_trusted()
    }

    /// Receiver that changes when the asynchronous grant is detected.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.allowed.subscribe()
    }

    /// True once the granted notification has fired.
    pub fn has_granted(&self) -> bool {
        self.granted.load(Ordering::SeqCst)
    }

    /// Stop polling. Idempotent.
    pub fn cancel(&self) {
        let timer = self.timer.lock().take();
        if let Some(mut timer) = timer {
            timer.cancel();
        }
    }

    /// Notify the delegate unless it already was.
    fn signal_granted(&self) {
        if !self.granted.swap(true, Ordering::SeqCst) {
            self.delegate.did_receive_accessibility_permissions();
        }
    }
}

impl Drop for PermissionGate {
    fn drop(&mut self) {
        if let Some(mut timer) = self.timer.get_mut().take() {
            timer.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MockPlatform, RecordingDelegate};

    fn gate(platform: &MockPlatform) -> (Arc<PermissionGate>, Arc<RecordingDelegate>) {
        let delegate = Arc::new(RecordingDelegate::default());
        let platform: Arc<dyn Platform> = Arc::new(platform.clone());
        let registry = Arc::new(Registry::new(platform.clone(), delegate.clone()));
        (
            PermissionGate::new(platform, registry, delegate.clone()),
            delegate,
        )
    }

    #[test]
    fn poll_is_noop_until_trusted_then_finishes_once() {
        let platform = MockPlatform::new();
        let (gate, delegate) = gate(&platform);
        assert!(gate.will_prompt_for_access());
        assert!(!gate.poll());
        assert!(!gate.has_granted());

        platform.set_trusted(true);
        assert!(gate.poll());
        assert!(gate.poll());
        assert_eq!(delegate.granted_count(), 1);
        assert!(!gate.will_prompt_for_access());
    }

    #[test]
    fn poll_invalidates_observable() {
        let platform = MockPlatform::new();
        let (gate, _) = gate(&platform);
        let mut rx = gate.subscribe();
        assert!(!*rx.borrow_and_update());
        platform.set_trusted(true);
        gate.poll();
        assert!(rx.has_changed().unwrap());
        assert!(*rx.borrow_and_update());
    }

    #[test]
    fn cancel_is_idempotent() {
        let platform = MockPlatform::new();
        let (gate, _) = gate(&platform);
        gate.check_and_request(Duration::from_millis(5));
        gate.cancel();
        gate.cancel();
        assert_eq!(platform.prompt_count(), 1);
    }
}
