//! Accessibility observer handles backed by `AXObserver`.
//!
//! One observer per watched application. The run loop source is added to the
//! main run loop, so callbacks are delivered wherever the main run loop runs.
//!
//! A handle may be stopped from any thread, but the callback context is only
//! freed on the main thread. `stop` detaches the notifications, marks the
//! context inactive and queues the rest of the teardown; the queue is drained
//! by a block scheduled on the main run loop, between callouts.

use std::{
    ffi::c_void,
    mem,
    panic::{AssertUnwindSafe, catch_unwind},
    ptr,
    sync::atomic::{AtomicBool, Ordering},
};

use block2::{Block, RcBlock};

use core_foundation::{
    base::{CFRelease, CFTypeID, CFTypeRef, TCFType},
    runloop::{CFRunLoopSourceRef, kCFRunLoopCommonModes, kCFRunLoopDefaultMode},
    string::{CFString, CFStringGetTypeID, CFStringRef},
};
use parking_lot::{Mutex, const_mutex};
use tracing::{debug, trace};

use crate::{
    app::RunningApp,
    error::AxError,
    platform::{AxCallback, AxNotification, ObservationHandle, UiElement},
};

#[link(name = "ApplicationServices", kind = "framework")]
unsafe extern "C" {
    fn AXObserverCreate(
        pid: i32,
        callback: extern "C" fn(*mut c_void, *mut c_void, CFStringRef, *mut c_void),
        out: *mut *mut c_void,
    ) -> i32;
    fn AXObserverAddNotification(
        observer: *mut c_void,
        element: *mut c_void,
        notification: CFStringRef,
        refcon: *mut c_void,
    ) -> i32;
    fn AXObserverRemoveNotification(
        observer: *mut c_void,
        element: *mut c_void,
        notification: CFStringRef,
    ) -> i32;
    fn AXObserverGetRunLoopSource(observer: *mut c_void) -> *mut c_void;
    fn AXUIElementCreateApplication(pid: i32) -> *mut c_void;
    fn AXUIElementCopyAttributeValue(
        element: *mut c_void,
        attr: CFStringRef,
        value: *mut CFTypeRef,
    ) -> i32;
    fn AXUIElementGetTypeID() -> CFTypeID;
}

#[link(name = "CoreFoundation", kind = "framework")]
unsafe extern "C" {
    fn CFEqual(a: CFTypeRef, b: CFTypeRef) -> bool;
    fn CFGetTypeID(cf: CFTypeRef) -> CFTypeID;
    fn CFRunLoopGetMain() -> *mut c_void;
    fn CFRunLoopAddSource(rl: *mut c_void, source: CFRunLoopSourceRef, mode: CFStringRef);
    fn CFRunLoopRemoveSource(rl: *mut c_void, source: CFRunLoopSourceRef, mode: CFStringRef);
    fn CFRunLoopPerformBlock(rl: *mut c_void, mode: CFTypeRef, block: &Block<dyn Fn()>);
    fn CFRunLoopWakeUp(rl: *mut c_void);
}

/// Copy an attribute value, returning it only if it has the expected type.
/// The caller owns the returned reference.
fn copy_attr(element: *mut c_void, name: &'static str, type_id: CFTypeID) -> Option<CFTypeRef> {
    let attr = CFString::from_static_string(name);
    let mut value: CFTypeRef = ptr::null();
    let err =
        unsafe { AXUIElementCopyAttributeValue(element, attr.as_concrete_TypeRef(), &mut value) };
    if err != 0 {
        trace!(attr = name, err, "attribute unavailable");
        return None;
    }
    if value.is_null() {
        return None;
    }
    if unsafe { CFGetTypeID(value) } != type_id {
        unsafe { CFRelease(value) };
        return None;
    }
    Some(value)
}

/// An AX element; released on drop when owned.
struct AxElem {
    /// `AXUIElementRef`.
    ptr: *mut c_void,
    /// Whether this wrapper holds a +1 reference.
    owned: bool,
}

impl AxElem {
    /// Wrap an element owned by the caller (the AX callback argument).
    fn borrowed(ptr: *mut c_void) -> Self {
        Self { ptr, owned: false }
    }
}

impl Drop for AxElem {
    fn drop(&mut self) {
        if self.owned && !self.ptr.is_null() {
            unsafe { CFRelease(self.ptr as CFTypeRef) }
        }
    }
}

impl UiElement for AxElem {
    fn title(&self) -> Option<String> {
        let value = copy_attr(self.ptr, "AXTitle", unsafe { CFStringGetTypeID() })?;
        // SAFETY: copied under the create rule and type-checked above.
        let s = unsafe { CFString::wrap_under_create_rule(value as CFStringRef) };
        Some(s.to_string())
    }

    fn focused_window(&self) -> Option<Box<dyn UiElement>> {
        let value = copy_attr(self.ptr, "AXFocusedWindow", unsafe {
            AXUIElementGetTypeID()
        })?;
        Some(Box::new(AxElem {
            ptr: value as *mut c_void,
            owned: true,
        }))
    }
}

/// Context handed to the AX callback.
struct Ctx {
    /// Event sink for this application.
    callback: AxCallback,
    /// Cleared by `stop`; events arriving afterwards are dropped.
    active: AtomicBool,
    /// Interned `AXTitleChanged`.
    notif_title_changed: CFString,
    /// Interned `AXApplicationActivated`.
    notif_app_activated: CFString,
}

impl Ctx {
    /// Map a delivered notification name to the watched kind.
    fn classify(&self, notification: CFStringRef) -> Option<AxNotification> {
        let is = |s: &CFString| unsafe {
            CFEqual(notification as CFTypeRef, s.as_concrete_TypeRef() as CFTypeRef)
        };
        if is(&self.notif_title_changed) {
            Some(AxNotification::TitleChanged)
        } else if is(&self.notif_app_activated) {
            Some(AxNotification::ApplicationActivated)
        } else {
            None
        }
    }
}

/// AXObserver callback; runs on the main thread.
extern "C" fn ax_callback(
    _observer: *mut c_void,
    element: *mut c_void,
    notification: CFStringRef,
    refcon: *mut c_void,
) {
    if refcon.is_null() || element.is_null() {
        return;
    }
    // A single bad event must never unwind into the run loop.
    let _ = catch_unwind(AssertUnwindSafe(|| {
        // SAFETY: refcon is the Ctx of a registered observer. Contexts are
        // only freed by `drain_retired` on the main thread, after the source
        // has been removed, so it is valid for the whole callout.
        let ctx = unsafe { &*(refcon as *const Ctx) };
        if !ctx.active.load(Ordering::Acquire) {
            return;
        }
        if let Some(kind) = ctx.classify(notification) {
            (ctx.callback)(&AxElem::borrowed(element), kind);
        }
    }));
}

/// Run-loop resources of a stopped observer awaiting release on the main thread.
struct Retired {
    /// `AXObserverRef`.
    observer: *mut c_void,
    /// Application element.
    app: *mut c_void,
    /// Source registered on the main run loop.
    source: CFRunLoopSourceRef,
    /// Callback context.
    ctx: *mut Ctx,
}

// SAFETY: a Retired is inert until `release` runs on the main thread; moving
// the pointers between threads does not touch what they point to.
unsafe impl Send for Retired {}

impl Retired {
    /// Remove the source from the main run loop and free everything.
    ///
    /// # Safety
    /// Must run on the main thread, outside any callout of this source.
    unsafe fn release(self) {
        unsafe {
            CFRunLoopRemoveSource(CFRunLoopGetMain(), self.source, kCFRunLoopDefaultMode);
            CFRelease(self.app as CFTypeRef);
            CFRelease(self.observer as CFTypeRef);
            drop(Box::from_raw(self.ctx));
        }
    }
}

/// Stopped observers not yet released.
static RETIRED: Mutex<Vec<Retired>> = const_mutex(Vec::new());

/// Queue `retired` and schedule a drain on the main run loop.
fn retire(retired: Retired) {
    RETIRED.lock().push(retired);
    let block = RcBlock::new(|| {
        // SAFETY: run loop blocks execute on the main thread between callouts.
        unsafe { drain_retired() };
    });
    unsafe {
        let main = CFRunLoopGetMain();
        CFRunLoopPerformBlock(main, kCFRunLoopCommonModes as CFTypeRef, &block);
        CFRunLoopWakeUp(main);
    }
}

/// Release every retired observer.
///
/// # Safety
/// Must run on the main thread, outside any AX callout.
pub(crate) unsafe fn drain_retired() {
    let retired = mem::take(&mut *RETIRED.lock());
    for r in retired {
        unsafe { r.release() };
    }
}

/// Number of stopped observers whose release is still queued.
pub(crate) fn retired_count() -> usize {
    RETIRED.lock().len()
}

/// Observation handle for one process.
pub(crate) struct MacObserver {
    /// Observed process.
    pid: i32,
    /// `AXObserverRef`.
    observer: *mut c_void,
    /// Application element the notifications are attached to.
    app: *mut c_void,
    /// The observer's run loop source, added to the main run loop.
    source: CFRunLoopSourceRef,
    /// Callback context; ownership moves to the retire queue on stop.
    ctx: *mut Ctx,
    /// Attached notifications.
    subs: Vec<AxNotification>,
    /// Set once `stop` has run.
    stopped: bool,
}

// SAFETY: the handle only makes AX add/remove-notification calls and retain
// counting from its owning thread; the context it shares with the main-thread
// callback is freed on the main thread (see `retire`), never here.
unsafe impl Send for MacObserver {}

impl MacObserver {
    /// Create an observer for `app`; `None` if the process is gone or not
    /// observable.
    pub(crate) fn create(app: &RunningApp, callback: AxCallback) -> Option<Self> {
        let pid = app.pid;
        if pid <= 0 || unsafe { libc::kill(pid as libc::pid_t, 0) } != 0 {
            debug!(pid, "process not running");
            return None;
        }
        unsafe {
            let mut observer: *mut c_void = ptr::null_mut();
            let err = AXObserverCreate(pid, ax_callback, &mut observer);
            if err != 0 || observer.is_null() {
                debug!(pid, err, "AXObserverCreate failed");
                return None;
            }
            let app_elem = AXUIElementCreateApplication(pid);
            if app_elem.is_null() {
                CFRelease(observer as CFTypeRef);
                return None;
            }
            let source = AXObserverGetRunLoopSource(observer) as CFRunLoopSourceRef;
            if source.is_null() {
                CFRelease(app_elem as CFTypeRef);
                CFRelease(observer as CFTypeRef);
                return None;
            }
            let ctx = Box::into_raw(Box::new(Ctx {
                callback,
                active: AtomicBool::new(true),
                notif_title_changed: CFString::from_static_string(
                    AxNotification::TitleChanged.name(),
                ),
                notif_app_activated: CFString::from_static_string(
                    AxNotification::ApplicationActivated.name(),
                ),
            }));
            CFRunLoopAddSource(CFRunLoopGetMain(), source, kCFRunLoopDefaultMode);
            Some(Self {
                pid,
                observer,
                app: app_elem,
                source,
                ctx,
                subs: Vec::new(),
                stopped: false,
            })
        }
    }
}

impl ObservationHandle for MacObserver {
    fn add_notification(&mut self, notification: AxNotification) -> Result<(), AxError> {
        if self.stopped {
            return Err(AxError::InvalidUiElement);
        }
        let name = CFString::from_static_string(notification.name());
        let err = unsafe {
            AXObserverAddNotification(
                self.observer,
                self.app,
                name.as_concrete_TypeRef(),
                self.ctx as *mut c_void,
            )
        };
        if err != 0 {
            match AxError::from_code(err) {
                AxError::NotificationAlreadyRegistered => {}
                e => return Err(e),
            }
        }
        if !self.subs.contains(&notification) {
            self.subs.push(notification);
        }
        Ok(())
    }

    fn stop(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;
        // SAFETY: ctx stays allocated until the retire queue is drained.
        unsafe { (*self.ctx).active.store(false, Ordering::Release) };
        for notification in self.subs.drain(..) {
            let name = CFString::from_static_string(notification.name());
            let _ = unsafe {
                AXObserverRemoveNotification(self.observer, self.app, name.as_concrete_TypeRef())
            };
        }
        retire(Retired {
            observer: self.observer,
            app: self.app,
            source: self.source,
            ctx: self.ctx,
        });
        self.ctx = ptr::null_mut();
        trace!(pid = self.pid, "observer stopped; release queued for main thread");
    }
}

impl Drop for MacObserver {
    fn drop(&mut self) {
        self.stop();
    }
}
