//! Workspace "application activated" observer via `NSNotificationCenter`.

use std::ptr::NonNull;

use block2::RcBlock;
use objc2::{
    rc::Retained,
    runtime::{AnyObject, ProtocolObject},
};
use objc2_app_kit::{
    NSRunningApplication, NSWorkspace, NSWorkspaceApplicationKey,
    NSWorkspaceDidActivateApplicationNotification,
};
use objc2_foundation::{NSNotification, NSObjectProtocol};
use tracing::info;

use crate::{app::RunningApp, mac::apps::running_app, platform::ActivationHandler};

/// Token returned by the notification center for an installed observer.
pub(crate) struct NsObserverToken(Retained<ProtocolObject<dyn NSObjectProtocol>>);

// SAFETY: the token is an opaque, immutable identity passed back to
// `removeObserver`, which NSNotificationCenter accepts from any thread.
unsafe impl Send for NsObserverToken {}

/// Extract the activated application from a workspace notification.
fn activated_app(notif: &NSNotification) -> Option<RunningApp> {
    let info = notif.userInfo()?;
    let obj = unsafe { info.objectForKey(NSWorkspaceApplicationKey) }?;
    let app = obj.downcast_ref::<NSRunningApplication>()?;
    Some(running_app(app))
}

/// Install an NSWorkspace "did activate application" observer.
///
/// The block runs on the thread posting the notification (the main thread).
pub(crate) fn add_activation_observer(handler: ActivationHandler) -> NsObserverToken {
    let block = RcBlock::new(move |notif: NonNull<NSNotification>| {
        // SAFETY: the notification center passes a valid notification.
        let notif = unsafe { notif.as_ref() };
        handler(activated_app(notif));
    });
    unsafe {
        let ws = NSWorkspace::sharedWorkspace();
        let center = ws.notificationCenter();
        let token = center.addObserverForName_object_queue_usingBlock(
            Some(NSWorkspaceDidActivateApplicationNotification),
            None,
            None,
            &block,
        );
        info!("NSWorkspace activation observer installed");
        NsObserverToken(token)
    }
}

/// Remove an observer installed by [`add_activation_observer`].
pub(crate) fn remove_activation_observer(token: NsObserverToken) {
    unsafe {
        let center = NSWorkspace::sharedWorkspace().notificationCenter();
        let observer = &*Retained::as_ptr(&token.0).cast::<AnyObject>();
        center.removeObserver(observer);
    }
    info!("NSWorkspace activation observer removed");
}
