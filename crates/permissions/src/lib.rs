//! macOS Accessibility trust checks for WatchEye.
//!
//! This crate exposes a minimal API over the Accessibility trust calls:
//! - [`accessibility_ok`] checks the global Accessibility permission. It is
//!   fast, never blocks and never prompts.
//! - [`prompt_accessibility`] performs the same check but asks the system to
//!   show its one-time permission dialog when the process is not yet trusted.
//! - [`will_prompt_for_access`] reports whether a prompt would be shown.
//!
//! On platforms other than macOS every process is reported as untrusted.

/// ApplicationServices trust calls.
#[cfg(target_os = "macos")]
mod ffi {
    use core_foundation::{dictionary::CFDictionaryRef, string::CFStringRef};

    #[link(name = "ApplicationServices", kind = "framework")]
    unsafe extern "C" {
        pub(crate) static kAXTrustedCheckOptionPrompt: CFStringRef;
        pub(crate) fn AXIsProcessTrusted() -> bool;
        pub(crate) fn AXIsProcessTrustedWithOptions(options: CFDictionaryRef) -> bool;
    }
}

/// Check whether the process is trusted for Accessibility (AX) APIs.
#[cfg(target_os = "macos")]
pub fn accessibility_ok() -> bool {
    unsafe { ffi::AXIsProcessTrusted() }
}

/// Check whether the process is trusted for Accessibility (AX) APIs.
#[cfg(not(target_os = "macos"))]
pub fn accessibility_ok() -> bool {
    false
}

/// Check Accessibility trust, asking the system to prompt the user if the
/// process is not yet trusted.
///
/// The prompt is asynchronous: this returns the trust state at the time of the
/// call, and the user's answer only becomes visible to later
/// [`accessibility_ok`] calls.
#[cfg(target_os = "macos")]
pub fn prompt_accessibility() -> bool {
    use core_foundation::{
        base::TCFType, boolean::CFBoolean, dictionary::CFDictionary, string::CFString,
    };

    // SAFETY: the key is an immutable framework constant.
    let key = unsafe { CFString::wrap_under_get_rule(ffi::kAXTrustedCheckOptionPrompt) };
    let options = CFDictionary::from_CFType_pairs(&[(key, CFBoolean::true_value())]);
    unsafe { ffi::AXIsProcessTrustedWithOptions(options.as_concrete_TypeRef()) }
}

/// Check Accessibility trust, asking the system to prompt the user if the
/// process is not yet trusted.
#[cfg(not(target_os = "macos"))]
pub fn prompt_accessibility() -> bool {
    false
}

/// Whether a trust prompt would be shown, i.e. the process is not trusted yet.
pub fn will_prompt_for_access() -> bool {
    !accessibility_ok()
}
