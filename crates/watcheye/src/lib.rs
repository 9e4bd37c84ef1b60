//! watcheye: observe the focused application and window title changes, and
//! inspect the active tab of common browsers.
//!
//! The watcher combines three pieces:
//! - a permission gate that prompts for Accessibility access once and polls
//!   until it is granted,
//! - a registry holding one Accessibility observer per running application,
//!   keyed by bundle identifier,
//! - a listener for workspace "application activated" notifications that
//!   registers newly focused applications on demand.
//!
//! Notifications reach a [`WatchEyeDelegate`]; [`ChannelDelegate`] forwards
//! them into a Tokio channel as [`WatchEvent`]s.
//!
//! Integration overview (macOS):
//! - Build a [`WatchEye`] with [`WatchEye::new`] from any thread.
//! - Run the main run loop (AppKit, tao, or `CFRunLoop::run_current` on the
//!   main thread). Observer and activation callbacks are delivered there.
//! - Query browsers independently through [`BrowserInspector`].
//!
//! Every platform service sits behind [`Platform`] and [`Scripting`], so the
//! watcher runs on any OS against [`test_support::MockPlatform`].

mod app;
pub mod browser;
mod config;
mod error;
mod event;
mod focus;
mod gate;
#[cfg(target_os = "macos")]
pub mod mac;
pub mod platform;
mod registry;
pub mod scripting;
pub mod test_support;
mod watch;

// Ensure Accessibility symbols (kAX* constants, AX* functions) link correctly
#[cfg(target_os = "macos")]
#[link(name = "ApplicationServices", kind = "framework")]
unsafe extern "C" {}

pub use app::{ActivationPolicy, RunningApp};
pub use browser::{Browser, BrowserFamily, BrowserInspector, Scripting};
pub use config::WatchEyeCfg;
pub use error::{AxError, Error, Result};
pub use event::{ChannelDelegate, WatchEvent, WatchEyeDelegate};
pub use focus::FocusListener;
pub use gate::PermissionGate;
pub use platform::{ObservationHandle, Platform};
pub use registry::{Registration, Registry};
pub use watch::WatchEye;
