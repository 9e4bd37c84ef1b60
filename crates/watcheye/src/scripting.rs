//! `osascript`-backed implementation of [`Scripting`].
//!
//! Each attribute hop is its own AppleScript query against the live browser.
//! Every script is guarded with `is running` so a query never launches a
//! browser, and returns an empty string when the hop is unavailable.

use std::{process::Command, sync::Arc};

use tracing::debug;

use crate::{
    browser::{BrowserTab, ChromiumWindow, SafariWindow, Scripting},
    error::{Error, Result},
};

/// Runs AppleScript snippets through `osascript`.
#[derive(Debug, Clone)]
pub struct OsaRunner {
    /// Interpreter to execute.
    program: String,
}

impl Default for OsaRunner {
    fn default() -> Self {
        Self {
            program: "osascript".into(),
        }
    }
}

impl OsaRunner {
    /// Execute `script` and return its trimmed output; `None` when empty or
    /// `missing value`.
    pub fn run(&self, script: &str) -> Result<Option<String>> {
        let output = Command::new(&self.program).arg("-e").arg(script).output()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Script(stderr.trim().to_string()));
        }
        Ok(normalize(&String::from_utf8_lossy(&output.stdout)))
    }

    /// Like [`Self::run`], collapsing failures to `None`.
    fn query(&self, script: &str) -> Option<String> {
        match self.run(script) {
            Ok(value) => value,
            Err(e) => {
                debug!("browser query failed: {}", e);
                None
            }
        }
    }
}

/// Scripting interface that talks to browsers through `osascript`.
#[derive(Debug, Clone, Default)]
pub struct OsaScripting {
    /// Shared with the windows and tabs it hands out.
    runner: Arc<OsaRunner>,
}

impl OsaScripting {
    /// Use the system `osascript`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the browser runs and has at least one window.
    fn has_front_window(&self, bundle_id: &str) -> bool {
        self.runner
            .query(&front_window_script(bundle_id, "\"1\""))
            .is_some()
    }
}

impl Scripting for OsaScripting {
    fn chromium_front_window(&self, bundle_id: &str) -> Option<Box<dyn ChromiumWindow>> {
        if !self.has_front_window(bundle_id) {
            return None;
        }
        Some(Box::new(OsaWindow {
            runner: Arc::clone(&self.runner),
            bundle_id: bundle_id.to_string(),
        }))
    }

    fn safari_front_window(&self, bundle_id: &str) -> Option<Box<dyn SafariWindow>> {
        if !self.has_front_window(bundle_id) {
            return None;
        }
        Some(Box::new(OsaWindow {
            runner: Arc::clone(&self.runner),
            bundle_id: bundle_id.to_string(),
        }))
    }
}

/// Front window of a browser, addressed by bundle identifier.
struct OsaWindow {
    /// Script runner.
    runner: Arc<OsaRunner>,
    /// Browser to address.
    bundle_id: String,
}

impl OsaWindow {
    /// Tab reference evaluated lazily per attribute.
    fn tab(&self, tab_ref: &'static str, title_prop: &'static str) -> Box<dyn BrowserTab> {
        Box::new(OsaTab {
            runner: Arc::clone(&self.runner),
            bundle_id: self.bundle_id.clone(),
            tab_ref,
            title_prop,
        })
    }
}

impl ChromiumWindow for OsaWindow {
    fn mode(&self) -> Option<String> {
        self.runner
            .query(&front_window_script(&self.bundle_id, "mode of front window"))
    }

    fn active_tab(&self) -> Option<Box<dyn BrowserTab>> {
        Some(self.tab("active tab of front window", "title"))
    }
}

impl SafariWindow for OsaWindow {
    fn current_tab(&self) -> Option<Box<dyn BrowserTab>> {
        Some(self.tab("current tab of front window", "name"))
    }
}

/// Selected tab of a browser's front window.
struct OsaTab {
    /// Script runner.
    runner: Arc<OsaRunner>,
    /// Browser to address.
    bundle_id: String,
    /// AppleScript reference to the tab.
    tab_ref: &'static str,
    /// Title property name in this browser's dictionary.
    title_prop: &'static str,
}

impl BrowserTab for OsaTab {
    fn url(&self) -> Option<String> {
        let expr = format!("URL of {}", self.tab_ref);
        self.runner.query(&front_window_script(&self.bundle_id, &expr))
    }

    fn title(&self) -> Option<String> {
        let expr = format!("{} of {}", self.title_prop, self.tab_ref);
        self.runner.query(&front_window_script(&self.bundle_id, &expr))
    }
}

/// Script evaluating `expr` inside the browser when it runs and has a window.
fn front_window_script(bundle_id: &str, expr: &str) -> String {
    let id = quote(bundle_id);
    format!(
        "if application id {id} is running then\n\
         \ttell application id {id}\n\
         \t\tif (count of windows) > 0 then return ({expr}) as text\n\
         \tend tell\n\
         end if\n\
         return \"\""
    )
}

/// AppleScript string literal.
fn quote(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Trim runner output; empty and `missing value` mean absent.
fn normalize(out: &str) -> Option<String> {
    let out = out.trim_end_matches(['\n', '\r']);
    if out.trim().is_empty() || out == "missing value" {
        None
    } else {
        Some(out.to_string())
    }
}
