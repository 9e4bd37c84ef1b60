//! Browser inspection: active tab URL and private-browsing state.
//!
//! Two automation dialects exist. Chromium-derived browsers expose
//! `window.mode` and `window.active tab`; Safari exposes `window.current tab`
//! and no private-mode attribute, so Safari privacy is inferred from the
//! window title instead.

use std::{fmt, str::FromStr, sync::Arc};

use url::Url;

use crate::{app::RunningApp, error::Error, scripting::OsaScripting};

/// Window mode reported by Chromium browsers for private windows.
pub const INCOGNITO_MODE: &str = "incognito";

/// Marker Safari appends to the title of private windows.
pub const PRIVATE_BROWSING_MARKER: &str = "Private Browsing";

/// Browsers the inspector knows how to query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Browser {
    /// Brave.
    Brave,
    /// Safari.
    Safari,
    /// Google Chrome.
    Chrome,
    /// Arc.
    Arc,
}

/// Automation dialect spoken by a browser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowserFamily {
    /// Chromium-derived scripting vocabulary.
    Chromium,
    /// Safari scripting vocabulary.
    Safari,
}

impl Browser {
    /// Every known browser.
    pub const ALL: [Self; 4] = [Self::Brave, Self::Safari, Self::Chrome, Self::Arc];

    /// Bundle identifier of the browser.
    pub fn bundle_id(self) -> &'static str {
        match self {
            Self::Brave => "com.brave.Browser",
            Self::Safari => "com.apple.Safari",
            Self::Chrome => "com.google.Chrome",
            Self::Arc => "company.thebrowser.Browser",
        }
    }

    /// Automation dialect.
    pub fn family(self) -> BrowserFamily {
        match self {
            Self::Safari => BrowserFamily::Safari,
            Self::Brave | Self::Chrome | Self::Arc => BrowserFamily::Chromium,
        }
    }

    /// Short lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Brave => "brave",
            Self::Safari => "safari",
            Self::Chrome => "chrome",
            Self::Arc => "arc",
        }
    }

    /// Exact match of a bundle identifier.
    pub fn from_bundle_id(bundle_id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|b| b.bundle_id() == bundle_id)
    }

    /// The browser `app` is, if any.
    pub fn resolve(app: &RunningApp) -> Option<Self> {
        app.bundle_id().and_then(Self::from_bundle_id)
    }
}

impl fmt::Display for Browser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Browser {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|b| b.name().eq_ignore_ascii_case(s) || b.bundle_id() == s)
            .ok_or_else(|| Error::UnknownBrowser(s.to_string()))
    }
}

/// A browser tab as exposed by its scripting dictionary.
pub trait BrowserTab {
    /// The URL string visible to the user.
    fn url(&self) -> Option<String>;
    /// Tab title (`title` for Chromium, `name` for Safari).
    fn title(&self) -> Option<String>;
}

/// A Chromium browser window.
pub trait ChromiumWindow {
    /// `"normal"` or `"incognito"`.
    fn mode(&self) -> Option<String>;
    /// The selected tab.
    fn active_tab(&self) -> Option<Box<dyn BrowserTab>>;
}

/// A Safari window.
pub trait SafariWindow {
    /// The selected tab.
    /// Selected tab of the front window, per browser family.
    fn current_tab(&self) -> Option<Box<dyn BrowserTab>>;
}

/// Scripting interface to running browsers. Each call reflects live state.
pub trait Scripting: Send + Sync {
    /// Front window of a Chromium browser, if it runs and has one.
    fn chromium_front_window(&self, bundle_id: &str) -> Option<Box<dyn ChromiumWindow>>;
    /// Front window of Safari, if it runs and has one.
    fn safari_front_window(&self, bundle_id: &str) -> Option<Box<dyn SafariWindow>>;
}

/// Stateless, on-demand browser inspector.
#[derive(Clone)]
pub struct BrowserInspector {
    /// Live browser access.
    scripting: Arc<dyn Scripting>,
}

impl Default for BrowserInspector {
    fn default() -> Self {
        Self::new(Arc::new(OsaScripting::new()))
    }
}

impl BrowserInspector {
    /// Inspector over the given scripting interface.
    pub fn new(scripting: Arc<dyn Scripting>) -> Self {
        Self { scripting }
    }

    /// Whether the browser's front window is private.
    ///
    /// Chromium browsers report their window mode. Safari does not, so
    /// `window_title` is checked for [`PRIVATE_BROWSING_MARKER`]; without a
    /// title the answer is unknown.
    pub fn is_incognito(&self, browser: Browser, window_title: Option<&str>) -> Option<bool> {
        match browser.family() {
            BrowserFamily::Chromium => {
                let mode = self
                    .scripting
                    .chromium_front_window(browser.bundle_id())?
                    .mode()?;
                Some(mode == INCOGNITO_MODE)
            }
            BrowserFamily::Safari => window_title.map(|t| t.contains(PRIVATE_BROWSING_MARKER)),
        }
    }

    /// URL of the front window's selected tab.
    pub fn url(&self, browser: Browser) -> Option<Url> {
        let raw = self.current_tab(browser)?.url()?;
        Url::parse(&raw).ok()
    }

    /// Title of the front window's selected tab.
    pub fn tab_title(&self, browser: Browser) -> Option<String> {
        self.current_tab(browser)?.title()
    }

    fn current_tab(&self, browser: Browser) -> Option<Box<dyn BrowserTab>> {
        match browser.family() {
            BrowserFamily::Chromium => self
                .scripting
                .chromium_front_window(browser.bundle_id())?
                .active_tab(),
            BrowserFamily::Safari => self
                .scripting
                .safari_front_window(browser.bundle_id())?
                .current_tab(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_is_exact() {
        for browser in Browser::ALL {
            let app = RunningApp::new(10, browser.bundle_id());
            assert_eq!(Browser::resolve(&app), Some(browser));
        }
        assert_eq!(Browser::resolve(&RunningApp::new(1, "com.apple.Safari.beta")), None);
        assert_eq!(Browser::resolve(&RunningApp::new(1, "com.google.chrome")), None);
        assert_eq!(Browser::resolve(&RunningApp::anonymous(1)), None);
    }

    #[test]
    fn families() {
        assert_eq!(Browser::Safari.family(), BrowserFamily::Safari);
        for b in [Browser::Brave, Browser::Chrome, Browser::Arc] {
            assert_eq!(b.family(), BrowserFamily::Chromium);
        }
    }

    #[test]
    fn parse_names_and_ids() {
        assert_eq!("Chrome".parse::<Browser>().unwrap(), Browser::Chrome);
        assert_eq!(
            "company.thebrowser.Browser".parse::<Browser>().unwrap(),
            Browser::Arc
        );
        assert!(matches!(
            "netscape".parse::<Browser>(),
            Err(Error::UnknownBrowser(_))
        ));
        assert_eq!(Browser::Brave.to_string(), "brave");
    }
}
