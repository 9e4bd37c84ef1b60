use std::sync::Arc;

use url::Url;
use watcheye::{
    Browser, BrowserInspector, RunningApp,
    test_support::{MockScripting, MockTab, MockWindow},
};

fn inspector() -> (BrowserInspector, MockScripting) {
    let scripting = MockScripting::new();
    (BrowserInspector::new(Arc::new(scripting.clone())), scripting)
}

#[test]
fn safari_privacy_comes_from_window_title() {
    let (inspector, scripting) = inspector();

    assert_eq!(
        inspector.is_incognito(Browser::Safari, Some("Example — Private Browsing")),
        Some(true)
    );
    assert_eq!(
        inspector.is_incognito(Browser::Safari, Some("Example")),
        Some(false)
    );
    assert_eq!(inspector.is_incognito(Browser::Safari, None), None);
    assert_eq!(scripting.query_count(), 0);
}

#[test]
fn chromium_privacy_comes_from_window_mode() {
    let (inspector, scripting) = inspector();
    scripting.set_front_window(
        Browser::Chrome.bundle_id(),
        Some(MockWindow::with_url(Some("normal"), "https://example.com")),
    );
    scripting.set_front_window(
        Browser::Brave.bundle_id(),
        Some(MockWindow::with_url(Some("incognito"), "https://example.org")),
    );

    assert_eq!(inspector.is_incognito(Browser::Chrome, None), Some(false));
    // The title is irrelevant for Chromium browsers.
    assert_eq!(
        inspector.is_incognito(Browser::Brave, Some("Private Browsing")),
        Some(true)
    );
    assert_eq!(inspector.is_incognito(Browser::Arc, None), None);
}

#[test]
fn url_of_selected_tab() {
    let (inspector, scripting) = inspector();
    scripting.set_front_window(
        Browser::Chrome.bundle_id(),
        Some(MockWindow::with_url(Some("normal"), "https://example.com")),
    );
    scripting.set_front_window(
        Browser::Safari.bundle_id(),
        Some(MockWindow {
            mode: None,
            tab: Some(MockTab {
                url: Some("https://apple.com/mac/".into()),
                title: Some("Mac - Apple".into()),
            }),
        }),
    );

    assert_eq!(
        inspector.url(Browser::Chrome),
        Some(Url::parse("https://example.com").expect("url"))
    );
    assert_eq!(
        inspector.url(Browser::Safari).map(|u| u.to_string()),
        Some("https://apple.com/mac/".to_string())
    );
    assert_eq!(
        inspector.tab_title(Browser::Safari).as_deref(),
        Some("Mac - Apple")
    );
    assert_eq!(inspector.tab_title(Browser::Chrome), None);
}

#[test]
fn missing_window_tab_or_bad_url_is_none() {
    let (inspector, scripting) = inspector();
    assert_eq!(inspector.url(Browser::Brave), None);

    scripting.set_front_window(
        Browser::Brave.bundle_id(),
        Some(MockWindow {
            mode: Some("normal".into()),
            tab: None,
        }),
    );
    assert_eq!(inspector.url(Browser::Brave), None);

    scripting.set_front_window(
        Browser::Brave.bundle_id(),
        Some(MockWindow::with_url(Some("normal"), "not a url")),
    );
    assert_eq!(inspector.url(Browser::Brave), None);
}

#[test]
fn every_call_queries_live_state() {
    let (inspector, scripting) = inspector();
    let id = Browser::Arc.bundle_id();
    scripting.set_front_window(id, Some(MockWindow::with_url(Some("normal"), "https://a.test/")));

    assert_eq!(
        inspector.url(Browser::Arc).map(String::from),
        Some("https://a.test/".to_string())
    );
    scripting.set_front_window(id, Some(MockWindow::with_url(Some("incognito"), "https://b.test/")));
    assert_eq!(
        inspector.url(Browser::Arc).map(String::from),
        Some("https://b.test/".to_string())
    );
    assert_eq!(inspector.is_incognito(Browser::Arc, None), Some(true));
    scripting.set_front_window(id, None);
    assert_eq!(inspector.url(Browser::Arc), None);
    assert_eq!(scripting.query_count(), 4);
}

#[test]
fn only_known_bundle_ids_resolve() {
    assert_eq!(
        Browser::resolve(&RunningApp::new(1, "com.google.Chrome")),
        Some(Browser::Chrome)
    );
    assert_eq!(
        Browser::resolve(&RunningApp::new(1, "company.thebrowser.Browser")),
        Some(Browser::Arc)
    );
    assert_eq!(Browser::resolve(&RunningApp::new(1, "com.apple.TextEdit")), None);
    assert_eq!(Browser::resolve(&RunningApp::new(1, "com.google.chrome")), None);
    assert_eq!(Browser::resolve(&RunningApp::anonymous(1)), None);
    assert!("netscape".parse::<Browser>().is_err());
    assert_eq!("Safari".parse::<Browser>().ok(), Some(Browser::Safari));
}
