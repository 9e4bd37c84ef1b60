//! Render watcher events as output lines.

use watcheye::{Browser, BrowserInspector, RunningApp, WatchEvent};

/// Lines printed for `event`. Browser apps get their URL and privacy
/// state appended, queried live through `inspector`.
pub fn render(event: &WatchEvent, inspector: &BrowserInspector) -> Vec<String> {
    match event {
        WatchEvent::PermissionsGranted => vec!["permissions: granted".to_string()],
        WatchEvent::AppFocused(app) => {
            let mut lines = vec![format!("focus: {} (pid {})", app.label(), app.pid)];
            lines.extend(browser_lines(app, None, inspector));
            lines
        }
        WatchEvent::TitleChanged { app, title } => {
            let mut lines = vec![format!("title: {}: {title}", app.label())];
            lines.extend(browser_lines(app, Some(title), inspector));
            lines
        }
    }
}

/// Describe the front window of `browser`.
pub fn browser_lines(
    app: &RunningApp,
    title: Option<&str>,
    inspector: &BrowserInspector,
) -> Vec<String> {
    match app.browser() {
        Some(browser) => describe(browser, title, inspector),
        None => Vec::new(),
    }
}

/// URL, tab title and privacy state of `browser`'s front window.
pub fn describe(browser: Browser, title: Option<&str>, inspector: &BrowserInspector) -> Vec<String> {
    let url = inspector
        .url(browser)
        .map_or_else(|| "-".to_string(), String::from);
    let private = match inspector.is_incognito(browser, title) {
        Some(true) => "yes",
        Some(false) => "no",
        None => "unknown",
    };
    let mut lines = vec![
        format!("  {browser} url: {url}"),
        format!("  {browser} private: {private}"),
    ];
    if let Some(tab) = inspector.tab_title(browser) {
        lines.push(format!("  {browser} tab: {tab}"));
    }
    lines
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use watcheye::test_support::{MockScripting, MockWindow};

    use super::*;

    fn inspector() -> (BrowserInspector, MockScripting) {
        let scripting = MockScripting::new();
        (BrowserInspector::new(Arc::new(scripting.clone())), scripting)
    }

    #[test]
    fn plain_apps_get_one_line() {
        let (inspector, scripting) = inspector();
        let app = RunningApp::new(42, "com.example.Editor").with_name("Editor");
        let lines = render(&WatchEvent::AppFocused(app), &inspector);
        assert_eq!(lines, vec!["focus: Editor (pid 42)"]);
        assert_eq!(scripting.query_count(), 0);
    }

    #[test]
    fn browser_titles_include_url_and_privacy() {
        let (inspector, scripting) = inspector();
        scripting.set_front_window(
            Browser::Safari.bundle_id(),
            Some(MockWindow::with_url(None, "https://example.com/")),
        );
        let app = RunningApp::new(7, Browser::Safari.bundle_id()).with_name("Safari");
        let lines = render(
            &WatchEvent::TitleChanged {
                app,
                title: "Example — Private Browsing".into(),
            },
            &inspector,
        );
        assert_eq!(
            lines,
            vec![
                "title: Safari: Example — Private Browsing",
                "  safari url: https://example.com/",
                "  safari private: yes",
            ]
        );
    }

    #[test]
    fn closed_browser_reports_unknowns() {
        let (inspector, _) = inspector();
        let lines = describe(Browser::Chrome, None, &inspector);
        assert_eq!(lines, vec!["  chrome url: -", "  chrome private: unknown"]);
    }
}
