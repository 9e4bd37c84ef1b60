use std::sync::Arc;

use watcheye::{
    ActivationPolicy, RunningApp, WatchEvent, WatchEye, WatchEyeCfg,
    platform::AxNotification,
    test_support::{MockElement, MockPlatform, RecordingDelegate},
};

fn watch(platform: &MockPlatform) -> (WatchEye, Arc<RecordingDelegate>) {
    let delegate = Arc::new(RecordingDelegate::default());
    let eye = WatchEye::with_platform(
        Arc::new(platform.clone()),
        delegate.clone(),
        WatchEyeCfg::default(),
    );
    delegate.clear();
    (eye, delegate)
}

fn trusted() -> MockPlatform {
    let platform = MockPlatform::new();
    platform.set_trusted(true);
    platform
}

#[test]
fn initial_sweep_filters_apps() {
    let platform = trusted();
    platform.set_own_bundle_id(Some("com.example.Host"));
    platform.set_apps(vec![
        RunningApp::new(1, "com.example.Host"),
        RunningApp::new(2, "com.example.Editor").with_name("Editor"),
        RunningApp::new(3, "com.example.Agent").with_policy(ActivationPolicy::Accessory),
        RunningApp::anonymous(4),
        RunningApp::new(5, "com.example.Daemon").with_policy(ActivationPolicy::Prohibited),
    ]);
    let (eye, _) = watch(&platform);

    assert_eq!(eye.registry().watched_ids(), vec!["com.example.Editor"]);
    assert_eq!(platform.created(), vec!["com.example.Editor"]);
}

#[test]
fn sweep_can_include_background_apps() {
    let platform = trusted();
    platform.set_apps(vec![
        RunningApp::new(2, "com.example.Editor"),
        RunningApp::new(3, "com.example.Agent").with_policy(ActivationPolicy::Accessory),
    ]);
    let cfg = WatchEyeCfg {
        regular_only: false,
        ..WatchEyeCfg::default()
    };
    let eye = WatchEye::with_platform(
        Arc::new(platform.clone()),
        Arc::new(RecordingDelegate::default()),
        cfg,
    );
    assert_eq!(
        eye.registry().watched_ids(),
        vec!["com.example.Agent", "com.example.Editor"]
    );
}

#[test]
fn activating_new_app_registers_before_focus_event() {
    let platform = trusted();
    let (eye, delegate) = watch(&platform);
    let app = RunningApp::new(7, "com.example.Mail").with_name("Mail");

    platform.activate(Some(app.clone()));

    assert!(eye.registry().is_watching("com.example.Mail"));
    assert_eq!(delegate.events(), vec![WatchEvent::AppFocused(app)]);
    assert_eq!(platform.attach_count("com.example.Mail"), 2);
}

#[test]
fn activating_known_app_does_not_reregister() {
    let platform = trusted();
    let app = RunningApp::new(2, "com.example.Editor");
    platform.set_apps(vec![app.clone()]);
    let (_eye, delegate) = watch(&platform);

    platform.activate(Some(app.clone()));
    platform.activate(Some(app.clone()));

    assert_eq!(platform.created(), vec!["com.example.Editor"]);
    assert_eq!(platform.attach_count("com.example.Editor"), 2);
    assert_eq!(
        delegate.events(),
        vec![WatchEvent::AppFocused(app.clone()), WatchEvent::AppFocused(app)]
    );
}

#[test]
fn activation_without_identifiable_app_is_ignored() {
    let platform = trusted();
    let (eye, delegate) = watch(&platform);

    platform.activate(None);
    platform.activate(Some(RunningApp::anonymous(9)));

    assert!(delegate.events().is_empty());
    assert!(eye.registry().is_empty());
}

#[test]
fn focus_while_untrusted_defers_but_still_reports() {
    let platform = MockPlatform::new();
    let (eye, delegate) = watch(&platform);
    let app = RunningApp::new(7, "com.example.Mail");

    platform.activate(Some(app.clone()));

    assert_eq!(eye.registry().deferred_ids(), vec!["com.example.Mail"]);
    assert_eq!(delegate.events(), vec![WatchEvent::AppFocused(app)]);
}

#[test]
fn activation_title_comes_from_focused_window() {
    let platform = trusted();
    let app = RunningApp::new(2, "com.example.Editor");
    platform.set_apps(vec![app.clone()]);
    let (_eye, delegate) = watch(&platform);

    platform.emit(
        "com.example.Editor",
        &MockElement::titled("Editor").with_focused_window(MockElement::titled("draft.md")),
        AxNotification::ApplicationActivated,
    );

    assert_eq!(
        delegate.events(),
        vec![WatchEvent::TitleChanged {
            app,
            title: "draft.md".into()
        }]
    );
}

#[test]
fn shutdown_is_idempotent_and_tears_everything_down() {
    let platform = trusted();
    platform.set_apps(vec![
        RunningApp::new(1, "com.example.A"),
        RunningApp::new(2, "com.example.B"),
    ]);
    let (eye, delegate) = watch(&platform);
    assert_eq!(platform.activation_observers(), 1);

    eye.shutdown();
    eye.shutdown();

    assert_eq!(platform.activation_observers(), 0);
    assert!(eye.registry().is_empty());
    let mut stopped = platform.stopped();
    stopped.sort();
    assert_eq!(stopped, vec!["com.example.A", "com.example.B"]);

    platform.activate(Some(RunningApp::new(3, "com.example.C")));
    assert!(delegate.events().is_empty());
    drop(eye);
    assert_eq!(platform.stopped().len(), 2);
}
