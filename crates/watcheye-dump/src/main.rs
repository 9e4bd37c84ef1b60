#![warn(missing_docs)]

//! Entry point for the `watcheye-dump` binary.

mod cli;
mod error;
mod report;

use std::process;

use clap::Parser;
use tracing::error;
use watcheye::{BrowserInspector, WatchEyeCfg};

use crate::{
    cli::{BrowserArgs, CheckArgs, Cli, Commands},
    error::Result,
};

/// Run the CLI and exit non-zero on failure.
fn main() {
    if let Err(err) = run() {
        error!("{err}");
        eprintln!("error: {err}");
        process::exit(1);
    }
}

/// Parse CLI arguments, install logging, and dispatch to the chosen subcommand.
fn run() -> Result<()> {
    let Cli {
        log,
        config,
        command,
    } = Cli::parse();
    logging::init(&log);

    let cfg = match config {
        Some(path) => WatchEyeCfg::load(&path)?,
        None => WatchEyeCfg::default(),
    };

    match command.unwrap_or(Commands::Watch) {
        Commands::Watch => watch(cfg),
        Commands::Browser(args) => {
            browser(&args);
            Ok(())
        }
        Commands::Check(args) => {
            check(args);
            Ok(())
        }
    }
}

/// Print one snapshot of a browser's front window.
fn browser(args: &BrowserArgs) {
    let inspector = BrowserInspector::default();
    for line in report::describe(args.browser, args.title.as_deref(), &inspector) {
        println!("{}", line.trim_start());
    }
}

/// Print the Accessibility permission state.
fn check(args: CheckArgs) {
    let trusted = if args.prompt {
        permissions::prompt_accessibility()
    } else {
        permissions::accessibility_ok()
    };
    println!("accessibility: {}", if trusted { "granted" } else { "missing" });
    println!("will prompt: {}", permissions::will_prompt_for_access());
}

/// Stream events until the process is killed.
///
/// The main thread runs the main run loop, which delivers Accessibility and
/// workspace notifications; a worker thread prints events.
#[cfg(target_os = "macos")]
fn watch(cfg: WatchEyeCfg) -> Result<()> {
    use std::{sync::Arc, thread};

    use core_foundation::runloop::CFRunLoop;
    use tokio::sync::mpsc;
    use tracing::info;
    use watcheye::{ChannelDelegate, WatchEye};

    if WatchEye::will_prompt_for_access() {
        println!("accessibility: missing; grant access in System Settings to see titles");
    }

    let (tx, mut rx) = mpsc::unbounded_channel();
    let printer = thread::Builder::new()
        .name("watcheye-dump-printer".into())
        .spawn(move || {
            let inspector = BrowserInspector::default();
            while let Some(event) = rx.blocking_recv() {
                for line in report::render(&event, &inspector) {
                    println!("{line}");
                }
            }
        })?;

    let eye = WatchEye::with_config(Arc::new(ChannelDelegate::new(tx)), cfg);
    info!(watched = eye.registry().len(), "watching");
    CFRunLoop::run_current();

    drop(eye);
    printer.join().ok();
    Ok(())
}

/// Watching needs the macOS run loop.
#[cfg(not(target_os = "macos"))]
fn watch(_cfg: WatchEyeCfg) -> Result<()> {
    Err(error::Error::Unsupported("watch"))
}
