//! Command-line interface definitions for watcheye-dump.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use logging::LogArgs;
use watcheye::Browser;

/// Command-line interface for the `watcheye-dump` binary.
#[derive(Parser, Debug)]
#[command(
    name = "watcheye-dump",
    about = "Print focus, window title and browser events",
    version
)]
pub struct Cli {
    /// Logging controls shared across watcheye binaries.
    #[command(flatten)]
    pub log: LogArgs,

    /// Optional path to a watcher configuration file (RON).
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// What to do; defaults to `watch`.
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Stream focus and title changes until interrupted.
    Watch,
    /// Query a browser's front window once.
    Browser(BrowserArgs),
    /// Report Accessibility permission state.
    Check(CheckArgs),
}

/// Arguments for the `browser` subcommand.
#[derive(Args, Debug, Clone)]
pub struct BrowserArgs {
    /// Browser name (brave, safari, chrome, arc) or bundle identifier.
    #[arg(value_name = "BROWSER")]
    pub browser: Browser,

    /// Front window title, used to detect Safari private windows.
    #[arg(long, value_name = "TITLE")]
    pub title: Option<String>,
}

/// Arguments for the `check` subcommand.
#[derive(Args, Debug, Clone, Copy)]
pub struct CheckArgs {
    /// Show the system prompt if access is missing.
    #[arg(long)]
    pub prompt: bool,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn watch_is_the_default() {
        let cli = Cli::try_parse_from(["watcheye-dump", "--debug"]).expect("parse");
        assert!(cli.command.is_none());
        assert!(cli.log.debug);
    }

    #[test]
    fn browser_accepts_names_and_bundle_ids() {
        let cli = Cli::try_parse_from(["watcheye-dump", "browser", "Chrome"]).expect("parse");
        match cli.command {
            Some(Commands::Browser(args)) => assert_eq!(args.browser, Browser::Chrome),
            other => panic!("unexpected command: {other:?}"),
        }
        let cli = Cli::try_parse_from([
            "watcheye-dump",
            "browser",
            "com.apple.Safari",
            "--title",
            "Docs — Private Browsing",
            "--config",
            "eye.ron",
        ])
        .expect("parse");
        assert_eq!(cli.config, Some(PathBuf::from("eye.ron")));
        match cli.command {
            Some(Commands::Browser(args)) => {
                assert_eq!(args.browser, Browser::Safari);
                assert_eq!(args.title.as_deref(), Some("Docs — Private Browsing"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn unknown_browser_is_rejected() {
        assert!(Cli::try_parse_from(["watcheye-dump", "browser", "mosaic"]).is_err());
    }
}
