#![warn(missing_docs)]

//! Shared logging helpers and CLI argument definitions for the watcheye workspace.
//!
//! - [`LogArgs`]: clap flags controlling the log level
//! - [`compute_spec`]: turn those flags into a tracing filter directive
//! - [`init`]: install a `fmt` subscriber with the computed filter

use std::env;

use clap::Args;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Logging controls for CLI apps.
#[derive(Debug, Clone, Default, Args)]
pub struct LogArgs {
    /// Set global log level to trace (our crates only)
    #[arg(long, conflicts_with_all = ["debug", "log_level", "log_filter"])]
    pub trace: bool,

    /// Set global log level to debug (our crates only)
    #[arg(long, conflicts_with_all = ["trace", "log_level", "log_filter"])]
    pub debug: bool,

    /// Set a single global log level for our crates (error|warn|info|debug|trace)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Set an explicit tracing filter directive (overrides other flags)
    /// e.g. "watcheye=trace,watcheye_dump=debug"
    #[arg(long)]
    pub log_filter: Option<String>,
}

impl LogArgs {
    /// Filter spec for these flags, see [`compute_spec`].
    pub fn spec(&self) -> String {
        compute_spec(
            self.trace,
            self.debug,
            self.log_level.as_deref(),
            self.log_filter.as_deref(),
        )
    }
}

/// List of crate targets that constitute "our" logs.
pub fn our_crates() -> &'static [&'static str] {
    &["watcheye", "watcheye_dump", "permissions", "logging"]
}

/// Build a filter directive string that sets the same `level` for all of our crates.
pub fn level_spec_for(level: &str) -> String {
    let lvl = level.to_ascii_lowercase();
    our_crates()
        .iter()
        .map(|t| format!("{}={}", t, lvl))
        .collect::<Vec<_>>()
        .join(",")
}

/// Compute the final filter spec string with precedence:
/// - `log_filter`
/// - `trace`/`debug`/`log_level` (crate-scoped)
/// - `RUST_LOG` env
/// - default to crate-scoped `info`
pub fn compute_spec(
    trace: bool,
    debug: bool,
    log_level: Option<&str>,
    log_filter: Option<&str>,
) -> String {
    spec_with_env(
        trace,
        debug,
        log_level,
        log_filter,
        env::var("RUST_LOG").ok().as_deref(),
    )
}

/// [`compute_spec`] with the `RUST_LOG` value passed in explicitly.
fn spec_with_env(
    trace: bool,
    debug: bool,
    log_level: Option<&str>,
    log_filter: Option<&str>,
    rust_log: Option<&str>,
) -> String {
    if let Some(spec) = log_filter {
        return spec.to_string();
    }
    if trace {
        return level_spec_for("trace");
    }
    if debug {
        return level_spec_for("debug");
    }
    if let Some(lvl) = log_level {
        return level_spec_for(lvl);
    }
    match rust_log {
        Some(spec) if !spec.trim().is_empty() => spec.to_string(),
        _ => level_spec_for("info"),
    }
}

/// Create an `EnvFilter` from a spec string.
pub fn env_filter_from_spec(spec: &str) -> EnvFilter {
    EnvFilter::new(spec)
}

/// Install a global `fmt` subscriber filtered by `args`.
///
/// Safe to call more than once; only the first call installs a subscriber.
pub fn init(args: &LogArgs) {
    let spec = args.spec();
    let installed = tracing_subscriber::registry()
        .with(env_filter_from_spec(&spec))
        .with(fmt::layer().with_target(true))
        .try_init()
        .is_ok();
    debug!(spec = %spec, installed, "logging initialised");
}

#[cfg(test)]
mod tests {
    use tracing::dispatcher;

    use super::*;

    #[test]
    fn explicit_filter_wins() {
        let spec = spec_with_env(true, false, Some("warn"), Some("foo=debug"), Some("bar"));
        assert_eq!(spec, "foo=debug");
    }

    #[test]
    fn flags_scope_to_our_crates() {
        let spec = spec_with_env(false, true, None, None, Some("bar=trace"));
        assert!(spec.contains("watcheye=debug"));
        assert!(spec.contains("permissions=debug"));
        assert!(!spec.contains("bar"));
    }

    #[test]
    fn init_twice_is_harmless() {
        let args = LogArgs {
            log_filter: Some("logging=debug".into()),
            ..LogArgs::default()
        };
        init(&args);
        init(&LogArgs::default());
        assert!(dispatcher::has_been_set());
    }

    #[test]
    fn level_is_lowercased() {
        assert!(level_spec_for("WARN").starts_with("watcheye=warn"));
    }

    #[test]
    fn env_then_default() {
        assert_eq!(
            spec_with_env(false, false, None, None, Some("bar=trace")),
            "bar=trace"
        );
        assert_eq!(
            spec_with_env(false, false, None, None, None),
            level_spec_for("info")
        );
        assert_eq!(
            spec_with_env(false, false, None, None, Some("  ")),
            level_spec_for("info")
        );
    }
}
