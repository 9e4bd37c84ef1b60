//! Error types for the watcher and the Accessibility API.

use std::io;

use thiserror::Error;

/// Classification of Accessibility (AX) API error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AxError {
    /// Accessibility is disabled for this process: permission missing or revoked.
    #[error("accessibility API disabled")]
    ApiDisabled,
    /// The target process did not respond or could not complete the request.
    #[error("cannot complete AX request")]
    CannotComplete,
    /// The element does not support the requested notification.
    #[error("AX notification unsupported")]
    NotificationUnsupported,
    /// The notification was already registered on this observer.
    #[error("AX notification already registered")]
    NotificationAlreadyRegistered,
    /// The element is no longer valid (process or window gone).
    #[error("invalid AX element")]
    InvalidUiElement,
    /// The attribute exists but has no value.
    #[error("AX attribute has no value")]
    NoValue,
    /// The element does not expose the requested attribute.
    #[error("AX attribute unsupported")]
    AttributeUnsupported,
    /// Generic system failure.
    #[error("AX failure")]
    Failure,
    /// Any other AX error code.
    #[error("AX error code {0}")]
    Other(i32),
}

impl AxError {
    /// Map a raw `AXError` code to its classification.
    pub fn from_code(code: i32) -> Self {
        match code {
            -25211 => Self::ApiDisabled,
            -25204 => Self::CannotComplete,
            -25207 => Self::NotificationUnsupported,
            -25209 => Self::NotificationAlreadyRegistered,
            -25202 => Self::InvalidUiElement,
            -25212 => Self::NoValue,
            -25205 => Self::AttributeUnsupported,
            -25200 => Self::Failure,
            other => Self::Other(other),
        }
    }

    /// The raw `AXError` code.
    pub fn code(self) -> i32 {
        match self {
            Self::ApiDisabled => -25211,
            Self::CannotComplete => -25204,
            Self::NotificationUnsupported => -25207,
            Self::NotificationAlreadyRegistered => -25209,
            Self::InvalidUiElement => -25202,
            Self::NoValue => -25212,
            Self::AttributeUnsupported => -25205,
            Self::Failure => -25200,
            Self::Other(code) => code,
        }
    }

    /// True when the failure means the Accessibility permission is missing.
    ///
    /// This is the only retryable registration failure.
    pub fn is_permission_missing(self) -> bool {
        matches!(self, Self::ApiDisabled)
    }
}

/// Errors surfaced by WatchEye public APIs.
#[derive(Debug, Error)]
pub enum Error {
    /// A configuration file could not be parsed.
    #[error("invalid config: {0}")]
    Config(#[from] ron::error::SpannedError),

    /// Reading a file or spawning a helper process failed.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// The `osascript` runner exited unsuccessfully.
    #[error("osascript failed: {0}")]
    Script(String),

    /// A browser name did not match any known browser.
    #[error("unknown browser: {0}")]
    UnknownBrowser(String),

    /// An Accessibility API call failed.
    #[error(transparent)]
    Ax(#[from] AxError),
}

/// Result alias for WatchEye operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_roundtrip_through_classification() {
        for code in [-25211, -25204, -25207, -25209, -25202, -25212, -25205, -25200, -1] {
            assert_eq!(AxError::from_code(code).code(), code);
        }
    }

    #[test]
    fn only_api_disabled_is_permission_missing() {
        assert!(AxError::from_code(-25211).is_permission_missing());
        assert!(!AxError::CannotComplete.is_permission_missing());
        assert!(!AxError::Other(-25211 + 1).is_permission_missing());
    }
}
