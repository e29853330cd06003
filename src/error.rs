//! Typed errors for the settings core.
//!
//! Every failure the backends or the registry can produce maps onto one
//! variant here, and every variant maps onto one exit code of the command
//! surface. Nothing in the core retries: errors are reported and returned.

use std::path::PathBuf;

use thiserror::Error;

use crate::constants::exit;

#[derive(Debug, Error)]
pub enum SettingsError {
    /// No config path could be resolved or created.
    #[error("configuration unavailable: {reason}")]
    ConfigUnavailable { reason: String },

    /// The OS refused a write. Surfaced with its own exit code.
    #[error("permission denied writing {}: run with sudo", path.display())]
    PermissionDenied { path: PathBuf },

    /// A write targeted a key that is not present in the file.
    #[error("'{key}' not found in {}; add the line manually", path.display())]
    KeyMissing { key: String, path: PathBuf },

    #[error("invalid value '{value}' for {setting}: expected {expected}")]
    InvalidValue {
        setting: &'static str,
        value: String,
        expected: String,
    },

    #[error("{setting} does not support '{action}': {hint}")]
    NotSupported {
        setting: &'static str,
        action: &'static str,
        hint: String,
    },

    #[error("failed to {op} {daemon}: {reason}")]
    ProcessOpFailed {
        daemon: String,
        op: &'static str,
        reason: String,
    },

    #[error("unknown setting '{name}' for {category}")]
    UnknownSetting { category: &'static str, name: String },

    #[error("unknown category '{0}'")]
    UnknownCategory(String),

    #[error("unknown action '{0}'")]
    UnknownAction(String),

    #[error("missing argument: {0}")]
    MissingArgument(&'static str),
}

impl SettingsError {
    /// Exit code reported to the shell for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            SettingsError::UnknownSetting { .. }
            | SettingsError::UnknownCategory(_)
            | SettingsError::UnknownAction(_)
            | SettingsError::MissingArgument(_) => exit::USAGE,
            SettingsError::PermissionDenied { .. } => exit::PERMISSION,
            _ => exit::FAILURE,
        }
    }

    /// Classify an I/O failure on `path`, keeping permission problems distinct
    pub fn from_io(path: PathBuf, err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::PermissionDenied {
            SettingsError::PermissionDenied { path }
        } else {
            SettingsError::ConfigUnavailable {
                reason: format!("{}: {err}", path.display()),
            }
        }
    }
}

pub type SettingsResult<T> = std::result::Result<T, SettingsError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_caller_contract_errors_exit_with_usage_code() {
        let err = SettingsError::UnknownSetting {
            category: "effects",
            name: "bogus".to_string(),
        };
        assert_eq!(err.exit_code(), 2);
        assert_eq!(SettingsError::UnknownAction("frob".into()).exit_code(), 2);
        assert_eq!(SettingsError::MissingArgument("setting").exit_code(), 2);
    }

    #[test]
    fn test_permission_errors_get_their_own_code() {
        let err = SettingsError::from_io(
            PathBuf::from("/etc/x"),
            io::Error::new(io::ErrorKind::PermissionDenied, "nope"),
        );
        assert!(matches!(err, SettingsError::PermissionDenied { .. }));
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn test_other_io_errors_are_config_unavailable() {
        let err = SettingsError::from_io(
            PathBuf::from("/nowhere"),
            io::Error::new(io::ErrorKind::NotFound, "gone"),
        );
        assert!(matches!(err, SettingsError::ConfigUnavailable { .. }));
        assert_eq!(err.exit_code(), 1);
    }
}
