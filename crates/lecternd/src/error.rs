//! Error types for the lectern command line driver.

use thiserror::Error;

use super::*;

/// Errors surfaced by the CLI.
#[derive(Error, Debug)]
pub enum LecternCliError {
  /// The reader rejected an operation
  #[error(transparent)]
  Lectern(#[from] LecternError),

  /// Reading or writing a file failed
  #[error(transparent)]
  Io(#[from] std::io::Error),

  /// An interactive prompt failed
  #[error(transparent)]
  Dialog(#[from] dialoguer::Error),

  /// A script or configuration file is not valid TOML
  #[error(transparent)]
  TomlDe(#[from] toml::de::Error),

  /// Writing TOML output failed
  #[error(transparent)]
  TomlSer(#[from] toml::ser::Error),

  /// Writing JSON output failed
  #[error(transparent)]
  Json(#[from] serde_json::Error),

  /// A replayed step could not be applied
  #[error("Script error at step {step}: {message}")]
  Script {
    /// 1-based step number
    step:    usize,
    /// What went wrong
    message: String,
  },
}

/// Type alias for Result with [`LecternCliError`] as the error type.
pub type Result<T> = core::result::Result<T, LecternCliError>;
