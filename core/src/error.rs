//! # Error Handling
//!
//! Provides the unified `AppError` enum used across the workspace.

use derive_more::{Display, From};
use std::path::{Path, PathBuf};

/// The Global Error Enum.
///
/// We use `derive_more` for boilerplate.
/// Note: String errors default to `General`.
#[derive(Debug, Display, From)]
pub enum AppError {
    /// Wrapper for standard IO errors.
    #[display("IO Error: {_0}")]
    Io(std::io::Error),

    /// Rust source that could not be parsed into declarations.
    #[from(ignore)]
    #[display("Parse Error: {_0}")]
    Parse(String),

    /// Schema text whose blocks cannot be bounded (e.g. unbalanced braces).
    #[from(ignore)]
    #[display("Structural Error: {_0}")]
    Structural(String),

    /// A named block the caller required is absent.
    #[from(ignore)]
    #[display("Not Found: {_0}")]
    NotFound(String),

    /// Invalid project configuration or resource kind.
    #[from(ignore)]
    #[display("Config Error: {_0}")]
    Config(String),

    /// An error attributed to a specific file.
    #[from(ignore)]
    #[display("{}: {error}", path.display())]
    InFile {
        /// The file being read, edited, or written.
        path: PathBuf,
        /// The underlying failure.
        error: Box<AppError>,
    },

    /// Generic errors.
    #[display("General Error: {_0}")]
    General(String),
}

impl AppError {
    /// Attaches the offending path to this error.
    pub fn in_file(self, path: &Path) -> Self {
        AppError::InFile {
            path: path.to_path_buf(),
            error: Box::new(self),
        }
    }

    /// Returns the innermost error, skipping any path context.
    pub fn root(&self) -> &AppError {
        match self {
            AppError::InFile { error, .. } => error.root(),
            other => other,
        }
    }
}

/// Manual implementation of the standard Error trait.
impl std::error::Error for AppError {}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Config(err.to_string())
    }
}

/// Helper type alias for Result using AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};

    #[test]
    fn test_io_conversion() {
        let io_err = Error::new(ErrorKind::Other, "test");
        let app_err: AppError = io_err.into();
        assert!(matches!(app_err, AppError::Io(_)));
    }

    #[test]
    fn test_string_conversion() {
        // String defaults to General, never to the structural variants
        let msg = String::from("something wrong");
        let app_err: AppError = msg.into();
        match app_err {
            AppError::General(s) => assert_eq!(s, "something wrong"),
            _ => panic!("String should convert to AppError::General"),
        }
    }

    #[test]
    fn test_in_file_display_and_root() {
        let err = AppError::Structural("unbalanced braces".into()).in_file(Path::new("api.proto"));
        assert_eq!(
            format!("{}", err),
            "api.proto: Structural Error: unbalanced braces"
        );
        assert!(matches!(err.root(), AppError::Structural(_)));
    }
}
