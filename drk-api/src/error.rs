//! The error taxonomy of the framework (spec §7).
//!
//! Every run-time error a plugin's `on_error` hook might want to inspect, and
//! every build-time error the loader/composer can raise, lives here as a
//! single enum so the dispatcher can pattern-match on `kind()` without
//! downcasting.

use std::path::PathBuf;

use thiserror::Error;

/// Pinpoints where a build-time schema validation failure occurred.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaLocator {
    pub file: Option<PathBuf>,
    pub node_path: Vec<String>,
    pub field: Option<String>,
}

impl std::fmt::Display for SchemaLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(file) = &self.file {
            write!(f, "{}", file.display())?;
        }
        if !self.node_path.is_empty() {
            write!(f, " [{}]", self.node_path.join(" "))?;
        }
        if let Some(field) = &self.field {
            write!(f, " field `{field}`")?;
        }
        Ok(())
    }
}

/// The coarse-grained classification used for exit codes and `on_error`
/// dispatch; finer detail lives on the [`DrkError`] variant itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    CommandNotFound,
    UnknownOption,
    MissingArgument,
    TooManyArguments,
    InvalidOptionValue,
    DuplicateOption,
    InvalidUsage,
    HandlerError,
    SchemaInvalid,
    NameCollision,
    AmbiguousPath,
}

#[derive(Debug, Error)]
pub enum DrkError {
    #[error("Unknown command '{}'", offending.as_deref().unwrap_or(""))]
    CommandNotFound {
        path: Vec<String>,
        offending: Option<String>,
    },

    #[error("Unknown option '{token}'")]
    UnknownOption { token: String },

    #[error("Missing required argument '{name}'")]
    MissingArgument { name: String },

    #[error("Too many arguments: got {count}, expected at most {max}")]
    TooManyArguments { count: usize, max: usize },

    #[error("Invalid value '{value}' for option '{option}'")]
    InvalidOptionValue { option: String, value: String },

    #[error("Option '{name}' was given more than once")]
    DuplicateOption { name: String },

    #[error("{0}")]
    InvalidUsage(String),

    #[error(transparent)]
    HandlerError(#[from] anyhow::Error),

    #[error("schema invalid at {locator}: {message}")]
    SchemaInvalid {
        locator: SchemaLocator,
        message: String,
    },

    #[error("name collision at {}: {detail}", path.join(" "))]
    NameCollision { path: Vec<String>, detail: String },

    #[error("ambiguous command path: {}", path.join(" "))]
    AmbiguousPath { path: Vec<String> },
}

impl DrkError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::CommandNotFound { .. } => ErrorKind::CommandNotFound,
            Self::UnknownOption { .. } => ErrorKind::UnknownOption,
            Self::MissingArgument { .. } => ErrorKind::MissingArgument,
            Self::TooManyArguments { .. } => ErrorKind::TooManyArguments,
            Self::InvalidOptionValue { .. } => ErrorKind::InvalidOptionValue,
            Self::DuplicateOption { .. } => ErrorKind::DuplicateOption,
            Self::InvalidUsage(_) => ErrorKind::InvalidUsage,
            Self::HandlerError(_) => ErrorKind::HandlerError,
            Self::SchemaInvalid { .. } => ErrorKind::SchemaInvalid,
            Self::NameCollision { .. } => ErrorKind::NameCollision,
            Self::AmbiguousPath { .. } => ErrorKind::AmbiguousPath,
        }
    }

    /// Process exit code per spec §6: 0 success, 1 unspecified failure or
    /// unknown command, 2 argument/option parsing/binding error, 64 invalid
    /// usage surfaced by a handler.
    pub fn exit_code(&self) -> i32 {
        match self.kind() {
            ErrorKind::CommandNotFound | ErrorKind::HandlerError => 1,
            ErrorKind::UnknownOption
            | ErrorKind::MissingArgument
            | ErrorKind::TooManyArguments
            | ErrorKind::InvalidOptionValue
            | ErrorKind::DuplicateOption => 2,
            ErrorKind::InvalidUsage => 64,
            // Build-time errors never reach a running process's exit path,
            // but give them a distinct non-zero code for completeness.
            ErrorKind::SchemaInvalid | ErrorKind::NameCollision | ErrorKind::AmbiguousPath => 70,
        }
    }
}

pub type Result<T> = std::result::Result<T, DrkError>;
