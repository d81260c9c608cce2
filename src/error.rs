//! Error types shared by the config store, catalog and dispatcher.
//!
//! Every failure the core can report has its own variant carrying the
//! path, alias, key or extension involved. Callers that only care about
//! the broad class can use [`Error::kind`].

use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

use crate::config::PATH_PLACEHOLDER;

/// Broad failure class of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The config file text is malformed.
    Decode,
    /// A request was rejected before touching the filesystem or catalog.
    Validation,
    /// A stat/read/write/mkdir failed.
    Filesystem,
    /// The alias could not be turned into a command line, or the command failed.
    Executor,
}

/// Malformed config text. Line numbers are 1-based.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("line {line}: invalid config line: {text:?}")]
    InvalidLine { line: usize, text: String },

    #[error("line {line}: invalid config key in line: {text:?}")]
    EmptyKey { line: usize, text: String },

    #[error("line {line}: unknown section [{name}]")]
    UnknownSection { line: usize, name: String },

    #[error("line {line}: command name is empty in section header")]
    EmptyAlias { line: usize },

    #[error("line {line}: unknown key {key:?} in commands.{alias}")]
    UnknownCommandKey {
        line: usize,
        alias: String,
        key: String,
    },

    #[error("line {line}: invalid value for {key:?}")]
    InvalidValue {
        line: usize,
        key: String,
        #[source]
        source: ValueError,
    },
}

/// Why a single value could not be read.
#[derive(Debug, Error)]
pub enum ValueError {
    #[error("empty value")]
    Empty,

    #[error("multi-line strings are not supported")]
    MultiLine,

    #[error("quoted value is unterminated or followed by extra text")]
    Unterminated,

    #[error("quoted value is not a string")]
    NotAString,

    #[error("{}", .0.message())]
    Unquote(#[source] toml::de::Error),
}

/// Errors returned by the core modules.
#[derive(Debug, Error)]
pub enum Error {
    // Decode
    #[error("failed to parse config {}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: DecodeError,
    },

    // Validation
    #[error("commands_folder is not configured")]
    CommandsFolderNotConfigured,

    #[error("command {alias:?} already exists")]
    AliasExists { alias: String },

    #[error("invalid command name {alias:?}")]
    InvalidAlias { alias: String },

    #[error("command {alias:?} not found")]
    AliasNotFound { alias: String },

    #[error("command {alias:?} has no path configured")]
    NoPathConfigured { alias: String },

    #[error("config item {key:?} not found")]
    ConfigKeyNotFound { key: String },

    #[error("invalid config key {key:?}")]
    InvalidConfigKey { key: String },

    #[error("path is empty")]
    EmptyPath,

    #[error("cannot expand ~ because HOME is not set")]
    HomeNotFound,

    // Filesystem
    #[error("command file {:?} does not exist", .path.display().to_string())]
    NotFound { path: PathBuf },

    #[error("command path {:?} is a directory, expected file", .path.display().to_string())]
    IsDirectory { path: PathBuf },

    #[error("unable to access {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unable to determine the current directory")]
    CurrentDir(#[source] io::Error),

    #[error("unable to determine the user config directory")]
    ConfigDirNotFound,

    // Executor
    #[error("command file {:?} has no extension", .path.display().to_string())]
    NoExtension { path: PathBuf },

    #[error("command path {:?} is not valid UTF-8", .path.display().to_string())]
    NonUtf8Path { path: PathBuf },

    #[error("no executor configured for extension {ext:?}")]
    NoExecutor { ext: String },

    #[error("executor command for extension {ext:?} must include {}", PATH_PLACEHOLDER)]
    MissingPlaceholder { ext: String },

    #[error("unable to launch executor command {command:?}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("executor command failed: {status}")]
    Failed { status: ExitStatus },
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Decode { .. } => ErrorKind::Decode,
            Error::CommandsFolderNotConfigured
            | Error::AliasExists { .. }
            | Error::InvalidAlias { .. }
            | Error::AliasNotFound { .. }
            | Error::NoPathConfigured { .. }
            | Error::ConfigKeyNotFound { .. }
            | Error::InvalidConfigKey { .. }
            | Error::EmptyPath
            | Error::HomeNotFound => ErrorKind::Validation,
            Error::NotFound { .. }
            | Error::IsDirectory { .. }
            | Error::Io { .. }
            | Error::CurrentDir(_)
            | Error::ConfigDirNotFound => ErrorKind::Filesystem,
            Error::NoExtension { .. }
            | Error::NonUtf8Path { .. }
            | Error::NoExecutor { .. }
            | Error::MissingPlaceholder { .. }
            | Error::Spawn { .. }
            | Error::Failed { .. } => ErrorKind::Executor,
        }
    }

    /// Wrap an I/O error with the path it happened on.
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
