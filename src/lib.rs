//! Crate entry point for **mine**.
//!
//! This library provides the internal implementation for the `mine` CLI.
//! Each submodule encapsulates one responsibility (config file format, path
//! handling, the command catalog, dispatching). The `pub use` re-exports make
//! the commands accessible directly from the crate root.

pub mod catalog;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod logger;
pub mod paths;

pub use catalog::{AddRequest, add_command, cmd_add, cmd_list, list_lines};
pub use config::store::ConfigStore;
pub use config::{CommandEntry, Config, ConfigCommand, cmd_config};
pub use dispatch::{cmd_exec, execute};
pub use error::{DecodeError, Error, ErrorKind, ValueError};
