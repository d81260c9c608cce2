//! In-memory config model and the `-config` command.
//!
//! Example file:
//! ```toml
//! commands_folder = "$HOME/.config/mine/commands"
//!
//! [executors]
//! js = "node {{path}}"
//! py = "python3 {{path}}"
//! sh = "sh {{path}}"
//!
//! [commands.deploy]
//! path = "$HOME/.config/mine/commands/deploy.sh"
//! description = "Run deployment"
//! ```

pub mod codec;
pub mod store;

use anyhow::Result;
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::Error;
use crate::{plain, success};
use store::ConfigStore;

/// Token an executor template must contain; replaced by the quoted script path.
pub const PATH_PLACEHOLDER: &str = "{{path}}";

/// Scalar holding the default directory for bare script names.
pub const COMMANDS_FOLDER_KEY: &str = "commands_folder";

/// Built-in executors, filled into every loaded config that lacks them.
pub const DEFAULT_EXECUTORS: &[(&str, &str)] = &[
    ("js", "node {{path}}"),
    ("py", "python3 {{path}}"),
    ("sh", "sh {{path}}"),
];

/// A registered alias.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandEntry {
    pub path: String,
    pub description: String,
}

/// Decoded config file. Maps are ordered so encoding is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub scalars: BTreeMap<String, String>,
    pub executors: BTreeMap<String, String>,
    pub commands: BTreeMap<String, CommandEntry>,
}

impl Config {
    /// Config written the first time a config file is created.
    pub fn with_defaults(config_dir: &Path) -> Self {
        let mut cfg = Config::default();
        cfg.scalars.insert(
            COMMANDS_FOLDER_KEY.to_string(),
            config_dir.join("commands").display().to_string(),
        );
        cfg.merge_default_executors();
        cfg
    }

    /// Add any built-in executor the config does not define. Existing
    /// entries are left untouched.
    pub fn merge_default_executors(&mut self) {
        for (ext, template) in DEFAULT_EXECUTORS {
            self.executors
                .entry(ext.to_string())
                .or_insert_with(|| template.to_string());
        }
    }

    /// Insert or replace an executor; the extension is stored lowercase.
    pub fn set_executor(&mut self, ext: &str, template: impl Into<String>) {
        self.executors.insert(ext.to_lowercase(), template.into());
    }

    pub fn executor(&self, ext: &str) -> Option<&str> {
        self.executors.get(&ext.to_lowercase()).map(String::as_str)
    }

    pub fn scalar(&self, key: &str) -> Option<&str> {
        self.scalars.get(key).map(String::as_str)
    }

    /// Set a scalar after checking the key survives an encode/decode cycle.
    pub fn set_scalar(&mut self, key: &str, value: impl Into<String>) -> Result<(), Error> {
        if !is_valid_scalar_key(key) {
            return Err(Error::InvalidConfigKey {
                key: key.to_string(),
            });
        }
        self.scalars.insert(key.to_string(), value.into());
        Ok(())
    }
}

fn is_valid_scalar_key(key: &str) -> bool {
    !key.is_empty()
        && !key.starts_with(['[', '#'])
        && !key.contains('=')
        && !key.chars().any(|c| c.is_whitespace() || c.is_control())
}

/// What `-config` was asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigCommand {
    PrintAll,
    Get { key: String },
    Set { key: String, value: String },
}

impl ConfigCommand {
    /// Build from the zero, one or two values following `-config`.
    pub fn from_args(args: &[String]) -> Option<Self> {
        match args {
            [] => Some(ConfigCommand::PrintAll),
            [key] => Some(ConfigCommand::Get { key: key.clone() }),
            [key, value] => Some(ConfigCommand::Set {
                key: key.clone(),
                value: value.clone(),
            }),
            _ => None,
        }
    }
}

/// CLI command: print the whole config, print one scalar, or set one.
///
/// # Errors
/// - [`Error::ConfigKeyNotFound`] when printing a scalar that is not set.
/// - [`Error::InvalidConfigKey`] or a write failure when setting.
pub fn cmd_config(store: &ConfigStore, cfg: &mut Config, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::PrintAll => {
            plain!("{}", codec::encode(cfg).trim_end_matches('\n'));
        }
        ConfigCommand::Get { key } => {
            let value = cfg
                .scalar(&key)
                .ok_or_else(|| Error::ConfigKeyNotFound { key: key.clone() })?;
            plain!("{value}");
        }
        ConfigCommand::Set { key, value } => {
            cfg.set_scalar(&key, value)?;
            store.save(cfg)?;
            success!("{key} updated");
        }
    }
    Ok(())
}
