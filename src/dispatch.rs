//! Turning an alias into a shell command line and running it.
//!
//! [`prepare`] does every check that can fail without side effects and
//! produces an [`Invocation`]; [`Invocation::run`] hands the line to `sh -c`
//! with the terminal attached and waits for it.

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::catalog::ensure_file;
use crate::config::{Config, PATH_PLACEHOLDER};
use crate::error::Error;
use crate::paths::resolve_user_path;
use crate::success;

/// A fully resolved command, ready to launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub script: PathBuf,
    pub ext: String,
    pub command_line: String,
}

/// Resolve `alias` into an [`Invocation`] without spawning anything.
///
/// # Errors
/// - [`Error::AliasNotFound`] / [`Error::NoPathConfigured`]
/// - path resolution errors, [`Error::NotFound`], [`Error::IsDirectory`], [`Error::Io`]
/// - [`Error::NoExtension`], [`Error::NoExecutor`], [`Error::MissingPlaceholder`]
pub fn prepare(cfg: &Config, alias: &str) -> Result<Invocation, Error> {
    let entry = cfg.commands.get(alias).ok_or_else(|| Error::AliasNotFound {
        alias: alias.to_string(),
    })?;
    if entry.path.is_empty() {
        return Err(Error::NoPathConfigured {
            alias: alias.to_string(),
        });
    }

    let script = resolve_user_path(&entry.path)?;
    ensure_file(&script)?;

    let ext = extension_of(&script).ok_or_else(|| Error::NoExtension {
        path: script.clone(),
    })?;
    let template = cfg
        .executor(&ext)
        .ok_or_else(|| Error::NoExecutor { ext: ext.clone() })?;
    let command_line = build_command_line(template, &script, &ext)?;

    Ok(Invocation {
        script,
        ext,
        command_line,
    })
}

impl Invocation {
    /// Run under `sh -c`, inheriting stdin/stdout/stderr, and wait.
    pub fn run(&self) -> Result<(), Error> {
        let status = Command::new("sh")
            .arg("-c")
            .arg(&self.command_line)
            .status()
            .map_err(|source| Error::Spawn {
                command: self.command_line.clone(),
                source,
            })?;
        if !status.success() {
            return Err(Error::Failed { status });
        }
        Ok(())
    }
}

/// Look up `alias` and run it in the foreground.
pub fn execute(cfg: &Config, alias: &str) -> Result<(), Error> {
    prepare(cfg, alias)?.run()
}

/// CLI command: `mine exec <alias>`.
pub fn cmd_exec(cfg: &Config, alias: &str) -> Result<()> {
    execute(cfg, alias)?;
    success!("Execute {alias} done!");
    Ok(())
}

/// Lowercased text after the last `.` of the file name. A dotfile such as
/// `.sh` counts as having extension `sh`.
fn extension_of(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_string_lossy();
    let (_, ext) = name.rsplit_once('.')?;
    (!ext.is_empty()).then(|| ext.to_lowercase())
}

/// Substitute every placeholder in `template` with the shell-quoted path.
/// Paths that are not valid UTF-8 are refused rather than mangled.
pub fn build_command_line(template: &str, script: &Path, ext: &str) -> Result<String, Error> {
    if !template.contains(PATH_PLACEHOLDER) {
        return Err(Error::MissingPlaceholder {
            ext: ext.to_string(),
        });
    }
    let script = script.to_str().ok_or_else(|| Error::NonUtf8Path {
        path: script.to_path_buf(),
    })?;
    let quoted = shell_quote(script);
    Ok(template.replace(PATH_PLACEHOLDER, &quoted))
}

/// Single-quote `s` for POSIX sh; embedded `'` becomes `'\''`.
pub fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}
