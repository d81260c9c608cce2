use anyhow::Result;
use std::fs;
use std::io::ErrorKind as IoErrorKind;
use std::path::{MAIN_SEPARATOR, Path, PathBuf};

use crate::config::store::ConfigStore;
use crate::config::{COMMANDS_FOLDER_KEY, CommandEntry, Config};
use crate::error::Error;
use crate::paths::{collapse_home_path, resolve_user_path};
use crate::{plain, success};

/// Arguments of `mine add`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddRequest {
    pub file: String,
    pub alias: String,
    pub description: String,
}

/// Register a script under `req.alias` and persist the config.
///
/// A bare file name is looked up inside `commands_folder` (created if
/// missing); anything that looks like a path is resolved on its own. The
/// stored path is shortened to `$HOME/...` when it lives under home.
///
/// # Errors
/// - [`Error::CommandsFolderNotConfigured`] if the scalar is unset or empty.
/// - [`Error::NotFound`] / [`Error::IsDirectory`] / [`Error::Io`] if the
///   script cannot be used.
/// - [`Error::InvalidAlias`] / [`Error::AliasExists`], checked only after the
///   script has been validated.
/// - A write failure from the store. The entry stays in `cfg` in that case.
pub fn add_command(
    store: &ConfigStore,
    cfg: &mut Config,
    req: &AddRequest,
) -> Result<CommandEntry, Error> {
    let folder_raw = cfg
        .scalar(COMMANDS_FOLDER_KEY)
        .filter(|v| !v.is_empty())
        .ok_or(Error::CommandsFolderNotConfigured)?;
    let folder = resolve_user_path(folder_raw)?;
    fs::create_dir_all(&folder).map_err(|e| Error::io(&folder, e))?;

    let script = if is_bare_name(&req.file) {
        folder.join(&req.file)
    } else {
        resolve_user_path(&req.file)?
    };
    ensure_file(&script)?;

    if !is_valid_alias(&req.alias) {
        return Err(Error::InvalidAlias {
            alias: req.alias.clone(),
        });
    }
    if cfg.commands.contains_key(&req.alias) {
        return Err(Error::AliasExists {
            alias: req.alias.clone(),
        });
    }

    let entry = CommandEntry {
        path: collapse_home_path(&script),
        description: req.description.clone(),
    };
    cfg.commands.insert(req.alias.clone(), entry.clone());
    store.save(cfg)?;
    Ok(entry)
}

/// `alias  description` for every command, sorted by alias.
pub fn list_lines(cfg: &Config) -> Vec<String> {
    cfg.commands
        .iter()
        .map(|(alias, entry)| format!("{alias}  {}", entry.description))
        .collect()
}

/// CLI command: `mine add <file> <alias> <description...>`.
pub fn cmd_add(store: &ConfigStore, cfg: &mut Config, req: &AddRequest) -> Result<()> {
    add_command(store, cfg, req)?;
    success!("command {:?} saved", req.alias);
    Ok(())
}

/// CLI command: `mine ls`.
///
/// Example output:
/// ```text
/// cleanup  Cleanup artifacts
/// deploy  Run deployment
/// ```
pub fn cmd_list(cfg: &Config) -> Result<()> {
    for line in list_lines(cfg) {
        plain!("{line}");
    }
    Ok(())
}

/// Stat `path` and require a regular file (symlinks are followed).
pub(crate) fn ensure_file(path: &Path) -> Result<(), Error> {
    match fs::metadata(path) {
        Ok(meta) if meta.is_dir() => Err(Error::IsDirectory {
            path: path.to_path_buf(),
        }),
        Ok(_) => Ok(()),
        Err(e) if e.kind() == IoErrorKind::NotFound => Err(Error::NotFound {
            path: path.to_path_buf(),
        }),
        Err(e) => Err(Error::io(PathBuf::from(path), e)),
    }
}

/// A plain file name that belongs in `commands_folder`.
fn is_bare_name(value: &str) -> bool {
    !value.is_empty()
        && !Path::new(value).is_absolute()
        && !value.starts_with(['~', '$'])
        && !value.contains(MAIN_SEPARATOR)
}

/// Alias names end up in `[commands.<alias>]` headers.
fn is_valid_alias(alias: &str) -> bool {
    !alias.is_empty()
        && !alias
            .chars()
            .any(|c| c.is_whitespace() || c.is_control() || c == '[' || c == ']')
}
