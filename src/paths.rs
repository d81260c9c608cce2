use std::env;
use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

pub const APP_NAME: &str = "mine";
pub const DEFAULT_CONFIG_NAME: &str = "config.toml";

/// Per-user application config directory (`$XDG_CONFIG_HOME/mine`, or the
/// platform config dir joined with `mine`).
pub fn app_home() -> Result<PathBuf> {
    let base = env::var_os("XDG_CONFIG_HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(dirs::config_dir)
        .ok_or(Error::ConfigDirNotFound)?;
    Ok(base.join(APP_NAME))
}

/// Work out where the config file lives from an optional `-config-file` value.
///
/// - nothing → `<app home>/config.toml`
/// - a bare name → `<app home>/<name>`
/// - an absolute path → used as is
/// - a relative path with a separator → relative to the current directory
///
/// `.toml` is appended whenever the file name has no extension.
pub fn config_file_path(name: Option<&str>) -> Result<PathBuf> {
    let target = name.filter(|n| !n.is_empty()).unwrap_or(DEFAULT_CONFIG_NAME);

    let mut path = if Path::new(target).is_absolute() {
        PathBuf::from(target)
    } else if target.contains(['/', '\\']) {
        absolutize(Path::new(target))?
    } else {
        app_home()?.join(target)
    };

    if path.extension().is_none() {
        path.set_extension("toml");
    }
    Ok(path)
}

/// The current user's home directory. `HOME` wins when set and non-empty.
pub fn home_dir() -> Option<PathBuf> {
    env::var_os("HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
}

/// Expand env vars and a leading `~`, then make the result absolute and clean.
///
/// # Errors
/// - [`Error::EmptyPath`] on empty input.
/// - [`Error::HomeNotFound`] when `~` has to be expanded but no home is known.
/// - [`Error::CurrentDir`] when a relative path cannot be anchored.
pub fn resolve_user_path(raw: &str) -> Result<PathBuf> {
    if raw.is_empty() {
        return Err(Error::EmptyPath);
    }

    let expanded = expand_env_with(raw, |name| env::var(name).ok());
    let expanded = expand_home_with(&expanded, home_dir().as_deref())?;
    absolutize(&expanded)
}

/// Shorten a path under the home directory to `$HOME/...` for storage.
/// Paths outside home come back unchanged.
pub fn collapse_home_path(path: &Path) -> String {
    match home_dir() {
        Some(home) => collapse_home_with(path, &home),
        None => path.display().to_string(),
    }
}

pub(crate) fn collapse_home_with(path: &Path, home: &Path) -> String {
    if path.as_os_str().is_empty() {
        return String::new();
    }

    let home = clean(home);
    let path_c = clean(path);

    if path_c == home {
        return "$HOME".to_string();
    }
    match path_c.strip_prefix(&home) {
        Ok(rest) if !rest.as_os_str().is_empty() => {
            Path::new("$HOME").join(rest).display().to_string()
        }
        _ => path.display().to_string(),
    }
}

/// Replace `$NAME` / `${NAME}` references using `lookup`.
///
/// A bare name is a run of ASCII alphanumerics and `_`, except that a
/// leading digit is a name on its own (`$1abc` is `$1` then `abc`).
/// Unknown variables expand to nothing. A `$` that does not start a
/// reference, or an unterminated `${`, is kept as written.
pub(crate) fn expand_env_with<F>(input: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    fn is_name_char(c: char) -> bool {
        c.is_ascii_alphanumeric() || c == '_'
    }

    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        if let Some(braced) = after.strip_prefix('{') {
            match braced.find('}') {
                Some(end) if end > 0 => {
                    out.push_str(&lookup(&braced[..end]).unwrap_or_default());
                    rest = &braced[end + 1..];
                }
                _ => {
                    out.push('$');
                    rest = after;
                }
            }
            continue;
        }

        let len = if after.starts_with(|c: char| c.is_ascii_digit()) {
            1
        } else {
            after
                .char_indices()
                .find(|&(_, c)| !is_name_char(c))
                .map_or(after.len(), |(i, _)| i)
        };
        if len == 0 {
            out.push('$');
        } else {
            out.push_str(&lookup(&after[..len]).unwrap_or_default());
        }
        rest = &after[len..];
    }

    out.push_str(rest);
    out
}

/// Expand `~` or `~/...` at the start of `path`. `~user` and a `~` anywhere
/// else are left alone.
pub(crate) fn expand_home_with(path: &str, home: Option<&Path>) -> Result<PathBuf> {
    let rest = match path.strip_prefix('~') {
        Some(r) if r.is_empty() || r.starts_with('/') => r.trim_start_matches('/'),
        _ => return Ok(PathBuf::from(path)),
    };

    let home = home.ok_or(Error::HomeNotFound)?;
    if rest.is_empty() {
        Ok(home.to_path_buf())
    } else {
        Ok(home.join(rest))
    }
}

fn absolutize(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(clean(path));
    }
    let cwd = env::current_dir().map_err(Error::CurrentDir)?;
    Ok(clean(&cwd.join(path)))
}

/// Lexically normalise a path: drop `.`, fold `..`, squash separators.
/// Symlinks are not followed.
pub(crate) fn clean(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for comp in path.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn expand_env_handles_plain_and_braced_names() {
        let lookup = vars(&[("HOME", "/home/u"), ("PROJ", "work")]);
        assert_eq!(expand_env_with("$HOME/bin", &lookup), "/home/u/bin");
        assert_eq!(expand_env_with("${HOME}/${PROJ}.sh", &lookup), "/home/u/work.sh");
        assert_eq!(expand_env_with("/a/$PROJ/b", &lookup), "/a/work/b");
    }

    #[test]
    fn expand_env_unknown_vars_become_empty() {
        let lookup = vars(&[]);
        assert_eq!(expand_env_with("/x/$NOPE/y", &lookup), "/x//y");
        assert_eq!(expand_env_with("${NOPE}", &lookup), "");
    }

    #[test]
    fn expand_env_keeps_stray_dollars() {
        let lookup = vars(&[("A", "1")]);
        assert_eq!(expand_env_with("cost$", &lookup), "cost$");
        assert_eq!(expand_env_with("a$-b", &lookup), "a$-b");
        assert_eq!(expand_env_with("${A", &lookup), "${A");
        assert_eq!(expand_env_with("$A$A", &lookup), "11");
    }

    #[test]
    fn expand_env_leading_digit_is_a_single_char_name() {
        let lookup = vars(&[("1", "one"), ("1abc", "wrong")]);
        assert_eq!(expand_env_with("$1abc", &lookup), "oneabc");
        assert_eq!(expand_env_with("${1abc}", &lookup), "wrong");
        assert_eq!(expand_env_with("x$9/y", &lookup), "x/y");
    }

    #[test]
    fn expand_home_only_at_start() {
        let home = Path::new("/home/u");
        assert_eq!(expand_home_with("~", Some(home)).unwrap(), PathBuf::from("/home/u"));
        assert_eq!(
            expand_home_with("~/scripts/a.sh", Some(home)).unwrap(),
            PathBuf::from("/home/u/scripts/a.sh")
        );
        assert_eq!(
            expand_home_with("/opt/~/a.sh", Some(home)).unwrap(),
            PathBuf::from("/opt/~/a.sh")
        );
        assert_eq!(
            expand_home_with("~other/a.sh", Some(home)).unwrap(),
            PathBuf::from("~other/a.sh")
        );
    }

    #[test]
    fn expand_home_without_home_fails_only_when_needed() {
        assert!(matches!(expand_home_with("~/a", None), Err(Error::HomeNotFound)));
        assert_eq!(expand_home_with("/a", None).unwrap(), PathBuf::from("/a"));
    }

    #[test]
    fn clean_folds_dots() {
        assert_eq!(clean(Path::new("/a/./b/../c//d")), PathBuf::from("/a/c/d"));
        assert_eq!(clean(Path::new("/../a")), PathBuf::from("/a"));
        assert_eq!(clean(Path::new("a/../..")), PathBuf::from(".."));
    }

    #[test]
    fn collapse_variants() {
        let home = Path::new("/home/u");
        assert_eq!(collapse_home_with(Path::new("/home/u"), home), "$HOME");
        assert_eq!(collapse_home_with(Path::new("/home/u/"), home), "$HOME");
        assert_eq!(
            collapse_home_with(Path::new("/home/u/bin/x.sh"), home),
            "$HOME/bin/x.sh"
        );
        assert_eq!(
            collapse_home_with(Path::new("/home/user2/x.sh"), home),
            "/home/user2/x.sh"
        );
        assert_eq!(collapse_home_with(Path::new("/opt/x.sh"), home), "/opt/x.sh");
    }

    #[test]
    fn resolve_rejects_empty() {
        assert!(matches!(resolve_user_path(""), Err(Error::EmptyPath)));
    }

    #[test]
    #[serial]
    fn resolve_expands_home_and_env() {
        let td = tempfile::tempdir().unwrap();
        let home = td.path().to_path_buf();
        unsafe {
            env::set_var("HOME", &home);
            env::set_var("MINE_TEST_DIR", "tools");
        }

        assert_eq!(resolve_user_path("~/a.sh").unwrap(), home.join("a.sh"));
        assert_eq!(resolve_user_path("$HOME/b.sh").unwrap(), home.join("b.sh"));
        assert_eq!(
            resolve_user_path("~/${MINE_TEST_DIR}/../c.sh").unwrap(),
            home.join("c.sh")
        );

        unsafe { env::remove_var("MINE_TEST_DIR") };
    }

    #[test]
    #[serial]
    fn resolve_relative_uses_cwd() {
        let td = tempfile::tempdir().unwrap();
        let old = env::current_dir().unwrap();
        env::set_current_dir(td.path()).unwrap();
        let cwd = env::current_dir().unwrap();

        let got = resolve_user_path("./scripts/run.sh");
        env::set_current_dir(old).unwrap();

        assert_eq!(got.unwrap(), cwd.join("scripts").join("run.sh"));
    }

    #[test]
    #[serial]
    fn collapse_uses_home_env() {
        let td = tempfile::tempdir().unwrap();
        unsafe { env::set_var("HOME", td.path()) };
        let p = td.path().join("x").join("y.sh");
        assert_eq!(collapse_home_path(&p), "$HOME/x/y.sh");
    }

    #[test]
    #[serial]
    fn config_file_path_rules() {
        let td = tempfile::tempdir().unwrap();
        unsafe { env::set_var("XDG_CONFIG_HOME", td.path()) };
        let home = td.path().join(APP_NAME);

        assert_eq!(config_file_path(None).unwrap(), home.join("config.toml"));
        assert_eq!(config_file_path(Some("")).unwrap(), home.join("config.toml"));
        assert_eq!(config_file_path(Some("work")).unwrap(), home.join("work.toml"));
        assert_eq!(config_file_path(Some("work.conf")).unwrap(), home.join("work.conf"));
        assert_eq!(
            config_file_path(Some("/etc/mine/main")).unwrap(),
            PathBuf::from("/etc/mine/main.toml")
        );

        let cwd = env::current_dir().unwrap();
        assert_eq!(
            config_file_path(Some("conf/team")).unwrap(),
            clean(&cwd.join("conf/team.toml"))
        );

        unsafe { env::remove_var("XDG_CONFIG_HOME") };
    }
}
