use std::fs;
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};

use super::{Config, codec};
use crate::error::{Error, Result};
use crate::paths::config_file_path;

/// Owns the location of one config file and moves [`Config`] values in and
/// out of it. Writes are plain full-file overwrites.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store for the `-config-file` value (or the default file).
    pub fn locate(name: Option<&str>) -> Result<Self> {
        Ok(Self::new(config_file_path(name)?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory holding the config file.
    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or(Path::new("."))
    }

    /// Read and decode the file.
    ///
    /// # Errors
    /// - [`Error::Io`] if the file cannot be read (including when missing).
    /// - [`Error::Decode`] if the text is malformed.
    pub fn load(&self) -> Result<Config> {
        let text = fs::read_to_string(&self.path).map_err(|e| Error::io(&self.path, e))?;
        codec::decode(&text).map_err(|source| Error::Decode {
            path: self.path.clone(),
            source,
        })
    }

    /// Load the file, creating it with defaults first if it is missing.
    ///
    /// Default executors merged in by [`codec::decode`] are not written
    /// back here; the file only changes on the next explicit save.
    pub fn load_or_init(&self) -> Result<Config> {
        self.ensure_dir()?;
        match self.load() {
            Ok(cfg) => Ok(cfg),
            Err(Error::Io { source, .. }) if source.kind() == IoErrorKind::NotFound => {
                let cfg = Config::with_defaults(self.dir());
                self.save(&cfg)?;
                Ok(cfg)
            }
            Err(e) => Err(e),
        }
    }

    /// Encode and overwrite the file.
    pub fn save(&self, cfg: &Config) -> Result<()> {
        self.ensure_dir()?;
        fs::write(&self.path, codec::encode(cfg)).map_err(|e| Error::io(&self.path, e))
    }

    fn ensure_dir(&self) -> Result<()> {
        let dir = self.dir();
        fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))
    }
}
