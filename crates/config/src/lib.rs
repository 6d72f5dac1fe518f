//! Configuration for the folio catalog.
//!
//! Configuration is layered with `figment`, later layers winning:
//! 1. Platform defaults (data directory from [`directories::ProjectDirs`]).
//! 2. An optional config file, in TOML, YAML or JSON depending on its
//!    extension.
//! 3. Environment variables prefixed with `FOLIO_` (e.g. `FOLIO_DATA_DIR`).

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::OptionExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default location of the database file, relative to the data directory.
pub const DEFAULT_DATABASE: &str = "catalog.sqlite3";
const ENV_PREFIX: &str = "FOLIO_";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Absolute directory that hosts the catalog database. Everything the
    /// cache stores on disk lives below it.
    pub data_dir: PathBuf,
    /// Database file, relative to [`data_dir`](Self::data_dir).
    pub database: PathBuf,
}

impl Config {
    /// Defaults derived from the platform's conventional data directory.
    pub fn platform_defaults() -> Result<Self> {
        let dirs = ProjectDirs::from("org", "folio", "folio").ok_or_raise(|| ErrorKind::NoProjectDirs)?;
        Ok(Self::with_data_dir(dirs.data_dir()))
    }

    /// Defaults rooted at an explicit data directory.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            database: PathBuf::from(DEFAULT_DATABASE),
        }
    }

    /// Load configuration on top of the platform defaults.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        Self::load_from(Self::platform_defaults()?, file)
    }

    /// Load configuration on top of the given defaults.
    pub fn load_from(defaults: Config, file: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(defaults));
        if let Some(file) = file {
            tracing::debug!(path = %file.display(), "loading config file");
            if !file.is_file() {
                exn::bail!(ErrorKind::Invalid(format!("config file `{}` does not exist", file.display())));
            }
            figment = match file.extension().and_then(|ext| ext.to_str()) {
                Some("toml") => figment.merge(Toml::file_exact(file)),
                Some("yaml" | "yml") => figment.merge(Yaml::file_exact(file)),
                Some("json") => figment.merge(Json::file_exact(file)),
                _ => exn::bail!(ErrorKind::UnsupportedFormat(file.to_path_buf())),
            };
        }
        let config: Config = figment
            .merge(Env::prefixed(ENV_PREFIX))
            .extract()
            .map_err(|e| ErrorKind::Invalid(e.to_string()))?;
        config.validate()
    }

    fn validate(self) -> Result<Self> {
        if !self.data_dir.is_absolute() {
            exn::bail!(ErrorKind::Invalid(format!(
                "data_dir must be an absolute path, got `{}`",
                self.data_dir.display()
            )));
        }
        if self.database.as_os_str().is_empty() || self.database.is_absolute() {
            exn::bail!(ErrorKind::Invalid(format!(
                "database must be a path relative to data_dir, got `{}`",
                self.database.display()
            )));
        }
        Ok(self)
    }
}
