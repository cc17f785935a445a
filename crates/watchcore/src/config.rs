//! Per-root watch configuration.
//!
//! Each watched root may carry a `.watchconfig` JSON file at its top level.
//! A missing file means defaults; a malformed one is an error so that a typo
//! never silently un-ignores a build output tree.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Result, WatchError};
use crate::ignore::{VcsExceptions, DEFAULT_VCS_DIRS};

pub const CONFIG_FILENAME: &str = ".watchconfig";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Directories, relative to the root, that are fully ignored.
    pub ignore_dirs: Vec<String>,
    /// VCS metadata directories: visible themselves, contents ignored.
    pub ignore_vcs: Vec<String>,
    /// Replaces the built-in VCS exception allow-list when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vcs_exceptions: Option<BTreeMap<String, Vec<String>>>,
    /// The file's top-level object as written, including keys this crate
    /// does not interpret. Empty when the root has no configuration file.
    #[serde(skip)]
    pub raw: Map<String, Value>,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            ignore_dirs: Vec::new(),
            ignore_vcs: DEFAULT_VCS_DIRS.iter().map(|dir| dir.to_string()).collect(),
            vcs_exceptions: None,
            raw: Map::new(),
        }
    }
}

impl WatchConfig {
    /// Path of the configuration file for `root`.
    pub fn path_for_root(root: &Path) -> PathBuf {
        root.join(CONFIG_FILENAME)
    }

    /// Loads the configuration for `root`, falling back to defaults when the
    /// root has no configuration file.
    pub fn load(root: &Path) -> Result<Self> {
        let path = Self::path_for_root(root);
        match fs::read_to_string(&path) {
            Ok(contents) => Self::from_json(&contents, &path),
            Err(error) if error.kind() == ErrorKind::NotFound => {
                log::debug!("no {} in {}, using defaults", CONFIG_FILENAME, root.display());
                Ok(Self::default())
            }
            Err(error) => Err(WatchError::Io(error)),
        }
    }

    /// Parses configuration text. `origin` is only used in error messages.
    pub fn from_json(contents: &str, origin: &Path) -> Result<Self> {
        let malformed = |error: serde_json::Error| {
            log::warn!("malformed config {}: {}", origin.display(), error);
            WatchError::Config {
                path: origin.to_path_buf(),
                message: error.to_string(),
            }
        };
        let raw: Value = serde_json::from_str(contents).map_err(malformed)?;
        let mut config = Self::deserialize(&raw).map_err(malformed)?;
        if let Value::Object(object) = raw {
            config.raw = object;
        }
        config.normalize();
        Ok(config)
    }

    /// The VCS exception allow-list this configuration asks for.
    pub fn vcs_exceptions(&self) -> VcsExceptions {
        match &self.vcs_exceptions {
            None => VcsExceptions::default(),
            Some(by_kind) => by_kind
                .iter()
                .flat_map(|(kind, names)| names.iter().map(move |name| (kind, name)))
                .fold(VcsExceptions::empty(), |exceptions, (kind, name)| {
                    exceptions.allow(kind, name)
                }),
        }
    }

    fn normalize(&mut self) {
        for dirs in [&mut self.ignore_dirs, &mut self.ignore_vcs] {
            dirs.iter_mut().for_each(|dir| *dir = normalize_dir(dir));
            dirs.retain(|dir| !dir.is_empty());
        }
    }
}

/// Strips `./` prefixes and trailing separators from a configured directory.
fn normalize_dir(dir: &str) -> String {
    let mut dir = dir.trim();
    while let Some(rest) = dir.strip_prefix("./") {
        dir = rest;
    }
    dir.trim_end_matches('/').to_string()
}
