// Copyright (C) 2026 Checkmk GmbH - License: GNU General Public License v2
// This file is part of Checkmk (https://checkmk.com). It is subject to the terms and
// conditions defined in the file COPYING, which is part of this source code package.

//! Where the package databases live and which sync databases to register.
//!
//! [`PacmanConfig::default`] reproduces the fixed layout of an Arch Linux system (`core` and
//! `extra` below `/var/lib/pacman/`). [`PacmanConfig::from_file`] reads the same settings from
//! a pacman.conf so they cannot drift from the system configuration.

mod siglevel;

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

use crate::alpm::{DbUsage, SigLevel};
use siglevel::{apply_sig_rules, parse_sig_rules, parse_usage, SigRule};

/// Default location of the pacman configuration file.
pub const PACMAN_CONF: &str = "/etc/pacman.conf";
pub const DEFAULT_ROOT_DIR: &str = "/";
pub const DEFAULT_DB_PATH: &str = "/var/lib/pacman/";
pub const DEFAULT_REPOSITORIES: [&str; 2] = ["core", "extra"];

// Nested `Include` directives beyond this depth are ignored.
const MAX_INCLUDE_DEPTH: usize = 10;

/// Result type for configuration loading.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur while reading a pacman.conf.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read pacman config: {path:?}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path:?}:{line}: malformed section header")]
    Syntax { path: PathBuf, line: usize },
    #[error("{path:?}:{line}: directive {key} appears outside of any section")]
    KeyOutsideSection {
        path: PathBuf,
        line: usize,
        key: String,
    },
    #[error("{path:?}:{line}: directive {key} requires a value")]
    MissingValue {
        path: PathBuf,
        line: usize,
        key: String,
    },
    #[error("{path:?}:{line}: unknown SigLevel token {token:?}")]
    UnknownSigLevel {
        path: PathBuf,
        line: usize,
        token: String,
    },
    #[error("{path:?}:{line}: unknown Usage token {token:?}")]
    UnknownUsage {
        path: PathBuf,
        line: usize,
        token: String,
    },
}

/// A sync database to register for lookups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepoConfig {
    pub name: String,
    pub sig_level: SigLevel,
    pub usage: DbUsage,
}

impl RepoConfig {
    /// A repository verified only if a database signature is present and usable for everything.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sig_level: SigLevel::DATABASE_IF_PRESENT,
            usage: DbUsage::ALL,
        }
    }
}

/// Paths and repositories used to initialize libalpm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PacmanConfig {
    pub root_dir: PathBuf,
    pub db_path: PathBuf,
    pub repositories: Vec<RepoConfig>,
}

impl Default for PacmanConfig {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from(DEFAULT_ROOT_DIR),
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            repositories: DEFAULT_REPOSITORIES.into_iter().map(RepoConfig::new).collect(),
        }
    }
}

/// The database directory pacman uses below `root` when no `DBPath` is configured.
#[must_use]
pub fn db_path_below(root: &Path) -> PathBuf {
    root.join(DEFAULT_DB_PATH.trim_start_matches('/'))
}

impl PacmanConfig {
    /// Move the configuration to another root directory.
    ///
    /// A database path that was derived from the old root follows it; an explicitly
    /// configured one stays where it is.
    pub fn set_root_dir(&mut self, root_dir: impl Into<PathBuf>) {
        let root_dir = root_dir.into();
        if self.db_path == db_path_below(&self.root_dir) {
            self.db_path = db_path_below(&root_dir);
        }
        self.root_dir = root_dir;
    }

    /// Read a pacman.conf.
    ///
    /// `[options]` supplies `RootDir`, `DBPath` and the default `SigLevel`; every other
    /// section is a repository, kept in file order. Unknown directives are ignored.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or contains malformed directives.
    pub fn from_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let mut reader = Reader::default();
        reader.read_file(path.as_ref(), 0)?;
        let config = reader.finish();
        debug!(
            root_dir = %config.root_dir.display(),
            db_path = %config.db_path.display(),
            repositories = config.repositories.len(),
            "loaded pacman config from {}",
            path.as_ref().display()
        );
        Ok(config)
    }
}

#[derive(Debug, Default)]
struct Options {
    root_dir: Option<PathBuf>,
    db_path: Option<PathBuf>,
    sig_rules: Vec<SigRule>,
}

#[derive(Debug)]
struct RepoSection {
    name: String,
    sig_rules: Vec<SigRule>,
    usage: Option<DbUsage>,
}

#[derive(Debug, Clone, Copy)]
enum Section {
    Options,
    Repository(usize),
}

/// Accumulates directives across a file and its includes.
#[derive(Debug, Default)]
struct Reader {
    options: Options,
    repositories: Vec<RepoSection>,
    current: Option<Section>,
}

impl Reader {
    fn read_file(&mut self, path: &Path, depth: usize) -> ConfigResult<()> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        for (index, raw) in content.lines().enumerate() {
            let line = index + 1;
            // Everything after `#` is a comment.
            let text = raw.split('#').next().unwrap_or_default().trim();
            if text.is_empty() {
                continue;
            }

            if let Some(header) = text.strip_prefix('[') {
                let name = header
                    .strip_suffix(']')
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .ok_or_else(|| ConfigError::Syntax {
                        path: path.to_path_buf(),
                        line,
                    })?;
                self.enter(name);
                continue;
            }

            let (key, value) = match text.split_once('=') {
                Some((key, value)) => (key.trim(), Some(value.trim())),
                None => (text, None),
            };
            self.directive(path, line, key, value, depth)?;
        }
        Ok(())
    }

    fn enter(&mut self, name: &str) {
        if name == "options" {
            self.current = Some(Section::Options);
            return;
        }
        // A repeated section continues the earlier one.
        let index = match self.repositories.iter().position(|r| r.name == name) {
            Some(index) => index,
            None => {
                self.repositories.push(RepoSection {
                    name: name.to_string(),
                    sig_rules: Vec::new(),
                    usage: None,
                });
                self.repositories.len() - 1
            }
        };
        self.current = Some(Section::Repository(index));
    }

    fn directive(
        &mut self,
        path: &Path,
        line: usize,
        key: &str,
        value: Option<&str>,
        depth: usize,
    ) -> ConfigResult<()> {
        let Some(section) = self.current else {
            return Err(ConfigError::KeyOutsideSection {
                path: path.to_path_buf(),
                line,
                key: key.to_string(),
            });
        };
        let required = || {
            value
                .filter(|value| !value.is_empty())
                .ok_or_else(|| ConfigError::MissingValue {
                    path: path.to_path_buf(),
                    line,
                    key: key.to_string(),
                })
        };
        let sig_rules = |value: &str| {
            parse_sig_rules(value).map_err(|token| ConfigError::UnknownSigLevel {
                path: path.to_path_buf(),
                line,
                token,
            })
        };

        match (section, key) {
            (_, "Include") => self.include(Path::new(required()?), depth),
            (Section::Options, "RootDir") => {
                self.options.root_dir = Some(PathBuf::from(required()?));
                Ok(())
            }
            (Section::Options, "DBPath") => {
                self.options.db_path = Some(PathBuf::from(required()?));
                Ok(())
            }
            (Section::Options, "SigLevel") => {
                let rules = sig_rules(required()?)?;
                self.options.sig_rules.extend(rules);
                Ok(())
            }
            (Section::Repository(index), "SigLevel") => {
                let rules = sig_rules(required()?)?;
                self.repositories[index].sig_rules.extend(rules);
                Ok(())
            }
            (Section::Repository(index), "Usage") => {
                let usage = parse_usage(required()?).map_err(|token| ConfigError::UnknownUsage {
                    path: path.to_path_buf(),
                    line,
                    token,
                })?;
                let repository = &mut self.repositories[index];
                repository.usage = Some(repository.usage.unwrap_or(DbUsage::NONE) | usage);
                Ok(())
            }
            _ => {
                debug!(key, line, "ignoring directive");
                Ok(())
            }
        }
    }

    fn include(&mut self, path: &Path, depth: usize) -> ConfigResult<()> {
        if depth >= MAX_INCLUDE_DEPTH {
            warn!(path = %path.display(), "include nested too deeply, skipping");
            return Ok(());
        }
        match self.read_file(path, depth + 1) {
            Err(ConfigError::Read { path, source }) => {
                warn!(path = %path.display(), "skipping unreadable include: {source}");
                Ok(())
            }
            result => result,
        }
    }

    fn finish(self) -> PacmanConfig {
        let Options {
            root_dir,
            db_path,
            sig_rules,
        } = self.options;

        // Without an explicit DBPath the database lives below the configured root.
        let db_path = match (db_path, &root_dir) {
            (Some(db_path), _) => db_path,
            (None, Some(root_dir)) => db_path_below(root_dir),
            (None, None) => PathBuf::from(DEFAULT_DB_PATH),
        };
        let default_level = apply_sig_rules(SigLevel::default(), &sig_rules);

        PacmanConfig {
            root_dir: root_dir.unwrap_or_else(|| PathBuf::from(DEFAULT_ROOT_DIR)),
            db_path,
            repositories: self
                .repositories
                .into_iter()
                .map(|section| RepoConfig {
                    sig_level: apply_sig_rules(default_level, &section.sig_rules),
                    usage: section.usage.unwrap_or(DbUsage::ALL),
                    name: section.name,
                })
                .collect(),
        }
    }
}
