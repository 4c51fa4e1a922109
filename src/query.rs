// Copyright (C) 2026 Checkmk GmbH - License: GNU General Public License v2
// This file is part of Checkmk (https://checkmk.com). It is subject to the terms and
// conditions defined in the file COPYING, which is part of this source code package.

//! Looks up a package and its direct dependencies in the sync databases.

use thiserror::Error;
use tracing::{debug, warn};

use crate::alpm::{Alpm, AlpmError, Handle, Library};
use crate::config::PacmanConfig;
use crate::package::Package;

/// Result type for package queries.
pub type QueryResult<T> = std::result::Result<T, QueryError>;

/// Errors that can occur while looking up a package.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("libalpm is not available")]
    Library(#[source] AlpmError),
    #[error("Failed to initialize the package database")]
    Initialize(#[source] AlpmError),
    #[error("Failed to register sync database {repository}")]
    Register {
        repository: String,
        #[source]
        source: AlpmError,
    },
    #[error("No package satisfies {name:?}")]
    NotFound { name: String },
    #[error("Failed to read package satisfying {name:?}")]
    Lookup {
        name: String,
        #[source]
        source: AlpmError,
    },
}

impl QueryError {
    /// Whether the lookup ran and simply found nothing.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Runs lookups against a library with a fixed configuration.
///
/// Every lookup performs a complete initialize/register/find/release cycle; nothing is
/// shared between calls.
pub struct Query<'a, L: Library> {
    library: &'a L,
    config: &'a PacmanConfig,
}

impl<'a, L: Library> Query<'a, L> {
    #[must_use]
    pub fn new(library: &'a L, config: &'a PacmanConfig) -> Self {
        Self { library, config }
    }

    /// Find a package satisfying `name` (a package name, a provided name, or a
    /// `name<op>version` constraint) and copy out its direct dependencies.
    ///
    /// # Errors
    /// Returns [`QueryError::NotFound`] if no registered database has a satisfier, or
    /// another variant if the library could not be initialized or queried.
    pub fn find_package(&self, name: &str) -> QueryResult<Package> {
        let config = self.config;
        let handle = Handle::initialize(self.library, &config.root_dir, &config.db_path)
            .map_err(QueryError::Initialize)?;

        for repository in &config.repositories {
            let register = || -> Result<(), AlpmError> {
                let db = handle.register_syncdb(&repository.name, repository.sig_level)?;
                db.set_usage(repository.usage)
            };
            register().map_err(|source| QueryError::Register {
                repository: repository.name.clone(),
                source,
            })?;
        }

        let lookup_error = |source: AlpmError| QueryError::Lookup {
            name: name.to_string(),
            source,
        };
        let Some(found) = handle.find_satisfier(name).map_err(lookup_error)? else {
            warn!(query = name, "no package");
            return Err(QueryError::NotFound {
                name: name.to_string(),
            });
        };
        let package = found.to_package().map_err(lookup_error)?;
        debug!(
            query = name,
            package = package.name(),
            depends = package.depends().len(),
            "found package"
        );
        Ok(package)
    }
}

/// Load the system libalpm and look up one package with the given configuration.
///
/// # Errors
/// Returns [`QueryError::Library`] if libalpm cannot be loaded, otherwise as
/// [`Query::find_package`].
pub fn try_find_package(name: &str, config: &PacmanConfig) -> QueryResult<Package> {
    let library = Alpm::load().map_err(QueryError::Library)?;
    Query::new(&library, config).find_package(name)
}

/// Look up one package in `core` and `extra` with the default configuration.
///
/// Returns `None` on any failure; the reason is logged. Use [`try_find_package`] to tell
/// failures apart.
#[must_use]
pub fn find_package(name: &str) -> Option<Package> {
    match Alpm::load() {
        Ok(library) => find_package_with(&library, &PacmanConfig::default(), name),
        Err(e) => {
            warn!("libalpm is not available: {e}");
            None
        }
    }
}

/// Look up one package with the given library and configuration, collapsing every
/// failure into `None`.
#[must_use]
pub fn find_package_with<L: Library>(
    library: &L,
    config: &PacmanConfig,
    name: &str,
) -> Option<Package> {
    match Query::new(library, config).find_package(name) {
        Ok(package) => Some(package),
        Err(e) => {
            // Initialization failures and misses are logged where they happen.
            if !matches!(e, QueryError::Initialize(_) | QueryError::NotFound { .. }) {
                warn!("{e}: {}", source_message(&e));
            }
            None
        }
    }
}

fn source_message(e: &QueryError) -> String {
    std::error::Error::source(e).map_or_else(String::new, ToString::to_string)
}
