// Copyright (C) 2026 Checkmk GmbH - License: GNU General Public License v2
// This file is part of Checkmk (https://checkmk.com). It is subject to the terms and
// conditions defined in the file COPYING, which is part of this source code package.

//! Defines the package value returned by lookups and the dependency-specification grammar.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A package found in a sync database.
///
/// Owns all of its data; nothing refers back into the library that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Package {
    name: String,
    version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    repository: Option<String>,
    depends: Vec<String>,
}

impl Package {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        repository: Option<String>,
        depends: Vec<String>,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            repository,
            depends,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Name of the sync database the package was found in.
    #[must_use]
    pub fn repository(&self) -> Option<&str> {
        self.repository.as_deref()
    }

    /// Direct dependencies as dependency-specification strings, in library order.
    #[must_use]
    pub fn depends(&self) -> &[String] {
        &self.depends
    }

    /// Parse every entry of [`Package::depends`].
    ///
    /// # Errors
    /// Returns the first entry that is not a valid dependency specification.
    pub fn dependencies(&self) -> Result<Vec<Dependency>, DependencyError> {
        self.depends.iter().map(|spec| spec.parse()).collect()
    }
}

/// Errors that can occur while parsing a dependency specification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DependencyError {
    #[error("Dependency specification has no package name: {spec:?}")]
    EmptyName { spec: String },
    #[error("Dependency specification has an operator but no version: {spec:?}")]
    MissingVersion { spec: String },
    #[error("Dependency specification has a malformed operator: {spec:?}")]
    MalformedOperator { spec: String },
}

/// Version comparison of a dependency constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Comparison {
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
}

impl Comparison {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }

    /// Split a leading operator off `rest`. Two-character operators win.
    fn split(rest: &str) -> Option<(Self, &str)> {
        [
            (">=", Self::Ge),
            ("<=", Self::Le),
            (">", Self::Gt),
            ("<", Self::Lt),
            ("=", Self::Eq),
        ]
        .into_iter()
        .find_map(|(token, comparison)| {
            rest.strip_prefix(token)
                .map(|version| (comparison, version))
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Constraint {
    pub comparison: Comparison,
    pub version: String,
}

/// One parsed dependency specification, e.g. `glibc>=2.40`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dependency {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    constraint: Option<Constraint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

impl Dependency {
    /// Package name without any version constraint.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn constraint(&self) -> Option<&Constraint> {
        self.constraint.as_ref()
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

impl FromStr for Dependency {
    type Err = DependencyError;

    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        let (target, description) = match spec.split_once(": ") {
            Some((target, description)) => (target, Some(description.trim().to_string())),
            None => (spec, None),
        };
        let target = target.trim();

        let operator_at = target.find(['<', '>', '=']);
        let name = &target[..operator_at.unwrap_or(target.len())];
        if name.is_empty() {
            return Err(DependencyError::EmptyName {
                spec: spec.to_string(),
            });
        }

        let constraint = match operator_at.and_then(|at| Comparison::split(&target[at..])) {
            Some((_, "")) => {
                return Err(DependencyError::MissingVersion {
                    spec: spec.to_string(),
                })
            }
            Some((_, version)) if version.starts_with(['<', '>', '=']) => {
                return Err(DependencyError::MalformedOperator {
                    spec: spec.to_string(),
                })
            }
            Some((comparison, version)) => Some(Constraint {
                comparison,
                version: version.to_string(),
            }),
            None => None,
        };

        Ok(Self {
            name: name.to_string(),
            constraint,
            description,
        })
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if let Some(constraint) = &self.constraint {
            write!(f, "{}{}", constraint.comparison.as_str(), constraint.version)?;
        }
        if let Some(description) = &self.description {
            write!(f, ": {description}")?;
        }
        Ok(())
    }
}
