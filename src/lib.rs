// Copyright (C) 2026 Checkmk GmbH - License: GNU General Public License v2
// This file is part of Checkmk (https://checkmk.com). It is subject to the terms and
// conditions defined in the file COPYING, which is part of this source code package.

//! Package lookups against the Arch Linux package database through libalpm.
//!
//! This crate provides functionality to:
//! - Own a libalpm handle with release-on-drop semantics
//! - Register the sync databases listed in pacman.conf
//! - Find the package satisfying a name and copy out its direct dependencies
//! - Walk dependency closures and group the packages a change affects into generations

pub mod alpm;
pub mod config;
pub mod graph;
pub mod package;
pub mod query;
pub mod report;

// Re-export key types for convenience
pub use alpm::{Alpm, AlpmError, Handle, Library};
pub use config::PacmanConfig;
pub use graph::{Graph, Resolution};
pub use package::{Dependency, Package};
pub use query::{find_package, find_package_with, try_find_package, Query, QueryError};
