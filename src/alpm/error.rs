// Copyright (C) 2026 Checkmk GmbH - License: GNU General Public License v2
// This file is part of Checkmk (https://checkmk.com). It is subject to the terms and
// conditions defined in the file COPYING, which is part of this source code package.

//! Defines the error type for everything reported by the package-management library.

use std::ffi::NulError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for libalpm operations.
pub type AlpmResult<T> = std::result::Result<T, AlpmError>;

/// Errors that can occur while talking to libalpm.
#[derive(Debug, Error)]
pub enum AlpmError {
    #[error("Failed to load libalpm (tried: {candidates})")]
    LibraryUnavailable {
        candidates: String,
        #[source]
        source: libloading::Error,
    },
    #[error("Symbol {symbol} not found in libalpm")]
    MissingSymbol {
        symbol: &'static str,
        #[source]
        source: libloading::Error,
    },
    #[error("Failed to initialize alpm (root: {root:?}, dbpath: {db_path:?}): {message}")]
    Initialize {
        root: PathBuf,
        db_path: PathBuf,
        code: i32,
        message: String,
    },
    #[error("Failed to release alpm handle: {message}")]
    Release { code: i32, message: String },
    #[error("Failed to register sync database {name}: {message}")]
    RegisterSyncDb {
        name: String,
        code: i32,
        message: String,
    },
    #[error("Failed to set usage of sync database {name}: {message}")]
    SetDbUsage {
        name: String,
        code: i32,
        message: String,
    },
    #[error("alpm handle has already been released")]
    HandleReleased,
    #[error("String passed to libalpm contains a nul byte: {value:?}")]
    InteriorNul {
        value: String,
        #[source]
        source: NulError,
    },
    #[error("libalpm returned no {what}")]
    NullString { what: &'static str },
}
